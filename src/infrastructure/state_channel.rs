//! Background state keeper.
//!
//! A long-lived task holds the navigator state for the lifetime of the
//! process while UI sessions come and go. Sessions talk to it with a single
//! request type: `attached == false` asks for the held state,
//! `attached == true` replaces it. With a backing [`StateFile`] every
//! replacement is also written through to disk.

use crate::domain::model::NavState;
use crate::domain::traits::StateChannel;
use crate::infrastructure::state_file::StateFile;
use anyhow::{anyhow, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRequest {
    pub attached: bool,
    pub state: Option<NavState>,
}

impl StateRequest {
    pub fn detached() -> Self {
        Self {
            attached: false,
            state: None,
        }
    }

    pub fn attached(state: NavState) -> Self {
        Self {
            attached: true,
            state: Some(state),
        }
    }
}

struct Envelope {
    request: StateRequest,
    reply: oneshot::Sender<Result<NavState>>,
}

#[derive(Debug, Clone)]
pub struct StateKeeperClient {
    tx: mpsc::Sender<Envelope>,
}

impl StateKeeperClient {
    /// Send one request and wait for the held state after it was applied.
    pub async fn request(&self, request: StateRequest) -> Result<NavState> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope { request, reply })
            .await
            .map_err(|_| anyhow!("state keeper has stopped"))?;
        rx.await
            .map_err(|_| anyhow!("state keeper dropped the request"))?
    }
}

impl StateChannel for StateKeeperClient {
    async fn load(&mut self) -> Result<NavState> {
        self.request(StateRequest::detached()).await
    }

    async fn save(&mut self, state: &NavState) -> Result<()> {
        self.request(StateRequest::attached(state.clone())).await?;
        Ok(())
    }
}

/// Start the keeper. It runs until every client is dropped.
pub fn spawn_state_keeper(
    initial: NavState,
    backing: Option<StateFile>,
) -> (StateKeeperClient, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Envelope>(32);

    let handle = tokio::spawn(async move {
        let mut held = initial;
        while let Some(Envelope { request, reply }) = rx.recv().await {
            debug!(attached = request.attached, "state request");

            if !request.attached {
                let _ = reply.send(Ok(held.clone()));
                continue;
            }

            if let Some(state) = request.state {
                held = state;
            }

            let outcome = match &backing {
                Some(file) => file.write(&held).await.map(|()| held.clone()),
                None => Ok(held.clone()),
            };
            let _ = reply.send(outcome);
        }
    });

    (StateKeeperClient { tx }, handle)
}
