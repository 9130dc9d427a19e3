use crate::domain::error::StoreError;
use crate::domain::model::{BookmarkChild, NavState, NodeInfo};
use anyhow::Result;

/// Read side of the host bookmark store.
pub trait BookmarkStore {
    fn get_children(&self, folder_id: &str) -> Result<Vec<BookmarkChild>, StoreError>;

    fn get_node(&self, id: &str) -> Result<NodeInfo, StoreError>;
}

/// Durable home of the navigator state, outliving any single UI session.
///
/// `load` is the detached request (hand me what you hold), `save` the
/// attached push (keep this until the next update).
#[allow(async_fn_in_trait)]
pub trait StateChannel {
    async fn load(&mut self) -> Result<NavState>;

    async fn save(&mut self, state: &NavState) -> Result<()>;
}

/// Uniform draws in `[0, 1)`.
pub trait UniformSource {
    fn next_unit(&mut self) -> f64;
}

pub trait UrlOpener {
    /// Open `url` without taking focus where the platform allows it.
    fn open_in_background(&self, url: &str) -> Result<()>;
}
