use crate::domain::model::NavState;
use crate::domain::traits::StateChannel;
use crate::infrastructure::schema_validator::validate_nav_state;
use anyhow::{Context, Result};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// Navigator state kept as a small JSON file between CLI runs.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored state. A missing file is a fresh start; a broken one
    /// is logged and also treated as a fresh start at the root.
    pub async fn read(&self) -> Result<NavState> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(NavState::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()))
            }
        };

        match decode(&raw) {
            Ok(state) => Ok(state),
            Err(err) => {
                let error = format!("{err:#}");
                warn!(path = %self.path.display(), %error, "ignoring unreadable state file");
                Ok(NavState::default())
            }
        }
    }

    pub async fn write(&self, state: &NavState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let pretty = serde_json::to_string_pretty(state).context("serializing state")?;
        fs::write(&self.path, pretty)
            .await
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

fn decode(raw: &str) -> Result<NavState> {
    let value: Value = serde_json::from_str(raw)?;
    validate_nav_state(&value)?;
    Ok(serde_json::from_value(value)?)
}

impl StateChannel for StateFile {
    async fn load(&mut self) -> Result<NavState> {
        self.read().await
    }

    async fn save(&mut self, state: &NavState) -> Result<()> {
        self.write(state).await
    }
}
