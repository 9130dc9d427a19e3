use crate::domain::model::{FolderOption, StoreEvent};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavEvent {
    StateRestored {
        depth: usize,
        sample_size: u8,
    },

    Descended {
        id: String,
        name: String,
    },
    Ascended {
        id: String,
        name: String,
    },

    ChainReset {
        reason: String,
    },

    Refreshed {
        folder_id: String,
        breadcrumb: String,
        folders: Vec<FolderOption>,
        urls: usize,
    },

    SampleSizeChanged {
        sample_size: u8,
    },

    Sampled {
        requested: usize,
        available: usize,
        urls: Vec<String>,
    },

    StoreChanged {
        event: StoreEvent,
    },

    StateSyncFailed {
        error: String,
    },
}
