// Infrastructure layer: adapters, file I/O, serde, eventing
pub mod bookmark_tree;
pub mod config;
pub mod event_ndjson;
pub mod file_watcher;
pub mod rng;
pub mod schema_validator;
pub mod serde_json_adapter;
pub mod state_channel;
pub mod state_file;
pub mod url_opener;
