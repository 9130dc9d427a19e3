//! Walk a Chromium/Edge bookmark tree folder by folder and open a uniform
//! random sample of the current folder's URLs.
//!
//! Layers:
//! - domain: pure types, errors and the ports the navigator talks to
//! - usecase: reservoir sampling, the folder navigator state machine, events
//! - infrastructure: bookmark file + in-memory store, state persistence, IO
//! - interface: CLI and interactive shell wiring

pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod usecase;
