//! Domain layer: pure, synchronous types and the ports implemented by infrastructure.

pub mod error;
pub mod model;
pub mod traits;
