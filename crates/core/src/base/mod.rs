//! Foundational utilities shared by the demography engine: keyed random
//! streams and binary persistence.

mod persist;
mod rng;

pub use persist::Persist;
pub use rng::RngContext;
