//! Reelsync Common Utilities
//!
//! Shared infrastructure for all Reelsync crates:
//! - Error types and result aliases
//! - Monotonic clocks for gesture timing and update throttling
//! - Observer registries with failure isolation
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod observer;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use observer::{ObserverId, ObserverRegistry, ObserverResult};
