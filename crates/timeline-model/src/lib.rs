//! Reelsync Timeline Model
//!
//! Defines the data the synchronisation engine works on:
//! - **Media:** Immutable source descriptors supplied by the import subsystem
//! - **Clips:** Placed references to a span of a source on a track
//! - **Timeline:** The id-indexed clip arena with its content version
//! - **Project:** JSON persistence of media and clip placements
//!
//! All times are seconds as `f64`. Tracks are plain `u32` lane indices;
//! a higher index paints over a lower one.

pub mod clip;
pub mod media;
pub mod project;
pub mod timeline;

pub use clip::*;
pub use media::*;
pub use project::*;
pub use timeline::*;
