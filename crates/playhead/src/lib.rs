//! Reelsync Playhead
//!
//! One canonical timeline position shared by every surface that shows it.
//!
//! - [`PlayheadController`] owns the position, clamps and de-duplicates
//!   seeks, fans changes out to observers and drives the media player.
//! - [`UpdateThrottle`] coalesces scrub updates to the display rate.
//! - [`InteractionMachine`] turns raw pointer events on the ruler into
//!   seeks, scrubs, clip drags and range selections.
//!
//! Everything here runs on the coordination thread; nothing is `Send`.

pub mod controller;
pub mod interaction;
pub mod observer;
pub mod playback;
pub mod state;
pub mod throttle;

pub use controller::PlayheadController;
pub use interaction::{ClipHit, GestureOutcome, GesturePhase, InteractionMachine, PointerEvent};
pub use observer::PlayheadObserver;
pub use playback::{MediaPlayback, SimulatedPlayback};
pub use state::{InteractionMode, PlayheadState};
pub use throttle::UpdateThrottle;
