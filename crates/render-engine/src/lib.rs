//! Reelsync Render Engine
//!
//! Produces the composited preview frame for any timeline instant without
//! blocking the coordination thread.
//!
//! # Pipeline
//!
//! ```text
//! request_frame(t) ── quantize ── cache hit? ──yes──▶ frame_ready
//!                                     │ no
//!                                     ▼
//!                              RenderPool job (snapshot of active clips)
//!                                     │  worker: decode layers ─▶ composite
//!                                     ▼
//!                              completion queue
//!                                     │
//! pump(current_time) ◀────────────────┘  cache, then deliver unless stale
//! ```

pub mod cache;
pub mod compositor;
pub mod decoder;
pub mod frame;
pub mod pool;
pub mod probe;
pub mod renderer;

pub use cache::{quantize, tick_time, CacheStats, FrameCache, FrameKey};
pub use compositor::{Compositor, Layer, TopMostCompositor};
pub use decoder::{DecodeError, FrameDecoder, MediaDecoder};
pub use frame::{Frame, FrameKind};
pub use pool::{LayerError, RenderJob, RenderOutcome, RenderPool};
pub use probe::probe_media;
pub use renderer::{
    FrameObserver, PumpReport, RenderErrorEvent, RenderStats, RequestId, TimelineRenderer,
};
