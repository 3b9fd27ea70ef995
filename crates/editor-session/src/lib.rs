//! Reelsync Editor Session
//!
//! The application root of the editor. One [`EditorSession`] lives on the
//! coordination thread and owns the timeline, the playhead, the ruler
//! gesture machine and the preview renderer. The renderer listens to the
//! playhead like any other surface; edits push a fresh snapshot to it.

pub mod session;

pub use session::EditorSession;
