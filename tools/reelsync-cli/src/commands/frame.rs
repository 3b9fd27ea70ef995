//! Render a single preview frame to PNG.

use std::path::PathBuf;
use std::time::Duration;

use reelsync_common::config::AppConfig;
use reelsync_render_engine::{FrameKind, FrameObserver};

use super::open_session;

pub fn run(
    config: AppConfig,
    project: PathBuf,
    at: f64,
    out: PathBuf,
    timeout_secs: u64,
) -> anyhow::Result<()> {
    let (mut session, loaded) = open_session(config, &project)?;
    session.register_frame_observer(
        "cli",
        FrameObserver::new().on_render_error(|event| {
            for err in &event.errors {
                eprintln!("  [ERR] {} {}: {}", err.clip_id, err.path.display(), err.message);
            }
            Ok(())
        }),
    );

    println!("Rendering '{}' at {:.3}s", loaded.name, at);

    session.seek(at);
    session.refresh_frame();
    session.wait_for_frames(Duration::from_secs(timeout_secs));

    let frame = session
        .displayed_frame()
        .ok_or_else(|| anyhow::anyhow!("No frame rendered within {timeout_secs}s"))?;
    frame.save_png(&out)?;

    let note = match frame.kind {
        FrameKind::Composited => "",
        FrameKind::Black => " (no visual clip at this time)",
        FrameKind::Error => " (one or more layers failed to decode)",
    };
    println!(
        "  Wrote {}x{} frame for {:.3}s to {}{}",
        frame.width(),
        frame.height(),
        frame.time,
        out.display(),
        note
    );
    Ok(())
}
