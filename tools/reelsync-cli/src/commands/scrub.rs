//! Simulated playhead drag.
//!
//! Presses on the playhead at `from`, moves the pointer to `to` in even
//! steps (one per UI tick) and releases. The media player is simulated, so
//! the report shows exactly which seeks reached it.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;

use reelsync_common::config::AppConfig;
use reelsync_playhead::{PlayheadObserver, PointerEvent, SimulatedPlayback};
use reelsync_render_engine::{CacheStats, PumpReport, RenderStats};

use super::open_session;

/// Pointer row of the ruler strip above the first lane.
const RULER_Y: f64 = -1.0;

#[derive(Debug, Default, Serialize)]
struct ScrubReport {
    steps: u32,
    final_time: f64,
    position_updates: usize,
    player_seeks: Vec<u64>,
    drained: PumpReport,
    renderer: RenderStats,
    cache: CacheStats,
    cache_hit_rate: f64,
}

pub async fn run(
    config: AppConfig,
    project: PathBuf,
    from: f64,
    to: f64,
    steps: u32,
    tick_ms: u64,
    json: bool,
) -> anyhow::Result<()> {
    let (mut session, _) = open_session(config, &project)?;

    let player = Rc::new(RefCell::new(SimulatedPlayback::new()));
    session.attach_playback(Rc::clone(&player));

    let updates = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&updates);
    session.register_playhead_observer(
        "scrub-report",
        PlayheadObserver::new().on_position_changed(move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        }),
    );

    let mut report = ScrubReport {
        steps: steps.max(1),
        ..ScrubReport::default()
    };

    session.seek(from);
    let start_x = session.gestures().time_to_x(session.current_time());
    let end_x = session.gestures().time_to_x(to);
    tracing::debug!(from, to, start_x, end_x, "Starting simulated scrub");

    if !session.pointer_down(PointerEvent::at(start_x, RULER_Y)) {
        anyhow::bail!("Press at {start_x:.1}px was not consumed");
    }

    let mut interval = tokio::time::interval(Duration::from_millis(tick_ms.max(1)));
    for step in 1..=report.steps {
        interval.tick().await;
        let x = start_x + (end_x - start_x) * f64::from(step) / f64::from(report.steps);
        session.pointer_move(PointerEvent::at(x, RULER_Y));
        report.drained.absorb(session.tick());
    }

    interval.tick().await;
    session.pointer_up(PointerEvent::at(end_x, RULER_Y));
    report.drained.absorb(session.tick());
    report
        .drained
        .absorb(session.wait_for_frames(Duration::from_secs(30)));

    report.final_time = session.current_time();
    report.position_updates = *updates.borrow();
    report.player_seeks = player.borrow().seeks.clone();
    {
        let renderer = session.renderer();
        report.renderer = renderer.stats();
        report.cache = renderer.cache_stats();
        report.cache_hit_rate = report.cache.hit_rate();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Scrub {:.3}s -> {:.3}s in {} steps", from, to, report.steps);
    println!("  Final playhead: {:.3}s", report.final_time);
    println!("  Observer position updates: {}", report.position_updates);
    println!("  Player seeks: {:?}", report.player_seeks);
    println!();
    println!("Renderer:");
    println!("  Requests: {}", report.renderer.requests);
    println!("  Cache hits: {}", report.renderer.cache_hits);
    println!("  Jobs submitted: {}", report.renderer.submitted);
    println!("  Deduplicated: {}", report.renderer.deduplicated);
    println!("  Delivered: {}", report.renderer.delivered);
    println!("  Stale (dropped): {}", report.renderer.stale);
    println!("  Render errors: {}", report.renderer.render_errors);
    println!(
        "  Completions drained: {} ({} shown, {} stale)",
        report.drained.completed, report.drained.delivered, report.drained.stale
    );
    println!(
        "  Cache: {} hits / {} misses ({:.1}%)",
        report.cache.hits,
        report.cache.misses,
        report.cache_hit_rate * 100.0
    );

    Ok(())
}
