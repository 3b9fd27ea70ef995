//! Check external tools and configuration.

use std::process::{Command, Stdio};

use reelsync_common::config::AppConfig;
use reelsync_render_engine::MediaDecoder;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Reelsync System Check");
    println!("{}", "=".repeat(50));

    let decoder = MediaDecoder::from_config(&config.render);
    let ffmpeg_ok = decoder.ffmpeg_available();
    if ffmpeg_ok {
        println!("[OK] ffmpeg: {}", config.render.ffmpeg_path);
    } else {
        println!(
            "[WARN] ffmpeg not runnable at '{}': video clips will render as error frames",
            config.render.ffmpeg_path
        );
    }

    let ffprobe_ok = tool_runs(&config.render.ffprobe_path);
    if ffprobe_ok {
        println!("[OK] ffprobe: {}", config.render.ffprobe_path);
    } else {
        println!(
            "[WARN] ffprobe not runnable at '{}': only still images can be added",
            config.render.ffprobe_path
        );
    }

    println!();
    let path = AppConfig::path();
    if path.exists() {
        println!("[OK] Config: {}", path.display());
    } else {
        println!("[--] Config: {} (not present, using defaults)", path.display());
    }
    println!(
        "     Preview {}x{}, {} workers, cache {} frames, quantum {}s",
        config.render.width,
        config.render.height,
        config.render.workers,
        config.render.cache_capacity,
        config.render.quantum_secs
    );
    println!(
        "     Drag threshold {}px / {}ms, update interval {}ms",
        config.interaction.drag_threshold_px,
        config.interaction.drag_threshold_ms,
        config.playhead.update_interval_ms
    );

    println!();
    if ffmpeg_ok && ffprobe_ok {
        println!("All external tools are available. Reelsync is ready.");
    } else {
        println!("Some external tools are missing. See above.");
    }

    Ok(())
}

fn tool_runs(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}
