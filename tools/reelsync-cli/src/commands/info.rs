//! Show project information.

use std::path::PathBuf;

use reelsync_common::config::TimelineConfig;
use reelsync_timeline_model::ProjectFile;

pub fn run(path: PathBuf, json: bool) -> anyhow::Result<()> {
    let project =
        ProjectFile::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&project)?);
        return Ok(());
    }

    println!("Project: {}", project.name);
    if !project.description.is_empty() {
        println!("  {}", project.description);
    }
    println!("  Version: {}", project.version);
    println!("  Created: {}", project.created_at);
    println!("  Modified: {}", project.modified_at);
    println!();

    let s = &project.settings;
    println!("Settings:");
    println!("  Resolution: {}x{} @ {}fps", s.width, s.height, s.fps);
    println!("  Tracks: {}", s.tracks);
    println!("  Ruler scale: {} px/s", s.pixels_per_second);
    println!();

    println!("Media ({}):", project.media_items.len());
    for (index, media) in project.media_items.iter().enumerate() {
        println!(
            "  [{index}] {} {:?} {:.2}s {}x{}",
            media.path.display(),
            media.kind,
            media.duration,
            media.width,
            media.height
        );
    }
    println!();

    let timeline = project.to_timeline(TimelineConfig::default())?;
    println!("Timeline ({} clips):", timeline.len());
    for clip in timeline.clips() {
        println!(
            "  {} track {} [{:.3}s, {:.3}s) source [{:.3}s, {:.3}s) {}",
            clip.id,
            clip.track_index,
            clip.start_time,
            clip.end_time,
            clip.in_point,
            clip.out_point,
            clip.media.name()
        );
    }
    println!("  Last clip ends at {:.3}s", timeline.max_end_time());
    println!("  Scroll range {:.3}s", timeline.total_duration());

    Ok(())
}
