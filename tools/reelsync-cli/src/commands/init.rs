//! Create a new Reelsync project file.

use std::path::PathBuf;

use reelsync_timeline_model::ProjectFile;

pub fn run(name: String, output: PathBuf, width: u32, height: u32, fps: f64) -> anyhow::Result<()> {
    let path = output.join(format!("{name}.reelsync.json"));
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }

    let mut project = ProjectFile::new(&name);
    project.settings.width = width;
    project.settings.height = height;
    project.settings.fps = fps;
    project
        .save(&path)
        .map_err(|e| anyhow::anyhow!("Failed to create project: {e}"))?;

    println!("Project '{}' created at {}", name, path.display());
    println!("  Resolution: {}x{} @ {}fps", width, height, fps);
    println!("  Tracks: {}", project.settings.tracks);
    println!();
    println!("Add media with: reelsync add {} <MEDIA>", path.display());

    Ok(())
}
