pub mod add;
pub mod check;
pub mod frame;
pub mod info;
pub mod init;
pub mod scrub;

use std::path::Path;
use std::sync::Arc;

use reelsync_common::clock::SessionClock;
use reelsync_common::config::AppConfig;
use reelsync_editor_session::EditorSession;
use reelsync_render_engine::MediaDecoder;
use reelsync_timeline_model::{ProjectFile, ProjectSettings};

/// Let the project's own resolution and ruler scale override the app config.
pub fn apply_project_settings(config: &mut AppConfig, settings: &ProjectSettings) {
    if settings.width > 0 && settings.height > 0 {
        config.render.width = settings.width;
        config.render.height = settings.height;
    }
    if settings.pixels_per_second.is_finite() && settings.pixels_per_second > 0.0 {
        config.interaction.pixels_per_second = settings.pixels_per_second;
    }
}

/// Load `project` and build a session rendering at the project's settings.
pub fn open_session(
    mut config: AppConfig,
    project: &Path,
) -> anyhow::Result<(EditorSession, ProjectFile)> {
    let file =
        ProjectFile::load(project).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;
    apply_project_settings(&mut config, &file.settings);
    tracing::debug!(
        width = config.render.width,
        height = config.render.height,
        "Using project render settings"
    );

    let decoder = Arc::new(MediaDecoder::from_config(&config.render));
    let mut session = EditorSession::new(config, Arc::new(SessionClock::start()), decoder)?;
    session
        .load_project(&file)
        .map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;
    Ok((session, file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_resolution_overrides_config() {
        let mut config = AppConfig::default();
        let settings = ProjectSettings {
            width: 1280,
            height: 720,
            pixels_per_second: 80.0,
            ..ProjectSettings::default()
        };
        apply_project_settings(&mut config, &settings);
        assert_eq!((config.render.width, config.render.height), (1280, 720));
        assert_eq!(config.interaction.pixels_per_second, 80.0);
    }

    #[test]
    fn test_degenerate_settings_keep_config() {
        let mut config = AppConfig::default();
        let before = (config.render.width, config.render.height);
        let settings = ProjectSettings {
            width: 0,
            height: 720,
            pixels_per_second: 0.0,
            ..ProjectSettings::default()
        };
        apply_project_settings(&mut config, &settings);
        assert_eq!((config.render.width, config.render.height), before);
        assert_eq!(config.interaction.pixels_per_second, 50.0);
    }
}
