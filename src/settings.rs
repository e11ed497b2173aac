//! Read-only configuration snapshot for the viewport core.
//!
//! Loaded once from a TOML file under the user config directory and passed
//! into the controller by value; nothing in the core writes it back.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::scale::ZoomMode;

const SETTINGS_FILENAME: &str = "config.toml";
const APP_NAME: &str = "glance";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub zoom_mode: ZoomMode,

    /// Seconds between slideshow advances.
    #[serde(default = "default_slideshow_delay")]
    pub slideshow_delay_secs: u64,

    /// Seconds of inactivity before the cursor hides; 0 disables hiding.
    #[serde(default = "default_cursor_hide_delay")]
    pub cursor_hide_delay_secs: u64,

    /// Click in the left half of the view navigates backward.
    #[serde(default)]
    pub smart_navigation: bool,

    /// Right-to-left reading: scroll resets start at the right edge.
    #[serde(default)]
    pub manga_mode: bool,

    /// Preferred video sink type; the fallback chain applies when unset or
    /// unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_sink: Option<String>,

    #[serde(default = "default_audio_sink")]
    pub audio_sink: String,

    /// Playback volume, 0-100.
    #[serde(default = "default_volume")]
    pub volume: u8,
}

fn default_slideshow_delay() -> u64 {
    5
}

fn default_cursor_hide_delay() -> u64 {
    2
}

fn default_audio_sink() -> String {
    "autoaudiosink".to_string()
}

fn default_volume() -> u8 {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            zoom_mode: ZoomMode::default(),
            slideshow_delay_secs: default_slideshow_delay(),
            cursor_hide_delay_secs: default_cursor_hide_delay(),
            smart_navigation: false,
            manga_mode: false,
            video_sink: None,
            audio_sink: default_audio_sink(),
            volume: default_volume(),
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(SETTINGS_FILENAME))
    }

    /// Load from the default config path; missing file means defaults.
    pub fn load() -> Settings {
        let Some(path) = Self::config_path() else {
            warn!("no config directory available, using default settings");
            return Settings::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(err) => {
                warn!("failed to load settings from {}: {err:#}", path.display());
                Settings::default()
            }
        }
    }

    pub fn load_from(path: &PathBuf) -> Result<Settings> {
        if !path.exists() {
            info!("no settings file at {}, using defaults", path.display());
            return Ok(Settings::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let settings: Settings =
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let raw = toml::to_string_pretty(self).context("serializing settings")?;
        fs::write(path, raw).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.zoom_mode, ZoomMode::AutoFit);
        assert_eq!(settings.slideshow_delay_secs, 5);
        assert_eq!(settings.cursor_hide_delay_secs, 2);
        assert!(!settings.smart_navigation);
        assert!(!settings.manga_mode);
        assert_eq!(settings.video_sink, None);
        assert_eq!(settings.audio_sink, "autoaudiosink");
        assert_eq!(settings.volume, 100);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let settings: Settings =
            toml::from_str("zoom_mode = \"fit_width\"\nmanga_mode = true\n").unwrap();
        assert_eq!(settings.zoom_mode, ZoomMode::FitWidth);
        assert!(settings.manga_mode);
        assert_eq!(settings.volume, 100);
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.zoom_mode = ZoomMode::Manual;
        settings.slideshow_delay_secs = 9;
        settings.video_sink = Some("glimagesink".to_string());
        settings.save_to(&path).unwrap();

        let reloaded = Settings::load_from(&path).unwrap();
        assert_eq!(reloaded.zoom_mode, ZoomMode::Manual);
        assert_eq!(reloaded.slideshow_delay_secs, 9);
        assert_eq!(reloaded.video_sink.as_deref(), Some("glimagesink"));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.volume, 100);
    }
}
