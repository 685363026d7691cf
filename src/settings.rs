use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pdf::ZoomLimits;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
pub const APP_NAME: &str = "pdfmentor";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Base URL of the assistant service (`/ask`, `/generate_quiz`)
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Use canned replies instead of the assistant service
    #[serde(default)]
    pub offline: bool,

    #[serde(default = "default_zoom")]
    pub default_zoom: f32,

    #[serde(default = "default_min_zoom")]
    pub min_zoom: f32,

    #[serde(default = "default_max_zoom")]
    pub max_zoom: f32,

    #[serde(default = "default_zoom_step")]
    pub zoom_step: f32,

    #[serde(default = "default_question_count")]
    pub default_question_count: usize,

    /// Prompt sent along with selected text for "Explain"
    #[serde(default = "default_explain_prompt")]
    pub explain_prompt: String,

    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_backend_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_zoom() -> f32 {
    1.5
}

fn default_min_zoom() -> f32 {
    0.4
}

fn default_max_zoom() -> f32 {
    6.0
}

fn default_zoom_step() -> f32 {
    0.2
}

fn default_question_count() -> usize {
    5
}

fn default_explain_prompt() -> String {
    "Explain this:".to_string()
}

fn default_theme() -> String {
    "Oceanic Next".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            backend_url: default_backend_url(),
            request_timeout_secs: default_timeout(),
            offline: false,
            default_zoom: default_zoom(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            zoom_step: default_zoom_step(),
            default_question_count: default_question_count(),
            explain_prompt: default_explain_prompt(),
            theme: default_theme(),
        }
    }
}

impl Settings {
    pub fn zoom_limits(&self) -> ZoomLimits {
        let min = if self.min_zoom.is_finite() && self.min_zoom > 0.0 {
            self.min_zoom
        } else {
            default_min_zoom()
        };
        let max = if self.max_zoom.is_finite() && self.max_zoom >= min {
            self.max_zoom
        } else {
            default_max_zoom().max(min)
        };
        ZoomLimits {
            initial: self.default_zoom.clamp(min, max),
            min,
            max,
            step: self.zoom_step.abs().max(0.05),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn question_count(&self) -> usize {
        self.default_question_count.clamp(1, crate::quiz::MAX_QUESTIONS)
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from the default location, creating the file with defaults
/// when it does not exist yet.
pub fn load_settings() -> Settings {
    let Some(path) = config_path() else {
        warn!("Could not determine config directory, using default settings");
        return Settings::default();
    };
    if path.exists() {
        load_settings_from_path(&path)
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        let settings = Settings::default();
        save_settings_to_file(&settings, &path);
        settings
    }
}

/// Read settings from a file; unreadable or invalid files give defaults
pub fn load_settings_from_path(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {path:?}");
                settings
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
                Settings::default()
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
            Settings::default()
        }
    }
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            error!("Failed to create config directory {parent:?}: {e}");
            return;
        }
    }

    match serde_yaml::to_string(settings) {
        Ok(yaml) => {
            let content = format!(
                "# pdfmentor settings\n# This file is created automatically on first run.\n\n{yaml}"
            );
            if let Err(e) = fs::write(path, content) {
                error!("Failed to write settings file {path:?}: {e}");
            } else {
                debug!("Saved settings to {path:?}");
            }
        }
        Err(e) => {
            error!("Failed to serialize settings: {e}");
        }
    }
}
