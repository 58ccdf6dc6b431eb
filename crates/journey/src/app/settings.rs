use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::write_text_atomic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Display settings persisted in `config.json` at the project root. Missing
/// keys fall back to their defaults individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct GameSettings {
    pub(crate) resolution: [u32; 2],
    pub(crate) fps: u32,
    pub(crate) fullscreen: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            resolution: [1280, 720],
            fps: 60,
            fullscreen: false,
        }
    }
}

impl GameSettings {
    /// Render cap for the frame loop; `0` disables it.
    pub(crate) fn render_fps_cap(&self) -> Option<u32> {
        (self.fps > 0).then_some(self.fps)
    }

    fn sanitized(mut self) -> Self {
        if self.resolution.contains(&0) {
            warn!(
                width = self.resolution[0],
                height = self.resolution[1],
                "settings_resolution_invalid"
            );
            self.resolution = Self::default().resolution;
        }
        self
    }
}

#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("read settings '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    Parse(String),
    #[error("encode settings json: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("write settings '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Loads settings, writing defaults when the file is missing or unusable.
/// A failed write is logged; the returned settings are usable either way.
pub(crate) fn load_or_init(path: &Path) -> GameSettings {
    match read_settings(path) {
        Ok(settings) => settings.sanitized(),
        Err(SettingsError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "settings_created");
            write_defaults(path)
        }
        Err(error) => {
            warn!(error = %error, path = %path.display(), "settings_reset_to_defaults");
            write_defaults(path)
        }
    }
}

pub(crate) fn save_settings(path: &Path, settings: &GameSettings) -> Result<(), SettingsError> {
    let json = serde_json::to_string_pretty(settings).map_err(SettingsError::Encode)?;
    write_text_atomic(path, &json).map_err(|source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_defaults(path: &Path) -> GameSettings {
    let defaults = GameSettings::default();
    if let Err(error) = save_settings(path, &defaults) {
        warn!(error = %error, "settings_write_failed");
    }
    defaults
}

fn read_settings(path: &Path) -> Result<GameSettings, SettingsError> {
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_settings_json(&raw)
}

fn parse_settings_json(raw: &str) -> Result<GameSettings, SettingsError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, GameSettings>(&mut deserializer) {
        Ok(settings) => Ok(settings),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(SettingsError::Parse(format!("parse settings json: {source}")))
            } else {
                Err(SettingsError::Parse(format!(
                    "parse settings json at {path}: {source}"
                )))
            }
        }
    }
}
