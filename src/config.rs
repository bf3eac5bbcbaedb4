//! Daemon settings.
//!
//! Settings are read from a JSON file (`~/.lifeos/focus.json` by default,
//! overridable with `--config` or `LIFEOS_FOCUS_CONFIG`). Every field has a
//! default, so a missing or partial file is fine.
//!
//! ```json
//! {
//!   "timer": { "focusMinutes": 50, "autoStart": true },
//!   "volume": 0.3,
//!   "ownerId": "me@example.com"
//! }
//! ```

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::sound::DEFAULT_VOLUME;
use crate::types::{ConfigError, TimerConfig};

/// Directory under the home directory holding all LifeOS data.
pub const DATA_DIR_NAME: &str = ".lifeos";

/// Settings file name inside the data directory.
pub const SETTINGS_FILE: &str = "focus.json";

/// Socket file name inside the data directory.
pub const SOCKET_FILE: &str = "focus.sock";

/// Session table file name inside the data directory.
pub const SESSIONS_FILE: &str = "sessions.json";

/// Environment variable overriding the settings path.
pub const CONFIG_ENV: &str = "LIFEOS_FOCUS_CONFIG";

/// Environment variable overriding the session owner.
pub const OWNER_ENV: &str = "LIFEOS_OWNER_ID";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid timer settings: {0}")]
    InvalidTimer(#[from] ConfigError),

    #[error("home directory not found")]
    NoHomeDir,
}

fn default_volume() -> f32 {
    DEFAULT_VOLUME
}

fn default_window_title() -> bool {
    true
}

/// Daemon settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Initial timer configuration.
    #[serde(default)]
    pub timer: TimerConfig,

    /// Initial ambient volume.
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Initially selected ambient track.
    #[serde(default)]
    pub track_index: usize,

    /// Signed-in user; sessions are not logged without one.
    #[serde(default)]
    pub owner_id: Option<String>,

    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub sounds_dir: Option<PathBuf>,

    #[serde(default)]
    pub socket_path: Option<PathBuf>,

    /// Show the countdown in the terminal title.
    #[serde(default = "default_window_title")]
    pub window_title: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timer: TimerConfig::default(),
            volume: default_volume(),
            track_index: 0,
            owner_id: None,
            data_dir: None,
            sounds_dir: None,
            socket_path: None,
            window_title: default_window_title(),
        }
    }
}

/// Returns `~/.lifeos`.
pub fn default_data_dir() -> Result<PathBuf, SettingsError> {
    dirs::home_dir()
        .map(|home| home.join(DATA_DIR_NAME))
        .ok_or(SettingsError::NoHomeDir)
}

/// Returns `~/.lifeos/focus.sock`.
pub fn default_socket_path() -> Result<PathBuf, SettingsError> {
    Ok(default_data_dir()?.join(SOCKET_FILE))
}

/// Resolves the settings path: explicit path, then `LIFEOS_FOCUS_CONFIG`,
/// then `~/.lifeos/focus.json`.
pub fn settings_path(explicit: Option<&Path>) -> Result<PathBuf, SettingsError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => Ok(default_data_dir()?.join(SETTINGS_FILE)),
    }
}

impl Settings {
    /// Loads settings from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or parsed, or if the
    /// timer configuration is out of range.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let settings = match std::fs::read(path) {
            Ok(bytes) => {
                serde_json::from_slice::<Settings>(&bytes).map_err(|source| SettingsError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No settings file at {}, using defaults", path.display());
                Settings::default()
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        settings.timer.validate()?;
        Ok(settings)
    }

    /// Loads settings from the resolved settings path.
    pub fn load_from(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        Self::load(&settings_path(explicit)?)
    }

    pub fn data_dir(&self) -> Result<PathBuf, SettingsError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    pub fn sounds_dir(&self) -> Result<PathBuf, SettingsError> {
        match &self.sounds_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(self.data_dir()?.join("sounds")),
        }
    }

    pub fn socket_path(&self) -> Result<PathBuf, SettingsError> {
        match &self.socket_path {
            Some(path) => Ok(path.clone()),
            None => Ok(self.data_dir()?.join(SOCKET_FILE)),
        }
    }

    pub fn sessions_path(&self) -> Result<PathBuf, SettingsError> {
        Ok(self.data_dir()?.join(SESSIONS_FILE))
    }

    /// Returns the session owner, preferring `LIFEOS_OWNER_ID`.
    pub fn owner_id(&self) -> Option<String> {
        self.owner_id_with(std::env::var(OWNER_ENV).ok())
    }

    /// Returns the session owner given an environment override.
    pub fn owner_id_with(&self, env_owner: Option<String>) -> Option<String> {
        env_owner
            .or_else(|| self.owner_id.clone())
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod load_tests {
        use super::*;

        #[test]
        fn test_missing_file_gives_defaults() {
            let dir = tempfile::tempdir().unwrap();
            let settings = Settings::load(&dir.path().join("focus.json")).unwrap();
            assert_eq!(settings, Settings::default());
        }

        #[test]
        fn test_partial_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("focus.json");
            std::fs::write(
                &path,
                r#"{"timer":{"focusMinutes":50,"autoStart":true},"volume":0.3}"#,
            )
            .unwrap();

            let settings = Settings::load(&path).unwrap();

            assert_eq!(settings.timer.focus_minutes, 50);
            assert_eq!(settings.timer.short_break_minutes, 5);
            assert!(settings.timer.auto_start);
            assert_eq!(settings.volume, 0.3);
            assert!(settings.window_title);
        }

        #[test]
        fn test_malformed_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("focus.json");
            std::fs::write(&path, "{ nope").unwrap();

            let err = Settings::load(&path).unwrap_err();
            assert!(matches!(err, SettingsError::Parse { .. }));
            assert!(err.to_string().contains("focus.json"));
        }

        #[test]
        fn test_invalid_timer_rejected() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("focus.json");
            std::fs::write(&path, r#"{"timer":{"longBreakInterval":0}}"#).unwrap();

            let err = Settings::load(&path).unwrap_err();
            assert!(matches!(err, SettingsError::InvalidTimer(_)));
        }

        #[test]
        fn test_explicit_path_wins() {
            let path = settings_path(Some(Path::new("/tmp/custom.json"))).unwrap();
            assert_eq!(path, PathBuf::from("/tmp/custom.json"));
        }
    }

    mod path_tests {
        use super::*;

        #[test]
        fn test_paths_follow_data_dir() {
            let settings = Settings {
                data_dir: Some(PathBuf::from("/data")),
                ..Settings::default()
            };

            assert_eq!(settings.sounds_dir().unwrap(), PathBuf::from("/data/sounds"));
            assert_eq!(
                settings.socket_path().unwrap(),
                PathBuf::from("/data/focus.sock")
            );
            assert_eq!(
                settings.sessions_path().unwrap(),
                PathBuf::from("/data/sessions.json")
            );
        }

        #[test]
        fn test_explicit_paths_win() {
            let settings = Settings {
                data_dir: Some(PathBuf::from("/data")),
                sounds_dir: Some(PathBuf::from("/music")),
                socket_path: Some(PathBuf::from("/run/focus.sock")),
                ..Settings::default()
            };

            assert_eq!(settings.sounds_dir().unwrap(), PathBuf::from("/music"));
            assert_eq!(
                settings.socket_path().unwrap(),
                PathBuf::from("/run/focus.sock")
            );
        }
    }

    mod owner_tests {
        use super::*;

        #[test]
        fn test_no_owner_is_guest() {
            assert_eq!(Settings::default().owner_id_with(None), None);
        }

        #[test]
        fn test_settings_owner() {
            let settings = Settings {
                owner_id: Some("me".to_string()),
                ..Settings::default()
            };
            assert_eq!(settings.owner_id_with(None), Some("me".to_string()));
        }

        #[test]
        fn test_env_owner_overrides() {
            let settings = Settings {
                owner_id: Some("me".to_string()),
                ..Settings::default()
            };
            assert_eq!(
                settings.owner_id_with(Some("other".to_string())),
                Some("other".to_string())
            );
        }

        #[test]
        fn test_blank_owner_is_guest() {
            let settings = Settings {
                owner_id: Some("   ".to_string()),
                ..Settings::default()
            };
            assert_eq!(settings.owner_id_with(None), None);
        }
    }
}
