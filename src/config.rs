use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;

/// Application configuration loaded from TOML config file.
/// All fields have defaults; the config file is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root of the song metadata tree.
    pub song_data: PathBuf,
    /// Root of the event log tree.
    pub log_data: PathBuf,
    /// Custom database path (overrides XDG default).
    pub db_path: Option<PathBuf>,
    /// Also require song duration to equal the event length when resolving songplays.
    pub match_duration: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            song_data: PathBuf::from(crate::DEFAULT_SONG_DATA),
            log_data: PathBuf::from(crate::DEFAULT_LOG_DATA),
            db_path: None,
            match_duration: false,
        }
    }
}

impl AppConfig {
    /// Load config from `~/.config/sparkify/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match Self::from_toml(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Parse config from TOML text. Missing keys take their defaults.
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Resolve the default database path using XDG data directory.
pub fn default_db_path() -> PathBuf {
    if let Some(dirs) = ProjectDirs::from("", "", crate::APP_NAME) {
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).ok();
        data_dir.join("sparkify.db")
    } else {
        // Fallback: current directory
        PathBuf::from("sparkify.db")
    }
}
