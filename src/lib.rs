pub mod config;
pub mod db;
pub mod loader;
pub mod mapper;
pub mod records;

/// File extension matched by data file discovery (`*.json`)
pub const DATA_FILE_EXTENSION: &str = "json";

/// Default root of the song metadata tree
pub const DEFAULT_SONG_DATA: &str = "data/song_data";

/// Default root of the event log tree
pub const DEFAULT_LOG_DATA: &str = "data/log_data";

/// Application name for XDG paths
pub const APP_NAME: &str = "sparkify";
