use serde::{Deserialize, Deserializer};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid JSON on line {line}: {source}")]
    JsonLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("timestamp out of range: {0}")]
    InvalidTimestamp(i64),
    #[error("invalid userId {0:?}")]
    InvalidUserId(String),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
}

pub type Result<T> = std::result::Result<T, RecordError>;

/// One song metadata file. Fields not needed by the song/artist dimensions
/// (e.g. `num_songs`) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SongFile {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
    pub artist_name: String,
    pub artist_location: String,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
}

/// One line of an event log file.
///
/// `ts`, `page` and `sessionId` are present on every event. The user and song
/// fields are null on logged-out or non-playback events, so they stay optional
/// here and are checked when an event is mapped.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// Milliseconds since the Unix epoch
    pub ts: i64,
    pub page: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub song: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub length: Option<f64>,
    pub session_id: i64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// `userId` shows up both as `"8"` and as `8` depending on the exporter.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(i64),
    }

    Ok(Option::<Id>::deserialize(deserializer)?.map(|id| match id {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    }))
}

/// Parse the payload of a song metadata file (one JSON object).
pub fn parse_song_file(contents: &str) -> Result<SongFile> {
    Ok(serde_json::from_str(contents)?)
}

/// Parse the payload of a log file: one JSON object per line, blank lines skipped.
/// Line numbers in errors are 1-based.
pub fn parse_log_events(contents: &str) -> Result<Vec<RawEvent>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|source| RecordError::JsonLine {
                line: i + 1,
                source,
            })
        })
        .collect()
}
