//! Maps parsed records onto the star schema rows.

use chrono::{DateTime, Datelike, Timelike};

use crate::db::models::{
    ArtistRecord, NewSongplay, SongArtistIds, SongRecord, TimeRecord, UserRecord,
};
use crate::records::{RawEvent, RecordError, Result, SongFile};

/// Page value of a playback event. Every other page is a non-playback interaction.
pub const SONG_PLAY_PAGE: &str = "NextSong";

/// Format of `start_time` keys in the time dimension and fact table.
const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub fn song_record(f: &SongFile) -> SongRecord {
    SongRecord {
        song_id: f.song_id.clone(),
        title: f.title.clone(),
        artist_id: f.artist_id.clone(),
        year: f.year,
        duration: f.duration,
    }
}

pub fn artist_record(f: &SongFile) -> ArtistRecord {
    ArtistRecord {
        artist_id: f.artist_id.clone(),
        name: f.artist_name.clone(),
        location: f.artist_location.clone(),
        latitude: f.artist_latitude,
        longitude: f.artist_longitude,
    }
}

pub fn is_song_play(e: &RawEvent) -> bool {
    e.page == SONG_PLAY_PAGE
}

/// Start time key for an epoch-milliseconds timestamp (UTC).
pub fn start_time(ts: i64) -> Result<String> {
    let dt = DateTime::from_timestamp_millis(ts).ok_or(RecordError::InvalidTimestamp(ts))?;
    Ok(dt.format(START_TIME_FORMAT).to_string())
}

/// Calendar breakdown of an epoch-milliseconds timestamp, in UTC.
/// Week is the ISO-8601 week; weekday counts from 0 = Monday.
pub fn time_record(ts: i64) -> Result<TimeRecord> {
    let dt = DateTime::from_timestamp_millis(ts).ok_or(RecordError::InvalidTimestamp(ts))?;
    Ok(TimeRecord {
        start_time: dt.format(START_TIME_FORMAT).to_string(),
        hour: dt.hour(),
        day: dt.day(),
        week: dt.iso_week().week(),
        month: dt.month(),
        year: dt.year(),
        weekday: dt.weekday().num_days_from_monday(),
    })
}

fn user_id(e: &RawEvent) -> Result<i64> {
    let raw = e.user_id.as_deref().unwrap_or_default();
    raw.trim()
        .parse()
        .map_err(|_| RecordError::InvalidUserId(raw.to_string()))
}

fn level(e: &RawEvent) -> Result<String> {
    e.level.clone().ok_or(RecordError::MissingField("level"))
}

/// User fields are copied from the event as-is.
pub fn user_record(e: &RawEvent) -> Result<UserRecord> {
    Ok(UserRecord {
        user_id: user_id(e)?,
        first_name: e.first_name.clone(),
        last_name: e.last_name.clone(),
        gender: e.gender.clone(),
        level: level(e)?,
    })
}

/// Fact row for a playback event. `ids` is `None` when the song could not be
/// resolved; the fact is still recorded, with null references.
pub fn songplay(e: &RawEvent, ids: Option<SongArtistIds>) -> Result<NewSongplay> {
    let (song_id, artist_id) = match ids {
        Some(ids) => (Some(ids.song_id), Some(ids.artist_id)),
        None => (None, None),
    };
    Ok(NewSongplay {
        start_time: start_time(e.ts)?,
        user_id: user_id(e)?,
        level: level(e)?,
        song_id,
        artist_id,
        session_id: e.session_id,
        location: e.location.clone(),
        user_agent: e.user_agent.clone(),
    })
}
