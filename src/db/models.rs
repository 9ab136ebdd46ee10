/// Song dimension row.
#[derive(Debug, Clone, PartialEq)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
}

/// Artist dimension row.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistRecord {
    pub artist_id: String,
    pub name: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Time dimension row, derived from an event timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeRecord {
    /// UTC, `YYYY-MM-DD HH:MM:SS.fff`
    pub start_time: String,
    pub hour: u32,
    pub day: u32,
    /// ISO-8601 week of year
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u32,
}

/// User dimension row.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: String,
}

/// Data for inserting a songplay fact. The surrogate key is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSongplay {
    pub start_time: String,
    pub user_id: i64,
    pub level: String,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// A resolved song/artist key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongArtistIds {
    pub song_id: String,
    pub artist_id: String,
}

/// Row counts per table.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub songs: u64,
    pub artists: u64,
    pub times: u64,
    pub users: u64,
    pub songplays: u64,
    /// Songplays whose song reference resolved
    pub resolved_songplays: u64,
}

/// A song ranked by play count.
#[derive(Debug, Clone, PartialEq)]
pub struct TopSong {
    pub title: String,
    pub artist: String,
    pub plays: u64,
}

/// How strictly a playback event is matched against the song/artist dimensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchOptions {
    /// Also require `song.duration` to equal the event length (5 decimal places).
    pub match_duration: bool,
}
