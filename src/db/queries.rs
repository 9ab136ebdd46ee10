use super::models::{
    ArtistRecord, MatchOptions, NewSongplay, SongArtistIds, SongRecord, TableCounts, TimeRecord,
    TopSong, UserRecord,
};
use super::{Database, Result};
use rusqlite::{OptionalExtension, params};

impl Database {
    /// Insert a song. A duplicate `song_id` is a no-op.
    pub fn upsert_song(&self, s: &SongRecord) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO song_dim (song_id, title, artist_id, year, duration)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(song_id) DO NOTHING",
            )?
            .execute(params![s.song_id, s.title, s.artist_id, s.year, s.duration])?;
        Ok(())
    }

    /// Insert an artist. A duplicate `artist_id` is a no-op.
    pub fn upsert_artist(&self, a: &ArtistRecord) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO artist_dim (artist_id, name, location, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(artist_id) DO NOTHING",
            )?
            .execute(params![a.artist_id, a.name, a.location, a.latitude, a.longitude])?;
        Ok(())
    }

    /// Insert a time row. A duplicate `start_time` is a no-op.
    pub fn upsert_time(&self, t: &TimeRecord) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO time_dim (start_time, hour, day, week, month, year, weekday)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(start_time) DO NOTHING",
            )?
            .execute(params![t.start_time, t.hour, t.day, t.week, t.month, t.year, t.weekday])?;
        Ok(())
    }

    /// Insert a user. On conflict only `level` is overwritten (free → paid upgrades).
    pub fn upsert_user(&self, u: &UserRecord) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO user_dim (user_id, first_name, last_name, gender, level)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET level = excluded.level",
            )?
            .execute(params![u.user_id, u.first_name, u.last_name, u.gender, u.level])?;
        Ok(())
    }

    /// Insert a songplay fact. Returns the assigned surrogate key.
    pub fn insert_songplay(&self, p: &NewSongplay) -> Result<i64> {
        self.conn
            .prepare_cached(
                "INSERT INTO song_play_fact (
                    start_time, user_id, level, song_id, artist_id,
                    session_id, location, user_agent
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(songplay_id) DO NOTHING",
            )?
            .execute(params![
                p.start_time, p.user_id, p.level, p.song_id, p.artist_id,
                p.session_id, p.location, p.user_agent,
            ])?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Resolve a playback event to a song/artist pair by title and artist name,
    /// optionally also by duration. Multiple matches resolve to the lowest
    /// `song_id`, then lowest `artist_id`. `None` is a normal outcome.
    pub fn find_song_artist(
        &self,
        title: &str,
        artist_name: &str,
        duration: Option<f64>,
        opts: MatchOptions,
    ) -> Result<Option<SongArtistIds>> {
        let duration = if opts.match_duration { duration } else { None };
        let ids = self
            .conn
            .prepare_cached(
                "SELECT s.song_id, a.artist_id
                 FROM song_dim s
                 JOIN artist_dim a ON s.artist_id = a.artist_id
                 WHERE s.title = ?1
                   AND a.name = ?2
                   AND (?3 IS NULL OR ROUND(s.duration, 5) = ROUND(?3, 5))
                 ORDER BY s.song_id, a.artist_id
                 LIMIT 1",
            )?
            .query_row(params![title, artist_name, duration], |row| {
                Ok(SongArtistIds {
                    song_id: row.get(0)?,
                    artist_id: row.get(1)?,
                })
            })
            .optional()?;
        Ok(ids)
    }

    pub fn get_song(&self, song_id: &str) -> Result<Option<SongRecord>> {
        let song = self
            .conn
            .query_row(
                "SELECT song_id, title, artist_id, year, duration FROM song_dim WHERE song_id = ?1",
                params![song_id],
                |row| {
                    Ok(SongRecord {
                        song_id: row.get(0)?,
                        title: row.get(1)?,
                        artist_id: row.get(2)?,
                        year: row.get(3)?,
                        duration: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(song)
    }

    pub fn get_artist(&self, artist_id: &str) -> Result<Option<ArtistRecord>> {
        let artist = self
            .conn
            .query_row(
                "SELECT artist_id, name, location, latitude, longitude
                 FROM artist_dim WHERE artist_id = ?1",
                params![artist_id],
                |row| {
                    Ok(ArtistRecord {
                        artist_id: row.get(0)?,
                        name: row.get(1)?,
                        location: row.get(2)?,
                        latitude: row.get(3)?,
                        longitude: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(artist)
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<UserRecord>> {
        let user = self
            .conn
            .query_row(
                "SELECT user_id, first_name, last_name, gender, level
                 FROM user_dim WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(UserRecord {
                        user_id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        gender: row.get(3)?,
                        level: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// Row counts for every table.
    pub fn counts(&self) -> Result<TableCounts> {
        let count = |sql: &str| -> Result<u64> {
            let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as u64)
        };

        Ok(TableCounts {
            songs: count("SELECT COUNT(*) FROM song_dim")?,
            artists: count("SELECT COUNT(*) FROM artist_dim")?,
            times: count("SELECT COUNT(*) FROM time_dim")?,
            users: count("SELECT COUNT(*) FROM user_dim")?,
            songplays: count("SELECT COUNT(*) FROM song_play_fact")?,
            resolved_songplays: count(
                "SELECT COUNT(*) FROM song_play_fact WHERE song_id IS NOT NULL",
            )?,
        })
    }

    /// Most played songs among songplays that resolved to a song.
    pub fn top_songs(&self, limit: usize) -> Result<Vec<TopSong>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.title, a.name, COUNT(*) AS plays
             FROM song_play_fact p
             JOIN song_dim s ON s.song_id = p.song_id
             JOIN artist_dim a ON a.artist_id = p.artist_id
             GROUP BY p.song_id, p.artist_id
             ORDER BY plays DESC, s.title
             LIMIT ?1",
        )?;

        let songs = stmt
            .query_map(params![limit as i64], |row| {
                let plays: i64 = row.get(2)?;
                Ok(TopSong {
                    title: row.get(0)?,
                    artist: row.get(1)?,
                    plays: plays as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(songs)
    }
}
