use std::path::Path;

use super::{LoadError, Result, read_file};
use crate::db::Database;
use crate::db::models::MatchOptions;
use crate::mapper;
use crate::records::{self, RawEvent};

/// Load one event log file: time and user dimensions, then one songplay fact
/// per playback event.
///
/// Non-playback events are dropped. Rows are written in file order, all time
/// rows first, then all users, then the facts. A playback event whose song
/// cannot be resolved still produces a fact, with null song/artist.
pub fn process_log_file(db: &Database, path: &Path, opts: MatchOptions) -> Result<()> {
    let contents = read_file(path)?;
    let events = records::parse_log_events(&contents).map_err(LoadError::record(path))?;
    let total = events.len();

    let plays: Vec<RawEvent> = events
        .into_iter()
        .filter(|e| mapper::is_song_play(e))
        .collect();

    for e in &plays {
        let time = mapper::time_record(e.ts).map_err(LoadError::record(path))?;
        db.upsert_time(&time)?;
    }

    for e in &plays {
        let user = mapper::user_record(e).map_err(LoadError::record(path))?;
        db.upsert_user(&user)?;
    }

    let mut resolved = 0;
    for e in &plays {
        let ids = match (e.song.as_deref(), e.artist.as_deref()) {
            (Some(title), Some(artist)) => db.find_song_artist(title, artist, e.length, opts)?,
            _ => None,
        };
        if let Some(ids) = &ids {
            log::debug!("Resolved {:?} to {} : {}", e.song, ids.song_id, ids.artist_id);
            resolved += 1;
        }

        let play = mapper::songplay(e, ids).map_err(LoadError::record(path))?;
        db.insert_songplay(&play)?;
    }

    log::debug!(
        "{}: {} events, {} plays, {} resolved",
        path.display(),
        total,
        plays.len(),
        resolved
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{process_data, song::process_song_file};
    use crate::records::RecordError;
    use rusqlite::params;
    use tempfile::TempDir;

    const DESREE: &str = r#"{"num_songs": 1, "artist_id": "ARDESREE1187FB4D0B", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "Des'ree", "song_id": "SOYOUGOTTABE12AB0", "title": "You Gotta Be", "duration": 246.30812, "year": 1994}"#;

    const EXAMPLE_PLAY: &str = r#"{"page":"NextSong","ts":1541121934796,"userId":"8","level":"free","song":"You Gotta Be","artist":"Des'ree","length":246.3,"sessionId":139,"location":"Phoenix-Mesa-Scottsdale, AZ","userAgent":"Mozilla"}"#;

    fn write_log(tmp: &TempDir, name: &str, lines: &[&str]) -> std::path::PathBuf {
        let path = tmp.path().join(name);
        std::fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    fn load_song(db: &Database, tmp: &TempDir) {
        let path = tmp.path().join("song.json");
        std::fs::write(&path, DESREE).unwrap();
        process_song_file(db, &path).unwrap();
    }

    type FactRow = (i64, String, Option<String>, Option<String>, i64);

    fn facts(db: &Database) -> Vec<FactRow> {
        let mut stmt = db
            .conn
            .prepare(
                "SELECT user_id, level, song_id, artist_id, session_id
                 FROM song_play_fact ORDER BY songplay_id",
            )
            .unwrap();
        let rows = stmt
            .query_map(params![], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
            })
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        rows
    }

    #[test]
    fn unmatched_play_is_recorded_with_null_references() {
        let tmp = TempDir::new().unwrap();
        let path = write_log(&tmp, "events.json", &[EXAMPLE_PLAY]);
        let db = Database::open_in_memory().unwrap();

        process_log_file(&db, &path, MatchOptions::default()).unwrap();

        assert_eq!(facts(&db), vec![(8, "free".to_string(), None, None, 139)]);
        let counts = db.counts().unwrap();
        assert_eq!(counts.times, 1);
        assert_eq!(counts.users, 1);
    }

    #[test]
    fn matched_play_carries_song_and_artist() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        load_song(&db, &tmp);
        let path = write_log(&tmp, "events.json", &[EXAMPLE_PLAY]);

        process_log_file(&db, &path, MatchOptions::default()).unwrap();

        assert_eq!(
            facts(&db),
            vec![(
                8,
                "free".to_string(),
                Some("SOYOUGOTTABE12AB0".to_string()),
                Some("ARDESREE1187FB4D0B".to_string()),
                139
            )]
        );
    }

    #[test]
    fn duration_matching_is_opt_in() {
        // Event length 246.3 differs from the song's 246.30812
        let tmp = TempDir::new().unwrap();
        let db = Database::open_in_memory().unwrap();
        load_song(&db, &tmp);
        let path = write_log(&tmp, "events.json", &[EXAMPLE_PLAY]);

        process_log_file(&db, &path, MatchOptions { match_duration: true }).unwrap();

        let rows = facts(&db);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].2, None);
        assert_eq!(rows[0].3, None);
    }

    #[test]
    fn non_playback_events_produce_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = write_log(
            &tmp,
            "events.json",
            &[
                r#"{"artist":null,"firstName":"Walter","gender":"M","lastName":"Frye","length":null,"level":"free","location":"San Francisco-Oakland-Hayward, CA","page":"Home","sessionId":38,"song":null,"ts":1541105830796,"userAgent":"Mozilla","userId":"39"}"#,
                r#"{"artist":null,"firstName":null,"gender":null,"lastName":null,"length":null,"level":"paid","location":null,"page":"Logout","sessionId":38,"song":null,"ts":1541105830799,"userAgent":null,"userId":""}"#,
            ],
        );
        let db = Database::open_in_memory().unwrap();

        process_log_file(&db, &path, MatchOptions::default()).unwrap();

        let counts = db.counts().unwrap();
        assert_eq!(counts.songplays, 0);
        assert_eq!(counts.times, 0);
        assert_eq!(counts.users, 0);
    }

    #[test]
    fn later_level_wins_and_names_stay() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("2018/11")).unwrap();
        std::fs::write(
            tmp.path().join("2018/11/2018-11-01-events.json"),
            r#"{"page":"NextSong","ts":1541030400000,"userId":"15","firstName":"Lily","lastName":"Koch","gender":"F","level":"free","song":"A","artist":"B","length":1.0,"sessionId":1}"#,
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("2018/11/2018-11-02-events.json"),
            r#"{"page":"NextSong","ts":1541116800000,"userId":"15","firstName":"Lil","lastName":"K","gender":"M","level":"paid","song":"A","artist":"B","length":1.0,"sessionId":2}"#,
        )
        .unwrap();

        let db = Database::open_in_memory().unwrap();
        process_data(&db, tmp.path(), |db, path| {
            process_log_file(db, path, MatchOptions::default())
        })
        .unwrap();

        let user = db.get_user(15).unwrap().unwrap();
        assert_eq!(user.level, "paid");
        assert_eq!(user.first_name.as_deref(), Some("Lily"));
        assert_eq!(user.last_name.as_deref(), Some("Koch"));
        assert_eq!(user.gender.as_deref(), Some("F"));

        let levels: Vec<String> = facts(&db).into_iter().map(|f| f.1).collect();
        assert_eq!(levels, vec!["free", "paid"]);
    }

    #[test]
    fn repeated_timestamp_shares_one_time_row() {
        let tmp = TempDir::new().unwrap();
        let path = write_log(&tmp, "events.json", &[EXAMPLE_PLAY, EXAMPLE_PLAY]);
        let db = Database::open_in_memory().unwrap();

        process_log_file(&db, &path, MatchOptions::default()).unwrap();

        let counts = db.counts().unwrap();
        assert_eq!(counts.times, 1);
        assert_eq!(counts.songplays, 2);
    }

    #[test]
    fn bad_user_id_on_play_fails_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_log(
            &tmp,
            "events.json",
            &[r#"{"page":"NextSong","ts":1541121934796,"userId":"","level":"free","sessionId":1}"#],
        );
        let db = Database::open_in_memory().unwrap();

        let err = process_log_file(&db, &path, MatchOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Record { .. }));
    }

    #[test]
    fn play_without_level_fails_and_keeps_stored_level() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("1.json"),
            r#"{"page":"NextSong","ts":1541030400000,"userId":"8","firstName":"Kaylee","level":"paid","sessionId":1}"#,
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("2.json"),
            r#"{"page":"NextSong","ts":1541116800000,"userId":"8","firstName":"Kaylee","sessionId":2}"#,
        )
        .unwrap();

        let db = Database::open_in_memory().unwrap();
        let err = process_data(&db, tmp.path(), |db, path| {
            process_log_file(db, path, MatchOptions::default())
        })
        .err()
        .unwrap();

        assert!(matches!(
            err,
            LoadError::Record { source: RecordError::MissingField("level"), .. }
        ));
        assert_eq!(db.get_user(8).unwrap().unwrap().level, "paid");
        assert_eq!(db.counts().unwrap().songplays, 1);
    }

    #[test]
    fn writes_times_then_users_then_facts() {
        let tmp = TempDir::new().unwrap();
        let path = write_log(
            &tmp,
            "events.json",
            &[
                r#"{"page":"NextSong","ts":1541030400000,"userId":"15","level":"free","song":"A","artist":"B","sessionId":1}"#,
                r#"{"page":"Home","ts":1541030400500,"userId":"15","level":"free","sessionId":1}"#,
                r#"{"page":"NextSong","ts":1541116800000,"userId":"26","level":"paid","song":"C","artist":"D","sessionId":2}"#,
            ],
        );
        let db = Database::open_in_memory().unwrap();
        db.conn
            .execute_batch(
                "CREATE TABLE write_order (seq INTEGER PRIMARY KEY AUTOINCREMENT, row TEXT NOT NULL);
                 CREATE TRIGGER time_written AFTER INSERT ON time_dim
                     BEGIN INSERT INTO write_order (row) VALUES ('time ' || NEW.start_time); END;
                 CREATE TRIGGER user_written AFTER INSERT ON user_dim
                     BEGIN INSERT INTO write_order (row) VALUES ('user ' || NEW.user_id); END;
                 CREATE TRIGGER play_written AFTER INSERT ON song_play_fact
                     BEGIN INSERT INTO write_order (row) VALUES ('play ' || NEW.session_id); END;",
            )
            .unwrap();

        process_log_file(&db, &path, MatchOptions::default()).unwrap();

        let mut stmt = db.conn.prepare("SELECT row FROM write_order ORDER BY seq").unwrap();
        let order = stmt
            .query_map([], |r| r.get::<_, String>(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(
            order,
            vec![
                "time 2018-11-01 00:00:00.000",
                "time 2018-11-02 00:00:00.000",
                "user 15",
                "user 26",
                "play 1",
                "play 2",
            ]
        );
    }
}
