pub mod models;
pub mod queries;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Star schema: four dimension tables and the songplay fact table.
const CREATE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS song_dim (
        song_id     TEXT PRIMARY KEY,
        title       TEXT NOT NULL,
        artist_id   TEXT NOT NULL,
        year        INTEGER NOT NULL,
        duration    REAL NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_song_title ON song_dim(title);

    CREATE TABLE IF NOT EXISTS artist_dim (
        artist_id   TEXT PRIMARY KEY,
        name        TEXT NOT NULL,
        location    TEXT NOT NULL,
        latitude    REAL,
        longitude   REAL
    );
    CREATE INDEX IF NOT EXISTS idx_artist_name ON artist_dim(name);

    CREATE TABLE IF NOT EXISTS time_dim (
        start_time  TEXT PRIMARY KEY,
        hour        INTEGER NOT NULL,
        day         INTEGER NOT NULL,
        week        INTEGER NOT NULL,
        month       INTEGER NOT NULL,
        year        INTEGER NOT NULL,
        weekday     INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS user_dim (
        user_id     INTEGER PRIMARY KEY,
        first_name  TEXT,
        last_name   TEXT,
        gender      TEXT,
        level       TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS song_play_fact (
        songplay_id INTEGER PRIMARY KEY AUTOINCREMENT,
        start_time  TEXT NOT NULL REFERENCES time_dim(start_time),
        user_id     INTEGER NOT NULL REFERENCES user_dim(user_id),
        level       TEXT NOT NULL,
        song_id     TEXT REFERENCES song_dim(song_id),
        artist_id   TEXT REFERENCES artist_dim(artist_id),
        session_id  INTEGER NOT NULL,
        location    TEXT,
        user_agent  TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_songplay_song ON song_play_fact(song_id);
";

/// Fact table first: with foreign_keys on, dropping a referenced table fails.
const DROP_TABLES: &str = "
    DROP TABLE IF EXISTS song_play_fact;
    DROP TABLE IF EXISTS user_dim;
    DROP TABLE IF EXISTS song_dim;
    DROP TABLE IF EXISTS artist_dim;
    DROP TABLE IF EXISTS time_dim;
";

/// Store handle: one connection for the whole run.
pub struct Database {
    pub conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        self.create_tables()
    }

    fn create_tables(&self) -> Result<()> {
        self.conn.execute_batch(CREATE_TABLES)?;
        Ok(())
    }

    /// Drop every table and recreate an empty schema.
    pub fn reset(&self) -> Result<()> {
        self.conn.execute_batch(DROP_TABLES)?;
        self.create_tables()
    }
}
