use std::path::Path;

use super::{LoadError, Result, read_file};
use crate::db::Database;
use crate::mapper;
use crate::records;

/// Load one song metadata file into the song and artist dimensions.
pub fn process_song_file(db: &Database, path: &Path) -> Result<()> {
    let contents = read_file(path)?;
    let file = records::parse_song_file(&contents).map_err(LoadError::record(path))?;

    db.upsert_song(&mapper::song_record(&file))?;
    db.upsert_artist(&mapper::artist_record(&file))?;
    Ok(())
}
