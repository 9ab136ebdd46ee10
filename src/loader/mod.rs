pub mod event;
pub mod song;

use crate::DATA_FILE_EXTENSION;
use crate::db::{Database, DbError};
use crate::records::RecordError;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Bad record in {path}: {source}")]
    Record {
        path: PathBuf,
        #[source]
        source: RecordError,
    },
    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

pub type Result<T> = std::result::Result<T, LoadError>;

impl LoadError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io { path: path.to_path_buf(), source }
    }

    fn record(path: &Path) -> impl FnOnce(RecordError) -> Self + '_ {
        move |source| Self::Record { path: path.to_path_buf(), source }
    }
}

/// Outcome of loading one data root.
pub struct LoadResult {
    pub root: PathBuf,
    pub files_processed: usize,
}

/// Collect every `*.json` file under `root`, at any depth.
///
/// Returned paths are absolute and sorted. Like a shell glob, names starting
/// with `.` are not matched. A root that does not exist holds no files.
pub fn find_data_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        log::warn!("{} does not exist, no files to load", root.display());
        return Ok(Vec::new());
    }
    let root = root.canonicalize().map_err(LoadError::io(root))?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        let is_data = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == DATA_FILE_EXTENSION);
        if is_data && !hidden {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Run `per_file` over every data file under `root`, in order.
///
/// Each file's writes are committed as one transaction once `per_file`
/// returns. The first failure aborts the run: that file's writes are rolled
/// back, earlier files stay committed and later files are never touched.
pub fn process_data<F>(db: &Database, root: &Path, mut per_file: F) -> Result<LoadResult>
where
    F: FnMut(&Database, &Path) -> Result<()>,
{
    let files = find_data_files(root)?;
    let total = files.len();
    println!("{} files found in {}", total, root.display());

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} files processed ({eta}) {msg}"
        )
        .unwrap()
        .progress_chars("#>-"),
    );

    for (i, path) in files.iter().enumerate() {
        pb.set_message(
            path.file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_default(),
        );

        let tx = db.conn.unchecked_transaction().map_err(DbError::from)?;
        if let Err(e) = per_file(db, path) {
            pb.abandon_with_message(format!("Failed on {}", path.display()));
            return Err(e);
        }
        tx.commit().map_err(DbError::from)?;

        pb.inc(1);
        // The bar is hidden off-terminal; the line is not
        pb.suspend(|| println!("{}", progress_line(i + 1, total)));
        log::info!("Loaded {}", path.display());
    }

    pb.finish_with_message(format!("Done: {}", root.display()));

    Ok(LoadResult {
        root: root.to_path_buf(),
        files_processed: total,
    })
}

fn progress_line(done: usize, total: usize) -> String {
    format!("{done}/{total} files processed.")
}

/// Read a data file as UTF-8 text.
fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(LoadError::io(path))
}
