use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sparkify::db::models::MatchOptions;
use sparkify::loader::{self, event, song};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sparkify", version, about = "Load song metadata and listening logs into a star schema")]
struct Cli {
    /// Path to the SQLite database
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Defaults to `load`
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load song data, then log data, into the database
    Load {
        /// Root of the song metadata tree (defaults to config, then data/song_data)
        #[arg(long)]
        song_data: Option<PathBuf>,

        /// Root of the event log tree (defaults to config, then data/log_data)
        #[arg(long)]
        log_data: Option<PathBuf>,

        /// Drop and recreate all tables before loading
        #[arg(long)]
        reset: bool,

        /// Also match song duration against event length when resolving plays
        #[arg(long)]
        match_duration: bool,
    },

    /// Show the most played songs
    Top {
        /// Number of results
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Show table row counts
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = sparkify::config::AppConfig::load();

    // Resolve database path: CLI > config > XDG default
    let db_path = cli
        .db_path
        .or(config.db_path.clone())
        .unwrap_or_else(sparkify::config::default_db_path);
    log::info!("Database: {}", db_path.display());

    let db = sparkify::db::Database::open(&db_path).context("Failed to open database")?;

    let command = cli.command.unwrap_or(Commands::Load {
        song_data: None,
        log_data: None,
        reset: false,
        match_duration: false,
    });

    match command {
        Commands::Load { song_data, log_data, reset, match_duration } => {
            let song_root = song_data.unwrap_or(config.song_data);
            let log_root = log_data.unwrap_or(config.log_data);
            let opts = MatchOptions {
                match_duration: match_duration || config.match_duration,
            };

            if reset {
                db.reset().context("Failed to reset tables")?;
                log::info!("Tables dropped and recreated");
            }

            // Dimensions first: songplays resolve against loaded songs and artists
            let songs = loader::process_data(&db, &song_root, song::process_song_file)
                .with_context(|| format!("Loading song data from {} failed", song_root.display()))?;
            let logs = loader::process_data(&db, &log_root, |db, path| {
                event::process_log_file(db, path, opts)
            })
            .with_context(|| format!("Loading log data from {} failed", log_root.display()))?;

            let counts = db.counts().context("Failed to count rows")?;
            println!(
                "Load complete: {} song files, {} log files, {} songplays ({} resolved)",
                songs.files_processed, logs.files_processed, counts.songplays, counts.resolved_songplays
            );
        }

        Commands::Top { limit } => {
            let songs = db.top_songs(limit).context("Query failed")?;

            if songs.is_empty() {
                println!("No resolved songplays found.");
                return Ok(());
            }

            println!("Top {} songs by plays:", songs.len());
            println!();
            println!("{:<40} {:<30} {:>6}", "Song", "Artist", "Plays");
            println!("{}", "-".repeat(78));
            for s in &songs {
                println!("{:<40} {:<30} {:>6}", truncate(&s.title, 40), truncate(&s.artist, 30), s.plays);
            }
        }

        Commands::Stats => {
            let c = db.counts().context("Failed to get stats")?;
            println!("Database Statistics");
            println!("===================");
            println!("Songs:       {}", c.songs);
            println!("Artists:     {}", c.artists);
            println!("Users:       {}", c.users);
            println!("Time rows:   {}", c.times);
            println!("Songplays:   {} ({} resolved)", c.songplays, c.resolved_songplays);
        }
    }

    Ok(())
}

/// Truncate to `width` characters, marking the cut with "...".
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        s.to_string()
    }
}
