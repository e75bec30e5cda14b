use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Default database file.
pub const DEFAULT_DB_PATH: &str = "./data/sparkifydb.sqlite";

/// Output layout for `query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QueryOutputFormat {
    /// Aligned columns.
    Table,
    /// One `column: value` line per field.
    Vertical,
}

/// Command line entry point.
#[derive(Parser)]
#[command(name = "sparkify-cli", version, about = "Sparkify song-play star schema loader")]
pub struct Cli {
    /// Selected subcommand.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Drop and recreate all star-schema tables.
    CreateTables {
        /// SQLite database path.
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db_path: PathBuf,
    },
    /// Load song metadata, then activity logs, into the star schema.
    Etl {
        /// SQLite database path.
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db_path: PathBuf,
        /// Directory tree holding song metadata files.
        #[arg(long, default_value = "data/song_data")]
        song_data: PathBuf,
        /// Directory tree holding activity log files.
        #[arg(long, default_value = "data/log_data")]
        log_data: PathBuf,
    },
    /// Query a table and print the first rows.
    Query {
        /// SQLite database path.
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db_path: PathBuf,
        /// Table name (songplays/users/songs/artists/time).
        #[arg(long)]
        table: String,
        /// Number of rows to fetch.
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Number of rows to skip.
        #[arg(long, default_value_t = 0)]
        offset: usize,
        /// Output format (`table` or `vertical`).
        #[arg(long, value_enum, default_value_t = QueryOutputFormat::Table, ignore_case = true)]
        format: QueryOutputFormat,
    },
    /// Show table columns and row count.
    Describe {
        /// SQLite database path.
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db_path: PathBuf,
        /// Table name.
        #[arg(long)]
        table: String,
    },
    /// Print the row count of every table.
    Stats {
        /// SQLite database path.
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db_path: PathBuf,
    },
}
