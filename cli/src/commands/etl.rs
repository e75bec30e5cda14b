use std::path::Path;

use anyhow::{Context, Result};
use sparkify_shared::{
    records::{LogEvent, SongFileRecord, SongplayRow},
    schema::TABLE_NAMES,
    WarehouseStore, WarehouseWriter,
};

use crate::utils::{collect_json_files, read_json_lines};

/// Which family of input files a directory holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// Song metadata: one song and its artist per line.
    Song,
    /// Activity log: one user event per line.
    Log,
}

/// Counters for one log file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LogFileStats {
    /// Lines parsed.
    pub events: usize,
    /// `NextSong` events turned into song plays.
    pub song_plays: usize,
    /// Song plays whose song and artist were found in the catalogue.
    pub matched: usize,
}

pub fn run(db_path: &Path, song_data: &Path, log_data: &Path) -> Result<()> {
    let mut store = WarehouseStore::open(db_path)?;
    store.create_tables()?;

    process_data(&mut store, song_data, DataKind::Song)?;
    process_data(&mut store, log_data, DataKind::Log)?;

    for table in TABLE_NAMES {
        tracing::info!("{table}: {} rows", store.count_rows(table)?);
    }
    tracing::info!("ETL finished for {}", db_path.display());
    Ok(())
}

/// Load every JSON file under `dir`, one transaction per file. Returns the
/// number of files processed.
pub fn process_data(store: &mut WarehouseStore, dir: &Path, kind: DataKind) -> Result<usize> {
    let files = collect_json_files(dir)?;
    let total = files.len();
    tracing::info!("{total} files found in {}", dir.display());

    for (idx, path) in files.iter().enumerate() {
        store
            .load(|writer| match kind {
                DataKind::Song => process_song_file(writer, path).map(|_| ()),
                DataKind::Log => process_log_file(writer, path).map(|_| ()),
            })
            .with_context(|| format!("failed to load {}", path.display()))?;
        tracing::info!("{}/{total} files processed.", idx + 1);
    }

    Ok(total)
}

/// Insert the song and artist of every record in `path`. Returns the
/// number of records read.
pub fn process_song_file(writer: &WarehouseWriter<'_>, path: &Path) -> Result<usize> {
    let records: Vec<SongFileRecord> = read_json_lines(path)?;
    for record in &records {
        writer.insert_song(&record.song_row())?;
        writer.insert_artist(&record.artist_row())?;
    }
    tracing::debug!(file = %path.display(), songs = records.len(), "Song file loaded");
    Ok(records.len())
}

/// Turn every `NextSong` event in `path` into time, user and songplay rows.
pub fn process_log_file(writer: &WarehouseWriter<'_>, path: &Path) -> Result<LogFileStats> {
    let events: Vec<LogEvent> = read_json_lines(path)?;
    let mut stats = LogFileStats {
        events: events.len(),
        ..LogFileStats::default()
    };

    for event in events.iter().filter(|event| event.is_next_song()) {
        let time = event.start_time()?;
        writer.insert_time(&time)?;

        let user = event.user_row().with_context(|| {
            format!("session {} item {}", event.session_id, event.item_in_session)
        })?;
        writer.upsert_user(&user)?;

        let song = match (&event.song, &event.artist, event.length) {
            (Some(title), Some(artist), Some(length)) => writer.find_song(title, artist, length)?,
            _ => None,
        };
        if song.is_some() {
            stats.matched += 1;
        }
        let (song_id, artist_id) = song.unzip();

        writer.insert_songplay(&SongplayRow {
            start_time: time.start_time,
            user_id: user.user_id,
            level: user.level,
            song_id,
            artist_id,
            session_id: event.session_id,
            location: event.location.clone(),
            user_agent: event.user_agent.clone(),
        })?;
        stats.song_plays += 1;
    }

    tracing::debug!(
        file = %path.display(),
        events = stats.events,
        song_plays = stats.song_plays,
        matched = stats.matched,
        "Log file loaded"
    );
    Ok(stats)
}
