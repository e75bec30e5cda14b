//! SQLite storage for the star schema.

use std::path::Path;

use anyhow::{bail, Context, Result};
use rusqlite::{params, types::ValueRef, Connection, OpenFlags, OptionalExtension};

use crate::{
    records::{ArtistRow, SongRow, SongplayRow, UserRow},
    schema::{
        is_managed_table, ARTIST_INSERT, CREATE_TABLE_QUERIES, DROP_TABLE_QUERIES,
        SONGPLAY_INSERT, SONG_INSERT, SONG_SELECT, TABLE_NAMES, TIME_INSERT, USER_UPSERT,
    },
    time_dim::TimeRow,
};

// ---------------------------------------------------------------------------
// Inspection types
// ---------------------------------------------------------------------------

/// One column as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Declared SQL type.
    pub data_type: String,
    /// Whether the column is declared `NOT NULL`.
    pub not_null: bool,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
}

/// Rows rendered to display strings, `NULL` for SQL nulls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSet {
    /// Column names in select order.
    pub columns: Vec<String>,
    /// One entry per row, aligned with `columns`.
    pub rows: Vec<Vec<String>>,
}

impl RowSet {
    /// Whether the query returned nothing.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// WarehouseStore
// ---------------------------------------------------------------------------

/// SQLite-backed star schema.
pub struct WarehouseStore {
    conn: Connection,
}

impl WarehouseStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database {}", path.display()))?;
        Self::configure(conn)
    }

    /// Open a database file that must already exist. Nothing is created on
    /// disk when `path` is wrong.
    pub fn open_existing(path: &Path) -> Result<Self> {
        if !path.is_file() {
            bail!("database not found: {}", path.display());
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
            .with_context(|| format!("failed to open database {}", path.display()))?;
        Self::configure(conn)
    }

    /// Private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("failed to enable foreign keys")?;
        Ok(Self {
            conn,
        })
    }

    /// Underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create every managed table that does not exist yet.
    pub fn create_tables(&self) -> Result<()> {
        for query in CREATE_TABLE_QUERIES {
            self.conn
                .execute(query, [])
                .with_context(|| format!("failed to run `{}`", first_line(query)))?;
        }
        tracing::debug!(tables = ?TABLE_NAMES, "Tables ensured");
        Ok(())
    }

    /// Drop every managed table.
    pub fn drop_tables(&self) -> Result<()> {
        for query in DROP_TABLE_QUERIES {
            self.conn
                .execute(query, [])
                .with_context(|| format!("failed to run `{query}`"))?;
        }
        tracing::debug!(tables = ?TABLE_NAMES, "Tables dropped");
        Ok(())
    }

    /// Drop and recreate the schema.
    pub fn reset(&self) -> Result<()> {
        self.drop_tables()?;
        self.create_tables()
    }

    /// Run `f` inside one transaction: committed when `f` succeeds, rolled
    /// back when it fails.
    pub fn load<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&WarehouseWriter<'_>) -> Result<T>,
    {
        let tx = self.conn.transaction().context("failed to begin transaction")?;
        let value = f(&WarehouseWriter {
            conn: &tx,
        })?;
        tx.commit().context("failed to commit transaction")?;
        Ok(value)
    }

    /// Writer in autocommit mode.
    pub fn writer(&self) -> WarehouseWriter<'_> {
        WarehouseWriter {
            conn: &self.conn,
        }
    }

    /// Managed tables that currently exist.
    pub fn existing_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to list tables")?;
        Ok(TABLE_NAMES
            .iter()
            .filter(|table| names.iter().any(|name| name == *table))
            .map(|table| table.to_string())
            .collect())
    }

    /// Row count of a managed table.
    pub fn count_rows(&self, table: &str) -> Result<u64> {
        ensure_managed(table)?;
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .with_context(|| format!("failed to count rows in `{table}`"))?;
        Ok(count.max(0) as u64)
    }

    /// Column layout of a managed table.
    pub fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        ensure_managed(table)?;
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get("name")?,
                    data_type: row.get("type")?,
                    not_null: row.get::<_, i64>("notnull")? != 0,
                    primary_key: row.get::<_, i64>("pk")? != 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("failed to describe `{table}`"))?;
        if columns.is_empty() {
            bail!("table `{table}` does not exist");
        }
        Ok(columns)
    }

    /// First `limit` rows of a managed table after skipping `offset`, in
    /// rowid order.
    pub fn fetch_rows(&self, table: &str, limit: usize, offset: usize) -> Result<RowSet> {
        ensure_managed(table)?;
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {table} ORDER BY rowid LIMIT ?1 OFFSET ?2"))
            .with_context(|| format!("failed to query `{table}`"))?;
        let columns = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let width = columns.len();

        let rows = stmt
            .query_map(params![sql_bound(limit), sql_bound(offset)], |row| {
                (0..width)
                    .map(|idx| row.get_ref(idx).map(render_value))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .with_context(|| format!("failed to read rows from `{table}`"))?;

        Ok(RowSet {
            columns,
            rows,
        })
    }
}

// ---------------------------------------------------------------------------
// WarehouseWriter
// ---------------------------------------------------------------------------

/// Insert side of the store, bound to a connection or an open transaction.
pub struct WarehouseWriter<'a> {
    conn: &'a Connection,
}

impl WarehouseWriter<'_> {
    /// Insert a song; an existing `song_id` is left untouched. Returns the
    /// number of rows written.
    pub fn insert_song(&self, row: &SongRow) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(SONG_INSERT)?;
        stmt.execute(params![row.song_id, row.title, row.artist_id, row.year, row.duration])
            .with_context(|| format!("failed to insert song {}", row.song_id))
    }

    /// Insert an artist; an existing `artist_id` is left untouched.
    pub fn insert_artist(&self, row: &ArtistRow) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(ARTIST_INSERT)?;
        stmt.execute(params![row.artist_id, row.name, row.location, row.latitude, row.longitude])
            .with_context(|| format!("failed to insert artist {}", row.artist_id))
    }

    /// Insert a time row; repeated timestamps are ignored.
    pub fn insert_time(&self, row: &TimeRow) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(TIME_INSERT)?;
        stmt.execute(params![
            row.start_time,
            row.hour,
            row.day,
            row.week,
            row.month,
            row.year,
            row.weekday
        ])
        .with_context(|| format!("failed to insert time {}", row.start_time))
    }

    /// Insert a user, or refresh the subscription level of a known one.
    pub fn upsert_user(&self, row: &UserRow) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(USER_UPSERT)?;
        stmt.execute(params![row.user_id, row.first_name, row.last_name, row.gender, row.level])
            .with_context(|| format!("failed to upsert user {}", row.user_id))
    }

    /// Insert a song play; a play already recorded for the same user,
    /// session and start time is ignored.
    pub fn insert_songplay(&self, row: &SongplayRow) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(SONGPLAY_INSERT)?;
        stmt.execute(params![
            row.start_time,
            row.user_id,
            row.level,
            row.song_id,
            row.artist_id,
            row.session_id,
            row.location,
            row.user_agent
        ])
        .with_context(|| {
            format!(
                "failed to insert songplay (user={}, session={}, start_time={})",
                row.user_id, row.session_id, row.start_time
            )
        })
    }

    /// Resolve `(song_id, artist_id)` by exact title, artist name and
    /// duration.
    pub fn find_song(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<(String, String)>> {
        let mut stmt = self.conn.prepare_cached(SONG_SELECT)?;
        stmt.query_row(params![title, artist_name, duration], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .optional()
        .with_context(|| format!("failed to look up song {title:?} by {artist_name:?}"))
    }
}

fn ensure_managed(table: &str) -> Result<()> {
    if !is_managed_table(table) {
        bail!("unknown table `{table}` (expected one of: {})", TABLE_NAMES.join(", "));
    }
    Ok(())
}

// LIMIT -1 means "no limit" to SQLite; saturate instead of wrapping.
fn sql_bound(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(v) => v.to_string(),
        ValueRef::Real(v) => v.to_string(),
        ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ValueRef::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}

fn first_line(query: &str) -> &str {
    query.lines().next().unwrap_or(query).trim()
}
