//! Star-schema DDL: one fact table (`songplays`) and four dimensions.

/// `users` dimension.
pub const USERS_TABLE: &str = "users";
/// `songs` dimension.
pub const SONGS_TABLE: &str = "songs";
/// `artists` dimension.
pub const ARTISTS_TABLE: &str = "artists";
/// `time` dimension.
pub const TIME_TABLE: &str = "time";
/// `songplays` fact table.
pub const SONGPLAYS_TABLE: &str = "songplays";

/// Managed tables in creation order (dimensions before the fact table).
pub const TABLE_NAMES: &[&str] = &[
    USERS_TABLE,
    SONGS_TABLE,
    ARTISTS_TABLE,
    TIME_TABLE,
    SONGPLAYS_TABLE,
];

const USERS_CREATE: &str = "CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY NOT NULL,
    first_name TEXT,
    last_name TEXT,
    gender TEXT,
    level TEXT
)";

const SONGS_CREATE: &str = "CREATE TABLE IF NOT EXISTS songs (
    song_id TEXT PRIMARY KEY NOT NULL,
    title TEXT,
    artist_id TEXT,
    year INTEGER,
    duration REAL
)";

const ARTISTS_CREATE: &str = "CREATE TABLE IF NOT EXISTS artists (
    artist_id TEXT PRIMARY KEY NOT NULL,
    name TEXT,
    location TEXT,
    latitude REAL,
    longitude REAL
)";

const TIME_CREATE: &str = "CREATE TABLE IF NOT EXISTS time (
    start_time TEXT PRIMARY KEY NOT NULL,
    hour INTEGER,
    day INTEGER,
    week INTEGER,
    month INTEGER,
    year INTEGER,
    weekday INTEGER
)";

// songplay_id is a surrogate key; the UNIQUE constraint is what makes a
// re-run over the same logs a no-op.
const SONGPLAYS_CREATE: &str = "CREATE TABLE IF NOT EXISTS songplays (
    songplay_id INTEGER PRIMARY KEY AUTOINCREMENT,
    start_time TEXT NOT NULL REFERENCES time (start_time),
    user_id INTEGER NOT NULL REFERENCES users (user_id),
    level TEXT,
    song_id TEXT REFERENCES songs (song_id),
    artist_id TEXT REFERENCES artists (artist_id),
    session_id INTEGER,
    location TEXT,
    user_agent TEXT,
    UNIQUE (user_id, session_id, start_time)
)";

/// `CREATE TABLE IF NOT EXISTS` statements in dependency order.
pub const CREATE_TABLE_QUERIES: &[&str] = &[
    USERS_CREATE,
    SONGS_CREATE,
    ARTISTS_CREATE,
    TIME_CREATE,
    SONGPLAYS_CREATE,
];

/// `DROP TABLE IF EXISTS` statements, fact table first.
pub const DROP_TABLE_QUERIES: &[&str] = &[
    "DROP TABLE IF EXISTS songplays",
    "DROP TABLE IF EXISTS users",
    "DROP TABLE IF EXISTS songs",
    "DROP TABLE IF EXISTS artists",
    "DROP TABLE IF EXISTS time",
];

pub(crate) const SONG_INSERT: &str = "INSERT INTO songs (song_id, title, artist_id, year, duration)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT DO NOTHING";

pub(crate) const ARTIST_INSERT: &str =
    "INSERT INTO artists (artist_id, name, location, latitude, longitude)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT DO NOTHING";

pub(crate) const TIME_INSERT: &str =
    "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT DO NOTHING";

pub(crate) const USER_UPSERT: &str =
    "INSERT INTO users (user_id, first_name, last_name, gender, level)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT (user_id) DO UPDATE SET level = excluded.level";

pub(crate) const SONGPLAY_INSERT: &str = "INSERT INTO songplays
    (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT DO NOTHING";

pub(crate) const SONG_SELECT: &str = "SELECT s.song_id, s.artist_id
    FROM songs s
    JOIN artists a ON s.artist_id = a.artist_id
    WHERE s.title = ?1 AND a.name = ?2 AND s.duration = ?3
    LIMIT 1";

/// Whether `name` is one of the managed tables.
pub fn is_managed_table(name: &str) -> bool {
    TABLE_NAMES.contains(&name)
}
