//! JSON input records and the table rows they turn into.

use serde::Deserialize;

use crate::time_dim::TimeRow;

/// Record-level conversion failures.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The event carries an empty or non-numeric `userId`.
    #[error("invalid user id: {raw:?}")]
    InvalidUserId {
        /// Raw value as found in the log line.
        raw: String,
    },
    /// The event timestamp cannot be represented as a calendar date.
    #[error("timestamp out of range: {ts}")]
    TimestampOutOfRange {
        /// Epoch milliseconds.
        ts: i64,
    },
}

// ---------------------------------------------------------------------------
// Input records (one JSON object per line)
// ---------------------------------------------------------------------------

/// One line of a song metadata file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SongFileRecord {
    /// Artist identifier, e.g. `ARD7TVE1187B99BFB1`.
    pub artist_id: String,
    /// Artist latitude, often missing.
    #[serde(default)]
    pub artist_latitude: Option<f64>,
    /// Free-form artist location; may be empty.
    #[serde(default)]
    pub artist_location: Option<String>,
    /// Artist longitude, often missing.
    #[serde(default)]
    pub artist_longitude: Option<f64>,
    /// Display name of the artist.
    pub artist_name: String,
    /// Track length in seconds.
    pub duration: f64,
    /// Song identifier, e.g. `SOMZWCG12A8C13C480`.
    pub song_id: String,
    /// Song title.
    pub title: String,
    /// Release year; `0` when unknown.
    #[serde(default)]
    pub year: i32,
}

impl SongFileRecord {
    /// Row for the `songs` dimension.
    pub fn song_row(&self) -> SongRow {
        SongRow {
            song_id: self.song_id.clone(),
            title: self.title.clone(),
            artist_id: self.artist_id.clone(),
            year: self.year,
            duration: self.duration,
        }
    }

    /// Row for the `artists` dimension.
    pub fn artist_row(&self) -> ArtistRow {
        ArtistRow {
            artist_id: self.artist_id.clone(),
            name: self.artist_name.clone(),
            location: self
                .artist_location
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            latitude: self.artist_latitude,
            longitude: self.artist_longitude,
        }
    }
}

/// `userId` shows up as a string in most files and as a number in some.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawUserId {
    /// Numeric form.
    Number(i64),
    /// String form; empty for logged-out sessions.
    Text(String),
}

impl Default for RawUserId {
    fn default() -> Self {
        RawUserId::Text(String::new())
    }
}

/// One line of an application activity log.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// Artist of the played song (`NextSong` events only).
    #[serde(default)]
    pub artist: Option<String>,
    /// User first name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// User gender (`M`/`F`).
    #[serde(default)]
    pub gender: Option<String>,
    /// Position of the event inside its session.
    #[serde(default)]
    pub item_in_session: i64,
    /// User last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Length of the played song in seconds.
    #[serde(default)]
    pub length: Option<f64>,
    /// Subscription level (`free`/`paid`).
    #[serde(default)]
    pub level: String,
    /// User location.
    #[serde(default)]
    pub location: Option<String>,
    /// Page the event was recorded on.
    pub page: String,
    /// Session identifier.
    pub session_id: i64,
    /// Title of the played song (`NextSong` events only).
    #[serde(default)]
    pub song: Option<String>,
    /// Event time in epoch milliseconds (UTC).
    pub ts: i64,
    /// Browser user agent.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// User identifier.
    #[serde(default)]
    pub user_id: RawUserId,
}

/// Page value of a song-play event.
pub const NEXT_SONG_PAGE: &str = "NextSong";

impl LogEvent {
    /// Whether this event is a song play.
    pub fn is_next_song(&self) -> bool {
        self.page == NEXT_SONG_PAGE
    }

    /// Numeric user id.
    pub fn user_id(&self) -> Result<i64, RecordError> {
        match &self.user_id {
            RawUserId::Number(id) => Ok(*id),
            RawUserId::Text(raw) => raw.trim().parse().map_err(|_| RecordError::InvalidUserId {
                raw: raw.clone(),
            }),
        }
    }

    /// Row for the `users` dimension.
    pub fn user_row(&self) -> Result<UserRow, RecordError> {
        Ok(UserRow {
            user_id: self.user_id()?,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            gender: self.gender.clone(),
            level: self.level.clone(),
        })
    }

    /// Row for the `time` dimension.
    pub fn start_time(&self) -> Result<TimeRow, RecordError> {
        TimeRow::from_millis(self.ts)
    }
}

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

/// `songs` row.
#[derive(Debug, Clone, PartialEq)]
pub struct SongRow {
    /// Primary key.
    pub song_id: String,
    /// Song title.
    pub title: String,
    /// Owning artist.
    pub artist_id: String,
    /// Release year.
    pub year: i32,
    /// Length in seconds.
    pub duration: f64,
}

/// `artists` row.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistRow {
    /// Primary key.
    pub artist_id: String,
    /// Artist name.
    pub name: String,
    /// Location, `None` when the source left it blank.
    pub location: Option<String>,
    /// Latitude.
    pub latitude: Option<f64>,
    /// Longitude.
    pub longitude: Option<f64>,
}

/// `users` row.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    /// Primary key.
    pub user_id: i64,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Gender.
    pub gender: Option<String>,
    /// Subscription level at the time of the event.
    pub level: String,
}

/// `songplays` row; `songplay_id` is assigned by the database.
#[derive(Debug, Clone, PartialEq)]
pub struct SongplayRow {
    /// References `time.start_time`.
    pub start_time: String,
    /// References `users.user_id`.
    pub user_id: i64,
    /// Subscription level at play time.
    pub level: String,
    /// Resolved song, if the catalogue has it.
    pub song_id: Option<String>,
    /// Resolved artist, if the catalogue has it.
    pub artist_id: Option<String>,
    /// Session identifier.
    pub session_id: i64,
    /// User location.
    pub location: Option<String>,
    /// Browser user agent.
    pub user_agent: Option<String>,
}
