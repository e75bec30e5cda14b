//! Records, schema and storage for the Sparkify star schema.
//!
//! Song metadata and activity logs arrive as JSON lines; [`records`] turns
//! them into table rows, [`time_dim`] derives the `time` dimension, and
//! [`warehouse_store`] writes everything into SQLite.

pub mod records;
pub mod schema;
pub mod time_dim;
pub mod warehouse_store;

pub use records::{
    ArtistRow, LogEvent, RecordError, SongFileRecord, SongRow, SongplayRow, UserRow,
};
pub use time_dim::TimeRow;
pub use warehouse_store::{ColumnInfo, RowSet, WarehouseStore, WarehouseWriter};
