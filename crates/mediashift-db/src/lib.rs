//! Mediashift database layer
//!
//! Record stores holding file path columns, and the path prefix backfill job
//! that runs over them.

pub mod backfill;
pub mod db;

pub use backfill::{run_path_backfill, PathPrefixBackfill};
pub use db::pool::connect;
pub use db::records::{
    InMemoryPathRecordStore, PathRecord, PathRecordStore, PostgresPathRecordStore, RecordStream,
};
