//! Record stores: entities owning one nullable file path column.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use futures::stream::BoxStream;
use mediashift_core::AppError;

pub use memory::InMemoryPathRecordStore;
pub use postgres::PostgresPathRecordStore;

/// A persisted entity and its path-valued field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRecord {
    pub id: i64,
    pub file_path: Option<String>,
}

impl PathRecord {
    pub fn new(id: i64, file_path: Option<&str>) -> Self {
        Self {
            id,
            file_path: file_path.map(String::from),
        }
    }
}

pub type RecordStream<'a> = BoxStream<'a, Result<PathRecord, AppError>>;

#[async_trait]
pub trait PathRecordStore: Send + Sync {
    /// Lazily yield every record whose path is non-null and non-empty, in the
    /// store's natural order.
    fn records_with_path(&self) -> RecordStream<'_>;

    /// Set the path of one record and persist only that field.
    async fn update_file_path(&self, record_id: i64, file_path: &str) -> Result<(), AppError>;
}
