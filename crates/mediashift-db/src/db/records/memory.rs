//! In-memory record store, for tests and dry runs without a database.

use super::{PathRecord, PathRecordStore, RecordStream};
use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use mediashift_core::AppError;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    records: Vec<PathRecord>,
    rejected_ids: HashSet<i64>,
    writes: usize,
}

#[derive(Clone, Default)]
pub struct InMemoryPathRecordStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryPathRecordStore {
    pub fn new(records: Vec<PathRecord>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                records,
                ..Inner::default()
            })),
        }
    }

    /// Build records with ids 1..=n from a list of paths.
    pub fn from_paths(paths: &[Option<&str>]) -> Self {
        Self::new(
            paths
                .iter()
                .zip(1..)
                .map(|(path, id)| PathRecord::new(id, *path))
                .collect(),
        )
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, AppError> {
        self.inner
            .lock()
            .map_err(|_| AppError::Internal("record store lock poisoned".to_string()))
    }

    /// Make every future write to `record_id` fail.
    pub fn reject_writes_for(&self, record_id: i64) -> Result<(), AppError> {
        self.lock()?.rejected_ids.insert(record_id);
        Ok(())
    }

    /// Current paths, in store order.
    pub fn paths(&self) -> Result<Vec<Option<String>>, AppError> {
        Ok(self
            .lock()?
            .records
            .iter()
            .map(|r| r.file_path.clone())
            .collect())
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> Result<usize, AppError> {
        Ok(self.lock()?.writes)
    }

    /// Next record at or after `index` with a non-empty path.
    fn next_with_path(&self, index: usize) -> Result<Option<(usize, PathRecord)>, AppError> {
        let inner = self.lock()?;
        Ok(inner
            .records
            .iter()
            .enumerate()
            .skip(index)
            .find(|(_, r)| r.file_path.as_deref().is_some_and(|p| !p.is_empty()))
            .map(|(i, r)| (i, r.clone())))
    }
}

#[async_trait]
impl PathRecordStore for InMemoryPathRecordStore {
    fn records_with_path(&self) -> RecordStream<'_> {
        // Cursor over positions; the lock is only held while reading one record.
        stream::unfold(Some(0usize), move |cursor| async move {
            let index = cursor?;
            match self.next_with_path(index) {
                Ok(Some((i, record))) => Some((Ok(record), Some(i + 1))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
        .boxed()
    }

    async fn update_file_path(&self, record_id: i64, file_path: &str) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        if inner.rejected_ids.contains(&record_id) {
            return Err(AppError::Persistence {
                record_id,
                message: "write rejected".to_string(),
            });
        }

        let record = inner
            .records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| AppError::Persistence {
                record_id,
                message: format!("no record with id {}", record_id),
            })?;
        record.file_path = Some(file_path.to_string());
        inner.writes += 1;
        Ok(())
    }
}
