//! Path prefix backfill
//!
//! One-off corrective job: every stored path that does not yet start with the
//! required prefix gets it prepended. Records are streamed from the store and
//! updated one at a time; the first failed write stops the run and leaves the
//! records already updated as they are.

use crate::db::records::PathRecordStore;
use futures::TryStreamExt;
use mediashift_core::constants::MEDIA_PREFIX;
use mediashift_core::AppError;

#[derive(Debug, Clone)]
pub struct PathPrefixBackfill {
    required_prefix: String,
}

impl Default for PathPrefixBackfill {
    fn default() -> Self {
        Self::new(MEDIA_PREFIX)
    }
}

impl PathPrefixBackfill {
    pub fn new(required_prefix: impl Into<String>) -> Self {
        Self {
            required_prefix: required_prefix.into(),
        }
    }

    pub fn required_prefix(&self) -> &str {
        &self.required_prefix
    }

    /// The rewritten path, or `None` when `path` needs no change.
    ///
    /// This is a prefix check: `foo/media/bar.jpg` still gets prefixed.
    pub fn rewrite(&self, path: &str) -> Option<String> {
        if path.is_empty() || path.starts_with(&self.required_prefix) {
            None
        } else {
            Some(format!("{}{}", self.required_prefix, path))
        }
    }

    /// Run over every record with a path; returns how many were modified.
    #[tracing::instrument(skip(self, store), fields(prefix = %self.required_prefix))]
    pub async fn run(&self, store: &dyn PathRecordStore) -> Result<u64, AppError> {
        let mut records = store.records_with_path();
        let mut updated = 0u64;

        while let Some(record) = records.try_next().await? {
            let Some(path) = record.file_path.as_deref() else {
                continue;
            };
            let Some(new_path) = self.rewrite(path) else {
                continue;
            };

            if let Err(e) = store.update_file_path(record.id, &new_path).await {
                tracing::error!(
                    error = %e,
                    record_id = record.id,
                    updated,
                    "Path backfill stopped on failed write"
                );
                return Err(e);
            }

            tracing::info!(
                record_id = record.id,
                old_path = %path,
                new_path = %new_path,
                "Updated file path"
            );
            updated += 1;
        }

        tracing::info!(updated, "Path backfill completed");
        Ok(updated)
    }
}

/// Prefix every stored path in `store` with `required_prefix`.
pub async fn run_path_backfill(
    store: &dyn PathRecordStore,
    required_prefix: &str,
) -> Result<u64, AppError> {
    PathPrefixBackfill::new(required_prefix).run(store).await
}
