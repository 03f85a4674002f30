//! Copy a local media directory into a storage backend.
//!
//! Every file under the root is uploaded to `{prefix}{relative_path}` unless an
//! object of the same size is already there.

use crate::traits::{Storage, StorageError, StorageResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub uploaded: u64,
    pub skipped: u64,
    pub bytes_uploaded: u64,
}

/// List regular files under `root` as (storage-relative key, absolute path).
fn collect_files(root: &Path) -> StorageResult<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| StorageError::BackendError(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((key, entry.path().to_path_buf()));
    }
    Ok(files)
}

/// Upload every file under `local_root` to `storage` under `prefix`.
pub async fn sync_directory(
    local_root: &Path,
    storage: &dyn Storage,
    prefix: &str,
) -> StorageResult<SyncReport> {
    if !tokio::fs::try_exists(local_root).await? {
        return Err(StorageError::NotFound(local_root.display().to_string()));
    }

    let root = local_root.to_path_buf();
    let files = tokio::task::spawn_blocking(move || collect_files(&root))
        .await
        .map_err(|e| StorageError::BackendError(e.to_string()))??;

    let mut report = SyncReport::default();

    for (relative, path) in files {
        let key = format!("{}{}", prefix, relative);
        let local_len = tokio::fs::metadata(&path).await?.len();

        match storage.content_length(&key).await {
            Ok(remote_len) if remote_len == local_len => {
                tracing::debug!(key = %key, "Already synced, skipping");
                report.skipped += 1;
                continue;
            }
            Ok(_) | Err(StorageError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let data = tokio::fs::read(&path).await?;
        storage
            .upload_with_key(&key, data, "application/octet-stream")
            .await?;
        tracing::info!(key = %key, size_bytes = local_len, "Synced file");
        report.uploaded += 1;
        report.bytes_uploaded += local_len;
    }

    tracing::info!(
        uploaded = report.uploaded,
        skipped = report.skipped,
        bytes_uploaded = report.bytes_uploaded,
        "Media sync completed"
    );

    Ok(report)
}
