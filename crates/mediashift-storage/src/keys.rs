//! Upload key generation.
//!
//! Key format: in local mode the original filename; in remote mode
//! `{lowercase(entity_type)}/{uuid}_{seconds}.{micros}_{filename}`.

use chrono::{DateTime, Utc};
use mediashift_core::StorageMode;
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// Path-like identifier under which a file's bytes are stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<StorageKey> for String {
    fn from(key: StorageKey) -> Self {
        key.0
    }
}

/// One upload, described before its bytes are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub target_entity_type: String,
    pub original_filename: String,
    pub storage_mode: StorageMode,
}

impl UploadRequest {
    pub fn new(
        target_entity_type: impl Into<String>,
        original_filename: impl Into<String>,
        storage_mode: StorageMode,
    ) -> Self {
        Self {
            target_entity_type: target_entity_type.into(),
            original_filename: original_filename.into(),
            storage_mode,
        }
    }
}

/// Render `now` as fractional unix seconds with microsecond precision.
fn fractional_seconds(now: DateTime<Utc>) -> String {
    format!("{}.{:06}", now.timestamp(), now.timestamp_subsec_micros())
}

/// Generate the storage key for an upload.
///
/// Local mode returns the filename unchanged. Remote mode prefixes it with the
/// lowercased entity type and a random-plus-timestamp token.
pub fn generate_upload_key(
    entity_type: &str,
    original_filename: &str,
    remote_mode: bool,
    now: DateTime<Utc>,
) -> StorageKey {
    if !remote_mode {
        return StorageKey(original_filename.to_string());
    }

    let token = format!("{}_{}", Uuid::new_v4(), fractional_seconds(now));
    StorageKey(format!(
        "{}/{}_{}",
        entity_type.to_lowercase(),
        token,
        original_filename
    ))
}

/// Key generator bound to one storage mode.
#[derive(Debug, Clone, Copy)]
pub struct UploadPathGenerator {
    mode: StorageMode,
}

impl UploadPathGenerator {
    pub fn new(mode: StorageMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> StorageMode {
        self.mode
    }

    /// Build the request this generator would use for `entity_type`/`filename`.
    pub fn request(&self, entity_type: &str, original_filename: &str) -> UploadRequest {
        UploadRequest::new(entity_type, original_filename, self.mode)
    }

    /// Generate a key for `entity_type`/`filename` at the current time.
    pub fn generate(&self, entity_type: &str, original_filename: &str) -> StorageKey {
        self.generate_for(&self.request(entity_type, original_filename), Utc::now())
    }

    /// Generate a key for a prepared request. The request's own mode wins.
    pub fn generate_for(&self, request: &UploadRequest, now: DateTime<Utc>) -> StorageKey {
        generate_upload_key(
            &request.target_entity_type,
            &request.original_filename,
            request.storage_mode.is_remote(),
            now,
        )
    }
}
