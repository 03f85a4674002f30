//! Upload service: generate a key for an incoming file and store it.

use crate::keys::{StorageKey, UploadPathGenerator};
use crate::traits::{Storage, StorageResult};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// Result of a stored upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    /// Key the backend actually stored the bytes under.
    pub key: String,
    pub url: String,
    pub size_bytes: u64,
}

#[derive(Clone)]
pub struct MediaUploader {
    storage: Arc<dyn Storage>,
    generator: UploadPathGenerator,
}

impl MediaUploader {
    /// The key mode follows the backend: remote backends get uniqueness tokens.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let generator = UploadPathGenerator::new(storage.backend_type().into());
        Self { storage, generator }
    }

    /// Use an explicit generator instead of the backend-derived one.
    pub fn with_generator(storage: Arc<dyn Storage>, generator: UploadPathGenerator) -> Self {
        Self { storage, generator }
    }

    pub fn generator(&self) -> &UploadPathGenerator {
        &self.generator
    }

    /// Key that would be requested for `entity_type`/`filename` right now.
    pub fn preview_key(&self, entity_type: &str, filename: &str) -> StorageKey {
        self.generator.generate(entity_type, filename)
    }

    #[tracing::instrument(skip(self, data), fields(size_bytes = data.len()))]
    pub async fn upload(
        &self,
        entity_type: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<StoredFile> {
        let request = self.generator.request(entity_type, filename);
        let requested = self.generator.generate_for(&request, Utc::now());
        let size_bytes = data.len() as u64;

        let (key, url) = self
            .storage
            .save(requested.as_str(), data, content_type)
            .await?;

        tracing::info!(
            entity_type = %entity_type,
            requested_key = %requested,
            key = %key,
            mode = ?request.storage_mode,
            "Upload stored"
        );

        Ok(StoredFile {
            key,
            url,
            size_bytes,
        })
    }
}
