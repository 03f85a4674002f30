#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::{PublicUrlTemplate, S3Storage};
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use mediashift_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => Ok(Arc::new(create_s3_storage(config).await?)),

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let storage =
                LocalStorage::new(&config.local_storage_path, &config.local_storage_base_url)
                    .await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

/// Create the S3 backend regardless of the selected backend (used by media sync).
#[cfg(feature = "storage-s3")]
pub async fn create_s3_storage(config: &Config) -> StorageResult<S3Storage> {
    let bucket = config
        .s3_bucket
        .clone()
        .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
    let region = config.s3_region().map(String::from).ok_or_else(|| {
        StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
    })?;

    let url_template = config
        .media_url
        .as_deref()
        .map(|template| PublicUrlTemplate::parse(template, Some(&bucket), Some(&region)))
        .transpose()?;

    S3Storage::new(bucket, region, config.s3_endpoint.clone(), url_template).await
}
