use crate::traits::{Storage, StorageError, StorageResult};
use crate::url::PublicUrlTemplate;
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};

/// S3 storage implementation
///
/// Objects written under an existing key replace it: buckets with ACLs disabled
/// and bucket-owner-enforced ownership never rename on collision.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    url_template: PublicUrlTemplate,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `url_template` - Public URL template; defaults to the bucket's own URL layout
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        url_template: Option<PublicUrlTemplate>,
    ) -> StorageResult<Self> {
        // Credentials come from the environment (AWS_ACCESS_KEY_ID etc.).
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let url_template = url_template.unwrap_or_else(|| {
            PublicUrlTemplate::s3_default(&bucket, &region, endpoint_url.as_deref())
        });

        Ok(S3Storage {
            store,
            bucket,
            url_template,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
        op: &'static str,
    ) -> StorageResult<()> {
        let size = data.len() as u64;
        let location = Path::from(storage_key.to_string());
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self
            .store
            .put_opts(
                &location,
                PutPayload::from(Bytes::from(data)),
                put_options(content_type),
            )
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                operation = op,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            operation = op,
            "S3 upload successful"
        );

        Ok(())
    }
}

/// Object attributes for a put; an empty content type is left unset.
fn put_options(content_type: &str) -> PutOptions {
    let content_type = content_type.trim();
    if content_type.is_empty() {
        return PutOptions::default();
    }
    let attributes: Attributes =
        [(Attribute::ContentType, content_type.to_string())].into_iter().collect();
    attributes.into()
}

#[async_trait]
impl Storage for S3Storage {
    async fn save(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<(String, String)> {
        self.put(storage_key, data, content_type, "save").await?;
        Ok((storage_key.to_string(), self.public_url(storage_key)))
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        self.put(storage_key, data, content_type, "upload_with_key")
            .await?;
        Ok(self.public_url(storage_key))
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let start = std::time::Instant::now();
        let location = Path::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(bytes.to_vec())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let location = Path::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                "S3 delete failed"
            );
            StorageError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(bucket = %self.bucket, key = %storage_key, "S3 delete successful");

        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let location = Path::from(storage_key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        let location = Path::from(storage_key.to_string());
        match self.store.head(&location).await {
            Ok(meta) => Ok(meta.size),
            Err(ObjectStoreError::NotFound { .. }) => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn public_url(&self, storage_key: &str) -> String {
        self.url_template.url_for(storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(all(test, feature = "storage-s3"))]
mod tests {
    use super::*;

    #[test]
    fn test_put_options_carry_content_type() {
        let opts = put_options("image/jpeg");
        assert_eq!(
            opts.attributes.get(&Attribute::ContentType).map(|v| &**v),
            Some("image/jpeg")
        );

        assert!(put_options("").attributes.is_empty());
    }

    #[tokio::test]
    async fn test_public_url_defaults_to_bucket_host() {
        let storage = S3Storage::new("chat-files".to_string(), "us-east-1".to_string(), None, None)
            .await
            .unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::S3);
        assert_eq!(
            storage.public_url("message/a.png"),
            "https://chat-files.s3.us-east-1.amazonaws.com/message/a.png"
        );
    }

    #[tokio::test]
    async fn test_public_url_uses_custom_template() {
        let template =
            PublicUrlTemplate::parse("https://cdn.example.com/{bucket}/", Some("chat-files"), None)
                .unwrap();
        let storage = S3Storage::new(
            "chat-files".to_string(),
            "us-east-1".to_string(),
            Some("http://localhost:9000".to_string()),
            Some(template),
        )
        .await
        .unwrap();
        assert_eq!(
            storage.public_url("media/seth.jpg"),
            "https://cdn.example.com/chat-files/media/seth.jpg"
        );
    }
}
