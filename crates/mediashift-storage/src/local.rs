use crate::traits::{Storage, StorageError, StorageResult};
use crate::url::PublicUrlTemplate;
use crate::StorageBackend;
use async_trait::async_trait;
use rand::distr::Alphanumeric;
use rand::Rng;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const SUFFIX_LEN: usize = 7;
const MAX_NAME_ATTEMPTS: usize = 100;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    url_template: PublicUrlTemplate,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/app/media")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:8000/media/")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: &str) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let url_template = PublicUrlTemplate::parse(base_url, None, None)?;

        Ok(LocalStorage {
            base_path,
            url_template,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Rejects absolute keys and `..` components that could escape the base
    /// storage directory. Dots inside a file name are fine.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        let escapes = Path::new(storage_key)
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if storage_key.is_empty() || escapes {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);

        if let (Ok(canonical), Ok(base_canonical)) =
            (path.canonicalize(), self.base_path.canonicalize())
        {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_file(&self, path: &Path, data: &[u8], create_new: bool) -> std::io::Result<()> {
        let mut options = fs::OpenOptions::new();
        options.write(true);
        if create_new {
            options.create_new(true);
        } else {
            options.create(true).truncate(true);
        }

        let mut file = options.open(path).await?;
        file.write_all(data).await?;
        file.sync_all().await
    }
}

/// Insert `_{suffix}` between the file stem and its extension.
fn with_suffix(storage_key: &str, suffix: &str) -> String {
    let (dir, name) = match storage_key.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, storage_key),
    };
    let (stem, ext) = match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    };
    let renamed = format!("{}_{}{}", stem, suffix, ext);
    match dir {
        Some(dir) => format!("{}/{}", dir, renamed),
        None => renamed,
    }
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect()
}

#[async_trait]
impl Storage for LocalStorage {
    // Files carry no metadata here; the content type is only used by object stores.
    async fn save(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<(String, String)> {
        let start = std::time::Instant::now();
        let mut key = storage_key.to_string();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = self.key_to_path(&key)?;
            self.ensure_parent_dir(&path).await?;

            match self.write_file(&path, &data, true).await {
                Ok(()) => {
                    let url = self.public_url(&key);
                    tracing::info!(
                        path = %path.display(),
                        requested_key = %storage_key,
                        key = %key,
                        size_bytes = data.len(),
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "Local storage save successful"
                    );
                    return Ok((key, url));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!(key = %key, "Local storage name taken, picking another");
                    key = with_suffix(storage_key, &random_suffix());
                }
                Err(e) => {
                    return Err(StorageError::UploadFailed(format!(
                        "Failed to write file {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }

        Err(StorageError::UploadFailed(format!(
            "No available name for {} after {} attempts",
            storage_key, MAX_NAME_ATTEMPTS
        )))
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len();
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        self.write_file(&path, &data, false).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        let url = self.public_url(storage_key);

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload_with_key successful"
        );

        Ok(url)
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;

        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::DownloadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), key = %storage_key, "Local storage delete successful");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn content_length(&self, storage_key: &str) -> StorageResult<u64> {
        let path = self.key_to_path(storage_key)?;
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(storage_key.to_string()))
            }
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn public_url(&self, storage_key: &str) -> String {
        self.url_template.url_for(storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn storage_in(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir, "http://localhost:8000/media/")
            .await
            .unwrap()
    }

    #[test]
    fn suffix_goes_before_extension() {
        assert_eq!(with_suffix("seth.jpg", "abc1234"), "seth_abc1234.jpg");
        assert_eq!(with_suffix("a/b/seth.tar.gz", "x"), "a/b/seth.tar_x.gz");
        assert_eq!(with_suffix("README", "x"), "README_x");
        assert_eq!(with_suffix(".env", "x"), ".env_x");
    }

    #[tokio::test]
    async fn test_local_storage_save_download() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let (key, url) = storage
            .save("test.txt", b"test data".to_vec(), "text/plain")
            .await
            .unwrap();

        assert_eq!(key, "test.txt");
        assert_eq!(url, "http://localhost:8000/media/test.txt");
        assert_eq!(storage.download(&key).await.unwrap(), b"test data");
    }

    #[tokio::test]
    async fn test_save_deduplicates_existing_names() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let (first, _) = storage
            .save("seth.jpg", b"one".to_vec(), "image/jpeg")
            .await
            .unwrap();
        let (second, _) = storage
            .save("seth.jpg", b"two".to_vec(), "image/jpeg")
            .await
            .unwrap();

        assert_eq!(first, "seth.jpg");
        assert_ne!(first, second);
        assert!(second.starts_with("seth_"));
        assert!(second.ends_with(".jpg"));
        assert_eq!(second.len(), "seth_.jpg".len() + SUFFIX_LEN);
        assert_eq!(storage.download(&first).await.unwrap(), b"one");
        assert_eq!(storage.download(&second).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn test_upload_with_key_overwrites() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        storage
            .upload_with_key("media/a.txt", b"old".to_vec(), "text/plain")
            .await
            .unwrap();
        storage
            .upload_with_key("media/a.txt", b"new!".to_vec(), "text/plain")
            .await
            .unwrap();

        assert_eq!(storage.download("media/a.txt").await.unwrap(), b"new!");
        assert_eq!(storage.content_length("media/a.txt").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let result = storage.download("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage
            .save("a/../../escape.txt", b"x".to_vec(), "text/plain")
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_double_dot_in_file_name_is_allowed() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        let (key, url) = storage
            .save("report..final.pdf", b"pdf".to_vec(), "application/pdf")
            .await
            .unwrap();

        assert_eq!(key, "report..final.pdf");
        assert_eq!(url, "http://localhost:8000/media/report..final.pdf");
        assert!(dir.path().join("report..final.pdf").exists());
        assert_eq!(storage.download("report..final.pdf").await.unwrap(), b"pdf");
    }

    #[tokio::test]
    async fn test_missing_files() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;

        assert!(storage.delete("nonexistent/file.txt").await.is_ok());
        assert!(!storage.exists("nonexistent.txt").await.unwrap());
        assert!(matches!(
            storage.download("nonexistent.txt").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            storage.content_length("nonexistent.txt").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_backend_type_is_local() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path()).await;
        assert_eq!(storage.backend_type(), StorageBackend::Local);
    }
}
