//! Mediashift Storage Library
//!
//! This crate provides upload key generation, the Storage trait and its S3 and
//! local filesystem implementations, plus the upload and sync services built on top.
//!
//! # Storage key format
//!
//! - **Local mode**: the original filename; the local backend renames on collision.
//! - **Remote mode**: `{entity_type}/{uuid}_{seconds.micros}_{filename}`, because the
//!   bucket overwrites objects stored under an existing key.
//!
//! Keys must not contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod sync;
pub mod traits;
pub mod upload;
pub mod url;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-s3")]
pub use factory::create_s3_storage;
pub use keys::{generate_upload_key, StorageKey, UploadPathGenerator, UploadRequest};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use mediashift_core::{StorageBackend, StorageMode};
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use sync::{sync_directory, SyncReport};
pub use traits::{Storage, StorageError, StorageResult};
pub use upload::{MediaUploader, StoredFile};
pub use url::PublicUrlTemplate;
