use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// This enum defines the available storage backend types.
/// It's defined in core because it's used in configuration and by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

impl StorageBackend {
    /// Whether files for this backend live in a remote object store.
    pub fn is_remote(&self) -> bool {
        matches!(self, StorageBackend::S3)
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

/// How upload keys are generated.
///
/// Local storage deduplicates colliding names on its own; remote object stores
/// with bucket-owner-enforced ownership silently overwrite, so remote keys carry
/// a uniqueness token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Local,
    Remote,
}

impl StorageMode {
    pub fn is_remote(&self) -> bool {
        matches!(self, StorageMode::Remote)
    }
}

impl From<StorageBackend> for StorageMode {
    fn from(backend: StorageBackend) -> Self {
        if backend.is_remote() {
            StorageMode::Remote
        } else {
            StorageMode::Local
        }
    }
}

impl From<bool> for StorageMode {
    fn from(remote: bool) -> Self {
        if remote {
            StorageMode::Remote
        } else {
            StorageMode::Local
        }
    }
}
