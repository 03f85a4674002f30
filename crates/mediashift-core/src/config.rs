//! Configuration module
//!
//! This module provides the configuration consumed by the storage backends, the
//! record store and the operator CLI. Values come from the process environment
//! (after loading `.env`), or from any lookup function in tests.

use std::env;
use std::sync::OnceLock;

use regex::Regex;

use crate::constants::{
    DEFAULT_BACKFILL_COLUMN, DEFAULT_BACKFILL_TABLE, DEFAULT_LOCAL_STORAGE_BASE_URL,
    DEFAULT_LOCAL_STORAGE_PATH, MEDIA_PREFIX,
};
use crate::storage_types::{StorageBackend, StorageMode};

const MAX_CONNECTIONS: u32 = 5;
const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Settings for the path prefix backfill.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackfillConfig {
    pub table: String,
    pub column: String,
    pub prefix: String,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_BACKFILL_TABLE.to_string(),
            column: DEFAULT_BACKFILL_COLUMN.to_string(),
            prefix: MEDIA_PREFIX.to_string(),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub storage_backend: StorageBackend,
    pub local_storage_path: String,
    pub local_storage_base_url: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    /// Public URL template, e.g. `https://{bucket}.s3.amazonaws.com/{key}`
    pub media_url: Option<String>,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub backfill: BackfillConfig,
    /// Object key prefix the media sync uploads under.
    pub sync_prefix: String,
}

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
            .expect("identifier regex is valid")
    })
}

/// Whether `name` is safe to splice into SQL as a (optionally schema-qualified) identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    identifier_regex().is_match(name)
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|s| !s.trim().is_empty());

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(s) => s.parse::<StorageBackend>()?,
            None => StorageBackend::Local,
        };

        let mut backfill = BackfillConfig::default();
        if let Some(table) = var("BACKFILL_TABLE") {
            backfill.table = table.trim().to_string();
        }
        if let Some(column) = var("BACKFILL_COLUMN") {
            backfill.column = column.trim().to_string();
        }
        if let Some(prefix) = var("BACKFILL_PREFIX") {
            backfill.prefix = prefix;
        }

        let config = Config {
            storage_backend,
            local_storage_path: var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|| DEFAULT_LOCAL_STORAGE_PATH.to_string()),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_LOCAL_STORAGE_BASE_URL.to_string()),
            s3_bucket: var("S3_BUCKET"),
            s3_region: var("S3_REGION"),
            s3_endpoint: var("S3_ENDPOINT"),
            aws_region: var("AWS_REGION"),
            media_url: var("MEDIA_URL"),
            database_url: var("DATABASE_URL"),
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: var("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            backfill,
            sync_prefix: var("SYNC_PREFIX").unwrap_or_else(|| MEDIA_PREFIX.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks settings every command relies on. Backend requirements (bucket,
    /// region) are checked when a storage backend is created.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !is_valid_identifier(&self.backfill.table) {
            return Err(anyhow::anyhow!(
                "BACKFILL_TABLE is not a valid identifier: {}",
                self.backfill.table
            ));
        }
        if !is_valid_identifier(&self.backfill.column) || self.backfill.column.contains('.') {
            return Err(anyhow::anyhow!(
                "BACKFILL_COLUMN is not a valid identifier: {}",
                self.backfill.column
            ));
        }
        if self.backfill.prefix.is_empty() {
            return Err(anyhow::anyhow!("BACKFILL_PREFIX must not be empty"));
        }

        if let Some(ref url) = self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        Ok(())
    }

    /// Storage mode selected by the configured backend.
    pub fn storage_mode(&self) -> StorageMode {
        self.storage_backend.into()
    }

    pub fn remote_mode(&self) -> bool {
        self.storage_mode().is_remote()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region
            .as_deref()
            .or(self.aws_region.as_deref())
    }

    pub fn database_url(&self) -> Result<&str, anyhow::Error> {
        self.database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))
    }
}
