//! Shared constants.

/// Prefix every stored media path must carry once files live in the bucket.
pub const MEDIA_PREFIX: &str = "media/";

/// Table and column holding file paths when nothing else is configured.
pub const DEFAULT_BACKFILL_TABLE: &str = "messages";
pub const DEFAULT_BACKFILL_COLUMN: &str = "file";

pub const DEFAULT_LOCAL_STORAGE_PATH: &str = "./media";
pub const DEFAULT_LOCAL_STORAGE_BASE_URL: &str = "/media/";
