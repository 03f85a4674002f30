//! Mediashift Core Library
//!
//! This crate provides the configuration, error types and storage enums shared
//! by the storage, database and CLI crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BackfillConfig, Config};
pub use error::AppError;
pub use storage_types::{StorageBackend, StorageMode};
