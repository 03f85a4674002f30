//! Mediashift CLI — tools for moving media from local disk to an object store.
//!
//! Configuration comes from the environment (and `.env`): STORAGE_BACKEND,
//! LOCAL_STORAGE_PATH, S3_BUCKET, S3_REGION, MEDIA_URL, SYNC_PREFIX, DATABASE_URL,
//! BACKFILL_*.

use anyhow::Context;
use clap::{Parser, Subcommand};
use mediashift_cli::{backfill_summary, init_tracing, print_json, run_path_backfill};
use mediashift_core::Config;
use mediashift_storage::{
    create_s3_storage, create_storage, sync_directory, MediaUploader, UploadPathGenerator,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mediashift", about = "Media storage migration tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prefix stored file paths that lack the media prefix
    RunPathBackfill,
    /// Store a file through the configured backend
    Upload {
        /// Entity the file belongs to (e.g. Message)
        entity_type: String,
        /// Path to the file to upload
        file: PathBuf,
        /// MIME type sent to the backend
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
    },
    /// Print the storage key an upload would get right now
    UploadKey {
        /// Entity the file belongs to (e.g. Message)
        entity_type: String,
        /// Original filename
        filename: String,
    },
    /// Copy LOCAL_STORAGE_PATH into the configured S3 bucket under SYNC_PREFIX
    SyncMedia,
}

fn file_name(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::RunPathBackfill => {
            let updated = run_path_backfill(&config).await?;
            println!("{}", backfill_summary(updated));
        }
        Commands::Upload {
            entity_type,
            file,
            content_type,
        } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let storage = create_storage(&config).await?;
            let uploader = MediaUploader::new(storage);
            let stored = uploader
                .upload(&entity_type, &file_name(&file)?, &content_type, data)
                .await?;
            print_json(&stored)?;
        }
        Commands::UploadKey {
            entity_type,
            filename,
        } => {
            let generator = UploadPathGenerator::new(config.storage_mode());
            println!("{}", generator.generate(&entity_type, &filename));
        }
        Commands::SyncMedia => {
            let storage = create_s3_storage(&config).await?;
            let report = sync_directory(
                Path::new(&config.local_storage_path),
                &storage,
                &config.sync_prefix,
            )
            .await?;
            print_json(&report)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_path_backfill_takes_no_flags() {
        let cli = Cli::try_parse_from(["mediashift", "run-path-backfill"]).unwrap();
        assert!(matches!(cli.command, Commands::RunPathBackfill));
        assert!(Cli::try_parse_from(["mediashift", "run-path-backfill", "--dry-run"]).is_err());
    }

    #[test]
    fn upload_defaults_content_type() {
        let cli = Cli::try_parse_from(["mediashift", "upload", "Message", "/tmp/seth.jpg"]).unwrap();
        match cli.command {
            Commands::Upload {
                entity_type,
                file,
                content_type,
            } => {
                assert_eq!(entity_type, "Message");
                assert_eq!(file_name(&file).unwrap(), "seth.jpg");
                assert_eq!(content_type, "application/octet-stream");
            }
            _ => panic!("expected upload command"),
        }
    }

    #[test]
    fn file_name_requires_a_name() {
        assert!(file_name(Path::new("/")).is_err());
    }
}
