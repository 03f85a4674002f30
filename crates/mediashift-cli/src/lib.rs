//! Shared pieces of the mediashift binaries.

use anyhow::Context;
use mediashift_core::Config;
use mediashift_db::{PathPrefixBackfill, PostgresPathRecordStore};
use serde::Serialize;

/// Initialize tracing for CLI binaries.
///
/// Logs go to stderr so stdout carries only command output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Connect to the configured database and prefix every stored path that lacks
/// the configured prefix. Returns the number of records modified.
pub async fn run_path_backfill(config: &Config) -> anyhow::Result<u64> {
    let pool = mediashift_db::connect(config).await?;
    let store = PostgresPathRecordStore::from_config(pool.clone(), &config.backfill)
        .context("Invalid backfill table or column")?;

    tracing::info!(
        table = %store.table(),
        column = %store.column(),
        prefix = %config.backfill.prefix,
        "Starting path backfill"
    );

    let updated = PathPrefixBackfill::new(config.backfill.prefix.clone())
        .run(&store)
        .await
        .context("Path backfill failed")?;

    pool.close().await;
    Ok(updated)
}

/// Line printed once the backfill finishes.
pub fn backfill_summary(updated: u64) -> String {
    let noun = if updated == 1 { "record" } else { "records" };
    format!("Updated {} {}", updated, noun)
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backfill_summary_counts() {
        assert_eq!(backfill_summary(0), "Updated 0 records");
        assert_eq!(backfill_summary(1), "Updated 1 record");
        assert_eq!(backfill_summary(12), "Updated 12 records");
    }
}
