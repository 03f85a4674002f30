//! Prefix stored file paths with `media/` (or BACKFILL_PREFIX).
//!
//! Takes no flags; configuration comes from DATABASE_URL, BACKFILL_TABLE,
//! BACKFILL_COLUMN and BACKFILL_PREFIX.

use anyhow::Result;
use mediashift_cli::{backfill_summary, init_tracing, run_path_backfill};
use mediashift_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let updated = run_path_backfill(&config).await?;

    println!("{}", backfill_summary(updated));
    Ok(())
}
