//! Postgres record store over a configurable table and path column.
//!
//! Records are read in pages keyed by id, so no connection stays checked out
//! between pages and updates can run on a pool of one.

use super::{PathRecord, PathRecordStore, RecordStream};
use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use mediashift_core::config::is_valid_identifier;
use mediashift_core::{AppError, BackfillConfig};
use sqlx::{PgPool, Postgres};

const DEFAULT_PAGE_SIZE: i64 = 500;

/// Row type for the path query (for FromRow).
#[derive(Debug, sqlx::FromRow)]
struct PathRecordRow {
    id: i64,
    file_path: Option<String>,
}

impl From<PathRecordRow> for PathRecord {
    fn from(row: PathRecordRow) -> Self {
        PathRecord {
            id: row.id,
            file_path: row.file_path,
        }
    }
}

#[derive(Clone)]
pub struct PostgresPathRecordStore {
    pool: PgPool,
    table: String,
    column: String,
    page_size: i64,
    select_sql: String,
    update_sql: String,
}

impl PostgresPathRecordStore {
    /// `table` may be schema-qualified; both names are validated before being
    /// spliced into SQL.
    pub fn new(pool: PgPool, table: &str, column: &str) -> Result<Self, AppError> {
        if !is_valid_identifier(table) {
            return Err(AppError::Config(format!("Invalid table name: {}", table)));
        }
        if !is_valid_identifier(column) || column.contains('.') {
            return Err(AppError::Config(format!("Invalid column name: {}", column)));
        }

        let select_sql = format!(
            "SELECT id::BIGINT AS id, {column}::TEXT AS file_path FROM {table} \
             WHERE {column} IS NOT NULL AND {column} <> '' AND id > $1 \
             ORDER BY id LIMIT $2"
        );
        let update_sql = format!("UPDATE {table} SET {column} = $1 WHERE id = $2");

        Ok(Self {
            pool,
            table: table.to_string(),
            column: column.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            select_sql,
            update_sql,
        })
    }

    pub fn from_config(pool: PgPool, config: &BackfillConfig) -> Result<Self, AppError> {
        Self::new(pool, &config.table, &config.column)
    }

    /// Rows fetched per query while streaming records.
    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Fetch the page after `cursor`; `None` once the previous page came back short.
    async fn next_page(
        &self,
        cursor: Option<i64>,
    ) -> Result<Option<(Vec<PathRecord>, Option<i64>)>, AppError> {
        let Some(after) = cursor else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<Postgres, PathRecordRow>(&self.select_sql)
            .bind(after)
            .bind(self.page_size)
            .fetch_all(&self.pool)
            .await?;

        let next = if (rows.len() as i64) < self.page_size {
            None
        } else {
            rows.last().map(|row| row.id)
        };

        Ok(Some((rows.into_iter().map(PathRecord::from).collect(), next)))
    }
}

#[async_trait]
impl PathRecordStore for PostgresPathRecordStore {
    fn records_with_path(&self) -> RecordStream<'_> {
        stream::try_unfold(Some(i64::MIN), move |cursor| self.next_page(cursor))
            .map_ok(|page| stream::iter(page.into_iter().map(Ok::<_, AppError>)))
            .try_flatten()
            .boxed()
    }

    #[tracing::instrument(skip(self, file_path), fields(db.table = %self.table, db.record_id = record_id))]
    async fn update_file_path(&self, record_id: i64, file_path: &str) -> Result<(), AppError> {
        let result = sqlx::query(&self.update_sql)
            .bind(file_path)
            .bind(record_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Persistence {
                record_id,
                message: e.to_string(),
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::Persistence {
                record_id,
                message: format!("no row with id {} in {}", record_id, self.table),
            });
        }

        Ok(())
    }
}
