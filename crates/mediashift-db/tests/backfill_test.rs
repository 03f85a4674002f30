//! Backfill behaviour against the in-memory record store.
//!
//! The Postgres test at the bottom is ignored by default; run it with
//! `TEST_DATABASE_URL=postgres://... cargo test -p mediashift-db -- --ignored`.

use mediashift_core::AppError;
use mediashift_db::{
    run_path_backfill, InMemoryPathRecordStore, PathPrefixBackfill, PathRecordStore,
    PostgresPathRecordStore,
};

fn owned(paths: &[Option<&str>]) -> Vec<Option<String>> {
    paths.iter().map(|p| p.map(String::from)).collect()
}

#[tokio::test]
async fn prefixes_only_paths_that_need_it() {
    let store =
        InMemoryPathRecordStore::from_paths(&[Some("seth.jpg"), Some("media/x.png"), None, Some("")]);

    let count = run_path_backfill(&store, "media/").await.unwrap();

    assert_eq!(count, 1);
    assert_eq!(
        store.paths().unwrap(),
        owned(&[Some("media/seth.jpg"), Some("media/x.png"), None, Some("")])
    );
    assert_eq!(store.writes().unwrap(), 1);
}

#[tokio::test]
async fn second_run_changes_nothing() {
    let store = InMemoryPathRecordStore::from_paths(&[
        Some("a.png"),
        Some("b/c.png"),
        Some("media/d.png"),
    ]);
    let backfill = PathPrefixBackfill::default();

    assert_eq!(backfill.run(&store).await.unwrap(), 2);
    let after_first = store.paths().unwrap();

    assert_eq!(backfill.run(&store).await.unwrap(), 0);
    assert_eq!(store.paths().unwrap(), after_first);
    assert_eq!(store.writes().unwrap(), 2);
}

#[tokio::test]
async fn substring_match_is_not_a_prefix() {
    let store = InMemoryPathRecordStore::from_paths(&[Some("foo/media/bar.jpg")]);

    assert_eq!(run_path_backfill(&store, "media/").await.unwrap(), 1);
    assert_eq!(
        store.paths().unwrap(),
        owned(&[Some("media/foo/media/bar.jpg")])
    );
}

#[tokio::test]
async fn stops_on_first_failed_write() {
    let store = InMemoryPathRecordStore::from_paths(&[
        Some("one.png"),
        Some("two.png"),
        Some("three.png"),
    ]);
    store.reject_writes_for(2).unwrap();

    let err = run_path_backfill(&store, "media/").await.unwrap_err();
    assert!(matches!(err, AppError::Persistence { record_id: 2, .. }));

    // Records before the failure stay updated; the rest are untouched.
    assert_eq!(
        store.paths().unwrap(),
        owned(&[Some("media/one.png"), Some("two.png"), Some("three.png")])
    );
}

#[tokio::test]
async fn empty_store_reports_zero() {
    let store = InMemoryPathRecordStore::default();
    assert_eq!(run_path_backfill(&store, "media/").await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn postgres_store_backfills_table() {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = sqlx::PgPool::connect(&url).await.unwrap();

    sqlx::query("DROP TABLE IF EXISTS backfill_test_messages")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("CREATE TABLE backfill_test_messages (id SERIAL PRIMARY KEY, file TEXT)")
        .execute(&pool)
        .await
        .unwrap();
    for path in [Some("seth.jpg"), Some("media/x.png"), None, Some("")] {
        sqlx::query("INSERT INTO backfill_test_messages (file) VALUES ($1)")
            .bind(path)
            .execute(&pool)
            .await
            .unwrap();
    }

    let store = PostgresPathRecordStore::new(pool.clone(), "backfill_test_messages", "file").unwrap();
    assert_eq!(run_path_backfill(&store, "media/").await.unwrap(), 1);
    assert_eq!(run_path_backfill(&store, "media/").await.unwrap(), 0);

    let paths: Vec<Option<String>> =
        sqlx::query_scalar("SELECT file FROM backfill_test_messages ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(
        paths,
        owned(&[Some("media/seth.jpg"), Some("media/x.png"), None, Some("")])
    );

    let missing = store.update_file_path(9999, "media/nope.png").await;
    assert!(matches!(missing, Err(AppError::Persistence { record_id: 9999, .. })));

    sqlx::query("DROP TABLE backfill_test_messages")
        .execute(&pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn postgres_store_rejects_unsafe_identifiers() {
    // Identifier validation happens before any connection is used.
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .unwrap();
    assert!(PostgresPathRecordStore::new(pool.clone(), "messages; --", "file").is_err());
    assert!(PostgresPathRecordStore::new(pool.clone(), "messages", "a.b").is_err());
    assert!(PostgresPathRecordStore::new(pool, "public.messages", "file").is_ok());
}

async fn seed_table(pool: &sqlx::PgPool, table: &str, paths: &[Option<&str>]) {
    sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(&format!("CREATE TABLE {table} (id SERIAL PRIMARY KEY, file TEXT)"))
        .execute(pool)
        .await
        .unwrap();
    for path in paths {
        sqlx::query(&format!("INSERT INTO {table} (file) VALUES ($1)"))
            .bind(*path)
            .execute(pool)
            .await
            .unwrap();
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn postgres_backfill_runs_on_single_connection_pool() {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(3))
        .connect(&url)
        .await
        .unwrap();
    seed_table(&pool, "backfill_single_conn", &[Some("seth.jpg"), Some("media/x.png")]).await;

    let store = PostgresPathRecordStore::new(pool.clone(), "backfill_single_conn", "file").unwrap();
    assert_eq!(run_path_backfill(&store, "media/").await.unwrap(), 1);

    let paths: Vec<Option<String>> =
        sqlx::query_scalar("SELECT file FROM backfill_single_conn ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(paths, owned(&[Some("media/seth.jpg"), Some("media/x.png")]));

    sqlx::query("DROP TABLE backfill_single_conn")
        .execute(&pool)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn postgres_backfill_walks_every_page() {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = sqlx::PgPool::connect(&url).await.unwrap();
    seed_table(
        &pool,
        "backfill_paged",
        &[Some("a.png"), None, Some("media/b.png"), Some("c.png"), Some(""), Some("d.png")],
    )
    .await;

    let store = PostgresPathRecordStore::new(pool.clone(), "backfill_paged", "file")
        .unwrap()
        .with_page_size(2);
    assert_eq!(run_path_backfill(&store, "media/").await.unwrap(), 3);
    assert_eq!(run_path_backfill(&store, "media/").await.unwrap(), 0);

    let paths: Vec<Option<String>> = sqlx::query_scalar("SELECT file FROM backfill_paged ORDER BY id")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(
        paths,
        owned(&[
            Some("media/a.png"),
            None,
            Some("media/b.png"),
            Some("media/c.png"),
            Some(""),
            Some("media/d.png"),
        ])
    );

    sqlx::query("DROP TABLE backfill_paged")
        .execute(&pool)
        .await
        .unwrap();
}
