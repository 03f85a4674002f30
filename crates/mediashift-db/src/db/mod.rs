//! Database access
//!
//! `pool` builds the Postgres connection pool; `records` holds the record store
//! trait and its Postgres and in-memory implementations.

pub mod pool;
pub mod records;
