//! The process-wide connection handle.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::DbError;

/// Shared handle to the relational store.
///
/// Backed by a pool pinned to exactly one connection that never idles out,
/// so every statement runs on the same connection and the store serializes
/// execution. This also keeps `sqlite::memory:` databases alive for the
/// lifetime of the handle.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the connection described by `url` (e.g. `sqlite://books.db` or
    /// `sqlite::memory:`). File databases are created when missing.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        info!(url, "connecting to database");

        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Access the underlying pool for issuing statements.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip a trivial statement to prove the connection is usable.
    pub async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Release the connection. Outstanding clones become unusable.
    pub async fn close(&self) {
        info!("closing database connection");
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_database_survives_across_statements() {
        let db = Database::connect("sqlite::memory:").await.unwrap();

        sqlx::query("CREATE TABLE t (v INTEGER)")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO t (v) VALUES (1)")
            .execute(db.pool())
            .await
            .unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM t")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn close_marks_handle_closed() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.ping().await.unwrap();

        db.close().await;

        assert!(db.is_closed());
        assert!(db.ping().await.is_err());
    }

    #[tokio::test]
    async fn unique_violation_is_classified() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE t (k TEXT PRIMARY KEY)")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO t (k) VALUES ('a')")
            .execute(db.pool())
            .await
            .unwrap();

        let err = sqlx::query("INSERT INTO t (k) VALUES ('a')")
            .execute(db.pool())
            .await
            .map_err(DbError::from_sqlx)
            .unwrap_err();

        assert!(err.is_unique_violation());
    }
}
