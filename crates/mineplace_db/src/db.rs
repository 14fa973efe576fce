use chrono::{DateTime, Utc};
use mineplace_core::prelude::*;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::schema::SCHEMA;

/// Handle to the marketplace database
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open or create the database at `url` (e.g. `sqlite://mineplace.db`) and run migrations.
    pub async fn connect(url: &str) -> MarketResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        info!("Connected to database at {url}");
        Self::from_pool(pool).await
    }

    /// A private in-memory database. Backed by a single connection that is never recycled,
    /// since every new in-memory connection would see an empty database.
    pub async fn in_memory() -> MarketResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> MarketResult<Self> {
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run schema migrations
    async fn migrate(&self) -> MarketResult<()> {
        // all CREATE IF NOT EXISTS
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn now() -> DateTime<Utc> {
        Utc::now()
    }
}

/// Maps a unique-constraint violation to a Conflict carrying `msg`.
pub(crate) fn conflict_on_unique(err: sqlx::Error, msg: &str) -> MarketError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => MarketError::conflict(msg),
        _ => err.into(),
    }
}
