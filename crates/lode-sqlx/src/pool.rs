//! Connection pool wrapper that binds loaded rows.

use std::sync::Arc;

use lode_core::{Engine, Model};
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Encode, FromRow, Type};
use tracing::{debug, instrument};

use crate::error::AdapterResult;
use crate::fetch::{fetch_in, FetchFuture};

/// SQLite pool settings.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Connection URL, e.g. `sqlite::memory:` or `sqlite://catalog.db`.
    pub url: String,
    /// Maximum pool size. An in-memory database lives in a single
    /// connection, so keep this at 1 for `sqlite::memory:`.
    pub max_connections: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

impl PoolConfig {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

/// A pool paired with the engine that binds everything it loads.
///
/// Rows returned by [`BoundPool::fetch_all`] are already bound together,
/// so their relation accessors batch across the whole result set.
#[derive(Debug, Clone)]
pub struct BoundPool {
    pool: SqlitePool,
    engine: Engine,
}

impl BoundPool {
    /// Wraps an existing pool.
    pub fn new(pool: SqlitePool, engine: Engine) -> Self {
        Self { pool, engine }
    }

    /// Opens a pool with the given settings.
    #[instrument(skip(config, engine), fields(url = %config.url))]
    pub async fn connect(config: &PoolConfig, engine: Engine) -> AdapterResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        debug!(max_connections = config.max_connections, "opened sqlite pool");
        Ok(Self::new(pool, engine))
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The engine loaded rows are bound with.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Runs `sql` and binds every returned row into one batch.
    #[instrument(skip(self))]
    pub async fn fetch_all<R>(&self, sql: &str) -> AdapterResult<Vec<Arc<R>>>
    where
        R: Model + for<'r> FromRow<'r, SqliteRow> + Unpin,
    {
        let rows: Vec<R> = sqlx::query_as(sql).fetch_all(&self.pool).await?;
        debug!(rows = rows.len(), "loaded rows");
        Ok(self.bind_rows(rows))
    }

    /// Binds rows loaded elsewhere into one batch.
    pub fn bind_rows<R: Model>(&self, rows: Vec<R>) -> Vec<Arc<R>> {
        self.engine.bind_values(rows)
    }

    /// [`fetch_in`] against this pool.
    pub fn fetch_in<R, K>(
        &self,
        table: &str,
        column: &str,
    ) -> impl FnOnce(Vec<K>) -> FetchFuture<R> + Send + 'static
    where
        R: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + 'static,
        K: for<'q> Encode<'q, Sqlite> + Type<Sqlite> + Send + 'static,
    {
        fetch_in(&self.pool, table, column)
    }
}
