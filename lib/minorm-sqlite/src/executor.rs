//! SQLite implementation of Executor.

use async_trait::async_trait;
use minorm::driver::{collect_rows, finish_transaction, store_error};
use minorm::{
    Executor, OrmError, Placeholder, PoolConfig, Row, Value, translate_placeholders,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::ops::Deref;
use std::str::FromStr;
use tracing::info;

use crate::bind::{bind_arguments, decode_row};

/// Wrapper around sqlx::SqlitePool that implements Executor.
#[derive(Clone, Debug)]
pub struct SqlitePool(sqlx::SqlitePool);

impl SqlitePool {
    /// Create a new SqlitePool from an sqlx SqlitePool.
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self(pool)
    }

    /// Open a pool on the database file named by `config.database`,
    /// creating the file when it is missing.
    ///
    /// Only the database name and pool bounds are used.
    pub async fn connect(config: &PoolConfig) -> Result<Self, OrmError> {
        config.validate()?;
        info!(database = %config.database, "create database connection pool...");

        let options = SqliteConnectOptions::new()
            .filename(&config.database)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .min_connections(config.minsize)
            .max_connections(config.maxsize)
            .connect_with(options)
            .await
            .map_err(store_error)?;
        Ok(Self(pool))
    }

    /// Open a private in-memory database.
    ///
    /// The pool holds a single connection that never expires, since an
    /// in-memory database lives only as long as its connection.
    pub async fn memory() -> Result<Self, OrmError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(store_error)?;
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(store_error)?;
        Ok(Self(pool))
    }

    /// Get the inner sqlx::SqlitePool.
    pub fn inner(&self) -> &sqlx::SqlitePool {
        &self.0
    }

    /// Close every connection and wait for borrowed ones to return.
    pub async fn close(&self) {
        self.0.close().await;
    }
}

impl Deref for SqlitePool {
    type Target = sqlx::SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl Executor for SqlitePool {
    async fn select(
        &self,
        sql: &str,
        args: &[Value],
        limit: Option<usize>,
    ) -> Result<Vec<Row>, OrmError> {
        let sql = translate_placeholders(sql, Placeholder::QuestionMark);
        info!("SQL: {}", sql);
        let arguments = bind_arguments(args)?;

        let mut conn = self.0.acquire().await.map_err(store_error)?;
        let stream = sqlx::query_with(&sql, arguments).fetch(&mut *conn);
        collect_rows(stream, limit, decode_row).await
    }

    async fn execute(
        &self,
        sql: &str,
        args: &[Value],
        autocommit: bool,
    ) -> Result<u64, OrmError> {
        let sql = translate_placeholders(sql, Placeholder::QuestionMark);
        info!("SQL: {}", sql);
        let arguments = bind_arguments(args)?;

        if autocommit {
            let mut conn = self.0.acquire().await.map_err(store_error)?;
            let result = sqlx::query_with(&sql, arguments)
                .execute(&mut *conn)
                .await
                .map_err(store_error)?;
            return Ok(result.rows_affected());
        }

        let mut tx = self.0.begin().await.map_err(store_error)?;
        let result = sqlx::query_with(&sql, arguments)
            .execute(&mut *tx)
            .await
            .map(|done| done.rows_affected());
        finish_transaction(tx, result).await
    }
}
