//! MySQL implementation of Executor.

use async_trait::async_trait;
use minorm::driver::{collect_rows, finish_transaction, store_error};
use minorm::{
    Executor, OrmError, Placeholder, PoolConfig, Row, Value, translate_placeholders,
};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use std::ops::Deref;
use tracing::info;

use crate::bind::{bind_arguments, decode_row};

/// Wrapper around sqlx::MySqlPool that implements Executor.
#[derive(Clone, Debug)]
pub struct MySqlPool(sqlx::MySqlPool);

impl MySqlPool {
    /// Create a new MySqlPool from an sqlx MySqlPool.
    pub fn new(pool: sqlx::MySqlPool) -> Self {
        Self(pool)
    }

    /// Open a bounded pool to the configured server.
    ///
    /// Fails when the server is unreachable or rejects the credentials.
    pub async fn connect(config: &PoolConfig) -> Result<Self, OrmError> {
        config.validate()?;
        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "create database connection pool..."
        );

        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .database(&config.database)
            .charset(&config.charset);
        if !config.password.is_empty() {
            options = options.password(&config.password);
        }

        let autocommit = config.autocommit;
        let pool = MySqlPoolOptions::new()
            .min_connections(config.minsize)
            .max_connections(config.maxsize)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    if !autocommit {
                        sqlx::query("SET autocommit = 0").execute(&mut *conn).await?;
                    }
                    Ok(())
                })
            })
            .connect_with(options)
            .await
            .map_err(store_error)?;
        Ok(Self(pool))
    }

    /// Get the inner sqlx::MySqlPool.
    pub fn inner(&self) -> &sqlx::MySqlPool {
        &self.0
    }

    /// Close every connection and wait for borrowed ones to return.
    pub async fn close(&self) {
        self.0.close().await;
    }
}

impl Deref for MySqlPool {
    type Target = sqlx::MySqlPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl Executor for MySqlPool {
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
