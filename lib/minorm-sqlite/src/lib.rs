//! SQLite backend for minorm.
//!
//! Same surface as `minorm-mysql`, backed by a file or an in-memory
//! database. Useful for tests and single-process tools:
//!
//! ```text
//! use minorm::Model;
//! use minorm_sqlite::SqlitePool;
//!
//! let pool = SqlitePool::memory().await?;
//! user.save(&pool).await?;
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod bind;
mod executor;

pub use executor::SqlitePool;

// Re-export core types for convenience
pub use minorm::{Executor, FindAll, Limit, Model, OrmError, PoolConfig, Row, Value};
