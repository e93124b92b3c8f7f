//! MySQL backend for minorm.
//!
//! Wraps an sqlx MySQL pool so it can be handed to every model verb:
//!
//! ```text
//! use minorm::{Model, PoolConfig};
//! use minorm_mysql::MySqlPool;
//!
//! let pool = MySqlPool::connect(&PoolConfig::new("awesome", "www-data", "www-data")).await?;
//! let user = User::find(&pool, "0011").await?;
//! ```
//!
//! Statements run on a pooled connection. Writes with `autocommit = false`
//! run inside a transaction that commits on success and rolls back on
//! failure.

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod bind;
mod executor;

pub use executor::MySqlPool;

// Re-export core types for convenience
pub use minorm::{Executor, FindAll, Limit, Model, OrmError, PoolConfig, Row, Value};
