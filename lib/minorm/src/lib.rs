//! minorm - a minimal async object-relational mapper.
//!
//! Record types are declared once, turned into an immutable [`Schema`] with
//! precomputed SELECT/INSERT/UPDATE/DELETE statements, and persisted through
//! an [`Executor`] supplied by a backend crate (`minorm-mysql`,
//! `minorm-sqlite`).
//!
//! # Core Concepts
//!
//! - **Field descriptors** ([`StringField`], [`IntegerField`], ...): column type,
//!   primary-key flag, column name override and default of one attribute.
//! - **Schema**: built by [`SchemaBuilder`]; exactly one primary key per type.
//! - **Model**: a record type with CRUD verbs (`find`, `find_all`,
//!   `find_number`, `save`, `update`, `remove`).
//!
//! # Usage
//!
//! ```text
//! use minorm::{FindAll, Model};
//!
//! #[derive(Model)]
//! #[model(table = "users")]
//! pub struct User {
//!     #[field(primary_key, ddl = "varchar(50)", default_with = next_id)]
//!     pub id: Option<String>,
//!     pub email: String,
//!     pub admin: Option<bool>,
//!     #[field(default_with = chrono::Utc::now)]
//!     pub created_at: Option<chrono::DateTime<chrono::Utc>>,
//! }
//!
//! let mut user = User { id: None, email: "ada@example.com".into(), admin: None, created_at: None };
//! user.save(&pool).await?;
//! let admins = User::find_all(&pool, FindAll::new().filter("`admin`=?", [true])).await?;
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

// Lets `#[derive(Model)]` output, which names `::minorm`, expand inside this crate.
extern crate self as minorm;

pub mod config;
#[cfg(feature = "sqlx")]
pub mod driver;
mod error;
mod executor;
mod field;
mod model;
mod schema;
mod value;

pub use config::PoolConfig;
pub use error::OrmError;
pub use executor::{Executor, Placeholder, translate_placeholders};
pub use field::{
    BooleanField, DatetimeField, DefaultValue, Field, FieldKind, FloatField, IntegerField,
    StringField, TextField,
};
pub use model::{FindAll, Limit, Model};
pub use schema::{Schema, SchemaBuilder};
pub use value::{FromValue, Row, Value};

// Re-export async_trait for backend crates
pub use async_trait::async_trait;

// Re-export derive macro
pub use minorm_derive::Model;
