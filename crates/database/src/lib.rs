//! # rowmap database crate
//!
//! Maps `#[derive(Record)]` types onto PostgreSQL tables.
//!
//! - `schema` and `query` build [`Statement`]s from record descriptors. They are
//!   pure and never touch the network.
//! - `materialize` turns result sets back into records.
//! - [`Connection`] executes statements on a single session and exposes the
//!   record-level operations (`create_table`, `select_from_where`,
//!   `insert_object`, ...).
//! - [`Transaction`] is the only place row-locking reads and table locks are
//!   available.
//!
//! ```ignore
//! use database::{Connection, Filter, Record};
//!
//! #[derive(Debug, Default, Record)]
//! struct Pizza {
//!     #[sql(column = "id", sql_type = "SERIAL", constraint = "PRIMARY KEY")]
//!     id: i32,
//!     #[sql(column = "topping")]
//!     topping: String,
//! }
//!
//! conn.create_table::<Pizza>("Pizza").await?;
//! let id = conn.insert_object(&pizza, "Pizza").await?;
//! let cheap: Vec<Pizza> = conn.select_from_where("Pizza", Filter::le("id", 2)).await?;
//! ```

pub mod connection;
pub mod error;
pub mod filter;
pub mod lock;
pub mod materialize;
mod operations;
pub mod query;
pub mod schema;
pub mod statement;
pub mod transaction;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{Connection, connect_options};
pub use core_types::{self, ColumnHeader, Entry, Record, SqlType};
pub use error::DbError;
pub use filter::{Comparison, Filter, Fragment};
pub use lock::LockMode;
pub use materialize::{ColumnMeta, RowSource, materialize};
pub use statement::Statement;
pub use transaction::Transaction;
