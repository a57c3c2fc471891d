//! SQLite backend for the Casebook subject store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Each mutation executes inside
//! one explicit transaction on that serialized connection, so the parent
//! patch and the version snapshot are observed together or not at all.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
