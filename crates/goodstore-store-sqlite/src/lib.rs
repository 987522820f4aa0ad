//! SQLite backend for the goodstore pipeline.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every write runs inside a
//! [`rusqlite::Transaction`] opened and finished within a single
//! `Connection::call`, so no transaction ever spans an `.await`.

mod encode;
mod schema;
mod sql;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
