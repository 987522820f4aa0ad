//! Error type for `goodstore-store-sqlite`.

use goodstore_core::store::StoreId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] goodstore_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("store not found: {0}")]
  StoreNotFound(StoreId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
