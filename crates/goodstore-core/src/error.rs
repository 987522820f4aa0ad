//! Error types for `goodstore-core`.

use thiserror::Error;

use crate::store::StoreId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store not found: {0}")]
  StoreNotFound(StoreId),

  #[error("candidate has no address")]
  MissingAddress,

  #[error("candidate has no store name")]
  MissingName,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure of a pipeline operation: either the input was rejected before any
/// storage access, or the backend failed.
#[derive(Debug, Error)]
pub enum PipelineError<E> {
  #[error(transparent)]
  Core(#[from] Error),

  #[error("store error: {0}")]
  Store(#[source] E),
}
