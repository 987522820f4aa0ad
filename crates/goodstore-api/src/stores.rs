//! Handlers for the `/stores` read endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/stores` | Optional `?categories=<code>` |
//! | `GET`  | `/stores/search` | `?q=<substring>`; an empty query returns `[]` |
//! | `GET`  | `/stores/{id}` | 404 if not found |
//!
//! Listings only include stores that have reached
//! [`MIN_SCORE`](goodstore_core::score::MIN_SCORE); the detail endpoint shows
//! any store.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use goodstore_core::{
  geocode::Geocoder,
  repository::{StoreQuery, StoreRepository},
  score::MIN_SCORE,
  store::StoreId,
};
use serde::Deserialize;

use crate::{
  ApiState,
  error::ApiError,
  views::{StoreDetail, StoreSummary},
};

async fn listed<S: StoreRepository>(
  store: &S,
  query: StoreQuery,
) -> Result<Json<Vec<StoreSummary>>, ApiError> {
  let views = store
    .list_stores(StoreQuery { min_score: Some(i64::from(MIN_SCORE)), ..query })
    .await
    .map_err(ApiError::store)?;
  Ok(Json(views.into_iter().map(Into::into).collect()))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub categories: Option<String>,
}

/// `GET /stores[?categories=<code>]`
pub async fn list<S, G>(
  State(state): State<ApiState<S, G>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<StoreSummary>>, ApiError>
where
  S: StoreRepository,
  G: Geocoder,
{
  let category = params.categories.filter(|c| !c.trim().is_empty());
  listed(&*state.store, StoreQuery { category, ..Default::default() }).await
}

// ─── Search ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  #[serde(default)]
  pub q: String,
}

/// `GET /stores/search?q=<substring>`
pub async fn search<S, G>(
  State(state): State<ApiState<S, G>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<StoreSummary>>, ApiError>
where
  S: StoreRepository,
  G: Geocoder,
{
  let q = params.q.trim();
  if q.is_empty() {
    return Ok(Json(Vec::new()));
  }
  let query = StoreQuery { name_contains: Some(q.to_owned()), ..Default::default() };
  listed(&*state.store, query).await
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /stores/{id}`
pub async fn get_one<S, G>(
  State(state): State<ApiState<S, G>>,
  Path(id): Path<StoreId>,
) -> Result<Json<StoreDetail>, ApiError>
where
  S: StoreRepository,
  G: Geocoder,
{
  let view = state
    .store
    .get_store(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("store {id} not found")))?;
  Ok(Json(view.into()))
}
