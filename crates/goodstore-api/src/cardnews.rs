//! Handler for `GET /cardnews`.

use axum::{Json, extract::State};
use goodstore_core::{geocode::Geocoder, repository::StoreRepository};

use crate::{ApiState, error::ApiError, views::CardNewsListing};

/// `GET /cardnews`: every card-news row with its store's name and categories.
pub async fn list<S, G>(
  State(state): State<ApiState<S, G>>,
) -> Result<Json<Vec<CardNewsListing>>, ApiError>
where
  S: StoreRepository,
  G: Geocoder,
{
  let entries = state.store.list_card_news().await.map_err(ApiError::store)?;
  Ok(Json(entries.into_iter().map(Into::into).collect()))
}
