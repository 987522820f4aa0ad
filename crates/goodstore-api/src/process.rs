//! Ingestion webhooks for classification results.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/stores/process` | One record; 400 on a missing or invalid body |
//! | `POST` | `/stores/process/batch` | An array of records, reconciled in order |
//!
//! A record below the score threshold for an unknown address is accepted but
//! writes nothing; the response then carries `"store_id": null`. A record
//! without a store name may still update the store already at its address.
//! It is only refused when it would create one.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use goodstore_core::{
  candidate::ClassificationRecord,
  geocode::Geocoder,
  reconcile::Reconciler,
  repository::StoreRepository,
  store::StoreId,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{ApiState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
  pub status:   &'static str,
  /// The matched store's name, else the name the record carried.
  pub store:    Option<String>,
  pub store_id: Option<StoreId>,
}

/// `POST /stores/process`, body: one classification record.
pub async fn one<S, G>(
  State(state): State<ApiState<S, G>>,
  payload: Result<Json<ClassificationRecord>, JsonRejection>,
) -> Result<Json<ProcessResponse>, ApiError>
where
  S: StoreRepository,
  G: Geocoder,
{
  let Json(record) = payload.map_err(|rejection| {
    warn!(error = %rejection.body_text(), "rejected classification payload");
    ApiError::BadRequest(rejection.body_text())
  })?;
  debug!(?record, "classification record received");

  let candidate = record.into_candidate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
  let name = candidate.name.clone();
  let store = Reconciler::new(&*state.store, &*state.geocoder)
    .reconcile(candidate)
    .await?;

  Ok(Json(ProcessResponse {
    status:   "ok",
    store:    store.as_ref().map(|s| s.name.clone()).or(name),
    store_id: store.map(|s| s.id),
  }))
}

// ─── Batch ────────────────────────────────────────────────────────────────────

/// Outcome of one record in a batch.
#[derive(Debug, Serialize)]
pub struct BatchItem {
  pub store_name: Option<String>,
  pub address:    Option<String>,
  pub store_id:   Option<StoreId>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:      Option<String>,
}

fn text_field(value: &Value, key: &str) -> Option<String> {
  value.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// `POST /stores/process/batch`, body: an array of classification records.
///
/// Only the outer array must parse. Each element is decoded on its own, so a
/// malformed record fails alone and the rest are still reconciled.
pub async fn batch<S, G>(
  State(state): State<ApiState<S, G>>,
  payload: Result<Json<Vec<Value>>, JsonRejection>,
) -> Result<Json<Vec<BatchItem>>, ApiError>
where
  S: StoreRepository,
  G: Geocoder,
{
  let Json(values) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
  let reconciler = Reconciler::new(&*state.store, &*state.geocoder);

  let mut items = Vec::with_capacity(values.len());
  for value in values {
    let mut item = BatchItem {
      store_name: text_field(&value, "store_name"),
      address:    text_field(&value, "address"),
      store_id:   None,
      error:      None,
    };
    let candidate = ClassificationRecord::from_value(value)
      .and_then(ClassificationRecord::into_candidate);
    let result = match candidate {
      Ok(candidate) => reconciler.reconcile(candidate).await.map_err(|e| e.to_string()),
      Err(e) => Err(e.to_string()),
    };
    match result {
      Ok(store) => item.store_id = store.map(|s| s.id),
      Err(message) => {
        warn!(store_name = ?item.store_name, error = %message, "batch record failed");
        item.error = Some(message);
      }
    }
    items.push(item);
  }
  Ok(Json(items))
}
