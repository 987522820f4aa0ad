//! JSON HTTP API for goodstore.
//!
//! Exposes an axum [`Router`] backed by any
//! [`goodstore_core::repository::StoreRepository`] and
//! [`goodstore_core::geocode::Geocoder`]. Transport concerns (binding, TLS,
//! request tracing) are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(goodstore_api::api_router(store.clone(), geocoder.clone()))
//! ```

pub mod cardnews;
pub mod error;
pub mod process;
pub mod stores;
pub mod views;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use goodstore_core::{geocode::Geocoder, repository::StoreRepository};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S, G> {
  pub store:    Arc<S>,
  pub geocoder: Arc<G>,
}

impl<S, G> Clone for ApiState<S, G> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), geocoder: Arc::clone(&self.geocoder) }
  }
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S, G>(store: Arc<S>, geocoder: Arc<G>) -> Router<()>
where
  S: StoreRepository + 'static,
  G: Geocoder + 'static,
{
  Router::new()
    // Reads
    .route("/stores", get(stores::list::<S, G>))
    .route("/stores/search", get(stores::search::<S, G>))
    .route("/stores/{id}", get(stores::get_one::<S, G>))
    .route("/cardnews", get(cardnews::list::<S, G>))
    // Ingestion
    .route("/stores/process", post(process::one::<S, G>))
    .route("/stores/process/batch", post(process::batch::<S, G>))
    .with_state(ApiState { store, geocoder })
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use goodstore_core::{
    geocode::NoGeocoder,
    taxonomy::{default_categories, default_certification_types},
  };
  use goodstore_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store
      .seed_taxonomy(default_categories(), default_certification_types())
      .await
      .unwrap();
    api_router(Arc::new(store), Arc::new(NoGeocoder))
  }

  async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let req = builder
      .body(Body::from(body.unwrap_or_default().to_string()))
      .unwrap();
    app.clone().oneshot(req).await.unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn record(name: &str, address: &str, news: i64, categories: &[&str]) -> String {
    json!({
      "store_name": name,
      "address": address,
      "categories": categories,
      "positive_news_count": news,
      "positive_sns_count": 0,
      "cardnews": {"title": format!("{name} news"), "summary": "S"}
    })
    .to_string()
  }

  async fn process(app: &Router, body: &str) -> Value {
    let resp = send(app, "POST", "/stores/process", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    json_body(resp).await
  }

  // ── Ingestion ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn process_creates_store_at_threshold() {
    let app = app().await;
    let body = process(&app, &record("Green Cafe", "1 Main St", 2, &["eco_friendly"])).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "Green Cafe");
    assert!(body["store_id"].is_i64());
  }

  #[tokio::test]
  async fn process_below_threshold_is_ok_without_store() {
    let app = app().await;
    let body = process(&app, &record("Tiny", "9 Side St", 1, &[])).await;
    assert_eq!(body["status"], "ok");
    assert!(body["store_id"].is_null());

    let listed = json_body(send(&app, "GET", "/stores", None).await).await;
    assert_eq!(listed, json!([]));
  }

  #[tokio::test]
  async fn process_rejects_missing_or_invalid_body() {
    let app = app().await;

    let resp = send(&app, "POST", "/stores/process", Some("")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(&app, "POST", "/stores/process", Some("{not json")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["error"].is_string());

    // Nameless and scoring high enough to create a store.
    let nameless = r#"{"address": "1 Main St", "positive_news_count": 2}"#;
    let resp = send(&app, "POST", "/stores/process", Some(nameless)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(&app, "POST", "/stores/process", Some(r#"{"address": 7}"#)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(&app, "POST", "/stores/process", Some(r#"{"store_name": "A"}"#)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn batch_reports_each_record() {
    let app = app().await;
    let body = format!(
      "[{}, {{\"address\": \"nameless\", \"positive_news_count\": 2}}, {}]",
      record("A", "1 Main St", 2, &[]),
      record("B", "2 Main St", 0, &[]),
    );
    let resp = send(&app, "POST", "/stores/process/batch", Some(&body)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let items = json_body(resp).await;
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert!(items[0]["store_id"].is_i64());
    assert!(items[0].get("error").is_none());
    assert!(items[1]["error"].is_string());
    assert!(items[2]["store_id"].is_null());
    assert!(items[2].get("error").is_none());
  }

  #[tokio::test]
  async fn nameless_record_updates_store_at_its_address() {
    let app = app().await;
    let created = process(&app, &record("Green Cafe", "1 Main St", 2, &[])).await;

    let body = process(
      &app,
      r#"{"address": "1 Main St", "categories": ["sharing"], "positive_sns_count": 1}"#,
    )
    .await;
    assert_eq!(body["store_id"], created["store_id"]);
    assert_eq!(body["store"], "Green Cafe");

    let id = created["store_id"].as_i64().unwrap();
    let detail = json_body(send(&app, "GET", &format!("/stores/{id}"), None).await).await;
    assert_eq!(detail["score"], 60);
  }

  #[tokio::test]
  async fn batch_isolates_malformed_records() {
    let app = app().await;
    let body = json!([
      {"store_name": "A", "address": "1 Main St", "positive_news_count": 2},
      {"store_name": "B", "address": "2 Main St", "positive_news_count": "two"},
      {"store_name": "C", "address": "3 Main St", "positive_news_count": 2},
    ])
    .to_string();
    let resp = send(&app, "POST", "/stores/process/batch", Some(&body)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let items = json_body(resp).await;
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert!(items[0]["store_id"].is_i64());
    assert_eq!(items[1]["store_name"], "B");
    assert_eq!(items[1]["address"], "2 Main St");
    assert!(items[1]["store_id"].is_null());
    assert!(items[1]["error"].is_string());
    assert!(items[2]["store_id"].is_i64());

    let resp = send(&app, "POST", "/stores/process/batch", Some(r#"{"store_name": "A"}"#)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Reads ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn stores_listing_includes_card_news() {
    let app = app().await;
    process(&app, &record("Green Cafe", "1 Main St", 2, &["eco_friendly"])).await;

    let listed = json_body(send(&app, "GET", "/stores", None).await).await;
    let store = &listed[0];
    assert_eq!(store["name"], "Green Cafe");
    assert_eq!(store["score"], 50);
    assert_eq!(store["categories"], json!(["eco_friendly"]));
    assert_eq!(store["cardnews"][0]["title"], "Green Cafe news");
    let created = store["cardnews"][0]["created_at"].as_str().unwrap();
    assert_eq!(created.len(), "2024-01-01".len());
  }

  #[tokio::test]
  async fn stores_filter_by_category() {
    let app = app().await;
    process(&app, &record("Green Cafe", "1 Main St", 2, &["eco_friendly"])).await;
    process(&app, &record("Share Deli", "2 Main St", 2, &["sharing"])).await;

    let eco = json_body(send(&app, "GET", "/stores?categories=eco_friendly", None).await).await;
    assert_eq!(eco.as_array().unwrap().len(), 1);
    assert_eq!(eco[0]["name"], "Green Cafe");

    let all = json_body(send(&app, "GET", "/stores?categories=", None).await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn search_matches_substring_and_empty_query_is_empty() {
    let app = app().await;
    process(&app, &record("Green Cafe", "1 Main St", 2, &[])).await;

    let hits = json_body(send(&app, "GET", "/stores/search?q=cafe", None).await).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);

    let none = json_body(send(&app, "GET", "/stores/search?q=%20", None).await).await;
    assert_eq!(none, json!([]));

    let none = json_body(send(&app, "GET", "/stores/search", None).await).await;
    assert_eq!(none, json!([]));
  }

  #[tokio::test]
  async fn store_detail_and_not_found() {
    let app = app().await;
    let created = process(&app, &record("Green Cafe", "1 Main St", 2, &["eco_friendly"])).await;
    let id = created["store_id"].as_i64().unwrap();

    let resp = send(&app, "GET", &format!("/stores/{id}"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let detail = json_body(resp).await;
    assert_eq!(detail["id"], id);
    assert_eq!(detail["address"], "1 Main St");
    assert_eq!(detail["certifications"], json!([{"source": "녹색매장 인증"}]));
    assert_eq!(detail["cardnews"].as_array().unwrap().len(), 1);

    let resp = send(&app, "GET", "/stores/9999", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(json_body(resp).await["error"].is_string());
  }

  #[tokio::test]
  async fn cardnews_listing_joins_store() {
    let app = app().await;
    let created = process(&app, &record("Green Cafe", "1 Main St", 2, &["eco_friendly"])).await;
    process(&app, &record("Green Cafe", "1 Main St", 0, &[])).await;

    let cards = json_body(send(&app, "GET", "/cardnews", None).await).await;
    let cards = cards.as_array().unwrap();
    assert_eq!(cards.len(), 2);
    assert!(cards.iter().all(|c| c["store_id"] == created["store_id"]));
    assert_eq!(cards[0]["store_name"], "Green Cafe");
    assert_eq!(cards[0]["categories"], json!(["eco_friendly"]));
  }
}
