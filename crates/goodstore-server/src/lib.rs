//! Wiring for the `goodstore` binary: configuration, the outbound HTTP
//! clients and the jobs the CLI runs.

pub mod classifier;
pub mod geocode;
pub mod jobs;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::Router;
use goodstore_core::{bulk::DEFAULT_BATCH_SIZE, geocode::Geocoder, repository::StoreRepository};
use goodstore_seed::{SeedSource, default_sources};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use classifier::ClassifierClient;
pub use geocode::KakaoGeocoder;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` layered under
/// `GOODSTORE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                    String,
  pub port:                    u16,
  pub store_path:              PathBuf,
  /// Geocoding is disabled without a key.
  pub kakao_api_key:           Option<String>,
  pub geocode_url:             String,
  pub geocode_timeout_secs:    u64,
  pub classifier_url:          String,
  pub classifier_timeout_secs: u64,
  pub seed_dir:                PathBuf,
  pub batch_size:              usize,
  pub seed_sources:            Vec<SeedSource>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                    "127.0.0.1".to_string(),
      port:                    5000,
      store_path:              PathBuf::from("goodstore.db"),
      kakao_api_key:           None,
      geocode_url:             "https://dapi.kakao.com/v2/local/search/address.json".to_string(),
      geocode_timeout_secs:    10,
      classifier_url:          "http://localhost:5001/ai/generate_stores".to_string(),
      classifier_timeout_secs: 30,
      seed_dir:                PathBuf::from("data"),
      batch_size:              DEFAULT_BATCH_SIZE,
      seed_sources:            default_sources(),
    }
  }
}

impl ServerConfig {
  pub fn geocoder(&self) -> anyhow::Result<KakaoGeocoder> {
    KakaoGeocoder::new(
      self.geocode_url.clone(),
      self.kakao_api_key.clone(),
      Duration::from_secs(self.geocode_timeout_secs),
    )
  }

  pub fn classifier(&self) -> anyhow::Result<ClassifierClient> {
    ClassifierClient::new(
      self.classifier_url.clone(),
      Duration::from_secs(self.classifier_timeout_secs),
    )
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API router with request tracing.
pub fn app<S, G>(store: Arc<S>, geocoder: Arc<G>) -> Router
where
  S: StoreRepository + 'static,
  G: Geocoder + 'static,
{
  goodstore_api::api_router(store, geocoder).layer(TraceLayer::new_for_http())
}
