//! Kakao Local address search as a [`Geocoder`].

use std::time::Duration;

use anyhow::{Context as _, Result};
use goodstore_core::{geocode::Geocoder, store::Coordinates};
use reqwest::{Client, header::AUTHORIZATION};
use serde::Deserialize;
use tracing::{debug, warn};

/// Resolves addresses through the Kakao Local REST API.
///
/// Without an API key every lookup yields `None` and no request is made.
#[derive(Clone)]
pub struct KakaoGeocoder {
  client:  Client,
  url:     String,
  api_key: Option<String>,
}

impl KakaoGeocoder {
  pub fn new(url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .context("failed to build geocoding HTTP client")?;
    let api_key = api_key.filter(|k| !k.trim().is_empty());
    Ok(Self { client, url: url.into(), api_key })
  }

  pub fn is_enabled(&self) -> bool { self.api_key.is_some() }

  async fn search(&self, key: &str, address: &str) -> reqwest::Result<AddressSearch> {
    self
      .client
      .get(&self.url)
      .header(AUTHORIZATION, format!("KakaoAK {key}"))
      .query(&[("query", address)])
      .send()
      .await?
      .error_for_status()?
      .json()
      .await
  }
}

impl Geocoder for KakaoGeocoder {
  async fn geocode(&self, address: &str) -> Option<Coordinates> {
    let address = address.trim();
    if address.is_empty() {
      return None;
    }
    let key = self.api_key.as_deref()?;

    match self.search(key, address).await {
      Ok(found) => {
        let coords = found.first_coordinates();
        if coords.is_none() {
          debug!(address, "no geocoding match");
        }
        coords
      }
      Err(e) => {
        warn!(address, error = %e, "geocoding failed");
        None
      }
    }
  }
}

// ─── Response shape ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AddressSearch {
  #[serde(default)]
  documents: Vec<AddressDocument>,
}

/// Kakao returns coordinates as decimal strings; `x` is longitude.
#[derive(Debug, Deserialize)]
struct AddressDocument {
  x: String,
  y: String,
}

impl AddressSearch {
  fn first_coordinates(&self) -> Option<Coordinates> {
    let doc = self.documents.first()?;
    Some(Coordinates {
      lat: doc.y.trim().parse().ok()?,
      lon: doc.x.trim().parse().ok()?,
    })
  }
}
