//! Client for the classification service that scores stores from news and
//! social media.

use std::time::Duration;

use anyhow::{Context as _, Result};
use goodstore_core::candidate::ClassificationRecord;
use reqwest::Client;
use serde_json::Value;
use tracing::{error, info};

#[derive(Clone)]
pub struct ClassifierClient {
  client: Client,
  url:    String,
}

impl ClassifierClient {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .context("failed to build classifier HTTP client")?;
    Ok(Self { client, url: url.into() })
  }

  /// Fetch the latest classification results. A failed request is logged
  /// and reported as an empty list. The response must be a JSON array; each
  /// element is decoded separately so one malformed record cannot hide the
  /// others.
  pub async fn fetch(&self) -> Vec<goodstore_core::Result<ClassificationRecord>> {
    match self.try_fetch().await {
      Ok(values) => {
        info!(url = %self.url, count = values.len(), "classification results fetched");
        values.into_iter().map(ClassificationRecord::from_value).collect()
      }
      Err(e) => {
        error!(url = %self.url, error = %e, "classification fetch failed");
        Vec::new()
      }
    }
  }

  async fn try_fetch(&self) -> reqwest::Result<Vec<Value>> {
    self
      .client
      .get(&self.url)
      .send()
      .await?
      .error_for_status()?
      .json()
      .await
  }
}
