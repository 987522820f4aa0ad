//! Response bodies. Dates are rendered as `YYYY-MM-DD`.

use chrono::{DateTime, Utc};
use goodstore_core::store::{CardNews, CardNewsEntry, StoreId, StoreView};
use serde::Serialize;

fn day(dt: DateTime<Utc>) -> String { dt.format("%Y-%m-%d").to_string() }

#[derive(Debug, Serialize)]
pub struct CardNewsBody {
  pub title:      String,
  pub summary:    String,
  pub created_at: String,
}

impl From<CardNews> for CardNewsBody {
  fn from(c: CardNews) -> Self {
    Self { title: c.title, summary: c.summary, created_at: day(c.created_at) }
  }
}

/// A store as it appears in listings.
#[derive(Debug, Serialize)]
pub struct StoreSummary {
  pub id:         StoreId,
  pub name:       String,
  pub lat:        Option<f64>,
  pub lon:        Option<f64>,
  pub score:      i64,
  pub categories: Vec<String>,
  pub cardnews:   Vec<CardNewsBody>,
}

impl From<StoreView> for StoreSummary {
  fn from(view: StoreView) -> Self {
    let StoreView { store, card_news, .. } = view;
    Self {
      id:         store.id,
      name:       store.name,
      lat:        store.coordinates.map(|c| c.lat),
      lon:        store.coordinates.map(|c| c.lon),
      score:      store.score,
      categories: store.categories,
      cardnews:   card_news.into_iter().map(Into::into).collect(),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct CertificationBody {
  pub source: String,
}

/// A store with its contact details and certifications.
#[derive(Debug, Serialize)]
pub struct StoreDetail {
  #[serde(flatten)]
  pub summary:        StoreSummary,
  pub address:        String,
  pub phone:          Option<String>,
  pub certifications: Vec<CertificationBody>,
}

impl From<StoreView> for StoreDetail {
  fn from(mut view: StoreView) -> Self {
    let address = std::mem::take(&mut view.store.address);
    let phone = view.store.phone.take();
    let certifications = std::mem::take(&mut view.certifications)
      .into_iter()
      .map(|source| CertificationBody { source })
      .collect();
    Self { summary: view.into(), address, phone, certifications }
  }
}

/// One row of `GET /cardnews`.
#[derive(Debug, Serialize)]
pub struct CardNewsListing {
  pub store_id:   StoreId,
  pub store_name: String,
  pub title:      String,
  pub summary:    String,
  pub categories: Vec<String>,
  pub created_at: String,
}

impl From<CardNewsEntry> for CardNewsListing {
  fn from(e: CardNewsEntry) -> Self {
    Self {
      store_id:   e.card.store_id,
      store_name: e.store_name,
      title:      e.card.title,
      summary:    e.card.summary,
      categories: e.categories,
      created_at: day(e.card.created_at),
    }
  }
}
