//! Store records and the read models built on top of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Surrogate key of a persisted store.
pub type StoreId = i64;

/// A geocoded point. Latitude and longitude are filled together or not at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub lat: f64,
  pub lon: f64,
}

impl Coordinates {
  /// Build from two nullable columns; either one missing yields `None`.
  pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
    match (lat, lon) {
      (Some(lat), Some(lon)) => Some(Self { lat, lon }),
      _ => None,
    }
  }
}

/// A persisted store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
  pub id:          StoreId,
  pub name:        String,
  pub address:     String,
  pub district:    Option<String>,
  pub coordinates: Option<Coordinates>,
  pub phone:       Option<String>,
  /// The source row a seeded store was created from, if any.
  pub raw_meta:    Option<serde_json::Map<String, serde_json::Value>>,
  pub created_at:  DateTime<Utc>,
  pub score:       i64,
  /// Category codes reachable through the store's certifications, sorted and
  /// de-duplicated. Derived on read; never stored.
  pub categories:  Vec<String>,
}

/// A card-news summary attached to a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardNews {
  pub id:         i64,
  pub store_id:   StoreId,
  pub title:      String,
  pub summary:    String,
  pub created_at: DateTime<Utc>,
  pub raw_json:   Option<serde_json::Value>,
}

/// A store together with its certifications and card-news.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreView {
  pub store:          Store,
  /// Names of the certification types the store holds, in link order.
  pub certifications: Vec<String>,
  pub card_news:      Vec<CardNews>,
}

/// A card-news row joined with its parent store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardNewsEntry {
  pub card:       CardNews,
  pub store_name: String,
  pub categories: Vec<String>,
}
