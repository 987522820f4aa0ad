//! Encoding and decoding helpers between domain types and the plain column
//! representations stored in SQLite.
//!
//! Timestamps are stored as RFC 3339 strings and JSON payloads as compact JSON
//! text. Coordinates occupy two nullable `REAL` columns.

use chrono::{DateTime, Utc};
use goodstore_core::{
  candidate::CardNewsItem,
  repository::SeedWrite,
  store::{CardNews, CardNewsEntry, Coordinates, Store, StoreView},
};
use serde_json::{Map, Value};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JSON payloads ───────────────────────────────────────────────────────────

pub fn encode_meta(meta: &Map<String, Value>) -> Result<String> {
  Ok(serde_json::to_string(meta)?)
}

pub fn decode_meta(s: &str) -> Result<Map<String, Value>> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_json(value: &Value) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_json(s: &str) -> Result<Value> { Ok(serde_json::from_str(s)?) }

// ─── Coordinates ─────────────────────────────────────────────────────────────

pub fn split_coordinates(c: Option<Coordinates>) -> (Option<f64>, Option<f64>) {
  match c {
    Some(Coordinates { lat, lon }) => (Some(lat), Some(lon)),
    None => (None, None),
  }
}

// ─── Prepared writes ─────────────────────────────────────────────────────────
//
// Everything that can fail to encode is encoded before entering a
// `Connection::call` closure, whose error type only carries database errors.

/// A card-news item with its raw payload already serialised.
pub struct PreparedCardNews {
  pub title:    String,
  pub summary:  String,
  pub raw_json: Option<String>,
}

impl PreparedCardNews {
  pub fn prepare(item: CardNewsItem) -> Result<Self> {
    Ok(Self {
      title:    item.title,
      summary:  item.summary,
      raw_json: item.raw.as_ref().map(encode_json).transpose()?,
    })
  }
}

/// A seed row with its metadata already serialised.
pub struct PreparedSeedRow {
  pub name:     String,
  pub address:  String,
  pub district: Option<String>,
  pub phone:    Option<String>,
  pub raw_meta: String,
  pub lat:      Option<f64>,
  pub lon:      Option<f64>,
}

impl PreparedSeedRow {
  pub fn prepare(row: SeedWrite) -> Result<Self> {
    let (lat, lon) = split_coordinates(row.coordinates);
    Ok(Self {
      raw_meta: encode_meta(&row.raw_meta)?,
      name: row.name,
      address: row.address,
      district: row.district,
      phone: row.phone,
      lat,
      lon,
    })
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `stores` row, plus its derived category codes.
pub struct RawStore {
  pub id:         i64,
  pub name:       String,
  pub address:    String,
  pub district:   Option<String>,
  pub lat:        Option<f64>,
  pub lon:        Option<f64>,
  pub phone:      Option<String>,
  pub raw_meta:   Option<String>,
  pub created_at: String,
  pub score:      i64,
  pub categories: Vec<String>,
}

impl RawStore {
  pub fn into_store(self) -> Result<Store> {
    Ok(Store {
      id:          self.id,
      name:        self.name,
      address:     self.address,
      district:    self.district,
      coordinates: Coordinates::from_parts(self.lat, self.lon),
      phone:       self.phone,
      raw_meta:    self.raw_meta.as_deref().map(decode_meta).transpose()?,
      created_at:  decode_dt(&self.created_at)?,
      score:       self.score,
      categories:  self.categories,
    })
  }
}

/// Raw values read from a `cardnews` row.
pub struct RawCardNews {
  pub id:         i64,
  pub store_id:   i64,
  pub title:      String,
  pub summary:    String,
  pub created_at: String,
  pub raw_json:   Option<String>,
}

impl RawCardNews {
  pub fn into_card_news(self) -> Result<CardNews> {
    Ok(CardNews {
      id:         self.id,
      store_id:   self.store_id,
      title:      self.title,
      summary:    self.summary,
      created_at: decode_dt(&self.created_at)?,
      raw_json:   self.raw_json.as_deref().map(decode_json).transpose()?,
    })
  }
}

/// A store row with its certification names and card-news rows.
pub struct RawStoreView {
  pub store:          RawStore,
  pub certifications: Vec<String>,
  pub card_news:      Vec<RawCardNews>,
}

impl RawStoreView {
  pub fn into_view(self) -> Result<StoreView> {
    Ok(StoreView {
      store:          self.store.into_store()?,
      certifications: self.certifications,
      card_news:      self
        .card_news
        .into_iter()
        .map(RawCardNews::into_card_news)
        .collect::<Result<_>>()?,
    })
  }
}

/// A card-news row joined with its store's name and categories.
pub struct RawCardNewsEntry {
  pub card:       RawCardNews,
  pub store_name: String,
  pub categories: Vec<String>,
}

impl RawCardNewsEntry {
  pub fn into_entry(self) -> Result<CardNewsEntry> {
    Ok(CardNewsEntry {
      card:       self.card.into_card_news()?,
      store_name: self.store_name,
      categories: self.categories,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn datetime_roundtrip_is_lossless() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
  }

  #[test]
  fn bad_datetime_is_a_parse_error() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }

  #[test]
  fn half_missing_coordinates_decode_as_none() {
    let raw = RawStore {
      id:         1,
      name:       "A".into(),
      address:    "X".into(),
      district:   None,
      lat:        Some(37.5),
      lon:        None,
      phone:      None,
      raw_meta:   None,
      created_at: encode_dt(Utc::now()),
      score:      0,
      categories: vec![],
    };
    assert!(raw.into_store().unwrap().coordinates.is_none());
  }
}
