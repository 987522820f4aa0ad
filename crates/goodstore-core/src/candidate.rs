//! Classification results and the store candidates derived from them.
//!
//! A [`ClassificationRecord`] is the wire shape produced by the external
//! text-classification service. [`ClassificationRecord::into_candidate`]
//! validates it and normalises the loosely-typed fields into a
//! [`StoreCandidate`], which is what the reconciler consumes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result, score::score_delta};

// ─── Wire shape ──────────────────────────────────────────────────────────────

/// A category as emitted by the classifier: either a bare code or an object
/// carrying the code under `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryLabel {
  Code(String),
  Named { name: String },
}

impl CategoryLabel {
  pub fn code(&self) -> &str {
    match self {
      Self::Code(code) => code,
      Self::Named { name } => name,
    }
  }
}

/// The `cardnews` field, which the classifier emits as a single object, a
/// list of objects, or not at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CardNewsPayload {
  Single(Map<String, Value>),
  List(Vec<Value>),
  #[default]
  Absent,
  /// Any other JSON shape; treated as absent.
  Unrecognised(Value),
}

impl CardNewsPayload {
  /// Flatten into a sequence of items. List entries that are not objects are
  /// dropped.
  pub fn into_items(self) -> Vec<CardNewsItem> {
    match self {
      Self::Single(map) => vec![CardNewsItem::from_object(map)],
      Self::List(values) => values
        .into_iter()
        .filter_map(|v| match v {
          Value::Object(map) => Some(CardNewsItem::from_object(map)),
          _ => None,
        })
        .collect(),
      Self::Absent | Self::Unrecognised(_) => Vec::new(),
    }
  }
}

/// One classification result for one store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationRecord {
  #[serde(default)]
  pub store_name:          Option<String>,
  #[serde(default)]
  pub address:             Option<String>,
  #[serde(default)]
  pub categories:          Vec<CategoryLabel>,
  #[serde(default)]
  pub positive_news_count: i64,
  #[serde(default)]
  pub positive_sns_count:  i64,
  #[serde(default)]
  pub cardnews:            CardNewsPayload,
}

impl ClassificationRecord {
  /// Parse one record. A record of the wrong shape fails on its own with
  /// [`Error::Serialization`], so a batch can carry on past it.
  pub fn from_value(value: Value) -> Result<Self> { Ok(serde_json::from_value(value)?) }

  /// Score this record contributes to its store.
  pub fn score_delta(&self) -> u32 {
    score_delta(self.positive_news_count, self.positive_sns_count)
  }

  /// Validate and normalise into a [`StoreCandidate`].
  ///
  /// Fails with [`Error::MissingAddress`] when the address is absent or
  /// blank. A missing name is only an error once a store has to be created,
  /// which the reconciler decides.
  pub fn into_candidate(self) -> Result<StoreCandidate> {
    let score_delta = self.score_delta();
    let name = non_blank(self.store_name);
    let address = non_blank(self.address).ok_or(Error::MissingAddress)?;
    let categories = self
      .categories
      .iter()
      .map(|label| label.code().trim())
      .filter(|code| !code.is_empty())
      .map(str::to_owned)
      .collect();

    Ok(StoreCandidate {
      name,
      address,
      categories,
      score_delta,
      card_news: self.cardnews.into_items(),
    })
  }
}

fn non_blank(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

// ─── Normalised shape ────────────────────────────────────────────────────────

/// A card-news item ready to be appended to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct CardNewsItem {
  pub title:   String,
  pub summary: String,
  /// The object this item was read from.
  pub raw:     Option<Value>,
}

impl CardNewsItem {
  pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
    Self { title: title.into(), summary: summary.into(), raw: None }
  }

  fn from_object(map: Map<String, Value>) -> Self {
    let text = |key: &str| {
      map.get(key).and_then(Value::as_str).unwrap_or_default().to_owned()
    };
    Self {
      title:   text("title"),
      summary: text("summary"),
      raw:     Some(Value::Object(map)),
    }
  }
}

/// Evidence about one store, matched against existing stores by address.
#[derive(Debug, Clone)]
pub struct StoreCandidate {
  /// Only required when the address matches no store.
  pub name:        Option<String>,
  pub address:     String,
  pub categories:  BTreeSet<String>,
  pub score_delta: u32,
  pub card_news:   Vec<CardNewsItem>,
}

impl StoreCandidate {
  /// Convenience constructor with no categories and no card-news.
  pub fn new(
    name: impl Into<String>,
    address: impl Into<String>,
    score_delta: u32,
  ) -> Self {
    Self {
      name: Some(name.into()),
      address: address.into(),
      categories: BTreeSet::new(),
      score_delta,
      card_news: Vec::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn record(value: Value) -> ClassificationRecord {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn single_cardnews_object_becomes_one_item() {
    let rec = record(json!({
      "store_name": "A",
      "address": "X",
      "categories": ["eco_friendly"],
      "positive_news_count": 2,
      "positive_sns_count": 0,
      "cardnews": {"title": "T", "summary": "S"}
    }));
    let cand = rec.into_candidate().unwrap();
    assert_eq!(cand.score_delta, 50);
    assert_eq!(cand.card_news.len(), 1);
    assert_eq!(cand.card_news[0].title, "T");
    assert_eq!(cand.card_news[0].summary, "S");
    assert!(cand.categories.contains("eco_friendly"));
  }

  #[test]
  fn cardnews_list_skips_non_objects_and_defaults_fields() {
    let rec = record(json!({
      "store_name": "A",
      "address": "X",
      "cardnews": [{"title": "only title"}, "junk", {"summary": "only summary"}]
    }));
    let items = rec.into_candidate().unwrap().card_news;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].summary, "");
    assert_eq!(items[1].title, "");
  }

  #[test]
  fn missing_null_or_odd_cardnews_yields_nothing() {
    for cardnews in [json!(null), json!("text"), json!(3)] {
      let rec = record(json!({"store_name": "A", "address": "X", "cardnews": cardnews}));
      assert!(rec.into_candidate().unwrap().card_news.is_empty());
    }
    let rec = record(json!({"store_name": "A", "address": "X"}));
    assert_eq!(rec.cardnews, CardNewsPayload::Absent);
  }

  #[test]
  fn object_categories_are_normalised_to_codes() {
    let rec = record(json!({
      "store_name": "A",
      "address": "X",
      "categories": [{"name": "sharing"}, "welfare", "sharing", "  "]
    }));
    let cats: Vec<_> = rec.into_candidate().unwrap().categories.into_iter().collect();
    assert_eq!(cats, ["sharing", "welfare"]);
  }

  #[test]
  fn blank_address_is_rejected() {
    let rec = record(json!({"store_name": "A", "address": "   "}));
    assert!(matches!(rec.into_candidate(), Err(Error::MissingAddress)));
  }

  #[test]
  fn missing_name_is_left_to_the_reconciler() {
    let rec = record(json!({"store_name": "  ", "address": "X", "positive_news_count": 1}));
    let cand = rec.into_candidate().unwrap();
    assert!(cand.name.is_none());
    assert_eq!(cand.score_delta, 25);
  }

  #[test]
  fn wrong_typed_fields_fail_to_parse() {
    let err = ClassificationRecord::from_value(json!({
      "store_name": "B",
      "address": "Y",
      "positive_news_count": "two"
    }))
    .unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
  }
}
