//! Configured seed datasets.

use std::{fs::File, io::BufReader, path::Path};

use goodstore_core::bulk::SeedRecord;
use serde::{Deserialize, Serialize};

use crate::{CsvColumns, Result, read_csv, read_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedFormat {
  Csv,
  Json,
}

/// One dataset file and the certification type its rows are linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedSource {
  /// Relative paths resolve against the configured seed directory.
  pub path:      String,
  pub format:    SeedFormat,
  pub cert_code: String,
  /// CSV name columns, tried in order. Ignored for JSON.
  #[serde(default)]
  pub name_keys: Vec<String>,
}

impl SeedSource {
  fn csv_columns(&self) -> CsvColumns {
    if self.name_keys.is_empty() {
      CsvColumns::default()
    } else {
      CsvColumns::with_name_keys(self.name_keys.iter().cloned())
    }
  }
}

/// Parse the file behind `source`, resolving its path against `base_dir`.
pub fn read_source(source: &SeedSource, base_dir: &Path) -> Result<Vec<SeedRecord>> {
  let file = BufReader::new(File::open(base_dir.join(&source.path))?);
  match source.format {
    SeedFormat::Csv => read_csv(file, &source.csv_columns()),
    SeedFormat::Json => read_json(file),
  }
}

/// The public datasets the directory ships with.
pub fn default_sources() -> Vec<SeedSource> {
  let source = |path: &str, format, cert_code: &str, name_keys: &[&str]| SeedSource {
    path: path.into(),
    format,
    cert_code: cert_code.into(),
    name_keys: name_keys.iter().map(|k| (*k).to_owned()).collect(),
  };
  vec![
    source("good_price.csv", SeedFormat::Csv, "good_price", &["업소명"]),
    source("green_store.csv", SeedFormat::Csv, "eco_friendly", &["매장명", "업체명"]),
    source("1004campaign.json", SeedFormat::Json, "1004campaign", &[]),
    source("vision_store.json", SeedFormat::Json, "vision_store", &[]),
  ]
}
