//! Bulk loader for externally sourced seed rows (CSV/JSON datasets).
//!
//! Unlike the reconciler, the loader matches stores by **name**, creates them
//! with a zero score regardless of any threshold, and links every row to one
//! fixed certification type. Rows are committed in batches; a row that fails
//! to persist is rolled back on its own and the batch carries on. Once every
//! batch is in, scores are recomputed from certification counts.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::{
  geocode::Geocoder,
  repository::{SeedWrite, StoreRepository},
  store::Coordinates,
};

/// Default number of rows per committed batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// A raw seed row as read from a dataset file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedRecord {
  pub name:     Option<String>,
  pub address:  String,
  pub district: Option<String>,
  pub phone:    Option<String>,
  /// The complete source row.
  pub raw_meta: Map<String, Value>,
}

impl SeedRecord {
  /// Validate into a write; hands the record back when it has no name.
  fn into_write(self) -> Result<SeedWrite, Self> {
    let name = match self.name.as_deref().map(str::trim) {
      Some(n) if !n.is_empty() => n.to_owned(),
      _ => return Err(self),
    };
    Ok(SeedWrite {
      name,
      address: self.address.trim().to_owned(),
      district: self.district,
      phone: self.phone,
      raw_meta: self.raw_meta,
      coordinates: None,
    })
  }
}

/// Totals over one [`BulkLoader::load_batch`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
  pub batches:  usize,
  pub created:  usize,
  pub existing: usize,
  pub linked:   usize,
  /// Rows dropped before reaching the store (no name).
  pub skipped:  usize,
  /// Rows rolled back by the store.
  pub failed:   usize,
  /// Stores whose score the final maintenance pass rewrote.
  pub rescored: usize,
}

/// Drives [`StoreRepository::write_seed_batch`] over a dataset.
pub struct BulkLoader<'a, S, G> {
  store:    &'a S,
  geocoder: &'a G,
}

impl<'a, S, G> BulkLoader<'a, S, G>
where
  S: StoreRepository,
  G: Geocoder,
{
  pub fn new(store: &'a S, geocoder: &'a G) -> Self { Self { store, geocoder } }

  /// Load `records`, linking each to the certification type `cert_code`, and
  /// committing every `batch_size` rows (a size of zero is treated as one).
  ///
  /// Finishes with [`StoreRepository::recompute_score_from_certifications`].
  pub async fn load_batch(
    &self,
    records: Vec<SeedRecord>,
    cert_code: &str,
    batch_size: usize,
  ) -> Result<LoadReport, S::Error> {
    let mut report = LoadReport::default();
    let mut rows = Vec::with_capacity(records.len());
    for record in records {
      match record.into_write() {
        Ok(row) => rows.push(row),
        Err(record) => {
          warn!(cert_code, row = ?record.raw_meta, "seed row has no name; skipped");
          report.skipped += 1;
        }
      }
    }

    let mut warned_missing_cert = false;
    let mut remaining = rows.into_iter().peekable();
    while remaining.peek().is_some() {
      let chunk: Vec<SeedWrite> =
        remaining.by_ref().take(batch_size.max(1)).collect();
      let chunk = self.geocode_new_stores(chunk).await?;

      let outcome = self
        .store
        .write_seed_batch(chunk, cert_code.to_owned())
        .await?;

      if !outcome.cert_type_found && !warned_missing_cert {
        warn!(cert_code, "certification type not found; rows loaded unlinked");
        warned_missing_cert = true;
      }
      for failure in &outcome.failures {
        error!(cert_code, name = %failure.name, error = %failure.message, "seed row rolled back");
      }

      report.batches += 1;
      report.created += outcome.created;
      report.existing += outcome.existing;
      report.linked += outcome.linked;
      report.failed += outcome.failures.len();
    }

    report.rescored = self.store.recompute_score_from_certifications().await?;

    info!(
      cert_code,
      batches = report.batches,
      created = report.created,
      existing = report.existing,
      linked = report.linked,
      skipped = report.skipped,
      failed = report.failed,
      "seed load finished"
    );
    Ok(report)
  }

  /// Geocode the rows whose name has no store yet. Rows sharing a name within
  /// the chunk are geocoded once.
  async fn geocode_new_stores(
    &self,
    mut chunk: Vec<SeedWrite>,
  ) -> Result<Vec<SeedWrite>, S::Error> {
    let mut resolved: HashMap<String, Option<Coordinates>> = HashMap::new();
    for row in &mut chunk {
      if row.address.is_empty() {
        continue;
      }
      if let Some(coords) = resolved.get(&row.name) {
        row.coordinates = *coords;
        continue;
      }
      let coords = match self.store.find_store_by_name(row.name.clone()).await? {
        Some(_) => None,
        None => self.geocoder.geocode(&row.address).await,
      };
      resolved.insert(row.name.clone(), coords);
      row.coordinates = coords;
    }
    Ok(chunk)
  }
}
