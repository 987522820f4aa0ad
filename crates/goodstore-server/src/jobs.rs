//! One-shot jobs run by the binary: taxonomy seeding, bulk seed loading and
//! pulling from the classification service.

use std::path::Path;

use goodstore_core::{
  bulk::{BulkLoader, LoadReport},
  candidate::ClassificationRecord,
  geocode::Geocoder,
  reconcile::Reconciler,
  repository::StoreRepository,
  taxonomy::{default_categories, default_certification_types},
};
use goodstore_seed::{SeedSource, read_source};
use tracing::{info, warn};

use crate::classifier::ClassifierClient;

/// Insert the fixed categories and certification types.
pub async fn seed_taxonomy<S: StoreRepository>(store: &S) -> Result<usize, S::Error> {
  let inserted = store
    .seed_taxonomy(default_categories(), default_certification_types())
    .await?;
  info!(inserted, "taxonomy seeded");
  Ok(inserted)
}

/// Bulk-load every configured source found under `seed_dir`.
///
/// A source that cannot be read is skipped with a warning.
pub async fn load_sources<S, G>(
  store: &S,
  geocoder: &G,
  sources: &[SeedSource],
  seed_dir: &Path,
  batch_size: usize,
) -> Result<LoadReport, S::Error>
where
  S: StoreRepository,
  G: Geocoder,
{
  let loader = BulkLoader::new(store, geocoder);
  let mut total = LoadReport::default();

  for source in sources {
    let records = match read_source(source, seed_dir) {
      Ok(records) => records,
      Err(e) => {
        warn!(path = %source.path, error = %e, "seed source skipped");
        continue;
      }
    };
    info!(path = %source.path, rows = records.len(), "loading seed source");

    let report = loader
      .load_batch(records, &source.cert_code, batch_size)
      .await?;
    total.batches += report.batches;
    total.created += report.created;
    total.existing += report.existing;
    total.linked += report.linked;
    total.skipped += report.skipped;
    total.failed += report.failed;
    total.rescored = report.rescored;
  }
  Ok(total)
}

/// Counts for one [`pull`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullReport {
  pub received:   usize,
  pub reconciled: usize,
  /// Below threshold with no existing store.
  pub discarded:  usize,
  pub failed:     usize,
}

/// Fetch classification results and reconcile each one. A record that fails
/// is logged and does not stop the rest.
pub async fn pull<S, G>(store: &S, geocoder: &G, client: &ClassifierClient) -> PullReport
where
  S: StoreRepository,
  G: Geocoder,
{
  let records = client.fetch().await;
  let reconciler = Reconciler::new(store, geocoder);
  let mut report = PullReport { received: records.len(), ..Default::default() };

  for record in records {
    let candidate = match record.and_then(ClassificationRecord::into_candidate) {
      Ok(candidate) => candidate,
      Err(e) => {
        warn!(error = %e, "classification record skipped");
        report.failed += 1;
        continue;
      }
    };
    let address = candidate.address.clone();
    match reconciler.reconcile(candidate).await {
      Ok(Some(_)) => report.reconciled += 1,
      Ok(None) => report.discarded += 1,
      Err(e) => {
        warn!(%address, error = %e, "reconciliation failed");
        report.failed += 1;
      }
    }
  }

  info!(
    received = report.received,
    reconciled = report.reconciled,
    discarded = report.discarded,
    failed = report.failed,
    "classification pull finished"
  );
  report
}
