//! The `StoreRepository` trait and the write/query types it accepts.
//!
//! The trait is implemented by storage backends (e.g. `goodstore-store-sqlite`).
//! The reconciler, the bulk loader and the HTTP layer depend on this
//! abstraction, not on any concrete backend.
//!
//! Every write method is one atomic unit of work: it either commits entirely
//! or leaves the store untouched. The one exception is
//! [`StoreRepository::write_seed_batch`], which isolates failures per row.

use std::{collections::BTreeSet, future::Future};

use serde_json::{Map, Value};

use crate::{
  candidate::CardNewsItem,
  store::{CardNewsEntry, Coordinates, Store, StoreId, StoreView},
  taxonomy::{Category, CertificationType, NewCategory, NewCertificationType},
};

// ─── Reconciliation write ────────────────────────────────────────────────────

/// Which store a reconciliation write applies to.
#[derive(Debug, Clone)]
pub enum ReconcileTarget {
  /// No store was found for the address; create one with `score_delta` as its
  /// initial score. If another writer created the address in the meantime,
  /// the write accumulates into that store instead.
  Create {
    name:        String,
    address:     String,
    coordinates: Option<Coordinates>,
  },
  /// Add to an existing store, filling its coordinates if they are absent.
  Existing {
    id:   StoreId,
    fill: Option<Coordinates>,
  },
}

/// Everything one reconciliation event writes, applied in one transaction.
#[derive(Debug, Clone)]
pub struct ReconcileWrite {
  pub target:      ReconcileTarget,
  pub score_delta: u32,
  /// Category codes to certify the store for; unseen codes are created.
  pub categories:  BTreeSet<String>,
  /// Appended unconditionally, never de-duplicated.
  pub card_news:   Vec<CardNewsItem>,
}

// ─── Seed write ──────────────────────────────────────────────────────────────

/// One validated seed row, matched against existing stores by name.
#[derive(Debug, Clone)]
pub struct SeedWrite {
  pub name:        String,
  pub address:     String,
  pub district:    Option<String>,
  pub phone:       Option<String>,
  pub raw_meta:    Map<String, Value>,
  /// Resolved before the batch transaction opens; only used when the row
  /// creates a store.
  pub coordinates: Option<Coordinates>,
}

/// A seed row whose write was rolled back.
#[derive(Debug, Clone)]
pub struct RowFailure {
  pub name:    String,
  pub message: String,
}

/// Result of one committed seed batch.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
  pub created:         usize,
  pub existing:        usize,
  /// Certifications newly linked (rows already linked are not counted).
  pub linked:          usize,
  pub failures:        Vec<RowFailure>,
  /// `false` when the requested certification type does not exist; rows are
  /// still loaded, just not linked.
  pub cert_type_found: bool,
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`StoreRepository::list_stores`].
#[derive(Debug, Clone, Default)]
pub struct StoreQuery {
  /// Only stores certified for this category code.
  pub category:      Option<String>,
  /// Case-insensitive substring match on the store name.
  pub name_contains: Option<String>,
  /// Only stores whose score is at least this.
  pub min_score:     Option<i64>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a goodstore persistence backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait StoreRepository: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reference data ────────────────────────────────────────────────────

  /// Insert the given categories and certification types where their codes
  /// are absent. Existing rows are left as they are. Returns the number of
  /// rows inserted.
  fn seed_taxonomy(
    &self,
    categories: Vec<NewCategory>,
    cert_types: Vec<NewCertificationType>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Get or create the category with `code`. A created category is named
  /// after its code.
  fn resolve_category(
    &self,
    code: String,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  /// Get or create the certification type whose code equals the category's
  /// code. A created type copies the category's name and code.
  fn resolve_cert_type(
    &self,
    category: Category,
  ) -> impl Future<Output = Result<CertificationType, Self::Error>> + Send + '_;

  // ── Stores: lookups ───────────────────────────────────────────────────

  /// Exact-match lookup on the address. The live ingestion path's key.
  fn find_store_by_address(
    &self,
    address: String,
  ) -> impl Future<Output = Result<Option<Store>, Self::Error>> + Send + '_;

  /// Exact-match lookup on the name. The bulk seed path's key.
  fn find_store_by_name(
    &self,
    name: String,
  ) -> impl Future<Output = Result<Option<Store>, Self::Error>> + Send + '_;

  // ── Stores: writes ────────────────────────────────────────────────────

  /// Apply one reconciliation event atomically and return the resulting store.
  fn apply_reconciliation(
    &self,
    write: ReconcileWrite,
  ) -> impl Future<Output = Result<Store, Self::Error>> + Send + '_;

  /// Add `delta` to an existing store's score.
  fn accumulate_score(
    &self,
    id: StoreId,
    delta: u32,
  ) -> impl Future<Output = Result<Store, Self::Error>> + Send + '_;

  /// Write a batch of seed rows in one transaction, each row in its own
  /// savepoint, linking every row's store to the certification type
  /// `cert_code` when it exists.
  fn write_seed_batch(
    &self,
    rows: Vec<SeedWrite>,
    cert_code: String,
  ) -> impl Future<Output = Result<BatchOutcome, Self::Error>> + Send + '_;

  /// Overwrite every store's score with its certification count times
  /// [`CERTIFICATION_WEIGHT`](crate::score::CERTIFICATION_WEIGHT). Returns the
  /// number of stores updated.
  fn recompute_score_from_certifications(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// A store with its certifications and card-news. `None` if not found.
  fn get_store(
    &self,
    id: StoreId,
  ) -> impl Future<Output = Result<Option<StoreView>, Self::Error>> + Send + '_;

  /// Stores matching `query`, ordered by id.
  fn list_stores(
    &self,
    query: StoreQuery,
  ) -> impl Future<Output = Result<Vec<StoreView>, Self::Error>> + Send + '_;

  /// Every card-news row joined with its store, ordered by id.
  fn list_card_news(
    &self,
  ) -> impl Future<Output = Result<Vec<CardNewsEntry>, Self::Error>> + Send + '_;
}
