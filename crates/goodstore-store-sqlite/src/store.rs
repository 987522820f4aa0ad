//! [`SqliteStore`], the SQLite implementation of [`StoreRepository`].

use std::path::Path;

use chrono::Utc;
use goodstore_core::{
  repository::{
    BatchOutcome, ReconcileTarget, ReconcileWrite, RowFailure, SeedWrite,
    StoreQuery, StoreRepository,
  },
  score::CERTIFICATION_WEIGHT,
  store::{CardNewsEntry, Coordinates, Store, StoreId, StoreView},
  taxonomy::{Category, CertificationType, NewCategory, NewCertificationType},
};
use rusqlite::params;

use crate::{
  encode::{
    PreparedCardNews, PreparedSeedRow, RawCardNewsEntry, RawStore, RawStoreView,
    encode_dt, split_coordinates,
  },
  schema::SCHEMA,
  sql, Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A goodstore database backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted. All calls
/// are serialised on the connection's thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run raw SQL against the connection.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) async fn user_version(&self) -> Result<i64> {
    let version = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("PRAGMA user_version", [], |row| row.get(0))?)
      })
      .await?;
    Ok(version)
  }

  async fn find_store(
    &self,
    lookup: fn(&rusqlite::Connection, &str) -> rusqlite::Result<Option<RawStore>>,
    key: String,
  ) -> Result<Option<Store>> {
    let raw = self
      .conn
      .call(move |conn| Ok(lookup(conn, &key)?))
      .await?;
    raw.map(RawStore::into_store).transpose()
  }
}

// ─── StoreRepository impl ────────────────────────────────────────────────────

impl StoreRepository for SqliteStore {
  type Error = Error;

  // ── Reference data ────────────────────────────────────────────────────────

  async fn seed_taxonomy(
    &self,
    categories: Vec<NewCategory>,
    cert_types: Vec<NewCertificationType>,
  ) -> Result<usize> {
    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0;

        for cat in &categories {
          inserted += tx.execute(
            "INSERT INTO categories (code, name, description) VALUES (?1, ?2, ?3)
             ON CONFLICT(code) DO NOTHING",
            params![cat.code, cat.name, cat.description],
          )?;
        }

        for ct in &cert_types {
          let category_code = match ct.category_code.as_deref() {
            Some(code) if sql::category_exists(&tx, code)? => Some(code),
            _ => None,
          };
          inserted += tx.execute(
            "INSERT INTO certification_types (code, name, issuing_agency, category_code)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(code) DO NOTHING",
            params![ct.code, ct.name, ct.issuing_agency, category_code],
          )?;
        }

        tx.commit()?;
        Ok(inserted)
      })
      .await?;
    Ok(inserted)
  }

  async fn resolve_category(&self, code: String) -> Result<Category> {
    let category = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let category = sql::ensure_category(&tx, &code)?;
        tx.commit()?;
        Ok(category)
      })
      .await?;
    Ok(category)
  }

  async fn resolve_cert_type(&self, category: Category) -> Result<CertificationType> {
    let cert_type = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let cert_type = sql::ensure_cert_type(&tx, &category)?;
        tx.commit()?;
        Ok(cert_type)
      })
      .await?;
    Ok(cert_type)
  }

  // ── Stores: lookups ───────────────────────────────────────────────────────

  async fn find_store_by_address(&self, address: String) -> Result<Option<Store>> {
    self.find_store(sql::store_by_address, address).await
  }

  async fn find_store_by_name(&self, name: String) -> Result<Option<Store>> {
    self.find_store(sql::store_by_name, name).await
  }

  // ── Stores: writes ────────────────────────────────────────────────────────

  async fn apply_reconciliation(&self, write: ReconcileWrite) -> Result<Store> {
    let ReconcileWrite { target, score_delta, categories, card_news } = write;
    let card_news = card_news
      .into_iter()
      .map(PreparedCardNews::prepare)
      .collect::<Result<Vec<_>>>()?;
    let now = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let store_id = match target {
          ReconcileTarget::Create { name, address, coordinates } => {
            let (lat, lon) = split_coordinates(coordinates);
            sql::upsert_store_by_address(&tx, &name, &address, lat, lon, score_delta, &now)?
          }
          ReconcileTarget::Existing { id, fill } => {
            if !sql::add_score(&tx, id, score_delta)? {
              return Ok(Err(id));
            }
            if let Some(Coordinates { lat, lon }) = fill {
              sql::fill_coordinates(&tx, id, lat, lon)?;
            }
            id
          }
        };

        sql::certify_for_categories(&tx, store_id, &categories)?;
        sql::append_card_news(&tx, store_id, &card_news, &now)?;

        let Some(store) = sql::store_by_id(&tx, store_id)? else {
          return Ok(Err(store_id));
        };
        tx.commit()?;
        Ok(Ok(store))
      })
      .await?
      .map_err(Error::StoreNotFound)?;

    raw.into_store()
  }

  async fn accumulate_score(&self, id: StoreId, delta: u32) -> Result<Store> {
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !sql::add_score(&tx, id, delta)? {
          return Ok(None);
        }
        let store = sql::store_by_id(&tx, id)?;
        tx.commit()?;
        Ok(store)
      })
      .await?
      .ok_or(Error::StoreNotFound(id))?;

    raw.into_store()
  }

  async fn write_seed_batch(
    &self,
    rows: Vec<SeedWrite>,
    cert_code: String,
  ) -> Result<BatchOutcome> {
    let rows = rows
      .into_iter()
      .map(PreparedSeedRow::prepare)
      .collect::<Result<Vec<_>>>()?;
    let now = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let mut tx = conn.transaction()?;
        let cert_type_id = sql::cert_type_id(&tx, &cert_code)?;
        let mut outcome = BatchOutcome {
          cert_type_found: cert_type_id.is_some(),
          ..BatchOutcome::default()
        };

        for row in &rows {
          let sp = tx.savepoint()?;
          match sql::write_seed_row(&sp, row, cert_type_id, &now) {
            Ok(result) => {
              sp.commit()?;
              if result.created {
                outcome.created += 1;
              } else {
                outcome.existing += 1;
              }
              if result.linked {
                outcome.linked += 1;
              }
            }
            Err(e) => {
              // Dropping the savepoint rolls back this row only.
              drop(sp);
              outcome.failures.push(RowFailure {
                name:    row.name.clone(),
                message: e.to_string(),
              });
            }
          }
        }

        tx.commit()?;
        Ok(outcome)
      })
      .await?;
    Ok(outcome)
  }

  async fn recompute_score_from_certifications(&self) -> Result<usize> {
    let updated = self
      .conn
      .call(|conn| Ok(sql::recompute_scores(conn, CERTIFICATION_WEIGHT)?))
      .await?;
    Ok(updated)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn get_store(&self, id: StoreId) -> Result<Option<StoreView>> {
    let raw: Option<RawStoreView> = self
      .conn
      .call(move |conn| {
        let view = match sql::store_by_id(conn, id)? {
          Some(store) => Some(sql::store_view(conn, store)?),
          None => None,
        };
        Ok(view)
      })
      .await?;

    raw.map(RawStoreView::into_view).transpose()
  }

  async fn list_stores(&self, query: StoreQuery) -> Result<Vec<StoreView>> {
    let pattern = query.name_contains.as_deref().map(sql::like_pattern);

    let raws: Vec<RawStoreView> = self
      .conn
      .call(move |conn| {
        let stores = sql::list_stores(
          conn,
          query.min_score,
          query.category.as_deref(),
          pattern.as_deref(),
        )?;
        let views = stores
          .into_iter()
          .map(|s| sql::store_view(conn, s))
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(views)
      })
      .await?;

    raws.into_iter().map(RawStoreView::into_view).collect()
  }

  async fn list_card_news(&self) -> Result<Vec<CardNewsEntry>> {
    let raws: Vec<RawCardNewsEntry> = self
      .conn
      .call(|conn| Ok(sql::list_card_news(conn)?))
      .await?;

    raws.into_iter().map(RawCardNewsEntry::into_entry).collect()
  }
}
