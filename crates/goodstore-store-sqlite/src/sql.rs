//! Synchronous query helpers run inside `Connection::call` closures.
//!
//! Each helper takes a plain [`Connection`]; a [`rusqlite::Transaction`] or
//! [`rusqlite::Savepoint`] derefs to one, so the same helpers serve both
//! standalone reads and multi-statement writes.

use std::collections::{BTreeSet, HashMap};

use goodstore_core::taxonomy::{Category, CertificationType};
use rusqlite::{Connection, OptionalExtension as _, Row, params};

use crate::encode::{
  PreparedCardNews, PreparedSeedRow, RawCardNews, RawCardNewsEntry, RawStore,
  RawStoreView,
};

const STORE_COLUMNS: &str = "s.id, s.name, s.address, s.district, s.lat, s.lon,
   s.phone, s.raw_meta, s.created_at, s.score";

const CARD_NEWS_COLUMNS: &str =
  "cn.id, cn.store_id, cn.title, cn.summary, cn.created_at, cn.raw_json";

// ─── Row mappers ─────────────────────────────────────────────────────────────

fn store_from_row(row: &Row<'_>) -> rusqlite::Result<RawStore> {
  Ok(RawStore {
    id:         row.get(0)?,
    name:       row.get(1)?,
    address:    row.get(2)?,
    district:   row.get(3)?,
    lat:        row.get(4)?,
    lon:        row.get(5)?,
    phone:      row.get(6)?,
    raw_meta:   row.get(7)?,
    created_at: row.get(8)?,
    score:      row.get(9)?,
    categories: Vec::new(),
  })
}

fn card_news_from_row(row: &Row<'_>) -> rusqlite::Result<RawCardNews> {
  Ok(RawCardNews {
    id:         row.get(0)?,
    store_id:   row.get(1)?,
    title:      row.get(2)?,
    summary:    row.get(3)?,
    created_at: row.get(4)?,
    raw_json:   row.get(5)?,
  })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
  Ok(Category {
    id:          row.get(0)?,
    code:        row.get(1)?,
    name:        row.get(2)?,
    description: row.get(3)?,
  })
}

fn cert_type_from_row(row: &Row<'_>) -> rusqlite::Result<CertificationType> {
  Ok(CertificationType {
    id:             row.get(0)?,
    code:           row.get(1)?,
    name:           row.get(2)?,
    description:    row.get(3)?,
    issuing_agency: row.get(4)?,
    category_code:  row.get(5)?,
  })
}

// ─── Store reads ─────────────────────────────────────────────────────────────

/// Category codes reachable through a store's certifications.
pub fn store_categories(conn: &Connection, store_id: i64) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare_cached(
    "SELECT DISTINCT ct.category_code
     FROM certifications c
     JOIN certification_types ct ON ct.id = c.cert_type_id
     WHERE c.store_id = ?1 AND ct.category_code IS NOT NULL
     ORDER BY ct.category_code",
  )?;
  let rows = stmt
    .query_map(params![store_id], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn store_cert_names(conn: &Connection, store_id: i64) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare_cached(
    "SELECT ct.name
     FROM certifications c
     JOIN certification_types ct ON ct.id = c.cert_type_id
     WHERE c.store_id = ?1
     ORDER BY c.id",
  )?;
  let rows = stmt
    .query_map(params![store_id], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn store_card_news(conn: &Connection, store_id: i64) -> rusqlite::Result<Vec<RawCardNews>> {
  let mut stmt = conn.prepare_cached(&format!(
    "SELECT {CARD_NEWS_COLUMNS} FROM cardnews cn WHERE cn.store_id = ?1 ORDER BY cn.id"
  ))?;
  let rows = stmt
    .query_map(params![store_id], card_news_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn with_categories(conn: &Connection, mut store: RawStore) -> rusqlite::Result<RawStore> {
  store.categories = store_categories(conn, store.id)?;
  Ok(store)
}

/// Look a store up by one exact-match column.
fn store_where(
  conn: &Connection,
  column: &str,
  value: &dyn rusqlite::ToSql,
) -> rusqlite::Result<Option<RawStore>> {
  let store = conn
    .query_row(
      &format!("SELECT {STORE_COLUMNS} FROM stores s WHERE s.{column} = ?1 ORDER BY s.id LIMIT 1"),
      [value],
      store_from_row,
    )
    .optional()?;
  store.map(|s| with_categories(conn, s)).transpose()
}

pub fn store_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<RawStore>> {
  store_where(conn, "id", &id)
}

pub fn store_by_address(conn: &Connection, address: &str) -> rusqlite::Result<Option<RawStore>> {
  store_where(conn, "address", &address)
}

pub fn store_by_name(conn: &Connection, name: &str) -> rusqlite::Result<Option<RawStore>> {
  store_where(conn, "name", &name)
}

pub fn store_view(conn: &Connection, store: RawStore) -> rusqlite::Result<RawStoreView> {
  let certifications = store_cert_names(conn, store.id)?;
  let card_news = store_card_news(conn, store.id)?;
  Ok(RawStoreView { store, certifications, card_news })
}

/// Stores matching the optional filters, ordered by id.
pub fn list_stores(
  conn: &Connection,
  min_score: Option<i64>,
  category: Option<&str>,
  name_pattern: Option<&str>,
) -> rusqlite::Result<Vec<RawStore>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {STORE_COLUMNS}
     FROM stores s
     WHERE (?1 IS NULL OR s.score >= ?1)
       AND (?2 IS NULL OR EXISTS (
             SELECT 1
             FROM certifications c
             JOIN certification_types ct ON ct.id = c.cert_type_id
             WHERE c.store_id = s.id AND ct.category_code = ?2))
       AND (?3 IS NULL OR s.name LIKE ?3 ESCAPE '\\')
     ORDER BY s.id"
  ))?;
  let rows = stmt
    .query_map(params![min_score, category, name_pattern], store_from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  rows.into_iter().map(|s| with_categories(conn, s)).collect()
}

/// Every card-news row with its store's name and categories, ordered by id.
pub fn list_card_news(conn: &Connection) -> rusqlite::Result<Vec<RawCardNewsEntry>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {CARD_NEWS_COLUMNS}, s.name
     FROM cardnews cn
     JOIN stores s ON s.id = cn.store_id
     ORDER BY cn.id"
  ))?;
  let rows = stmt
    .query_map([], |row| Ok((card_news_from_row(row)?, row.get::<_, String>(6)?)))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut categories: HashMap<i64, Vec<String>> = HashMap::new();
  let mut entries = Vec::with_capacity(rows.len());
  for (card, store_name) in rows {
    let cats = match categories.get(&card.store_id) {
      Some(cats) => cats.clone(),
      None => {
        let cats = store_categories(conn, card.store_id)?;
        categories.insert(card.store_id, cats.clone());
        cats
      }
    };
    entries.push(RawCardNewsEntry { card, store_name, categories: cats });
  }
  Ok(entries)
}

/// `%needle%` with LIKE metacharacters escaped by `\`.
pub fn like_pattern(needle: &str) -> String {
  let mut out = String::with_capacity(needle.len() + 2);
  out.push('%');
  for ch in needle.chars() {
    if matches!(ch, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(ch);
  }
  out.push('%');
  out
}

// ─── Reference data ──────────────────────────────────────────────────────────

/// Get or create a category. A created category is named after its code.
pub fn ensure_category(conn: &Connection, code: &str) -> rusqlite::Result<Category> {
  conn.execute(
    "INSERT INTO categories (code, name) VALUES (?1, ?1) ON CONFLICT(code) DO NOTHING",
    params![code],
  )?;
  conn.query_row(
    "SELECT id, code, name, description FROM categories WHERE code = ?1",
    params![code],
    category_from_row,
  )
}

/// Get or create the certification type sharing the category's code.
pub fn ensure_cert_type(
  conn: &Connection,
  category: &Category,
) -> rusqlite::Result<CertificationType> {
  conn.execute(
    "INSERT INTO certification_types (code, name, category_code)
     VALUES (?1, ?2, ?1)
     ON CONFLICT(code) DO NOTHING",
    params![category.code, category.name],
  )?;
  conn.query_row(
    "SELECT id, code, name, description, issuing_agency, category_code
     FROM certification_types WHERE code = ?1",
    params![category.code],
    cert_type_from_row,
  )
}

pub fn cert_type_id(conn: &Connection, code: &str) -> rusqlite::Result<Option<i64>> {
  conn
    .query_row(
      "SELECT id FROM certification_types WHERE code = ?1",
      params![code],
      |r| r.get(0),
    )
    .optional()
}

pub fn category_exists(conn: &Connection, code: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM categories WHERE code = ?1", params![code], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

// ─── Store writes ────────────────────────────────────────────────────────────

/// Link a store to a certification type. Returns `false` if already linked.
pub fn link_certification(
  conn: &Connection,
  store_id: i64,
  cert_type_id: i64,
) -> rusqlite::Result<bool> {
  let inserted = conn.execute(
    "INSERT INTO certifications (store_id, cert_type_id) VALUES (?1, ?2)
     ON CONFLICT(store_id, cert_type_id) DO NOTHING",
    params![store_id, cert_type_id],
  )?;
  Ok(inserted == 1)
}

/// Certify a store for every category code, creating unseen categories and
/// certification types on the way.
pub fn certify_for_categories(
  conn: &Connection,
  store_id: i64,
  codes: &BTreeSet<String>,
) -> rusqlite::Result<()> {
  for code in codes {
    let category = ensure_category(conn, code)?;
    let cert_type = ensure_cert_type(conn, &category)?;
    link_certification(conn, store_id, cert_type.id)?;
  }
  Ok(())
}

pub fn append_card_news(
  conn: &Connection,
  store_id: i64,
  items: &[PreparedCardNews],
  created_at: &str,
) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare_cached(
    "INSERT INTO cardnews (store_id, title, summary, created_at, raw_json)
     VALUES (?1, ?2, ?3, ?4, ?5)",
  )?;
  for item in items {
    stmt.execute(params![store_id, item.title, item.summary, created_at, item.raw_json])?;
  }
  Ok(())
}

/// Insert a store keyed on address, or accumulate into the store already
/// holding that address. Coordinates are only taken when the existing pair is
/// incomplete. Returns the store id.
pub fn upsert_store_by_address(
  conn: &Connection,
  name: &str,
  address: &str,
  lat: Option<f64>,
  lon: Option<f64>,
  score: u32,
  created_at: &str,
) -> rusqlite::Result<i64> {
  conn.query_row(
    "INSERT INTO stores (name, address, lat, lon, created_at, score)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     ON CONFLICT(address) WHERE address <> '' DO UPDATE SET
       score = stores.score + excluded.score,
       lat = CASE WHEN (stores.lat IS NULL OR stores.lon IS NULL)
                   AND excluded.lat IS NOT NULL AND excluded.lon IS NOT NULL
                  THEN excluded.lat ELSE stores.lat END,
       lon = CASE WHEN (stores.lat IS NULL OR stores.lon IS NULL)
                   AND excluded.lat IS NOT NULL AND excluded.lon IS NOT NULL
                  THEN excluded.lon ELSE stores.lon END
     RETURNING id",
    params![name, address, lat, lon, created_at, score],
    |r| r.get(0),
  )
}

/// Add to a store's score. Returns `false` if the store does not exist.
pub fn add_score(conn: &Connection, store_id: i64, delta: u32) -> rusqlite::Result<bool> {
  let updated = conn.execute(
    "UPDATE stores SET score = score + ?2 WHERE id = ?1",
    params![store_id, delta],
  )?;
  Ok(updated == 1)
}

/// Set coordinates only where the stored pair is incomplete.
pub fn fill_coordinates(
  conn: &Connection,
  store_id: i64,
  lat: f64,
  lon: f64,
) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE stores SET lat = ?2, lon = ?3
     WHERE id = ?1 AND (lat IS NULL OR lon IS NULL)",
    params![store_id, lat, lon],
  )?;
  Ok(())
}

/// Outcome of one seed row.
pub struct SeedRowResult {
  pub created: bool,
  pub linked:  bool,
}

/// Find-or-create a store by name and link it to `cert_type_id`.
///
/// A new store whose address already belongs to another store is not
/// inserted; the row attaches to the address holder instead.
pub fn write_seed_row(
  conn: &Connection,
  row: &PreparedSeedRow,
  cert_type_id: Option<i64>,
  created_at: &str,
) -> rusqlite::Result<SeedRowResult> {
  let existing: Option<i64> = conn
    .query_row(
      "SELECT id FROM stores WHERE name = ?1 ORDER BY id LIMIT 1",
      params![row.name],
      |r| r.get(0),
    )
    .optional()?;

  let (store_id, created) = match existing {
    Some(id) => (id, false),
    None => {
      let inserted: Option<i64> = conn
        .query_row(
          "INSERT INTO stores
             (name, address, district, lat, lon, phone, raw_meta, created_at, score)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)
           ON CONFLICT(address) WHERE address <> '' DO NOTHING
           RETURNING id",
          params![
            row.name,
            row.address,
            row.district,
            row.lat,
            row.lon,
            row.phone,
            row.raw_meta,
            created_at,
          ],
          |r| r.get(0),
        )
        .optional()?;
      match inserted {
        Some(id) => (id, true),
        None => {
          let id = conn.query_row(
            "SELECT id FROM stores WHERE address = ?1",
            params![row.address],
            |r| r.get(0),
          )?;
          (id, false)
        }
      }
    }
  };

  let linked = match cert_type_id {
    Some(ct) => link_certification(conn, store_id, ct)?,
    None => false,
  };
  Ok(SeedRowResult { created, linked })
}

/// Overwrite every score with the certification count times `weight`.
pub fn recompute_scores(conn: &Connection, weight: i64) -> rusqlite::Result<usize> {
  conn.execute(
    "UPDATE stores SET score = ?1 * (
       SELECT COUNT(*) FROM certifications c WHERE c.store_id = stores.id)",
    params![weight],
  )
}
