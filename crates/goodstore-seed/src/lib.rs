//! Seed-file parsing for the goodstore bulk loader.
//!
//! Public datasets arrive as CSV (Korean column headers) or as JSON arrays of
//! objects. Both are read into [`SeedRecord`]s; validation (missing names)
//! is left to [`goodstore_core::bulk::BulkLoader`].
//!
//! CSV exports from Korean portals are often CP949 rather than UTF-8, so CSV
//! fields are decoded one at a time and may mix both encodings.

pub mod error;
mod source;

use std::{borrow::Cow, io::Read};

use csv::ByteRecord;
use encoding_rs::EUC_KR;
use goodstore_core::bulk::SeedRecord;
use serde_json::{Map, Value};
use tracing::warn;

pub use error::{Error, Result};
pub use source::{SeedFormat, SeedSource, default_sources, read_source};

const BOM: char = '\u{feff}';

// ─── CSV ─────────────────────────────────────────────────────────────────────

/// Which CSV headers feed which [`SeedRecord`] field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvColumns {
  /// Tried in order; the first non-empty value names the store.
  pub name_keys: Vec<String>,
  pub address:   String,
  pub district:  String,
  pub phone:     String,
}

impl CsvColumns {
  pub fn with_name_keys<I, K>(keys: I) -> Self
  where
    I: IntoIterator<Item = K>,
    K: Into<String>,
  {
    Self {
      name_keys: keys.into_iter().map(Into::into).collect(),
      ..Self::default()
    }
  }
}

impl Default for CsvColumns {
  fn default() -> Self {
    Self {
      name_keys: vec!["업소명".into()],
      address:   "주소".into(),
      district:  "시군".into(),
      phone:     "연락처".into(),
    }
  }
}

/// Decode one CSV field as UTF-8, falling back to CP949. `None` when the
/// bytes are neither.
fn decode_field(bytes: &[u8]) -> Option<Cow<'_, str>> {
  if let Ok(text) = std::str::from_utf8(bytes) {
    return Some(Cow::Borrowed(text));
  }
  // encoding_rs's EUC-KR is the WHATWG label, a superset covering CP949.
  let (text, had_errors) = EUC_KR.decode_without_bom_handling(bytes);
  (!had_errors).then_some(text)
}

/// Read every row of a headed CSV file. Short and long rows are accepted;
/// every present column is kept in `raw_meta`. A row with a field in neither
/// UTF-8 nor CP949 is logged and skipped.
pub fn read_csv<R: Read>(reader: R, columns: &CsvColumns) -> Result<Vec<SeedRecord>> {
  let mut rdr = csv::ReaderBuilder::new()
    .flexible(true)
    .trim(csv::Trim::All)
    .from_reader(reader);

  let headers: Vec<String> = rdr
    .byte_headers()?
    .iter()
    .map(|h| {
      let text = decode_field(h).unwrap_or_else(|| String::from_utf8_lossy(h));
      text.trim_start_matches(BOM).to_owned()
    })
    .collect();

  let mut records = Vec::new();
  let mut row = ByteRecord::new();
  while rdr.read_byte_record(&mut row)? {
    let decoded: Option<Vec<Cow<'_, str>>> = row.iter().map(decode_field).collect();
    let Some(fields) = decoded else {
      let line = row.position().map(|p| p.line());
      warn!(?line, "CSV row is neither UTF-8 nor CP949; skipped");
      continue;
    };
    let meta: Map<String, Value> = headers
      .iter()
      .zip(fields)
      .map(|(h, v)| (h.clone(), Value::String(v.into_owned())))
      .collect();

    let name = columns
      .name_keys
      .iter()
      .find_map(|key| non_empty(&meta, key));
    records.push(SeedRecord {
      name,
      address: non_empty(&meta, &columns.address).unwrap_or_default(),
      district: non_empty(&meta, &columns.district),
      phone: non_empty(&meta, &columns.phone),
      raw_meta: meta,
    });
  }
  Ok(records)
}

// ─── JSON ────────────────────────────────────────────────────────────────────

/// Read a top-level JSON array of objects keyed `name`, `address`,
/// `district` and `phone`. Items that are not objects come back nameless.
pub fn read_json<R: Read>(mut reader: R) -> Result<Vec<SeedRecord>> {
  let mut text = String::new();
  reader.read_to_string(&mut text)?;
  let items = match serde_json::from_str(text.trim_start_matches(BOM))? {
    Value::Array(items) => items,
    _ => return Err(Error::NotAnArray),
  };

  Ok(
    items
      .into_iter()
      .map(|item| match item {
        Value::Object(meta) => SeedRecord {
          name: non_empty(&meta, "name"),
          address: non_empty(&meta, "address").unwrap_or_default(),
          district: non_empty(&meta, "district"),
          phone: non_empty(&meta, "phone"),
          raw_meta: meta,
        },
        _ => SeedRecord::default(),
      })
      .collect(),
  )
}

/// The trimmed string (or number) at `key`, if non-empty.
fn non_empty(meta: &Map<String, Value>, key: &str) -> Option<String> {
  let s = match meta.get(key)? {
    Value::String(s) => s.trim().to_owned(),
    Value::Number(n) => n.to_string(),
    _ => return None,
  };
  (!s.is_empty()).then_some(s)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn csv_rows_map_korean_headers() {
    let data = "\u{feff}업소명,주소,시군,연락처,업종\n\
                김밥천국, 수원시 팔달구 1 ,수원시,031-000-0000,분식\n";
    let recs = read_csv(data.as_bytes(), &CsvColumns::default()).unwrap();
    assert_eq!(recs.len(), 1);
    let r = &recs[0];
    assert_eq!(r.name.as_deref(), Some("김밥천국"));
    assert_eq!(r.address, "수원시 팔달구 1");
    assert_eq!(r.district.as_deref(), Some("수원시"));
    assert_eq!(r.phone.as_deref(), Some("031-000-0000"));
    assert_eq!(r.raw_meta.get("업종"), Some(&json!("분식")));
    assert!(r.raw_meta.contains_key("업소명"), "BOM is stripped from the header");
  }

  #[test]
  fn csv_name_falls_back_through_keys() {
    let data = "매장명,업체명,주소\n,Green Shop,1 Rd\nEco Mart,,2 Rd\n,,3 Rd\n";
    let cols = CsvColumns::with_name_keys(["매장명", "업체명"]);
    let recs = read_csv(data.as_bytes(), &cols).unwrap();
    let names: Vec<_> = recs.iter().map(|r| r.name.as_deref()).collect();
    assert_eq!(names, [Some("Green Shop"), Some("Eco Mart"), None]);
  }

  #[test]
  fn csv_short_rows_are_tolerated() {
    let data = "업소명,주소,연락처\nA\nB,2 Rd,010\n";
    let recs = read_csv(data.as_bytes(), &CsvColumns::default()).unwrap();
    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].address, "");
    assert!(recs[0].phone.is_none());
    assert_eq!(recs[1].phone.as_deref(), Some("010"));
  }

  #[test]
  fn csv_cp949_fields_are_decoded() {
    // "김밥" encoded as CP949.
    let data: &[u8] = b"name,addr
\xB1\xE8\xB9\xE4,1 Rd
";
    let cols = CsvColumns {
      name_keys: vec!["name".into()],
      address:   "addr".into(),
      ..CsvColumns::default()
    };
    let recs = read_csv(data, &cols).unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].name.as_deref(), Some("김밥"));
    assert_eq!(recs[0].raw_meta.get("name"), Some(&json!("김밥")));
  }

  #[test]
  fn csv_undecodable_row_is_skipped_alone() {
    let mut data = "업소명,주소
김밥천국,1 Rd
".as_bytes().to_vec();
    data.extend_from_slice(b"\xFF\xFE,2 Rd
");
    data.extend_from_slice("Plain Shop,3 Rd
".as_bytes());

    let recs = read_csv(data.as_slice(), &CsvColumns::default()).unwrap();
    let names: Vec<_> = recs.iter().map(|r| r.name.as_deref()).collect();
    assert_eq!(names, [Some("김밥천국"), Some("Plain Shop")]);
    assert_eq!(recs[1].address, "3 Rd");
  }

  #[test]
  fn json_items_read_and_non_objects_are_nameless() {
    let data = json!([
      {"name": "Angel Kitchen", "address": "1 Rd", "district": "Jung", "phone": 1234},
      "junk",
      {"address": "no name"}
    ])
    .to_string();
    let recs = read_json(data.as_bytes()).unwrap();
    assert_eq!(recs.len(), 3);
    assert_eq!(recs[0].name.as_deref(), Some("Angel Kitchen"));
    assert_eq!(recs[0].phone.as_deref(), Some("1234"));
    assert_eq!(recs[1], SeedRecord::default());
    assert!(recs[2].name.is_none());
  }

  #[test]
  fn json_must_be_an_array() {
    let err = read_json(r#"{"name": "x"}"#.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::NotAnArray));
  }
}
