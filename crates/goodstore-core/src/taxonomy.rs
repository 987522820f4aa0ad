//! Category and certification-type reference data.
//!
//! Both tables are append-only: rows are seeded at startup from the fixed
//! lists below and created lazily when reconciliation meets an unseen code.
//! Nothing ever updates or deletes them.

use serde::{Deserialize, Serialize};

/// A social-value taxonomy entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub id:          i64,
  pub code:        String,
  pub name:        String,
  pub description: Option<String>,
}

/// A named certification scheme, optionally belonging to a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationType {
  pub id:             i64,
  pub code:           String,
  pub name:           String,
  pub description:    Option<String>,
  pub issuing_agency: Option<String>,
  pub category_code:  Option<String>,
}

/// Input row for seeding a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
  pub code:        String,
  pub name:        String,
  pub description: Option<String>,
}

/// Input row for seeding a certification type. `category_code` is dropped if
/// it does not name a known category.
#[derive(Debug, Clone)]
pub struct NewCertificationType {
  pub code:           String,
  pub name:           String,
  pub issuing_agency: Option<String>,
  pub category_code:  Option<String>,
}

const CATEGORIES: &[(&str, &str, &str)] = &[
  ("good_price", "착한 가격", "물가 대비 저렴"),
  ("eco_friendly", "친환경", "환경 보호 실천"),
  ("sharing", "나눔 실천", "기부·봉사"),
  ("welfare", "복지 배려", "사회적 약자 배려"),
  ("local_industry", "지역 상생", "지역 활용"),
  ("youth_store", "청년 가게", "청년 운영"),
  ("disadvantaged_friend", "취약계층 친화", "친화적 운영"),
  ("multicultural", "다문화", "문화 교류"),
  ("local_culture", "지역 문화", "문화 보존"),
];

const CERTIFICATION_TYPES: &[(&str, &str, &str, &str)] = &[
  ("good_price", "착한가격업소 인증", "good_price", "행정안전부"),
  ("eco_friendly", "녹색매장 인증", "eco_friendly", "한국환경산업기술원"),
  ("1004campaign", "천사나눔 인증", "sharing", "천사무료급식소"),
  ("vision_store", "비전스토어 인증", "sharing", "월드비전"),
];

/// The fixed category list seeded at startup.
pub fn default_categories() -> Vec<NewCategory> {
  CATEGORIES
    .iter()
    .map(|(code, name, description)| NewCategory {
      code:        (*code).to_owned(),
      name:        (*name).to_owned(),
      description: Some((*description).to_owned()),
    })
    .collect()
}

/// The fixed certification-type list seeded at startup.
pub fn default_certification_types() -> Vec<NewCertificationType> {
  CERTIFICATION_TYPES
    .iter()
    .map(|(code, name, category, agency)| NewCertificationType {
      code:           (*code).to_owned(),
      name:           (*name).to_owned(),
      issuing_agency: Some((*agency).to_owned()),
      category_code:  Some((*category).to_owned()),
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_seeded_cert_type_points_at_a_seeded_category() {
    let codes: Vec<String> =
      default_categories().into_iter().map(|c| c.code).collect();
    for ct in default_certification_types() {
      let cat = ct.category_code.expect("seeded cert types have a category");
      assert!(codes.contains(&cat), "unknown category {cat}");
    }
  }
}
