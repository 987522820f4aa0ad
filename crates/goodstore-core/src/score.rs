//! Scoring rules.
//!
//! Two formulas coexist. Reconciliation adds a per-event delta to the stored
//! score ([`score_delta`]); the maintenance pass overwrites every score with
//! [`CERTIFICATION_WEIGHT`] times the store's certification count.

/// Minimum evidence score before a candidate store is persisted at all.
pub const MIN_SCORE: u32 = 50;

/// Points per positively evaluated news article.
pub const NEWS_WEIGHT: u32 = 25;

/// Points per positively evaluated SNS review.
pub const SNS_WEIGHT: u32 = 10;

/// Points per certification in the maintenance recompute.
pub const CERTIFICATION_WEIGHT: i64 = 50;

/// Score contributed by one classification result. Negative counts count as
/// zero.
pub fn score_delta(positive_news_count: i64, positive_sns_count: i64) -> u32 {
  let news = clamp_count(positive_news_count);
  let sns = clamp_count(positive_sns_count);
  news
    .saturating_mul(NEWS_WEIGHT)
    .saturating_add(sns.saturating_mul(SNS_WEIGHT))
}

/// Whether a candidate with no existing store may be materialised.
pub fn meets_threshold(delta: u32) -> bool { delta >= MIN_SCORE }

/// Score assigned by the maintenance pass.
pub fn score_from_certifications(count: i64) -> i64 {
  count.max(0).saturating_mul(CERTIFICATION_WEIGHT)
}

fn clamp_count(n: i64) -> u32 { u32::try_from(n.max(0)).unwrap_or(u32::MAX) }
