//! The address → coordinates seam.

use std::future::Future;

use crate::store::Coordinates;

/// Resolves a street address to coordinates.
///
/// Implementations never fail: any upstream error is logged and reported as
/// `None`, so callers can treat geocoding as best-effort enrichment.
pub trait Geocoder: Send + Sync {
  fn geocode<'a>(
    &'a self,
    address: &'a str,
  ) -> impl Future<Output = Option<Coordinates>> + Send + 'a;
}

/// A geocoder that never resolves anything. Used when no geocoding backend is
/// configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeocoder;

impl Geocoder for NoGeocoder {
  async fn geocode(&self, _address: &str) -> Option<Coordinates> { None }
}
