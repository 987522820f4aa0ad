//! The store reconciler: merges one classification result into the store.
//!
//! Matching is an exact lookup on the address. A candidate that matches
//! nothing only materialises once its score reaches
//! [`MIN_SCORE`](crate::score::MIN_SCORE); below that it is dropped without a
//! trace. Geocoding happens between the lookup and the write so that no
//! transaction is held open across network I/O.

use tracing::{debug, info};

use crate::{
  PipelineError,
  candidate::StoreCandidate,
  error::Error,
  geocode::Geocoder,
  repository::{ReconcileTarget, ReconcileWrite, StoreRepository},
  score::meets_threshold,
  store::Store,
};

/// Drives [`StoreRepository::apply_reconciliation`] for incoming candidates.
pub struct Reconciler<'a, S, G> {
  store:    &'a S,
  geocoder: &'a G,
}

impl<'a, S, G> Reconciler<'a, S, G>
where
  S: StoreRepository,
  G: Geocoder,
{
  pub fn new(store: &'a S, geocoder: &'a G) -> Self { Self { store, geocoder } }

  /// Find-or-create the candidate's store, accumulate its score, and attach
  /// its categories and card-news.
  ///
  /// Returns `Ok(None)` when no store exists for the address and the
  /// candidate's score is below the threshold; nothing is written in that
  /// case. A nameless candidate can only update an existing store; creating
  /// one fails with [`Error::MissingName`].
  pub async fn reconcile(
    &self,
    candidate: StoreCandidate,
  ) -> Result<Option<Store>, PipelineError<S::Error>> {
    if candidate.address.trim().is_empty() {
      return Err(Error::MissingAddress.into());
    }

    let existing = self
      .store
      .find_store_by_address(candidate.address.clone())
      .await
      .map_err(PipelineError::Store)?;

    let target = match existing {
      Some(store) => {
        let fill = match store.coordinates {
          Some(_) => None,
          None => self.geocoder.geocode(&candidate.address).await,
        };
        ReconcileTarget::Existing { id: store.id, fill }
      }
      None if meets_threshold(candidate.score_delta) => {
        let name = candidate.name.clone().ok_or(Error::MissingName)?;
        let coordinates = self.geocoder.geocode(&candidate.address).await;
        ReconcileTarget::Create {
          name,
          address: candidate.address.clone(),
          coordinates,
        }
      }
      None => {
        debug!(
          address = %candidate.address,
          score_delta = candidate.score_delta,
          "candidate below threshold; discarded"
        );
        return Ok(None);
      }
    };

    let created = matches!(target, ReconcileTarget::Create { .. });
    let store = self
      .store
      .apply_reconciliation(ReconcileWrite {
        target,
        score_delta: candidate.score_delta,
        categories: candidate.categories,
        card_news: candidate.card_news,
      })
      .await
      .map_err(PipelineError::Store)?;

    info!(
      store_id = store.id,
      address = %store.address,
      created,
      score = store.score,
      "store reconciled"
    );
    Ok(Some(store))
  }
}
