//! Administrative tour transitions and the standings they freeze.

use encore_core::{
  store::ScoringStore,
  tour::{Standing, Tour, TourStatus, TransitionEffect, podium},
};
use uuid::Uuid;

use crate::{Error, Result};

async fn load<S: ScoringStore>(store: &S, tour_id: Uuid) -> Result<Tour> {
  store
    .get_tour(tour_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::TourNotFound(tour_id))
}

/// Move a tour to `next`, maintaining its podium.
///
/// Completing a tour stores its top three. Reactivating a completed or
/// closed tour needs `confirmed` and deletes the stored podium.
pub async fn set_tour_status<S: ScoringStore>(
  store: &S,
  tour_id: Uuid,
  next: TourStatus,
  confirmed: bool,
) -> Result<Tour> {
  let mut tour = load(store, tour_id).await?;
  let effect = tour.status.transition(next, confirmed)?;

  match effect {
    TransitionEffect::Unchanged => return Ok(tour),
    TransitionEffect::Advance => {}
    TransitionEffect::ComputePodium => {
      let standings = store.tour_standings(tour_id).await.map_err(Error::store)?;
      let top = podium(&standings);
      tracing::info!(%tour_id, places = top.len(), "storing tour podium");
      store.replace_podium(tour_id, top).await.map_err(Error::store)?;
    }
    TransitionEffect::DiscardPodium => {
      tracing::warn!(%tour_id, from = %tour.status, "reactivating tour; podium discarded");
      store.replace_podium(tour_id, Vec::new()).await.map_err(Error::store)?;
    }
  }

  store.set_tour_status(tour_id, next).await.map_err(Error::store)?;
  tracing::info!(%tour_id, from = %tour.status, to = %next, "tour status changed");
  tour.status = next;
  Ok(tour)
}

/// Live standings. Tours that are still `Future` are not public.
pub async fn standings<S: ScoringStore>(store: &S, tour_id: Uuid) -> Result<Vec<Standing>> {
  let tour = load(store, tour_id).await?;
  if !tour.status.is_public() {
    return Err(Error::TourNotPublic(tour_id));
  }
  store.tour_standings(tour_id).await.map_err(Error::store)
}

/// The stored podium; empty until the tour completes.
pub async fn podium_of<S: ScoringStore>(store: &S, tour_id: Uuid) -> Result<Vec<Standing>> {
  let tour = load(store, tour_id).await?;
  if !tour.status.shows_podium() {
    return Ok(Vec::new());
  }
  store.get_podium(tour_id).await.map_err(Error::store)
}
