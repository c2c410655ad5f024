//! Accepting a user's picks for a show.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use encore_core::{
  lock::LockTimeResolver,
  song::normalize_slug,
  store::ScoringStore,
  submission::{NewPick, Submission, validate_pick_set},
};
use uuid::Uuid;

use crate::{Error, Result};

/// Store `picks` as the user's submission for the show, replacing any
/// earlier one.
///
/// Rejected unless the pick set is complete, the show's tour accepts picks,
/// the show has not locked, and every song is in the catalog. A show whose
/// lock time cannot be determined counts as open.
pub async fn submit_picks<S: ScoringStore>(
  store: &S,
  resolver: &LockTimeResolver,
  user_id: Uuid,
  show_id: Uuid,
  picks: Vec<NewPick>,
  now: DateTime<Utc>,
) -> Result<Submission> {
  validate_pick_set(&picks)?;

  let show = store
    .get_show(show_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::ShowNotFound(show_id))?;
  let tour = store
    .get_tour(show.tour_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::TourNotFound(show.tour_id))?;

  if !tour.status.accepts_picks() {
    return Err(Error::PicksClosed(tour.tour_id));
  }
  if show.is_complete || resolver.state_for(&show, now).is_locked() {
    return Err(Error::ShowLocked(show_id));
  }

  let wanted: HashSet<String> = picks.iter().map(|p| normalize_slug(&p.song_slug)).collect();
  let known: HashSet<String> = store
    .songs_by_slugs(wanted.iter().cloned().collect())
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|s| s.slug)
    .collect();
  let mut unknown: Vec<String> = wanted.difference(&known).cloned().collect();
  if !unknown.is_empty() {
    unknown.sort();
    return Err(Error::UnknownSongs(unknown));
  }

  let submission = store
    .save_submission(user_id, show_id, picks)
    .await
    .map_err(Error::store)?;
  tracing::info!(
    %user_id,
    %show_id,
    submission_id = %submission.submission_id,
    "picks saved"
  );
  Ok(submission)
}
