//! The `ScoringStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g. `encore-store-sqlite`).
//! The engine and the admin API depend on this abstraction, not on any
//! concrete backend. Every write is an idempotent upsert keyed by natural
//! identity; nothing increments or accumulates.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  TransientError,
  achievement::UserAchievement,
  setlist::SetSongList,
  show::Show,
  song::Song,
  submission::{NewPick, Pick, Submission, SubmissionScore},
  tour::{Standing, Tour, TourStatus},
};

/// What a show reset removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetSummary {
  pub submissions_cleared: u64,
  pub picks_cleared:       u64,
  pub awards_removed:      u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the persistent store used by the scoring engine.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait ScoringStore: Send + Sync {
  type Error: std::error::Error + TransientError + Send + Sync + 'static;

  // ── Tours ─────────────────────────────────────────────────────────────

  /// Number of tours whose status is `Active`. A single count query.
  fn count_active_tours(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn upsert_tour(&self, tour: Tour) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_tour(
    &self,
    tour_id: Uuid,
  ) -> impl Future<Output = Result<Option<Tour>, Self::Error>> + Send + '_;

  fn list_tours(&self) -> impl Future<Output = Result<Vec<Tour>, Self::Error>> + Send + '_;

  fn set_tour_status(
    &self,
    tour_id: Uuid,
    status: TourStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Ranked standings over every scored submission of the tour's shows.
  fn tour_standings(
    &self,
    tour_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Standing>, Self::Error>> + Send + '_;

  /// Replace the stored podium of a tour in one transaction.
  fn replace_podium(
    &self,
    tour_id: Uuid,
    podium: Vec<Standing>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_podium(
    &self,
    tour_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Standing>, Self::Error>> + Send + '_;

  // ── Shows ─────────────────────────────────────────────────────────────

  /// Insert a show, or update its schedule fields (date, venue, location,
  /// timezone). Derived scoring state is never touched by this call.
  fn upsert_show(&self, show: Show) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_show(
    &self,
    show_id: Uuid,
  ) -> impl Future<Output = Result<Option<Show>, Self::Error>> + Send + '_;

  /// Shows belonging to tours with status `Active`, ordered by date.
  fn list_active_shows(&self) -> impl Future<Output = Result<Vec<Show>, Self::Error>> + Send + '_;

  fn list_shows(
    &self,
    tour_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Show>, Self::Error>> + Send + '_;

  fn cache_setlist(
    &self,
    show_id: Uuid,
    setlist: SetSongList,
    fetched_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn cache_lock_instant(
    &self,
    show_id: Uuid,
    lock_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Stamp the last-scored time, setting the completion flag when
  /// `complete` is true. Never clears the flag.
  fn mark_show_scored(
    &self,
    show_id: Uuid,
    complete: bool,
    scored_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Record a manual completion signal for the show.
  fn signal_completion(
    &self,
    show_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Clear all derived scoring state for a show in one transaction: setlist
  /// cache, completion flag and signal, last-scored stamp, pick outcomes and
  /// points, submission totals and flags, and the show's award sources.
  /// An award is removed only when the show was its last source.
  fn reset_show(
    &self,
    show_id: Uuid,
  ) -> impl Future<Output = Result<ResetSummary, Self::Error>> + Send + '_;

  // ── Songs ─────────────────────────────────────────────────────────────

  fn upsert_song(&self, song: Song) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Catalog entries for the given slugs; unknown slugs are skipped.
  fn songs_by_slugs(
    &self,
    slugs: Vec<String>,
  ) -> impl Future<Output = Result<Vec<Song>, Self::Error>> + Send + '_;

  // ── Submissions ───────────────────────────────────────────────────────

  /// Create the `(user, show)` submission or replace its picks. Replacing
  /// resets the submission to unscored.
  fn save_submission(
    &self,
    user_id: Uuid,
    show_id: Uuid,
    picks: Vec<NewPick>,
  ) -> impl Future<Output = Result<Submission, Self::Error>> + Send + '_;

  fn get_submission(
    &self,
    submission_id: Uuid,
  ) -> impl Future<Output = Result<Option<Submission>, Self::Error>> + Send + '_;

  fn find_submission(
    &self,
    user_id: Uuid,
    show_id: Uuid,
  ) -> impl Future<Output = Result<Option<Submission>, Self::Error>> + Send + '_;

  fn list_submissions(
    &self,
    show_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + '_;

  fn get_picks(
    &self,
    submission_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Pick>, Self::Error>> + Send + '_;

  /// Write one scoring result: every pick's outcome and points, and the
  /// submission's total, scored flag and last-seen song count, atomically.
  fn apply_score(
    &self,
    score: SubmissionScore,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Achievements ──────────────────────────────────────────────────────
  // The catalog itself is seeded by the backend when it opens.

  fn user_achievements(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<UserAchievement>, Self::Error>> + Send + '_;

  /// Insert an award unless the user already holds it, and record the
  /// award's source show either way. Returns whether the award was new.
  fn award_achievement(
    &self,
    award: UserAchievement,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
