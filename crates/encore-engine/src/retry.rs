//! Bounded retries for transient store failures.
//!
//! [`RetryPolicy::run`] re-invokes an operation with a fixed backoff while
//! the error classifies itself as transient, up to `max_attempts` attempts.
//! Any other error returns immediately. [`RetryingStore`] applies the policy
//! to every call of a wrapped [`ScoringStore`].

use std::{fmt, future::Future, time::Duration};

use chrono::{DateTime, Utc};
use encore_core::{
  TransientError,
  achievement::UserAchievement,
  setlist::SetSongList,
  show::Show,
  song::Song,
  store::{ResetSummary, ScoringStore},
  submission::{NewPick, Pick, Submission, SubmissionScore},
  tour::{Standing, Tour, TourStatus},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
  /// Total attempts, including the first. Zero behaves like one.
  pub max_attempts: u32,
  /// Fixed pause between attempts.
  pub backoff_ms:   u64,
}

impl Default for RetryPolicy {
  fn default() -> Self { Self { max_attempts: 3, backoff_ms: 250 } }
}

impl RetryPolicy {
  /// Run `operation`, retrying transient failures.
  pub async fn run<F, Fut, T, E>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: TransientError + fmt::Display,
  {
    let max_attempts = self.max_attempts.max(1);
    let mut attempt = 0;

    loop {
      attempt += 1;
      match operation().await {
        Ok(value) => {
          if attempt > 1 {
            tracing::debug!(operation = operation_name, attempt, "store call succeeded after retry");
          }
          return Ok(value);
        }
        Err(err) if err.is_transient() && attempt < max_attempts => {
          tracing::warn!(
            operation = operation_name,
            attempt,
            backoff_ms = self.backoff_ms,
            error = %err,
            "transient store failure, will retry"
          );
          tokio::time::sleep(Duration::from_millis(self.backoff_ms)).await;
        }
        Err(err) => {
          if err.is_transient() {
            tracing::error!(
              operation = operation_name,
              attempt,
              error = %err,
              "store call failed: retries exhausted"
            );
          }
          return Err(err);
        }
      }
    }
  }
}

// ─── Decorator ───────────────────────────────────────────────────────────────

/// A [`ScoringStore`] that retries every call of the inner store.
#[derive(Debug, Clone)]
pub struct RetryingStore<S> {
  inner:  S,
  policy: RetryPolicy,
}

impl<S> RetryingStore<S> {
  pub fn new(inner: S, policy: RetryPolicy) -> Self { Self { inner, policy } }

  pub fn inner(&self) -> &S { &self.inner }
}

impl<S: ScoringStore> ScoringStore for RetryingStore<S> {
  type Error = S::Error;

  async fn count_active_tours(&self) -> Result<u64, S::Error> {
    self.policy.run("count_active_tours", || self.inner.count_active_tours()).await
  }

  async fn upsert_tour(&self, tour: Tour) -> Result<(), S::Error> {
    self.policy.run("upsert_tour", || self.inner.upsert_tour(tour.clone())).await
  }

  async fn get_tour(&self, tour_id: Uuid) -> Result<Option<Tour>, S::Error> {
    self.policy.run("get_tour", || self.inner.get_tour(tour_id)).await
  }

  async fn list_tours(&self) -> Result<Vec<Tour>, S::Error> {
    self.policy.run("list_tours", || self.inner.list_tours()).await
  }

  async fn set_tour_status(&self, tour_id: Uuid, status: TourStatus) -> Result<(), S::Error> {
    self
      .policy
      .run("set_tour_status", || self.inner.set_tour_status(tour_id, status))
      .await
  }

  async fn tour_standings(&self, tour_id: Uuid) -> Result<Vec<Standing>, S::Error> {
    self.policy.run("tour_standings", || self.inner.tour_standings(tour_id)).await
  }

  async fn replace_podium(&self, tour_id: Uuid, podium: Vec<Standing>) -> Result<(), S::Error> {
    self
      .policy
      .run("replace_podium", || self.inner.replace_podium(tour_id, podium.clone()))
      .await
  }

  async fn get_podium(&self, tour_id: Uuid) -> Result<Vec<Standing>, S::Error> {
    self.policy.run("get_podium", || self.inner.get_podium(tour_id)).await
  }

  async fn upsert_show(&self, show: Show) -> Result<(), S::Error> {
    self.policy.run("upsert_show", || self.inner.upsert_show(show.clone())).await
  }

  async fn get_show(&self, show_id: Uuid) -> Result<Option<Show>, S::Error> {
    self.policy.run("get_show", || self.inner.get_show(show_id)).await
  }

  async fn list_active_shows(&self) -> Result<Vec<Show>, S::Error> {
    self.policy.run("list_active_shows", || self.inner.list_active_shows()).await
  }

  async fn list_shows(&self, tour_id: Uuid) -> Result<Vec<Show>, S::Error> {
    self.policy.run("list_shows", || self.inner.list_shows(tour_id)).await
  }

  async fn cache_setlist(
    &self,
    show_id: Uuid,
    setlist: SetSongList,
    fetched_at: DateTime<Utc>,
  ) -> Result<(), S::Error> {
    self
      .policy
      .run("cache_setlist", || self.inner.cache_setlist(show_id, setlist.clone(), fetched_at))
      .await
  }

  async fn cache_lock_instant(&self, show_id: Uuid, lock_at: DateTime<Utc>) -> Result<(), S::Error> {
    self
      .policy
      .run("cache_lock_instant", || self.inner.cache_lock_instant(show_id, lock_at))
      .await
  }

  async fn mark_show_scored(
    &self,
    show_id: Uuid,
    complete: bool,
    scored_at: DateTime<Utc>,
  ) -> Result<(), S::Error> {
    self
      .policy
      .run("mark_show_scored", || self.inner.mark_show_scored(show_id, complete, scored_at))
      .await
  }

  async fn signal_completion(&self, show_id: Uuid) -> Result<(), S::Error> {
    self.policy.run("signal_completion", || self.inner.signal_completion(show_id)).await
  }

  async fn reset_show(&self, show_id: Uuid) -> Result<ResetSummary, S::Error> {
    self.policy.run("reset_show", || self.inner.reset_show(show_id)).await
  }

  async fn upsert_song(&self, song: Song) -> Result<(), S::Error> {
    self.policy.run("upsert_song", || self.inner.upsert_song(song.clone())).await
  }

  async fn songs_by_slugs(&self, slugs: Vec<String>) -> Result<Vec<Song>, S::Error> {
    self
      .policy
      .run("songs_by_slugs", || self.inner.songs_by_slugs(slugs.clone()))
      .await
  }

  async fn save_submission(
    &self,
    user_id: Uuid,
    show_id: Uuid,
    picks: Vec<NewPick>,
  ) -> Result<Submission, S::Error> {
    self
      .policy
      .run("save_submission", || self.inner.save_submission(user_id, show_id, picks.clone()))
      .await
  }

  async fn get_submission(&self, submission_id: Uuid) -> Result<Option<Submission>, S::Error> {
    self
      .policy
      .run("get_submission", || self.inner.get_submission(submission_id))
      .await
  }

  async fn find_submission(
    &self,
    user_id: Uuid,
    show_id: Uuid,
  ) -> Result<Option<Submission>, S::Error> {
    self
      .policy
      .run("find_submission", || self.inner.find_submission(user_id, show_id))
      .await
  }

  async fn list_submissions(&self, show_id: Uuid) -> Result<Vec<Submission>, S::Error> {
    self.policy.run("list_submissions", || self.inner.list_submissions(show_id)).await
  }

  async fn get_picks(&self, submission_id: Uuid) -> Result<Vec<Pick>, S::Error> {
    self.policy.run("get_picks", || self.inner.get_picks(submission_id)).await
  }

  async fn apply_score(&self, score: SubmissionScore) -> Result<(), S::Error> {
    self.policy.run("apply_score", || self.inner.apply_score(score.clone())).await
  }

  async fn user_achievements(&self, user_id: Uuid) -> Result<Vec<UserAchievement>, S::Error> {
    self
      .policy
      .run("user_achievements", || self.inner.user_achievements(user_id))
      .await
  }

  async fn award_achievement(&self, award: UserAchievement) -> Result<bool, S::Error> {
    self
      .policy
      .run("award_achievement", || self.inner.award_achievement(award.clone()))
      .await
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicU32, Ordering};

  use super::*;

  #[derive(Debug, PartialEq)]
  enum Flaky {
    Busy,
    Broken,
  }

  impl fmt::Display for Flaky {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{self:?}") }
  }

  impl TransientError for Flaky {
    fn is_transient(&self) -> bool { matches!(self, Self::Busy) }
  }

  fn policy(max_attempts: u32) -> RetryPolicy { RetryPolicy { max_attempts, backoff_ms: 1 } }

  #[tokio::test]
  async fn succeeds_first_time_without_retry() {
    let calls = AtomicU32::new(0);
    let out = policy(3)
      .run("op", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok::<_, Flaky>(42) }
      })
      .await;
    assert_eq!(out, Ok(42));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn transient_errors_are_retried_until_success() {
    let calls = AtomicU32::new(0);
    let out = policy(3)
      .run("op", || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move { if n < 2 { Err(Flaky::Busy) } else { Ok(7) } }
      })
      .await;
    assert_eq!(out, Ok(7));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn gives_up_after_max_attempts() {
    let calls = AtomicU32::new(0);
    let out = policy(3)
      .run("op", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(Flaky::Busy) }
      })
      .await;
    assert_eq!(out, Err(Flaky::Busy));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn permanent_errors_are_not_retried() {
    let calls = AtomicU32::new(0);
    let out = policy(5)
      .run("op", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(Flaky::Broken) }
      })
      .await;
    assert_eq!(out, Err(Flaky::Broken));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn zero_attempts_still_runs_once() {
    let calls = AtomicU32::new(0);
    let _ = policy(0)
      .run("op", || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(Flaky::Busy) }
      })
      .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }
}
