//! [`SubmissionStateManager`]: the scoring pass and its admin controls.
//!
//! A pass is gated on there being at least one active tour. For every
//! unfinished show of an active tour it then:
//!
//! 1. checks the show is locked (or completion was signalled),
//! 2. fetches the current setlist,
//! 3. rescores each submission whose inputs changed since it was last scored,
//! 4. awards achievements,
//! 5. caches the setlist and stamps the show, completing it when final.
//!
//! Every write is an idempotent upsert, so concurrent or repeated passes over
//! the same setlist converge on the same stored state.

use std::{
  collections::HashSet,
  sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, TimeDelta, Utc};
use encore_core::{
  lock::{LockSettings, LockState, LockTimeResolver},
  scoring::{Finality, score},
  setlist::SetSongList,
  show::Show,
  source::SetlistSource,
  store::{ResetSummary, ScoringStore},
  submission::{NewPick, Pick, PickResult, Submission},
  tour::{Standing, Tour, TourStatus},
};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::{
  Error, Result,
  achievements::AchievementEvaluator,
  report::{FailedSubmission, PassReport, ShowScoreSummary, SkipReason, TestScoreReport},
  settings::ScoringSettings,
  submissions, tours,
};

#[derive(Debug, Clone, Copy)]
enum Trigger {
  Periodic,
  Manual { mark_complete: bool },
}

enum Rescore {
  Unchanged,
  Updated { awards: u32 },
}

// ─── In-flight guard ─────────────────────────────────────────────────────────

type InFlightSet = Arc<Mutex<HashSet<Uuid>>>;

/// Marks a show as being scored by this process until dropped.
struct InFlight {
  set:     InFlightSet,
  show_id: Uuid,
}

impl InFlight {
  fn claim(set: &InFlightSet, show_id: Uuid) -> Option<Self> {
    let mut shows = set.lock().unwrap_or_else(PoisonError::into_inner);
    if !shows.insert(show_id) {
      return None;
    }
    Some(Self { set: Arc::clone(set), show_id })
  }
}

impl Drop for InFlight {
  fn drop(&mut self) {
    self
      .set
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&self.show_id);
  }
}

// ─── Manager ─────────────────────────────────────────────────────────────────

/// Orchestrates fetching, scoring and persisting for shows.
///
/// Cheap to clone; clones share the store, the feed and the in-flight set.
pub struct SubmissionStateManager<S, F> {
  store:        Arc<S>,
  source:       Arc<F>,
  resolver:     LockTimeResolver,
  scoring:      Arc<ScoringSettings>,
  achievements: AchievementEvaluator<S>,
  in_flight:    InFlightSet,
}

impl<S, F> Clone for SubmissionStateManager<S, F> {
  fn clone(&self) -> Self {
    Self {
      store:        Arc::clone(&self.store),
      source:       Arc::clone(&self.source),
      resolver:     self.resolver.clone(),
      scoring:      Arc::clone(&self.scoring),
      achievements: self.achievements.clone(),
      in_flight:    Arc::clone(&self.in_flight),
    }
  }
}

impl<S, F> SubmissionStateManager<S, F>
where
  S: ScoringStore + 'static,
  F: SetlistSource + 'static,
{
  pub fn new(store: Arc<S>, source: Arc<F>, lock: LockSettings, scoring: ScoringSettings) -> Self {
    Self {
      achievements: AchievementEvaluator::new(Arc::clone(&store)),
      store,
      source,
      resolver: LockTimeResolver::new(lock),
      scoring: Arc::new(scoring),
      in_flight: Arc::default(),
    }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn resolver(&self) -> &LockTimeResolver { &self.resolver }

  // ── Periodic pass ─────────────────────────────────────────────────────────

  pub async fn run_pass(&self) -> Result<PassReport> { self.run_pass_at(Utc::now()).await }

  /// One periodic pass as of `now`.
  ///
  /// Feed failures skip the affected show. A store failure that survives
  /// retries fails the pass once every show has been attempted.
  pub async fn run_pass_at(&self, now: DateTime<Utc>) -> Result<PassReport> {
    let active = self.store.count_active_tours().await.map_err(Error::store)?;
    if active == 0 {
      tracing::debug!("no active tour; nothing to score");
      return Ok(PassReport::default());
    }

    self.scoring.points.validate()?;
    let shows = self.store.list_active_shows().await.map_err(Error::store)?;

    let mut tasks = JoinSet::new();
    for show in shows {
      if show.is_complete {
        continue;
      }
      let this = self.clone();
      tasks.spawn(async move { this.process_show(show, now, Trigger::Periodic).await });
    }

    let mut report = PassReport::default();
    let mut failure = None;
    while let Some(joined) = tasks.join_next().await {
      match joined {
        Ok(Ok(summary)) => report.shows.push(summary),
        Ok(Err(e)) => {
          tracing::error!(error = %e, "show scoring failed");
          failure.get_or_insert(e);
        }
        Err(e) => tracing::error!(error = %e, "show scoring task aborted"),
      }
    }
    if let Some(e) = failure {
      return Err(e);
    }

    report.shows.sort_by_key(|s| (s.show_date, s.show_id));
    tracing::info!(
      shows = report.shows.len(),
      updated = report.submissions_updated(),
      "scoring pass finished"
    );
    Ok(report)
  }

  // ── Admin controls ────────────────────────────────────────────────────────

  /// Score one show now. `mark_complete` is the manual completion signal:
  /// it also lifts the lock requirement and the minimum setlist length.
  pub async fn score_show(&self, show_id: Uuid, mark_complete: bool) -> Result<ShowScoreSummary> {
    self.score_show_at(show_id, mark_complete, Utc::now()).await
  }

  pub async fn score_show_at(
    &self,
    show_id: Uuid,
    mark_complete: bool,
    now: DateTime<Utc>,
  ) -> Result<ShowScoreSummary> {
    let show = self.load_show(show_id).await?;
    self.scoring.points.validate()?;
    self
      .process_show(show, now, Trigger::Manual { mark_complete })
      .await
  }

  /// Score a single user's submission against the live setlist, ignoring
  /// the lock. Meant for testing the pipeline outside production.
  pub async fn force_test_score(&self, show_id: Uuid, user_id: Uuid) -> Result<TestScoreReport> {
    self.force_test_score_at(show_id, user_id, Utc::now()).await
  }

  pub async fn force_test_score_at(
    &self,
    show_id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<TestScoreReport> {
    let show = self.load_show(show_id).await?;
    let submission = self
      .store
      .find_submission(user_id, show_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::SubmissionNotFound { user_id, show_id })?;

    let setlist = self
      .source
      .fetch_setlist(show.show_date)
      .await
      .map_err(Error::feed)?
      .filter(|l| !l.is_empty())
      .ok_or(Error::NoSetlist(show_id))?;

    let lock_at = self.resolver.lock_instant_for(&show).ok();
    let finality = self.finality(&show, &setlist, lock_at, now, show.completion_signalled);

    let picks = self.store.get_picks(submission.submission_id).await.map_err(Error::store)?;
    let card = score(&picks, &setlist, finality, &self.scoring.points)?;
    let awards = self
      .achievements
      .evaluate(user_id, show_id, submission.submission_id, &with_results(picks, &card.picks), now)
      .await?;
    let report = TestScoreReport {
      show_id,
      user_id,
      submission_id: submission.submission_id,
      songs_seen: setlist.song_count(),
      finality,
      total: card.total,
      picks: card.picks.clone(),
      awards_granted: awards,
    };
    self
      .store
      .apply_score(card.into_submission_score(submission.submission_id, setlist.song_count()))
      .await
      .map_err(Error::store)?;

    tracing::info!(%show_id, %user_id, total = report.total, ?finality, "forced test score");
    Ok(report)
  }

  /// Clear all derived scoring state of a show.
  pub async fn reset_show(&self, show_id: Uuid) -> Result<ResetSummary> {
    let Some(_guard) = InFlight::claim(&self.in_flight, show_id) else {
      return Err(Error::ShowBusy(show_id));
    };
    self.load_show(show_id).await?;
    let summary = self.store.reset_show(show_id).await.map_err(Error::store)?;
    tracing::info!(
      %show_id,
      submissions = summary.submissions_cleared,
      picks = summary.picks_cleared,
      awards = summary.awards_removed,
      "show reset"
    );
    Ok(summary)
  }

  pub async fn submit_picks(
    &self,
    user_id: Uuid,
    show_id: Uuid,
    picks: Vec<NewPick>,
  ) -> Result<Submission> {
    self.submit_picks_at(user_id, show_id, picks, Utc::now()).await
  }

  pub async fn submit_picks_at(
    &self,
    user_id: Uuid,
    show_id: Uuid,
    picks: Vec<NewPick>,
    now: DateTime<Utc>,
  ) -> Result<Submission> {
    submissions::submit_picks(&*self.store, &self.resolver, user_id, show_id, picks, now).await
  }

  pub async fn set_tour_status(
    &self,
    tour_id: Uuid,
    status: TourStatus,
    confirmed: bool,
  ) -> Result<Tour> {
    tours::set_tour_status(&*self.store, tour_id, status, confirmed).await
  }

  pub async fn standings(&self, tour_id: Uuid) -> Result<Vec<Standing>> {
    tours::standings(&*self.store, tour_id).await
  }

  pub async fn podium(&self, tour_id: Uuid) -> Result<Vec<Standing>> {
    tours::podium_of(&*self.store, tour_id).await
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  async fn load_show(&self, show_id: Uuid) -> Result<Show> {
    self
      .store
      .get_show(show_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::ShowNotFound(show_id))
  }

  /// Final once the show has concluded (encore reported, completion timeout
  /// elapsed after lock, or a manual signal) with a long enough setlist. A
  /// show already complete stays final.
  fn finality(
    &self,
    show: &Show,
    setlist: &SetSongList,
    locked_since: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    manual_complete: bool,
  ) -> Finality {
    if show.is_complete {
      return Finality::Final;
    }
    let timeout = TimeDelta::hours(self.scoring.completion_timeout_hours);
    let timed_out = locked_since
      .or(show.lock_at)
      .is_some_and(|at| now - at >= timeout);
    let concluded = manual_complete || setlist.has_encore() || timed_out;
    let long_enough =
      manual_complete || setlist.song_count() >= self.scoring.min_final_setlist_len;

    if concluded && long_enough && !setlist.is_empty() {
      Finality::Final
    } else {
      Finality::Provisional
    }
  }

  async fn process_show(
    &self,
    show: Show,
    now: DateTime<Utc>,
    trigger: Trigger,
  ) -> Result<ShowScoreSummary> {
    let show_id = show.show_id;
    let mut summary = ShowScoreSummary::new(&show);
    let Some(_guard) = InFlight::claim(&self.in_flight, show_id) else {
      tracing::debug!(%show_id, "show already being scored");
      return Ok(summary.skip(SkipReason::Busy));
    };
    let newly_signalled = matches!(trigger, Trigger::Manual { mark_complete: true })
      && !show.completion_signalled;
    let manual_complete = newly_signalled || show.completion_signalled;
    let signalled = show.is_complete || manual_complete;

    // Lock gate.
    let state = self.resolver.state_for(&show, now);
    if let Some(at) = state.instant() {
      if show.lock_at != Some(at) {
        self.store.cache_lock_instant(show_id, at).await.map_err(Error::store)?;
      }
    }
    let locked_since = match state {
      LockState::Locked { since } => Some(since),
      _ if signalled => None,
      LockState::Open { locks_at } => {
        tracing::debug!(%show_id, %locks_at, "picks still open");
        return Ok(summary.skip(SkipReason::NotLocked));
      }
      LockState::Undetermined => {
        match self
          .source
          .is_show_started(show.show_date, show.timezone.clone(), show.region.clone())
          .await
        {
          Ok(true) => None,
          Ok(false) => return Ok(summary.skip(SkipReason::NotLocked)),
          Err(e) => {
            tracing::warn!(%show_id, error = %e, "feed status check failed; skipping show");
            return Ok(summary.skip(SkipReason::FeedError { message: e.to_string() }));
          }
        }
      }
    };

    // Fetch.
    let setlist = match self.source.fetch_setlist(show.show_date).await {
      Ok(Some(list)) if !list.is_empty() => list,
      Ok(_) => {
        tracing::debug!(%show_id, "no setlist yet");
        return Ok(summary.skip(SkipReason::NoSetlist));
      }
      Err(e) => {
        tracing::warn!(%show_id, error = %e, "setlist fetch failed; skipping show");
        return Ok(summary.skip(SkipReason::FeedError { message: e.to_string() }));
      }
    };

    // The signal outlives this pass: if a submission fails below, the
    // next periodic pass must still see a final setlist.
    if newly_signalled {
      self.store.signal_completion(show_id).await.map_err(Error::store)?;
    }

    let finality = self.finality(&show, &setlist, locked_since, now, manual_complete);
    let newly_final = finality == Finality::Final && !show.is_complete;
    let changed = show.setlist_fingerprint().as_deref() != Some(setlist.fingerprint().as_str());

    summary.songs_seen = setlist.song_count();
    summary.finality = Some(finality);

    // Score.
    let submissions = self.store.list_submissions(show_id).await.map_err(Error::store)?;
    summary.submissions_attempted = submissions.len() as u32;
    for submission in submissions {
      let submission_id = submission.submission_id;
      match self
        .rescore(submission, &setlist, finality, changed || newly_final, now)
        .await
      {
        Ok(Rescore::Unchanged) => {}
        Ok(Rescore::Updated { awards }) => {
          summary.submissions_updated += 1;
          summary.awards_granted += awards;
        }
        Err(e) => {
          tracing::warn!(%show_id, %submission_id, error = %e, "submission scoring failed");
          summary.submissions_failed.push(FailedSubmission { submission_id, reason: e.to_string() });
        }
      }
    }

    // Stamp. With failures outstanding the old cache and completion flag
    // stay put, so the next pass retries the failed submissions.
    let clean = summary.submissions_failed.is_empty();
    if clean && changed {
      self
        .store
        .cache_setlist(show_id, setlist, now)
        .await
        .map_err(Error::store)?;
    }
    let complete = finality == Finality::Final && clean;
    self
      .store
      .mark_show_scored(show_id, complete, now)
      .await
      .map_err(Error::store)?;

    summary.completed = show.is_complete || complete;
    summary.newly_completed = complete && !show.is_complete;
    if summary.newly_completed {
      tracing::info!(%show_id, songs = summary.songs_seen, "show complete");
    }
    tracing::debug!(
      %show_id,
      attempted = summary.submissions_attempted,
      updated = summary.submissions_updated,
      failed = summary.submissions_failed.len(),
      "show scored"
    );
    Ok(summary)
  }

  /// Rescore one submission unless nothing it depends on has changed.
  async fn rescore(
    &self,
    submission: Submission,
    setlist: &SetSongList,
    finality: Finality,
    force: bool,
    now: DateTime<Utc>,
  ) -> Result<Rescore> {
    let song_count = setlist.song_count();
    if submission.is_scored && !force && submission.last_seen_song_count == song_count {
      return Ok(Rescore::Unchanged);
    }

    let picks = self
      .store
      .get_picks(submission.submission_id)
      .await
      .map_err(Error::store)?;
    let card = score(&picks, setlist, finality, &self.scoring.points)?;

    // Awards go first: if the score write then fails, the next pass
    // rescores and re-awards, and duplicate awards are no-ops.
    let awards = self
      .achievements
      .evaluate(
        submission.user_id,
        submission.show_id,
        submission.submission_id,
        &with_results(picks, &card.picks),
        now,
      )
      .await?;
    self
      .store
      .apply_score(card.into_submission_score(submission.submission_id, song_count))
      .await
      .map_err(Error::store)?;

    Ok(Rescore::Updated { awards })
  }
}

/// Picks carrying freshly computed outcomes.
fn with_results(picks: Vec<Pick>, results: &[PickResult]) -> Vec<Pick> {
  picks
    .into_iter()
    .zip(results)
    .map(|(mut pick, result)| {
      pick.outcome = result.outcome;
      pick.points_earned = result.points_earned;
      pick
    })
    .collect()
}
