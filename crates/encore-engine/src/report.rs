//! What a scoring pass did, per show.
//!
//! These summaries are what notification consumers key off: a show whose
//! summary reports no updated submissions and no new completion produced
//! nothing worth telling anyone about.

use encore_core::{date::ShowDate, scoring::Finality, show::Show, submission::PickResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a show was left alone during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
  /// Picks are still open.
  NotLocked,
  /// Another pass in this process is scoring the show.
  Busy,
  /// The feed has no songs for the show yet.
  NoSetlist,
  FeedError { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedSubmission {
  pub submission_id: Uuid,
  pub reason:        String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowScoreSummary {
  pub show_id:               Uuid,
  pub show_date:             ShowDate,
  pub songs_seen:            u32,
  pub submissions_attempted: u32,
  pub submissions_updated:   u32,
  pub submissions_failed:    Vec<FailedSubmission>,
  pub awards_granted:        u32,
  pub finality:              Option<Finality>,
  pub completed:             bool,
  pub newly_completed:       bool,
  pub skipped:               Option<SkipReason>,
}

impl ShowScoreSummary {
  pub(crate) fn new(show: &Show) -> Self {
    Self {
      show_id:               show.show_id,
      show_date:             show.show_date,
      songs_seen:            0,
      submissions_attempted: 0,
      submissions_updated:   0,
      submissions_failed:    Vec::new(),
      awards_granted:        0,
      finality:              None,
      completed:             show.is_complete,
      newly_completed:       false,
      skipped:               None,
    }
  }

  pub(crate) fn skip(mut self, reason: SkipReason) -> Self {
    self.skipped = Some(reason);
    self
  }

  /// Whether anything observable changed for this show.
  pub fn has_changes(&self) -> bool { self.submissions_updated > 0 || self.newly_completed }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
  pub shows: Vec<ShowScoreSummary>,
}

impl PassReport {
  /// Shows worth notifying about.
  pub fn changed(&self) -> impl Iterator<Item = &ShowScoreSummary> {
    self.shows.iter().filter(|s| s.has_changes())
  }

  pub fn submissions_updated(&self) -> u32 { self.shows.iter().map(|s| s.submissions_updated).sum() }
}

/// Result of scoring one user's submission on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestScoreReport {
  pub show_id:        Uuid,
  pub user_id:        Uuid,
  pub submission_id:  Uuid,
  pub songs_seen:     u32,
  pub finality:       Finality,
  pub total:          i64,
  pub picks:          Vec<PickResult>,
  pub awards_granted: u32,
}
