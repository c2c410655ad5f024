//! Submissions and the picks they carry.
//!
//! A user makes exactly one submission per show, holding thirteen picks: one
//! opener, one encore, and eleven general picks. The scoring pass owns every
//! outcome and point field; users only touch picks before the show locks.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

pub const PICKS_PER_SUBMISSION: usize = 13;

// ─── Category ────────────────────────────────────────────────────────────────

/// Where in the show a pick has to land to score.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PickCategory {
  /// First song of the first set.
  Opener,
  /// Anywhere in the encore segment.
  Encore,
  /// Anywhere in the show.
  General,
}

impl PickCategory {
  /// How many picks of this category a complete submission holds.
  pub fn slots(self) -> usize {
    match self {
      Self::Opener | Self::Encore => 1,
      Self::General => PICKS_PER_SUBMISSION - 2,
    }
  }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// A scored pick's result. An unscored pick carries `None`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PickOutcome {
  NotPlayed,
  Played,
}

// ─── Pick ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
  pub pick_id:       Uuid,
  pub submission_id: Uuid,
  pub song_slug:     String,
  pub category:      PickCategory,
  /// `None` until a scoring pass has decided the pick.
  pub outcome:       Option<PickOutcome>,
  pub points_earned: i64,
}

/// A pick as entered by a user, before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPick {
  pub song_slug: String,
  pub category:  PickCategory,
}

impl NewPick {
  pub fn new(song_slug: impl Into<String>, category: PickCategory) -> Self {
    Self { song_slug: song_slug.into(), category }
  }
}

/// Check that `picks` forms a complete submission.
pub fn validate_pick_set(picks: &[NewPick]) -> Result<()> {
  if picks.len() != PICKS_PER_SUBMISSION {
    return Err(Error::InvalidPickSet(format!(
      "expected {PICKS_PER_SUBMISSION} picks, got {}",
      picks.len()
    )));
  }

  for category in [PickCategory::Opener, PickCategory::Encore, PickCategory::General] {
    let count = picks.iter().filter(|p| p.category == category).count();
    if count != category.slots() {
      return Err(Error::InvalidPickSet(format!(
        "expected {} {category} pick(s), got {count}",
        category.slots()
      )));
    }
  }

  let mut seen = HashSet::new();
  for pick in picks {
    let slug = pick.song_slug.trim().to_ascii_lowercase();
    if slug.is_empty() {
      return Err(Error::InvalidPickSet("empty song slug".into()));
    }
    if !seen.insert((pick.category, slug)) {
      return Err(Error::InvalidPickSet(format!(
        "{} picked twice as {}",
        pick.song_slug, pick.category
      )));
    }
  }

  Ok(())
}

// ─── Submission ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
  pub submission_id:        Uuid,
  pub user_id:              Uuid,
  pub show_id:              Uuid,
  pub points:               i64,
  pub is_scored:            bool,
  /// Setlist length seen by the last scoring pass that touched this row.
  pub last_seen_song_count: u32,
  pub created_at:           DateTime<Utc>,
}

/// One pick's result from a scoring pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickResult {
  pub pick_id:       Uuid,
  pub outcome:       Option<PickOutcome>,
  pub points_earned: i64,
}

/// Everything a scoring pass writes for one submission, applied as a single
/// idempotent update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionScore {
  pub submission_id: Uuid,
  pub total:         i64,
  pub song_count:    u32,
  pub picks:         Vec<PickResult>,
}
