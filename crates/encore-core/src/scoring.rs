//! The scoring engine: picks + setlist → outcomes and a total.
//!
//! [`score`] is a pure function. It never looks at previously stored
//! outcomes, so re-running it on the same inputs always yields the same card.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  setlist::SetSongList,
  song::normalize_slug,
  submission::{Pick, PickCategory, PickOutcome, PickResult, SubmissionScore},
};

// ─── Point table ─────────────────────────────────────────────────────────────

/// Points awarded per category. Supplied by configuration; there are no
/// built-in weights.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointTable(BTreeMap<PickCategory, i64>);

impl PointTable {
  pub fn new(weights: impl IntoIterator<Item = (PickCategory, i64)>) -> Self {
    Self(weights.into_iter().collect())
  }

  /// The weight for `category`; a missing entry is a configuration error.
  pub fn weight(&self, category: PickCategory) -> Result<i64> {
    self
      .0
      .get(&category)
      .copied()
      .ok_or(Error::MissingPointWeight(category))
  }

  /// Fail unless every category has a weight.
  pub fn validate(&self) -> Result<()> {
    for category in [PickCategory::Opener, PickCategory::Encore, PickCategory::General] {
      self.weight(category)?;
    }
    Ok(())
  }
}

// ─── Finality ────────────────────────────────────────────────────────────────

/// Whether absence from the setlist means "not played".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Finality {
  /// The show may still be in progress: unmatched picks stay unscored.
  Provisional,
  /// The setlist is complete: unmatched picks are marked not played.
  Final,
}

// ─── Matching ────────────────────────────────────────────────────────────────

impl PickCategory {
  /// Whether a pick of this category on `slug` counts as played.
  pub fn matches(self, slug: &str, setlist: &SetSongList) -> bool {
    match self {
      Self::Opener => setlist
        .opener()
        .is_some_and(|e| normalize_slug(&e.slug) == normalize_slug(slug)),
      Self::Encore => setlist.in_encore(slug),
      Self::General => setlist.contains(slug),
    }
  }
}

// ─── Score card ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCard {
  pub picks: Vec<PickResult>,
  pub total: i64,
}

impl ScoreCard {
  pub fn played(&self) -> usize {
    self
      .picks
      .iter()
      .filter(|p| p.outcome == Some(PickOutcome::Played))
      .count()
  }

  pub fn into_submission_score(self, submission_id: uuid::Uuid, song_count: u32) -> SubmissionScore {
    SubmissionScore { submission_id, total: self.total, song_count, picks: self.picks }
  }
}

/// Score `picks` against `setlist`.
///
/// A provisional setlist never downgrades a stored "not played" back to
/// unscored; only a show reset does that.
pub fn score(
  picks: &[Pick],
  setlist: &SetSongList,
  finality: Finality,
  table: &PointTable,
) -> Result<ScoreCard> {
  let mut results = Vec::with_capacity(picks.len());
  let mut total = 0i64;

  for pick in picks {
    let weight = table.weight(pick.category)?;
    let (outcome, points_earned) = if pick.category.matches(&pick.song_slug, setlist) {
      (Some(PickOutcome::Played), weight)
    } else {
      match finality {
        Finality::Final => (Some(PickOutcome::NotPlayed), 0),
        Finality::Provisional => (pick.outcome.filter(|o| *o == PickOutcome::NotPlayed), 0),
      }
    };
    total += points_earned;
    results.push(PickResult { pick_id: pick.pick_id, outcome, points_earned });
  }

  Ok(ScoreCard { picks: results, total })
}
