//! Tours and their lifecycle.
//!
//! A tour moves `Future → Active → Completed → Closed`. Nothing ever returns
//! to `Future`. Moving a finished tour back to `Active` is allowed only with
//! explicit confirmation because it throws away the computed podium.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TourStatus {
  Future,
  Active,
  Completed,
  Closed,
}

/// What the caller must do to carry out a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEffect {
  /// Requested status equals the current one.
  Unchanged,
  /// Plain status update.
  Advance,
  /// Status update plus computing and storing the final podium.
  ComputePodium,
  /// Status update plus deleting the stored podium.
  DiscardPodium,
}

impl TourStatus {
  /// Picks are accepted for the tour's shows (subject to each show's lock).
  pub fn accepts_picks(self) -> bool { matches!(self, Self::Active) }

  /// The tour shows up on public leaderboards.
  pub fn is_public(self) -> bool { !matches!(self, Self::Future) }

  /// Final standings are computed and displayed.
  pub fn shows_podium(self) -> bool {
    matches!(self, Self::Completed | Self::Closed)
  }

  /// Decide whether `self → next` is legal and what it entails.
  ///
  /// `confirmed` must be set to reactivate a `Completed` or `Closed` tour.
  pub fn transition(self, next: Self, confirmed: bool) -> Result<TransitionEffect> {
    use TourStatus::*;
    match (self, next) {
      (a, b) if a == b => Ok(TransitionEffect::Unchanged),
      (_, Future) => Err(Error::InvalidTransition { from: self, to: next }),
      (Future, Active) => Ok(TransitionEffect::Advance),
      (Active, Completed) => Ok(TransitionEffect::ComputePodium),
      (Active, Closed) => {
        tracing::warn!("closing a tour that never completed; no podium is kept");
        Ok(TransitionEffect::Advance)
      }
      (Completed, Closed) => Ok(TransitionEffect::Advance),
      (Completed | Closed, Active) => {
        if confirmed {
          Ok(TransitionEffect::DiscardPodium)
        } else {
          Err(Error::ConfirmationRequired(self))
        }
      }
      _ => Err(Error::InvalidTransition { from: self, to: next }),
    }
  }
}

// ─── Tour ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tour {
  pub tour_id:    Uuid,
  pub name:       String,
  pub start_date: NaiveDate,
  pub end_date:   NaiveDate,
  pub status:     TourStatus,
}

// ─── Standings ───────────────────────────────────────────────────────────────

/// One user's accumulated points across a tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
  pub rank:        u32,
  pub user_id:     Uuid,
  pub points:      i64,
  pub submissions: u32,
}

/// Assign competition ranks (1, 1, 3, ...) to `(user_id, points, submissions)`
/// rows. Rows are ordered by points descending, then user id.
pub fn rank_standings(mut rows: Vec<(Uuid, i64, u32)>) -> Vec<Standing> {
  rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

  let mut out: Vec<Standing> = Vec::with_capacity(rows.len());
  for (idx, (user_id, points, submissions)) in rows.into_iter().enumerate() {
    let rank = match out.last() {
      Some(prev) if prev.points == points => prev.rank,
      _ => idx as u32 + 1,
    };
    out.push(Standing { rank, user_id, points, submissions });
  }
  out
}

/// The podium: every standing ranked third or better.
pub fn podium(standings: &[Standing]) -> Vec<Standing> {
  standings.iter().filter(|s| s.rank <= 3).cloned().collect()
}
