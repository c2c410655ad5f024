//! Achievement catalog and the rules that unlock each badge.
//!
//! Rules only look at one freshly scored submission. Whether the user already
//! holds the badge is the caller's concern; awards are never revoked here.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use uuid::Uuid;

use crate::{
  song::{Song, normalize_slug},
  submission::{Pick, PickCategory, PickOutcome},
};

/// Gap (in shows) at or above which a played song counts as a bust-out.
pub const BUSTOUT_GAP: u32 = 100;

/// Played picks in one submission needed for `five-alive`.
pub const FIVE_ALIVE_HITS: usize = 5;

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
  pub slug:     String,
  pub name:     String,
  pub icon:     String,
  pub category: String,
}

/// A user's earned badge. Unique per `(user_id, achievement_slug)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAchievement {
  pub user_id:          Uuid,
  pub achievement_slug: String,
  pub earned_at:        DateTime<Utc>,
  /// Earliest show whose scoring qualified the user. Resetting it falls
  /// back to another qualifying show, or removes the award if none is left.
  pub source_show_id:   Option<Uuid>,
  pub metadata:         serde_json::Value,
}

// ─── Rules ───────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AchievementRule {
  OpenerCall,
  EncoreCall,
  Bookends,
  BustoutCall,
  FiveAlive,
}

/// What a rule gets to look at.
pub struct RuleContext<'a> {
  pub show_id:       Uuid,
  pub submission_id: Uuid,
  /// Picks carrying the outcomes just computed.
  pub picks:         &'a [Pick],
  /// Catalog entries for the picked songs, keyed by normalized slug.
  pub songs:         &'a HashMap<String, Song>,
}

impl RuleContext<'_> {
  fn played(&self) -> impl Iterator<Item = &Pick> {
    self
      .picks
      .iter()
      .filter(|p| p.outcome == Some(PickOutcome::Played))
  }

  fn played_in(&self, category: PickCategory) -> Option<&Pick> {
    self.played().find(|p| p.category == category)
  }

  fn base_metadata(&self) -> serde_json::Value {
    json!({ "show_id": self.show_id, "submission_id": self.submission_id })
  }
}

impl AchievementRule {
  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }

  pub fn catalog_entry(self) -> Achievement {
    let (name, icon, category) = match self {
      Self::OpenerCall => ("Called the Opener", "🎬", "picks"),
      Self::EncoreCall => ("Called the Encore", "🎤", "picks"),
      Self::Bookends => ("Bookends", "📚", "picks"),
      Self::BustoutCall => ("Bust-out Prophet", "🔮", "rarity"),
      Self::FiveAlive => ("Five Alive", "🖐", "volume"),
    };
    Achievement {
      slug:     self.to_string(),
      name:     name.into(),
      icon:     icon.into(),
      category: category.into(),
    }
  }

  /// Metadata for the award if the submission satisfies this rule.
  pub fn evaluate(self, ctx: &RuleContext<'_>) -> Option<serde_json::Value> {
    let mut meta = ctx.base_metadata();
    match self {
      Self::OpenerCall => {
        let pick = ctx.played_in(PickCategory::Opener)?;
        meta["song_slug"] = json!(pick.song_slug);
      }
      Self::EncoreCall => {
        let pick = ctx.played_in(PickCategory::Encore)?;
        meta["song_slug"] = json!(pick.song_slug);
      }
      Self::Bookends => {
        let opener = ctx.played_in(PickCategory::Opener)?;
        let encore = ctx.played_in(PickCategory::Encore)?;
        meta["song_slugs"] = json!([opener.song_slug, encore.song_slug]);
      }
      Self::BustoutCall => {
        let (pick, song) = ctx.played().find_map(|p| {
          ctx
            .songs
            .get(&normalize_slug(&p.song_slug))
            .filter(|s| s.gap >= BUSTOUT_GAP)
            .map(|s| (p, s))
        })?;
        meta["song_slug"] = json!(pick.song_slug);
        meta["gap"] = json!(song.gap);
      }
      Self::FiveAlive => {
        let hits = ctx.played().count();
        if hits < FIVE_ALIVE_HITS {
          return None;
        }
        meta["hits"] = json!(hits);
      }
    }
    Some(meta)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pick(slug: &str, category: PickCategory, outcome: Option<PickOutcome>) -> Pick {
    Pick {
      pick_id: Uuid::new_v4(),
      submission_id: Uuid::nil(),
      song_slug: slug.into(),
      category,
      outcome,
      points_earned: 0,
    }
  }

  fn song(slug: &str, gap: u32) -> Song {
    Song {
      song_id: Uuid::new_v4(),
      name: slug.into(),
      slug: slug.into(),
      artist: "phish".into(),
      times_played: 3,
      gap,
      last_played: None,
    }
  }

  fn satisfied(picks: &[Pick], songs: &HashMap<String, Song>) -> Vec<AchievementRule> {
    let ctx = RuleContext {
      show_id: Uuid::nil(),
      submission_id: Uuid::nil(),
      picks,
      songs,
    };
    AchievementRule::all().filter(|r| r.evaluate(&ctx).is_some()).collect()
  }

  #[test]
  fn opener_hit_unlocks_opener_call_only() {
    let picks = vec![
      pick("llama", PickCategory::Opener, Some(PickOutcome::Played)),
      pick("golgi", PickCategory::Encore, Some(PickOutcome::NotPlayed)),
    ];
    assert_eq!(satisfied(&picks, &HashMap::new()), vec![AchievementRule::OpenerCall]);
  }

  #[test]
  fn opener_and_encore_unlock_bookends() {
    let picks = vec![
      pick("llama", PickCategory::Opener, Some(PickOutcome::Played)),
      pick("golgi", PickCategory::Encore, Some(PickOutcome::Played)),
    ];
    let got = satisfied(&picks, &HashMap::new());
    assert!(got.contains(&AchievementRule::Bookends));
    assert!(got.contains(&AchievementRule::EncoreCall));
  }

  #[test]
  fn bustout_needs_a_long_gap() {
    let picks = vec![pick("dog-log", PickCategory::General, Some(PickOutcome::Played))];
    let mut songs = HashMap::new();
    songs.insert("dog-log".to_string(), song("dog-log", 99));
    assert!(satisfied(&picks, &songs).is_empty());

    songs.insert("dog-log".to_string(), song("dog-log", 1200));
    assert_eq!(satisfied(&picks, &songs), vec![AchievementRule::BustoutCall]);
  }

  #[test]
  fn five_alive_counts_hits() {
    let mut picks: Vec<Pick> = (0..4)
      .map(|i| pick(&format!("g{i}"), PickCategory::General, Some(PickOutcome::Played)))
      .collect();
    picks.push(pick("g4", PickCategory::General, None));
    assert!(!satisfied(&picks, &HashMap::new()).contains(&AchievementRule::FiveAlive));

    picks[4].outcome = Some(PickOutcome::Played);
    assert!(satisfied(&picks, &HashMap::new()).contains(&AchievementRule::FiveAlive));
  }

  #[test]
  fn catalog_slugs_are_kebab_case() {
    assert_eq!(AchievementRule::OpenerCall.catalog_entry().slug, "opener-call");
    assert_eq!("bustout-call".parse::<AchievementRule>().unwrap(), AchievementRule::BustoutCall);
  }
}
