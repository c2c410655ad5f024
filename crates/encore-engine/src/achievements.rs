//! Awarding badges from freshly scored submissions.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use encore_core::{
  achievement::{AchievementRule, RuleContext, UserAchievement},
  store::ScoringStore,
  submission::{Pick, PickOutcome},
};
use uuid::Uuid;

use crate::{Error, Result};

/// Runs every rule over one submission and inserts the awards it earns.
///
/// Safe to run any number of times: the store ignores awards the user
/// already holds, and nothing here ever revokes one.
pub struct AchievementEvaluator<S> {
  store: Arc<S>,
}

impl<S> Clone for AchievementEvaluator<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: ScoringStore> AchievementEvaluator<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Returns the number of awards newly inserted.
  pub async fn evaluate(
    &self,
    user_id: Uuid,
    show_id: Uuid,
    submission_id: Uuid,
    picks: &[Pick],
    now: DateTime<Utc>,
  ) -> Result<u32> {
    let played: Vec<String> = picks
      .iter()
      .filter(|p| p.outcome == Some(PickOutcome::Played))
      .map(|p| p.song_slug.clone())
      .collect();
    if played.is_empty() {
      return Ok(0);
    }

    let songs = self
      .store
      .songs_by_slugs(played)
      .await
      .map_err(Error::store)?
      .into_iter()
      .map(|s| (s.slug.clone(), s))
      .collect::<HashMap<_, _>>();

    let ctx = RuleContext { show_id, submission_id, picks, songs: &songs };

    let mut awarded = 0;
    for rule in AchievementRule::all() {
      let Some(metadata) = rule.evaluate(&ctx) else { continue };
      let award = UserAchievement {
        user_id,
        achievement_slug: rule.to_string(),
        earned_at: now,
        source_show_id: Some(show_id),
        metadata,
      };
      if self.store.award_achievement(award).await.map_err(Error::store)? {
        tracing::info!(%user_id, %show_id, achievement = %rule, "achievement unlocked");
        awarded += 1;
      }
    }
    Ok(awarded)
  }
}
