//! The song catalog. Maintained by an external statistics sync; the scoring
//! engine only reads it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
  pub song_id:      Uuid,
  pub name:         String,
  /// Stable external identifier; all matching happens on this field.
  pub slug:         String,
  pub artist:       String,
  pub times_played: u32,
  /// Shows since the song was last played.
  pub gap:          u32,
  pub last_played:  Option<NaiveDate>,
}

/// Canonical form used whenever slugs are compared.
pub fn normalize_slug(slug: &str) -> String { slug.trim().to_ascii_lowercase() }
