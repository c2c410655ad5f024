//! Scoring knobs supplied by configuration.

use encore_core::scoring::PointTable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
  /// Points per pick category. Empty unless configured.
  pub points:                   PointTable,
  /// Shortest setlist accepted as final without a manual completion signal.
  pub min_final_setlist_len:    u32,
  /// Hours after lock at which a show is taken to have ended.
  pub completion_timeout_hours: i64,
}

impl Default for ScoringSettings {
  fn default() -> Self {
    Self {
      points:                   PointTable::default(),
      min_final_setlist_len:    10,
      completion_timeout_hours: 6,
    }
  }
}
