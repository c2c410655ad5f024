//! Error types for `encore-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{submission::PickCategory, tour::TourStatus};

#[derive(Debug, Error)]
pub enum Error {
  #[error("show not found: {0}")]
  ShowNotFound(Uuid),

  #[error("tour not found: {0}")]
  TourNotFound(Uuid),

  #[error("submission not found: {0}")]
  SubmissionNotFound(Uuid),

  #[error("no point weight configured for pick category {0}")]
  MissingPointWeight(PickCategory),

  #[error("cannot resolve a timezone (timezone={timezone:?}, region={region:?})")]
  UnresolvedTimezone {
    timezone: Option<String>,
    region:   Option<String>,
  },

  #[error("local show start {0} does not exist in the venue timezone")]
  NonexistentLocalTime(chrono::NaiveDateTime),

  #[error("tour cannot move from {from} to {to}")]
  InvalidTransition { from: TourStatus, to: TourStatus },

  #[error("reactivating a {0} tour discards its podium; confirmation required")]
  ConfirmationRequired(TourStatus),

  #[error("invalid pick set: {0}")]
  InvalidPickSet(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Classifies a backend error as worth retrying.
///
/// Only connectivity-style failures (timeouts, a busy or locked database, a
/// dropped connection) are transient. Everything else surfaces immediately.
pub trait TransientError {
  fn is_transient(&self) -> bool;
}

impl TransientError for std::convert::Infallible {
  fn is_transient(&self) -> bool { match *self {} }
}
