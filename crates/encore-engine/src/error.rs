//! Error type for `encore-engine`.

use thiserror::Error;
use uuid::Uuid;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] encore_core::Error),

  /// The store failed, after retries where the failure was transient.
  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("setlist feed error: {0}")]
  Feed(#[source] BoxError),

  #[error("show not found: {0}")]
  ShowNotFound(Uuid),

  #[error("tour not found: {0}")]
  TourNotFound(Uuid),

  #[error("user {user_id} has no submission for show {show_id}")]
  SubmissionNotFound { user_id: Uuid, show_id: Uuid },

  #[error("show {0} is locked")]
  ShowLocked(Uuid),

  #[error("tour {0} is not accepting picks")]
  PicksClosed(Uuid),

  #[error("tour {0} is not public")]
  TourNotPublic(Uuid),

  #[error("songs not in the catalog: {}", .0.join(", "))]
  UnknownSongs(Vec<String>),

  #[error("no setlist available for show {0}")]
  NoSetlist(Uuid),

  #[error("show {0} is being scored")]
  ShowBusy(Uuid),
}

impl Error {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn feed<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Feed(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
