//! Error type for `encore-store-sqlite`.

use encore_core::TransientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] encore_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("column parse error: {0}")]
  Parse(String),

  #[error("tour not found: {0}")]
  TourNotFound(uuid::Uuid),

  #[error("show not found: {0}")]
  ShowNotFound(uuid::Uuid),

  #[error("submission not found: {0}")]
  SubmissionNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl TransientError for Error {
  /// A busy or locked database and a closed connection are worth retrying.
  fn is_transient(&self) -> bool {
    match self {
      Error::Database(tokio_rusqlite::Error::ConnectionClosed) => true,
      Error::Database(tokio_rusqlite::Error::Rusqlite(e)) => is_busy(e),
      _ => false,
    }
  }
}

fn is_busy(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if matches!(f.code, rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sqlite_failure(code: std::os::raw::c_int) -> Error {
    Error::Database(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      rusqlite::ffi::Error::new(code),
      None,
    )))
  }

  #[test]
  fn busy_and_locked_are_transient() {
    assert!(sqlite_failure(rusqlite::ffi::SQLITE_BUSY).is_transient());
    assert!(sqlite_failure(rusqlite::ffi::SQLITE_LOCKED).is_transient());
    assert!(Error::Database(tokio_rusqlite::Error::ConnectionClosed).is_transient());
  }

  #[test]
  fn everything_else_is_not() {
    assert!(!sqlite_failure(rusqlite::ffi::SQLITE_CONSTRAINT).is_transient());
    assert!(!Error::ShowNotFound(uuid::Uuid::nil()).is_transient());
    assert!(!Error::Parse("bad".into()).is_transient());
  }
}
