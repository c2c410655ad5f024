//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("unprocessable: {0}")]
  Unprocessable(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  /// The store failed. Details stay in the server log.
  #[error("{0}")]
  Unavailable(String),

  #[error("{0}")]
  BadGateway(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  /// Log a store failure and hide its details from the client.
  pub fn store<E: std::fmt::Display>(subject: impl Into<String>, e: E) -> Self {
    let subject = subject.into();
    tracing::error!(%subject, error = %e, "store failure");
    Self::Unavailable(format!("store unavailable: {subject}"))
  }
}

impl From<encore_engine::Error> for ApiError {
  fn from(e: encore_engine::Error) -> Self {
    use encore_core::Error as Core;
    use encore_engine::Error;

    match e {
      Error::ShowNotFound(_)
      | Error::TourNotFound(_)
      | Error::SubmissionNotFound { .. }
      | Error::TourNotPublic(_) => Self::NotFound(e.to_string()),
      Error::ShowLocked(_) | Error::PicksClosed(_) | Error::ShowBusy(_) | Error::NoSetlist(_) => {
        Self::Conflict(e.to_string())
      }
      Error::UnknownSongs(_) => Self::Unprocessable(e.to_string()),
      Error::Core(Core::InvalidPickSet(_)) => Self::Unprocessable(e.to_string()),
      Error::Core(Core::InvalidTransition { .. } | Core::ConfirmationRequired(_)) => {
        Self::Conflict(e.to_string())
      }
      Error::Core(Core::ShowNotFound(_) | Core::TourNotFound(_) | Core::SubmissionNotFound(_)) => {
        Self::NotFound(e.to_string())
      }
      Error::Core(core) => {
        tracing::error!(error = %core, "scoring failed");
        Self::Internal(core.to_string())
      }
      Error::Store(source) => {
        tracing::error!(error = %source, "store failure");
        Self::Unavailable("store unavailable".into())
      }
      Error::Feed(source) => {
        tracing::warn!(error = %source, "setlist feed failure");
        Self::BadGateway("setlist feed unavailable".into())
      }
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Unprocessable(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m.clone()),
      ApiError::BadGateway(m) => (StatusCode::BAD_GATEWAY, m.clone()),
      ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.clone()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
