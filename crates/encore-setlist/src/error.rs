//! Error type for `encore-setlist`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("setlist feed returned status {0}")]
  Status(reqwest::StatusCode),

  #[error("setlist feed reported an error: {0}")]
  Api(String),

  #[error("malformed setlist payload: {0}")]
  Schema(String),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
