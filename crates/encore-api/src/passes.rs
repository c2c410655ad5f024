//! `POST /passes`: run one periodic scoring pass now.

use std::sync::Arc;

use axum::{Json, extract::State};
use encore_core::{source::SetlistSource, store::ScoringStore};
use encore_engine::PassReport;

use crate::{AdminState, error::ApiError};

/// `POST /passes`
pub async fn run<S, F>(State(state): State<Arc<AdminState<S, F>>>) -> Result<Json<PassReport>, ApiError>
where
  S: ScoringStore + 'static,
  F: SetlistSource + 'static,
{
  let report = state.manager.run_pass().await?;
  Ok(Json(report))
}
