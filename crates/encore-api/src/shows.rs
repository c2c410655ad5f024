//! Handlers for `/shows` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/shows/:id` | Show with its cached setlist |
//! | `POST` | `/shows/:id/picks` | Body: [`PicksBody`]; 201 + stored submission |
//! | `POST` | `/shows/:id/score` | Body: `{"mark_complete":false}` |
//! | `POST` | `/shows/:id/reset` | Clears all derived scoring state |
//! | `POST` | `/shows/:id/test-score` | Body: `{"user_id":"..."}`; 403 unless test tools are enabled |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use encore_core::{
  show::Show,
  source::SetlistSource,
  store::{ResetSummary, ScoringStore},
  submission::NewPick,
};
use encore_engine::{ShowScoreSummary, TestScoreReport};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AdminState, error::ApiError};

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /shows/:id`
pub async fn get_one<S, F>(
  State(state): State<Arc<AdminState<S, F>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Show>, ApiError>
where
  S: ScoringStore + 'static,
  F: SetlistSource + 'static,
{
  let show = state
    .manager
    .store()
    .get_show(id)
    .await
    .map_err(|e| ApiError::store(format!("show {id}"), e))?
    .ok_or_else(|| ApiError::NotFound(format!("show {id} not found")))?;
  Ok(Json(show))
}

// ─── Picks ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PicksBody {
  pub user_id: Uuid,
  pub picks:   Vec<NewPick>,
}

/// `POST /shows/:id/picks`
pub async fn submit_picks<S, F>(
  State(state): State<Arc<AdminState<S, F>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<PicksBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ScoringStore + 'static,
  F: SetlistSource + 'static,
{
  let submission = state.manager.submit_picks(body.user_id, id, body.picks).await?;
  Ok((StatusCode::CREATED, Json(submission)))
}

// ─── Score ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScoreBody {
  /// Manual completion signal: finalises the show even while it is short
  /// or before its lock.
  #[serde(default)]
  pub mark_complete: bool,
}

/// `POST /shows/:id/score`
pub async fn score<S, F>(
  State(state): State<Arc<AdminState<S, F>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ScoreBody>,
) -> Result<Json<ShowScoreSummary>, ApiError>
where
  S: ScoringStore + 'static,
  F: SetlistSource + 'static,
{
  let summary = state.manager.score_show(id, body.mark_complete).await?;
  Ok(Json(summary))
}

// ─── Reset ────────────────────────────────────────────────────────────────────

/// `POST /shows/:id/reset`
pub async fn reset<S, F>(
  State(state): State<Arc<AdminState<S, F>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ResetSummary>, ApiError>
where
  S: ScoringStore + 'static,
  F: SetlistSource + 'static,
{
  let summary = state.manager.reset_show(id).await?;
  Ok(Json(summary))
}

// ─── Test score ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TestScoreBody {
  pub user_id: Uuid,
}

/// `POST /shows/:id/test-score`
pub async fn test_score<S, F>(
  State(state): State<Arc<AdminState<S, F>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<TestScoreBody>,
) -> Result<Json<TestScoreReport>, ApiError>
where
  S: ScoringStore + 'static,
  F: SetlistSource + 'static,
{
  if !state.test_tools_enabled {
    return Err(ApiError::Forbidden("test tools are disabled".into()));
  }
  let report = state.manager.force_test_score(id, body.user_id).await?;
  Ok(Json(report))
}
