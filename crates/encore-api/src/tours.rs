//! Handlers for `/tours` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tours` | All tours, by start date |
//! | `GET`  | `/tours/:id/shows` | Shows of the tour, by date |
//! | `POST` | `/tours/:id/status` | Body: `{"status":"completed","confirm":false}` |
//! | `GET`  | `/tours/:id/standings` | 404 while the tour is `future` |
//! | `GET`  | `/tours/:id/podium` | Empty until the tour completes |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use encore_core::{
  show::Show,
  source::SetlistSource,
  store::ScoringStore,
  tour::{Standing, Tour, TourStatus},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AdminState, error::ApiError};

/// `GET /tours`
pub async fn list<S, F>(State(state): State<Arc<AdminState<S, F>>>) -> Result<Json<Vec<Tour>>, ApiError>
where
  S: ScoringStore + 'static,
  F: SetlistSource + 'static,
{
  let tours = state
    .manager
    .store()
    .list_tours()
    .await
    .map_err(|e| ApiError::store("tours", e))?;
  Ok(Json(tours))
}

/// `GET /tours/:id/shows`
pub async fn shows<S, F>(
  State(state): State<Arc<AdminState<S, F>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Show>>, ApiError>
where
  S: ScoringStore + 'static,
  F: SetlistSource + 'static,
{
  let store = state.manager.store();
  store
    .get_tour(id)
    .await
    .map_err(|e| ApiError::store(format!("tour {id}"), e))?
    .ok_or_else(|| ApiError::NotFound(format!("tour {id} not found")))?;
  let shows = store
    .list_shows(id)
    .await
    .map_err(|e| ApiError::store(format!("tour {id}"), e))?;
  Ok(Json(shows))
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status:  TourStatus,
  /// Required to reactivate a completed or closed tour; its podium is lost.
  #[serde(default)]
  pub confirm: bool,
}

/// `POST /tours/:id/status`
pub async fn set_status<S, F>(
  State(state): State<Arc<AdminState<S, F>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Tour>, ApiError>
where
  S: ScoringStore + 'static,
  F: SetlistSource + 'static,
{
  let tour = state.manager.set_tour_status(id, body.status, body.confirm).await?;
  Ok(Json(tour))
}

// ─── Standings ────────────────────────────────────────────────────────────────

/// `GET /tours/:id/standings`
pub async fn standings<S, F>(
  State(state): State<Arc<AdminState<S, F>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Standing>>, ApiError>
where
  S: ScoringStore + 'static,
  F: SetlistSource + 'static,
{
  Ok(Json(state.manager.standings(id).await?))
}

/// `GET /tours/:id/podium`
pub async fn podium<S, F>(
  State(state): State<Arc<AdminState<S, F>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Standing>>, ApiError>
where
  S: ScoringStore + 'static,
  F: SetlistSource + 'static,
{
  Ok(Json(state.manager.podium(id).await?))
}
