//! JSON admin API for Encore.
//!
//! Exposes an axum [`Router`] over a [`SubmissionStateManager`]: scoring
//! passes, per-show admin controls, pick submission and tour lifecycle.
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", encore_api::api_router(manager, false))
//! ```

pub mod error;
pub mod passes;
pub mod shows;
pub mod tours;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use encore_core::{source::SetlistSource, store::ScoringStore};
use encore_engine::SubmissionStateManager;

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct AdminState<S, F> {
  pub manager:            SubmissionStateManager<S, F>,
  /// Gates test-only tooling such as forced test scores.
  pub test_tools_enabled: bool,
}

/// Build a fully-materialised API router over `manager`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, F>(manager: SubmissionStateManager<S, F>, test_tools_enabled: bool) -> Router<()>
where
  S: ScoringStore + 'static,
  F: SetlistSource + 'static,
{
  let state = Arc::new(AdminState { manager, test_tools_enabled });
  Router::new()
    // Passes
    .route("/passes", post(passes::run::<S, F>))
    // Shows
    .route("/shows/{id}", get(shows::get_one::<S, F>))
    .route("/shows/{id}/picks", post(shows::submit_picks::<S, F>))
    .route("/shows/{id}/score", post(shows::score::<S, F>))
    .route("/shows/{id}/reset", post(shows::reset::<S, F>))
    .route("/shows/{id}/test-score", post(shows::test_score::<S, F>))
    // Tours
    .route("/tours", get(tours::list::<S, F>))
    .route("/tours/{id}/shows", get(tours::shows::<S, F>))
    .route("/tours/{id}/status", post(tours::set_status::<S, F>))
    .route("/tours/{id}/standings", get(tours::standings::<S, F>))
    .route("/tours/{id}/podium", get(tours::podium::<S, F>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
