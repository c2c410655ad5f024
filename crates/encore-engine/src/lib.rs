//! The Encore scoring engine.
//!
//! Ties the pure pieces of `encore-core` to a [`ScoringStore`] and a
//! [`SetlistSource`]: periodic scoring passes, admin resets and test scores,
//! pick admission, tour transitions and achievement awards. Store calls can
//! be wrapped in [`RetryingStore`] for bounded retries of transient failures.
//!
//! [`ScoringStore`]: encore_core::store::ScoringStore
//! [`SetlistSource`]: encore_core::source::SetlistSource

pub mod achievements;
pub mod error;
pub mod manager;
pub mod report;
pub mod retry;
pub mod settings;
pub mod submissions;
pub mod tours;

pub use error::{Error, Result};
pub use manager::SubmissionStateManager;
pub use report::{FailedSubmission, PassReport, ShowScoreSummary, SkipReason, TestScoreReport};
pub use retry::{RetryPolicy, RetryingStore};
pub use settings::ScoringSettings;

#[cfg(test)]
mod tests;
