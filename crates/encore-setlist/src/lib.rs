//! HTTP setlist feed for the Encore scoring engine.
//!
//! [`SetlistClient`] implements [`encore_core::source::SetlistSource`] over a
//! JSON API that serves one show's songs per date. Payload decoding lives in
//! [`payload`] and never touches the network.

mod client;
pub mod error;
pub mod payload;

pub use client::{SetlistClient, SetlistSettings};
pub use error::{Error, Result};
