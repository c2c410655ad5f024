//! Core types and trait definitions for the Encore scoring engine.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! pure parts of the engine (lock times, scoring, tour transitions,
//! achievement rules) live here next to the traits the rest of the
//! workspace implements.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod achievement;
pub mod date;
pub mod error;
pub mod lock;
pub mod scoring;
pub mod setlist;
pub mod show;
pub mod song;
pub mod source;
pub mod store;
pub mod submission;
pub mod tour;

pub use error::{Error, Result, TransientError};
