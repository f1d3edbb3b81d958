//! Core types and trait definitions for the Lode enrichment pipeline.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing heavier than `url`.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod collector;
pub mod error;
pub mod platform;
pub mod reconcile;
pub mod record;
pub mod schema;

pub use error::{Error, Result};
