//! SQLite backend for the Lode table store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One [`SqliteStore`] (one connection)
//! is shared by both tables for the duration of a run; coalesce calls are
//! sequenced by the orchestrator, so there is a single logical writer.

mod sql;
mod store;
mod table;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
pub use table::Table;

#[cfg(test)]
mod tests;
