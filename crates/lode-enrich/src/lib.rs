//! Enrichment orchestration for the Lode pipeline.
//!
//! Partitions target URLs by platform, dispatches each partition to the
//! matching collector, and drives the collect → write intermediate file →
//! coalesce sequence against the table store. Concrete collectors are thin
//! adapters over `reqwest`/`scraper`; all of them write through the same
//! coalesce path, so whichever source runs first for a field wins and later
//! sources only fill gaps.

pub mod collectors;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod sink;

pub use config::{ApiKeys, CredentialPolicy};
pub use error::{Error, Result};
pub use orchestrator::Enrichment;
