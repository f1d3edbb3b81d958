//! The collector contract.
//!
//! A collector is an adapter over one external data source (a web scraper,
//! an analytics API, a platform API) that produces partial enrichment
//! records for a batch of target URLs. Collectors never talk to the table
//! store directly and never see each other's output; the orchestrator
//! funnels everything through the same coalesce path.

use std::future::Future;

use crate::record::{FlatRecord, Target};

/// Records produced by one collector pass, split by destination table.
#[derive(Debug, Default)]
pub struct CollectorOutput {
  pub links:          Vec<FlatRecord>,
  pub shared_content: Vec<FlatRecord>,
}

impl CollectorOutput {
  pub fn is_empty(&self) -> bool {
    self.links.is_empty() && self.shared_content.is_empty()
  }
}

/// Abstraction over one enrichment source.
///
/// Contract:
/// - every emitted record carries at minimum the target's URL (and link
///   identifier, when one was given);
/// - targets the source has no data for may be omitted entirely, or emitted
///   key-only — both coalesce to a no-op;
/// - a failure on an individual target (network error, API rejection, parse
///   failure) is logged and treated as "no data", never surfaced as an error
///   for the batch;
/// - implementations may fan out over targets with bounded parallelism;
///   emission order is unspecified and must not matter downstream.
pub trait Collector: Send + Sync {
  /// Source name used in logs and credential errors.
  fn name(&self) -> &'static str;

  /// Collect records for `targets`. Infallible by contract: per-target
  /// failures degrade to absent records.
  fn collect(
    &self,
    targets: &[Target],
  ) -> impl Future<Output = CollectorOutput> + Send;
}
