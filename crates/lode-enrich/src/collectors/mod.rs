//! Concrete collectors: thin adapters over external sources.
//!
//! Each collector implements [`lode_core::collector::Collector`] and hands
//! partial records back to the orchestrator; none of them touch the table
//! store. Per-target failures degrade to absent records and a warning in the
//! logs, never to a batch error.

mod buzzsumo;
mod facebook;
mod other_social;
mod page;
mod youtube;

pub use buzzsumo::BuzzsumoCollector;
pub use facebook::FacebookCollector;
pub use other_social::OtherSocialCollector;
pub use page::PageCollector;
pub use youtube::YoutubeCollector;

use std::future::Future;

use futures::StreamExt as _;
use lode_core::record::{FlatRecord, Target};
use tracing::warn;

/// Outcome of fetching one target: a record, nothing, or a failure that the
/// runner downgrades to "no data".
pub(crate) type FetchResult =
  Result<Option<FlatRecord>, Box<dyn std::error::Error + Send + Sync>>;

/// Fan `fetch` out over `targets` with at most `concurrency` in flight.
///
/// Emission order is unspecified; the coalesce step does not depend on it.
/// An errored target never cancels its siblings, and whatever siblings
/// produced is still returned.
pub(crate) async fn collect_bounded<F, Fut>(
  source: &'static str,
  targets: &[Target],
  concurrency: usize,
  fetch: F,
) -> Vec<FlatRecord>
where
  F: Fn(Target) -> Fut,
  Fut: Future<Output = FetchResult> + Send,
{
  futures::stream::iter(targets.iter().cloned().map(|target| {
    let fut = fetch(target.clone());
    async move { (target, fut.await) }
  }))
  .buffer_unordered(concurrency.max(1))
  .filter_map(|(target, outcome)| async move {
    match outcome {
      Ok(record) => record,
      Err(error) => {
        warn!(source, url = %target.url, %error, "collection failed for target");
        None
      }
    }
  })
  .collect()
  .await
}
