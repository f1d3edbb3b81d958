//! Default classification for social platforms with no dedicated collector.

use lode_core::{
  collector::{Collector, CollectorOutput},
  record::{FlatRecord, Target},
};

/// Assigns `work_type = "SocialMediaPosting"` to URLs on known social
/// platforms (TikTok, Instagram, Twitter, …) and attempts nothing further.
/// Purely local; never fails.
#[derive(Debug, Default)]
pub struct OtherSocialCollector;

impl Collector for OtherSocialCollector {
  fn name(&self) -> &'static str {
    "other_social"
  }

  async fn collect(&self, targets: &[Target]) -> CollectorOutput {
    let links = targets
      .iter()
      .map(|target| {
        let mut record = FlatRecord::for_target(target);
        record.set("work_type", Some("SocialMediaPosting".to_string()));
        record
      })
      .collect();

    CollectorOutput {
      links,
      shared_content: Vec::new(),
    }
  }
}
