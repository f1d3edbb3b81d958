//! The enrichment run: partition, collect, coalesce, export.
//!
//! The orchestrator owns sequencing, not collector internals. Collectors run
//! one after another; each phase writes its records to the shared
//! intermediate file and coalesces it into the table store before the next
//! phase starts, so the store only ever sees one writer.

use std::path::{Path, PathBuf};

use lode_core::{
  Error as CoreError,
  collector::{Collector, CollectorOutput},
  platform::{self, Platform},
  record::{FlatRecord, Target},
};
use lode_store_sqlite::Table;
use tracing::{info, warn};

use crate::{
  Result,
  collectors::{
    BuzzsumoCollector, FacebookCollector, OtherSocialCollector, PageCollector,
    YoutubeCollector,
  },
  config::{ApiKeys, CredentialPolicy},
  sink,
};

// ─── Partitioning ────────────────────────────────────────────────────────────

/// Target URLs split by platform, in collection priority order.
#[derive(Debug, Default)]
pub struct Partitions {
  pub youtube:      Vec<Target>,
  pub facebook:     Vec<Target>,
  pub other_social: Vec<Target>,
  pub web:          Vec<Target>,
}

/// Classify every target into exactly one partition.
pub fn partition(targets: &[Target]) -> Partitions {
  let mut partitions = Partitions::default();
  for target in targets {
    let target = target.clone();
    match platform::classify(&target.url) {
      Platform::Youtube => partitions.youtube.push(target),
      Platform::Facebook => partitions.facebook.push(target),
      Platform::OtherSocial => partitions.other_social.push(target),
      Platform::Web => partitions.web.push(target),
    }
  }
  partitions
}

// ─── Orchestrator ────────────────────────────────────────────────────────────

pub struct Enrichment {
  links:          Table,
  shared_content: Table,
  keys:           ApiKeys,
  policy:         CredentialPolicy,
  links_outfile:  PathBuf,
  shared_outfile: PathBuf,
}

impl Enrichment {
  /// `output_dir` receives the intermediate collector files and, after
  /// [`Enrichment::run`], the final `links.csv` and `shared_content.csv`.
  pub fn new(
    links: Table,
    shared_content: Table,
    keys: ApiKeys,
    policy: CredentialPolicy,
    output_dir: &Path,
  ) -> Result<Self> {
    std::fs::create_dir_all(output_dir)?;
    Ok(Self {
      links,
      shared_content,
      keys,
      policy,
      links_outfile: output_dir.join("links.csv"),
      shared_outfile: output_dir.join("shared_content.csv"),
    })
  }

  /// Drive the full enrichment sequence and export both tables.
  ///
  /// Phase order is fixed: domain derivation, then YouTube, Facebook,
  /// other-social, generic scraping, and Buzzsumo last — unconditionally
  /// over all URLs, where the coalesce rule makes it a pure gap-filler.
  /// `buzzsumo_only` skips every phase between domains and Buzzsumo.
  pub async fn run(&self, buzzsumo_only: bool) -> Result<(PathBuf, PathBuf)> {
    let targets = self.links.targets().await?;
    info!(targets = targets.len(), "starting enrichment run");

    self.apply_domains(&targets).await?;

    if !buzzsumo_only {
      let partitions = partition(&targets);
      info!(
        youtube = partitions.youtube.len(),
        facebook = partitions.facebook.len(),
        other_social = partitions.other_social.len(),
        web = partitions.web.len(),
        "partitioned targets"
      );

      if !partitions.youtube.is_empty() {
        if let Some(collector) = self.youtube_collector()? {
          self.run_phase(&collector, &partitions.youtube).await?;
        }
      }
      if !partitions.facebook.is_empty() {
        if let Some(collector) = self.facebook_collector()? {
          self.run_phase(&collector, &partitions.facebook).await?;
        }
      }
      if !partitions.other_social.is_empty() {
        self
          .run_phase(&OtherSocialCollector, &partitions.other_social)
          .await?;
      }
      if !partitions.web.is_empty() {
        self
          .run_phase(&PageCollector::new()?, &partitions.web)
          .await?;
      }
    }

    // The catch-all analytics source covers every target, enriched or not.
    if !targets.is_empty() {
      if let Some(collector) = self.buzzsumo_collector()? {
        self.run_phase(&collector, &targets).await?;
      }
    }

    self.links.export(&self.links_outfile).await?;
    self.shared_content.export(&self.shared_outfile).await?;
    info!("enrichment run complete");

    Ok((self.links_outfile.clone(), self.shared_outfile.clone()))
  }

  /// Derive each target's domain and merge it through the normal coalesce
  /// path, so a domain present in the seed dataset is preserved.
  async fn apply_domains(&self, targets: &[Target]) -> Result<()> {
    let records: Vec<FlatRecord> = targets
      .iter()
      .filter_map(|target| {
        platform::domain_name(&target.url).map(|domain| {
          let mut record = FlatRecord::for_target(target);
          record.set("domain", Some(domain));
          record
        })
      })
      .collect();
    self.apply(CollectorOutput {
      links:          records,
      shared_content: Vec::new(),
    })
    .await
  }

  /// Run one collector over its partition and coalesce the output.
  async fn run_phase<C: Collector>(&self, collector: &C, targets: &[Target]) -> Result<()> {
    info!(source = collector.name(), targets = targets.len(), "collecting");
    let output = collector.collect(targets).await;
    info!(
      source = collector.name(),
      links = output.links.len(),
      shared_content = output.shared_content.len(),
      "collected"
    );
    self.apply(output).await
  }

  /// Write records to the intermediate files and coalesce them into the
  /// store. The write happens even for empty output; a headers-only file
  /// coalesces to a no-op.
  async fn apply(&self, output: CollectorOutput) -> Result<()> {
    let columns: Vec<String> = self
      .links
      .schema()
      .column_names()
      .map(str::to_string)
      .collect();
    sink::write_records(&self.links_outfile, &columns, &output.links)?;
    self.links.coalesce(&self.links_outfile).await?;

    if !output.shared_content.is_empty() {
      let columns: Vec<String> = self
        .shared_content
        .schema()
        .column_names()
        .map(str::to_string)
        .collect();
      sink::write_records(&self.shared_outfile, &columns, &output.shared_content)?;
      self.shared_content.coalesce(&self.shared_outfile).await?;
    }
    Ok(())
  }

  // ── Credential-gated collector construction ───────────────────────────────

  fn youtube_collector(&self) -> Result<Option<YoutubeCollector>> {
    match &self.keys.youtube {
      Some(keys) if !keys.keys.is_empty() => {
        Ok(Some(YoutubeCollector::new(keys.keys.clone())?))
      }
      _ => self.missing("youtube"),
    }
  }

  fn facebook_collector(&self) -> Result<Option<FacebookCollector>> {
    match &self.keys.crowdtangle {
      Some(keys) => Ok(Some(FacebookCollector::new(&keys.token, keys.rate_limit)?)),
      None => self.missing("crowdtangle"),
    }
  }

  fn buzzsumo_collector(&self) -> Result<Option<BuzzsumoCollector>> {
    match &self.keys.buzzsumo {
      Some(keys) => Ok(Some(BuzzsumoCollector::new(&keys.token)?)),
      None => self.missing("buzzsumo"),
    }
  }

  /// Apply the configured missing-credential policy for a source that has
  /// targets waiting.
  fn missing<T>(&self, source: &'static str) -> Result<Option<T>> {
    match self.policy {
      CredentialPolicy::Strict => Err(CoreError::MissingCredential(source).into()),
      CredentialPolicy::Lenient => {
        warn!(source, "credentials missing; skipping source");
        Ok(None)
      }
    }
  }
}
