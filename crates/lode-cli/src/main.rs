//! lode binary.
//!
//! Loads a CSV of target URLs into the SQLite store, runs every applicable
//! collector, and exports the enriched `links` and `shared_content` tables
//! back to CSV. Credentials come from `config.toml` (or the path given with
//! `--config`), overridable through `LODE`-prefixed environment variables.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use lode_core::schema::TableSchema;
use lode_enrich::{ApiKeys, CredentialPolicy, Enrichment};
use lode_store_sqlite::SqliteStore;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
  author,
  version,
  about = "URL metadata enrichment over a two-table SQLite store"
)]
struct Cli {
  /// CSV of target URLs. Must carry a header row naming the URL column.
  #[arg(short, long)]
  links_file: PathBuf,

  /// Name of the URL column in the links file.
  #[arg(long, default_value = "url")]
  url_col: String,

  /// Key rows by (url, link_id) instead of url alone; the links file must
  /// then carry a `link_id` column.
  #[arg(long)]
  with_link_id: bool,

  /// Optional CSV seeding the shared_content table.
  #[arg(long)]
  shared_content_file: Option<PathBuf>,

  /// Directory receiving intermediate and final CSV outputs.
  #[arg(short, long, default_value = "output")]
  output_dir: PathBuf,

  /// SQLite database path. In-memory when omitted.
  #[arg(long)]
  database: Option<PathBuf>,

  /// Path to the TOML configuration file carrying API credentials.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Collect from Buzzsumo only, skipping the per-platform sources.
  #[arg(long)]
  buzzsumo_only: bool,

  /// Skip sources whose credentials are missing instead of aborting.
  #[arg(long)]
  lenient: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RunConfig {
  #[serde(default)]
  keys: ApiKeys,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("LODE").separator("__"))
    .build()
    .context("failed to read config file")?;

  let run_cfg: RunConfig = settings
    .try_deserialize()
    .context("failed to deserialise configuration")?;

  // Open the store.
  let store = match &cli.database {
    Some(path) => SqliteStore::open(path)
      .await
      .with_context(|| format!("failed to open store at {path:?}"))?,
    None => SqliteStore::open_in_memory()
      .await
      .context("failed to open in-memory store")?,
  };

  // Create and seed both tables.
  let links_schema = if cli.with_link_id {
    TableSchema::links_with_link_id()
  } else {
    TableSchema::links()
  };
  let links = store
    .table(links_schema, Some(&cli.links_file), Some(&cli.url_col))
    .await
    .with_context(|| format!("failed to load links from {:?}", cli.links_file))?;
  let shared_content = store
    .table(
      TableSchema::shared_content(),
      cli.shared_content_file.as_deref(),
      None,
    )
    .await
    .context("failed to load shared_content")?;

  let policy = if cli.lenient {
    CredentialPolicy::Lenient
  } else {
    CredentialPolicy::Strict
  };

  let enrichment = Enrichment::new(
    links,
    shared_content,
    run_cfg.keys,
    policy,
    &cli.output_dir,
  )
  .context("failed to prepare output directory")?;

  let (links_out, shared_out) = enrichment
    .run(cli.buzzsumo_only)
    .await
    .context("enrichment run failed")?;

  tracing::info!(
    links = %links_out.display(),
    shared_content = %shared_out.display(),
    "wrote final outputs"
  );
  Ok(())
}
