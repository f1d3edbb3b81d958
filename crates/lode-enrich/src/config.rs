//! Per-source API credentials and the missing-credential policy.
//!
//! Credentials travel as an explicit value through the call chain; nothing
//! here reads or writes process environment variables.

use serde::Deserialize;

/// Credentials for every external source, each optional. Deserialised from
/// the run configuration (TOML file or environment overlay, assembled by the
/// binary).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeys {
  pub buzzsumo:    Option<BuzzsumoKeys>,
  pub crowdtangle: Option<CrowdtangleKeys>,
  pub youtube:     Option<YoutubeKeys>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuzzsumoKeys {
  pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CrowdtangleKeys {
  pub token:      String,
  /// Requests per minute passed through to the client; no policy beyond that.
  #[serde(default)]
  pub rate_limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YoutubeKeys {
  /// One or more API keys, rotated on quota exhaustion. Accepts either a
  /// list or a single comma-separated string.
  #[serde(deserialize_with = "keys_from_list_or_string")]
  pub keys: Vec<String>,
}

fn keys_from_list_or_string<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum OneOrMany {
    One(String),
    Many(Vec<String>),
  }

  let keys = match OneOrMany::deserialize(deserializer)? {
    OneOrMany::One(s) => s.split(',').map(|k| k.trim().to_string()).collect(),
    OneOrMany::Many(v) => v,
  };
  Ok(keys)
}

/// What to do when a source's credentials are absent.
///
/// The original tool's history carried both behaviours; here the choice is
/// explicit. `Strict` aborts the run before any collection starts;
/// `Lenient` logs and skips the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CredentialPolicy {
  #[default]
  Strict,
  Lenient,
}
