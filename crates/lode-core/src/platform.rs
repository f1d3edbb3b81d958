//! Platform classification of target URLs.
//!
//! The orchestrator partitions URLs by domain to decide which collector
//! handles them. Classification is heuristic and deliberately coarse: a URL
//! that matches no known platform is routed to generic web scraping.

use url::Url;

/// Domains treated as YouTube properties and normalised to `youtube.com`.
const YOUTUBE_DOMAINS: &[&str] = &["youtube.com", "youtu.be", "youtube-nocookie.com"];

/// Social platforms that get a default classification but no dedicated
/// collector beyond Facebook and YouTube.
const SOCIAL_DOMAINS: &[&str] = &[
  "facebook.com",
  "youtube.com",
  "tiktok.com",
  "instagram.com",
  "twitter.com",
  "snapchat.com",
];

/// Which collector family a URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
  Youtube,
  Facebook,
  /// A known social platform with no dedicated collector; receives a
  /// default `work_type` and no further enrichment.
  OtherSocial,
  /// Everything else: routed to generic web scraping.
  Web,
}

/// Registrable domain name of `url`, with YouTube short/alternate domains
/// folded into `youtube.com`. Returns `None` for unparsable URLs or hosts
/// without a domain (e.g. IP addresses).
pub fn domain_name(url: &str) -> Option<String> {
  let parsed = Url::parse(url).ok()?;
  let host = parsed.host_str()?;
  if parsed.cannot_be_a_base() || host.parse::<std::net::IpAddr>().is_ok() {
    return None;
  }

  let host = host.strip_prefix("www.").unwrap_or(host);
  // Keep the last two labels; enough for the platform heuristics here.
  let labels: Vec<&str> = host.rsplitn(3, '.').collect();
  let domain = if labels.len() >= 2 {
    format!("{}.{}", labels[1], labels[0])
  } else {
    host.to_string()
  };

  if YOUTUBE_DOMAINS.contains(&domain.as_str()) {
    Some("youtube.com".to_string())
  } else {
    Some(domain)
  }
}

/// Classify one URL by its domain.
pub fn classify(url: &str) -> Platform {
  match domain_name(url).as_deref() {
    Some("youtube.com") => Platform::Youtube,
    Some("facebook.com") => Platform::Facebook,
    Some(domain) if SOCIAL_DOMAINS.contains(&domain) => Platform::OtherSocial,
    _ => Platform::Web,
  }
}
