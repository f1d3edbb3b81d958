//! Buzzsumo collector: the catch-all analytics source.
//!
//! Runs last and unconditionally over every target URL. Thanks to the
//! coalesce semantics it functions purely as a gap-filler: it cannot regress
//! a field another source already produced.

use std::time::Duration;

use chrono::{TimeZone, Utc};
use lode_core::{
  collector::{Collector, CollectorOutput},
  platform,
  record::{FlatRecord, Target},
};
use serde::Deserialize;

use super::{FetchResult, collect_bounded};
use crate::Result;

const API_URL: &str = "https://api.buzzsumo.com/search/articles.json";
const DEFAULT_CONCURRENCY: usize = 4;

/// 2020-01-01T00:00:00Z. Articles older than this are not relevant to the
/// datasets this tool serves; keeps result pages small.
const BEGIN_TIMESTAMP: i64 = 1_577_836_800;

pub struct BuzzsumoCollector {
  client:      reqwest::Client,
  token:       String,
  concurrency: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
  #[serde(default)]
  results: Vec<Article>,
}

/// Subset of Buzzsumo's article payload this pipeline consumes.
#[derive(Debug, Deserialize)]
struct Article {
  title:          Option<String>,
  published_date: Option<i64>,
  author_name:    Option<String>,
  video_length:   Option<i64>,

  twitter_shares: Option<i64>,
  #[serde(alias = "total_facebook_shares")]
  facebook_shares: Option<i64>,
  facebook_comments: Option<i64>,
  pinterest_shares: Option<i64>,
  #[serde(alias = "total_reddit_engagements")]
  reddit_engagements: Option<i64>,
  youtube_views: Option<i64>,
  youtube_likes: Option<i64>,
  youtube_comments: Option<i64>,
  tiktok_shares: Option<i64>,
  tiktok_comments: Option<i64>,

  #[serde(default)]
  is_video: bool,
  #[serde(default)]
  is_general_article: bool,
  #[serde(default)]
  is_how_to_article: bool,
  #[serde(default)]
  is_infographic: bool,
  #[serde(default)]
  is_interview: bool,
  #[serde(default)]
  is_list: bool,
  #[serde(default)]
  is_newsletter: bool,
  #[serde(default)]
  is_press_release: bool,
  #[serde(default)]
  is_review: bool,
  #[serde(default)]
  is_what_post: bool,
  #[serde(default)]
  is_why_post: bool,
}

impl Article {
  /// Buzzsumo's content-type booleans folded into an ontological work type.
  fn work_type(&self) -> &'static str {
    if self.is_video {
      return "VideoObject";
    }
    let article = self.is_general_article
      || self.is_how_to_article
      || self.is_infographic
      || self.is_interview
      || self.is_list
      || self.is_newsletter
      || self.is_press_release
      || self.is_review
      || self.is_what_post
      || self.is_why_post;
    if article { "Article" } else { "WebPage" }
  }
}

impl BuzzsumoCollector {
  pub fn new(token: impl Into<String>) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self {
      client,
      token: token.into(),
      concurrency: DEFAULT_CONCURRENCY,
    })
  }

  async fn fetch(&self, target: Target) -> FetchResult {
    let begin = BEGIN_TIMESTAMP.to_string();
    let end = Utc::now().timestamp().to_string();

    let response: SearchResponse = self
      .client
      .get(API_URL)
      .query(&[
        ("api_key", self.token.as_str()),
        ("q", target.url.as_str()),
        ("exact_url", "1"),
        ("begin_date", begin.as_str()),
        ("end_date", end.as_str()),
      ])
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    let Some(article) = response.results.into_iter().next() else {
      return Ok(None);
    };
    Ok(Some(normalize(&target, &article)))
  }
}

impl Collector for BuzzsumoCollector {
  fn name(&self) -> &'static str {
    "buzzsumo"
  }

  async fn collect(&self, targets: &[Target]) -> CollectorOutput {
    let links =
      collect_bounded(self.name(), targets, self.concurrency, |t| self.fetch(t)).await;
    CollectorOutput {
      links,
      shared_content: Vec::new(),
    }
  }
}

fn normalize(target: &Target, article: &Article) -> FlatRecord {
  let date_published = article
    .published_date
    .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
    .map(|dt| dt.to_rfc3339());

  let mut record = FlatRecord::for_target(target);
  record.set("domain", platform::domain_name(&target.url));
  record.set("work_type", Some(article.work_type().to_string()));
  record.set("title", article.title.clone());
  record.set("date_published", date_published);
  record.set("creator_name", article.author_name.clone());
  record.set_count("duration", article.video_length);
  record.set_count("twitter_share", article.twitter_shares);
  record.set_count("facebook_share", article.facebook_shares);
  record.set_count("facebook_comment", article.facebook_comments);
  record.set_count("pinterest_share", article.pinterest_shares);
  record.set_count("reddit_engagement", article.reddit_engagements);
  record.set_count("youtube_watch", article.youtube_views);
  record.set_count("youtube_like", article.youtube_likes);
  record.set_count("youtube_comment", article.youtube_comments);
  record.set_count("tiktok_share", article.tiktok_shares);
  record.set_count("tiktok_comment", article.tiktok_comments);
  record
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn normalize_maps_counters_and_type() {
    let article: Article = serde_json::from_value(serde_json::json!({
      "title": "Hello",
      "published_date": 1_680_000_000,
      "twitter_shares": 10,
      "total_facebook_shares": 25,
      "is_general_article": true
    }))
    .unwrap();

    let record = normalize(&Target::new("https://news.example.com/story"), &article);
    assert_eq!(record.get("work_type"), Some("Article"));
    assert_eq!(record.get("title"), Some("Hello"));
    assert_eq!(record.get("twitter_share"), Some("10"));
    assert_eq!(record.get("facebook_share"), Some("25"));
    assert_eq!(record.get("tiktok_share"), None);
    assert!(record.get("date_published").unwrap().starts_with("2023-03-28"));
  }

  #[test]
  fn video_type_takes_precedence() {
    let article: Article = serde_json::from_value(serde_json::json!({
      "is_video": true,
      "is_list": true
    }))
    .unwrap();
    assert_eq!(article.work_type(), "VideoObject");
  }
}
