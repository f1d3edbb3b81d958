//! CrowdTangle collector for Facebook post URLs.
//!
//! The only collector that feeds both tables: post engagement goes to
//! `links`, the post's embedded media payload to `shared_content`. Requests
//! run sequentially with an optional requests-per-minute pause, since the
//! CrowdTangle quota is account-wide.

use std::time::Duration;

use lode_core::{
  collector::{Collector, CollectorOutput},
  record::{FlatRecord, Target},
};
use serde::Deserialize;
use tracing::warn;

use crate::Result;

const API_URL: &str = "https://api.crowdtangle.com/links";

pub struct FacebookCollector {
  client:     reqwest::Client,
  token:      String,
  rate_limit: Option<u32>,
}

// ─── API payloads ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LinksResponse {
  result: Option<LinksResult>,
}

#[derive(Debug, Deserialize)]
struct LinksResult {
  #[serde(default)]
  posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Post {
  platform_id:   Option<String>,
  date:          Option<String>,
  updated:       Option<String>,
  #[serde(rename = "type")]
  post_type:     Option<String>,
  title:         Option<String>,
  description:   Option<String>,
  message:       Option<String>,
  video_length_ms: Option<i64>,
  #[serde(default)]
  media:         Vec<Media>,
  statistics:    Option<PostStatistics>,
  account:       Option<Account>,
}

#[derive(Debug, Deserialize)]
struct Media {
  #[serde(rename = "type")]
  media_type: Option<String>,
  url:        Option<String>,
  height:     Option<i64>,
  width:      Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PostStatistics {
  actual: Option<EngagementCounts>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EngagementCounts {
  like_count:    Option<i64>,
  comment_count: Option<i64>,
  share_count:   Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Account {
  platform_id:           Option<String>,
  name:                  Option<String>,
  url:                   Option<String>,
  subscriber_count:      Option<i64>,
  page_admin_top_country: Option<String>,
}

// ─── Collector ───────────────────────────────────────────────────────────────

impl FacebookCollector {
  pub fn new(token: impl Into<String>, rate_limit: Option<u32>) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self {
      client,
      token: token.into(),
      rate_limit,
    })
  }

  async fn fetch(&self, target: &Target) -> Result<Option<Post>, reqwest::Error> {
    let response: LinksResponse = self
      .client
      .get(API_URL)
      .query(&[
        ("token", self.token.as_str()),
        ("link", target.url.as_str()),
        ("count", "1"),
      ])
      .send()
      .await?
      .error_for_status()?
      .json()
      .await?;

    Ok(response.result.and_then(|r| r.posts.into_iter().next()))
  }
}

impl Collector for FacebookCollector {
  fn name(&self) -> &'static str {
    "facebook"
  }

  async fn collect(&self, targets: &[Target]) -> CollectorOutput {
    let pause = self
      .rate_limit
      .filter(|limit| *limit > 0)
      .map(|limit| Duration::from_secs_f64(60.0 / f64::from(limit)));

    let mut output = CollectorOutput::default();
    for target in targets {
      match self.fetch(target).await {
        Ok(Some(post)) => {
          output.links.push(normalize_post(target, &post));
          output
            .shared_content
            .extend(post.media.iter().filter_map(|m| normalize_media(target, m)));
        }
        // Post not in CrowdTangle's index: still classifiable.
        Ok(None) => {
          let mut record = FlatRecord::for_target(target);
          record.set("domain", Some("facebook.com".to_string()));
          record.set("work_type", Some("SocialMediaPosting".to_string()));
          output.links.push(record);
        }
        Err(error) => {
          warn!(source = self.name(), url = %target.url, %error, "collection failed for target");
        }
      }

      if let Some(pause) = pause {
        tokio::time::sleep(pause).await;
      }
    }
    output
  }
}

// ─── Normalization ───────────────────────────────────────────────────────────

fn work_type(post: &Post) -> &'static str {
  match post.post_type.as_deref() {
    Some("photo") => "ImageObject",
    Some("native_video") | Some("live_video") | Some("youtube") | Some("video") => {
      "VideoObject"
    }
    _ => "SocialMediaPosting",
  }
}

fn normalize_post(target: &Target, post: &Post) -> FlatRecord {
  let mut record = FlatRecord::for_target(target);
  record.set("domain", Some("facebook.com".to_string()));
  record.set("work_type", Some(work_type(post).to_string()));
  record.set("identifier", post.platform_id.clone());
  record.set("date_published", post.date.clone());
  record.set("date_modified", post.updated.clone());
  record.set("title", post.title.clone());
  record.set("abstract", post.description.clone());
  record.set("text", post.message.clone());
  record.set_count("duration", post.video_length_ms.map(|ms| ms / 1000));

  if let Some(counts) = post.statistics.as_ref().and_then(|s| s.actual.as_ref()) {
    record.set_count("facebook_like", counts.like_count);
    record.set_count("facebook_comment", counts.comment_count);
    record.set_count("facebook_share", counts.share_count);
  }

  if let Some(account) = &post.account {
    record.set("creator_type", Some("defacto:SocialMediaAccount".to_string()));
    record.set("creator_identifier", account.platform_id.clone());
    record.set("creator_name", account.name.clone());
    record.set("creator_url", account.url.clone());
    record.set("creator_location_created", account.page_admin_top_country.clone());
    record.set_count("creator_facebook_subscribe", account.subscriber_count);
  }

  record
}

/// CrowdTangle media classifications folded into CreativeWork subtypes.
fn media_type(kind: Option<&str>) -> &'static str {
  match kind {
    Some("photo") => "ImageObject",
    Some("video") => "VideoObject",
    _ => "MediaObject",
  }
}

fn normalize_media(target: &Target, media: &Media) -> Option<FlatRecord> {
  let content_url = media.url.clone()?;

  let mut record = FlatRecord::default();
  record.set("post_url", Some(target.url.clone()));
  record.set("content_url", Some(content_url));
  record.set("media_type", Some(media_type(media.media_type.as_deref()).to_string()));
  record.set_count("height", media.height);
  record.set_count("width", media.width);
  Some(record)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_post() -> Post {
    serde_json::from_value(serde_json::json!({
      "platformId": "123_456",
      "date": "2023-05-01 12:00:00",
      "type": "photo",
      "message": "look at this",
      "media": [
        { "type": "photo", "url": "https://scontent.example/i1.jpg", "height": 720, "width": 960 },
        { "type": "unknown" }
      ],
      "statistics": { "actual": { "likeCount": 5, "commentCount": 2, "shareCount": 1 } },
      "account": { "platformId": "789", "name": "A Page", "subscriberCount": 1000 }
    }))
    .unwrap()
  }

  #[test]
  fn post_normalization_fills_engagement_and_creator() {
    let target = Target::new("https://facebook.com/page/posts/456");
    let record = normalize_post(&target, &sample_post());

    assert_eq!(record.get("work_type"), Some("ImageObject"));
    assert_eq!(record.get("identifier"), Some("123_456"));
    assert_eq!(record.get("facebook_like"), Some("5"));
    assert_eq!(record.get("facebook_share"), Some("1"));
    assert_eq!(record.get("creator_name"), Some("A Page"));
    assert_eq!(record.get("creator_facebook_subscribe"), Some("1000"));
  }

  #[test]
  fn media_without_url_is_skipped() {
    let target = Target::new("https://facebook.com/page/posts/456");
    let post = sample_post();

    let records: Vec<FlatRecord> = post
      .media
      .iter()
      .filter_map(|m| normalize_media(&target, m))
      .collect();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("post_url"), Some("https://facebook.com/page/posts/456"));
    assert_eq!(records[0].get("media_type"), Some("ImageObject"));
    assert_eq!(records[0].get("height"), Some("720"));
  }
}
