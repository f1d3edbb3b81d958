//! YouTube Data API collector for video and channel URLs.
//!
//! A video URL costs two API calls (video statistics, then the channel the
//! video belongs to); a channel URL costs one. Keys are tried in order when
//! a call is rejected for quota, so a multi-key configuration degrades
//! gracefully through a long batch.

use std::time::Duration;

use lode_core::{
  collector::{Collector, CollectorOutput},
  record::{FlatRecord, Target},
};
use serde::Deserialize;
use url::Url;

use super::{FetchResult, collect_bounded};
use crate::Result;

const VIDEOS_URL: &str = "https://www.googleapis.com/youtube/v3/videos";
const CHANNELS_URL: &str = "https://www.googleapis.com/youtube/v3/channels";
const DEFAULT_CONCURRENCY: usize = 4;

pub struct YoutubeCollector {
  client:      reqwest::Client,
  keys:        Vec<String>,
  concurrency: usize,
}

// ─── URL parsing ─────────────────────────────────────────────────────────────

/// What a YouTube URL points at.
#[derive(Debug, Clone, PartialEq, Eq)]
enum YoutubeId {
  Video(String),
  Channel(String),
}

/// Identify the video or channel a YouTube URL addresses. Handles
/// `watch?v=`, `youtu.be/`, `/shorts/`, `/embed/`, and `/channel/` forms;
/// vanity handles need a search call and are left unresolved.
fn parse_youtube_id(url: &str) -> Option<YoutubeId> {
  let parsed = Url::parse(url).ok()?;
  let host = parsed.host_str()?.trim_start_matches("www.").to_string();
  let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());

  if host == "youtu.be" {
    return segments.next().map(|id| YoutubeId::Video(id.to_string()));
  }

  match segments.next() {
    Some("watch") => parsed
      .query_pairs()
      .find(|(k, _)| k == "v")
      .map(|(_, v)| YoutubeId::Video(v.into_owned())),
    Some("shorts") | Some("embed") => {
      segments.next().map(|id| YoutubeId::Video(id.to_string()))
    }
    Some("channel") => segments.next().map(|id| YoutubeId::Channel(id.to_string())),
    _ => None,
  }
}

// ─── API payloads ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
  #[serde(default = "Vec::new")]
  items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
  id:              String,
  snippet:         VideoSnippet,
  #[serde(default)]
  statistics:      Statistics,
  content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
  title:        Option<String>,
  description:  Option<String>,
  published_at: Option<String>,
  channel_id:   Option<String>,
  #[serde(default)]
  tags:         Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentDetails {
  duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
  view_count:       Option<String>,
  like_count:       Option<String>,
  favorite_count:   Option<String>,
  comment_count:    Option<String>,
  subscriber_count: Option<String>,
  video_count:      Option<String>,
}

impl Statistics {
  /// Counters arrive as JSON strings; anything unparsable counts as absent.
  fn count(value: &Option<String>) -> Option<i64> {
    value.as_deref().and_then(|v| v.parse().ok())
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
  id:         String,
  snippet:    ChannelSnippet,
  #[serde(default)]
  statistics: Statistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelSnippet {
  title:        Option<String>,
  description:  Option<String>,
  published_at: Option<String>,
  country:      Option<String>,
}

// ─── Collector ───────────────────────────────────────────────────────────────

impl YoutubeCollector {
  pub fn new(keys: Vec<String>) -> Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self {
      client,
      keys,
      concurrency: DEFAULT_CONCURRENCY,
    })
  }

  async fn fetch(&self, target: Target) -> FetchResult {
    let Some(id) = parse_youtube_id(&target.url) else {
      // Vanity or playlist URL: no data, not an error.
      return Ok(None);
    };

    match id {
      YoutubeId::Video(video_id) => {
        let Some(video) = self
          .list_items::<VideoItem>(VIDEOS_URL, "snippet,statistics,contentDetails", &video_id)
          .await?
        else {
          return Ok(None);
        };

        // A failed channel lookup costs only the creator_* columns.
        let channel = match &video.snippet.channel_id {
          Some(channel_id) => self
            .list_items::<ChannelItem>(CHANNELS_URL, "snippet,statistics", channel_id)
            .await
            .unwrap_or_else(|error| {
              tracing::warn!(url = %target.url, %error, "channel lookup failed");
              None
            }),
          None => None,
        };

        Ok(Some(normalize_video(&target, &video, channel.as_ref())))
      }
      YoutubeId::Channel(channel_id) => {
        let Some(channel) = self
          .list_items::<ChannelItem>(CHANNELS_URL, "snippet,statistics", &channel_id)
          .await?
        else {
          return Ok(None);
        };
        Ok(Some(normalize_channel(&target, &channel)))
      }
    }
  }

  /// One `list` call returning the first item, rotating keys on quota
  /// rejection.
  async fn list_items<T: serde::de::DeserializeOwned + Send>(
    &self,
    endpoint: &str,
    part: &str,
    id: &str,
  ) -> Result<Option<T>, Box<dyn std::error::Error + Send + Sync>> {
    let mut last_status = None;
    for key in &self.keys {
      let response = self
        .client
        .get(endpoint)
        .query(&[("part", part), ("id", id), ("key", key.as_str())])
        .send()
        .await?;

      let status = response.status();
      if status == reqwest::StatusCode::FORBIDDEN
        || status == reqwest::StatusCode::TOO_MANY_REQUESTS
      {
        last_status = Some(status);
        continue;
      }

      let payload: ListResponse<T> = response.error_for_status()?.json().await?;
      return Ok(payload.items.into_iter().next());
    }
    Err(format!("all API keys rejected (last status: {last_status:?})").into())
  }
}

impl Collector for YoutubeCollector {
  fn name(&self) -> &'static str {
    "youtube"
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

// ─── Normalization ───────────────────────────────────────────────────────────

fn normalize_video(
  target: &Target,
  video: &VideoItem,
  channel: Option<&ChannelItem>,
) -> FlatRecord {
  let mut record = FlatRecord::for_target(target);
  record.set("domain", Some("youtube.com".to_string()));
  record.set("work_type", Some("VideoObject".to_string()));
  record.set("identifier", Some(video.id.clone()));
  record.set("title", video.snippet.title.clone());
  record.set("abstract", video.snippet.description.clone());
  record.set("date_published", video.snippet.published_at.clone());
  record.set(
    "keywords",
    (!video.snippet.tags.is_empty()).then(|| video.snippet.tags.join(",")),
  );
  record.set(
    "duration",
    video.content_details.as_ref().and_then(|d| d.duration.clone()),
  );
  record.set_count("youtube_watch", Statistics::count(&video.statistics.view_count));
  record.set_count("youtube_like", Statistics::count(&video.statistics.like_count));
  record.set_count(
    "youtube_favorite",
    Statistics::count(&video.statistics.favorite_count),
  );
  record.set_count(
    "youtube_comment",
    Statistics::count(&video.statistics.comment_count),
  );

  if let Some(channel) = channel {
    record.set("creator_type", Some("defacto:SocialMediaAccount".to_string()));
    record.set("creator_identifier", Some(channel.id.clone()));
    record.set("creator_name", channel.snippet.title.clone());
    record.set("creator_date_created", channel.snippet.published_at.clone());
    record.set("creator_location_created", channel.snippet.country.clone());
    record.set(
      "creator_youtube_subscribe",
      Statistics::count(&channel.statistics.subscriber_count).map(|c| c.to_string()),
    );
    record.set(
      "creator_create_video",
      Statistics::count(&channel.statistics.video_count).map(|c| c.to_string()),
    );
  }

  record
}

fn normalize_channel(target: &Target, channel: &ChannelItem) -> FlatRecord {
  let mut record = FlatRecord::for_target(target);
  record.set("domain", Some("youtube.com".to_string()));
  record.set("work_type", Some("WebPage".to_string()));
  record.set("identifier", Some(channel.id.clone()));
  record.set("title", channel.snippet.title.clone());
  record.set("abstract", channel.snippet.description.clone());
  record.set("date_published", channel.snippet.published_at.clone());
  record.set("country_of_origin", channel.snippet.country.clone());
  record.set_count(
    "youtube_subscribe",
    Statistics::count(&channel.statistics.subscriber_count),
  );
  record.set_count("create_video", Statistics::count(&channel.statistics.video_count));
  record
}
