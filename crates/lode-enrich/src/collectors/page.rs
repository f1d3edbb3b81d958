//! Generic web-page collector: fetch HTML and lift basic metadata.
//!
//! Handles every URL that matched no platform heuristic. Field extraction is
//! deliberately shallow (title, description, published time, paragraph
//! text); per-platform semantics belong to the dedicated collectors.

use std::time::Duration;

use lode_core::{
  collector::{Collector, CollectorOutput},
  platform,
  record::{FlatRecord, Target},
};
use scraper::{Html, Selector};

use super::{FetchResult, collect_bounded};
use crate::Result;

const USER_AGENT: &str = concat!("lode/", env!("CARGO_PKG_VERSION"));
const DEFAULT_CONCURRENCY: usize = 8;

pub struct PageCollector {
  client:      reqwest::Client,
  concurrency: usize,
}

impl PageCollector {
  pub fn new() -> Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent(USER_AGENT)
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self {
      client,
      concurrency: DEFAULT_CONCURRENCY,
    })
  }

  async fn fetch(&self, target: Target) -> FetchResult {
    let response = self
      .client
      .get(&target.url)
      .send()
      .await?
      .error_for_status()?;
    let body = response.text().await?;
    // The parsed DOM is not Send; extraction stays on this side of any
    // await point.
    Ok(Some(extract(&target, &body)))
  }
}

impl Collector for PageCollector {
  fn name(&self) -> &'static str {
    "page"
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

fn meta_content(document: &Html, selector: &str) -> Option<String> {
  let selector = Selector::parse(selector).unwrap();
  document
    .select(&selector)
    .find_map(|el| el.value().attr("content"))
    .map(|c| c.trim().to_string())
    .filter(|c| !c.is_empty())
}

fn extract(target: &Target, html: &str) -> FlatRecord {
  let document = Html::parse_document(html);

  let title_selector = Selector::parse("title").unwrap();
  let title = document
    .select(&title_selector)
    .next()
    .map(|el| el.text().collect::<String>().trim().to_string())
    .filter(|t| !t.is_empty())
    .or_else(|| meta_content(&document, r#"meta[property="og:title"]"#));

  let abstract_ = meta_content(&document, r#"meta[name="description"]"#)
    .or_else(|| meta_content(&document, r#"meta[property="og:description"]"#));

  let date_published = meta_content(&document, r#"meta[property="article:published_time"]"#);

  let work_type = match meta_content(&document, r#"meta[property="og:type"]"#) {
    Some(kind) if kind.contains("article") => "Article",
    Some(kind) if kind.contains("video") => "VideoObject",
    _ => "WebPage",
  };

  let paragraph_selector = Selector::parse("p").unwrap();
  let text = document
    .select(&paragraph_selector)
    .map(|el| el.text().collect::<String>())
    .map(|t| t.trim().to_string())
    .filter(|t| !t.is_empty())
    .collect::<Vec<_>>()
    .join("\n");

  let mut record = FlatRecord::for_target(target);
  record.set("domain", platform::domain_name(&target.url));
  record.set("work_type", Some(work_type.to_string()));
  record.set("title", title);
  record.set("abstract", abstract_);
  record.set("date_published", date_published);
  record.set("text", (!text.is_empty()).then_some(text));
  record
}
