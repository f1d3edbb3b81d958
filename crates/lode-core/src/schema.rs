//! Table schema registry: canonical column sets, types, and primary keys.
//!
//! A [`TableSchema`] is configuration, not runtime state — but each run works
//! on a mutable copy so the column reconciler can fold in input-specific
//! columns (see [`crate::reconcile`]).

// ─── Column types ────────────────────────────────────────────────────────────

/// Declared storage type of a column. SQLite is loosely typed; this drives
/// both DDL rendering and value coercion checks at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
  Text,
  Integer,
}

impl ColumnType {
  /// SQL type keyword, including any column constraint suffix.
  pub fn as_sql(&self) -> &'static str {
    match self {
      ColumnType::Text => "TEXT",
      ColumnType::Integer => "INTEGER",
    }
  }
}

// ─── Schema descriptor ───────────────────────────────────────────────────────

/// Canonical shape of one table: name, primary key column(s), and the
/// ordered column → type mapping.
#[derive(Debug, Clone)]
pub struct TableSchema {
  pub name:        &'static str,
  pub primary_key: Vec<String>,
  pub columns:     Vec<(String, ColumnType)>,
}

pub const LINKS_TABLE: &str = "links";
pub const SHARED_CONTENT_TABLE: &str = "shared_content";

/// Canonical `links` columns. Counters are INTEGER, everything else TEXT.
const LINKS_COLUMNS: &[(&str, ColumnType)] = &[
  ("url", ColumnType::Text),
  ("domain", ColumnType::Text),
  ("work_type", ColumnType::Text),
  ("duration", ColumnType::Text),
  ("identifier", ColumnType::Text),
  ("date_published", ColumnType::Text),
  ("date_modified", ColumnType::Text),
  ("country_of_origin", ColumnType::Text),
  ("abstract", ColumnType::Text),
  ("keywords", ColumnType::Text),
  ("title", ColumnType::Text),
  ("text", ColumnType::Text),
  ("hashtags", ColumnType::Text),
  ("creator_type", ColumnType::Text),
  ("creator_date_created", ColumnType::Text),
  ("creator_location_created", ColumnType::Text),
  ("creator_identifier", ColumnType::Text),
  ("creator_facebook_follow", ColumnType::Integer),
  ("creator_facebook_subscribe", ColumnType::Integer),
  ("creator_twitter_follow", ColumnType::Integer),
  ("creator_youtube_subscribe", ColumnType::Integer),
  ("creator_create_video", ColumnType::Integer),
  ("creator_name", ColumnType::Text),
  ("creator_url", ColumnType::Text),
  ("facebook_comment", ColumnType::Integer),
  ("facebook_like", ColumnType::Integer),
  ("facebook_share", ColumnType::Integer),
  ("pinterest_share", ColumnType::Integer),
  ("twitter_share", ColumnType::Integer),
  ("tiktok_share", ColumnType::Integer),
  ("tiktok_comment", ColumnType::Integer),
  ("reddit_engagement", ColumnType::Integer),
  ("youtube_watch", ColumnType::Integer),
  ("youtube_comment", ColumnType::Integer),
  ("youtube_like", ColumnType::Integer),
  ("youtube_favorite", ColumnType::Integer),
  ("youtube_subscribe", ColumnType::Integer),
  ("create_video", ColumnType::Integer),
];

const SHARED_CONTENT_COLUMNS: &[(&str, ColumnType)] = &[
  ("post_url", ColumnType::Text),
  ("media_type", ColumnType::Text),
  ("content_url", ColumnType::Text),
  ("height", ColumnType::Integer),
  ("width", ColumnType::Integer),
];

impl TableSchema {
  /// Schema for the `links` table: one row per target URL.
  pub fn links() -> Self {
    Self {
      name:        LINKS_TABLE,
      primary_key: vec!["url".to_string()],
      columns:     LINKS_COLUMNS
        .iter()
        .map(|(name, ty)| (name.to_string(), *ty))
        .collect(),
    }
  }

  /// `links` keyed by `(url, link_id)`, so the same URL may appear under
  /// distinct input rows (e.g. across merged source datasets) while each
  /// (url, id) pair remains a single enrichment target.
  pub fn links_with_link_id() -> Self {
    let mut schema = Self::links();
    schema.columns.insert(1, ("link_id".to_string(), ColumnType::Text));
    schema.primary_key.push("link_id".to_string());
    schema
  }

  /// Schema for the `shared_content` table: media embedded in a post,
  /// keyed by `(post_url, content_url)`. `post_url` logically references
  /// `links.url`.
  pub fn shared_content() -> Self {
    Self {
      name:        SHARED_CONTENT_TABLE,
      primary_key: vec!["post_url".to_string(), "content_url".to_string()],
      columns:     SHARED_CONTENT_COLUMNS
        .iter()
        .map(|(name, ty)| (name.to_string(), *ty))
        .collect(),
    }
  }

  /// Declared type of a canonical column, if any.
  pub fn column_type(&self, column: &str) -> Option<ColumnType> {
    self
      .columns
      .iter()
      .find(|(name, _)| name == column)
      .map(|(_, ty)| *ty)
  }

  /// Whether `column` participates in the primary key.
  pub fn is_key(&self, column: &str) -> bool {
    self.primary_key.iter().any(|pk| pk == column)
  }

  /// Column names in declaration order.
  pub fn column_names(&self) -> impl Iterator<Item = &str> {
    self.columns.iter().map(|(name, _)| name.as_str())
  }
}
