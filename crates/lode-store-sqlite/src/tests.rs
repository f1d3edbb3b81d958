//! Integration tests for [`Table`] against an in-memory database.

use std::path::PathBuf;

use lode_core::{Error as CoreError, schema::TableSchema};
use tempfile::TempDir;

use crate::{Error, SqliteStore, Table};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.expect("in-memory store")
}

fn write_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
  let path = dir.path().join(name);
  std::fs::write(&path, content).expect("write fixture");
  path
}

/// A `links` table seeded from `content`, with the canonical `url` column.
async fn seeded_links(store: &SqliteStore, dir: &TempDir, content: &str) -> Table {
  let infile = write_csv(dir, "in.csv", content);
  store
    .table(TableSchema::links(), Some(&infile), None)
    .await
    .expect("seeded links table")
}

// ─── Seeding ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn seed_first_writer_wins_and_never_duplicates() {
  let dir = TempDir::new().unwrap();
  let table = seeded_links(
    &store().await,
    &dir,
    "url,title\n\
     https://example.com/a,First\n\
     https://example.com/a,Second\n",
  )
  .await;

  assert_eq!(table.row_count().await.unwrap(), 1);
  assert_eq!(
    table
      .select_value(&[("url", "https://example.com/a")], "title")
      .await
      .unwrap()
      .as_deref(),
    Some("First")
  );
}

#[tokio::test]
async fn seed_copies_declared_url_column_into_canonical_slot() {
  let dir = TempDir::new().unwrap();
  let infile = write_csv(
    &dir,
    "in.csv",
    "target_url,label\nhttps://example.com/a,news\n",
  );

  let table = store()
    .await
    .table(TableSchema::links(), Some(&infile), Some("target_url"))
    .await
    .unwrap();

  let key = [("url", "https://example.com/a")];
  // Canonical slot filled, original column preserved for traceability.
  assert_eq!(
    table.select_value(&key, "target_url").await.unwrap().as_deref(),
    Some("https://example.com/a")
  );
  assert_eq!(
    table.select_value(&key, "label").await.unwrap().as_deref(),
    Some("news")
  );
}

#[tokio::test]
async fn seed_empty_cells_are_null_not_empty_string() {
  let dir = TempDir::new().unwrap();
  let table = seeded_links(&store().await, &dir, "url,title\nhttps://example.com/a,\n").await;

  let title = table
    .select_value(&[("url", "https://example.com/a")], "title")
    .await
    .unwrap();
  assert_eq!(title, None);
}

// ─── Header validation ───────────────────────────────────────────────────────

#[tokio::test]
async fn create_rejects_file_without_headers() {
  let dir = TempDir::new().unwrap();
  let infile = write_csv(&dir, "in.csv", "");

  let err = store()
    .await
    .table(TableSchema::links(), Some(&infile), None)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::NoHeaders)));
}

#[tokio::test]
async fn create_rejects_missing_url_column() {
  let dir = TempDir::new().unwrap();
  let infile = write_csv(&dir, "in.csv", "link,label\nhttps://example.com/a,news\n");

  let err = store()
    .await
    .table(TableSchema::links(), Some(&infile), Some("address"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::MissingUrlColumn(col)) if col == "address"));
}

#[tokio::test]
async fn create_rejects_missing_shared_content_key_column() {
  let dir = TempDir::new().unwrap();
  let infile = write_csv(&dir, "in.csv", "post_url,media_type\np1,photo\n");

  let err = store()
    .await
    .table(TableSchema::shared_content(), Some(&infile), None)
    .await
    .unwrap_err();
  assert!(
    matches!(err, Error::Core(CoreError::MissingPrimaryKeyColumn(col)) if col == "content_url")
  );
}

// ─── Coalesce semantics ──────────────────────────────────────────────────────

#[tokio::test]
async fn coalesce_fills_gaps_and_preserves_non_null() {
  let dir = TempDir::new().unwrap();
  let table = seeded_links(
    &store().await,
    &dir,
    "url,domain,title\nhttps://example.com/a,,\n",
  )
  .await;
  let key = [("url", "https://example.com/a")];

  // First collector fills the domain gap.
  let batch = write_csv(&dir, "one.csv", "url,domain\nhttps://example.com/a,example.com\n");
  table.coalesce(&batch).await.unwrap();
  assert_eq!(
    table.select_value(&key, "domain").await.unwrap().as_deref(),
    Some("example.com")
  );
  assert_eq!(table.select_value(&key, "title").await.unwrap(), None);

  // A later, disagreeing collector cannot regress the stored domain but
  // still fills the title gap.
  let batch = write_csv(
    &dir,
    "two.csv",
    "url,domain,title\nhttps://example.com/a,other.com,Hello\n",
  );
  table.coalesce(&batch).await.unwrap();
  assert_eq!(
    table.select_value(&key, "domain").await.unwrap().as_deref(),
    Some("example.com")
  );
  assert_eq!(
    table.select_value(&key, "title").await.unwrap().as_deref(),
    Some("Hello")
  );
}

#[tokio::test]
async fn coalesce_is_idempotent() {
  let dir = TempDir::new().unwrap();
  let table = seeded_links(
    &store().await,
    &dir,
    "url,title\nhttps://example.com/a,\nhttps://example.com/b,\n",
  )
  .await;

  let batch = write_csv(
    &dir,
    "batch.csv",
    "url,title,facebook_like\n\
     https://example.com/a,Hello,3\n\
     https://example.com/b,World,\n",
  );
  table.coalesce(&batch).await.unwrap();
  let once = export_string(&table, &dir, "once.csv").await;

  table.coalesce(&batch).await.unwrap();
  let twice = export_string(&table, &dir, "twice.csv").await;

  assert_eq!(once, twice);
  assert_eq!(table.row_count().await.unwrap(), 2);
}

#[tokio::test]
async fn coalesce_empty_cell_never_clobbers() {
  let dir = TempDir::new().unwrap();
  let table = seeded_links(
    &store().await,
    &dir,
    "url,title\nhttps://example.com/a,Kept\n",
  )
  .await;

  let batch = write_csv(&dir, "batch.csv", "url,title\nhttps://example.com/a,\n");
  table.coalesce(&batch).await.unwrap();

  assert_eq!(
    table
      .select_value(&[("url", "https://example.com/a")], "title")
      .await
      .unwrap()
      .as_deref(),
    Some("Kept")
  );
}

#[tokio::test]
async fn coalesce_key_only_record_is_a_noop() {
  let dir = TempDir::new().unwrap();
  let table = seeded_links(
    &store().await,
    &dir,
    "url,title\nhttps://example.com/a,Kept\n",
  )
  .await;

  let batch = write_csv(&dir, "batch.csv", "url\nhttps://example.com/a\n");
  table.coalesce(&batch).await.unwrap();

  assert_eq!(table.row_count().await.unwrap(), 1);
  assert_eq!(
    table
      .select_value(&[("url", "https://example.com/a")], "title")
      .await
      .unwrap()
      .as_deref(),
    Some("Kept")
  );
}

// Within one batch, two non-null values for the same key and column resolve
// to the first in file order: the same COALESCE arm applies to every row, so
// the merge stays commutative per key across batches and within them.
#[tokio::test]
async fn coalesce_within_batch_first_non_null_wins() {
  let dir = TempDir::new().unwrap();
  let table = seeded_links(&store().await, &dir, "url,title\nhttps://example.com/a,\n").await;

  let batch = write_csv(
    &dir,
    "batch.csv",
    "url,title\n\
     https://example.com/a,First\n\
     https://example.com/a,Second\n",
  );
  table.coalesce(&batch).await.unwrap();

  assert_eq!(table.row_count().await.unwrap(), 1);
  assert_eq!(
    table
      .select_value(&[("url", "https://example.com/a")], "title")
      .await
      .unwrap()
      .as_deref(),
    Some("First")
  );
}

#[tokio::test]
async fn coalesce_headers_only_file_is_a_noop() {
  let dir = TempDir::new().unwrap();
  let table = seeded_links(&store().await, &dir, "url\nhttps://example.com/a\n").await;

  let batch = write_csv(&dir, "batch.csv", "url,title\n");
  table.coalesce(&batch).await.unwrap();
  assert_eq!(table.row_count().await.unwrap(), 1);
}

// ─── Error surfacing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn integer_coercion_failure_is_fatal_with_context() {
  let dir = TempDir::new().unwrap();
  let table = seeded_links(&store().await, &dir, "url\nhttps://example.com/a\n").await;

  let batch = write_csv(
    &dir,
    "batch.csv",
    "url,facebook_like\nhttps://example.com/a,many\n",
  );
  let err = table.coalesce(&batch).await.unwrap_err();

  match err {
    Error::Write { statement, row, reason } => {
      assert!(statement.contains("INSERT INTO links"));
      assert!(row.contains("many"));
      assert!(reason.contains("facebook_like"));
    }
    other => panic!("expected write error, got {other:?}"),
  }
}

#[tokio::test]
async fn unknown_incoming_column_is_fatal() {
  let dir = TempDir::new().unwrap();
  let table = seeded_links(&store().await, &dir, "url\nhttps://example.com/a\n").await;

  let batch = write_csv(&dir, "batch.csv", "url,sentiment\nhttps://example.com/a,0.4\n");
  let err = table.coalesce(&batch).await.unwrap_err();
  assert!(matches!(
    err,
    Error::UnknownColumn { column, .. } if column == "sentiment"
  ));
}

// ─── Export ──────────────────────────────────────────────────────────────────

async fn export_string(table: &Table, dir: &TempDir, name: &str) -> String {
  let path = dir.path().join(name);
  table.export(&path).await.unwrap();
  std::fs::read_to_string(&path).unwrap()
}

#[tokio::test]
async fn export_then_coalesce_is_a_noop() {
  let dir = TempDir::new().unwrap();
  let table = seeded_links(
    &store().await,
    &dir,
    "url,domain,title\n\
     https://example.com/a,example.com,Hello\n\
     https://example.com/b,,\n",
  )
  .await;

  let first = export_string(&table, &dir, "export1.csv").await;
  table.coalesce(&dir.path().join("export1.csv")).await.unwrap();
  let second = export_string(&table, &dir, "export2.csv").await;

  assert_eq!(first, second);
  assert_eq!(table.row_count().await.unwrap(), 2);
}

#[tokio::test]
async fn export_has_full_column_set_and_header() {
  let dir = TempDir::new().unwrap();
  let table = seeded_links(&store().await, &dir, "url\nhttps://example.com/a\n").await;

  let exported = export_string(&table, &dir, "out.csv").await;
  let header = exported.lines().next().unwrap();
  assert!(header.starts_with("url,"));
  assert!(header.contains("facebook_like"));
  assert!(header.contains("youtube_watch"));
  assert_eq!(exported.lines().count(), 2);
}

// ─── shared_content ──────────────────────────────────────────────────────────

#[tokio::test]
async fn shared_content_composite_key_updates_only_target_row() {
  let dir = TempDir::new().unwrap();
  let s = store().await;
  let infile = write_csv(
    &dir,
    "shared.csv",
    "post_url,content_url\np1,i1\np1,i2\n",
  );
  let table = s
    .table(TableSchema::shared_content(), Some(&infile), None)
    .await
    .unwrap();

  let batch = write_csv(
    &dir,
    "batch.csv",
    "post_url,content_url,media_type\np1,i1,Image\n",
  );
  table.coalesce(&batch).await.unwrap();

  assert_eq!(table.row_count().await.unwrap(), 2);
  assert_eq!(
    table
      .select_value(&[("post_url", "p1"), ("content_url", "i1")], "media_type")
      .await
      .unwrap()
      .as_deref(),
    Some("Image")
  );
  assert_eq!(
    table
      .select_value(&[("post_url", "p1"), ("content_url", "i2")], "media_type")
      .await
      .unwrap(),
    None
  );
}

#[tokio::test]
async fn shared_content_table_creates_without_seed_file() {
  let s = store().await;
  let table = s
    .table(TableSchema::shared_content(), None, None)
    .await
    .unwrap();
  assert_eq!(table.row_count().await.unwrap(), 0);
}

// ─── Link identifier key extension ───────────────────────────────────────────

#[tokio::test]
async fn link_id_key_allows_same_url_under_distinct_ids() {
  let dir = TempDir::new().unwrap();
  let infile = write_csv(
    &dir,
    "in.csv",
    "url,link_id\n\
     https://example.com/a,r1\n\
     https://example.com/a,r2\n",
  );

  let table = store()
    .await
    .table(TableSchema::links_with_link_id(), Some(&infile), None)
    .await
    .unwrap();
  assert_eq!(table.row_count().await.unwrap(), 2);

  let batch = write_csv(
    &dir,
    "batch.csv",
    "url,link_id,title\nhttps://example.com/a,r1,Hello\n",
  );
  table.coalesce(&batch).await.unwrap();

  assert_eq!(
    table
      .select_value(
        &[("url", "https://example.com/a"), ("link_id", "r1")],
        "title"
      )
      .await
      .unwrap()
      .as_deref(),
    Some("Hello")
  );
  assert_eq!(
    table
      .select_value(
        &[("url", "https://example.com/a"), ("link_id", "r2")],
        "title"
      )
      .await
      .unwrap(),
    None
  );
}

// A merge file omitting a key column binds it NULL, and SQLite never treats
// NULL key components as conflicting: left through, every merge would insert
// a fresh (url, NULL) row. The batch is rejected instead.
#[tokio::test]
async fn coalesce_rejects_null_key_component() {
  let dir = TempDir::new().unwrap();
  let infile = write_csv(&dir, "in.csv", "url,link_id\nhttps://example.com/a,r1\n");
  let table = store()
    .await
    .table(TableSchema::links_with_link_id(), Some(&infile), None)
    .await
    .unwrap();

  let batch = write_csv(&dir, "batch.csv", "url,domain\nhttps://example.com/a,example.com\n");
  let err = table.coalesce(&batch).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Write { reason, .. } if reason.contains("link_id")
  ));

  // The rejected batch rolled back; no (url, NULL) row appeared.
  assert_eq!(table.row_count().await.unwrap(), 1);
}

#[tokio::test]
async fn seed_rejects_empty_key_component() {
  let dir = TempDir::new().unwrap();
  let infile = write_csv(
    &dir,
    "in.csv",
    "url,link_id\nhttps://example.com/a,r1\nhttps://example.com/b,\n",
  );

  let err = store()
    .await
    .table(TableSchema::links_with_link_id(), Some(&infile), None)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Write { reason, .. } if reason.contains("link_id")
  ));
}

#[tokio::test]
async fn targets_carry_link_ids() {
  let dir = TempDir::new().unwrap();
  let infile = write_csv(
    &dir,
    "in.csv",
    "url,link_id\n\
     https://example.com/a,r1\n\
     https://example.com/a,r2\n",
  );
  let table = store()
    .await
    .table(TableSchema::links_with_link_id(), Some(&infile), None)
    .await
    .unwrap();

  let mut targets = table.targets().await.unwrap();
  targets.sort_by(|a, b| a.link_id.cmp(&b.link_id));
  assert_eq!(targets.len(), 2);
  assert_eq!(targets[0].url, "https://example.com/a");
  assert_eq!(targets[0].link_id.as_deref(), Some("r1"));
  assert_eq!(targets[1].link_id.as_deref(), Some("r2"));

  // Without the key extension, targets carry no link identifier.
  let plain = seeded_links(&store().await, &dir, "url\nhttps://example.com/a\n").await;
  let targets = plain.targets().await.unwrap();
  assert_eq!(targets.len(), 1);
  assert_eq!(targets[0].link_id, None);
}
