//! Writing collector output to intermediate CSV files.
//!
//! The sink always writes a header row matching the destination table's
//! standardized column set, so a pass that produced nothing still yields a
//! well-formed (headers-only) file that coalesces to a no-op. Record columns
//! outside the standardized set never reach the file.

use std::path::Path;

use lode_core::record::FlatRecord;

use crate::Result;

/// Write `records` to `path` under the standardized `columns` header.
pub fn write_records(path: &Path, columns: &[String], records: &[FlatRecord]) -> Result<()> {
  let mut writer = csv::Writer::from_path(path)?;
  writer.write_record(columns)?;
  for record in records {
    writer.write_record(columns.iter().map(|c| record.get(c).unwrap_or_default()))?;
  }
  writer.flush()?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use lode_core::record::{FlatRecord, Target};
  use tempfile::TempDir;

  fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
  }

  #[test]
  fn records_render_under_standardized_header() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.csv");

    let mut record = FlatRecord::for_target(&Target::new("https://example.com/a"));
    record.set("title", Some("Hello".to_string()));
    record.set("off_schema", Some("dropped".to_string()));

    write_records(&path, &columns(&["url", "title", "domain"]), &[record]).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, "url,title,domain\nhttps://example.com/a,Hello,\n");
  }

  #[test]
  fn empty_output_still_writes_headers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.csv");

    write_records(&path, &columns(&["url", "title"]), &[]).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, "url,title\n");
  }
}
