//! Export formatters
//!
//! Single records are written with the store's own serializer so an exported
//! file can be read back as a library entry. Bulk reports flatten every record
//! into an [`ExportRow`] and render CSV or Markdown. Nothing here touches the
//! store.

use crate::error::{LibraryError, Result};
use crate::index::group_by_category;
use crate::record::{format_timestamp, slug, PromptRecord};
use crate::storage::write_atomic;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Bulk report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Csv,
    Markdown,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Markdown => "md",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "md" | "markdown" => Ok(ReportFormat::Markdown),
            other => Err(LibraryError::InvalidInput(format!(
                "unknown report format `{}` (expected csv or markdown)",
                other
            ))),
        }
    }
}

/// One flattened record in a bulk report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub id: String,
    pub title: String,
    pub category: String,
    pub tags: String,
    pub system: String,
    pub body: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    #[serde(rename = "usageCount")]
    pub usage_count: u64,
    pub author: String,
}

impl From<&PromptRecord> for ExportRow {
    fn from(record: &PromptRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            category: record.category.clone(),
            tags: record.tags.join(", "),
            system: record.system.clone().unwrap_or_default(),
            body: normalize_body(&record.body),
            created_at: format_timestamp(&record.meta.created_at),
            updated_at: format_timestamp(&record.meta.updated_at),
            usage_count: record.meta.usage_count,
            author: record.meta.author.clone(),
        }
    }
}

/// CRLF and lone CR become LF; surrounding whitespace is trimmed
pub fn normalize_body(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

pub fn rows(records: &[PromptRecord]) -> Vec<ExportRow> {
    records.iter().map(ExportRow::from).collect()
}

/// A single record in the persisted form
pub fn export_record(record: &PromptRecord) -> Result<String> {
    let mut clean = record.clone();
    clean.canonicalize();
    Ok(serde_json::to_string_pretty(&clean)?)
}

/// Default file name for a single-record export
pub fn default_file_name(record: &PromptRecord) -> String {
    let stem = slug(&record.title);
    if stem.is_empty() {
        format!("{}.json", record.id)
    } else {
        format!("{}.json", stem)
    }
}

/// Write a single record to `target`. A directory target gets the default
/// file name inside it. Returns the path written.
pub fn write_record_file(record: &PromptRecord, target: &Path) -> Result<PathBuf> {
    let path = if target.is_dir() {
        target.join(default_file_name(record))
    } else {
        target.to_path_buf()
    };
    write_atomic(&path, &export_record(record)?)?;
    Ok(path)
}

/// CSV with a header row, one line per record
pub fn to_csv(records: &[PromptRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows(records) {
        writer.serialize(row)?;
    }
    if records.is_empty() {
        writer.write_record([
            "id",
            "title",
            "category",
            "tags",
            "system",
            "body",
            "createdAt",
            "updatedAt",
            "usageCount",
            "author",
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| LibraryError::io("<csv>", e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| LibraryError::InvalidInput(e.to_string()))
}

/// Markdown document grouped by category
pub fn to_markdown(records: &[PromptRecord]) -> String {
    let mut out = String::from("# Prompt Library\n");
    let index = group_by_category(records);

    for group in index.iter() {
        let _ = write!(out, "\n## {}\n", group.name);
        for record in &group.records {
            let row = ExportRow::from(*record);
            let _ = write!(out, "\n### {}\n\n", row.title);
            let _ = writeln!(out, "- **id:** `{}`", row.id);
            if !row.tags.is_empty() {
                let _ = writeln!(out, "- **tags:** {}", row.tags);
            }
            let _ = writeln!(
                out,
                "- **created:** {} · **updated:** {} · **used:** {}",
                row.created_at, row.updated_at, row.usage_count
            );
            let _ = writeln!(out, "- **author:** {}", row.author);
            if !row.system.is_empty() {
                let _ = write!(out, "\n> {}\n", row.system.replace('\n', "\n> "));
            }
            let fence = code_fence(&row.body);
            let _ = write!(out, "\n{}\n{}\n{}\n", fence, row.body, fence);
        }
    }
    out
}

/// Render a bulk report and atomically write it to `path`
pub fn write_report(records: &[PromptRecord], format: ReportFormat, path: &Path) -> Result<()> {
    write_atomic(path, &report(records, format)?)
}

/// Backtick fence longer than any backtick run inside `body`
fn code_fence(body: &str) -> String {
    let longest = body
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

/// Render a bulk report in `format`
pub fn report(records: &[PromptRecord], format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Csv => to_csv(records),
        ReportFormat::Markdown => Ok(to_markdown(records)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::normalize_record;
    use tempfile::TempDir;

    fn sample() -> PromptRecord {
        PromptRecord::new(
            "code-review-1a2b3c4d".to_string(),
            "Code Review",
            "Dev",
            "Review this:\r\n\r\n{{code}}\r\n",
            vec!["review".to_string(), "rust".to_string()],
            Some("Be terse".to_string()),
            "local",
        )
    }

    #[test]
    fn test_export_round_trip() {
        let record = sample();
        let text = export_record(&record).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let parsed = normalize_record(0, value, "someone-else").unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_export_key_order() {
        let text = export_record(&sample()).unwrap();
        let id = text.find("\"id\"").unwrap();
        let title = text.find("\"title\"").unwrap();
        let meta = text.find("\"meta\"").unwrap();
        assert!(id < title && title < meta);
        assert!(text.contains("\n  \"title\": \"Code Review\""));
    }

    #[test]
    fn test_export_row_fields() {
        let mut record = sample();
        record.system = None;
        let row = ExportRow::from(&record);
        assert_eq!(row.tags, "review, rust");
        assert_eq!(row.system, "");
        assert_eq!(row.body, "Review this:\n\n{{code}}");
        assert_eq!(row.usage_count, 0);
    }

    #[test]
    fn test_csv_header_and_rows() {
        let csv = to_csv(&[sample()]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,title,category,tags,system,body,createdAt,updatedAt,usageCount,author"
        );
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "code-review-1a2b3c4d");
        assert_eq!(&record[3], "review, rust");
        assert_eq!(&record[5], "Review this:\n\n{{code}}");
    }

    #[test]
    fn test_csv_empty_collection_has_header() {
        let csv = to_csv(&[]).unwrap();
        assert!(csv.starts_with("id,title,"));
    }

    #[test]
    fn test_markdown_groups() {
        let md = to_markdown(&[sample()]);
        assert!(md.starts_with("# Prompt Library\n"));
        assert!(md.contains("\n## Dev\n"));
        assert!(md.contains("### Code Review"));
        assert!(md.contains("> Be terse"));
    }

    #[test]
    fn test_markdown_fence_outgrows_body_backticks() {
        assert_eq!(code_fence("plain"), "```");
        assert_eq!(code_fence("```rust\nfn main() {}\n```"), "````");

        let mut record = sample();
        record.body = "````\nnested\n````".to_string();
        let md = to_markdown(&[record]);
        assert!(md.contains("\n`````\n````\nnested\n````\n`````\n"));
        let fence_lines = md.lines().filter(|l| l.starts_with("```")).count();
        assert_eq!(fence_lines, 4);
    }

    #[test]
    fn test_write_record_into_directory() {
        let temp = TempDir::new().unwrap();
        let record = sample();
        let path = write_record_file(&record, temp.path()).unwrap();
        assert_eq!(path, temp.path().join("code-review.json"));
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text, export_record(&record).unwrap());
    }

    #[test]
    fn test_write_report_replaces_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("reports").join("library.csv");
        write_report(&[sample()], ReportFormat::Csv, &path).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        assert!(first.contains("code-review-1a2b3c4d"));

        write_report(&[], ReportFormat::Csv, &path).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        assert_eq!(second.lines().count(), 1);
    }

    #[test]
    fn test_report_format_parse() {
        assert_eq!("MD".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert!("pdf".parse::<ReportFormat>().is_err());
    }
}
