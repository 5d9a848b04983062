//! Loader-boundary document shapes and one-way migration
//!
//! Three shapes of library file exist in the wild. Only the flat array of
//! records is supported going forward; the two older shapes are recognised
//! here and converted into canonical records, never written back.

use crate::error::{LibraryError, Result};
use crate::record::{
    derive_id, normalize_record, normalize_tags, parse_timestamp, PromptRecord, UNCATEGORIZED,
    UNTITLED,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

const LEGACY_TITLE_MAX: usize = 60;
const UNSUPPORTED: &str = "unsupported document shape: expected an array of prompts";

/// A parsed library document, classified by shape
#[derive(Debug)]
pub enum LibraryDocument {
    /// Flat array of record-like objects (canonical)
    Records(Vec<Value>),
    /// `{"categories": [..], "prompts": [..]}` lists of plain strings
    Lists(ListsLibrary),
    /// `{"categories": {"name": [entry, ..]}}` keyed by category
    Paged(PagedLibrary),
}

/// Which shape a document had on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    Records,
    Lists,
    Paged,
}

impl DocumentShape {
    pub fn is_legacy(&self) -> bool {
        !matches!(self, DocumentShape::Records)
    }
}

impl fmt::Display for DocumentShape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DocumentShape::Records => write!(f, "records"),
            DocumentShape::Lists => write!(f, "category/prompt lists"),
            DocumentShape::Paged => write!(f, "paged categories"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListsLibrary {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub prompts: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PagedLibrary {
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<PagedEntry>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PagedEntry {
    pub title: Option<String>,
    pub description: Option<String>,
    pub text: Option<String>,
    pub use_case: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
    pub version: Option<String>,
    pub date: Option<String>,
}

/// Outcome of turning a document into canonical records
#[derive(Debug)]
pub struct Migration {
    pub shape: DocumentShape,
    pub records: Vec<PromptRecord>,
    /// Human-readable notes about data that has no place in the canonical schema
    pub dropped: Vec<String>,
}

impl LibraryDocument {
    /// Classify document text. The error string describes why the shape was
    /// rejected; callers attach the file path.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let value: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
        let map = match value {
            Value::Array(items) => return Ok(LibraryDocument::Records(items)),
            Value::Object(map) => map,
            _ => return Err(UNSUPPORTED.to_string()),
        };
        if map.contains_key("prompts") || matches!(map.get("categories"), Some(Value::Array(_))) {
            serde_json::from_value(Value::Object(map))
                .map(LibraryDocument::Lists)
                .map_err(|e| format!("invalid category/prompt lists: {}", e))
        } else if matches!(map.get("categories"), Some(Value::Object(_))) {
            serde_json::from_value(Value::Object(map))
                .map(LibraryDocument::Paged)
                .map_err(|e| format!("invalid paged categories: {}", e))
        } else {
            Err(UNSUPPORTED.to_string())
        }
    }

    pub fn shape(&self) -> DocumentShape {
        match self {
            LibraryDocument::Records(_) => DocumentShape::Records,
            LibraryDocument::Lists(_) => DocumentShape::Lists,
            LibraryDocument::Paged(_) => DocumentShape::Paged,
        }
    }

    /// Convert into canonical records, filling defaults with `author`
    pub fn into_records(self, author: &str) -> Result<Migration> {
        let shape = self.shape();
        let mut dropped = Vec::new();
        let records = match self {
            LibraryDocument::Records(items) => {
                let records = items
                    .into_iter()
                    .enumerate()
                    .map(|(index, value)| normalize_record(index, value, author))
                    .collect::<Result<Vec<_>>>()?;
                ensure_unique_ids(&records)?;
                records
            }
            LibraryDocument::Lists(lists) => migrate_lists(lists, author, &mut dropped),
            LibraryDocument::Paged(paged) => migrate_paged(paged, author, &mut dropped),
        };
        Ok(Migration {
            shape,
            records,
            dropped,
        })
    }
}

fn ensure_unique_ids(records: &[PromptRecord]) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, record) in records.iter().enumerate() {
        if !seen.insert(record.id.as_str()) {
            return Err(LibraryError::Validation {
                index,
                reason: format!("duplicate id `{}`", record.id),
            });
        }
    }
    Ok(())
}

fn migrate_lists(
    lists: ListsLibrary,
    author: &str,
    dropped: &mut Vec<String>,
) -> Vec<PromptRecord> {
    let mut records: Vec<PromptRecord> = Vec::new();
    for (position, prompt) in lists.prompts.iter().enumerate() {
        if prompt.trim().is_empty() {
            continue;
        }
        let title = legacy_title(prompt);
        let seed = format!("lists:{}:{}", position, prompt);
        let id = derive_id(&title, &seed, |candidate| {
            records.iter().any(|r| r.id == candidate)
        });
        records.push(PromptRecord::new(
            id,
            &title,
            UNCATEGORIZED,
            prompt,
            Vec::new(),
            None,
            author,
        ));
    }
    for category in lists.categories.iter().filter(|c| !c.trim().is_empty()) {
        dropped.push(format!("category `{}` has no prompts attached", category));
    }
    records
}

fn migrate_paged(
    paged: PagedLibrary,
    author: &str,
    dropped: &mut Vec<String>,
) -> Vec<PromptRecord> {
    let mut records: Vec<PromptRecord> = Vec::new();
    for (category, entries) in paged.categories {
        let category = if category.trim().is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            category
        };
        for (position, entry) in entries.into_iter().enumerate() {
            let title = entry
                .title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| UNTITLED.to_string());
            let seed = format!(
                "paged:{}:{}:{}",
                category,
                position,
                entry.text.as_deref().unwrap_or_default()
            );
            let id = derive_id(&title, &seed, |candidate| {
            records.iter().any(|r| r.id == candidate)
        });
            let mut record = PromptRecord::new(
                id,
                &title,
                &category,
                entry.text.as_deref().unwrap_or_default(),
                normalize_tags(entry.tags.as_deref().unwrap_or_default()),
                None,
                author,
            );
            if let Some(created) = entry.date.as_deref().and_then(parse_timestamp) {
                record.meta.created_at = created;
                record.meta.updated_at = created;
            }

            let lost: Vec<&str> = [
                ("description", &entry.description),
                ("use_case", &entry.use_case),
                ("version", &entry.version),
            ]
            .iter()
            .filter(|(_, value)| value.as_deref().is_some_and(|v| !v.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();
            if !lost.is_empty() {
                dropped.push(format!("`{}`: {} not kept", title, lost.join(", ")));
            }
            records.push(record);
        }
    }
    records
}

fn legacy_title(prompt: &str) -> String {
    let first_line = prompt
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or(UNTITLED);
    if first_line.chars().count() > LEGACY_TITLE_MAX {
        let cut: String = first_line.chars().take(LEGACY_TITLE_MAX - 1).collect();
        format!("{}…", cut.trim_end())
    } else {
        first_line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records_shape() {
        let doc = LibraryDocument::parse(r#"[{"title": "a"}]"#).unwrap();
        assert_eq!(doc.shape(), DocumentShape::Records);
        assert!(!doc.shape().is_legacy());
    }

    #[test]
    fn test_parse_rejects_unknown_shapes() {
        assert!(LibraryDocument::parse(r#"{"items": []}"#).is_err());
        assert!(LibraryDocument::parse("42").is_err());
        assert!(LibraryDocument::parse("{not json").is_err());
    }

    #[test]
    fn test_migrate_lists() {
        let text = concat!(
            r#"{"categories": ["Writing", "Code"], "#,
            r#""prompts": ["Act as {{role}}\nThen answer", "  "]}"#
        );
        let doc = LibraryDocument::parse(text).unwrap();
        assert_eq!(doc.shape(), DocumentShape::Lists);

        let migration = doc.into_records("local").unwrap();
        assert_eq!(migration.records.len(), 1);
        let record = &migration.records[0];
        assert_eq!(record.title, "Act as {{role}}");
        assert_eq!(record.body, "Act as {{role}}\nThen answer");
        assert_eq!(record.category, UNCATEGORIZED);
        assert_eq!(migration.dropped.len(), 2);
    }

    #[test]
    fn test_legacy_ids_repeat_across_loads() {
        let text = r#"{"categories": [], "prompts": ["Same", "Same", "Other"]}"#;
        let ids = |text: &str| -> Vec<String> {
            let migration = LibraryDocument::parse(text)
                .unwrap()
                .into_records("local")
                .unwrap();
            migration.records.into_iter().map(|r| r.id).collect()
        };
        let first = ids(text);
        assert_eq!(first, ids(text));
        assert_eq!(first.len(), 3);
        assert_ne!(first[0], first[1]);
    }

    #[test]
    fn test_migrate_paged() {
        let doc = LibraryDocument::parse(
            r#"{"categories": {"Research": [
                {"title": "Lit review", "text": "Summarize papers", "tags": ["Papers"],
                 "description": "for grad school", "date": "2023-09-01"},
                {"text": "no title here"}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(doc.shape(), DocumentShape::Paged);

        let migration = doc.into_records("local").unwrap();
        assert_eq!(migration.records.len(), 2);
        let first = &migration.records[0];
        assert_eq!(first.category, "Research");
        assert_eq!(first.body, "Summarize papers");
        assert_eq!(first.tags, vec!["papers"]);
        assert_eq!(
            crate::record::format_timestamp(&first.meta.created_at),
            "2023-09-01T00:00:00Z"
        );
        assert_eq!(migration.records[1].title, UNTITLED);
        assert_eq!(migration.dropped.len(), 1);
        assert!(migration.dropped[0].contains("description"));
    }

    #[test]
    fn test_empty_paged_document() {
        let doc = LibraryDocument::parse(r#"{"categories": {}}"#).unwrap();
        let migration = doc.into_records("local").unwrap();
        assert!(migration.records.is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let doc = LibraryDocument::parse(r#"[{"id": "a-1"}, {"id": "a-1"}]"#).unwrap();
        let err = doc.into_records("local").unwrap_err();
        assert!(matches!(err, LibraryError::Validation { index: 1, .. }));
    }

    #[test]
    fn test_legacy_title_truncates() {
        let long = "x".repeat(100);
        let title = legacy_title(&long);
        assert_eq!(title.chars().count(), LEGACY_TITLE_MAX);
    }
}
