//! Prompt records and the canonical schema
//!
//! A [`PromptRecord`] is the only shape the store persists. Documents read from
//! disk go through [`normalize_record`], a single validation pass that either
//! yields a fully populated record or a [`LibraryError::Validation`] naming the
//! offending entry. No other code path fills in defaults.

use crate::error::{LibraryError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Title used when a record has none
pub const UNTITLED: &str = "(untitled)";
/// Category used when a record has none
pub const UNCATEGORIZED: &str = "Uncategorized";
/// Author written into `meta.author` unless configured otherwise
pub const DEFAULT_AUTHOR: &str = "local";

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// One prompt entry with its metadata
///
/// Field order here is the persisted key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRecord {
    /// Stable identifier, `slug(title)-xxxxxxxx`, never regenerated
    pub id: String,
    pub title: String,
    /// Free-text grouping label
    pub category: String,
    /// Lower-cased, deduplicated once persisted
    pub tags: Vec<String>,
    /// Prompt text, may embed `{{token}}` markers
    pub body: String,
    /// Optional system-level instruction
    pub system: Option<String>,
    pub meta: RecordMeta,
}

/// Bookkeeping attached to every record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    /// Set once at creation
    pub created_at: DateTime<Utc>,
    /// Refreshed by every edit, never earlier than `created_at`
    pub updated_at: DateTime<Utc>,
    pub usage_count: u64,
    pub author: String,
}

impl PromptRecord {
    /// Build a brand new record stamped with the current time
    pub fn new(
        id: String,
        title: &str,
        category: &str,
        body: &str,
        tags: Vec<String>,
        system: Option<String>,
        author: &str,
    ) -> Self {
        let created = now();
        Self {
            id,
            title: title.to_string(),
            category: category.to_string(),
            tags,
            body: body.to_string(),
            system,
            meta: RecordMeta {
                created_at: created,
                updated_at: created,
                usage_count: 0,
                author: author.to_string(),
            },
        }
    }

    /// Bring the record to its persisted form: tags deduplicated and
    /// lower-cased, `updatedAt` no earlier than `createdAt`.
    ///
    /// Never touches `updatedAt` otherwise, so re-saving an unchanged record
    /// is a no-op.
    pub fn canonicalize(&mut self) {
        self.tags = normalize_tags(&self.tags);
        if self.meta.updated_at < self.meta.created_at {
            self.meta.updated_at = self.meta.created_at;
        }
    }

    /// Refresh `updatedAt` after an edit
    pub fn touch(&mut self) {
        let stamp = now();
        self.meta.updated_at = if stamp < self.meta.created_at {
            self.meta.created_at
        } else {
            stamp
        };
    }
}

/// Current time, truncated to microseconds so it survives a round trip
/// through the persisted text unchanged.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Render a timestamp exactly as the store persists it
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse a persisted timestamp.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` (taken as UTC) and a
/// bare `YYYY-MM-DD`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Lower-case, collapse everything outside `[a-z0-9]` into `-`
pub fn slug(text: &str) -> String {
    NON_SLUG
        .replace_all(&text.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Generate a fresh id for `title`, retrying while `taken` reports a clash
pub fn generate_id(title: &str, taken: impl Fn(&str) -> bool) -> String {
    let base = id_base(title);
    loop {
        let suffix = Uuid::new_v4().simple().to_string();
        let candidate = format!("{}-{}", base, &suffix[..8]);
        if !taken(&candidate) {
            return candidate;
        }
    }
}

/// Id for an entry read from disk without one.
///
/// The suffix is derived from `seed`, so loading the same document twice
/// yields the same id even when nothing is written back.
pub fn derive_id(title: &str, seed: &str, taken: impl Fn(&str) -> bool) -> String {
    let base = id_base(title);
    let mut attempt = 0u32;
    loop {
        let name = format!("{}\u{0}{}\u{0}{}", base, seed, attempt);
        let suffix = Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
            .simple()
            .to_string();
        let candidate = format!("{}-{}", base, &suffix[..8]);
        if !taken(&candidate) {
            return candidate;
        }
        attempt += 1;
    }
}

fn id_base(title: &str) -> String {
    let base = slug(title);
    if base.is_empty() {
        "prompt".to_string()
    } else {
        base
    }
}

/// Lower-case, trim and deduplicate tags keeping first-seen order
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Split a comma-separated tag field as typed by a user.
///
/// Casing is kept; deduplication happens when the record is persisted.
pub fn parse_tag_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Validate one record-like JSON value and fill in every missing field.
///
/// `index` is the position in the source document and is only used for
/// error messages. Unknown fields are dropped.
pub fn normalize_record(index: usize, value: Value, author: &str) -> Result<PromptRecord> {
    let mut obj = match value {
        Value::Object(obj) => obj,
        other => {
            return Err(invalid(
                index,
                format!("expected an object, found {}", json_type(&other)),
            ))
        }
    };

    let title = take_string(&mut obj, "title", index)?
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());
    let category = take_string(&mut obj, "category", index)?
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| UNCATEGORIZED.to_string());
    let body = take_string(&mut obj, "body", index)?.unwrap_or_default();
    let system = take_string(&mut obj, "system", index)?.filter(|s| !s.trim().is_empty());
    let tags = normalize_tags(&take_tags(&mut obj, index)?);
    let id = match take_string(&mut obj, "id", index)?.filter(|id| !id.trim().is_empty()) {
        Some(id) => id,
        None => derive_id(&title, &format!("{}:{}:{}", index, category, body), |_| false),
    };
    let meta = normalize_meta(index, obj.remove("meta"), author)?;

    Ok(PromptRecord {
        id,
        title,
        category,
        tags,
        body,
        system,
        meta,
    })
}

fn normalize_meta(index: usize, value: Option<Value>, author: &str) -> Result<RecordMeta> {
    let mut meta = match value {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(meta)) => meta,
        Some(other) => {
            return Err(invalid(
                index,
                format!("`meta` must be an object, found {}", json_type(&other)),
            ))
        }
    };

    let created_at = take_timestamp(&mut meta, "createdAt", index)?.unwrap_or_else(now);
    let updated_at = take_timestamp(&mut meta, "updatedAt", index)?
        .map(|ts| ts.max(created_at))
        .unwrap_or(created_at);
    let usage_count = match meta.remove("usageCount") {
        None | Some(Value::Null) => 0,
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| invalid(index, "`meta.usageCount` must be a non-negative integer"))?,
        Some(other) => {
            return Err(invalid(
                index,
                format!(
                    "`meta.usageCount` must be a number, found {}",
                    json_type(&other)
                ),
            ))
        }
    };
    let author = take_string(&mut meta, "author", index)?
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| author.to_string());

    Ok(RecordMeta {
        created_at,
        updated_at,
        usage_count,
        author,
    })
}

fn take_string(obj: &mut Map<String, Value>, field: &str, index: usize) -> Result<Option<String>> {
    match obj.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(invalid(
            index,
            format!("`{}` must be a string, found {}", field, json_type(&other)),
        )),
    }
}

fn take_tags(obj: &mut Map<String, Value>, index: usize) -> Result<Vec<String>> {
    match obj.remove("tags") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(tag) => Ok(tag),
                other => Err(invalid(
                    index,
                    format!("`tags` entries must be strings, found {}", json_type(&other)),
                )),
            })
            .collect(),
        Some(other) => Err(invalid(
            index,
            format!("`tags` must be an array, found {}", json_type(&other)),
        )),
    }
}

fn take_timestamp(
    meta: &mut Map<String, Value>,
    field: &str,
    index: usize,
) -> Result<Option<DateTime<Utc>>> {
    match take_string(meta, field, index)? {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| invalid(index, format!("`meta.{}` is not a timestamp: {}", field, raw))),
    }
}

fn invalid(index: usize, reason: impl Into<String>) -> LibraryError {
    LibraryError::Validation {
        index,
        reason: reason.into(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slug() {
        assert_eq!(slug("Refactor Helper"), "refactor-helper");
        assert_eq!(slug("  C++ / Rust!! "), "c-rust");
        assert_eq!(slug("***"), "");
    }

    #[test]
    fn test_generate_id_shape() {
        let id = generate_id("Code Review", |_| false);
        assert!(id.starts_with("code-review-"));
        assert_eq!(id.len(), "code-review-".len() + 8);
        assert!(id["code-review-".len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit()));

        let fallback = generate_id("!!!", |_| false);
        assert!(fallback.starts_with("prompt-"));
    }

    #[test]
    fn test_derive_id_is_stable() {
        let first = derive_id("No Id", "0:Dev:body", |_| false);
        let second = derive_id("No Id", "0:Dev:body", |_| false);
        assert_eq!(first, second);
        assert!(first.starts_with("no-id-"));
        assert_eq!(first.len(), "no-id-".len() + 8);

        let other = derive_id("No Id", "1:Dev:body", |_| false);
        assert_ne!(first, other);

        let retried = derive_id("No Id", "0:Dev:body", |candidate| candidate == first);
        assert_ne!(retried, first);
        assert!(retried.starts_with("no-id-"));
    }

    #[test]
    fn test_normalize_without_id_is_repeatable() {
        let value = json!({"title": "No Id", "body": "text"});
        let first = normalize_record(0, value.clone(), "local").unwrap();
        let second = normalize_record(0, value, "local").unwrap();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn test_normalize_tags() {
        assert_eq!(normalize_tags(&["Foo", "foo", "BAR"]), vec!["foo", "bar"]);
        assert_eq!(normalize_tags(&[" x ", "", "X"]), vec!["x"]);
    }

    #[test]
    fn test_parse_tag_list() {
        assert_eq!(parse_tag_list("a, B ,,c"), vec!["a", "B", "c"]);
        assert!(parse_tag_list("  ").is_empty());
    }

    #[test]
    fn test_normalize_fills_missing_fields() {
        let record = normalize_record(0, json!({}), "tester").unwrap();
        assert_eq!(record.title, UNTITLED);
        assert_eq!(record.category, UNCATEGORIZED);
        assert_eq!(record.body, "");
        assert!(record.tags.is_empty());
        assert_eq!(record.system, None);
        assert_eq!(record.meta.usage_count, 0);
        assert_eq!(record.meta.author, "tester");
        assert_eq!(record.meta.created_at, record.meta.updated_at);
        assert!(record.id.starts_with("untitled-"));
    }

    #[test]
    fn test_normalize_keeps_existing_fields_and_drops_unknown() {
        let value = json!({
            "id": "abc-123",
            "title": "Refactor Helper",
            "category": "Code",
            "tags": ["Rust", "rust", " CLI "],
            "body": "Refactor this",
            "system": "You are terse",
            "color": "red",
            "meta": {
                "createdAt": "2024-01-01T10:00:00Z",
                "updatedAt": "2024-02-01T10:00:00.123456Z",
                "usageCount": 7,
                "author": "kim"
            }
        });
        let record = normalize_record(3, value, "local").unwrap();
        assert_eq!(record.id, "abc-123");
        assert_eq!(record.tags, vec!["rust", "cli"]);
        assert_eq!(record.system.as_deref(), Some("You are terse"));
        assert_eq!(record.meta.usage_count, 7);
        assert_eq!(record.meta.author, "kim");
        assert_eq!(
            format_timestamp(&record.meta.updated_at),
            "2024-02-01T10:00:00.123456Z"
        );
    }

    #[test]
    fn test_normalize_clamps_updated_before_created() {
        let value = json!({
            "title": "t",
            "meta": {"createdAt": "2024-05-01", "updatedAt": "2024-01-01"}
        });
        let record = normalize_record(0, value, "local").unwrap();
        assert_eq!(record.meta.updated_at, record.meta.created_at);
    }

    #[test]
    fn test_normalize_rejects_bad_shapes() {
        let err = normalize_record(4, json!("just text"), "local").unwrap_err();
        assert!(matches!(err, LibraryError::Validation { index: 4, .. }));

        let err = normalize_record(0, json!({"tags": "a,b"}), "local").unwrap_err();
        assert!(err.to_string().contains("tags"));

        let err =
            normalize_record(0, json!({"meta": {"createdAt": "yesterday"}}), "local").unwrap_err();
        assert!(err.to_string().contains("createdAt"));

        let err = normalize_record(0, json!({"meta": {"usageCount": -1}}), "local").unwrap_err();
        assert!(err.to_string().contains("usageCount"));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-03-04T05:06:07+00:00").is_some());
        assert!(parse_timestamp("2024-03-04T05:06:07.5").is_some());
        assert!(parse_timestamp("2024-03-04").is_some());
        assert!(parse_timestamp("Unknown Date").is_none());
    }

    #[test]
    fn test_canonicalize_does_not_touch_updated_at() {
        let mut record = PromptRecord::new(
            "a-1".to_string(),
            "A",
            "X",
            "",
            vec!["Foo".into(), "foo".into(), "BAR".into()],
            None,
            "local",
        );
        let before = record.meta.updated_at;
        record.canonicalize();
        assert_eq!(record.tags, vec!["foo", "bar"]);
        assert_eq!(record.meta.updated_at, before);
    }

    #[test]
    fn test_serialized_key_order() {
        let record = PromptRecord::new("a-1".into(), "A", "X", "b", vec![], None, "local");
        let text = serde_json::to_string(&record).unwrap();
        let keys = [
            "\"id\"",
            "\"title\"",
            "\"category\"",
            "\"tags\"",
            "\"body\"",
            "\"system\"",
            "\"meta\"",
        ];
        let positions: Vec<usize> = keys
            .iter()
            .map(|key| text.find(key).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(text.contains("\"createdAt\""));
        assert!(text.contains("\"usageCount\":0"));
    }
}
