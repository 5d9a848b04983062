//! Storage layer for the prompt library
//!
//! The whole collection lives in one JSON document. [`Store`] owns the
//! in-memory copy; every mutating call rewrites the full document before it
//! returns, and rolls the in-memory copy back if that rewrite fails.

use crate::error::{LibraryError, Result};
use crate::logging::log_storage_operation;
use crate::migrate::{DocumentShape, LibraryDocument, Migration};
use crate::record::{generate_id, PromptRecord, DEFAULT_AUTHOR};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{info, warn};

const BOM: char = '\u{feff}';

/// What to do when the library file is missing at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartupPolicy {
    /// Missing file is a `NotFound` error; nothing is created implicitly
    #[default]
    Strict,
    /// Missing file means an empty library, created on first mutation
    Lenient,
}

impl FromStr for StartupPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(StartupPolicy::Strict),
            "lenient" => Ok(StartupPolicy::Lenient),
            other => Err(format!(
                "unknown startup policy '{}', expected strict or lenient",
                other
            )),
        }
    }
}

impl fmt::Display for StartupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StartupPolicy::Strict => write!(f, "strict"),
            StartupPolicy::Lenient => write!(f, "lenient"),
        }
    }
}

/// Fields supplied when creating a record
#[derive(Debug, Clone, Default)]
pub struct NewRecord {
    pub title: String,
    pub category: String,
    pub body: String,
    pub tags: Vec<String>,
    pub system: Option<String>,
}

/// Field changes applied by [`Store::update`]; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub title: Option<String>,
    pub category: Option<String>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
    /// `Some(None)` clears the system instruction
    pub system: Option<Option<String>>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.body.is_none()
            && self.tags.is_none()
            && self.system.is_none()
    }
}

/// Read and normalize the library document at `path`.
///
/// A leading byte-order mark is ignored. Legacy document shapes are migrated
/// in memory; nothing is written back.
pub fn load(path: &Path, author: &str) -> Result<Migration> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LibraryError::LibraryNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(LibraryError::io(path, e)),
    };
    let text = text.strip_prefix(BOM).unwrap_or(&text);

    let document = LibraryDocument::parse(text).map_err(|reason| LibraryError::Parse {
        path: path.to_path_buf(),
        reason,
    })?;
    document.into_records(author)
}

/// Serialize records in their persisted form: canonical key order, two-space
/// indentation, non-ASCII text left unescaped.
pub fn to_document(records: &[PromptRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Canonicalize and atomically rewrite the whole document at `path`.
///
/// Returns the canonical records that were written.
pub fn save(path: &Path, records: &[PromptRecord]) -> Result<Vec<PromptRecord>> {
    let mut clean = records.to_vec();
    for record in &mut clean {
        record.canonicalize();
    }
    write_atomic(path, &to_document(&clean)?)?;
    Ok(clean)
}

/// Write `contents` to a temp file beside `path`, then rename it over `path`.
///
/// The previous file stays intact if anything fails before the rename.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| LibraryError::io(&dir, e))?;

    let mut temp = NamedTempFile::new_in(&dir).map_err(|e| LibraryError::io(&dir, e))?;
    temp.write_all(contents.as_bytes())
        .map_err(|e| LibraryError::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| LibraryError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| LibraryError::io(path, e.error))?;
    Ok(())
}

/// Owner of the in-memory prompt collection and its backing file
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    records: Vec<PromptRecord>,
    author: String,
    shape: DocumentShape,
    dropped: Vec<String>,
}

impl Store {
    /// Load the library at `path` according to `policy`.
    ///
    /// # Errors
    ///
    /// `LibraryNotFound` when the file is absent under [`StartupPolicy::Strict`];
    /// parse and validation errors in either mode. The file is never touched.
    pub fn open(path: impl Into<PathBuf>, policy: StartupPolicy, author: &str) -> Result<Self> {
        let path = path.into();
        let start = Instant::now();

        let migration = match load(&path, author) {
            Ok(migration) => migration,
            Err(LibraryError::LibraryNotFound { .. }) if policy == StartupPolicy::Lenient => {
                info!(path = %path.display(), "Library file missing, starting empty");
                return Ok(Self::from_records(path, Vec::new(), author));
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    category = e.category(),
                    error = %e,
                    "Failed to load library"
                );
                log_storage_operation("load", None, false, Some(elapsed_ms(start)));
                return Err(e);
            }
        };

        if migration.shape.is_legacy() {
            warn!(
                path = %path.display(),
                shape = %migration.shape,
                records = migration.records.len(),
                "Legacy library document migrated in memory; it is rewritten on the next change"
            );
        }
        for note in &migration.dropped {
            warn!(note = %note, "Legacy data dropped during migration");
        }
        log_storage_operation("load", None, true, Some(elapsed_ms(start)));

        Ok(Self {
            path,
            records: migration.records,
            author: author.to_string(),
            shape: migration.shape,
            dropped: migration.dropped,
        })
    }

    /// Wrap an already loaded collection
    pub fn from_records(
        path: impl Into<PathBuf>,
        records: Vec<PromptRecord>,
        author: &str,
    ) -> Self {
        Self {
            path: path.into(),
            records,
            author: author.to_string(),
            shape: DocumentShape::Records,
            dropped: Vec::new(),
        }
    }

    /// Create an empty library file at `path`.
    ///
    /// Returns `false` without touching anything if the file already exists.
    pub fn init(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        write_atomic(path, &to_document(&[])?)?;
        info!(path = %path.display(), "Created empty library");
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// Shape of the document this store was loaded from
    pub fn source_shape(&self) -> DocumentShape {
        self.shape
    }

    /// Legacy data that had no place in the canonical schema when loaded
    pub fn migration_notes(&self) -> &[String] {
        &self.dropped
    }

    pub fn records(&self) -> &[PromptRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PromptRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| LibraryError::RecordNotFound(id.to_string()))
    }

    /// Distinct category names, sorted case-insensitively
    pub fn known_categories(&self) -> Vec<String> {
        sorted_distinct(self.records.iter().map(|r| r.category.as_str()))
    }

    /// Distinct titles, sorted case-insensitively
    pub fn known_titles(&self) -> Vec<String> {
        sorted_distinct(self.records.iter().map(|r| r.title.as_str()))
    }

    /// Distinct tags across all records, sorted
    pub fn known_tags(&self) -> Vec<String> {
        sorted_distinct(
            self.records
                .iter()
                .flat_map(|r| r.tags.iter().map(String::as_str)),
        )
    }

    /// Rewrite the backing file from memory without editing anything.
    ///
    /// `updatedAt` is left alone; only tag normalization can change.
    pub fn save(&mut self) -> Result<()> {
        let start = Instant::now();
        let result = save(&self.path, &self.records);
        log_storage_operation("save", None, result.is_ok(), Some(elapsed_ms(start)));
        self.records = result?;
        self.shape = DocumentShape::Records;
        self.dropped.clear();
        Ok(())
    }

    /// Replace memory with the current contents of the backing file
    pub fn reload(&mut self) -> Result<()> {
        let migration = load(&self.path, &self.author)?;
        self.records = migration.records;
        self.shape = migration.shape;
        self.dropped = migration.dropped;
        Ok(())
    }

    /// Create a record and persist the collection.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when the title or category is blank.
    pub fn add(&mut self, new: NewRecord) -> Result<&PromptRecord> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(LibraryError::InvalidInput("title is required".to_string()));
        }
        let category = new.category.trim();
        if category.is_empty() {
            return Err(LibraryError::InvalidInput(
                "category is required".to_string(),
            ));
        }

        let start = Instant::now();
        let id = generate_id(title, |candidate| self.get(candidate).is_some());
        let system = new.system.filter(|s| !s.trim().is_empty());
        let record = PromptRecord::new(
            id.clone(),
            title,
            category,
            &new.body,
            new.tags,
            system,
            &self.author,
        );
        self.records.push(record);

        if let Err(e) = self.save() {
            self.records.pop();
            log_storage_operation("add", Some(&id), false, Some(elapsed_ms(start)));
            return Err(e);
        }
        log_storage_operation("add", Some(&id), true, Some(elapsed_ms(start)));

        let pos = self.position(&id)?;
        Ok(&self.records[pos])
    }

    /// Apply `patch` to the record with `id`, refresh `updatedAt`, persist.
    ///
    /// An empty patch changes nothing and writes nothing.
    ///
    /// # Errors
    ///
    /// `RecordNotFound` for an unknown id, `InvalidInput` when the patch would
    /// blank the title or category.
    pub fn update(&mut self, id: &str, patch: RecordPatch) -> Result<&PromptRecord> {
        let pos = self.position(id)?;
        if patch.is_empty() {
            return Ok(&self.records[pos]);
        }
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(LibraryError::InvalidInput("title cannot be empty".to_string()));
        }
        if patch.category.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(LibraryError::InvalidInput(
                "category cannot be empty".to_string(),
            ));
        }

        let start = Instant::now();
        let snapshot = self.records[pos].clone();
        let record = &mut self.records[pos];
        if let Some(title) = patch.title {
            record.title = title.trim().to_string();
        }
        if let Some(category) = patch.category {
            record.category = category.trim().to_string();
        }
        if let Some(body) = patch.body {
            record.body = body;
        }
        if let Some(tags) = patch.tags {
            record.tags = tags;
        }
        if let Some(system) = patch.system {
            record.system = system.filter(|s| !s.trim().is_empty());
        }
        record.touch();

        if let Err(e) = self.save() {
            self.records[pos] = snapshot;
            log_storage_operation("update", Some(id), false, Some(elapsed_ms(start)));
            return Err(e);
        }
        log_storage_operation("update", Some(id), true, Some(elapsed_ms(start)));
        Ok(&self.records[pos])
    }

    /// Remove the record with `id` if present and persist either way.
    ///
    /// Returns whether a record was removed.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let start = Instant::now();
        let found = self.records.iter().position(|r| r.id == id);
        let removed = found.map(|pos| (pos, self.records.remove(pos)));

        if let Err(e) = self.save() {
            if let Some((pos, record)) = removed {
                self.records.insert(pos, record);
            }
            log_storage_operation("delete", Some(id), false, Some(elapsed_ms(start)));
            return Err(e);
        }
        log_storage_operation("delete", Some(id), true, Some(elapsed_ms(start)));
        Ok(removed.is_some())
    }

    /// Count one use of a record and persist. Not an edit: `updatedAt` stays.
    pub fn record_usage(&mut self, id: &str) -> Result<&PromptRecord> {
        let pos = self.position(id)?;
        let start = Instant::now();
        self.records[pos].meta.usage_count += 1;

        if let Err(e) = self.save() {
            self.records[pos].meta.usage_count -= 1;
            log_storage_operation("use", Some(id), false, Some(elapsed_ms(start)));
            return Err(e);
        }
        log_storage_operation("use", Some(id), true, Some(elapsed_ms(start)));
        Ok(&self.records[pos])
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::from_records("prompts.json", Vec::new(), DEFAULT_AUTHOR)
    }
}

fn sorted_distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out.sort_by_key(|v| v.to_lowercase());
    out
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
