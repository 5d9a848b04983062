//! promptlib - a personal prompt library
//!
//! A single user keeps reusable AI prompts in one JSON document. The crate
//! loads that document (including two legacy layouts), normalizes every
//! record, and persists the whole collection atomically after each change.
//!
//! # Quick Start
//!
//! ```no_run
//! use promptlib::{NewRecord, StartupPolicy, Store};
//!
//! let mut store = Store::open("prompts.json", StartupPolicy::Lenient, "local")?;
//! store.add(NewRecord {
//!     title: "Code Review".into(),
//!     category: "Dev".into(),
//!     body: "Review this as a {{role}}".into(),
//!     ..Default::default()
//! })?;
//!
//! for group in promptlib::group_by_category(store.records()).iter() {
//!     println!("{}: {}", group.name, group.len());
//! }
//! # Ok::<(), promptlib::LibraryError>(())
//! ```
//!
//! # Modules
//!
//! - [`storage`]: the [`Store`] and the on-disk document
//! - [`record`]: record schema, normalization, ids and tags
//! - [`migrate`]: legacy document shapes
//! - [`index`]: category grouping
//! - [`matching`]: query filter and record resolution
//! - [`suggest`]: field autocomplete
//! - [`template`]: `{{marker}}` rendering
//! - [`export`]: JSON, CSV and Markdown output

pub mod config;
pub mod edit;
pub mod error;
pub mod error_help;
pub mod export;
pub mod index;
pub mod logging;
pub mod matching;
pub mod migrate;
pub mod record;
pub mod storage;
pub mod suggest;
pub mod template;

pub use config::{base_dir, config_path, Config, EditorConfig};
pub use error::{ErrorKind, LibraryError, Result};
pub use export::{export_record, to_csv, to_markdown, write_report, ExportRow, ReportFormat};
pub use index::{group_by_category, CategoryGroup, CategoryIndex};
pub use logging::{init_logging, log_command_execution, log_storage_operation, LogConfig};
pub use matching::{filter, matching_indices, MatchResult, Resolver};
pub use migrate::{DocumentShape, LibraryDocument, Migration};
pub use record::{PromptRecord, RecordMeta};
pub use storage::{load, NewRecord, RecordPatch, StartupPolicy, Store};
pub use suggest::{accept, suggest, Suggestions, Token};
pub use template::TemplateProcessor;
