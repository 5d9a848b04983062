//! Command-line interface definitions and parsing
//!
//! Defines the `plib` command tree with clap derive. Handlers live in
//! `commands`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plib")]
#[command(version)]
#[command(about = "plib - a personal prompt library")]
#[command(after_help = "COMMANDS:

LIBRARY:
  init              Create an empty library file
  path              Show where the library and config live
  migrate           Rewrite a legacy library in the current format

PROMPTS:
  add, a, new       Create a prompt
  edit, e           Change a prompt (opens your editor without flags)
  delete, d, rm     Delete a prompt
  show, s           Display a prompt
  use, u            Render a prompt's placeholders and count the use

SEARCH:
  ls, l, list       List prompts grouped by category
  find, f           Search titles, bodies and tags
  suggest           Autocomplete a category, tag or title field

EXPORT:
  export            Write one prompt as JSON
  report            Write every prompt as CSV or Markdown

EXAMPLES:
  plib add \"Code Review\" -c Dev -t review,rust -b \"Review {{code}}\"
  echo \"Summarize {{topic}}\" | plib add Summary -c Writing
  plib use code-review --var code=\"$(cat main.rs)\"
  plib report --format markdown -o library.md

Run 'plib COMMAND --help' for more information on a command.")]
pub struct Cli {
    /// Library file to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Treat a missing library file as empty
    #[arg(long, global = true, conflicts_with = "strict")]
    pub lenient: bool,

    /// Fail when the library file is missing
    #[arg(long, global = true)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty library file
    Init,

    /// Show where the library and config live
    Path,

    /// Rewrite a legacy library document in the current format
    Migrate {
        /// Report what would change without writing
        #[arg(long = "dry-run")]
        dry_run: bool,
    },

    /// Create a prompt
    #[command(alias = "a", alias = "new")]
    Add {
        /// Title of the new prompt
        title: String,
        /// Category (defaults to Uncategorized)
        #[arg(short = 'c', long)]
        category: Option<String>,
        /// Comma-separated tags
        #[arg(short = 't', long)]
        tags: Option<String>,
        /// Prompt text; read from stdin when piped
        #[arg(short = 'b', long)]
        body: Option<String>,
        /// System instruction
        #[arg(long)]
        system: Option<String>,
        /// Write the body in your editor
        #[arg(short = 'e', long = "edit")]
        edit: bool,
    },

    /// Change a prompt; with no field flags the body opens in your editor
    #[command(alias = "e")]
    Edit {
        /// Id or title of the prompt
        query: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short = 'c', long)]
        category: Option<String>,
        /// Replace all tags (comma-separated)
        #[arg(short = 't', long)]
        tags: Option<String>,
        #[arg(short = 'b', long)]
        body: Option<String>,
        #[arg(long, conflicts_with = "no_system")]
        system: Option<String>,
        /// Remove the system instruction
        #[arg(long = "no-system")]
        no_system: bool,
    },

    /// Delete a prompt
    #[command(alias = "d", alias = "rm")]
    Delete {
        /// Id or title of the prompt
        query: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List prompts grouped by category
    #[command(alias = "l", alias = "list")]
    Ls {
        /// Only this category
        #[arg(short = 'c', long)]
        category: Option<String>,
        /// Only prompts whose title, body or tags contain this text
        #[arg(short = 'q', long)]
        query: Option<String>,
    },

    /// Search titles, bodies and tags
    #[command(alias = "f")]
    Find {
        /// Text to look for (case-insensitive)
        query: String,
    },

    /// Display a prompt
    #[command(alias = "s")]
    Show {
        /// Id or title of the prompt
        query: String,
        /// Print the stored JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a prompt's placeholders and count the use
    #[command(alias = "u")]
    Use {
        /// Id or title of the prompt
        query: String,
        /// Placeholder value as key=value (repeatable)
        #[arg(long = "var", value_name = "KEY=VALUE")]
        vars: Vec<String>,
        /// Include the system instruction above the body
        #[arg(long = "with-system")]
        with_system: bool,
    },

    /// Write one prompt as JSON
    Export {
        /// Id or title of the prompt
        query: String,
        /// Target file or directory; defaults to <title>.json here
        #[arg(short = 'o', long = "out", value_name = "PATH")]
        out: Option<PathBuf>,
        /// Print to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,
    },

    /// Write every prompt as CSV or Markdown
    Report {
        /// csv or markdown
        #[arg(long, default_value = "csv")]
        format: String,
        /// Target file; stdout when omitted
        #[arg(short = 'o', long = "out", value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Autocomplete a field from known values and placeholder tokens
    Suggest {
        #[arg(value_enum)]
        field: Field,
        /// Current field text
        #[arg(default_value = "")]
        text: String,
        /// Cursor position in characters; end of text when omitted
        #[arg(long)]
        cursor: Option<usize>,
        /// Accept the suggestion at this position and print the new field
        #[arg(long, value_name = "N")]
        accept: Option<usize>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Field {
    Category,
    Tag,
    Title,
    /// Free text; only placeholder tokens are offered
    Body,
}

/// Top-level command names and aliases, for typo suggestions
pub const COMMAND_NAMES: &[&str] = &[
    "init", "path", "migrate", "add", "a", "new", "edit", "e", "delete", "d", "rm", "ls", "l",
    "list", "find", "f", "show", "s", "use", "u", "export", "report", "suggest",
];
