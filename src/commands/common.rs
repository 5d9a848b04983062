use anyhow::{Context, Result};
use colored::*;
use is_terminal::IsTerminal;
use std::io::Read;

use promptlib::edit::edit_content;
use promptlib::{Config, LibraryError, MatchResult, PromptRecord, Resolver, Store};

/// Resolve a user reference (id, title or near miss) to a record id
pub fn resolve_id(store: &Store, query: &str) -> Result<String> {
    match Resolver::new(store.records()).find(query) {
        MatchResult::Exact(record) => Ok(record.id.clone()),
        MatchResult::Multiple(candidates) => {
            let listing: Vec<String> = candidates
                .iter()
                .map(|r| format!("  {:<32} {}", r.id, r.title))
                .collect();
            Err(LibraryError::InvalidInput(format!(
                "'{}' matches several prompts:\n{}",
                query,
                listing.join("\n")
            ))
            .into())
        }
        MatchResult::None => Err(LibraryError::RecordNotFound(query.to_string()).into()),
    }
}

/// Record for a reference, see [`resolve_id`]
pub fn resolve<'a>(store: &'a Store, query: &str) -> Result<&'a PromptRecord> {
    let id = resolve_id(store, query)?;
    store
        .get(&id)
        .ok_or_else(|| LibraryError::RecordNotFound(id).into())
}

/// Body text from the flag, piped stdin, or the editor, in that order
pub fn read_body(
    config: &Config,
    body: Option<String>,
    edit: bool,
    initial: &str,
) -> Result<Option<String>> {
    if let Some(body) = body {
        return Ok(Some(body));
    }
    if edit {
        return edit_content(&config.editor(), initial).map(Some);
    }
    if !std::io::stdin().is_terminal() {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read prompt body from stdin")?;
        if !buffer.is_empty() {
            return Ok(Some(buffer));
        }
    }
    Ok(None)
}

/// Whether decorations (status lines, colour) belong on stdout
pub fn interactive() -> bool {
    std::io::stdout().is_terminal()
}

/// Status line with elapsed time, e.g. `✓ Added code-review (3ms)`
pub fn status(message: &str, start: std::time::Instant) {
    if interactive() {
        println!(
            "{} {} ({}ms)",
            "✓".green(),
            message,
            start.elapsed().as_millis()
        );
    } else {
        eprintln!("{} ({}ms)", message, start.elapsed().as_millis());
    }
}

/// First lines of a body for listings
pub fn preview(body: &str, width: usize) -> String {
    let line = body.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    if line.chars().count() > width {
        let cut: String = line.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    } else {
        line.to_string()
    }
}
