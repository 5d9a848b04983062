//! User-facing error messages
//!
//! Turns [`LibraryError`]s into coloured text with a suggestion for what to
//! run next.

use colored::*;
use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};
use std::path::Path;

use crate::error::LibraryError;
use crate::record::PromptRecord;

/// Render any library error for the terminal
pub fn describe(error: &LibraryError, records: &[PromptRecord]) -> String {
    match error {
        LibraryError::LibraryNotFound { path } => format_library_not_found(path),
        LibraryError::RecordNotFound(query) => format_record_not_found(query, records),
        LibraryError::Parse { path, reason } => format_parse_error(path, reason),
        LibraryError::Validation { index, reason } => {
            format_parse_error(Path::new("library"), &format!("entry {}: {}", index, reason))
        }
        other => format!("Error: {}\n", other).red().to_string(),
    }
}

/// Render a command failure, using the library error inside it when present
pub fn explain(error: &anyhow::Error, records: &[PromptRecord]) -> String {
    match error.downcast_ref::<LibraryError>() {
        Some(e) => describe(e, records),
        None => format!("Error: {:#}\n", error).red().to_string(),
    }
}

/// Format a "prompt not found" error with close ids and titles
pub fn format_record_not_found(query: &str, records: &[PromptRecord]) -> String {
    let mut message = format!("Error: Prompt '{}' not found\n\n", query)
        .red()
        .to_string();

    let matcher = SkimMatcherV2::default();
    let mut suggestions: Vec<(&PromptRecord, i64)> = records
        .iter()
        .filter_map(|r| {
            let score = matcher
                .fuzzy_match(&r.id, query)
                .max(matcher.fuzzy_match(&r.title, query))?;
            Some((r, score))
        })
        .collect();
    suggestions.sort_by(|a, b| b.1.cmp(&a.1));

    if !suggestions.is_empty() {
        message.push_str(&"Did you mean one of these?\n".yellow().to_string());
        for (record, _) in suggestions.iter().take(3) {
            message.push_str(&format!("  - {} ({})\n", record.title, record.id.dimmed()));
        }
        message.push('\n');
    }

    message.push_str(&format!(
        "Try '{}' to see all prompts or '{}' to search.\n",
        "plib ls".cyan(),
        format!("plib find {}", query).cyan()
    ));

    message
}

/// Format a missing library file under the strict startup policy
pub fn format_library_not_found(path: &Path) -> String {
    let mut message = format!("Error: Library file not found: '{}'\n\n", path.display())
        .red()
        .to_string();

    message.push_str("To fix this:\n");
    message.push_str(&format!(
        "  - Create an empty library: {}\n",
        "plib init".cyan()
    ));
    message.push_str(&format!(
        "  - Or start without one: {}\n",
        "plib --lenient ...".cyan()
    ));
    message.push_str(&format!(
        "  - Or point at another file: {}\n",
        "plib --file path/to/prompts.json ...".cyan()
    ));

    message
}

/// Format a library document that could not be read
pub fn format_parse_error(path: &Path, reason: &str) -> String {
    let mut message = format!("Error: Could not read library '{}'\n", path.display())
        .red()
        .to_string();

    message.push_str(&format!("{}\n\n", reason));
    message.push_str(&"The file was left untouched.\n".yellow().to_string());
    message.push_str("Expected format:\n");
    message.push_str(&"[\n".dimmed().to_string());
    let example = concat!(
        "  {\"id\": \"...\", \"title\": \"...\", \"category\": \"...\", ",
        "\"tags\": [], \"body\": \"...\"}\n"
    );
    message.push_str(&example.green().to_string());
    message.push_str(&"]\n".dimmed().to_string());

    message
}

/// Format a command typo error with suggestions
pub fn format_command_typo(command: &str, available_commands: &[&str]) -> String {
    let mut message = format!("Error: Unknown command '{}'\n\n", command)
        .red()
        .to_string();

    if command == "plib" {
        message.push_str(&format!(
            "{}\n\n",
            "Did you type 'plib plib'? Try removing the extra 'plib'.".yellow()
        ));
    } else {
        let matcher = SkimMatcherV2::default();
        let mut suggestions: Vec<(&str, i64)> = available_commands
            .iter()
            .filter_map(|&cmd| matcher.fuzzy_match(cmd, command).map(|score| (cmd, score)))
            .collect();
        suggestions.sort_by(|a, b| b.1.cmp(&a.1));

        if !suggestions.is_empty() && suggestions[0].1 > 50 {
            message.push_str(
                &format!("Did you mean '{}'?\n\n", suggestions[0].0)
                    .yellow()
                    .to_string(),
            );
        }
    }

    message.push_str("Available commands:\n");
    for cmd in available_commands {
        message.push_str(&format!("  {}\n", cmd));
    }

    message.push_str(&format!(
        "\nRun '{}' for more information\n",
        "plib --help".cyan()
    ));

    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_not_found_suggests_close_titles() {
        colored::control::set_override(false);
        let records = vec![PromptRecord::new(
            "commit-message-0a1b2c3d".to_string(),
            "Commit Message",
            "Dev",
            "",
            vec![],
            None,
            "local",
        )];
        let message = format_record_not_found("commit", &records);
        assert!(message.contains("Prompt 'commit' not found"));
        assert!(message.contains("Commit Message"));
        assert!(message.contains("plib find commit"));
    }

    #[test]
    fn test_library_not_found_mentions_init() {
        colored::control::set_override(false);
        let message = format_library_not_found(Path::new("/tmp/prompts.json"));
        assert!(message.contains("/tmp/prompts.json"));
        assert!(message.contains("plib init"));
        assert!(message.contains("--lenient"));
    }

    #[test]
    fn test_describe_falls_back_to_display() {
        colored::control::set_override(false);
        let message = describe(&LibraryError::InvalidInput("title is empty".into()), &[]);
        assert!(message.contains("title is empty"));
    }
}
