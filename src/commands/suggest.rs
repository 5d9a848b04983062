// Field autocomplete from the command line

use anyhow::Result;
use colored::*;

use super::common::interactive;
use crate::cli::Field;
use promptlib::suggest::{accept, suggest};
use promptlib::{Config, LibraryError, Store};

fn known_values(store: &Store, field: Field) -> Vec<String> {
    match field {
        Field::Category => store.known_categories(),
        Field::Tag => store.known_tags(),
        Field::Title => store.known_titles(),
        Field::Body => Vec::new(),
    }
}

pub fn handle_suggest(
    store: &Store,
    config: &Config,
    field: Field,
    text: &str,
    cursor: Option<usize>,
    choice: Option<usize>,
) -> Result<()> {
    let cursor = cursor.unwrap_or_else(|| text.chars().count());
    let known = known_values(store, field);
    let suggestions = suggest(text, cursor, &known, &config.tokens, config.max_suggestions);

    if let Some(n) = choice {
        let picked = suggestions.items.get(n).ok_or_else(|| {
            LibraryError::InvalidInput(format!(
                "no suggestion at position {} ({} available)",
                n,
                suggestions.len()
            ))
        })?;
        let accepted = accept(text, cursor, &picked.text);
        println!("{}", accepted.text);
        if interactive() {
            eprintln!("{}", format!("cursor at {}", accepted.cursor).dimmed());
        }
        return Ok(());
    }

    for (i, item) in suggestions.items.iter().enumerate() {
        if !interactive() {
            println!("{}", item.text);
        } else if item.help.is_empty() {
            println!("{:>2}  {}", i, item.text.bold());
        } else {
            println!("{:>2}  {:<16} {}", i, item.text.bold(), item.help.dimmed());
        }
    }
    Ok(())
}
