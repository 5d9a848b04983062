//! Placeholder substitution for prompt bodies
//!
//! Bodies carry `{{name}}` markers. `date` and `username` have built-in
//! values; every other name must be supplied by the caller. Markers with no
//! value are left exactly as written.

use crate::error::{LibraryError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::env;

static MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").unwrap());

/// Marker renderer for prompt bodies
#[derive(Debug, Clone, Default)]
pub struct TemplateProcessor {
    values: HashMap<String, String>,
    username: Option<String>,
}

impl TemplateProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name used for `{{username}}` ahead of `$USER` / `$USERNAME`
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username.filter(|u| !u.trim().is_empty());
        self
    }

    pub fn set_variable(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_string(), value.to_string());
    }

    /// Add a `key=value` assignment as typed on the command line
    pub fn set_assignment(&mut self, assignment: &str) -> Result<()> {
        let (name, value) = parse_assignment(assignment)?;
        self.values.insert(name, value);
        Ok(())
    }

    /// Value a marker would render to, if any
    pub fn resolve(&self, name: &str) -> Option<String> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        match name {
            "date" => Some(chrono::Local::now().format("%Y-%m-%d").to_string()),
            "username" => self.username.clone().or_else(system_username),
            _ => None,
        }
    }

    /// Replace every marker that has a value
    pub fn render(&self, body: &str) -> String {
        MARKER
            .replace_all(body, |caps: &regex::Captures| {
                self.resolve(&caps[1]).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// Marker names in `body` that would survive rendering
    pub fn unresolved(&self, body: &str) -> Vec<String> {
        markers(body)
            .into_iter()
            .filter(|name| self.resolve(name).is_none())
            .collect()
    }
}

/// Render `body` with caller supplied values plus the built-in ones
pub fn render(body: &str, values: &HashMap<String, String>) -> String {
    let mut processor = TemplateProcessor::new();
    for (name, value) in values {
        processor.set_variable(name, value);
    }
    processor.render(body)
}

/// Distinct marker names in order of first appearance
pub fn markers(body: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in MARKER.captures_iter(body) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Split `key=value`; the key must be non-blank
pub fn parse_assignment(assignment: &str) -> Result<(String, String)> {
    match assignment.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(LibraryError::InvalidInput(format!(
            "expected key=value, got `{}`",
            assignment
        ))),
    }
}

fn system_username() -> Option<String> {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .ok()
        .filter(|u| !u.is_empty())
}
