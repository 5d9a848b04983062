//! Autocomplete for category, tag and title fields
//!
//! Everything here is a pure function of the field text, the cursor and the
//! known vocabulary; a front end only renders the [`Suggestions`] it gets back.
//! Cursor positions count characters, not bytes.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Upper bound on suggestions shown at once
pub const DEFAULT_MAX_SUGGESTIONS: usize = 10;

const TOKEN_OPEN: &str = "{{";

/// A placeholder marker offered after `{{`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Full marker text, e.g. `{{role}}`
    pub marker: String,
    #[serde(default)]
    pub help: String,
}

impl Token {
    pub fn new(marker: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            help: help.into(),
        }
    }
}

/// Built-in token vocabulary
pub fn default_tokens() -> Vec<Token> {
    vec![
        Token::new(
            "{{role}}",
            "The role of the assistant (e.g. teacher, coder, mentor)",
        ),
        Token::new(
            "{{profile}}",
            "Profile of the user (background info to tailor responses)",
        ),
        Token::new("{{date}}", "Current date"),
        Token::new("{{username}}", "The user's name"),
    ]
}

/// Why a suggestion list was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// `{{` sits right before the cursor
    Token,
    /// Plain text matched against known values
    Value,
}

/// One entry in the suggestion list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    /// Help text for tokens, empty for values
    pub help: String,
}

/// Suggestions for a field plus keyboard-style navigation over them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestions {
    pub context: Context,
    pub items: Vec<Suggestion>,
    active: Option<usize>,
}

impl Suggestions {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.items.iter().map(|s| s.text.as_str()).collect()
    }

    /// Currently highlighted entry, if any
    pub fn active(&self) -> Option<&Suggestion> {
        self.active.and_then(|i| self.items.get(i))
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Move the highlight down, wrapping to the top
    pub fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.active = Some(match self.active {
            Some(i) => (i + 1) % self.items.len(),
            None => 0,
        });
    }

    /// Move the highlight up, wrapping to the bottom
    pub fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let last = self.items.len() - 1;
        self.active = Some(match self.active {
            Some(0) | None => last,
            Some(i) => i - 1,
        });
    }
}

/// Field text and cursor after a suggestion was accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub text: String,
    pub cursor: usize,
}

fn byte_offset(text: &str, cursor: usize) -> usize {
    text.char_indices()
        .nth(cursor)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

fn context_at(text: &str, cursor: usize) -> Context {
    if text[..byte_offset(text, cursor)].ends_with(TOKEN_OPEN) {
        Context::Token
    } else {
        Context::Value
    }
}

/// Compute suggestions for `text` with the cursor at `cursor`.
///
/// Right after `{{` the token vocabulary is offered in its configured order.
/// Otherwise known values containing the whole field text (case-insensitive)
/// are offered in case-insensitive sorted order; an empty field offers none.
/// The list is cut to `max` entries.
pub fn suggest<S: AsRef<str>>(
    text: &str,
    cursor: usize,
    known: &[S],
    tokens: &[Token],
    max: usize,
) -> Suggestions {
    let context = context_at(text, cursor);
    let items: Vec<Suggestion> = match context {
        Context::Token => tokens
            .iter()
            .take(max)
            .map(|t| Suggestion {
                text: t.marker.clone(),
                help: t.help.clone(),
            })
            .collect(),
        Context::Value => {
            let needle = text.to_lowercase();
            if needle.is_empty() {
                Vec::new()
            } else {
                let mut seen = HashSet::new();
                let mut values: Vec<&str> = known
                    .iter()
                    .map(AsRef::as_ref)
                    .filter(|v| seen.insert(*v))
                    .collect();
                values.sort_by_key(|v| v.to_lowercase());
                values
                    .into_iter()
                    .filter(|v| v.to_lowercase().contains(&needle))
                    .take(max)
                    .map(|v| Suggestion {
                        text: v.to_string(),
                        help: String::new(),
                    })
                    .collect()
            }
        }
    };

    Suggestions {
        context,
        items,
        active: None,
    }
}

/// Apply `choice` to the field.
///
/// Token context drops the `{{` before the cursor and inserts the marker,
/// leaving the cursor after it. Value context replaces the whole field.
pub fn accept(text: &str, cursor: usize, choice: &str) -> Accepted {
    match context_at(text, cursor) {
        Context::Token => {
            let at = byte_offset(text, cursor);
            let before = &text[..at - TOKEN_OPEN.len()];
            let after = &text[at..];
            Accepted {
                text: format!("{}{}{}", before, choice, after),
                cursor: before.chars().count() + choice.chars().count(),
            }
        }
        Context::Value => Accepted {
            text: choice.to_string(),
            cursor: choice.chars().count(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: [&str; 2] = ["Teacher", "Coder"];

    #[test]
    fn test_value_suggestions() {
        let s = suggest("co", 2, &KNOWN, &default_tokens(), 10);
        assert_eq!(s.context, Context::Value);
        assert_eq!(s.texts(), vec!["Coder"]);
    }

    #[test]
    fn test_value_suggestions_sorted_case_insensitive() {
        let known = ["beta", "Alpha", "alphabet", "Gamma"];
        let s = suggest("A", 1, &known, &[], 10);
        assert_eq!(s.texts(), vec!["Alpha", "alphabet", "beta", "Gamma"]);
    }

    #[test]
    fn test_duplicate_known_values_suggested_once() {
        let known = ["a", "A", "a"];
        let suggestions = suggest("a", 1, &known, &default_tokens(), DEFAULT_MAX_SUGGESTIONS);
        assert_eq!(suggestions.texts(), vec!["a", "A"]);
    }

    #[test]
    fn test_empty_text_has_no_value_suggestions() {
        assert!(suggest("", 0, &KNOWN, &default_tokens(), 10).is_empty());
    }

    #[test]
    fn test_token_context() {
        let tokens = default_tokens();
        let s = suggest("Act as {{", 9, &KNOWN, &tokens, 10);
        assert_eq!(s.context, Context::Token);
        assert_eq!(
            s.texts(),
            vec!["{{role}}", "{{profile}}", "{{date}}", "{{username}}"]
        );
        assert!(s.items[0].help.contains("assistant"));
    }

    #[test]
    fn test_token_context_depends_on_cursor() {
        let s = suggest("{{ later", 8, &KNOWN, &default_tokens(), 10);
        assert_eq!(s.context, Context::Value);
        let s = suggest("{{ later", 2, &KNOWN, &default_tokens(), 10);
        assert_eq!(s.context, Context::Token);
    }

    #[test]
    fn test_cursor_clamped() {
        let s = suggest("x{{", 99, &KNOWN, &default_tokens(), 10);
        assert_eq!(s.context, Context::Token);
    }

    #[test]
    fn test_truncated_to_max() {
        let known: Vec<String> = (0..20).map(|i| format!("tag{:02}", i)).collect();
        assert_eq!(suggest("tag", 3, &known, &[], 10).len(), 10);
        assert_eq!(suggest("tag", 3, &known, &[], 3).len(), 3);
    }

    #[test]
    fn test_accept_token() {
        let accepted = accept("Hi {{ there", 5, "{{role}}");
        assert_eq!(accepted.text, "Hi {{role}} there");
        assert_eq!(accepted.cursor, 11);
    }

    #[test]
    fn test_accept_token_multibyte() {
        let accepted = accept("é{{", 3, "{{date}}");
        assert_eq!(accepted.text, "é{{date}}");
        assert_eq!(accepted.cursor, 9);
    }

    #[test]
    fn test_accept_value() {
        let accepted = accept("co", 2, "Coder");
        assert_eq!(accepted.text, "Coder");
        assert_eq!(accepted.cursor, 5);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut s = suggest("e", 1, &KNOWN, &[], 10);
        assert_eq!(s.len(), 2);
        assert!(s.active().is_none());
        s.next();
        assert_eq!(s.active_index(), Some(0));
        s.next();
        s.next();
        assert_eq!(s.active_index(), Some(0));
        s.previous();
        assert_eq!(s.active_index(), Some(1));
    }

    #[test]
    fn test_navigation_on_empty_list() {
        let mut s = suggest("zzz", 3, &KNOWN, &[], 10);
        s.next();
        s.previous();
        assert!(s.active().is_none());
    }
}
