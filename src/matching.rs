//! Search over prompt records
//!
//! [`filter`] is the substring query used by list views. [`Resolver`] turns a
//! user-typed reference into a record id: exact id first, then exact title,
//! then a fuzzy match on id and title.

use crate::record::PromptRecord;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

fn haystack(record: &PromptRecord) -> String {
    format!(
        "{} {} {}",
        record.title,
        record.body,
        record.tags.join(" ")
    )
    .to_lowercase()
}

/// Records containing `query` (case-insensitive) in their title, body or
/// tags, in input order. An empty query matches everything.
pub fn filter<'a, I>(records: I, query: &str) -> Vec<&'a PromptRecord>
where
    I: IntoIterator<Item = &'a PromptRecord>,
{
    let query = query.to_lowercase();
    records
        .into_iter()
        .filter(|r| query.is_empty() || haystack(r).contains(&query))
        .collect()
}

/// Positions of the records containing `query`, for mapping a visible
/// selection back to the underlying list
pub fn matching_indices<'a, I>(records: I, query: &str) -> Vec<usize>
where
    I: IntoIterator<Item = &'a PromptRecord>,
{
    let query = query.to_lowercase();
    records
        .into_iter()
        .enumerate()
        .filter(|(_, r)| query.is_empty() || haystack(r).contains(&query))
        .map(|(i, _)| i)
        .collect()
}

/// Result of resolving a user reference to a record
#[derive(Debug)]
pub enum MatchResult<'a> {
    /// Single record identified
    Exact(&'a PromptRecord),
    /// Several plausible records, best first
    Multiple(Vec<&'a PromptRecord>),
    /// Nothing resembles the reference
    None,
}

/// Resolves ids, titles and near misses to records
pub struct Resolver<'a> {
    records: &'a [PromptRecord],
    fuzzy: SkimMatcherV2,
}

impl<'a> Resolver<'a> {
    pub fn new(records: &'a [PromptRecord]) -> Self {
        Self {
            records,
            fuzzy: SkimMatcherV2::default(),
        }
    }

    /// Find the record a user most likely meant.
    ///
    /// Tiers: exact id, exact title (case-insensitive, must be unique), then
    /// fuzzy scoring over id and title.
    pub fn find(&self, query: &str) -> MatchResult<'a> {
        if let Some(record) = self.records.iter().find(|r| r.id == query) {
            return MatchResult::Exact(record);
        }

        let lowered = query.to_lowercase();
        let by_title: Vec<&PromptRecord> = self
            .records
            .iter()
            .filter(|r| r.title.to_lowercase() == lowered)
            .collect();
        match by_title.len() {
            1 => return MatchResult::Exact(by_title[0]),
            n if n > 1 => return MatchResult::Multiple(by_title),
            _ => {}
        }

        let ranked = self.ranked(query);
        match ranked.len() {
            0 => MatchResult::None,
            1 => MatchResult::Exact(ranked[0].0),
            _ => {
                // A clear winner is taken without asking
                if ranked[0].1 > ranked[1].1 + 1000 {
                    MatchResult::Exact(ranked[0].0)
                } else {
                    MatchResult::Multiple(ranked.into_iter().map(|(r, _)| r).take(8).collect())
                }
            }
        }
    }

    /// Records scored against `query`, best first
    pub fn ranked(&self, query: &str) -> Vec<(&'a PromptRecord, i64)> {
        let mut matches: Vec<(&'a PromptRecord, i64)> = self
            .records
            .iter()
            .filter_map(|record| {
                let by_id = self.fuzzy.fuzzy_match(&record.id, query);
                let by_title = self.fuzzy.fuzzy_match(&record.title, query);
                let score = by_id.max(by_title)?;
                Some((record, self.enhanced_score(record, query, score)))
            })
            .collect();
        matches.sort_by(|a, b| b.1.cmp(&a.1));
        matches
    }

    fn enhanced_score(&self, record: &PromptRecord, query: &str, fuzzy_score: i64) -> i64 {
        let mut score = fuzzy_score;
        let query = query.to_lowercase();
        let title = record.title.to_lowercase();

        if record.id.starts_with(&query) || title.starts_with(&query) {
            score += 2000;
        }

        if title
            .split(['-', '/', '_', ' '])
            .any(|word| word.starts_with(&query))
        {
            score += 1000;
        }

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, title: &str, body: &str, tags: &[&str]) -> PromptRecord {
        PromptRecord::new(
            id.to_string(),
            title,
            "X",
            body,
            tags.iter().map(|t| t.to_string()).collect(),
            None,
            "t",
        )
    }

    #[test]
    fn test_filter_title() {
        let records = vec![record("r-1", "Refactor Helper", "", &[])];
        assert_eq!(filter(&records, "refactor").len(), 1);
        assert_eq!(filter(&records, "").len(), 1);
        assert!(filter(&records, "xyz").is_empty());
    }

    #[test]
    fn test_filter_body_and_tags() {
        let records = vec![
            record("a-1", "Alpha", "Explain LIFETIMES", &[]),
            record("b-1", "Beta", "", &["rust", "async"]),
        ];
        assert_eq!(filter(&records, "lifetimes")[0].id, "a-1");
        assert_eq!(filter(&records, "ASYNC")[0].id, "b-1");
        assert_eq!(matching_indices(&records, "rust async"), vec![1]);
    }

    #[test]
    fn test_resolve_exact_id_and_title() {
        let records = vec![
            record("code-review-1a2b3c4d", "Code Review", "", &[]),
            record("commit-9f8e7d6c", "Commit Message", "", &[]),
        ];
        let resolver = Resolver::new(&records);
        match resolver.find("commit-9f8e7d6c") {
            MatchResult::Exact(r) => assert_eq!(r.title, "Commit Message"),
            other => panic!("Expected exact match, got {:?}", other),
        }
        match resolver.find("code review") {
            MatchResult::Exact(r) => assert_eq!(r.id, "code-review-1a2b3c4d"),
            other => panic!("Expected exact match, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_none() {
        let records = vec![record("a-1", "Alpha", "", &[])];
        assert!(matches!(Resolver::new(&records).find("zzzz"), MatchResult::None));
    }

    #[test]
    fn test_resolve_ambiguous_title() {
        let records = vec![
            record("dup-1", "Same", "", &[]),
            record("dup-2", "same", "", &[]),
        ];
        match Resolver::new(&records).find("SAME") {
            MatchResult::Multiple(found) => assert_eq!(found.len(), 2),
            other => panic!("Expected multiple matches, got {:?}", other),
        }
    }
}
