//! Category grouping of the prompt collection
//!
//! A [`CategoryIndex`] borrows the store's records, so it cannot outlive a
//! mutation: rebuild it with [`group_by_category`] after every change.

use crate::record::PromptRecord;
use std::collections::HashMap;

/// All records sharing one category, newest first
#[derive(Debug, Clone)]
pub struct CategoryGroup<'a> {
    pub name: &'a str,
    pub records: Vec<&'a PromptRecord>,
}

impl<'a> CategoryGroup<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Records grouped by category, groups ordered by name ignoring case
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex<'a> {
    groups: Vec<CategoryGroup<'a>>,
}

impl<'a> CategoryIndex<'a> {
    pub fn groups(&self) -> &[CategoryGroup<'a>] {
        &self.groups
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryGroup<'a>> {
        self.groups.iter()
    }

    /// Group for an exact category name
    pub fn get(&self, name: &str) -> Option<&CategoryGroup<'a>> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Category names in display order
    pub fn names(&self) -> Vec<&'a str> {
        self.groups.iter().map(|g| g.name).collect()
    }

    pub fn category_count(&self) -> usize {
        self.groups.len()
    }

    pub fn record_count(&self) -> usize {
        self.groups.iter().map(CategoryGroup::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Partition `records` by category.
///
/// Inside a group records are sorted by `updatedAt`, newest first; the sort is
/// stable so equal timestamps keep input order. Groups are ordered by
/// case-insensitive name, exact name breaking ties.
pub fn group_by_category<'a, I>(records: I) -> CategoryIndex<'a>
where
    I: IntoIterator<Item = &'a PromptRecord>,
{
    let mut slots: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<CategoryGroup<'a>> = Vec::new();

    for record in records {
        let slot = *slots.entry(record.category.as_str()).or_insert_with(|| {
            groups.push(CategoryGroup {
                name: record.category.as_str(),
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record);
    }

    for group in &mut groups {
        group
            .records
            .sort_by(|a, b| b.meta.updated_at.cmp(&a.meta.updated_at));
    }
    groups.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(b.name))
    });

    CategoryIndex { groups }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn record(id: &str, category: &str, minutes: i64) -> PromptRecord {
        let mut record = PromptRecord::new(id.into(), id, category, "", vec![], None, "t");
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        record.meta.created_at = base;
        record.meta.updated_at = base + Duration::minutes(minutes);
        record
    }

    #[test]
    fn test_groups_sorted_newest_first() {
        let records = vec![record("t1", "X", 1), record("t3", "X", 3), record("t2", "X", 2)];
        let index = group_by_category(&records);
        let group = index.get("X").unwrap();
        let ids: Vec<&str> = group.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["t3", "t2", "t1"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let records = vec![record("first", "X", 5), record("second", "X", 5)];
        let index = group_by_category(&records);
        let group = index.get("X").unwrap();
        let ids: Vec<&str> = group.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_categories_ordered_ignoring_case() {
        let records = vec![
            record("a", "banana", 0),
            record("b", "Apple", 0),
            record("c", "cherry", 0),
        ];
        let index = group_by_category(&records);
        assert_eq!(index.names(), vec!["Apple", "banana", "cherry"]);
        assert_eq!(index.category_count(), 3);
        assert_eq!(index.record_count(), 3);
    }

    #[test]
    fn test_empty_collection() {
        let records: Vec<PromptRecord> = Vec::new();
        let index = group_by_category(&records);
        assert!(index.is_empty());
        assert!(index.get("anything").is_none());
    }
}
