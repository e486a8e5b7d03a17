use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Deserialize;

use super::entry::ContentEntry;
use super::error::ContentError;
use super::value::DataValue;

/// Sort by one field; a leading `-` sorts descending.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

impl FromStr for SortKey {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (field, descending) = match s.strip_prefix('-') {
            Some(field) => (field, true),
            None => (s, false),
        };
        if field.is_empty() {
            return Err(ContentError::InvalidQuery(format!(
                "sort key `{s}` names no field"
            )));
        }
        Ok(Self {
            field: field.to_string(),
            descending,
        })
    }
}

impl TryFrom<String> for SortKey {
    type Error = ContentError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Declarative query over one collection, usable from page front-matter and
/// templates.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionQuery {
    /// Field equality filters. A list field matches when it contains the value.
    #[serde(default, rename = "where")]
    pub filter: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub exclude_drafts: bool,
    #[serde(default)]
    pub sort: Option<SortKey>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl CollectionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter_eq(mut self, field: impl Into<String>, value: serde_json::Value) -> Self {
        self.filter.insert(field.into(), value);
        self
    }

    pub fn exclude_drafts(mut self) -> Self {
        self.exclude_drafts = true;
        self
    }

    pub fn sort(mut self, key: &str) -> Result<Self, ContentError> {
        self.sort = Some(key.parse()?);
        Ok(self)
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, entry: &ContentEntry) -> bool {
        if self.exclude_drafts && entry.is_draft() {
            return false;
        }
        self.filter.iter().all(|(field, expected)| match entry.field(field) {
            Some(value) => value.matches_json(expected),
            None => expected.is_null(),
        })
    }

    /// Apply to entries already in id order. Ties keep that order.
    pub fn apply<'a>(&self, entries: &'a [ContentEntry]) -> Vec<&'a ContentEntry> {
        let mut selected: Vec<&ContentEntry> = entries.iter().filter(|e| self.matches(e)).collect();
        if let Some(key) = &self.sort {
            selected.sort_by(|a, b| compare_field(a, b, key));
        }
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

fn compare_field(a: &ContentEntry, b: &ContentEntry, key: &SortKey) -> Ordering {
    let a = a.field(&key.field).unwrap_or(DataValue::Null);
    let b = b.field(&key.field).unwrap_or(DataValue::Null);
    match (&a, &b) {
        // Entries without the field stay last in either direction.
        (DataValue::Null, DataValue::Null) => Ordering::Equal,
        (DataValue::Null, _) => Ordering::Greater,
        (_, DataValue::Null) => Ordering::Less,
        _ if key.descending => b.compare(&a),
        _ => a.compare(&b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::value::EntryData;
    use chrono::NaiveDate;
    use serde_json::json;

    fn entry(id: &str, date: Option<&str>, tags: &[&str], draft: bool) -> ContentEntry {
        let mut data = EntryData::new();
        if let Some(date) = date {
            data.insert(
                "pubDate".into(),
                DataValue::Date(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()),
            );
        }
        data.insert(
            "tags".into(),
            DataValue::List(tags.iter().map(|t| DataValue::String(t.to_string())).collect()),
        );
        data.insert("draft".into(), DataValue::Bool(draft));
        ContentEntry {
            collection: "blog".into(),
            id: id.into(),
            data,
            body: String::new(),
        }
    }

    fn entries() -> Vec<ContentEntry> {
        vec![
            entry("a", Some("2024-02-14"), &["love"], false),
            entry("b", Some("2025-02-14"), &["rust", "love"], false),
            entry("c", None, &["rust"], false),
            entry("d", Some("2025-03-01"), &["rust"], true),
        ]
    }

    fn ids(result: Vec<&ContentEntry>) -> Vec<&str> {
        result.into_iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_sort_descending_with_missing_last() {
        let all = entries();
        let query = CollectionQuery::new().sort("-pubDate").unwrap();
        assert_eq!(ids(query.apply(&all)), vec!["d", "b", "a", "c"]);

        let query = CollectionQuery::new().sort("pubDate").unwrap();
        assert_eq!(ids(query.apply(&all)), vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn test_where_exclude_drafts_and_limit() {
        let all = entries();
        let query = CollectionQuery::new()
            .filter_eq("tags", json!("rust"))
            .exclude_drafts()
            .sort("-pubDate")
            .unwrap()
            .limit(1);
        assert_eq!(ids(query.apply(&all)), vec!["b"]);
    }

    #[test]
    fn test_filter_on_id() {
        let all = entries();
        let query = CollectionQuery::new().filter_eq("id", json!("c"));
        assert_eq!(ids(query.apply(&all)), vec!["c"]);
    }

    #[test]
    fn test_deserialize_query() {
        let query: CollectionQuery = serde_json::from_value(json!({
            "where": {"tags": "love"},
            "exclude_drafts": true,
            "sort": "-pubDate",
            "limit": 5
        }))
        .unwrap();
        assert_eq!(
            query.sort,
            Some(SortKey {
                field: "pubDate".into(),
                descending: true
            })
        );
        assert_eq!(query.limit, Some(5));

        assert!(serde_json::from_value::<CollectionQuery>(json!({"sort": "-"})).is_err());
        assert!(serde_json::from_value::<CollectionQuery>(json!({"order": "x"})).is_err());
    }
}
