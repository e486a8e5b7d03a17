use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde_yaml::Value;

use super::entry::{ContentEntry, EntrySource};
use super::error::ContentError;
use super::query::CollectionQuery;
use super::schema::{CollectionSchema, SchemaViolation};

/// What to do when an entry fails to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadPolicy {
    /// Skip the entry and report it.
    #[default]
    Lenient,
    /// Fail the whole collection.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRejection {
    Parse(String),
    Schema(Vec<SchemaViolation>),
    InvalidSlug(String),
    DuplicateId(String),
}

impl fmt::Display for EntryRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryRejection::Parse(reason) => write!(f, "could not be parsed: {reason}"),
            EntryRejection::Schema(violations) => {
                let joined = violations
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{joined}")
            }
            EntryRejection::InvalidSlug(slug) => write!(f, "invalid slug `{slug}`"),
            EntryRejection::DuplicateId(id) => write!(f, "duplicate id `{id}`"),
        }
    }
}

/// An entry left out of its collection, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    pub path: String,
    pub reason: EntryRejection,
}

impl fmt::Display for RejectedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// The validated entries of one collection, ordered by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    name: String,
    entries: Vec<ContentEntry>,
    rejected: Vec<RejectedEntry>,
}

impl Collection {
    /// Parse and validate every source.
    ///
    /// A `slug` front-matter key replaces the id derived from the path. When
    /// two entries share an id the one whose path sorts first is kept.
    pub fn load(
        name: &str,
        schema: &CollectionSchema,
        mut sources: Vec<EntrySource>,
        policy: LoadPolicy,
    ) -> Result<Self, ContentError> {
        sources.sort_by(|a, b| a.path.cmp(&b.path));

        let mut entries = Vec::with_capacity(sources.len());
        let mut rejected = Vec::new();
        let mut seen = HashSet::new();

        for source in sources {
            match load_entry(name, schema, &source) {
                Ok(entry) if !seen.insert(entry.id.clone()) => rejected.push(RejectedEntry {
                    path: source.path,
                    reason: EntryRejection::DuplicateId(entry.id),
                }),
                Ok(entry) => entries.push(entry),
                Err(reason) => rejected.push(RejectedEntry {
                    path: source.path,
                    reason,
                }),
            }
        }

        if policy == LoadPolicy::Strict && !rejected.is_empty() {
            return Err(ContentError::StrictLoadFailed {
                collection: name.to_string(),
                rejected,
            });
        }

        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Self {
            name: name.to_string(),
            entries,
            rejected,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[ContentEntry] {
        &self.entries
    }

    pub fn rejected(&self) -> &[RejectedEntry] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ContentEntry> {
        self.entries
            .binary_search_by(|e| e.id.as_str().cmp(id))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn filter<P>(&self, predicate: P) -> Vec<&ContentEntry>
    where
        P: Fn(&ContentEntry) -> bool,
    {
        self.entries.iter().filter(|e| predicate(e)).collect()
    }

    pub fn sort_by<F>(&self, mut compare: F) -> Vec<&ContentEntry>
    where
        F: FnMut(&ContentEntry, &ContentEntry) -> Ordering,
    {
        let mut sorted: Vec<&ContentEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| compare(a, b));
        sorted
    }

    pub fn query(&self, query: &CollectionQuery) -> Vec<&ContentEntry> {
        query.apply(&self.entries)
    }
}

fn load_entry(
    collection: &str,
    schema: &CollectionSchema,
    source: &EntrySource,
) -> Result<ContentEntry, EntryRejection> {
    let (raw, body) = source.parse().map_err(EntryRejection::Parse)?;

    let id = match raw.get("slug") {
        Some(slug) => validate_slug(slug)?,
        None => source.derived_id(),
    };
    if id.is_empty() {
        return Err(EntryRejection::InvalidSlug(source.path.clone()));
    }

    let data = schema.validate(&raw).map_err(EntryRejection::Schema)?;
    Ok(ContentEntry {
        collection: collection.to_string(),
        id,
        data,
        body,
    })
}

fn validate_slug(value: &Value) -> Result<String, EntryRejection> {
    let Value::String(slug) = value else {
        return Err(EntryRejection::InvalidSlug(format!("{value:?}")));
    };
    let valid = !slug.is_empty()
        && slug
            .split('/')
            .all(|s| !s.is_empty() && s != "." && s != ".." && !s.contains(char::is_whitespace));
    if valid {
        Ok(slug.clone())
    } else {
        Err(EntryRejection::InvalidSlug(slug.clone()))
    }
}

/// Every loaded collection, by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentStore {
    collections: BTreeMap<String, Collection>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection: Collection) {
        self.collections
            .insert(collection.name().to_string(), collection);
    }

    pub fn get(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    pub fn collection(&self, name: &str) -> Result<&Collection, ContentError> {
        self.get(name)
            .ok_or_else(|| ContentError::UnknownCollection(name.to_string()))
    }

    pub fn query(
        &self,
        name: &str,
        query: &CollectionQuery,
    ) -> Result<Vec<&ContentEntry>, ContentError> {
        Ok(self.collection(name)?.query(query))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Rejected entries across all collections.
    pub fn rejected(&self) -> impl Iterator<Item = (&str, &RejectedEntry)> {
        self.collections
            .values()
            .flat_map(|c| c.rejected().iter().map(move |r| (c.name(), r)))
    }
}
