use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

/// Whether a parameter value can stand as one path segment on disk.
///
/// Empty values, `.`, `..` and anything holding a separator are refused.
pub fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains(['/', '\\'])
}

/// Value bound to a route parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// A dynamic segment binds exactly one path segment.
    One(String),
    /// A catch-all segment binds one or more segments, in order.
    Rest(Vec<String>),
}

impl ParamValue {
    /// The value as it appears in a URL path (`Rest` segments joined with `/`).
    pub fn as_path(&self) -> String {
        match self {
            ParamValue::One(value) => value.clone(),
            ParamValue::Rest(segments) => segments.join("/"),
        }
    }

    /// The individual path segments bound by this parameter.
    pub fn segments(&self) -> Vec<&str> {
        match self {
            ParamValue::One(value) => vec![value.as_str()],
            ParamValue::Rest(segments) => segments.iter().map(String::as_str).collect(),
        }
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_path())
    }
}

/// Parameters extracted by matching a concrete URL against a route pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PageParams(BTreeMap<String, ParamValue>);

impl PageParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    /// Shorthand for the URL form of a parameter.
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.0.get(name).map(ParamValue::as_path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    /// True when every bound segment passes [`is_safe_segment`].
    pub fn is_path_safe(&self) -> bool {
        self.0
            .values()
            .all(|value| value.segments().into_iter().all(is_safe_segment))
    }
}
