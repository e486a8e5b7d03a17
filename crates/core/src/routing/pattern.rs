//! Route patterns derived from page source paths.
//!
//! A pattern is an ordered list of segments. `[name]` binds exactly one URL
//! segment, `[...name]` binds every remaining segment (at least one) and is
//! only allowed in last position. Anything else is matched literally.

use std::{collections::HashSet, fmt};

use super::error::{PatternError, RouteError};
use super::params::{PageParams, ParamValue};

/// How specific a segment is. Lower sorts first and wins a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Specificity {
    Literal,
    Dynamic,
    CatchAll,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Literal(String),
    Dynamic(String),
    CatchAll(String),
}

impl Segment {
    fn parse(raw: &str) -> Result<Self, PatternError> {
        if let Some(inner) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            let (name, catch_all) = match inner.strip_prefix("...") {
                Some(name) => (name, true),
                None => (inner, false),
            };
            if !is_valid_param_name(name) {
                return Err(PatternError::InvalidParamName(raw.to_string()));
            }
            return Ok(if catch_all {
                Segment::CatchAll(name.to_string())
            } else {
                Segment::Dynamic(name.to_string())
            });
        }

        if raw.contains('[') || raw.contains(']') {
            return Err(PatternError::MixedSegment(raw.to_string()));
        }

        Ok(Segment::Literal(raw.to_string()))
    }

    pub fn specificity(&self) -> Specificity {
        match self {
            Segment::Literal(_) => Specificity::Literal,
            Segment::Dynamic(_) => Specificity::Dynamic,
            Segment::CatchAll(_) => Specificity::CatchAll,
        }
    }

    pub fn param_name(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Dynamic(name) | Segment::CatchAll(name) => Some(name),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(text),
            Segment::Dynamic(name) => write!(f, "[{name}]"),
            Segment::CatchAll(name) => write!(f, "[...{name}]"),
        }
    }
}

fn is_valid_param_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Segment shape with parameter names erased. Two patterns with the same shape
/// match exactly the same set of URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ShapeSegment {
    Literal(String),
    Dynamic,
    CatchAll,
}

/// A parsed URL pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a URL pattern such as `/blog/[slug]`.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(Segment::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_segments(segments)
    }

    /// Derive the pattern for a page source path relative to the pages root.
    ///
    /// The file extension is dropped and a trailing `index` maps to its
    /// directory: `blog/index.md` and `blog.html` both become `/blog`.
    pub fn from_source(source_id: &str) -> Result<Self, PatternError> {
        let normalized = source_id.replace('\\', "/");
        let mut parts: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();

        if let Some(last) = parts.pop() {
            let stem = match last.rsplit_once('.') {
                Some((stem, _ext)) if !stem.is_empty() => stem,
                _ => last,
            };
            if stem != "index" {
                parts.push(stem);
            }
        }

        let segments = parts
            .into_iter()
            .map(Segment::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_segments(segments)
    }

    fn from_segments(segments: Vec<Segment>) -> Result<Self, PatternError> {
        let mut seen = HashSet::new();
        let last = segments.len().saturating_sub(1);

        for (index, segment) in segments.iter().enumerate() {
            if let Segment::CatchAll(name) = segment {
                if index != last {
                    return Err(PatternError::CatchAllNotLast(name.clone()));
                }
            }
            if let Some(name) = segment.param_name() {
                if !seen.insert(name) {
                    return Err(PatternError::DuplicateParam(name.to_string()));
                }
            }
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the parameters this pattern binds, in order.
    pub fn param_names(&self) -> Vec<&str> {
        self.segments.iter().filter_map(Segment::param_name).collect()
    }

    /// Whether any segment is a parameter.
    pub fn is_dynamic(&self) -> bool {
        self.segments
            .iter()
            .any(|s| s.specificity() != Specificity::Literal)
    }

    /// Precedence key: compared lexicographically, the smaller key wins.
    pub fn specificity(&self) -> Vec<Specificity> {
        self.segments.iter().map(Segment::specificity).collect()
    }

    pub(crate) fn shape(&self) -> Vec<ShapeSegment> {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => ShapeSegment::Literal(text.clone()),
                Segment::Dynamic(_) => ShapeSegment::Dynamic,
                Segment::CatchAll(_) => ShapeSegment::CatchAll,
            })
            .collect()
    }

    /// Match already-normalized URL segments, binding parameters.
    pub fn matches(&self, path: &[String]) -> Option<PageParams> {
        let mut params = PageParams::new();

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(text) => {
                    if path.get(index) != Some(text) {
                        return None;
                    }
                }
                Segment::Dynamic(name) => {
                    let value = path.get(index)?;
                    params.insert(name.clone(), ParamValue::One(value.clone()));
                }
                Segment::CatchAll(name) => {
                    let rest = path.get(index..).filter(|rest| !rest.is_empty())?;
                    params.insert(name.clone(), ParamValue::Rest(rest.to_vec()));
                    return Some(params);
                }
            }
        }

        (path.len() == self.segments.len()).then_some(params)
    }

    /// Build the concrete URL path for a set of parameters.
    pub fn build_url(&self, params: &PageParams) -> Result<String, RouteError> {
        let mut parts = Vec::with_capacity(self.segments.len());

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => parts.push(text.clone()),
                Segment::Dynamic(name) | Segment::CatchAll(name) => {
                    let value = params
                        .get(name)
                        .ok_or_else(|| RouteError::MissingParam(name.clone()))?;
                    parts.push(value.as_path());
                }
            }
        }

        Ok(format!("/{}", parts.join("/")))
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// Whether a source path under the pages root produces a route.
///
/// Any path component starting with `_` or `.` is private.
pub fn is_routable_source(source_id: &str) -> bool {
    source_id
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .all(|part| !part.starts_with('_') && !part.starts_with('.'))
}

/// Split a request path into percent-decoded segments.
///
/// Empty segments are dropped, so `/blog//post/` and `/blog/post` are equal.
pub fn normalize_path(path: &str) -> Vec<String> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            urlencoding::decode(segment)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| segment.to_string())
        })
        .collect()
}
