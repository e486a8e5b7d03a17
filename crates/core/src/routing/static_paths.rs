//! Validation of enumerated static paths and their output locations.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{Result, RouteError};
use super::params::{is_safe_segment, PageParams, ParamValue};
use super::pattern::Segment;
use super::table::{Route, RouteKind};

/// One `{params, props}` pair returned by a route's path enumeration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticPath {
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub props: Map<String, Value>,
}

impl StaticPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: Value) -> Self {
        self.props.insert(name.into(), value);
        self
    }
}

/// A validated static path with its concrete URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPath {
    pub url: String,
    pub params: PageParams,
    pub props: Map<String, Value>,
}

/// Check an enumeration against its route and resolve every concrete URL.
///
/// A route without parameters needs no enumeration and yields its single
/// URL. For dynamic routes every pair must bind exactly the route's
/// parameters, dynamic values must be one non-empty segment, catch-all values
/// one or more, and no two pairs may produce the same URL. `.`, `..` and
/// backslashes are refused in every segment so output stays inside the
/// output directory.
pub fn validate_static_paths(route: &Route, paths: Vec<StaticPath>) -> Result<Vec<ResolvedPath>> {
    let paths = if paths.is_empty() && !route.pattern.is_dynamic() {
        vec![StaticPath::default()]
    } else {
        paths
    };

    let expected: BTreeSet<&str> = route.pattern.param_names().into_iter().collect();
    let mut seen = HashSet::with_capacity(paths.len());
    let mut resolved = Vec::with_capacity(paths.len());

    for path in paths {
        let given: BTreeSet<&str> = path.params.keys().map(String::as_str).collect();
        if given != expected {
            return Err(invalid(
                route,
                format!(
                    "expected params {:?}, got {:?}",
                    expected.iter().collect::<Vec<_>>(),
                    given.iter().collect::<Vec<_>>()
                ),
            ));
        }

        let mut params = PageParams::new();
        for segment in route.pattern.segments() {
            match segment {
                Segment::Literal(_) => {}
                Segment::Dynamic(name) => {
                    let value = &path.params[name];
                    if !is_safe_segment(value) {
                        return Err(invalid(
                            route,
                            format!("`{name}` must be a single non-empty segment, got {value:?}"),
                        ));
                    }
                    params.insert(name.clone(), ParamValue::One(value.clone()));
                }
                Segment::CatchAll(name) => {
                    let value = &path.params[name];
                    let parts: Vec<String> = value
                        .split('/')
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect();
                    if parts.is_empty() {
                        return Err(invalid(
                            route,
                            format!("`{name}` must contain at least one segment"),
                        ));
                    }
                    if let Some(bad) = parts.iter().find(|part| !is_safe_segment(part)) {
                        return Err(invalid(
                            route,
                            format!("`{name}` contains the segment {bad:?}"),
                        ));
                    }
                    params.insert(name.clone(), ParamValue::Rest(parts));
                }
            }
        }

        let url = route.pattern.build_url(&params)?;
        if !seen.insert(url.clone()) {
            return Err(RouteError::DuplicateStaticPath {
                source_id: route.source_id.clone(),
                url,
            });
        }

        resolved.push(ResolvedPath {
            url,
            params,
            props: path.props,
        });
    }

    Ok(resolved)
}

fn invalid(route: &Route, reason: String) -> RouteError {
    RouteError::InvalidStaticPath {
        source_id: route.source_id.clone(),
        reason,
    }
}

/// Output file for a concrete URL, relative to the output directory.
///
/// Pages become `<url>/index.html`; endpoints are written at their URL.
pub fn output_file(url: &str, kind: RouteKind) -> String {
    let trimmed = url.trim_matches('/');
    match kind {
        RouteKind::Page if trimmed.is_empty() => "index.html".to_string(),
        RouteKind::Page => format!("{trimmed}/index.html"),
        RouteKind::Endpoint if trimmed.is_empty() => "index".to_string(),
        RouteKind::Endpoint => trimmed.to_string(),
    }
}
