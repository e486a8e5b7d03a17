//! The routing table: precedence ordering, ambiguity detection and matching.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::{Result, RouteError};
use super::params::PageParams;
use super::pattern::{normalize_path, RoutePattern};

/// Whether a route is produced once at build time or per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Static,
    Server,
}

/// What backs a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// A page template producing HTML.
    Page,
    /// A handler producing an arbitrary response body.
    Endpoint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub pattern: RoutePattern,
    pub source_id: String,
    pub render_mode: RenderMode,
    pub kind: RouteKind,
}

impl Route {
    pub fn new(
        pattern: RoutePattern,
        source_id: impl Into<String>,
        render_mode: RenderMode,
        kind: RouteKind,
    ) -> Self {
        Self {
            pattern,
            source_id: source_id.into(),
            render_mode,
            kind,
        }
    }

    /// Build a page route from its source path under the pages root.
    pub fn page(source_id: &str, render_mode: RenderMode) -> Result<Self> {
        let pattern =
            RoutePattern::from_source(source_id).map_err(|error| RouteError::Pattern {
                source_id: source_id.to_string(),
                error,
            })?;
        Ok(Self::new(pattern, source_id, render_mode, RouteKind::Page))
    }

    /// Build an endpoint route from a URL pattern string.
    pub fn endpoint(pattern: &str, render_mode: RenderMode) -> Result<Self> {
        let parsed = RoutePattern::parse(pattern).map_err(|error| RouteError::Pattern {
            source_id: pattern.to_string(),
            error,
        })?;
        Ok(Self::new(parsed, pattern, render_mode, RouteKind::Endpoint))
    }
}

/// Result of matching a URL against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub params: PageParams,
}

/// Routes sorted by precedence, free of ambiguity.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build a table, rejecting any two routes that match the same URLs with
    /// equal specificity.
    pub fn build(mut routes: Vec<Route>) -> Result<Self> {
        // Same shape means same specificity and identical literals, so the two
        // patterns match exactly the same URLs.
        let mut shapes: HashMap<_, &Route> = HashMap::with_capacity(routes.len());
        for route in &routes {
            if let Some(existing) = shapes.insert(route.pattern.shape(), route) {
                let (first, second) = if existing.source_id <= route.source_id {
                    (existing, route)
                } else {
                    (route, existing)
                };
                return Err(RouteError::Ambiguous {
                    first: first.source_id.clone(),
                    second: second.source_id.clone(),
                    pattern: first.pattern.to_string(),
                });
            }
        }

        routes.sort_by(|a, b| {
            a.pattern
                .specificity()
                .cmp(&b.pattern.specificity())
                .then_with(|| a.pattern.to_string().cmp(&b.pattern.to_string()))
        });

        Ok(Self { routes })
    }

    /// Find the best route for a request path, or `None` for not found.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<'_>> {
        let segments = normalize_path(path);
        self.routes.iter().find_map(|route| {
            route
                .pattern
                .matches(&segments)
                .map(|params| RouteMatch { route, params })
        })
    }

    /// Routes in precedence order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn get(&self, source_id: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.source_id == source_id)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
