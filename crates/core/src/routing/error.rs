use thiserror::Error;

/// Errors in the syntax of a single route pattern.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("Segment `{0}` mixes literal text and a parameter")]
    MixedSegment(String),
    #[error("Invalid parameter name in segment `{0}`")]
    InvalidParamName(String),
    #[error("Parameter `{0}` appears more than once")]
    DuplicateParam(String),
    #[error("Catch-all parameter `{0}` must be the last segment")]
    CatchAllNotLast(String),
}

/// Errors raised while building or expanding the routing table.
///
/// All of these are build-time configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("Invalid route pattern for {source_id}: {error}")]
    Pattern {
        source_id: String,
        error: PatternError,
    },
    #[error("Ambiguous routes: {first} and {second} both match {pattern}")]
    Ambiguous {
        first: String,
        second: String,
        pattern: String,
    },
    #[error("{source_id} has dynamic segments but enumerates no static paths")]
    MissingStaticPaths { source_id: String },
    #[error("Invalid static path for {source_id}: {reason}")]
    InvalidStaticPath { source_id: String, reason: String },
    #[error("Static paths for {source_id} produce the URL {url} more than once")]
    DuplicateStaticPath { source_id: String, url: String },
    #[error("Missing value for route parameter `{0}`")]
    MissingParam(String),
}

/// Result type for routing operations.
pub type Result<T> = std::result::Result<T, RouteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_error_display() {
        assert_eq!(
            PatternError::MixedSegment("post-[id]".to_string()).to_string(),
            "Segment `post-[id]` mixes literal text and a parameter"
        );
        assert_eq!(
            PatternError::CatchAllNotLast("rest".to_string()).to_string(),
            "Catch-all parameter `rest` must be the last segment"
        );
    }

    #[test]
    fn test_ambiguous_display_names_both_sources() {
        let error = RouteError::Ambiguous {
            first: "blog/[slug].html".to_string(),
            second: "blog/[id].md".to_string(),
            pattern: "/blog/[slug]".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Ambiguous routes: blog/[slug].html and blog/[id].md both match /blog/[slug]"
        );
    }
}
