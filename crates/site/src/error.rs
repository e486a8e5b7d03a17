//! Site errors including filesystem and task failures.

use std::path::Path;

use thiserror::Error;
use valentine_core::config::ConfigError;
use valentine_core::content::ContentError;
use valentine_core::routing::RouteError;
use valentine_render::RenderError;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Routing error: {0}")]
    Route(#[from] RouteError),

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Invalid env file {path}: {reason}")]
    Dotenv { path: String, reason: String },

    #[error("I/O error at {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Endpoint `{pattern}` answered {status} while pre-rendering {url}")]
    Endpoint {
        pattern: String,
        url: String,
        status: u16,
    },

    #[error("Build task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, SiteError>;

impl SiteError {
    pub(crate) fn io(path: &Path, error: std::io::Error) -> Self {
        SiteError::Io {
            path: path.display().to_string(),
            reason: error.to_string(),
        }
    }
}

/// Sanitize error messages for client-facing responses.
///
/// Hides internal details while providing useful feedback.
pub fn sanitize_error(error: &SiteError) -> String {
    match error {
        SiteError::Render(RenderError::UnknownPage(_)) => "Page not found".to_string(),
        SiteError::Render(_) => "Render failed".to_string(),
        SiteError::Endpoint { .. } => "Endpoint failed".to_string(),
        SiteError::Task(_) => "Service temporarily unavailable".to_string(),
        SiteError::Config(_)
        | SiteError::Dotenv { .. }
        | SiteError::Route(_)
        | SiteError::Content(_)
        | SiteError::Io { .. } => "Internal configuration error".to_string(),
    }
}
