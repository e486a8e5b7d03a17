use std::error::Error as StdError;

use thiserror::Error;
use valentine_core::content::ContentError;
use valentine_core::hydration::HydrationError;

/// Errors raised while preparing or rendering templates.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid front-matter in `{source_id}`: {reason}")]
    FrontMatter { source_id: String, reason: String },
    #[error("Unknown page `{0}`")]
    UnknownPage(String),
    #[error("Unknown layout `{layout}` requested by `{source_id}`")]
    UnknownLayout { source_id: String, layout: String },
    #[error("Invalid path enumeration for `{source_id}`: {reason}")]
    Paths { source_id: String, reason: String },
    #[error(transparent)]
    Hydration(#[from] HydrationError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("Template error in `{template}`: {message}")]
    Template { template: String, message: String },
    #[error("Built-in page failed to render: {0}")]
    Builtin(#[from] askama::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;

impl RenderError {
    /// Convert a tera error, surfacing a hydration error raised inside a
    /// template function as [`RenderError::Hydration`].
    pub(crate) fn from_tera(template: &str, error: tera::Error) -> Self {
        let mut source: Option<&(dyn StdError + 'static)> = Some(&error);
        while let Some(err) = source {
            if let Some(hydration) = err.downcast_ref::<HydrationError>() {
                return RenderError::Hydration(hydration.clone());
            }
            source = err.source();
        }
        RenderError::Template {
            template: template.to_string(),
            message: chain_message(&error),
        }
    }
}

fn chain_message(error: &dyn StdError) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(err) = source {
        parts.push(err.to_string());
        source = err.source();
    }
    parts.join(": ")
}
