use thiserror::Error;

use super::types::Method;

/// Errors an endpoint returns instead of a response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EndpointError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Method {method} not allowed")]
    MethodNotAllowed { method: Method, allowed: Vec<Method> },
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, EndpointError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_error_display() {
        assert_eq!(
            EndpointError::MethodNotAllowed {
                method: Method::Delete,
                allowed: vec![Method::Get],
            }
            .to_string(),
            "Method DELETE not allowed"
        );
        assert_eq!(
            EndpointError::UnsupportedMediaType("text/plain".to_string()).to_string(),
            "Unsupported media type: text/plain"
        );
    }
}
