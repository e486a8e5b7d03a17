//! Pure functions for mapping endpoint errors to HTTP responses.

use serde_json::json;

use super::error::EndpointError;
use super::types::EndpointResponse;

/// Maps an [`EndpointError`] to an HTTP status code.
///
/// - `BadRequest` -> 400 (Bad Request)
/// - `NotFound` -> 404 (Not Found)
/// - `MethodNotAllowed` -> 405 (Method Not Allowed)
/// - `UnsupportedMediaType` -> 415 (Unsupported Media Type)
/// - `Internal` -> 500 (Internal Server Error)
///
/// # Examples
///
/// ```
/// use valentine_core::endpoint::{EndpointError, endpoint_error_to_status_code};
///
/// let error = EndpointError::BadRequest("missing `to`".to_string());
/// assert_eq!(endpoint_error_to_status_code(&error), 400);
/// ```
pub fn endpoint_error_to_status_code(error: &EndpointError) -> u16 {
    match error {
        EndpointError::BadRequest(_) => 400,
        EndpointError::NotFound(_) => 404,
        EndpointError::MethodNotAllowed { .. } => 405,
        EndpointError::UnsupportedMediaType(_) => 415,
        EndpointError::Internal(_) => 500,
    }
}

/// Structured JSON response for an error: `{"error": "<message>"}`, plus an
/// `allow` header for 405.
pub fn endpoint_error_to_response(error: &EndpointError) -> EndpointResponse {
    let status = endpoint_error_to_status_code(error);
    let body = json!({ "error": error.to_string() }).to_string();
    let mut response = EndpointResponse::new(status, body.into_bytes())
        .with_header("content-type", "application/json");

    if let EndpointError::MethodNotAllowed { allowed, .. } = error {
        let allow = allowed
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        response = response.with_header("allow", allow);
    }
    response
}
