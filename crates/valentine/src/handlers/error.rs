use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use valentine_core::endpoint::{endpoint_error_to_status_code, EndpointError};
use valentine_render::RenderError;
use valentine_site::{sanitize_error, SiteError};

/// Handler error; the status code is picked by downcasting.
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = if let Some(site_error) = self.0.downcast_ref::<SiteError>() {
            let status = match site_error {
                SiteError::Render(RenderError::UnknownPage(_)) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, sanitize_error(site_error))
        } else if let Some(endpoint_error) = self.0.downcast_ref::<EndpointError>() {
            let code = endpoint_error_to_status_code(endpoint_error);
            (
                StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                endpoint_error.to_string(),
            )
        } else {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
