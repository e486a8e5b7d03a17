//! Liveness probe.

use axum::http::StatusCode;

/// GET /livez - Basic liveness probe.
///
/// Returns 200 immediately. The project is loaded before the listener opens,
/// so accepting connections means the site is ready.
#[axum::debug_handler]
pub async fn livez() -> StatusCode {
    StatusCode::OK
}
