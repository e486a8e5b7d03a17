//! Request dispatch through the project's route table.
//!
//! Order of resolution for a path under the site base:
//! 1. a matching route: server routes are rendered or dispatched per
//!    request, static routes are read from the build output;
//! 2. a file in the build output (public assets);
//! 3. the 404 page with status 404.

use std::path::PathBuf;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use valentine_core::endpoint::{dispatch, EndpointRequest, EndpointResponse, Method};
use valentine_core::routing::{
    is_safe_segment, normalize_path, output_file, RenderMode, RouteKind, RouteMatch,
};

use crate::{
    handlers::{assets::content_type_for, AppError},
    state::AppState,
};

/// Fallback handler: everything not claimed by a fixed route lands here.
pub async fn serve_site(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();
    let Some(route_path) = state.project.config().strip_base(&path).map(str::to_string) else {
        return not_found(&state, &path).await;
    };

    if let Some(matched) = state.project.routes().match_path(&route_path) {
        let route = matched.route;
        tracing::debug!(
            path = %route_path,
            source = %route.source_id,
            mode = ?route.render_mode,
            "Route matched"
        );

        if route.kind == RouteKind::Endpoint && route.render_mode == RenderMode::Server {
            let source_id = route.source_id.clone();
            return dispatch_endpoint(&state, &source_id, matched, request).await;
        }
        if !is_read(request.method()) {
            return Ok(read_only());
        }

        let response = match route.render_mode {
            RenderMode::Server => render_page(&state, &route_path).await?,
            RenderMode::Static => prerendered(&state, &matched).await?,
        };
        if let Some(response) = response {
            return Ok(response);
        }
    }

    if is_read(request.method()) {
        if let Some(response) = asset(&state, &route_path).await? {
            return Ok(response);
        }
    }

    not_found(&state, &path).await
}

fn is_read(method: &axum::http::Method) -> bool {
    method == axum::http::Method::GET || method == axum::http::Method::HEAD
}

fn read_only() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET, HEAD")],
        Json(serde_json::json!({ "error": "Pages only answer GET and HEAD" })),
    )
        .into_response()
}

async fn render_page(state: &AppState, route_path: &str) -> Result<Option<Response>, AppError> {
    let project = state.project.clone();
    let path = route_path.to_string();
    let rendered = tokio::task::spawn_blocking(move || {
        match project.routes().match_path(&path) {
            Some(matched) => project.render_on_demand(&matched, &path),
            None => Ok(None),
        }
    })
    .await??;

    Ok(rendered.map(|page| Html(page.html).into_response()))
}

async fn prerendered(
    state: &AppState,
    matched: &RouteMatch<'_>,
) -> Result<Option<Response>, AppError> {
    let route = matched.route;
    if !matched.params.is_path_safe() {
        return Ok(None);
    }
    let url = route.pattern.build_url(&matched.params)?;
    let file = output_file(&url, route.kind);
    read_output(state.out_dir().join(&file), content_type_for(&file)).await
}

/// A file from the build output. Paths trying to leave it are ignored.
async fn asset(state: &AppState, route_path: &str) -> Result<Option<Response>, AppError> {
    let segments = normalize_path(route_path);
    if segments.is_empty() || !segments.iter().all(|s| is_safe_segment(s)) {
        return Ok(None);
    }
    let file = segments.join("/");
    read_output(state.out_dir().join(&file), content_type_for(&file)).await
}

async fn read_output(path: PathBuf, content_type: &'static str) -> Result<Option<Response>, AppError> {
    if !tokio::fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false) {
        return Ok(None);
    }
    let contents = tokio::fs::read(&path).await?;
    Ok(Some(
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type),
                (header::CACHE_CONTROL, "public, max-age=3600"),
            ],
            contents,
        )
            .into_response(),
    ))
}

async fn not_found(state: &AppState, path: &str) -> Result<Response, AppError> {
    let renderer = state.project.renderer().clone();
    let path = path.to_string();
    let html = tokio::task::spawn_blocking(move || renderer.render_not_found(Some(&path))).await??;
    Ok((StatusCode::NOT_FOUND, Html(html)).into_response())
}

async fn dispatch_endpoint(
    state: &AppState,
    source_id: &str,
    matched: RouteMatch<'_>,
    request: Request,
) -> Result<Response, AppError> {
    let endpoint = state
        .project
        .endpoints()
        .get(source_id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("no endpoint registered for {source_id}"))?;

    let (parts, body) = request.into_parts();
    let Ok(method) = parts.method.as_str().parse::<Method>() else {
        let allow = endpoint
            .methods()
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        return Ok((
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, allow)],
            Json(serde_json::json!({
                "error": format!("Method {} not allowed", parts.method)
            })),
        )
            .into_response());
    };

    let Ok(body) = to_bytes(body, state.config.body_limit_bytes).await else {
        return Ok((
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(serde_json::json!({ "error": "Request body too large" })),
        )
            .into_response());
    };

    let mut endpoint_request = EndpointRequest::new(method)
        .with_params(matched.params)
        .with_body(body.to_vec());
    if let Some(query) = parts.uri.query() {
        endpoint_request = endpoint_request.with_query_string(query);
    }
    for (name, value) in &parts.headers {
        if let Ok(value) = value.to_str() {
            endpoint_request = endpoint_request.with_header(name.as_str(), value);
        }
    }

    let response = dispatch(endpoint.as_ref(), endpoint_request, &state.endpoint_ctx).await;
    tracing::debug!(endpoint = %source_id, status = response.status, "Endpoint answered");
    Ok(into_response(response))
}

fn into_response(response: EndpointResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut out = (status, Body::from(response.body)).into_response();
    for (name, value) in response.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                out.headers_mut().append(name, value);
            }
            _ => tracing::warn!(header = %name, "Dropping invalid endpoint response header"),
        }
    }
    out
}
