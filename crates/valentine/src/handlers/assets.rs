//! Built-in client scripts served under `/_valentine/`.

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use valentine_core::hydration::{DirectiveKind, HydrationScripts};

const JAVASCRIPT: &str = "application/javascript; charset=utf-8";

/// Script body for a built-in asset name such as `visible.js`.
pub fn client_script(name: &str) -> Option<String> {
    let stem = name.strip_suffix(".js")?;
    if stem == "island" {
        return Some(HydrationScripts::element_definition().to_string());
    }
    DirectiveKind::ALL
        .into_iter()
        .find(|kind| kind.name() == stem)
        .map(HydrationScripts::loader)
}

/// GET /_valentine/{file} - Directive loaders and the island element.
pub async fn client_asset(Path(file): Path<String>) -> Response {
    match client_script(&file) {
        Some(script) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, JAVASCRIPT),
                (header::CACHE_CONTROL, "public, max-age=3600"),
            ],
            script,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Content type for a file served from the build output.
pub fn content_type_for(file: &str) -> &'static str {
    let ext = file.rsplit_once('.').map(|(_, ext)| ext).unwrap_or_default();
    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" | "mjs" => JAVASCRIPT,
        "css" => "text/css; charset=utf-8",
        "json" | "map" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "webmanifest" => "application/manifest+json",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_script() {
        assert!(client_script("visible.js")
            .unwrap()
            .contains("IntersectionObserver"));
        assert!(client_script("island.js")
            .unwrap()
            .contains("customElements.define"));
        assert!(client_script("hover.js").is_none());
        assert!(client_script("idle").is_none());
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("index.html"), "text/html; charset=utf-8");
        assert_eq!(content_type_for("api/posts.json"), "application/json");
        assert_eq!(content_type_for("islands/Heart.JS"), JAVASCRIPT);
        assert_eq!(content_type_for("LICENSE"), "application/octet-stream");
    }
}
