use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::OutputMode;
use crate::routing::{resolve_render_mode, ModeDecision, RenderMode, Route, RouteError};

use super::http_mapping::endpoint_error_to_response;
use super::traits::{Endpoint, EndpointContext};
use super::types::{EndpointRequest, EndpointResponse, Method};
use super::error::EndpointError;

/// Endpoints registered in code, keyed by their pattern.
#[derive(Clone, Default)]
pub struct EndpointRegistry {
    endpoints: BTreeMap<String, Arc<dyn Endpoint>>,
}

impl std::fmt::Debug for EndpointRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.endpoints.keys()).finish()
    }
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, endpoint: Arc<dyn Endpoint>) -> Result<(), RouteError> {
        let pattern = endpoint.pattern().to_string();
        if let Some(existing) = self.endpoints.get(&pattern) {
            return Err(RouteError::Ambiguous {
                first: existing.pattern().to_string(),
                second: pattern.clone(),
                pattern,
            });
        }
        self.endpoints.insert(pattern, endpoint);
        Ok(())
    }

    pub fn with(mut self, endpoint: Arc<dyn Endpoint>) -> Result<Self, RouteError> {
        self.register(endpoint)?;
        Ok(self)
    }

    /// Look up an endpoint by the source id of its route (its pattern).
    pub fn get(&self, source_id: &str) -> Option<&Arc<dyn Endpoint>> {
        self.endpoints.get(source_id)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Routes for every endpoint, with render modes resolved for `output`.
    pub fn routes(&self, output: OutputMode) -> Result<Vec<(Route, ModeDecision)>, RouteError> {
        self.endpoints
            .values()
            .map(|endpoint| {
                let decision = endpoint_render_mode(endpoint.as_ref(), output);
                Ok((Route::endpoint(endpoint.pattern(), decision.mode)?, decision))
            })
            .collect()
    }
}

/// Render mode for one endpoint under `output`.
///
/// An endpoint that does not answer `GET` has nothing to pre-render and is
/// always left to the server. `overridden` is set when that contradicts a
/// static site or the endpoint's own `prerender = true`.
pub fn endpoint_render_mode(endpoint: &dyn Endpoint, output: OutputMode) -> ModeDecision {
    if endpoint.methods().contains(&Method::Get) {
        return resolve_render_mode(output, endpoint.prerender());
    }
    ModeDecision {
        mode: RenderMode::Server,
        overridden: output == OutputMode::Static || endpoint.prerender() == Some(true),
    }
}

/// Run an endpoint for one request. Errors become structured JSON responses.
pub async fn dispatch(
    endpoint: &dyn Endpoint,
    request: EndpointRequest,
    ctx: &EndpointContext,
) -> EndpointResponse {
    let allowed = endpoint.methods();
    let accepts = allowed.contains(&request.method)
        || (request.method == Method::Head && allowed.contains(&Method::Get));
    if !accepts {
        return endpoint_error_to_response(&EndpointError::MethodNotAllowed {
            method: request.method,
            allowed: allowed.to_vec(),
        });
    }

    let head = request.method == Method::Head;
    let request = if head {
        EndpointRequest {
            method: Method::Get,
            ..request
        }
    } else {
        request
    };

    match endpoint.handle(request, ctx).await {
        Ok(mut response) => {
            if head {
                response.body.clear();
            }
            response
        }
        Err(error) => endpoint_error_to_response(&error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::Result;
    use crate::routing::RenderMode;
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;

    struct Greeting;

    #[derive(Deserialize)]
    struct GreetingBody {
        to: String,
    }

    #[async_trait]
    impl Endpoint for Greeting {
        fn pattern(&self) -> &str {
            "/api/greet/[name]"
        }

        fn methods(&self) -> &[Method] {
            &[Method::Get, Method::Post]
        }

        async fn handle(
            &self,
            request: EndpointRequest,
            _ctx: &EndpointContext,
        ) -> Result<EndpointResponse> {
            match request.method {
                Method::Post => {
                    let body: GreetingBody = request.json()?;
                    EndpointResponse::json(201, &json!({"to": body.to}))
                }
                _ => {
                    let name = request.params.get_str("name").unwrap_or_default();
                    if name == "nobody" {
                        return Err(EndpointError::NotFound(name));
                    }
                    Ok(EndpointResponse::text(200, format!("Be mine, {name}")))
                }
            }
        }
    }

    struct Prerendered;

    #[async_trait]
    impl Endpoint for Prerendered {
        fn pattern(&self) -> &str {
            "/feed.json"
        }

        fn prerender(&self) -> Option<bool> {
            Some(true)
        }

        async fn handle(
            &self,
            _request: EndpointRequest,
            _ctx: &EndpointContext,
        ) -> Result<EndpointResponse> {
            EndpointResponse::json(200, &json!([]))
        }
    }

    fn params(name: &str) -> crate::routing::PageParams {
        let mut params = crate::routing::PageParams::new();
        params.insert("name", crate::routing::ParamValue::One(name.to_string()));
        params
    }

    #[tokio::test]
    async fn test_dispatch_get() {
        let request = EndpointRequest::new(Method::Get).with_params(params("Sam"));
        let response = dispatch(&Greeting, request, &EndpointContext::default()).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"Be mine, Sam");
    }

    #[tokio::test]
    async fn test_dispatch_head_drops_body() {
        let request = EndpointRequest::new(Method::Head).with_params(params("Sam"));
        let response = dispatch(&Greeting, request, &EndpointContext::default()).await;
        assert_eq!(response.status, 200);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_rejects_unlisted_method() {
        let response = dispatch(
            &Greeting,
            EndpointRequest::new(Method::Delete),
            &EndpointContext::default(),
        )
        .await;
        assert_eq!(response.status, 405);
        assert_eq!(response.header("allow"), Some("GET, POST"));
    }

    #[tokio::test]
    async fn test_dispatch_maps_errors() {
        let ctx = EndpointContext::default();

        let response = dispatch(
            &Greeting,
            EndpointRequest::new(Method::Get).with_params(params("nobody")),
            &ctx,
        )
        .await;
        assert_eq!(response.status, 404);

        let response = dispatch(
            &Greeting,
            EndpointRequest::new(Method::Post)
                .with_header("content-type", "application/json")
                .with_body("{oops"),
            &ctx,
        )
        .await;
        assert_eq!(response.status, 400);

        let response = dispatch(
            &Greeting,
            EndpointRequest::new(Method::Post)
                .with_header("content-type", "text/plain")
                .with_body("hi"),
            &ctx,
        )
        .await;
        assert_eq!(response.status, 415);
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert!(body["error"].as_str().unwrap().contains("text/plain"));
    }

    #[test]
    fn test_registry_routes_and_duplicates() {
        let mut registry = EndpointRegistry::new()
            .with(Arc::new(Greeting))
            .unwrap()
            .with(Arc::new(Prerendered))
            .unwrap();

        let routes = registry.routes(OutputMode::Server).unwrap();
        let (feed, _) = routes.iter().find(|(r, _)| r.source_id == "/feed.json").unwrap();
        assert_eq!(feed.render_mode, RenderMode::Static);
        let (greet, _) = routes
            .iter()
            .find(|(r, _)| r.source_id == "/api/greet/[name]")
            .unwrap();
        assert_eq!(greet.render_mode, RenderMode::Server);

        assert!(registry.get("/feed.json").is_some());
        assert!(matches!(
            registry.register(Arc::new(Greeting)),
            Err(RouteError::Ambiguous { .. })
        ));
        assert_eq!(registry.len(), 2);
    }

    struct Inbox;

    #[async_trait]
    impl Endpoint for Inbox {
        fn pattern(&self) -> &str {
            "/api/inbox"
        }

        fn methods(&self) -> &[Method] {
            &[Method::Post]
        }

        async fn handle(
            &self,
            _request: EndpointRequest,
            _ctx: &EndpointContext,
        ) -> Result<EndpointResponse> {
            EndpointResponse::json(201, &json!({}))
        }
    }

    #[test]
    fn test_endpoint_without_get_is_never_prerendered() {
        let decision = endpoint_render_mode(&Inbox, OutputMode::Static);
        assert_eq!(decision.mode, RenderMode::Server);
        assert!(decision.overridden);

        let decision = endpoint_render_mode(&Inbox, OutputMode::Hybrid);
        assert_eq!(decision.mode, RenderMode::Server);
        assert!(!decision.overridden);

        let decision = endpoint_render_mode(&Greeting, OutputMode::Static);
        assert_eq!(decision.mode, RenderMode::Static);
        assert!(!decision.overridden);
    }
}
