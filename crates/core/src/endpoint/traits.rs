use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{EnvVars, SiteConfig};
use crate::content::ContentStore;
use crate::routing::StaticPath;

use super::error::Result;
use super::types::{EndpointRequest, EndpointResponse, Method};

/// Read-only project state an endpoint may consult.
#[derive(Debug, Clone, Default)]
pub struct EndpointContext {
    pub config: Arc<SiteConfig>,
    pub content: Arc<ContentStore>,
    pub env: Arc<EnvVars>,
}

/// A handler-backed route producing a non-HTML response.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// URL pattern, using the page grammar (`/api/notes/[id]`).
    fn pattern(&self) -> &str;

    /// Methods the endpoint answers. `HEAD` is implied by `GET`.
    fn methods(&self) -> &[Method] {
        &[Method::Get]
    }

    /// Pre-rendering preference, resolved against the site output mode.
    fn prerender(&self) -> Option<bool> {
        None
    }

    /// Parameter sets to pre-render when the route is static and dynamic.
    fn static_paths(&self, _ctx: &EndpointContext) -> Result<Vec<StaticPath>> {
        Ok(Vec::new())
    }

    async fn handle(
        &self,
        request: EndpointRequest,
        ctx: &EndpointContext,
    ) -> Result<EndpointResponse>;
}
