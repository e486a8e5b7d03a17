//! Endpoints the Valentine site registers in code.

mod compat;
mod posts;
mod valentines;

use std::sync::Arc;

use valentine_core::endpoint::EndpointRegistry;
use valentine_core::routing::RouteError;

pub use compat::Compatibility;
pub use posts::PostsFeed;
pub use valentines::SendValentine;

/// Every endpoint of the site.
pub fn site_endpoints() -> Result<EndpointRegistry, RouteError> {
    EndpointRegistry::new()
        .with(Arc::new(PostsFeed))?
        .with(Arc::new(SendValentine))?
        .with(Arc::new(Compatibility))
}
