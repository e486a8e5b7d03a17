mod error;
mod http_mapping;
mod registry;
mod traits;
mod types;

pub use error::{EndpointError, Result};
pub use http_mapping::{endpoint_error_to_response, endpoint_error_to_status_code};
pub use registry::{dispatch, endpoint_render_mode, EndpointRegistry};
pub use traits::{Endpoint, EndpointContext};
pub use types::{EndpointRequest, EndpointResponse, Method};
