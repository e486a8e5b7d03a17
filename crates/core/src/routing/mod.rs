mod error;
mod mode;
mod params;
mod pattern;
mod static_paths;
mod table;

pub use error::{PatternError, Result, RouteError};
pub use mode::{resolve_render_mode, ModeDecision};
pub use params::{is_safe_segment, PageParams, ParamValue};
pub use pattern::{is_routable_source, normalize_path, RoutePattern, Segment, Specificity};
pub use static_paths::{output_file, validate_static_paths, ResolvedPath, StaticPath};
pub use table::{RenderMode, Route, RouteKind, RouteMatch, RouteTable};
