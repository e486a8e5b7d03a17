//! Page rendering - tera templates, markdown and island hydration.
//!
//! Rendering is a pure function of the compiled templates, the page's params
//! and props, and the validated content. Nothing here touches the filesystem.

mod error;
mod functions;
mod markdown;
mod not_found;
mod page;
mod renderer;

pub use error::{RenderError, Result};
pub use functions::{CollectionFunction, IslandFunction, IslandLedger, MarkdownFilter};
pub use markdown::render_markdown;
pub use not_found::NotFoundTemplate;
pub use page::{CollectionPaths, PageFormat, PageMeta, PageSource, PathsSpec};
pub use renderer::{inject_scripts, RenderedPage, Renderer, TemplateSet};
