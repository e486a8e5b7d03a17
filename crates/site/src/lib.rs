//! Project loading and static builds (Imperative Shell)
//!
//! This crate is the filesystem side of valentine. It reads a project from
//! disk, hands plain data to the pure crates, and writes their output back.
//!
//! # Architecture
//!
//! - [`Project::load`] reads `valentine.toml`, `.env`, templates, pages and
//!   content collections, then builds the route table.
//! - [`build`] renders every static route concurrently on tokio tasks and
//!   writes the output directory, the 404 page and integration files.
//!
//! Everything decided here is decided by `valentine_core`; this crate only
//! moves bytes and reports.

mod build;
mod error;
mod fs;
mod project;
mod sitemap;

pub use build::{build, check, BuildReport, NOT_FOUND_FILE};
pub use error::{sanitize_error, Result, SiteError};
pub use project::{
    EnvSource, LoadOptions, ModeOverride, Project, COMPONENTS_DIR, CONFIG_FILE, CONTENT_DIR,
    LAYOUTS_DIR, PAGES_DIR, PUBLIC_DIR,
};
pub use sitemap::{render_sitemap, SITEMAP_FILE};
