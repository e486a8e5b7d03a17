//! Pure site logic - no I/O, no rendering, no side effects.
//!
//! This crate provides:
//! - File-based routing with literal > dynamic > catch-all precedence
//! - Island hydration policy, island markup and client loader scripts
//! - Content collection schemas, validation and queries
//! - Project configuration and the public/private environment split
//! - Endpoint request/response types and HTTP status mapping
//!
//! # Example
//!
//! ```
//! use valentine_core::routing::{RenderMode, Route, RouteTable};
//!
//! let table = RouteTable::build(vec![
//!     Route::page("blog/[slug].html", RenderMode::Static).unwrap(),
//!     Route::page("blog/archive.html", RenderMode::Static).unwrap(),
//! ])
//! .unwrap();
//!
//! let matched = table.match_path("/blog/archive").unwrap();
//! assert_eq!(matched.route.source_id, "blog/archive.html");
//! ```

pub mod config;
pub mod content;
pub mod endpoint;
pub mod hydration;
pub mod routing;
