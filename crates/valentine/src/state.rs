//! Shared application state.
//!
//! Everything here is loaded once at startup and never mutated, so handlers
//! share it through `Arc`s without locking.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use valentine_core::endpoint::EndpointContext;
use valentine_site::Project;

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub project: Arc<Project>,
    /// Build output holding pre-rendered routes and public assets.
    pub out_dir: Arc<PathBuf>,
    pub endpoint_ctx: EndpointContext,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(project: Arc<Project>, out_dir: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            endpoint_ctx: project.endpoint_context(),
            project,
            out_dir: Arc::new(out_dir.into()),
            config: Arc::new(config),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}
