//! Static builds: every pre-rendered route written to an output directory.
//!
//! Artifacts are rendered concurrently, one tokio task each. Tasks share only
//! the immutable [`Project`]; each page render owns its island ledger.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use valentine_core::endpoint::{dispatch, EndpointRequest, Method};
use valentine_core::routing::{
    output_file, validate_static_paths, RenderMode, ResolvedPath, RouteError, RouteKind,
};

use crate::error::{Result, SiteError};
use crate::fs::{copy_dir, write_output};
use crate::project::Project;
use crate::sitemap::{render_sitemap, SITEMAP_FILE};

pub const NOT_FOUND_FILE: &str = "404.html";

/// What a build produced. URLs are relative to the site base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub pages: Vec<String>,
    pub endpoints: Vec<String>,
    /// Patterns of routes left for the server, including endpoints that
    /// cannot answer `GET`.
    pub skipped: Vec<String>,
    /// `collection/path: reason` for each content entry left out.
    pub rejected: Vec<String>,
    /// Routes whose render mode overrode their own or the site's setting.
    pub overrides: Vec<String>,
    pub assets: usize,
    pub integrations: Vec<String>,
}

/// One output file to produce.
struct Job {
    source_id: String,
    kind: RouteKind,
    file: String,
    resolved: ResolvedPath,
}

enum Artifact {
    Page(String),
    Endpoint(String),
}

/// Build every static route of `project` into `out_dir`, replacing whatever
/// was there.
pub async fn build(project: Arc<Project>, out_dir: &Path) -> Result<BuildReport> {
    let out_dir = out_dir.to_path_buf();
    if out_dir.exists() {
        tokio::fs::remove_dir_all(&out_dir)
            .await
            .map_err(|e| SiteError::io(&out_dir, e))?;
    }
    tokio::fs::create_dir_all(&out_dir)
        .await
        .map_err(|e| SiteError::io(&out_dir, e))?;

    let mut report = BuildReport {
        assets: copy_dir(&project.public_dir(), &out_dir).await?,
        ..BuildReport::default()
    };

    let jobs = plan(&project, &mut report)?;
    tracing::info!(
        artifacts = jobs.len(),
        skipped = report.skipped.len(),
        out_dir = %out_dir.display(),
        "Building"
    );

    let mut join_set = JoinSet::new();
    for job in jobs {
        join_set.spawn(run_job(project.clone(), out_dir.clone(), job));
    }
    while let Some(result) = join_set.join_next().await {
        match result.map_err(|e| SiteError::Task(e.to_string()))?? {
            Artifact::Page(url) => report.pages.push(url),
            Artifact::Endpoint(url) => report.endpoints.push(url),
        }
    }
    report.pages.sort();
    report.endpoints.sort();
    report.skipped.sort();

    let renderer = project.renderer().clone();
    let not_found = tokio::task::spawn_blocking(move || renderer.render_not_found(None))
        .await
        .map_err(|e| SiteError::Task(e.to_string()))??;
    write_output(&out_dir, NOT_FOUND_FILE, not_found.as_bytes()).await?;

    run_integrations(&project, &out_dir, &mut report).await?;
    record_project_notes(&project, &mut report);

    tracing::info!(
        pages = report.pages.len(),
        endpoints = report.endpoints.len(),
        rejected = report.rejected.len(),
        "Build complete"
    );
    Ok(report)
}

/// Validate every static route without rendering or writing anything.
///
/// The report lists the URLs a build would produce and the routes it would
/// leave to the server. Endpoints are not run, so their responses are only
/// checked by [`build`].
pub fn check(project: &Project) -> Result<BuildReport> {
    let mut report = BuildReport::default();
    for job in plan(project, &mut report)? {
        match job.kind {
            RouteKind::Page => report.pages.push(job.resolved.url),
            RouteKind::Endpoint => report.endpoints.push(job.resolved.url),
        }
    }
    report.pages.sort();
    report.endpoints.sort();
    report.skipped.sort();
    record_project_notes(project, &mut report);
    Ok(report)
}

fn record_project_notes(project: &Project, report: &mut BuildReport) {
    report.rejected = project
        .content()
        .rejected()
        .map(|(collection, entry)| format!("{collection}/{entry}"))
        .collect();
    report.overrides = project
        .overrides()
        .iter()
        .map(|o| o.source_id.clone())
        .collect();
}

/// Enumerate and validate every static route's paths. Routes are visited in
/// precedence order, so when two routes produce the same file the more
/// specific one keeps it.
fn plan(project: &Project, report: &mut BuildReport) -> Result<Vec<Job>> {
    let ctx = project.endpoint_context();
    let mut claimed = HashSet::new();
    let mut jobs = Vec::new();

    for route in project.routes().routes() {
        if route.render_mode == RenderMode::Server {
            report.skipped.push(route.pattern.to_string());
            continue;
        }

        let paths = match route.kind {
            RouteKind::Page => match project.renderer().page(&route.source_id) {
                Some(page) => page.static_paths(project.content())?,
                None => continue,
            },
            RouteKind::Endpoint => match project.endpoints().get(&route.source_id) {
                Some(endpoint) => {
                    endpoint
                        .static_paths(&ctx)
                        .map_err(|e| RouteError::InvalidStaticPath {
                            source_id: route.source_id.clone(),
                            reason: e.to_string(),
                        })?
                }
                None => continue,
            },
        };

        for resolved in validate_static_paths(route, paths)? {
            let file = output_file(&resolved.url, route.kind);
            if !claimed.insert(file.clone()) {
                tracing::warn!(
                    source = %route.source_id,
                    url = %resolved.url,
                    "Output already produced by a more specific route; skipping"
                );
                continue;
            }
            jobs.push(Job {
                source_id: route.source_id.clone(),
                kind: route.kind,
                file,
                resolved,
            });
        }
    }

    Ok(jobs)
}

async fn run_job(project: Arc<Project>, out_dir: PathBuf, job: Job) -> Result<Artifact> {
    let Job {
        source_id,
        kind,
        file,
        resolved,
    } = job;

    match kind {
        RouteKind::Page => {
            let renderer = project.renderer().clone();
            let url = resolved.url.clone();
            let rendered = tokio::task::spawn_blocking(move || {
                renderer.render_page(&source_id, &resolved.params, &resolved.props, &resolved.url)
            })
            .await
            .map_err(|e| SiteError::Task(e.to_string()))??;

            write_output(&out_dir, &file, rendered.html.as_bytes()).await?;
            tracing::debug!(url = %url, islands = rendered.islands, "Page written");
            Ok(Artifact::Page(url))
        }
        RouteKind::Endpoint => {
            let endpoint = project
                .endpoints()
                .get(&source_id)
                .cloned()
                .ok_or_else(|| SiteError::Task(format!("endpoint `{source_id}` vanished")))?;
            let request = EndpointRequest::new(Method::Get).with_params(resolved.params);
            let response = dispatch(endpoint.as_ref(), request, &project.endpoint_context()).await;
            if response.status != 200 {
                return Err(SiteError::Endpoint {
                    pattern: source_id,
                    url: resolved.url,
                    status: response.status,
                });
            }

            write_output(&out_dir, &file, &response.body).await?;
            tracing::debug!(url = %resolved.url, bytes = response.body.len(), "Endpoint written");
            Ok(Artifact::Endpoint(resolved.url))
        }
    }
}

async fn run_integrations(project: &Project, out_dir: &Path, report: &mut BuildReport) -> Result<()> {
    let config = project.config();
    for name in &config.integrations {
        match name.as_str() {
            "sitemap" => {
                if config.site.is_none() {
                    tracing::warn!("The sitemap integration needs `site`; skipping");
                    continue;
                }
                let urls: Vec<String> = report
                    .pages
                    .iter()
                    .filter(|url| url.as_str() != "/404")
                    .filter_map(|url| config.absolute_url(url))
                    .collect();
                let xml = render_sitemap(urls.iter().map(String::as_str));
                write_output(out_dir, SITEMAP_FILE, xml.as_bytes()).await?;
                report.integrations.push(name.clone());
            }
            other => tracing::warn!(integration = %other, "Unknown integration; skipping"),
        }
    }
    Ok(())
}
