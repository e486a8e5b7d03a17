//! Loading a project from disk into an immutable, shareable value.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use valentine_core::config::{EnvVars, SiteConfig};
use valentine_core::content::{
    Collection, CollectionSchema, ContentStore, EntrySource, LoadPolicy,
};
use valentine_core::endpoint::{EndpointContext, EndpointRegistry};
use valentine_core::routing::{
    is_routable_source, resolve_render_mode, validate_static_paths, RouteMatch, Route, RouteTable,
};
use valentine_render::{PageFormat, RenderedPage, Renderer, TemplateSet};

use crate::error::{Result, SiteError};
use crate::fs::{collect_files, read_to_string, subdirectories};

pub const CONFIG_FILE: &str = "valentine.toml";
pub const PAGES_DIR: &str = "src/pages";
pub const LAYOUTS_DIR: &str = "src/layouts";
pub const COMPONENTS_DIR: &str = "src/components";
pub const CONTENT_DIR: &str = "src/content";
pub const PUBLIC_DIR: &str = "public";

/// Where environment variables come from.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// The process environment layered over the project's `.env` file.
    #[default]
    Process,
    /// Exactly these variables; `.env` is ignored.
    Explicit(Vec<(String, String)>),
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Fail on any rejected content entry, whatever the collection says.
    pub strict: bool,
    pub endpoints: EndpointRegistry,
    pub env: EnvSource,
}

/// A route whose render mode differs from what it or the site asked for:
/// a page whose `prerender = false` was ignored because the site is built
/// fully static, or an endpoint left to the server because it cannot answer
/// `GET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeOverride {
    pub source_id: String,
}

/// Everything the builder and server need, loaded once.
#[derive(Debug)]
pub struct Project {
    root: PathBuf,
    config: Arc<SiteConfig>,
    env: Arc<EnvVars>,
    content: Arc<ContentStore>,
    renderer: Arc<Renderer>,
    routes: RouteTable,
    endpoints: EndpointRegistry,
    overrides: Vec<ModeOverride>,
}

impl Project {
    /// Read `valentine.toml`, templates, pages and content under `root` and
    /// build the route table. A missing config file means all defaults.
    pub fn load(root: impl Into<PathBuf>, options: LoadOptions) -> Result<Self> {
        let root = root.into();
        let config_path = root.join(CONFIG_FILE);
        let config = if config_path.is_file() {
            SiteConfig::from_toml(&read_to_string(&config_path)?)?
        } else {
            tracing::debug!(path = %config_path.display(), "No config file, using defaults");
            SiteConfig::default()
        };
        let config = Arc::new(config);

        let env = Arc::new(load_env(&root, &config, options.env)?);
        let content = Arc::new(load_content(&root, &config, options.strict)?);

        let mut templates = TemplateSet::new();
        for (name, path) in collect_files(&root.join(LAYOUTS_DIR))? {
            templates.add_layout(name, read_to_string(&path)?);
        }
        for (name, path) in collect_files(&root.join(COMPONENTS_DIR))? {
            templates.add_component(name, read_to_string(&path)?);
        }
        let mut page_ids = Vec::new();
        for (source_id, path) in collect_files(&root.join(PAGES_DIR))? {
            if !is_routable_source(&source_id) {
                continue;
            }
            if PageFormat::from_source(&source_id).is_none() {
                tracing::warn!(source = %source_id, "Ignoring page with unsupported extension");
                continue;
            }
            templates.add_page(&source_id, &read_to_string(&path)?)?;
            page_ids.push(source_id);
        }

        let mut routes = Vec::with_capacity(page_ids.len() + options.endpoints.len());
        let mut overrides = Vec::new();
        for source_id in &page_ids {
            let prerender = templates.page(source_id).and_then(|p| p.meta.prerender);
            let decision = resolve_render_mode(config.output, prerender);
            if decision.overridden {
                tracing::warn!(
                    source = %source_id,
                    "Page sets prerender = false but output is static; pre-rendering it"
                );
                overrides.push(ModeOverride {
                    source_id: source_id.clone(),
                });
            }
            routes.push(Route::page(source_id, decision.mode)?);
        }
        for (route, decision) in options.endpoints.routes(config.output)? {
            if decision.overridden {
                tracing::warn!(
                    endpoint = %route.source_id,
                    "Endpoint does not answer GET and cannot be pre-rendered; leaving it to the server"
                );
                overrides.push(ModeOverride {
                    source_id: route.source_id.clone(),
                });
            }
            routes.push(route);
        }
        let routes = RouteTable::build(routes)?;

        let renderer = Renderer::new(templates, content.clone(), config.clone(), env.clone())?;

        tracing::info!(
            root = %root.display(),
            pages = page_ids.len(),
            endpoints = options.endpoints.len(),
            collections = content.names().count(),
            output = ?config.output,
            "Project loaded"
        );

        Ok(Self {
            root,
            config,
            env,
            content,
            renderer: Arc::new(renderer),
            routes,
            endpoints: options.endpoints,
            overrides,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn public_dir(&self) -> PathBuf {
        self.root.join(PUBLIC_DIR)
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn env(&self) -> &EnvVars {
        &self.env
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    pub fn renderer(&self) -> &Arc<Renderer> {
        &self.renderer
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn endpoints(&self) -> &EndpointRegistry {
        &self.endpoints
    }

    pub fn overrides(&self) -> &[ModeOverride] {
        &self.overrides
    }

    pub fn endpoint_context(&self) -> EndpointContext {
        EndpointContext {
            config: self.config.clone(),
            content: self.content.clone(),
            env: self.env.clone(),
        }
    }

    /// Render a page route for a request.
    ///
    /// Pages that enumerate paths only answer for the URLs they enumerate,
    /// and receive that path's props. Returns `None` when the URL is not one
    /// of them.
    pub fn render_on_demand(&self, matched: &RouteMatch<'_>, path: &str) -> Result<Option<RenderedPage>> {
        let route = matched.route;
        let mut props = Map::<String, Value>::new();

        if let Some(page) = self.renderer.page(&route.source_id) {
            if page.meta.paths.is_some() {
                let paths = page.static_paths(&self.content)?;
                let resolved = validate_static_paths(route, paths)?;
                let url = route.pattern.build_url(&matched.params)?;
                match resolved.into_iter().find(|r| r.url == url) {
                    Some(found) => props = found.props,
                    None => return Ok(None),
                }
            }
        }

        let rendered = self
            .renderer
            .render_page(&route.source_id, &matched.params, &props, path)?;
        Ok(Some(rendered))
    }
}

fn load_env(root: &Path, config: &SiteConfig, source: EnvSource) -> Result<EnvVars> {
    let vars = match source {
        EnvSource::Explicit(vars) => vars,
        EnvSource::Process => {
            let dotenv = root.join(".env");
            let mut vars = if dotenv.is_file() {
                read_dotenv(&dotenv)?
            } else {
                Vec::new()
            };
            // Process variables win over `.env`.
            vars.extend(std::env::vars());
            vars
        }
    };
    Ok(EnvVars::partition(&config.env.public_prefix, vars))
}

/// Variables declared in a `.env` file, in file order.
fn read_dotenv(path: &Path) -> Result<Vec<(String, String)>> {
    let dotenv_error = |e: dotenvy::Error| SiteError::Dotenv {
        path: path.display().to_string(),
        reason: e.to_string(),
    };
    dotenvy::from_path_iter(path)
        .map_err(dotenv_error)?
        .map(|item| item.map_err(dotenv_error))
        .collect()
}

fn load_content(root: &Path, config: &SiteConfig, strict: bool) -> Result<ContentStore> {
    let mut store = ContentStore::new();

    for (name, dir) in subdirectories(&root.join(CONTENT_DIR))? {
        let (schema, policy) = match config.collections.get(&name) {
            Some(collection) => (collection.schema(), collection.policy()),
            None => {
                tracing::warn!(
                    collection = %name,
                    "No schema configured for collection; accepting any front-matter"
                );
                (CollectionSchema::default().passthrough(true), LoadPolicy::Lenient)
            }
        };
        let policy = if strict { LoadPolicy::Strict } else { policy };

        let mut sources = Vec::new();
        for (path, file) in collect_files(&dir)? {
            let source = EntrySource::new(path, read_to_string(&file)?);
            if source.format().is_none() {
                tracing::debug!(collection = %name, path = %source.path, "Skipping non-entry file");
                continue;
            }
            sources.push(source);
        }

        let collection = Collection::load(&name, &schema, sources, policy)?;
        for rejected in collection.rejected() {
            tracing::warn!(
                collection = %name,
                path = %rejected.path,
                reason = %rejected.reason,
                "Content entry rejected"
            );
        }
        tracing::debug!(collection = %name, entries = collection.len(), "Collection loaded");
        store.insert(collection);
    }

    for name in config.collections.keys() {
        if store.get(name).is_none() {
            tracing::warn!(collection = %name, "Configured collection has no directory");
        }
    }

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SiteError;
    use valentine_core::content::ContentError;
    use valentine_core::routing::{RenderMode, RouteError};

    fn write(root: &Path, path: &str, contents: &str) {
        let path = root.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn options() -> LoadOptions {
        LoadOptions {
            env: EnvSource::Explicit(vec![]),
            ..LoadOptions::default()
        }
    }

    fn blog_project(root: &Path, output: &str) {
        write(
            root,
            CONFIG_FILE,
            &format!(
                r#"
output = "{output}"

[collections.blog.schema]
title = "string"
pubDate = "date"
"#
            ),
        );
        write(root, "src/pages/index.html", "<h1>Hello</h1>");
        write(
            root,
            "src/pages/blog/[slug].html",
            "---\npaths:\n  collection: blog\n---\n<h1>{{ props.entry.data.title }}</h1>",
        );
        write(root, "src/pages/blog/archive.html", "<h1>Archive</h1>");
        write(
            root,
            "src/pages/cards/[...path].html",
            "---\nprerender: false\n---\n<p>{{ params.path }}</p>",
        );
        write(root, "src/pages/_draft.html", "ignored");
        write(
            root,
            "src/content/blog/first-date.md",
            "---\ntitle: First Date\npubDate: 2024-02-14\n---\nRoses.",
        );
        write(
            root,
            "src/content/blog/no-date.md",
            "---\ntitle: Undated\n---\nNever shown.",
        );
    }

    #[test]
    fn test_load_discovers_pages_and_content() {
        let dir = tempfile::tempdir().unwrap();
        blog_project(dir.path(), "hybrid");

        let project = Project::load(dir.path(), options()).unwrap();

        let ids: Vec<_> = project
            .routes()
            .routes()
            .iter()
            .map(|r| r.source_id.as_str())
            .collect();
        assert_eq!(ids.len(), 4);
        assert!(!ids.contains(&"_draft.html"));

        let blog = project.content().get("blog").unwrap();
        assert_eq!(blog.len(), 1);
        assert_eq!(blog.rejected().len(), 1);
        assert_eq!(blog.rejected()[0].path, "no-date.md");

        let cards = project.routes().get("cards/[...path].html").unwrap();
        assert_eq!(cards.render_mode, RenderMode::Server);
        assert!(project.overrides().is_empty());
    }

    #[test]
    fn test_static_output_overrides_prerender_false() {
        let dir = tempfile::tempdir().unwrap();
        blog_project(dir.path(), "static");

        let project = Project::load(dir.path(), options()).unwrap();
        let cards = project.routes().get("cards/[...path].html").unwrap();
        assert_eq!(cards.render_mode, RenderMode::Static);
        assert_eq!(
            project.overrides(),
            &[ModeOverride {
                source_id: "cards/[...path].html".to_string()
            }]
        );
    }

    #[test]
    fn test_strict_load_fails_on_rejected_entry() {
        let dir = tempfile::tempdir().unwrap();
        blog_project(dir.path(), "static");

        let result = Project::load(
            dir.path(),
            LoadOptions {
                strict: true,
                ..options()
            },
        );
        assert!(matches!(
            result,
            Err(SiteError::Content(ContentError::StrictLoadFailed { .. }))
        ));
    }

    #[test]
    fn test_ambiguous_routes_fail_naming_both_sources() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/pages/blog/[slug].html", "a");
        write(dir.path(), "src/pages/blog/[id].html", "b");

        match Project::load(dir.path(), options()) {
            Err(SiteError::Route(RouteError::Ambiguous { first, second, .. })) => {
                assert_eq!(first, "blog/[id].html");
                assert_eq!(second, "blog/[slug].html");
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/pages/index.md", "# Hi");
        let project = Project::load(dir.path(), options()).unwrap();
        assert_eq!(project.config(), &SiteConfig::default());
        assert_eq!(project.routes().len(), 1);
    }

    #[test]
    fn test_unconfigured_collection_is_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "src/content/notes/hello.md",
            "---\nmood: smitten\n---\nhi",
        );
        let project = Project::load(dir.path(), options()).unwrap();
        let notes = project.content().get("notes").unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(
            notes.get("hello").unwrap().field("mood").and_then(|v| v.as_str().map(str::to_string)),
            Some("smitten".to_string())
        );
    }

    #[test]
    fn test_explicit_env_is_partitioned() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".env", "PUBLIC_FROM_FILE=ignored\n");
        let project = Project::load(
            dir.path(),
            LoadOptions {
                env: EnvSource::Explicit(vec![
                    ("PUBLIC_SITE_NAME".to_string(), "Be Mine".to_string()),
                    ("API_TOKEN".to_string(), "hunter22-secret".to_string()),
                ]),
                ..LoadOptions::default()
            },
        )
        .unwrap();
        assert!(project.env().is_public("PUBLIC_SITE_NAME"));
        assert!(!project.env().is_public("API_TOKEN"));
        assert_eq!(project.env().get("PUBLIC_FROM_FILE"), None);
    }

    #[test]
    fn test_render_on_demand_uses_enumerated_props() {
        let dir = tempfile::tempdir().unwrap();
        blog_project(dir.path(), "server");
        let project = Project::load(dir.path(), options()).unwrap();

        let matched = project.routes().match_path("/blog/first-date").unwrap();
        let page = project
            .render_on_demand(&matched, "/blog/first-date")
            .unwrap()
            .unwrap();
        assert!(page.html.contains("<h1>First Date</h1>"));

        let matched = project.routes().match_path("/blog/no-date").unwrap();
        assert!(project
            .render_on_demand(&matched, "/blog/no-date")
            .unwrap()
            .is_none());

        let matched = project.routes().match_path("/cards/red/roses").unwrap();
        let page = project
            .render_on_demand(&matched, "/cards/red/roses")
            .unwrap()
            .unwrap();
        assert!(page.html.contains("<p>red&#x2F;roses</p>"));
    }

    #[test]
    fn test_read_dotenv() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            ".env",
            "# secrets\nPUBLIC_SITE_NAME=\"Be Mine\"\nexport API_KEY='abc def'\nPUBLIC_MOTTO=\"roses\\nare red\"\nEMPTY=\n",
        );

        let vars = read_dotenv(&dir.path().join(".env")).unwrap();
        assert_eq!(
            vars,
            vec![
                ("PUBLIC_SITE_NAME".to_string(), "Be Mine".to_string()),
                ("API_KEY".to_string(), "abc def".to_string()),
                ("PUBLIC_MOTTO".to_string(), "roses\nare red".to_string()),
                ("EMPTY".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_malformed_dotenv_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".env", "NOT A VALID LINE\n");
        assert!(matches!(
            read_dotenv(&dir.path().join(".env")),
            Err(SiteError::Dotenv { .. })
        ));
    }
}
