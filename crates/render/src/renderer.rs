//! The page renderer: one compiled tera environment, cloned per render so
//! each page gets its own island ledger.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use askama::Template;
use serde_json::{json, Map, Value};
use tera::{Context, Tera};
use valentine_core::config::{EnvVars, SiteConfig};
use valentine_core::content::ContentStore;
use valentine_core::hydration::{DirectiveSet, HydrationScripts, IslandAssets};
use valentine_core::routing::PageParams;

use crate::error::{RenderError, Result};
use crate::functions::{CollectionFunction, IslandFunction, IslandLedger, MarkdownFilter};
use crate::markdown::render_markdown;
use crate::not_found::NotFoundTemplate;
use crate::page::{PageFormat, PageSource};

/// Layouts, components and pages of a project, before compilation.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    layouts: BTreeMap<String, String>,
    components: BTreeMap<String, String>,
    pages: BTreeMap<String, PageSource>,
}

impl TemplateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// `name` is the path under the layouts root, e.g. `base.html`.
    pub fn add_layout(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.layouts.insert(name.into(), source.into());
    }

    /// `name` is the path under the components root, e.g. `HeartCounter.html`.
    pub fn add_component(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.components.insert(name.into(), source.into());
    }

    pub fn add_page(&mut self, source_id: &str, raw: &str) -> Result<()> {
        let page = PageSource::parse(source_id, raw)?;
        self.pages.insert(source_id.to_string(), page);
        Ok(())
    }

    pub fn page(&self, source_id: &str) -> Option<&PageSource> {
        self.pages.get(source_id)
    }

    pub fn pages(&self) -> impl Iterator<Item = &PageSource> {
        self.pages.values()
    }
}

/// A rendered page and the islands it contains.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub html: String,
    pub islands: usize,
    pub directives: DirectiveSet,
}

pub struct Renderer {
    tera: Arc<Tera>,
    pages: BTreeMap<String, PageSource>,
    layouts: BTreeSet<String>,
    config: Arc<SiteConfig>,
    env: Arc<EnvVars>,
    assets: IslandAssets,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("pages", &self.pages.keys().collect::<Vec<_>>())
            .field("layouts", &self.layouts)
            .finish()
    }
}

impl Renderer {
    /// Compile every template. Syntax errors and broken inheritance surface
    /// here rather than at render time.
    pub fn new(
        templates: TemplateSet,
        content: Arc<ContentStore>,
        config: Arc<SiteConfig>,
        env: Arc<EnvVars>,
    ) -> Result<Self> {
        let mut sources = Vec::new();
        let mut layouts = BTreeSet::new();
        for (name, source) in templates.layouts {
            let name = format!("layouts/{name}");
            layouts.insert(name.clone());
            sources.push((name, source));
        }
        for (name, source) in templates.components {
            sources.push((format!("components/{name}"), source));
        }
        for page in templates.pages.values() {
            if page.format == PageFormat::Html {
                sources.push((page.template_name(), page.body.clone()));
            }
        }

        let mut tera = Tera::default();
        tera.add_raw_templates(sources)
            .map_err(|e| RenderError::from_tera("templates", e))?;
        tera.register_filter("markdown", MarkdownFilter);
        tera.register_function("collection", CollectionFunction::new(content));

        Ok(Self {
            tera: Arc::new(tera),
            pages: templates.pages,
            layouts,
            assets: IslandAssets::new(&config.base),
            config,
            env,
        })
    }

    pub fn page(&self, source_id: &str) -> Option<&PageSource> {
        self.pages.get(source_id)
    }

    /// Render one page for concrete params and props. `path` is the route
    /// path without `base`.
    pub fn render_page(
        &self,
        source_id: &str,
        params: &PageParams,
        props: &Map<String, Value>,
        path: &str,
    ) -> Result<RenderedPage> {
        let page = self
            .pages
            .get(source_id)
            .ok_or_else(|| RenderError::UnknownPage(source_id.to_string()))?;

        let ledger = Arc::new(IslandLedger::default());
        let mut tera = (*self.tera).clone();
        tera.register_function(
            "island",
            IslandFunction::new(
                self.tera.clone(),
                self.assets.clone(),
                self.env.clone(),
                ledger.clone(),
            ),
        );

        let mut context = self.context(page, params, props, path);
        let body = match page.format {
            PageFormat::Html => {
                let name = page.template_name();
                tera.render(&name, &context)
                    .map_err(|e| RenderError::from_tera(&name, e))?
            }
            PageFormat::Markdown => render_markdown(&page.body),
        };

        let html = match &page.meta.layout {
            Some(layout) => {
                let name = self.layout_name(page, layout)?;
                context.insert("content", &body);
                tera.render(&name, &context)
                    .map_err(|e| RenderError::from_tera(&name, e))?
            }
            None => body,
        };

        let directives = ledger.directives();
        let scripts = HydrationScripts::for_directives(directives, &self.env.client()).map_err(
            |e| RenderError::Template {
                template: page.template_name(),
                message: format!("could not encode public environment: {e}"),
            },
        )?;

        tracing::debug!(
            source = %source_id,
            path = %path,
            islands = ledger.count(),
            "Page rendered"
        );
        Ok(RenderedPage {
            html: inject_scripts(&html, &scripts),
            islands: ledger.count(),
            directives,
        })
    }

    /// The project's `404` page if it has one, otherwise the built-in page.
    pub fn render_not_found(&self, path: Option<&str>) -> Result<String> {
        let custom = ["404.html", "404.md"]
            .into_iter()
            .find(|id| self.pages.contains_key(*id));
        match custom {
            Some(id) => Ok(self
                .render_page(id, &PageParams::new(), &Map::new(), "/404")?
                .html),
            None => Ok(NotFoundTemplate {
                path,
                home: &self.config.base,
            }
            .render()?),
        }
    }

    fn layout_name(&self, page: &PageSource, layout: &str) -> Result<String> {
        let layout = layout.trim_start_matches("layouts/");
        [format!("layouts/{layout}"), format!("layouts/{layout}.html")]
            .into_iter()
            .find(|name| self.layouts.contains(name))
            .ok_or_else(|| RenderError::UnknownLayout {
                source_id: page.source_id.clone(),
                layout: layout.to_string(),
            })
    }

    fn context(
        &self,
        page: &PageSource,
        params: &PageParams,
        props: &Map<String, Value>,
        path: &str,
    ) -> Context {
        let mut context = Context::new();
        context.insert(
            "site",
            &json!({
                "url": self.config.site.as_ref().map(|u| u.as_str()),
                "base": self.config.base,
            }),
        );
        context.insert("params", params);
        context.insert("props", props);
        context.insert(
            "url",
            &json!({
                "path": self.config.url_for(path),
                "absolute": self.config.absolute_url(path),
            }),
        );
        context.insert("env", &self.env.server_view());
        context.insert("page", &page.context_value());
        context
    }
}

/// Insert `scripts` before the closing `</body>`, or append them.
pub fn inject_scripts(html: &str, scripts: &str) -> String {
    if scripts.is_empty() {
        return html.to_string();
    }
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(at) => format!("{}{}{}", &html[..at], scripts, &html[at..]),
        None => format!("{html}{scripts}"),
    }
}
