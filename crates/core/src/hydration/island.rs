//! Island references and the markup emitted for each occurrence.

use serde_json::{Map, Value};

use crate::config::EnvVars;

use super::directive::HydrationDirective;
use super::error::HydrationError;
use super::markup::escape_attr;

/// One occurrence of an interactive component in a page.
#[derive(Debug, Clone, PartialEq)]
pub struct IslandReference {
    pub component: String,
    pub directive: Option<HydrationDirective>,
    pub props: Map<String, Value>,
}

impl IslandReference {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            directive: None,
            props: Map::new(),
        }
    }

    pub fn with_directive(mut self, directive: HydrationDirective) -> Self {
        self.directive = Some(directive);
        self
    }

    pub fn with_props(mut self, props: Map<String, Value>) -> Self {
        self.props = props;
        self
    }

    pub fn policy(&self) -> HydrationPolicy {
        HydrationPolicy::select(self)
    }

    /// See [`render_island`].
    pub fn render(
        &self,
        inner: &str,
        uid: usize,
        assets: &IslandAssets,
        env: &EnvVars,
    ) -> Result<String, HydrationError> {
        render_island(self, inner, uid, assets, env)
    }
}

/// Decision for one island occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrationPolicy {
    /// No client code at all; the component contributes static markup only.
    StaticOnly,
    /// Ship client code, loaded according to `directive`.
    Hydrate {
        directive: HydrationDirective,
        /// Whether the server renders the component markup first.
        prerender: bool,
    },
}

impl HydrationPolicy {
    /// Choose the policy for a reference. No directive means no client code.
    pub fn select(reference: &IslandReference) -> Self {
        match &reference.directive {
            None => Self::StaticOnly,
            Some(directive) => Self::Hydrate {
                prerender: directive.prerenders(),
                directive: directive.clone(),
            },
        }
    }

    pub fn ships_client_code(&self) -> bool {
        matches!(self, Self::Hydrate { .. })
    }

    /// Whether the component must be rendered on the server.
    pub fn needs_server_markup(&self) -> bool {
        match self {
            Self::StaticOnly => true,
            Self::Hydrate { prerender, .. } => *prerender,
        }
    }
}

/// Where client bundles for islands are served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IslandAssets {
    base: String,
}

impl IslandAssets {
    /// `base` is the site's URL prefix (`/` or `/valentine/`).
    pub fn new(base: &str) -> Self {
        let trimmed = base.trim_matches('/');
        let base = if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{trimmed}/")
        };
        Self { base }
    }

    pub fn component_url(&self, component: &str) -> String {
        format!("{}islands/{component}.js", self.base)
    }
}

impl Default for IslandAssets {
    fn default() -> Self {
        Self::new("/")
    }
}

/// Emit the markup for one island occurrence.
///
/// `inner` is the server-rendered component markup, or the fallback content
/// for client-only islands. Static-only islands return `inner` untouched, so
/// no island element and no client code reaches the page.
pub fn render_island(
    reference: &IslandReference,
    inner: &str,
    uid: usize,
    assets: &IslandAssets,
    env: &EnvVars,
) -> Result<String, HydrationError> {
    let (directive, prerender) = match HydrationPolicy::select(reference) {
        HydrationPolicy::StaticOnly => return Ok(inner.to_string()),
        HydrationPolicy::Hydrate {
            directive,
            prerender,
        } => (directive, prerender),
    };

    let props =
        serde_json::to_string(&reference.props).map_err(|e| HydrationError::Serialization {
            component: reference.component.clone(),
            reason: e.to_string(),
        })?;

    if let Some(variable) = env.find_private_leak(&props) {
        return Err(HydrationError::PrivateEnvLeak {
            component: reference.component.clone(),
            variable: variable.to_string(),
        });
    }

    let mut attrs = format!(
        r#"uid="{uid}" component="{}" component-url="{}" client="{}""#,
        escape_attr(&reference.component),
        escape_attr(&assets.component_url(&reference.component)),
        directive.kind().name(),
    );
    match &directive {
        HydrationDirective::Media(query) => {
            attrs.push_str(&format!(r#" media-query="{}""#, escape_attr(query)));
        }
        HydrationDirective::ClientOnly(runtime) => {
            attrs.push_str(&format!(r#" renderer="{}""#, escape_attr(runtime)));
        }
        _ => {}
    }
    attrs.push_str(&format!(r#" props="{}""#, escape_attr(&props)));
    if prerender {
        attrs.push_str(" ssr");
    }

    Ok(format!("<valentine-island {attrs}>{inner}</valentine-island>"))
}
