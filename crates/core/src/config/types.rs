use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::content::{CollectionSchema, FieldSchema, LoadPolicy};

use super::error::ConfigError;

/// How the site is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Every route is pre-rendered at build time.
    #[default]
    Static,
    /// Routes render per request unless they opt into pre-rendering.
    Server,
    /// Routes are pre-rendered unless they opt out.
    Hybrid,
}

impl OutputMode {
    /// Whether a server is needed to answer any route.
    pub fn has_server_routes(self) -> bool {
        !matches!(self, OutputMode::Static)
    }
}

/// `[env]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvConfig {
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
}

fn default_public_prefix() -> String {
    "PUBLIC_".to_string()
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            public_prefix: default_public_prefix(),
        }
    }
}

/// `[collections.<name>]` table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionConfig {
    /// Fail the whole load when any entry is rejected.
    #[serde(default)]
    pub strict: bool,
    /// Keep front-matter keys the schema does not declare.
    #[serde(default)]
    pub passthrough: bool,
    #[serde(default)]
    pub schema: BTreeMap<String, FieldSchema>,
}

impl CollectionConfig {
    pub fn schema(&self) -> CollectionSchema {
        CollectionSchema::new(self.schema.clone()).passthrough(self.passthrough)
    }

    pub fn policy(&self) -> LoadPolicy {
        if self.strict {
            LoadPolicy::Strict
        } else {
            LoadPolicy::Lenient
        }
    }
}

/// Project configuration read from `valentine.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Deployed origin, used for absolute URLs and the sitemap.
    #[serde(default)]
    pub site: Option<Url>,
    #[serde(default = "default_base")]
    pub base: String,
    #[serde(default)]
    pub output: OutputMode,
    /// Integration names, run in order after a build.
    #[serde(default)]
    pub integrations: Vec<String>,
    /// Deployment adapter name. Recorded, not interpreted.
    #[serde(default)]
    pub adapter: Option<String>,
    #[serde(default)]
    pub env: EnvConfig,
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionConfig>,
}

fn default_base() -> String {
    "/".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site: None,
            base: default_base(),
            output: OutputMode::default(),
            integrations: Vec::new(),
            adapter: None,
            env: EnvConfig::default(),
            collections: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Parse and shape-check a `valentine.toml` document.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let mut config: SiteConfig =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.message().to_string()))?;

        config.base = normalize_base(&config.base)?;
        if config.env.public_prefix.is_empty() {
            return Err(ConfigError::EmptyPublicPrefix);
        }
        Ok(config)
    }

    /// `base` with exactly one leading and one trailing `/`.
    pub fn normalized_base(&self) -> &str {
        &self.base
    }

    /// Site-relative URL for a route path, with `base` applied.
    pub fn url_for(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}{}", self.base, path)
    }

    /// Absolute URL for a route path. `None` when `site` is not configured.
    pub fn absolute_url(&self, path: &str) -> Option<String> {
        let site = self.site.as_ref()?;
        site.join(&self.url_for(path)).ok().map(String::from)
    }

    /// Remove `base` from a request path. `None` when the path is outside it.
    pub fn strip_base<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.base == "/" {
            return Some(path);
        }
        let bare = self.base.trim_end_matches('/');
        match path.strip_prefix(bare) {
            Some("") => Some("/"),
            Some(rest) if rest.starts_with('/') => Some(rest),
            _ => None,
        }
    }

    pub fn has_integration(&self, name: &str) -> bool {
        self.integrations.iter().any(|i| i == name)
    }
}

fn normalize_base(base: &str) -> Result<String, ConfigError> {
    if base.contains("://") || base.contains(['?', '#', ' ', '\\']) {
        return Err(ConfigError::InvalidBase(base.to_string()));
    }
    let trimmed = base.trim_matches('/');
    if trimmed.is_empty() {
        Ok("/".to_string())
    } else {
        Ok(format!("/{trimmed}/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::FieldType;

    #[test]
    fn test_defaults() {
        let config = SiteConfig::from_toml("").unwrap();
        assert_eq!(config, SiteConfig::default());
        assert_eq!(config.output, OutputMode::Static);
        assert_eq!(config.env.public_prefix, "PUBLIC_");
    }

    #[test]
    fn test_full_config() {
        let config = SiteConfig::from_toml(
            r#"
site = "https://valentine.example"
base = "love"
output = "hybrid"
integrations = ["sitemap"]
adapter = "node"

[env]
public_prefix = "VALENTINE_PUBLIC_"

[collections.blog]
strict = true

[collections.blog.schema]
title = "string"
pubDate = "date"
draft = { type = "boolean", default = false }
"#,
        )
        .unwrap();

        assert_eq!(config.base, "/love/");
        assert_eq!(config.output, OutputMode::Hybrid);
        assert_eq!(config.integrations, vec!["sitemap".to_string()]);
        assert_eq!(config.adapter.as_deref(), Some("node"));
        assert_eq!(config.env.public_prefix, "VALENTINE_PUBLIC_");

        let blog = &config.collections["blog"];
        assert_eq!(blog.policy(), LoadPolicy::Strict);
        assert_eq!(blog.schema["title"].ty, FieldType::String);
        assert!(blog.schema["draft"].default.is_some());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = SiteConfig::from_toml("outptu = \"server\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_output_is_rejected() {
        assert!(SiteConfig::from_toml("output = \"edge\"").is_err());
    }

    #[test]
    fn test_invalid_base() {
        assert_eq!(
            SiteConfig::from_toml("base = \"https://x.dev/\"").unwrap_err(),
            ConfigError::InvalidBase("https://x.dev/".to_string())
        );
    }

    #[test]
    fn test_empty_public_prefix() {
        assert_eq!(
            SiteConfig::from_toml("[env]\npublic_prefix = \"\"").unwrap_err(),
            ConfigError::EmptyPublicPrefix
        );
    }

    #[test]
    fn test_urls_with_base() {
        let config = SiteConfig::from_toml(
            "site = \"https://valentine.example\"\nbase = \"/love/\"",
        )
        .unwrap();

        assert_eq!(config.url_for("/"), "/love/");
        assert_eq!(config.url_for("/blog/first"), "/love/blog/first");
        assert_eq!(
            config.absolute_url("/blog/first").as_deref(),
            Some("https://valentine.example/love/blog/first")
        );
    }

    #[test]
    fn test_absolute_url_requires_site() {
        assert_eq!(SiteConfig::default().absolute_url("/"), None);
    }

    #[test]
    fn test_strip_base() {
        let config = SiteConfig::from_toml("base = \"/love\"").unwrap();
        assert_eq!(config.strip_base("/love"), Some("/"));
        assert_eq!(config.strip_base("/love/blog"), Some("/blog"));
        assert_eq!(config.strip_base("/lovely"), None);
        assert_eq!(config.strip_base("/blog"), None);

        assert_eq!(SiteConfig::default().strip_base("/blog"), Some("/blog"));
    }
}
