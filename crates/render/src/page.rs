//! Page sources: front-matter, body and static path enumeration.

use serde::Deserialize;
use serde_json::{Map, Value};
use valentine_core::content::{split_front_matter, CollectionQuery, ContentStore};
use valentine_core::routing::StaticPath;

use crate::error::{RenderError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFormat {
    /// A tera template producing HTML.
    Html,
    /// A markdown body, optionally wrapped in a layout.
    Markdown,
}

impl PageFormat {
    pub fn from_source(source_id: &str) -> Option<Self> {
        let (_, ext) = source_id.rsplit_once('.')?;
        match ext {
            "html" => Some(PageFormat::Html),
            "md" | "markdown" => Some(PageFormat::Markdown),
            _ => None,
        }
    }
}

/// Enumerate a dynamic route from a content collection.
///
/// ```yaml
/// paths:
///   collection: blog
///   param: slug
///   query: { exclude_drafts: true }
/// ```
///
/// Each entry becomes one path whose `param` is the entry id and whose
/// props hold the entry under `entry`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionPaths {
    pub collection: String,
    #[serde(default = "default_param")]
    pub param: String,
    #[serde(default)]
    pub query: CollectionQuery,
}

fn default_param() -> String {
    "slug".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PathsSpec {
    Collection(CollectionPaths),
    List(Vec<StaticPath>),
}

/// Recognized page front-matter keys; anything else is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    pub prerender: Option<bool>,
    pub layout: Option<String>,
    pub title: Option<String>,
    pub paths: Option<PathsSpec>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A page file discovered under `src/pages`.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSource {
    pub source_id: String,
    pub format: PageFormat,
    pub meta: PageMeta,
    pub body: String,
}

impl PageSource {
    /// Parse a page file. `source_id` is its path relative to the pages root.
    pub fn parse(source_id: &str, raw: &str) -> Result<Self> {
        let format = PageFormat::from_source(source_id).ok_or_else(|| RenderError::FrontMatter {
            source_id: source_id.to_string(),
            reason: "pages must be .html or .md files".to_string(),
        })?;

        let (yaml, body) = split_front_matter(raw);
        let meta = match yaml {
            Some(yaml) if !yaml.trim().is_empty() => {
                serde_yaml::from_str(yaml).map_err(|e| RenderError::FrontMatter {
                    source_id: source_id.to_string(),
                    reason: e.to_string(),
                })?
            }
            _ => PageMeta::default(),
        };

        Ok(Self {
            source_id: source_id.to_string(),
            format,
            meta,
            body: body.to_string(),
        })
    }

    /// Template name the page body is registered under.
    pub fn template_name(&self) -> String {
        format!("pages/{}", self.source_id)
    }

    /// Front-matter exposed to templates as `page`.
    pub fn context_value(&self) -> Value {
        let mut page = self.meta.extra.clone();
        if let Some(title) = &self.meta.title {
            page.insert("title".to_string(), Value::String(title.clone()));
        }
        page.insert("source".to_string(), Value::String(self.source_id.clone()));
        Value::Object(page)
    }

    /// Enumerate the `{params, props}` pairs this page declares.
    pub fn static_paths(&self, content: &ContentStore) -> Result<Vec<StaticPath>> {
        match &self.meta.paths {
            None => Ok(Vec::new()),
            Some(PathsSpec::List(list)) => Ok(list.clone()),
            Some(PathsSpec::Collection(spec)) => {
                let entries = content.query(&spec.collection, &spec.query)?;
                entries
                    .into_iter()
                    .map(|entry| {
                        let value = serde_json::to_value(entry).map_err(|e| RenderError::Paths {
                            source_id: self.source_id.clone(),
                            reason: e.to_string(),
                        })?;
                        Ok(StaticPath::new()
                            .param(spec.param.clone(), entry.id.clone())
                            .prop("entry", value))
                    })
                    .collect()
            }
        }
    }
}
