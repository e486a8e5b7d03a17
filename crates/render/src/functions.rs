//! Tera filters and functions available to every template.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{Map, Value};
use tera::{Context, Tera};
use valentine_core::config::EnvVars;
use valentine_core::content::{CollectionQuery, ContentStore, SortKey};
use valentine_core::hydration::{
    DirectiveSet, HydrationDirective, HydrationPolicy, IslandAssets, IslandReference,
};

use crate::markdown::render_markdown;

/// `{{ body | markdown }}`: render markdown to HTML. Output is not escaped.
pub struct MarkdownFilter;

impl tera::Filter for MarkdownFilter {
    fn filter(&self, value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        let text = value
            .as_str()
            .ok_or_else(|| tera::Error::msg("markdown filter expects a string"))?;
        Ok(Value::String(render_markdown(text)))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

const COLLECTION_ARGS: &[&str] = &["name", "where", "sort", "limit", "exclude_drafts"];

/// `collection(name="blog", sort="-pubDate", limit=3, tags="love")`: query a
/// content collection. Arguments other than the named ones are equality
/// filters, merged with an optional `where` object.
pub struct CollectionFunction {
    content: Arc<ContentStore>,
}

impl CollectionFunction {
    pub fn new(content: Arc<ContentStore>) -> Self {
        Self { content }
    }
}

impl tera::Function for CollectionFunction {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let name = args
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| tera::Error::msg("collection function requires 'name'"))?;

        let mut query = CollectionQuery::new();
        if let Some(filters) = args.get("where") {
            let filters = filters
                .as_object()
                .ok_or_else(|| tera::Error::msg("collection 'where' must be an object"))?;
            for (field, value) in filters {
                query = query.filter_eq(field.clone(), value.clone());
            }
        }
        for (field, value) in args {
            if !COLLECTION_ARGS.contains(&field.as_str()) {
                query = query.filter_eq(field.clone(), value.clone());
            }
        }
        if let Some(sort) = args.get("sort").and_then(Value::as_str) {
            let key: SortKey = sort.parse().map_err(|e| tera::Error::chain("collection", e))?;
            query.sort = Some(key);
        }
        if let Some(limit) = args.get("limit").and_then(Value::as_u64) {
            query = query.limit(limit as usize);
        }
        if args.get("exclude_drafts").and_then(Value::as_bool) == Some(true) {
            query = query.exclude_drafts();
        }

        let entries = self
            .content
            .query(name, &query)
            .map_err(|e| tera::Error::chain("collection", e))?;
        serde_json::to_value(entries).map_err(|e| tera::Error::chain("collection", e))
    }

    fn is_safe(&self) -> bool {
        false
    }
}

/// Islands seen during one render. Local to that render.
#[derive(Debug, Default)]
pub struct IslandLedger {
    next_uid: AtomicUsize,
    kinds: AtomicU8,
}

impl IslandLedger {
    fn record(&self, policy: &HydrationPolicy) -> usize {
        if let HydrationPolicy::Hydrate { directive, .. } = policy {
            self.kinds.fetch_or(directive.kind().bit(), Ordering::Relaxed);
        }
        self.next_uid.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of islands rendered, hydrated or not.
    pub fn count(&self) -> usize {
        self.next_uid.load(Ordering::Relaxed)
    }

    pub fn directives(&self) -> DirectiveSet {
        DirectiveSet::from_bits(self.kinds.load(Ordering::Relaxed))
    }
}

const ISLAND_ARGS: &[&str] = &["component", "client", "media", "only", "props", "fallback"];

/// `island(component="HeartCounter", client="visible", start=3)`.
///
/// The component template `components/<component>.html` is rendered with the
/// props unless the island is client-only. `client` names the directive
/// (`load`, `idle`, `visible`, `media`, `only`); `media` carries the query and
/// `only` the runtime, and either one alone also selects its directive.
/// Arguments other than the named ones are props, merged over `props`.
pub struct IslandFunction {
    components: Arc<Tera>,
    assets: IslandAssets,
    env: Arc<EnvVars>,
    ledger: Arc<IslandLedger>,
}

impl IslandFunction {
    pub fn new(
        components: Arc<Tera>,
        assets: IslandAssets,
        env: Arc<EnvVars>,
        ledger: Arc<IslandLedger>,
    ) -> Self {
        Self {
            components,
            assets,
            env,
            ledger,
        }
    }

    fn reference(args: &HashMap<String, Value>) -> tera::Result<IslandReference> {
        let component = args
            .get("component")
            .and_then(Value::as_str)
            .ok_or_else(|| tera::Error::msg("island function requires 'component'"))?;

        let media = args.get("media").and_then(Value::as_str);
        let only = args.get("only").and_then(Value::as_str);
        let directive = match args.get("client").and_then(Value::as_str) {
            Some(name) => Some(HydrationDirective::parse(name, media.or(only))),
            None if media.is_some() => Some(HydrationDirective::parse("media", media)),
            None if only.is_some() => Some(HydrationDirective::parse("only", only)),
            None => None,
        }
        .transpose()
        .map_err(|e| tera::Error::chain("island", e))?;

        let mut props = match args.get("props") {
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return Err(tera::Error::msg("island 'props' must be an object")),
            None => Map::new(),
        };
        for (key, value) in args {
            if !ISLAND_ARGS.contains(&key.as_str()) {
                props.insert(key.clone(), value.clone());
            }
        }

        let mut reference = IslandReference::new(component).with_props(props);
        if let Some(directive) = directive {
            reference = reference.with_directive(directive);
        }
        Ok(reference)
    }

    fn server_markup(&self, reference: &IslandReference) -> tera::Result<String> {
        let template = format!("components/{}.html", reference.component);
        let mut context = Context::new();
        for (key, value) in &reference.props {
            context.insert(key.as_str(), value);
        }
        context.insert("props", &reference.props);
        self.components.render(&template, &context)
    }
}

impl tera::Function for IslandFunction {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let reference = Self::reference(args)?;
        let policy = reference.policy();

        let inner = if policy.needs_server_markup() {
            self.server_markup(&reference)?
        } else {
            args.get("fallback")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let uid = self.ledger.record(&policy);
        let html = reference
            .render(&inner, uid, &self.assets, &self.env)
            .map_err(|e| tera::Error::chain("island", e))?;
        Ok(Value::String(html))
    }

    fn is_safe(&self) -> bool {
        true
    }
}
