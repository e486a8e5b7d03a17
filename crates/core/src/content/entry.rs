use serde::Serialize;

use super::frontmatter::{mapping_to_raw, parse_front_matter, parse_yaml_mapping};
use super::schema::RawData;
use super::value::{DataValue, EntryData};

/// File formats a collection entry can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Front-matter plus a Markdown body.
    Markdown,
    /// A YAML mapping, no body.
    Yaml,
    /// A JSON object, no body.
    Json,
}

impl SourceFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Some(SourceFormat::Markdown),
            "yaml" | "yml" => Some(SourceFormat::Yaml),
            "json" => Some(SourceFormat::Json),
            _ => None,
        }
    }
}

/// An unparsed entry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySource {
    /// Path relative to the collection directory, `/` separated.
    pub path: String,
    pub raw: String,
}

impl EntrySource {
    pub fn new(path: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            raw: raw.into(),
        }
    }

    pub fn format(&self) -> Option<SourceFormat> {
        let (_, ext) = self.path.rsplit_once('.')?;
        SourceFormat::from_extension(ext)
    }

    /// Id derived from the path: extension and a trailing `index` removed,
    /// lowercased, whitespace replaced by `-`.
    pub fn derived_id(&self) -> String {
        let stem = match self.path.rsplit_once('.') {
            Some((stem, _)) => stem,
            None => self.path.as_str(),
        };
        let stem = stem.strip_suffix("/index").unwrap_or(stem);
        stem.split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| {
                segment
                    .trim()
                    .to_lowercase()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join("-")
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Parse into raw data and body according to the format.
    pub fn parse(&self) -> Result<(RawData, String), String> {
        match self.format() {
            Some(SourceFormat::Markdown) => {
                parse_front_matter(&self.raw).map(|(data, body)| (data, body.to_string()))
            }
            Some(SourceFormat::Yaml) => parse_yaml_mapping(&self.raw).map(|d| (d, String::new())),
            Some(SourceFormat::Json) => {
                let json: serde_json::Value =
                    serde_json::from_str(&self.raw).map_err(|e| e.to_string())?;
                if !json.is_object() {
                    return Err("JSON entry must be an object".to_string());
                }
                let yaml = serde_yaml::to_value(json).map_err(|e| e.to_string())?;
                mapping_to_raw(yaml).map(|d| (d, String::new()))
            }
            None => Err(format!("unsupported entry format `{}`", self.path)),
        }
    }
}

/// A validated collection entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentEntry {
    pub collection: String,
    pub id: String,
    pub data: EntryData,
    /// Raw body, unrendered.
    pub body: String,
}

impl ContentEntry {
    /// Field lookup; `id` resolves to the entry id.
    pub fn field(&self, name: &str) -> Option<DataValue> {
        if name == "id" {
            return Some(DataValue::String(self.id.clone()));
        }
        self.data.get(name).cloned()
    }

    pub fn is_draft(&self) -> bool {
        self.data.get("draft").and_then(DataValue::as_bool) == Some(true)
    }
}
