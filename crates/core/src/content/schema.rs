//! Collection schemas and front-matter validation.
//!
//! Validation never coerces: a YAML number in a `string` field is a
//! violation, and a `date` must be a string that parses as `YYYY-MM-DD` or an
//! RFC 3339 timestamp.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde_yaml::Value;
use thiserror::Error;

use super::error::ContentError;
use super::value::{DataValue, EntryData};

/// Front-matter keys consumed by the loader rather than the schema.
pub const RESERVED_KEYS: &[&str] = &["slug"];

/// Raw front-matter as parsed from the source.
pub type RawData = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    Url,
    Enum(Vec<String>),
    Array(Box<FieldType>),
}

impl FieldType {
    fn from_name(name: &str) -> Option<Self> {
        if let Some(item) = name.strip_suffix("[]") {
            return Self::from_name(item).map(|t| FieldType::Array(Box::new(t)));
        }
        Some(match name {
            "string" => FieldType::String,
            "number" => FieldType::Number,
            "integer" => FieldType::Integer,
            "boolean" | "bool" => FieldType::Boolean,
            "date" => FieldType::Date,
            "url" => FieldType::Url,
            _ => return None,
        })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Number => write!(f, "number"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Date => write!(f, "date"),
            FieldType::Url => write!(f, "url"),
            FieldType::Enum(values) => write!(f, "one of [{}]", values.join(", ")),
            FieldType::Array(item) => write!(f, "array of {item}"),
        }
    }
}

/// Declaration of one front-matter field.
///
/// In `valentine.toml` a field is either a type name (`"string"`, `"date?"`
/// for optional, `"string[]"` for arrays) or a table:
///
/// ```toml
/// status = { type = "enum", values = ["draft", "published"] }
/// tags = { type = "array", items = "string", default = [] }
/// title = { type = "string", min = 1, max = 120 }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawFieldSchema")]
pub struct FieldSchema {
    pub ty: FieldType,
    pub optional: bool,
    pub default: Option<DataValue>,
    /// Minimum length for strings and arrays.
    pub min: Option<usize>,
    /// Maximum length for strings and arrays.
    pub max: Option<usize>,
}

impl FieldSchema {
    pub fn required(ty: FieldType) -> Self {
        Self {
            ty,
            optional: false,
            default: None,
            min: None,
            max: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_default(mut self, value: DataValue) -> Self {
        self.default = Some(value);
        self
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFieldSchema {
    Short(String),
    Table(FieldTable),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldTable {
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    default: Option<serde_json::Value>,
    #[serde(default)]
    items: Option<String>,
    #[serde(default)]
    values: Option<Vec<String>>,
    #[serde(default)]
    min: Option<usize>,
    #[serde(default)]
    max: Option<usize>,
}

impl TryFrom<RawFieldSchema> for FieldSchema {
    type Error = ContentError;

    fn try_from(raw: RawFieldSchema) -> Result<Self, Self::Error> {
        let invalid = |reason: String| ContentError::InvalidSchema(reason);
        match raw {
            RawFieldSchema::Short(name) => {
                let (name, optional) = match name.strip_suffix('?') {
                    Some(name) => (name, true),
                    None => (name.as_str(), false),
                };
                let ty = FieldType::from_name(name)
                    .ok_or_else(|| invalid(format!("unknown field type `{name}`")))?;
                Ok(Self {
                    optional,
                    ..Self::required(ty)
                })
            }
            RawFieldSchema::Table(table) => {
                let ty = match table.ty.as_str() {
                    "enum" => {
                        let values = table
                            .values
                            .filter(|v| !v.is_empty())
                            .ok_or_else(|| invalid("`enum` requires non-empty `values`".into()))?;
                        FieldType::Enum(values)
                    }
                    "array" => {
                        let items = table.items.as_deref().unwrap_or("string");
                        let item = FieldType::from_name(items)
                            .ok_or_else(|| invalid(format!("unknown item type `{items}`")))?;
                        FieldType::Array(Box::new(item))
                    }
                    other => FieldType::from_name(other)
                        .ok_or_else(|| invalid(format!("unknown field type `{other}`")))?,
                };
                if let (Some(min), Some(max)) = (table.min, table.max) {
                    if min > max {
                        return Err(invalid(format!("`min` {min} exceeds `max` {max}")));
                    }
                }

                let mut schema = Self {
                    ty,
                    optional: table.optional,
                    default: None,
                    min: table.min,
                    max: table.max,
                };
                if let Some(default) = table.default {
                    let yaml = serde_yaml::to_value(&default)
                        .map_err(|e| invalid(format!("invalid default: {e}")))?;
                    let value = check_value(&schema, &yaml).map_err(|kind| {
                        invalid(format!("default does not match the field type: {kind}"))
                    })?;
                    schema.default = Some(value);
                }
                Ok(schema)
            }
        }
    }
}

/// What is wrong with one field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    #[error("is required")]
    Missing,
    #[error("expected {expected}, found {found}")]
    WrongType { expected: String, found: String },
    #[error("`{0}` is not a date (expected YYYY-MM-DD or an RFC 3339 timestamp)")]
    InvalidDate(String),
    #[error("`{0}` is not a valid URL")]
    InvalidUrl(String),
    #[error("`{value}` is not one of [{}]", .allowed.join(", "))]
    NotInEnum { value: String, allowed: Vec<String> },
    #[error("length {len} is below the minimum of {min}")]
    TooShort { min: usize, len: usize },
    #[error("length {len} is above the maximum of {max}")]
    TooLong { max: usize, len: usize },
    #[error("is not declared in the schema")]
    Unknown,
}

/// A violation, naming the offending field (`tags[2]` for array items).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("`{field}` {kind}")]
pub struct SchemaViolation {
    pub field: String,
    pub kind: ViolationKind,
}

impl SchemaViolation {
    fn new(field: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }
}

/// Field declarations for one collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionSchema {
    pub fields: BTreeMap<String, FieldSchema>,
    /// Keep undeclared keys instead of rejecting them.
    pub passthrough: bool,
}

impl CollectionSchema {
    pub fn new(fields: BTreeMap<String, FieldSchema>) -> Self {
        Self {
            fields,
            passthrough: false,
        }
    }

    pub fn passthrough(mut self, passthrough: bool) -> Self {
        self.passthrough = passthrough;
        self
    }

    pub fn field(mut self, name: impl Into<String>, schema: FieldSchema) -> Self {
        self.fields.insert(name.into(), schema);
        self
    }

    /// Validate raw front-matter, collecting every violation.
    pub fn validate(&self, raw: &RawData) -> Result<EntryData, Vec<SchemaViolation>> {
        let mut data = EntryData::new();
        let mut violations = Vec::new();

        for (name, field) in &self.fields {
            match raw.get(name).filter(|v| !v.is_null()) {
                Some(value) => match check_field(name, field, value) {
                    Ok(value) => {
                        data.insert(name.clone(), value);
                    }
                    Err(mut found) => violations.append(&mut found),
                },
                None => {
                    if let Some(default) = &field.default {
                        data.insert(name.clone(), default.clone());
                    } else if !field.optional {
                        violations.push(SchemaViolation::new(name, ViolationKind::Missing));
                    }
                }
            }
        }

        for (name, value) in raw {
            if self.fields.contains_key(name) || RESERVED_KEYS.contains(&name.as_str()) {
                continue;
            }
            if self.passthrough {
                data.insert(name.clone(), DataValue::from_yaml(value));
            } else {
                violations.push(SchemaViolation::new(name, ViolationKind::Unknown));
            }
        }

        if violations.is_empty() {
            Ok(data)
        } else {
            Err(violations)
        }
    }
}

/// Validate one entry's raw data against `schema`.
pub fn validate_entry(
    schema: &CollectionSchema,
    raw: &RawData,
) -> Result<EntryData, Vec<SchemaViolation>> {
    schema.validate(raw)
}

fn check_field(
    name: &str,
    field: &FieldSchema,
    value: &Value,
) -> Result<DataValue, Vec<SchemaViolation>> {
    if let FieldType::Array(item) = &field.ty {
        let Value::Sequence(items) = value else {
            return Err(vec![SchemaViolation::new(
                name,
                wrong_type(&field.ty, value),
            )]);
        };
        let item_schema = FieldSchema::required((**item).clone());
        let mut out = Vec::with_capacity(items.len());
        let mut violations = Vec::new();
        for (i, element) in items.iter().enumerate() {
            match check_value(&item_schema, element) {
                Ok(v) => out.push(v),
                Err(kind) => violations.push(SchemaViolation::new(format!("{name}[{i}]"), kind)),
            }
        }
        if let Err(kind) = check_len(field, items.len()) {
            violations.push(SchemaViolation::new(name, kind));
        }
        return if violations.is_empty() {
            Ok(DataValue::List(out))
        } else {
            Err(violations)
        };
    }

    check_value(field, value).map_err(|kind| vec![SchemaViolation::new(name, kind)])
}

fn check_value(field: &FieldSchema, value: &Value) -> Result<DataValue, ViolationKind> {
    match (&field.ty, value) {
        (FieldType::String, Value::String(s)) => {
            check_len(field, s.chars().count())?;
            Ok(DataValue::String(s.clone()))
        }
        (FieldType::Number, Value::Number(n)) => match n.as_i64() {
            Some(i) => Ok(DataValue::Integer(i)),
            None => Ok(DataValue::Number(n.as_f64().unwrap_or(f64::NAN))),
        },
        (FieldType::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => n
            .as_i64()
            .map(DataValue::Integer)
            .ok_or_else(|| wrong_type(&field.ty, value)),
        (FieldType::Boolean, Value::Bool(b)) => Ok(DataValue::Bool(*b)),
        (FieldType::Date, Value::String(s)) => parse_date(s),
        (FieldType::Url, Value::String(s)) => url::Url::parse(s)
            .map(|_| DataValue::String(s.clone()))
            .map_err(|_| ViolationKind::InvalidUrl(s.clone())),
        (FieldType::Enum(allowed), Value::String(s)) => {
            if allowed.contains(s) {
                Ok(DataValue::String(s.clone()))
            } else {
                Err(ViolationKind::NotInEnum {
                    value: s.clone(),
                    allowed: allowed.clone(),
                })
            }
        }
        (FieldType::Array(item), Value::Sequence(items)) => {
            let item_schema = FieldSchema::required((**item).clone());
            check_len(field, items.len())?;
            items
                .iter()
                .map(|item| check_value(&item_schema, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DataValue::List)
        }
        (_, Value::Tagged(tagged)) => check_value(field, &tagged.value),
        (ty, value) => Err(wrong_type(ty, value)),
    }
}

fn check_len(field: &FieldSchema, len: usize) -> Result<(), ViolationKind> {
    if let Some(min) = field.min {
        if len < min {
            return Err(ViolationKind::TooShort { min, len });
        }
    }
    if let Some(max) = field.max {
        if len > max {
            return Err(ViolationKind::TooLong { max, len });
        }
    }
    Ok(())
}

fn parse_date(s: &str) -> Result<DataValue, ViolationKind> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(DataValue::Date(date));
    }
    DateTime::parse_from_rfc3339(s)
        .map(DataValue::DateTime)
        .map_err(|_| ViolationKind::InvalidDate(s.to_string()))
}

fn wrong_type(expected: &FieldType, found: &Value) -> ViolationKind {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Sequence(_) => "array",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    };
    ViolationKind::WrongType {
        expected: expected.to_string(),
        found: found.to_string(),
    }
}
