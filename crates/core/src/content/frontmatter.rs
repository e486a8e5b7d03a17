use serde_yaml::Value;

use super::schema::RawData;

/// Split a `---` delimited YAML block from the start of `raw`.
///
/// Returns the YAML text (if a complete block is present) and the body.
pub fn split_front_matter(raw: &str) -> (Option<&str>, &str) {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let Some(rest) = strip_fence(text) else {
        return (None, raw);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(yaml), body);
        }
        offset += line.len();
    }
    (None, raw)
}

fn strip_fence(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("---")?;
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}

/// Parse front-matter into raw data plus the body. An absent or empty block
/// yields empty data.
pub fn parse_front_matter(raw: &str) -> Result<(RawData, &str), String> {
    let (yaml, body) = split_front_matter(raw);
    let data = match yaml {
        Some(yaml) if !yaml.trim().is_empty() => parse_yaml_mapping(yaml)?,
        _ => RawData::new(),
    };
    Ok((data, body))
}

/// Parse a YAML document that must be a mapping with string keys.
pub fn parse_yaml_mapping(yaml: &str) -> Result<RawData, String> {
    let value: Value = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;
    mapping_to_raw(value)
}

pub(crate) fn mapping_to_raw(value: Value) -> Result<RawData, String> {
    match value {
        Value::Null => Ok(RawData::new()),
        Value::Mapping(map) => map
            .into_iter()
            .map(|(k, v)| match k {
                Value::String(k) => Ok((k, v)),
                other => Err(format!("front-matter key {other:?} is not a string")),
            })
            .collect(),
        _ => Err("front-matter must be a mapping".to_string()),
    }
}
