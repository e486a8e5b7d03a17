use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A validated front-matter value.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    List(Vec<DataValue>),
    Map(BTreeMap<String, DataValue>),
}

/// Validated entry data, keyed by field name.
pub type EntryData = BTreeMap<String, DataValue>;

impl DataValue {
    /// Convert an undeclared (passthrough) YAML value without type checks.
    pub fn from_yaml(value: &serde_yaml::Value) -> Self {
        use serde_yaml::Value;
        match value {
            Value::Null => DataValue::Null,
            Value::Bool(b) => DataValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => DataValue::Integer(i),
                None => DataValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => DataValue::String(s.clone()),
            Value::Sequence(items) => DataValue::List(items.iter().map(Self::from_yaml).collect()),
            Value::Mapping(map) => DataValue::Map(
                map.iter()
                    .filter_map(|(k, v)| Some((k.as_str()?.to_string(), Self::from_yaml(v))))
                    .collect(),
            ),
            Value::Tagged(tagged) => Self::from_yaml(&tagged.value),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            DataValue::Bool(_) => 0,
            DataValue::Integer(_) | DataValue::Number(_) => 1,
            DataValue::Date(_) | DataValue::DateTime(_) => 2,
            DataValue::String(_) => 3,
            DataValue::List(_) => 4,
            DataValue::Map(_) => 5,
            DataValue::Null => 6,
        }
    }

    /// Total order used for sorting. Values of different kinds order by kind;
    /// `Null` sorts after everything else.
    pub fn compare(&self, other: &DataValue) -> Ordering {
        use DataValue::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Integer(a), Number(b)) => (*a as f64).total_cmp(b),
            (Number(a), Integer(b)) => a.total_cmp(&(*b as f64)),
            (Number(a), Number(b)) => a.total_cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (DateTime(a), DateTime(b)) => a.cmp(b),
            (Date(a), DateTime(b)) => a.cmp(&b.date_naive()).then(Ordering::Less),
            (DateTime(a), Date(b)) => a.date_naive().cmp(b).then(Ordering::Greater),
            (String(a), String(b)) => a.cmp(b),
            (List(a), List(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x.compare(y))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| a.len().cmp(&b.len())),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// Equality against a JSON value from a query. A list matches when any
    /// of its items matches.
    pub fn matches_json(&self, expected: &serde_json::Value) -> bool {
        use serde_json::Value;
        match (self, expected) {
            (DataValue::Null, Value::Null) => true,
            (DataValue::Bool(a), Value::Bool(b)) => a == b,
            (DataValue::Integer(a), Value::Number(b)) => b.as_i64() == Some(*a),
            (DataValue::Number(a), Value::Number(b)) => b.as_f64() == Some(*a),
            (DataValue::String(a), Value::String(b)) => a == b,
            (DataValue::Date(a), Value::String(b)) => a.format("%Y-%m-%d").to_string() == *b,
            (DataValue::DateTime(a), Value::String(b)) => {
                DateTime::parse_from_rfc3339(b).is_ok_and(|b| b == *a)
            }
            (DataValue::List(items), Value::Array(expected)) => {
                items.len() == expected.len()
                    && items.iter().zip(expected).all(|(a, b)| a.matches_json(b))
            }
            (DataValue::List(items), other) => items.iter().any(|item| item.matches_json(other)),
            _ => false,
        }
    }
}

impl Serialize for DataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DataValue::Null => serializer.serialize_unit(),
            DataValue::Bool(b) => serializer.serialize_bool(*b),
            DataValue::Integer(i) => serializer.serialize_i64(*i),
            DataValue::Number(n) => serializer.serialize_f64(*n),
            DataValue::String(s) => serializer.serialize_str(s),
            DataValue::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
            DataValue::DateTime(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            DataValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            DataValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(s: &str) -> DataValue {
        DataValue::Date(NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap())
    }

    #[test]
    fn test_serialize_dates_as_strings() {
        let value = DataValue::List(vec![
            date("2025-02-14"),
            DataValue::DateTime(DateTime::parse_from_rfc3339("2025-02-14T20:00:00+01:00").unwrap()),
        ]);
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!(["2025-02-14", "2025-02-14T20:00:00+01:00"])
        );
    }

    #[test]
    fn test_compare_orders_dates_and_nulls_last() {
        assert_eq!(date("2024-02-14").compare(&date("2025-02-14")), Ordering::Less);
        assert_eq!(DataValue::Null.compare(&date("2025-02-14")), Ordering::Greater);
        assert_eq!(
            DataValue::Integer(2).compare(&DataValue::Number(1.5)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_matches_json() {
        assert!(DataValue::String("rust".into()).matches_json(&json!("rust")));
        assert!(date("2025-02-14").matches_json(&json!("2025-02-14")));
        assert!(DataValue::Integer(3).matches_json(&json!(3)));
        assert!(!DataValue::Integer(3).matches_json(&json!("3")));

        let tags = DataValue::List(vec![
            DataValue::String("love".into()),
            DataValue::String("rust".into()),
        ]);
        assert!(tags.matches_json(&json!("rust")));
        assert!(!tags.matches_json(&json!("go")));
    }

    #[test]
    fn test_from_yaml_passthrough() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("a: [1, x]\nb: {c: true}").unwrap();
        let value = DataValue::from_yaml(&yaml);
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({"a": [1, "x"], "b": {"c": true}})
        );
    }
}
