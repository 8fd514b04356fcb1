// Copyright 2025 Cowboy AI, LLC.

//! Free-form metadata attached to categories

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Non-standard metadata of a category, keyed by field name
pub type Info = IndexMap<String, InfoValue>;

/// A primitive value stored in a category's info mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum InfoValue {
    /// Boolean flag
    Bool(bool),
    /// Whole number
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Text
    Text(String),
    /// Sequence of values, e.g. corresponding codes in another scheme
    List(Vec<InfoValue>),
}

impl InfoValue {
    /// The text, if this is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            InfoValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The integer, if this is a whole number
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            InfoValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// The value as float, for both number variants
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            InfoValue::Integer(value) => Some(*value as f64),
            InfoValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// The flag, if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            InfoValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// The elements, if this is a sequence
    pub fn as_list(&self) -> Option<&[InfoValue]> {
        match self {
            InfoValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for InfoValue {
    fn from(value: bool) -> Self {
        InfoValue::Bool(value)
    }
}

impl From<i64> for InfoValue {
    fn from(value: i64) -> Self {
        InfoValue::Integer(value)
    }
}

impl From<f64> for InfoValue {
    fn from(value: f64) -> Self {
        InfoValue::Float(value)
    }
}

impl From<&str> for InfoValue {
    fn from(value: &str) -> Self {
        InfoValue::Text(value.to_string())
    }
}

impl From<String> for InfoValue {
    fn from(value: String) -> Self {
        InfoValue::Text(value)
    }
}

impl<T: Into<InfoValue>> From<Vec<T>> for InfoValue {
    fn from(values: Vec<T>) -> Self {
        InfoValue::List(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_json_picks_the_narrowest_variant() {
        let info: Info = serde_json::from_str(
            r#"{"gases": ["CO2", "CH4"], "numerical": 3, "share": 0.5, "aggregate": true}"#,
        )
        .unwrap();

        assert_eq!(
            info["gases"],
            InfoValue::List(vec!["CO2".into(), "CH4".into()])
        );
        assert_eq!(info["numerical"].as_i64(), Some(3));
        assert_eq!(info["share"].as_f64(), Some(0.5));
        assert_eq!(info["aggregate"].as_bool(), Some(true));
        assert_eq!(info.keys().next().map(String::as_str), Some("gases"));
    }

    #[test]
    fn accessors_reject_other_variants() {
        let value = InfoValue::from("text");
        assert_eq!(value.as_str(), Some("text"));
        assert_eq!(value.as_f64(), None);
        assert_eq!(value.as_list(), None);
        assert_eq!(InfoValue::from(2_i64).as_f64(), Some(2.0));
    }
}
