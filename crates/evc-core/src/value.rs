use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One entry of an event command's parameter list. Mirrors the JSON shape
/// the authoring tool emits, so command lists deserialize directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<ParamValue>),
    Map(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(value) => Some(*value as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ParamValue]> {
        match self {
            Self::Array(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, ParamValue>> {
        match self {
            Self::Map(values) => Some(values),
            _ => None,
        }
    }

    /// Loose truthiness used by optional flag parameters, which the
    /// authoring tool stores as booleans or 0/1 interchangeably.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => *value,
            Self::Number(value) => *value != 0.0,
            Self::String(value) => !value.is_empty(),
            Self::Array(_) | Self::Map(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }
}

/// Integer at parameter slot `index`, or 0 when absent or non-numeric.
pub fn param_int(params: &[ParamValue], index: usize) -> i64 {
    params.get(index).and_then(ParamValue::as_i64).unwrap_or(0)
}

/// Integer at slot `index`, falling back to `default` when absent.
pub fn param_int_or(params: &[ParamValue], index: usize, default: i64) -> i64 {
    params
        .get(index)
        .and_then(ParamValue::as_i64)
        .unwrap_or(default)
}

/// String at parameter slot `index`, or "" when absent.
pub fn param_str(params: &[ParamValue], index: usize) -> &str {
    params.get(index).and_then(ParamValue::as_str).unwrap_or("")
}

/// Truthiness of an optional flag slot (missing slots are false).
pub fn param_flag(params: &[ParamValue], index: usize) -> bool {
    params.get(index).is_some_and(ParamValue::is_truthy)
}

#[cfg(test)]
mod value_tests {
    use super::*;

    #[test]
    fn untagged_forms_deserialize() {
        let parsed: Vec<ParamValue> =
            serde_json::from_str(r#"[null, true, 3, "hi", [1, 2], {"name": "x"}]"#)
                .expect("params should parse");
        assert_eq!(parsed[0], ParamValue::Null);
        assert_eq!(parsed[1], ParamValue::Bool(true));
        assert_eq!(parsed[2].as_i64(), Some(3));
        assert_eq!(parsed[3].as_str(), Some("hi"));
        assert_eq!(parsed[4].as_array().map(<[_]>::len), Some(2));
        assert_eq!(
            parsed[5].as_map().and_then(|map| map.get("name")?.as_str()),
            Some("x")
        );
    }

    #[test]
    fn slot_helpers_default_when_absent() {
        let params = vec![ParamValue::Number(7.0)];
        assert_eq!(param_int(&params, 0), 7);
        assert_eq!(param_int(&params, 5), 0);
        assert_eq!(param_int_or(&params, 5, 2), 2);
        assert_eq!(param_str(&params, 5), "");
        assert!(!param_flag(&params, 5));
    }

    #[test]
    fn truthiness_follows_flag_conventions() {
        assert!(ParamValue::Number(1.0).is_truthy());
        assert!(!ParamValue::Number(0.0).is_truthy());
        assert!(ParamValue::Bool(true).is_truthy());
        assert!(!ParamValue::Null.is_truthy());
        assert!(!ParamValue::String(String::new()).is_truthy());
    }
}
