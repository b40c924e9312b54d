//! A small untyped value tree shared by the TOML and JSON configuration
//! front-ends, plus the typed accessors plugin constructors use to read it.

use std::collections::HashMap;

/// Numeric comparisons on plugin parameters tolerate this much error.
pub const EPSILON: f64 = 0.00000001;

/// Compare two floats allowing error within [`EPSILON`].
pub fn float_eq(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    (a - b).abs() < EPSILON
}

/// A canonical, weakly-typed configuration value.
///
/// Both the TOML file loader and the JSON `/register` handler convert their
/// native representation into this tree before anything in the core reads
/// it, so a plugin constructor sees identical values regardless of which
/// front-end produced them.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

/// Parameters passed to a plugin constructor: the `type` key already
/// stripped out by the caller.
pub type Params = HashMap<String, Value>;

impl From<toml::Value> for Value {
    fn from(v: toml::Value) -> Self {
        match v {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Int(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(d) => Value::String(d.to_string()),
            toml::Value::Array(a) => Value::List(a.into_iter().map(Value::from).collect()),
            toml::Value::Table(t) => {
                Value::Map(t.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(a) => Value::List(a.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(o) => {
                Value::Map(o.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Errors raised by the typed accessors below.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("no such key: {0}")]
    NoKey(String),
    #[error("value for key {0} has the wrong type")]
    InvalidType(String),
}

fn get<'a>(key: &str, m: &'a Params) -> Result<&'a Value, ValueError> {
    m.get(key).ok_or_else(|| ValueError::NoKey(key.to_owned()))
}

/// Extract a `bool` from `m[key]`.
pub fn get_bool(key: &str, m: &Params) -> Result<bool, ValueError> {
    match get(key, m)? {
        Value::Bool(b) => Ok(*b),
        _ => Err(ValueError::InvalidType(key.to_owned())),
    }
}

/// Extract an `i64` from `m[key]`.
pub fn get_int(key: &str, m: &Params) -> Result<i64, ValueError> {
    match get(key, m)? {
        Value::Int(i) => Ok(*i),
        _ => Err(ValueError::InvalidType(key.to_owned())),
    }
}

/// Extract an `f64` from `m[key]`. Integers widen to float, matching how
/// TOML and JSON both accept `10` where a float is expected.
pub fn get_float(key: &str, m: &Params) -> Result<f64, ValueError> {
    match get(key, m)? {
        Value::Float(f) => Ok(*f),
        Value::Int(i) => Ok(*i as f64),
        _ => Err(ValueError::InvalidType(key.to_owned())),
    }
}

/// Extract a `String` from `m[key]`.
pub fn get_string(key: &str, m: &Params) -> Result<String, ValueError> {
    match get(key, m)? {
        Value::String(s) => Ok(s.clone()),
        _ => Err(ValueError::InvalidType(key.to_owned())),
    }
}

/// Extract an ordered list of strings from `m[key]`.
pub fn get_string_list(key: &str, m: &Params) -> Result<Vec<String>, ValueError> {
    match get(key, m)? {
        Value::List(l) => l
            .iter()
            .map(|v| match v {
                Value::String(s) => Ok(s.clone()),
                _ => Err(ValueError::InvalidType(key.to_owned())),
            })
            .collect(),
        _ => Err(ValueError::InvalidType(key.to_owned())),
    }
}

/// Extract a string-valued string map from `m[key]`.
pub fn get_string_map(key: &str, m: &Params) -> Result<HashMap<String, String>, ValueError> {
    match get(key, m)? {
        Value::Map(mm) => mm
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => Ok((k.clone(), s.clone())),
                _ => Err(ValueError::InvalidType(key.to_owned())),
            })
            .collect(),
        _ => Err(ValueError::InvalidType(key.to_owned())),
    }
}

/// Like [`get_float`], but returns `default` when the key is absent rather
/// than an error — used for optional plugin parameters.
pub fn get_float_or(key: &str, m: &Params, default: f64) -> Result<f64, ValueError> {
    match get_float(key, m) {
        Ok(v) => Ok(v),
        Err(ValueError::NoKey(_)) => Ok(default),
        Err(e) => Err(e),
    }
}

/// Like [`get_int`], but returns `default` when the key is absent.
pub fn get_int_or(key: &str, m: &Params, default: i64) -> Result<i64, ValueError> {
    match get_int(key, m) {
        Ok(v) => Ok(v),
        Err(ValueError::NoKey(_)) => Ok(default),
        Err(e) => Err(e),
    }
}

/// Like [`get_bool`], but returns `default` when the key is absent.
pub fn get_bool_or(key: &str, m: &Params, default: bool) -> Result<bool, ValueError> {
    match get_bool(key, m) {
        Ok(v) => Ok(v),
        Err(ValueError::NoKey(_)) => Ok(default),
        Err(e) => Err(e),
    }
}

/// Like [`get_string_list`], but returns an empty list when the key is absent.
pub fn get_string_list_or_empty(key: &str, m: &Params) -> Result<Vec<String>, ValueError> {
    match get_string_list(key, m) {
        Ok(v) => Ok(v),
        Err(ValueError::NoKey(_)) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: Vec<(&str, Value)>) -> Params {
        pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
    }

    #[test]
    fn float_eq_within_epsilon() {
        assert!(float_eq(1.0, 1.0 + EPSILON / 2.0));
        assert!(!float_eq(1.0, 1.1));
    }

    #[test]
    fn missing_key_is_distinct_from_wrong_type() {
        let m = params(vec![("count", Value::String("nope".into()))]);
        assert_eq!(get_int("missing", &m), Err(ValueError::NoKey("missing".into())));
        assert_eq!(
            get_int("count", &m),
            Err(ValueError::InvalidType("count".into()))
        );
    }

    #[test]
    fn int_widens_to_float() {
        let m = params(vec![("errval", Value::Int(3))]);
        assert_eq!(get_float("errval", &m), Ok(3.0));
    }

    #[test]
    fn string_list_roundtrip() {
        let m = params(vec![(
            "args",
            Value::List(vec![Value::String("-x".into()), Value::String("1".into())]),
        )]);
        assert_eq!(get_string_list("args", &m), Ok(vec!["-x".to_owned(), "1".to_owned()]));
    }

    #[test]
    fn string_map_rejects_non_string_values() {
        let mut inner = HashMap::new();
        inner.insert("Authorization".to_owned(), Value::Int(1));
        let m = params(vec![("header", Value::Map(inner))]);
        assert!(matches!(
            get_string_map("header", &m),
            Err(ValueError::InvalidType(_))
        ));
    }

    #[test]
    fn toml_and_json_produce_equal_trees() {
        let toml_val: Value = toml::Value::Integer(7).into();
        let json_val: Value = serde_json::Value::from(7).into();
        assert_eq!(toml_val, json_val);
    }

    #[test]
    fn or_defaults_apply_only_on_missing_key() {
        let m = params(vec![]);
        assert_eq!(get_float_or("window", &m, 10.0), Ok(10.0));
        assert_eq!(get_bool_or("parse", &m, false), Ok(false));
    }
}
