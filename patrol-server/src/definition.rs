//! Parsing of monitor definitions from the canonical [`Value`] tree that
//! both the TOML config-file loader and the JSON `/register` handler
//! produce.

use std::collections::HashMap;
use std::path::Path;

use patrol_plugin::value::{Params, Value};

/// One `type` + parameter-mapping pair, as it appears under `probe`,
/// `filter`, or an entry of `actions`.
#[derive(Debug, Clone)]
pub struct PluginSpec {
    pub kind: String,
    pub params: Params,
}

/// A parsed, not-yet-constructed monitor definition.
#[derive(Debug, Clone)]
pub struct MonitorDefinition {
    pub name: String,
    pub probe: PluginSpec,
    pub filter: Option<PluginSpec>,
    pub actions: Vec<PluginSpec>,
    pub interval: Option<u64>,
    pub timeout: Option<u64>,
    pub min: f64,
    pub max: f64,
}

#[derive(thiserror::Error, Debug)]
pub enum DefinitionError {
    #[error("bad monitor name")]
    BadName,
    #[error("no type")]
    NoType,
    #[error("invalid type")]
    InvalidType,
    #[error("definition is not a mapping")]
    NotAMapping,
    #[error("unknown top-level key: {0}")]
    UnknownKey(String),
    #[error("field {0} has the wrong type")]
    WrongFieldType(&'static str),
    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

fn as_map(v: Value) -> Result<HashMap<String, Value>, DefinitionError> {
    match v {
        Value::Map(m) => Ok(m),
        _ => Err(DefinitionError::NotAMapping),
    }
}

fn plugin_spec(v: Value) -> Result<PluginSpec, DefinitionError> {
    let mut m = as_map(v)?;
    let kind = match m.remove("type") {
        None => return Err(DefinitionError::NoType),
        Some(Value::String(s)) => s,
        Some(_) => return Err(DefinitionError::InvalidType),
    };
    Ok(PluginSpec { kind, params: m })
}

fn as_u64(v: &Value, field: &'static str) -> Result<u64, DefinitionError> {
    match v {
        Value::Int(i) if *i >= 0 => Ok(*i as u64),
        _ => Err(DefinitionError::WrongFieldType(field)),
    }
}

fn as_f64(v: &Value, field: &'static str) -> Result<f64, DefinitionError> {
    match v {
        Value::Float(f) => Ok(*f),
        Value::Int(i) => Ok(*i as f64),
        _ => Err(DefinitionError::WrongFieldType(field)),
    }
}

impl MonitorDefinition {
    /// Parse a single definition out of a `Value::Map` — the shape of one
    /// JSON `/register` body or one `[[monitor]]` TOML table.
    pub fn from_value(v: Value) -> Result<Self, DefinitionError> {
        let mut m = as_map(v)?;

        let name = match m.remove("name") {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => return Err(DefinitionError::BadName),
        };

        let probe = match m.remove("probe") {
            Some(v) => plugin_spec(v)?,
            None => return Err(DefinitionError::NoType),
        };

        let filter = match m.remove("filter") {
            Some(v) => Some(plugin_spec(v)?),
            None => None,
        };

        let actions = match m.remove("actions") {
            Some(Value::List(items)) => items
                .into_iter()
                .map(plugin_spec)
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(DefinitionError::WrongFieldType("actions")),
            None => Vec::new(),
        };

        let interval = match m.remove("interval") {
            Some(v) => Some(as_u64(&v, "interval")?),
            None => None,
        };

        let timeout = match m.remove("timeout") {
            Some(v) => Some(as_u64(&v, "timeout")?),
            None => None,
        };

        let min = match m.remove("min") {
            Some(v) => as_f64(&v, "min")?,
            None => 0.0,
        };

        let max = match m.remove("max") {
            Some(v) => as_f64(&v, "max")?,
            None => 0.0,
        };

        Ok(MonitorDefinition {
            name,
            probe,
            filter,
            actions,
            interval,
            timeout,
            min,
            max,
        })
    }
}

/// Parse a whole config-file document: a top-level mapping whose only
/// recognized key is `monitor`, an array of definitions. Any other
/// top-level key is rejected (strict mode).
pub fn parse_document(v: Value) -> Result<Vec<MonitorDefinition>, DefinitionError> {
    let mut m = as_map(v)?;
    let monitors = m.remove("monitor");

    if let Some(key) = m.keys().next() {
        return Err(DefinitionError::UnknownKey(key.clone()));
    }

    match monitors {
        None => Ok(Vec::new()),
        Some(Value::List(items)) => items
            .into_iter()
            .map(MonitorDefinition::from_value)
            .collect(),
        Some(_) => Err(DefinitionError::WrongFieldType("monitor")),
    }
}

/// Load and parse one TOML config file, recognizing `-` as standard input.
pub fn load_file(path: &str) -> Result<Vec<MonitorDefinition>, DefinitionError> {
    let text = if path == "-" {
        use std::io::Read;
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| DefinitionError::Io {
                path: path.to_owned(),
                source,
            })?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(|source| DefinitionError::Io {
            path: path.to_owned(),
            source,
        })?
    };

    let value: toml::Value = text.parse().map_err(|source| DefinitionError::Toml {
        path: path.to_owned(),
        source,
    })?;

    parse_document(value.into())
}

/// Load every `*.toml` file directly inside `dir`, in sorted filename
/// order, concatenating their monitor definitions.
pub fn load_dir(dir: &Path) -> Result<Vec<MonitorDefinition>, DefinitionError> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .map_err(|source| DefinitionError::Io {
            path: dir.display().to_string(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    let mut definitions = Vec::new();
    for path in paths {
        definitions.extend(load_file(&path.display().to_string())?);
    }
    Ok(definitions)
}
