//! Structured documents (JSON, YAML) parsed into a common
//! `serde_json::Value` so both formats share one comparison.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::format::Format;

/// Kind of a document's root value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    Object,
    List,
    Scalar,
}

impl RootKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Object(_) => Self::Object,
            Value::Array(_) => Self::List,
            _ => Self::Scalar,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::List => "list",
            Self::Scalar => "scalar",
        }
    }
}

/// Parse a whole document as JSON or YAML.
///
/// # Errors
///
/// Returns a short reason if the file is empty or does not parse.
pub fn read_document(path: &Path, format: Format) -> Result<Value, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("cannot be read: {e}"))?;
    if text.trim().is_empty() {
        return Err("is empty".to_string());
    }
    match format {
        Format::Yaml => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(&text).map_err(|e| format!("is not valid YAML: {e}"))?;
            yaml_to_json_value(&yaml)
        }
        _ => serde_json::from_str(&text).map_err(|e| format!("is not valid JSON: {e}")),
    }
}

/// Convert a YAML value to JSON. Tags are dropped; non-string keys are
/// rendered as strings.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::from(u))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Null => "null".to_string(),
                    other => return Err(format!("unsupported YAML map key: {other:?}")),
                };
                out.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(out))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_kinds() {
        assert_eq!(RootKind::of(&serde_json::json!({"a": 1})), RootKind::Object);
        assert_eq!(RootKind::of(&serde_json::json!([1])), RootKind::List);
        assert_eq!(RootKind::of(&serde_json::json!("s")), RootKind::Scalar);
        assert_eq!(RootKind::of(&Value::Null), RootKind::Scalar);
    }

    #[test]
    fn test_yaml_mapping_converts() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("a: 1\n2: [x, true]\n").unwrap();
        let json = yaml_to_json_value(&yaml).unwrap();
        assert_eq!(json, serde_json::json!({"a": 1, "2": ["x", true]}));
    }

    #[test]
    fn test_empty_document_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("e.yaml");
        fs::write(&path, "  \n").unwrap();
        assert_eq!(read_document(&path, Format::Yaml).unwrap_err(), "is empty");
    }
}
