use std::collections::{BTreeMap, HashMap};

use byteconv_api::config::ConfigValues;
use byteconv_api::transform::Transformation;
use byteconv_transform_bytes::BytesConverter;

use crate::config::TransformConfig;
use crate::error::EngineError;

/// Creates an unconfigured transform instance.
pub type TransformFactory = fn() -> Box<dyn Transformation>;

/// Transform types known to the engine, by name.
pub struct TransformRegistry {
    factories: BTreeMap<String, TransformFactory>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with the built-in bytes converters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("bytes-converter.key", bytes_converter_key);
        registry.register("bytes-converter.value", bytes_converter_value);
        registry
    }

    /// Register a factory. A later registration replaces an earlier one.
    pub fn register(&mut self, name: impl Into<String>, factory: TransformFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(&self, transform_type: &str) -> Result<Box<dyn Transformation>, EngineError> {
        let factory = self
            .factories
            .get(transform_type)
            .ok_or_else(|| EngineError::UnknownTransform(transform_type.to_string()))?;
        Ok(factory())
    }

    /// Create a transform and configure it from its option table.
    ///
    /// 1. Look up the factory by `type`.
    /// 2. Flatten the option table into `name -> string`.
    /// 3. Validate against the transform's declarations, apply defaults.
    /// 4. `configure()`.
    pub fn build(&self, config: &TransformConfig) -> Result<Box<dyn Transformation>, EngineError> {
        let mut transform = self.create(&config.transform_type)?;
        let props = flatten_config(config.config.as_ref())?;
        let values = ConfigValues::from_props(&props, &transform.config_params())?;
        transform.configure(&values)?;
        Ok(transform)
    }
}

fn bytes_converter_key() -> Box<dyn Transformation> {
    Box::new(BytesConverter::key())
}

fn bytes_converter_value() -> Box<dyn Transformation> {
    Box::new(BytesConverter::value())
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Flatten a transform option table into the flat string map transforms
/// are configured from.
pub fn flatten_config(
    config: Option<&serde_json::Value>,
) -> Result<HashMap<String, String>, EngineError> {
    let obj = match config {
        Some(serde_json::Value::Object(map)) => map,
        Some(_) => {
            return Err(EngineError::Config(
                "transform config must be a table/object".into(),
            ))
        }
        None => return Ok(HashMap::new()),
    };

    Ok(obj
        .iter()
        .map(|(key, val)| (key.clone(), flatten_value(val)))
        .collect())
}

/// Flatten a value into a string for flat config transport.
///
/// Scalars are converted directly (no quoting).
/// Arrays and objects are serialized as JSON strings.
fn flatten_value(val: &serde_json::Value) -> String {
    match val {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => val.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteconv_api::error::ErrorKind;
    use serde_json::json;

    fn transform_config(transform_type: &str, config: serde_json::Value) -> TransformConfig {
        TransformConfig {
            name: "t".into(),
            transform_type: transform_type.into(),
            config: Some(config),
        }
    }

    #[test]
    fn test_builtins() {
        let registry = TransformRegistry::with_builtins();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, ["bytes-converter.key", "bytes-converter.value"]);
    }

    #[test]
    fn test_unknown_type() {
        let registry = TransformRegistry::with_builtins();
        let err = registry
            .build(&transform_config("mask-field", json!({})))
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::UnknownTransform(name) if name == "mask-field"));
    }

    #[test]
    fn test_flatten_scalars() {
        let props = flatten_config(Some(&json!({
            "field.name": "data",
            "retries": 3,
            "strict": true,
            "list": ["a", "b"],
        })))
        .unwrap();
        assert_eq!(props["field.name"], "data");
        assert_eq!(props["retries"], "3");
        assert_eq!(props["strict"], "true");
        assert_eq!(props["list"], r#"["a","b"]"#);
    }

    #[test]
    fn test_config_must_be_table() {
        assert!(flatten_config(Some(&json!("field.name"))).is_err());
        assert!(flatten_config(None).unwrap().is_empty());
    }

    #[test]
    fn test_missing_field_name_fails_configure() {
        let registry = TransformRegistry::with_builtins();
        let err = registry
            .build(&transform_config("bytes-converter.value", json!({"target.charset": "IBM037"})))
            .err()
            .unwrap();
        match err {
            EngineError::Transform(e) => assert_eq!(e.kind(), ErrorKind::Config),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_build_ignores_unknown_keys() {
        let registry = TransformRegistry::with_builtins();
        registry
            .build(&transform_config(
                "bytes-converter.value",
                json!({"field.name": "data", "comment": "x"}),
            ))
            .unwrap();
    }
}
