use std::collections::HashMap;

use crate::error::TransformError;

/// Parameter type for transform configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Bool,
    I64,
    U64,
    Str,
}

/// How much an operator should care about a parameter. Documentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    High,
    Medium,
    Low,
}

/// Declaration of a single config parameter.
///
/// Transforms export these via `config_params()`.
/// The engine uses them to validate the flat option map BEFORE configuring.
#[derive(Debug, Clone)]
pub struct ConfigParam {
    pub name: String,
    pub param_type: ParamType,
    pub importance: Importance,
    pub required: bool,
    pub default: Option<ParamValue>,
    pub description: String,
}

/// Typed config value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    I64(i64),
    U64(u64),
    Str(String),
}

/// Validated config values, passed to a transform at configure time.
///
/// Built from the pipeline's flat `name -> string` option map after checking
/// it against the transform's `ConfigParam` declarations.
/// Transforms read values via typed getters.
#[derive(Debug, Clone, Default)]
pub struct ConfigValues {
    entries: Vec<(String, ParamValue)>,
}

impl ConfigValues {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Validate a flat option map against `params`.
    ///
    /// - Declared keys are parsed according to their `ParamType`.
    /// - Unknown keys are ignored.
    /// - Absent keys take their default; absent required keys are an error.
    pub fn from_props(
        props: &HashMap<String, String>,
        params: &[ConfigParam],
    ) -> Result<Self, TransformError> {
        for key in props.keys() {
            if !params.iter().any(|p| &p.name == key) {
                tracing::debug!(key = %key, "ignoring unrecognized config option");
            }
        }

        let mut values = ConfigValues::new();
        for param in params {
            match props.get(&param.name) {
                Some(raw) => values.set(&param.name, parse_param(raw, param)?),
                None => {
                    if let Some(default) = &param.default {
                        values.set(&param.name, default.clone());
                    } else if param.required {
                        return Err(TransformError::config(format!(
                            "missing required configuration \"{}\" which has no default value",
                            param.name
                        )));
                    }
                }
            }
        }
        Ok(values)
    }

    pub fn set(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == &name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(ParamValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(ParamValue::I64(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        match self.get(name) {
            Some(ParamValue::U64(v)) => Some(*v),
            Some(ParamValue::I64(v)) if *v >= 0 => Some(*v as u64),
            _ => None,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(ParamValue::Str(v)) => Some(v),
            _ => None,
        }
    }
}

fn parse_param(raw: &str, param: &ConfigParam) -> Result<ParamValue, TransformError> {
    let invalid = |expected: &str| {
        TransformError::config(format!(
            "invalid value '{raw}' for configuration \"{}\": expected {expected}",
            param.name
        ))
    };
    let trimmed = raw.trim();
    match param.param_type {
        ParamType::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Ok(ParamValue::Bool(true)),
            "false" => Ok(ParamValue::Bool(false)),
            _ => Err(invalid("true or false")),
        },
        ParamType::I64 => trimmed
            .parse()
            .map(ParamValue::I64)
            .map_err(|_| invalid("an integer")),
        ParamType::U64 => trimmed
            .parse()
            .map(ParamValue::U64)
            .map_err(|_| invalid("a non-negative integer")),
        ParamType::Str => Ok(ParamValue::Str(trimmed.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn params() -> Vec<ConfigParam> {
        vec![
            ConfigParam {
                name: "field.name".into(),
                param_type: ParamType::Str,
                importance: Importance::High,
                required: true,
                default: None,
                description: "field to convert".into(),
            },
            ConfigParam {
                name: "source.charset".into(),
                param_type: ParamType::Str,
                importance: Importance::High,
                required: false,
                default: Some(ParamValue::Str("ISO-8859-1".into())),
                description: "charset of original field".into(),
            },
            ConfigParam {
                name: "strict".into(),
                param_type: ParamType::Bool,
                importance: Importance::Low,
                required: false,
                default: Some(ParamValue::Bool(false)),
                description: "strict mode".into(),
            },
        ]
    }

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_and_unknown_keys() {
        let values = ConfigValues::from_props(
            &props(&[("field.name", "data"), ("something.else", "x")]),
            &params(),
        )
        .unwrap();
        assert_eq!(values.get_str("field.name"), Some("data"));
        assert_eq!(values.get_str("source.charset"), Some("ISO-8859-1"));
        assert_eq!(values.get_bool("strict"), Some(false));
        assert_eq!(values.get("something.else"), None);
    }

    #[test]
    fn test_missing_required() {
        let err = ConfigValues::from_props(&props(&[]), &params()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.message().contains("field.name"));
    }

    #[test]
    fn test_typed_parse() {
        let values = ConfigValues::from_props(
            &props(&[("field.name", " data "), ("strict", "TRUE")]),
            &params(),
        )
        .unwrap();
        assert_eq!(values.get_str("field.name"), Some("data"));
        assert_eq!(values.get_bool("strict"), Some(true));

        let err = ConfigValues::from_props(
            &props(&[("field.name", "data"), ("strict", "yes")]),
            &params(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
