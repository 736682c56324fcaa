use std::collections::HashMap;

use byteconv_api::ConfigParams;
use byteconv_api::config::{ConfigValues, Importance, ParamType, ParamValue};
use byteconv_api::error::ErrorKind;

#[derive(ConfigParams, Debug, PartialEq)]
struct BatchConfig {
    #[param(name = "topic", importance = "high", description = "Topic to read", required)]
    topic: String,

    #[param(name = "batch.size", importance = "medium", description = "Records per batch")]
    batch_size: usize,

    #[param(name = "max.bytes", importance = "low", description = "Upper bound on a batch")]
    max_bytes: u64,

    #[param(name = "offset.delta", importance = "low", description = "Start offset shift")]
    offset_delta: i64,

    #[param(importance = "low", description = "Reject unknown fields")]
    strict: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            topic: String::new(),
            batch_size: 500,
            max_bytes: 1 << 20,
            offset_delta: -1,
            strict: false,
        }
    }
}

fn values(pairs: &[(&str, &str)]) -> Result<ConfigValues, byteconv_api::error::TransformError> {
    let props: HashMap<String, String> =
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    ConfigValues::from_props(&props, &BatchConfig::config_params())
}

#[test]
fn test_declarations_carry_types_and_defaults() {
    let params = BatchConfig::config_params();
    let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["topic", "batch.size", "max.bytes", "offset.delta", "strict"]);

    assert!(params[0].required);
    assert_eq!(params[0].default, None);
    assert!(matches!(params[0].importance, Importance::High));

    assert!(matches!(params[1].param_type, ParamType::U64));
    assert_eq!(params[1].default, Some(ParamValue::U64(500)));
    assert!(matches!(params[1].importance, Importance::Medium));

    assert!(matches!(params[2].param_type, ParamType::U64));
    assert_eq!(params[2].default, Some(ParamValue::U64(1 << 20)));

    assert!(matches!(params[3].param_type, ParamType::I64));
    assert_eq!(params[3].default, Some(ParamValue::I64(-1)));

    assert!(matches!(params[4].param_type, ParamType::Bool));
    assert_eq!(params[4].default, Some(ParamValue::Bool(false)));
    assert_eq!(params[4].description, "Reject unknown fields");
}

#[test]
fn test_from_config_reads_every_type() {
    let values = values(&[
        ("topic", "orders"),
        ("batch.size", "64"),
        ("max.bytes", "4096"),
        ("offset.delta", "-10"),
        ("strict", "TRUE"),
    ])
    .unwrap();

    let config = BatchConfig::from_config(&values).unwrap();

    assert_eq!(
        config,
        BatchConfig {
            topic: "orders".into(),
            batch_size: 64,
            max_bytes: 4096,
            offset_delta: -10,
            strict: true,
        }
    );
}

#[test]
fn test_from_config_falls_back_to_defaults() {
    let config = BatchConfig::from_config(&values(&[("topic", "orders")]).unwrap()).unwrap();
    assert_eq!(
        config,
        BatchConfig {
            topic: "orders".into(),
            ..BatchConfig::default()
        }
    );
}

#[test]
fn test_from_config_missing_required() {
    let err = BatchConfig::from_config(&ConfigValues::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(err.message().contains("\"topic\""));
}

#[test]
fn test_negative_value_for_unsigned_rejected() {
    let err = values(&[("topic", "orders"), ("batch.size", "-3")]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(err.message().contains("batch.size"));
}
