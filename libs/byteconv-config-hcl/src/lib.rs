use byteconv_engine::config::{ByteconvConfig, ConfigParser};
use byteconv_engine::error::EngineError;

pub struct HclParser;

impl ConfigParser for HclParser {
    fn extensions(&self) -> &[&str] {
        &["hcl"]
    }

    fn parse(&self, content: &str) -> Result<ByteconvConfig, EngineError> {
        let mut value: serde_json::Value =
            hcl::from_str(content).map_err(|e| EngineError::Config(e.to_string()))?;

        // A lone block comes out as an object, repeated blocks as an array.
        if let Some(transforms) = value.get_mut("transforms") {
            if transforms.is_object() {
                *transforms = serde_json::Value::Array(vec![transforms.take()]);
            }
        }

        serde_json::from_value(value).map_err(|e| EngineError::Config(e.to_string()))
    }
}
