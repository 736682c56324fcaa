use std::path::Path;

use serde::Deserialize;

use crate::error::EngineError;

/// Root configuration: an ordered list of transforms.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ByteconvConfig {
    #[serde(default)]
    pub transforms: Vec<TransformConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransformConfig {
    pub name: String,
    /// Registered transform type, e.g. `bytes-converter.value`.
    #[serde(rename = "type")]
    pub transform_type: String,
    /// Option table. Scalars are flattened to strings before validation.
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

/// A file format the configuration can be written in.
pub trait ConfigParser {
    /// File extensions (without the dot) handled by this parser.
    fn extensions(&self) -> &[&str];

    fn parse(&self, content: &str) -> Result<ByteconvConfig, EngineError>;
}

pub struct TomlParser;

impl ConfigParser for TomlParser {
    fn extensions(&self) -> &[&str] {
        &["toml"]
    }

    fn parse(&self, content: &str) -> Result<ByteconvConfig, EngineError> {
        ByteconvConfig::parse(content)
    }
}

impl ByteconvConfig {
    /// Load configuration from a file, picking the parser by extension.
    ///
    /// TOML is always available; `extra` adds other formats.
    pub fn load(path: &Path, extra: &[&dyn ConfigParser]) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("toml")
            .to_ascii_lowercase();

        let toml = TomlParser;
        let parser = std::iter::once(&toml as &dyn ConfigParser)
            .chain(extra.iter().copied())
            .find(|p| p.extensions().contains(&ext.as_str()))
            .ok_or_else(|| {
                EngineError::Config(format!(
                    "{}: no config parser for extension '{ext}'",
                    path.display()
                ))
            })?;

        let config = parser
            .parse(&content)
            .map_err(|e| e.with_context(path.display()))?;
        tracing::debug!(path = %path.display(), transforms = config.transforms.len(), "loaded config");
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))
    }
}
