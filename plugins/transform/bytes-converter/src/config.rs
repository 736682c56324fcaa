use byteconv_api::ConfigParams;

pub const DEFAULT_SOURCE_CHARSET: &str = "ISO-8859-1";
pub const DEFAULT_TARGET_CHARSET: &str = "IBM285";
pub const DEFAULT_UNMAPPABLE_ACTION: &str = "replace";

/// Options of a bytes converter, read from the flat option map.
#[derive(Debug, Clone, ConfigParams)]
pub struct BytesConverterConfig {
    #[param(name = "field.name", importance = "high", description = "field to convert", required)]
    pub field_name: String,

    #[param(
        name = "source.charset",
        importance = "high",
        description = "charset of original field, default is ISO-8859-1"
    )]
    pub source_charset: String,

    #[param(
        name = "target.charset",
        importance = "high",
        description = "charset of converted field, default is IBM285"
    )]
    pub target_charset: String,

    #[param(
        name = "unmappable.action",
        importance = "low",
        description = "what to do with characters the target charset cannot encode: replace or fail"
    )]
    pub unmappable_action: String,
}

impl Default for BytesConverterConfig {
    fn default() -> Self {
        Self {
            field_name: String::new(),
            source_charset: DEFAULT_SOURCE_CHARSET.to_string(),
            target_charset: DEFAULT_TARGET_CHARSET.to_string(),
            unmappable_action: DEFAULT_UNMAPPABLE_ACTION.to_string(),
        }
    }
}
