use byteconv_api::error::TransformError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("unknown transform type: {0}")]
    UnknownTransform(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Add context to the error.
    ///
    /// For `Transform` variant, context is added to the inner `TransformError`.
    /// For other variants, context is prepended to the message.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Transform(e) => EngineError::Transform(e.with_context(ctx)),
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            EngineError::UnknownTransform(msg) => {
                EngineError::UnknownTransform(format!("{ctx}: {msg}"))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteconv_api::error::ErrorKind;

    #[test]
    fn test_context_keeps_transform_kind() {
        let err = EngineError::from(TransformError::unsupported_encoding("unsupported charset 'x'"))
            .with_context("transform 'to-ebcdic'");
        match err {
            EngineError::Transform(e) => {
                assert_eq!(e.kind(), ErrorKind::UnsupportedEncoding);
                assert_eq!(e.message(), "transform 'to-ebcdic': unsupported charset 'x'");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_context_on_config() {
        let err = EngineError::Config("bad".into()).with_context("pipeline.toml");
        assert_eq!(err.to_string(), "config error: pipeline.toml: bad");
    }
}
