use std::fmt;

/// Category of a transform error. Lets the pipeline decide batch-level
/// policy (fail the task, skip, dead-letter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or missing configuration. Permanent, fails at startup.
    Config,
    /// A charset name that the registry does not know.
    UnsupportedEncoding,
    /// A character that the target charset cannot represent.
    Encoding,
    /// Operating value has the wrong shape for the detected path.
    TypeMismatch,
    /// Malformed JSON envelope or schema description.
    Format,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::UnsupportedEncoding => f.write_str("unsupported encoding"),
            ErrorKind::Encoding => f.write_str("encoding"),
            ErrorKind::TypeMismatch => f.write_str("type mismatch"),
            ErrorKind::Format => f.write_str("format"),
        }
    }
}

/// Error returned by every fallible operation in the record path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformError {
    kind: ErrorKind,
    message: String,
}

impl TransformError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Config, message: msg.into() }
    }

    pub fn unsupported_encoding(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::UnsupportedEncoding, message: msg.into() }
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Encoding, message: msg.into() }
    }

    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::TypeMismatch, message: msg.into() }
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Format, message: msg.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for TransformError {}

// ---------------------------------------------------------------------------
// From impls: standard error types → TransformError with correct ErrorKind
// ---------------------------------------------------------------------------

impl From<serde_json::Error> for TransformError {
    fn from(e: serde_json::Error) -> Self {
        Self::format(e.to_string())
    }
}

impl From<base64::DecodeError> for TransformError {
    fn from(e: base64::DecodeError) -> Self {
        Self::format(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_kind() {
        let err = TransformError::unsupported_encoding("unknown charset 'IBM999'")
            .with_context("field 'data'");
        assert_eq!(err.kind(), ErrorKind::UnsupportedEncoding);
        assert_eq!(err.message(), "field 'data': unknown charset 'IBM999'");
        assert_eq!(
            err.to_string(),
            "[unsupported encoding] field 'data': unknown charset 'IBM999'"
        );
    }

    #[test]
    fn test_json_error_is_format() {
        let err: TransformError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
