use std::fmt;

use byteconv_api::error::TransformError;

use crate::charset::{Charset, UnmappableAction};

/// Space-separated uppercase hex, e.g. `88 89`.
pub struct Hex<'a>(pub &'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

/// Re-emit `text` as bytes under `target`.
///
/// `source` only feeds the trace output; the text is already decoded.
pub fn convert(text: &str, source: &Charset, target: &Charset) -> Result<Vec<u8>, TransformError> {
    convert_with(text, source, target, UnmappableAction::Replace)
}

pub fn convert_with(
    text: &str,
    source: &Charset,
    target: &Charset,
    action: UnmappableAction,
) -> Result<Vec<u8>, TransformError> {
    if tracing::enabled!(tracing::Level::TRACE) {
        // Lossy: the dump must not fail a record the target can encode.
        if let Ok(source_bytes) = source.encode(text, UnmappableAction::Replace) {
            tracing::trace!(
                charset = %source,
                hex = %Hex(&source_bytes),
                "source binary:<start>{}<end>",
                source.decode(&source_bytes)
            );
        }
    }

    let target_bytes = target.encode(text, action)?;

    if tracing::enabled!(tracing::Level::TRACE) {
        tracing::trace!(
            charset = %target,
            hex = %Hex(&target_bytes),
            "target binary:<start>{}<end>",
            target.decode(&target_bytes)
        );
    }

    Ok(target_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::field::{Field, Visit};
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Counts every field value formatted for an event.
    struct FormattedFields(Arc<AtomicUsize>);

    impl Visit for FormattedFields {
        fn record_debug(&mut self, _field: &Field, value: &dyn fmt::Debug) {
            let _ = format!("{value:?}");
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    struct FieldCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for FieldCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            event.record(&mut FormattedFields(self.0.clone()));
        }
    }

    fn formatted_fields_at(level: LevelFilter) -> usize {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry()
            .with(level)
            .with(FieldCounter(count.clone()));
        let bytes = tracing::subscriber::with_default(subscriber, || {
            convert("hi", &charset("ISO-8859-1"), &charset("IBM285")).unwrap()
        });
        assert_eq!(bytes, vec![0x88, 0x89]);
        count.load(Ordering::Relaxed)
    }

    fn charset(name: &str) -> Charset {
        Charset::for_name(name).unwrap()
    }

    #[test]
    fn test_convert_ignores_source_for_output() {
        let text = "This is a binary string";
        let expected = vec![
            0xE3, 0x88, 0x89, 0xA2, 0x40, 0x89, 0xA2, 0x40, 0x81, 0x40, 0x82, 0x89, 0x95, 0x81, 0x99,
            0xA8, 0x40, 0xA2, 0xA3, 0x99, 0x89, 0x95, 0x87,
        ];
        let target = charset("IBM285");
        assert_eq!(convert(text, &charset("ISO-8859-1"), &target).unwrap(), expected);
        assert_eq!(convert(text, &charset("UTF-8"), &target).unwrap(), expected);
    }

    #[test]
    fn test_same_source_and_target() {
        let cs = charset("IBM285");
        let direct = cs.encode("hi £", UnmappableAction::Replace).unwrap();
        assert_eq!(convert("hi £", &cs, &cs).unwrap(), direct);
    }

    #[test]
    fn test_fail_action_propagates() {
        let err = convert_with("€", &charset("ISO-8859-1"), &charset("IBM285"), UnmappableAction::Fail)
            .unwrap_err();
        assert_eq!(err.kind(), byteconv_api::error::ErrorKind::Encoding);
    }

    #[test]
    fn test_dump_skipped_below_trace() {
        assert_eq!(formatted_fields_at(LevelFilter::INFO), 0);
    }

    #[test]
    fn test_dump_formats_both_sides_at_trace() {
        // charset, hex and message for each side
        assert_eq!(formatted_fields_at(LevelFilter::TRACE), 6);
    }

    #[test]
    fn test_hex_format() {
        assert_eq!(Hex(&[0x88, 0x89, 0x0A]).to_string(), "88 89 0A");
        assert_eq!(Hex(&[]).to_string(), "");
    }
}
