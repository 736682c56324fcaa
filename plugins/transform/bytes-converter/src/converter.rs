use byteconv_api::cache::{Cache, CacheStats, SynchronizedCache};
use byteconv_api::config::{ConfigParam, ConfigValues};
use byteconv_api::error::TransformError;
use byteconv_api::record::Record;
use byteconv_api::schema::SchemaRef;
use byteconv_api::transform::Transformation;
use byteconv_api::value::{Struct, Value};

use crate::charset::{Charset, UnmappableAction};
use crate::config::BytesConverterConfig;
use crate::convert::convert_with;
use crate::mutate::derive_mutated_schema;

/// Mutated schemas kept per configured converter.
pub const SCHEMA_CACHE_CAPACITY: usize = 16;

// ════════════════════════════════════════════════════════════════
//  Record half
// ════════════════════════════════════════════════════════════════

/// Which half of a record a converter operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordHalf {
    Key,
    Value,
}

impl RecordHalf {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordHalf::Key => "key",
            RecordHalf::Value => "value",
        }
    }

    /// Move the operating schema and value out of `record`.
    fn split(self, record: &mut Record) -> (Option<SchemaRef>, Value) {
        match self {
            RecordHalf::Key => record.take_key(),
            RecordHalf::Value => record.take_value(),
        }
    }

    /// Put a rewritten half back; the other half and the metadata are untouched.
    fn join(self, record: Record, schema: Option<SchemaRef>, value: Value) -> Record {
        match self {
            RecordHalf::Key => record.with_key(schema, value),
            RecordHalf::Value => record.with_value(schema, value),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Configured state
// ════════════════════════════════════════════════════════════════

/// Everything `configure` freezes: the parameters, the resolved charsets and
/// the schema cache.
struct ConverterState {
    field_name: String,
    source_name: String,
    target_name: String,
    /// Resolution failure is kept and reported by every `apply`.
    charsets: Result<(Charset, Charset), TransformError>,
    action: UnmappableAction,
    schema_cache: SynchronizedCache<SchemaRef, SchemaRef>,
}

impl ConverterState {
    fn new(config: BytesConverterConfig) -> Result<Self, TransformError> {
        if config.field_name.trim().is_empty() {
            return Err(TransformError::config("\"field.name\" must not be empty"));
        }
        let action: UnmappableAction = config.unmappable_action.parse()?;

        let charsets = Charset::for_name(&config.source_charset)
            .and_then(|source| Ok((source, Charset::for_name(&config.target_charset)?)));
        if let Err(e) = &charsets {
            tracing::warn!(
                field = %config.field_name,
                source = %config.source_charset,
                target = %config.target_charset,
                error = %e,
                "charset does not resolve, every record will fail"
            );
        }

        Ok(Self {
            field_name: config.field_name,
            source_name: config.source_charset,
            target_name: config.target_charset,
            charsets,
            action,
            schema_cache: SynchronizedCache::new(SCHEMA_CACHE_CAPACITY),
        })
    }

    fn context(&self) -> String {
        format!(
            "field '{}' ({} -> {})",
            self.field_name, self.source_name, self.target_name
        )
    }

    fn convert(&self, text: &str) -> Result<Vec<u8>, TransformError> {
        let (source, target) = self.charsets.as_ref().map_err(Clone::clone)?;
        convert_with(text, source, target, self.action)
    }

    fn apply_schemaless(&self, value: Value, half: RecordHalf) -> Result<Value, TransformError> {
        let Value::Map(mut entries) = value else {
            return Err(TransformError::type_mismatch(format!(
                "only map objects supported in absence of schema for the record {}, found: {}",
                half.as_str(),
                value.type_name()
            )));
        };

        let target = entries
            .iter_mut()
            .find(|(k, _)| k.as_str() == Some(self.field_name.as_str()))
            .map(|(_, v)| v);
        if let Some(slot) = target {
            if let Value::String(text) = slot {
                *slot = Value::Bytes(self.convert(text)?);
            }
        }
        Ok(Value::Map(entries))
    }

    fn apply_with_schema(
        &self,
        value: Value,
        half: RecordHalf,
    ) -> Result<(SchemaRef, Value), TransformError> {
        let Value::Struct(input) = value else {
            return Err(TransformError::type_mismatch(format!(
                "only struct objects supported with a schema for the record {}, found: {}",
                half.as_str(),
                value.type_name()
            )));
        };

        let mutated = self.mutated_schema(input.schema())?;

        let mut output = Struct::new(mutated.clone());
        for (field, original) in mutated.fields().iter().zip(input.into_values()) {
            let rewritten = if field.name() == self.field_name {
                self.convert_field(original)?
            } else {
                original
            };
            output.put_field(field, rewritten)?;
        }
        Ok((mutated, Value::Struct(output)))
    }

    /// Cached derivation. Two workers missing on the same schema both derive
    /// it; the results are equal so either write is fine.
    fn mutated_schema(&self, schema: &SchemaRef) -> Result<SchemaRef, TransformError> {
        if let Some(mutated) = self.schema_cache.get(schema) {
            return Ok(mutated);
        }
        let mutated = derive_mutated_schema(schema, &self.field_name)?;
        self.schema_cache.put(schema.clone(), mutated.clone());
        Ok(mutated)
    }

    fn convert_field(&self, original: Value) -> Result<Value, TransformError> {
        match original {
            Value::String(text) => self.convert(&text).map(Value::Bytes),
            Value::Null => Ok(Value::Null),
            other => Err(TransformError::type_mismatch(format!(
                "expected a string, found {}",
                other.type_name()
            ))),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  BytesConverter
// ════════════════════════════════════════════════════════════════

/// Rewrites one textual field into its bytes under a target charset.
///
/// Schemaless halves must be maps; the field is replaced only when it holds
/// a string. Schema-typed halves must be structs; they are rebuilt under a
/// cached mutated schema where the field is optional bytes.
pub struct BytesConverter {
    half: RecordHalf,
    state: Option<ConverterState>,
}

impl BytesConverter {
    pub fn new(half: RecordHalf) -> Self {
        Self { half, state: None }
    }

    /// Converter operating on record keys.
    pub fn key() -> Self {
        Self::new(RecordHalf::Key)
    }

    /// Converter operating on record values.
    pub fn value() -> Self {
        Self::new(RecordHalf::Value)
    }

    pub fn half(&self) -> RecordHalf {
        self.half
    }

    /// Schema cache counters. `None` unless configured.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.state.as_ref().map(|s| s.schema_cache.stats())
    }

    /// Number of cached schemas. `None` unless configured.
    pub fn cache_size(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.schema_cache.size())
    }

    fn state(&self) -> Result<&ConverterState, TransformError> {
        self.state.as_ref().ok_or_else(|| {
            TransformError::config(format!(
                "bytes converter ({}) is not configured or already closed",
                self.half.as_str()
            ))
        })
    }
}

impl Transformation for BytesConverter {
    fn config_params(&self) -> Vec<ConfigParam> {
        BytesConverterConfig::config_params()
    }

    fn configure(&mut self, config: &ConfigValues) -> Result<(), TransformError> {
        let config = BytesConverterConfig::from_config(config)?;
        let state = ConverterState::new(config)?;
        tracing::info!(
            half = self.half.as_str(),
            field = %state.field_name,
            source = %state.source_name,
            target = %state.target_name,
            unmappable = %state.action,
            "bytes converter configured"
        );
        self.state = Some(state);
        Ok(())
    }

    /// Every failure carries the field and both charset names.
    fn apply(&self, mut record: Record) -> Result<Record, TransformError> {
        let state = self.state()?;
        let (schema, value) = self.half.split(&mut record);
        let rewritten = match schema {
            None => state.apply_schemaless(value, self.half).map(|value| (None, value)),
            Some(_) => state
                .apply_with_schema(value, self.half)
                .map(|(mutated, value)| (Some(mutated), value)),
        };
        let (schema, value) = rewritten.map_err(|e| e.with_context(state.context()))?;
        Ok(self.half.join(record, schema, value))
    }

    fn close(&mut self) {
        self.state = None;
    }
}
