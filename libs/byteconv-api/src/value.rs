use std::hash::{Hash, Hasher};

use crate::error::TransformError;
use crate::schema::{Field, SchemaRef};

/// Canonical value representation, shared by schemaless and schema-typed data.
///
/// - Schemaless values are usually a `Map` with `String` keys.
/// - Schema-typed values are a `Struct` bound to its schema.
///
/// Equality and hashing are structural. Floats compare by bit pattern so that
/// `Value` can be a cache key and live inside schema defaults.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    /// Ordered key/value pairs. Keys are unique.
    Map(Vec<(Value, Value)>),
    Struct(Struct),
}

impl Value {
    /// Short type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Int8(_) => "int8",
            Value::Int16(_) => "int16",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Struct(_) => "struct",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a `String`-keyed entry of a `Map`. `None` for non-maps.
    pub fn map_get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Build a `Map` from `String`-keyed pairs.
    pub fn map_from<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Value::String(k.into()), v))
                .collect(),
        )
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<Struct> for Value {
    fn from(s: Struct) -> Self {
        Value::Struct(s)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Int8(a), Value::Int8(b)) => a == b,
            (Value::Int16(a), Value::Int16(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a.to_bits() == b.to_bits(),
            (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Struct(a), Value::Struct(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(v) => v.hash(state),
            Value::Int8(v) => v.hash(state),
            Value::Int16(v) => v.hash(state),
            Value::Int32(v) => v.hash(state),
            Value::Int64(v) => v.hash(state),
            Value::Float32(v) => v.to_bits().hash(state),
            Value::Float64(v) => v.to_bits().hash(state),
            Value::String(v) => v.hash(state),
            Value::Bytes(v) => v.hash(state),
            Value::Array(v) => v.hash(state),
            Value::Map(v) => v.hash(state),
            Value::Struct(v) => v.hash(state),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Struct
// ════════════════════════════════════════════════════════════════

/// A structured value bound to exactly one struct schema.
///
/// Positional: slot `i` holds the value of `schema.fields()[i]`.
/// A fresh struct has every slot set to `Null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Struct {
    schema: SchemaRef,
    values: Vec<Value>,
}

impl Struct {
    pub fn new(schema: SchemaRef) -> Self {
        let values = vec![Value::Null; schema.fields().len()];
        Self { schema, values }
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Value of the named field. `None` if the schema has no such field.
    pub fn get(&self, field_name: &str) -> Option<&Value> {
        let field = self.schema.field(field_name)?;
        self.values.get(field.index())
    }

    /// Set the named field, validating the value against the field schema.
    pub fn put(&mut self, field_name: &str, value: impl Into<Value>) -> Result<&mut Self, TransformError> {
        let schema = self.schema.clone();
        let field = schema.field(field_name).ok_or_else(|| {
            TransformError::type_mismatch(format!(
                "'{field_name}' is not a valid field name for struct '{}'",
                schema.name().unwrap_or("<anonymous>")
            ))
        })?;
        self.put_field(field, value)
    }

    /// Set a field by descriptor. The field must belong to this struct's schema.
    pub fn put_field(&mut self, field: &Field, value: impl Into<Value>) -> Result<&mut Self, TransformError> {
        let value = value.into();
        match self.schema.fields().get(field.index()) {
            Some(own) if own == field => {}
            _ => {
                return Err(TransformError::type_mismatch(format!(
                    "field '{}' does not belong to this struct's schema",
                    field.name()
                )));
            }
        }
        field
            .schema()
            .validate_value(&value)
            .map_err(|e| e.with_context(format!("field '{}'", field.name())))?;
        self.values[field.index()] = value;
        Ok(self)
    }

    /// Check that every non-optional field holds a value.
    pub fn validate(&self) -> Result<(), TransformError> {
        for (field, value) in self.schema.fields().iter().zip(&self.values) {
            field
                .schema()
                .validate_value(value)
                .map_err(|e| e.with_context(format!("field '{}'", field.name())))?;
        }
        Ok(())
    }

    /// Slots in field order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Give up the struct, yielding its slots in field order.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
