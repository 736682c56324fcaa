use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

use crate::error::TransformError;
use crate::value::Value;

/// Shared, immutable schema handle. Records, structs and caches all hold these.
pub type SchemaRef = Arc<Schema>;

/// Shared "optional byte sequence" schema.
pub static OPTIONAL_BYTES_SCHEMA: LazyLock<SchemaRef> =
    LazyLock::new(|| SchemaBuilder::bytes().optional().build());

// ════════════════════════════════════════════════════════════════
//  Schema Type
// ════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Boolean,
    String,
    Bytes,
    Array,
    Map,
    Struct,
}

impl SchemaType {
    pub fn is_primitive(&self) -> bool {
        !matches!(self, SchemaType::Array | SchemaType::Map | SchemaType::Struct)
    }

    /// Parse the lowercase type name used in schema JSON.
    pub fn from_name(name: &str) -> Option<Self> {
        let t = match name {
            "int8" => SchemaType::Int8,
            "int16" => SchemaType::Int16,
            "int32" => SchemaType::Int32,
            "int64" => SchemaType::Int64,
            "float32" => SchemaType::Float32,
            "float64" => SchemaType::Float64,
            "boolean" => SchemaType::Boolean,
            "string" => SchemaType::String,
            "bytes" => SchemaType::Bytes,
            "array" => SchemaType::Array,
            "map" => SchemaType::Map,
            "struct" => SchemaType::Struct,
            _ => return None,
        };
        Some(t)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SchemaType::Int8 => "int8",
            SchemaType::Int16 => "int16",
            SchemaType::Int32 => "int32",
            SchemaType::Int64 => "int64",
            SchemaType::Float32 => "float32",
            SchemaType::Float64 => "float64",
            SchemaType::Boolean => "boolean",
            SchemaType::String => "string",
            SchemaType::Bytes => "bytes",
            SchemaType::Array => "array",
            SchemaType::Map => "map",
            SchemaType::Struct => "struct",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ════════════════════════════════════════════════════════════════
//  Field
// ════════════════════════════════════════════════════════════════

/// One named, positioned member of a struct schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    name: String,
    index: usize,
    schema: SchemaRef,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in the parent schema's field list (and in `Struct` slots).
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.schema)
    }
}

// ════════════════════════════════════════════════════════════════
//  Schema
// ════════════════════════════════════════════════════════════════

/// Immutable schema descriptor.
///
/// Built only through [`SchemaBuilder`]. A content fingerprint is computed at
/// build time: `Hash` writes the fingerprint and `Eq` checks it before falling
/// back to a full structural comparison, so two independently built but
/// identical schemas are equal and hash alike.
#[derive(Debug, Clone)]
pub struct Schema {
    schema_type: SchemaType,
    optional: bool,
    default: Option<Value>,
    name: Option<String>,
    version: Option<i32>,
    doc: Option<String>,
    parameters: BTreeMap<String, String>,
    fields: Vec<Field>,
    key_schema: Option<SchemaRef>,
    value_schema: Option<SchemaRef>,
    fingerprint: u64,
}

impl Schema {
    pub fn schema_type(&self) -> SchemaType {
        self.schema_type
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn version(&self) -> Option<i32> {
        self.version
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Declared fields in order. Empty for non-struct schemas.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Key schema of a map.
    pub fn key_schema(&self) -> Option<&SchemaRef> {
        self.key_schema.as_ref()
    }

    /// Value schema of a map, element schema of an array.
    pub fn value_schema(&self) -> Option<&SchemaRef> {
        self.value_schema.as_ref()
    }

    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Check that `value` conforms to this schema.
    ///
    /// Null is accepted only for optional schemas. Nested structs must carry an
    /// equal schema and are validated in turn.
    pub fn validate_value(&self, value: &Value) -> Result<(), TransformError> {
        let mismatch = || {
            TransformError::type_mismatch(format!(
                "invalid {} value for schema {self}",
                value.type_name()
            ))
        };

        match (self.schema_type, value) {
            (_, Value::Null) if self.optional => Ok(()),
            (_, Value::Null) => Err(TransformError::type_mismatch(format!(
                "null used for required schema {self}"
            ))),
            (SchemaType::Int8, Value::Int8(_))
            | (SchemaType::Int16, Value::Int16(_))
            | (SchemaType::Int32, Value::Int32(_))
            | (SchemaType::Int64, Value::Int64(_))
            | (SchemaType::Float32, Value::Float32(_))
            | (SchemaType::Float64, Value::Float64(_))
            | (SchemaType::Boolean, Value::Boolean(_))
            | (SchemaType::String, Value::String(_))
            | (SchemaType::Bytes, Value::Bytes(_)) => Ok(()),
            (SchemaType::Array, Value::Array(items)) => {
                let element = self.value_schema.as_ref().ok_or_else(mismatch)?;
                items.iter().try_for_each(|item| element.validate_value(item))
            }
            (SchemaType::Map, Value::Map(entries)) => {
                let key = self.key_schema.as_ref().ok_or_else(mismatch)?;
                let val = self.value_schema.as_ref().ok_or_else(mismatch)?;
                entries.iter().try_for_each(|(k, v)| {
                    key.validate_value(k)?;
                    val.validate_value(v)
                })
            }
            (SchemaType::Struct, Value::Struct(s)) => {
                if s.schema().as_ref() != self {
                    return Err(TransformError::type_mismatch(format!(
                        "struct schemas do not match: expected {self}, found {}",
                        s.schema()
                    )));
                }
                s.validate()
            }
            _ => Err(mismatch()),
        }
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.fingerprint == other.fingerprint
            && self.schema_type == other.schema_type
            && self.optional == other.optional
            && self.default == other.default
            && self.name == other.name
            && self.version == other.version
            && self.doc == other.doc
            && self.parameters == other.parameters
            && self.fields == other.fields
            && self.key_schema == other.key_schema
            && self.value_schema == other.value_schema
    }
}

impl Eq for Schema {}

impl Hash for Schema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.fingerprint);
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Schema{")?;
        if let Some(name) = &self.name {
            write!(f, "{name}:")?;
        }
        if self.optional {
            f.write_str("optional ")?;
        }
        write!(f, "{}}}", self.schema_type)
    }
}

// ════════════════════════════════════════════════════════════════
//  Builder
// ════════════════════════════════════════════════════════════════

/// Fluent builder for [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    schema_type: SchemaType,
    optional: bool,
    default: Option<Value>,
    name: Option<String>,
    version: Option<i32>,
    doc: Option<String>,
    parameters: BTreeMap<String, String>,
    fields: Vec<Field>,
    key_schema: Option<SchemaRef>,
    value_schema: Option<SchemaRef>,
}

impl SchemaBuilder {
    pub fn new(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            optional: false,
            default: None,
            name: None,
            version: None,
            doc: None,
            parameters: BTreeMap::new(),
            fields: Vec::new(),
            key_schema: None,
            value_schema: None,
        }
    }

    pub fn int8() -> Self {
        Self::new(SchemaType::Int8)
    }

    pub fn int16() -> Self {
        Self::new(SchemaType::Int16)
    }

    pub fn int32() -> Self {
        Self::new(SchemaType::Int32)
    }

    pub fn int64() -> Self {
        Self::new(SchemaType::Int64)
    }

    pub fn float32() -> Self {
        Self::new(SchemaType::Float32)
    }

    pub fn float64() -> Self {
        Self::new(SchemaType::Float64)
    }

    pub fn boolean() -> Self {
        Self::new(SchemaType::Boolean)
    }

    pub fn string() -> Self {
        Self::new(SchemaType::String)
    }

    pub fn bytes() -> Self {
        Self::new(SchemaType::Bytes)
    }

    pub fn struct_type() -> Self {
        Self::new(SchemaType::Struct)
    }

    pub fn array(element: SchemaRef) -> Self {
        let mut builder = Self::new(SchemaType::Array);
        builder.value_schema = Some(element);
        builder
    }

    pub fn map(key: SchemaRef, value: SchemaRef) -> Self {
        let mut builder = Self::new(SchemaType::Map);
        builder.key_schema = Some(key);
        builder.value_schema = Some(value);
        builder
    }

    pub fn schema_type(&self) -> SchemaType {
        self.schema_type
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn version(mut self, version: i32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn parameters(mut self, params: &BTreeMap<String, String>) -> Self {
        self.parameters
            .extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Set the default value. It must conform to the schema built so far.
    pub fn default_value(mut self, value: Value) -> Result<Self, TransformError> {
        self.clone()
            .build_schema()
            .validate_value(&value)
            .map_err(|e| e.with_context("invalid default value"))?;
        self.default = Some(value);
        Ok(self)
    }

    /// Append a struct field. Names must be unique.
    pub fn field(mut self, name: impl Into<String>, schema: SchemaRef) -> Result<Self, TransformError> {
        let name = name.into();
        if self.schema_type != SchemaType::Struct {
            return Err(TransformError::type_mismatch(format!(
                "cannot add field '{name}' to a {} schema",
                self.schema_type
            )));
        }
        if name.is_empty() {
            return Err(TransformError::type_mismatch("field name cannot be empty"));
        }
        if self.fields.iter().any(|f| f.name == name) {
            return Err(TransformError::type_mismatch(format!(
                "cannot create field because of field name duplication '{name}'"
            )));
        }
        let index = self.fields.len();
        self.fields.push(Field { name, index, schema });
        Ok(self)
    }

    pub fn build(self) -> SchemaRef {
        Arc::new(self.build_schema())
    }

    fn build_schema(self) -> Schema {
        let mut hasher = DefaultHasher::new();
        self.schema_type.hash(&mut hasher);
        self.optional.hash(&mut hasher);
        self.default.hash(&mut hasher);
        self.name.hash(&mut hasher);
        self.version.hash(&mut hasher);
        self.doc.hash(&mut hasher);
        self.parameters.hash(&mut hasher);
        for field in &self.fields {
            field.name.hash(&mut hasher);
            hasher.write_u64(field.schema.fingerprint);
        }
        self.key_schema.as_ref().map(|s| s.fingerprint).hash(&mut hasher);
        self.value_schema.as_ref().map(|s| s.fingerprint).hash(&mut hasher);

        Schema {
            schema_type: self.schema_type,
            optional: self.optional,
            default: self.default,
            name: self.name,
            version: self.version,
            doc: self.doc,
            parameters: self.parameters,
            fields: self.fields,
            key_schema: self.key_schema,
            value_schema: self.value_schema,
            fingerprint: hasher.finish(),
        }
    }
}

/// Copy name, version, doc and parameters of `source` onto `builder`.
pub fn copy_schema_basics(source: &Schema, mut builder: SchemaBuilder) -> SchemaBuilder {
    builder.name = source.name.clone();
    builder.version = source.version;
    builder.doc = source.doc.clone();
    builder.parameters(&source.parameters)
}
