//! JSON envelope for records, schemas and values.
//!
//! Schemas are described as `{"type": "struct", "optional": false,
//! "fields": [{"field": "id", "type": "int32"}, ...]}`. Values follow their
//! schema when one is given; bytes travel as base64 text. Without a schema,
//! JSON is decoded generically (objects become string-keyed maps).

use base64::Engine;
use serde::Deserialize;
use serde_json::{Map, Number, json};

use crate::error::TransformError;
use crate::record::{Header, Record};
use crate::schema::{Schema, SchemaBuilder, SchemaRef, SchemaType};
use crate::value::{Struct, Value};

// ═══════════════════════════════════════════════════════════════
//  Schema
// ═══════════════════════════════════════════════════════════════

pub fn schema_to_json(schema: &Schema) -> serde_json::Value {
    let mut obj = Map::new();
    obj.insert("type".into(), json!(schema.schema_type().name()));
    obj.insert("optional".into(), json!(schema.is_optional()));
    if let Some(name) = schema.name() {
        obj.insert("name".into(), json!(name));
    }
    if let Some(version) = schema.version() {
        obj.insert("version".into(), json!(version));
    }
    if let Some(doc) = schema.doc() {
        obj.insert("doc".into(), json!(doc));
    }
    if !schema.parameters().is_empty() {
        obj.insert("parameters".into(), json!(schema.parameters()));
    }
    if let Some(default) = schema.default_value() {
        obj.insert("default".into(), value_to_json(default));
    }
    match schema.schema_type() {
        SchemaType::Struct => {
            let fields = schema
                .fields()
                .iter()
                .map(|field| {
                    let mut f = match schema_to_json(field.schema()) {
                        serde_json::Value::Object(m) => m,
                        _ => Map::new(),
                    };
                    f.insert("field".into(), json!(field.name()));
                    serde_json::Value::Object(f)
                })
                .collect();
            obj.insert("fields".into(), serde_json::Value::Array(fields));
        }
        SchemaType::Array => {
            if let Some(items) = schema.value_schema() {
                obj.insert("items".into(), schema_to_json(items));
            }
        }
        SchemaType::Map => {
            if let Some(keys) = schema.key_schema() {
                obj.insert("keys".into(), schema_to_json(keys));
            }
            if let Some(values) = schema.value_schema() {
                obj.insert("values".into(), schema_to_json(values));
            }
        }
        _ => {}
    }
    serde_json::Value::Object(obj)
}

pub fn schema_from_json(json: &serde_json::Value) -> Result<SchemaRef, TransformError> {
    let obj = json
        .as_object()
        .ok_or_else(|| TransformError::format(format!("schema must be an object, got {json}")))?;
    let type_name = obj
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| TransformError::format("schema is missing \"type\""))?;
    let schema_type = SchemaType::from_name(type_name)
        .ok_or_else(|| TransformError::format(format!("unknown schema type '{type_name}'")))?;

    let nested = |key: &str| -> Result<SchemaRef, TransformError> {
        let inner = obj.get(key).ok_or_else(|| {
            TransformError::format(format!("{type_name} schema is missing \"{key}\""))
        })?;
        schema_from_json(inner).map_err(|e| e.with_context(key))
    };

    let mut builder = match schema_type {
        SchemaType::Array => SchemaBuilder::array(nested("items")?),
        SchemaType::Map => SchemaBuilder::map(nested("keys")?, nested("values")?),
        t => SchemaBuilder::new(t),
    };

    if obj.get("optional").and_then(|o| o.as_bool()).unwrap_or(false) {
        builder = builder.optional();
    }
    if let Some(name) = obj.get("name").and_then(|n| n.as_str()) {
        builder = builder.name(name);
    }
    if let Some(version) = obj.get("version").and_then(|v| v.as_i64()) {
        let version = i32::try_from(version)
            .map_err(|_| TransformError::format(format!("schema version {version} out of range")))?;
        builder = builder.version(version);
    }
    if let Some(doc) = obj.get("doc").and_then(|d| d.as_str()) {
        builder = builder.doc(doc);
    }
    if let Some(params) = obj.get("parameters").and_then(|p| p.as_object()) {
        for (k, v) in params {
            let v = v.as_str().ok_or_else(|| {
                TransformError::format(format!("schema parameter '{k}' must be a string"))
            })?;
            builder = builder.parameter(k.as_str(), v);
        }
    }

    if schema_type == SchemaType::Struct {
        let fields = obj
            .get("fields")
            .and_then(|f| f.as_array())
            .ok_or_else(|| TransformError::format("struct schema is missing \"fields\""))?;
        for field in fields {
            let name = field
                .get("field")
                .and_then(|n| n.as_str())
                .ok_or_else(|| TransformError::format("struct field is missing \"field\""))?;
            let field_schema = schema_from_json(field).map_err(|e| e.with_context(name))?;
            builder = builder.field(name, field_schema)?;
        }
    }

    if let Some(default) = obj.get("default").filter(|d| !d.is_null()) {
        let provisional = builder.clone().build();
        let value = value_from_json(default, Some(&provisional))?;
        builder = builder.default_value(value)?;
    }

    Ok(builder.build())
}

// ═══════════════════════════════════════════════════════════════
//  Value
// ═══════════════════════════════════════════════════════════════

pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => json!(b),
        Value::Int8(i) => json!(i),
        Value::Int16(i) => json!(i),
        Value::Int32(i) => json!(i),
        Value::Int64(i) => json!(i),
        Value::Float32(f) => float_to_json(f64::from(*f)),
        Value::Float64(f) => float_to_json(*f),
        Value::String(s) => json!(s),
        Value::Bytes(b) => json!(base64::engine::general_purpose::STANDARD.encode(b)),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Map(entries) => {
            if entries.iter().all(|(k, _)| k.as_str().is_some()) {
                let map = entries
                    .iter()
                    .filter_map(|(k, v)| Some((k.as_str()?.to_string(), value_to_json(v))))
                    .collect();
                serde_json::Value::Object(map)
            } else {
                serde_json::Value::Array(
                    entries
                        .iter()
                        .map(|(k, v)| json!([value_to_json(k), value_to_json(v)]))
                        .collect(),
                )
            }
        }
        Value::Struct(s) => {
            let map = s
                .schema()
                .fields()
                .iter()
                .zip(s.values())
                .map(|(field, v)| (field.name().to_string(), value_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

fn float_to_json(f: f64) -> serde_json::Value {
    Number::from_f64(f).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

/// Decode JSON into a `Value`, following `schema` when one is given.
pub fn value_from_json(
    json: &serde_json::Value,
    schema: Option<&SchemaRef>,
) -> Result<Value, TransformError> {
    match schema {
        Some(schema) => typed_value(json, schema),
        None => Ok(schemaless_value(json)),
    }
}

fn schemaless_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int64(i),
            None => Value::Float64(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::Array(items.iter().map(schemaless_value).collect()),
        serde_json::Value::Object(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (Value::String(k.clone()), schemaless_value(v)))
                .collect(),
        ),
    }
}

fn typed_value(json: &serde_json::Value, schema: &SchemaRef) -> Result<Value, TransformError> {
    let mismatch = || {
        TransformError::format(format!("cannot read {json} as {}", schema.schema_type()))
    };

    if json.is_null() {
        if let Some(default) = schema.default_value() {
            return Ok(default.clone());
        }
        if schema.is_optional() {
            return Ok(Value::Null);
        }
        return Err(TransformError::format(format!(
            "null for required {} value",
            schema.schema_type()
        )));
    }

    let int = || json.as_i64().ok_or_else(mismatch);
    let value = match schema.schema_type() {
        SchemaType::Int8 => Value::Int8(i8::try_from(int()?).map_err(|_| mismatch())?),
        SchemaType::Int16 => Value::Int16(i16::try_from(int()?).map_err(|_| mismatch())?),
        SchemaType::Int32 => Value::Int32(i32::try_from(int()?).map_err(|_| mismatch())?),
        SchemaType::Int64 => Value::Int64(int()?),
        SchemaType::Float32 => Value::Float32(json.as_f64().ok_or_else(mismatch)? as f32),
        SchemaType::Float64 => Value::Float64(json.as_f64().ok_or_else(mismatch)?),
        SchemaType::Boolean => Value::Boolean(json.as_bool().ok_or_else(mismatch)?),
        SchemaType::String => Value::String(json.as_str().ok_or_else(mismatch)?.to_string()),
        SchemaType::Bytes => {
            let text = json.as_str().ok_or_else(mismatch)?;
            Value::Bytes(base64::engine::general_purpose::STANDARD.decode(text)?)
        }
        SchemaType::Array => {
            let element = schema.value_schema().ok_or_else(mismatch)?;
            let items = json.as_array().ok_or_else(mismatch)?;
            Value::Array(
                items
                    .iter()
                    .map(|item| typed_value(item, element))
                    .collect::<Result<_, _>>()?,
            )
        }
        SchemaType::Map => {
            let key_schema = schema.key_schema().ok_or_else(mismatch)?;
            let value_schema = schema.value_schema().ok_or_else(mismatch)?;
            let entries = match json {
                serde_json::Value::Object(map) => map
                    .iter()
                    .map(|(k, v)| {
                        Ok((
                            typed_value(&json!(k), key_schema)?,
                            typed_value(v, value_schema)?,
                        ))
                    })
                    .collect::<Result<Vec<_>, TransformError>>()?,
                serde_json::Value::Array(pairs) => pairs
                    .iter()
                    .map(|pair| match pair.as_array().map(Vec::as_slice) {
                        Some([k, v]) => Ok((
                            typed_value(k, key_schema)?,
                            typed_value(v, value_schema)?,
                        )),
                        _ => Err(mismatch()),
                    })
                    .collect::<Result<Vec<_>, TransformError>>()?,
                _ => return Err(mismatch()),
            };
            Value::Map(entries)
        }
        SchemaType::Struct => {
            let obj = json.as_object().ok_or_else(mismatch)?;
            let mut s = Struct::new(schema.clone());
            for field in schema.fields() {
                let raw = obj.get(field.name()).unwrap_or(&serde_json::Value::Null);
                let value = typed_value(raw, field.schema())
                    .map_err(|e| e.with_context(field.name()))?;
                s.put_field(field, value)?;
            }
            Value::Struct(s)
        }
    };
    Ok(value)
}

// ═══════════════════════════════════════════════════════════════
//  Record
// ═══════════════════════════════════════════════════════════════

#[derive(Deserialize)]
struct RecordLine {
    topic: String,
    #[serde(default)]
    partition: Option<i32>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    headers: Map<String, serde_json::Value>,
    #[serde(default)]
    key_schema: Option<serde_json::Value>,
    #[serde(default)]
    key: serde_json::Value,
    #[serde(default)]
    value_schema: Option<serde_json::Value>,
    #[serde(default)]
    value: serde_json::Value,
}

/// Parse one record line.
pub fn record_from_json(line: &str) -> Result<Record, TransformError> {
    let raw: RecordLine = serde_json::from_str(line)?;

    let key_schema = raw.key_schema.as_ref().map(schema_from_json).transpose()?;
    let key = value_from_json(&raw.key, key_schema.as_ref()).map_err(|e| e.with_context("key"))?;
    let value_schema = raw.value_schema.as_ref().map(schema_from_json).transpose()?;
    let value =
        value_from_json(&raw.value, value_schema.as_ref()).map_err(|e| e.with_context("value"))?;
    let headers = raw
        .headers
        .iter()
        .map(|(k, v)| Header { key: k.clone(), value: schemaless_value(v) })
        .collect();

    Ok(Record::new(
        raw.topic,
        raw.partition,
        key_schema,
        key,
        value_schema,
        value,
        raw.timestamp,
    )
    .with_headers(headers))
}

pub fn record_to_json(record: &Record) -> serde_json::Value {
    let mut obj = Map::new();
    obj.insert("topic".into(), json!(record.topic()));
    if let Some(partition) = record.partition() {
        obj.insert("partition".into(), json!(partition));
    }
    if let Some(timestamp) = record.timestamp() {
        obj.insert("timestamp".into(), json!(timestamp));
    }
    if !record.headers().is_empty() {
        let headers = record
            .headers()
            .iter()
            .map(|h| (h.key.clone(), value_to_json(&h.value)))
            .collect();
        obj.insert("headers".into(), serde_json::Value::Object(headers));
    }
    if let Some(schema) = record.key_schema() {
        obj.insert("key_schema".into(), schema_to_json(schema));
    }
    obj.insert("key".into(), value_to_json(record.key()));
    if let Some(schema) = record.value_schema() {
        obj.insert("value_schema".into(), schema_to_json(schema));
    }
    obj.insert("value".into(), value_to_json(record.value()));
    serde_json::Value::Object(obj)
}
