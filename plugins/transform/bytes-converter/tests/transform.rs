use std::collections::HashMap;

use byteconv_api::cache::CacheStats;
use byteconv_api::config::ConfigValues;
use byteconv_api::error::ErrorKind;
use byteconv_api::record::{Header, Record};
use byteconv_api::schema::{OPTIONAL_BYTES_SCHEMA, SchemaBuilder, SchemaRef, SchemaType};
use byteconv_api::transform::Transformation;
use byteconv_api::value::{Struct, Value};
use byteconv_transform_bytes::{BytesConverter, SCHEMA_CACHE_CAPACITY};

const HI_IBM285: [u8; 2] = [0x88, 0x89];

fn configure(mut converter: BytesConverter, pairs: &[(&str, &str)]) -> BytesConverter {
    let props: HashMap<String, String> =
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    let values = ConfigValues::from_props(&props, &converter.config_params()).unwrap();
    converter.configure(&values).unwrap();
    converter
}

fn value_converter(field: &str) -> BytesConverter {
    configure(BytesConverter::value(), &[("field.name", field)])
}

fn row_schema(name: &str) -> SchemaRef {
    SchemaBuilder::struct_type()
        .name(name)
        .field("id", SchemaBuilder::int32().build())
        .unwrap()
        .field("name", SchemaBuilder::string().build())
        .unwrap()
        .build()
}

fn row(schema: &SchemaRef, id: i32, name: &str) -> Value {
    let mut s = Struct::new(schema.clone());
    s.put("id", Value::Int32(id)).unwrap();
    s.put("name", name).unwrap();
    Value::Struct(s)
}

fn typed_record(schema: &SchemaRef, id: i32, name: &str) -> Record {
    Record::new(
        "postgres2-mytable2",
        Some(3),
        None,
        Value::from("k"),
        Some(schema.clone()),
        row(schema, id, name),
        Some(1_700_000_000_000),
    )
    .with_headers(vec![Header { key: "trace".into(), value: Value::from("abc") }])
}

#[test]
fn test_schemaless_mapping() {
    let converter = value_converter("name");
    let record = Record::schemaless("t", Value::map_from([("name", Value::from("hi"))]));

    let out = converter.apply(record).unwrap();

    assert!(out.value_schema().is_none());
    assert_eq!(out.value(), &Value::map_from([("name", Value::Bytes(HI_IBM285.to_vec()))]));
}

#[test]
fn test_schemaless_preserves_other_entries_and_metadata() {
    let converter = value_converter("name");
    let value = Value::map_from([
        ("id", Value::Int64(7)),
        ("name", Value::from("hi")),
        ("nested", Value::map_from([("name", Value::from("deep"))])),
    ]);
    let record = Record::new("t", Some(1), None, Value::from("k"), None, value, Some(42));

    let out = converter.apply(record).unwrap();

    assert_eq!(out.topic(), "t");
    assert_eq!(out.partition(), Some(1));
    assert_eq!(out.timestamp(), Some(42));
    assert_eq!(out.key(), &Value::from("k"));
    assert_eq!(out.value().map_get("id"), Some(&Value::Int64(7)));
    assert_eq!(
        out.value().map_get("nested"),
        Some(&Value::map_from([("name", Value::from("deep"))]))
    );
    assert_eq!(out.value().map_get("name"), Some(&Value::Bytes(HI_IBM285.to_vec())));
}

#[test]
fn test_schemaless_missing_field_passes_through() {
    let converter = value_converter("name");
    let value = Value::map_from([("other", Value::from("hi"))]);
    let out = converter.apply(Record::schemaless("t", value.clone())).unwrap();
    assert_eq!(out.value(), &value);
}

#[test]
fn test_typed_record_schema_and_value() {
    let converter = value_converter("name");
    let schema = row_schema("mytable");

    let out = converter.apply(typed_record(&schema, 1, "hi")).unwrap();

    let out_schema = out.value_schema().unwrap();
    assert_eq!(out_schema.name(), Some("mytable"));
    let fields: Vec<_> = out_schema
        .fields()
        .iter()
        .map(|f| (f.name(), f.schema().schema_type(), f.schema().is_optional()))
        .collect();
    assert_eq!(
        fields,
        [("id", SchemaType::Int32, false), ("name", SchemaType::Bytes, true)]
    );

    let value = out.value().as_struct().unwrap();
    assert_eq!(value.schema(), out_schema);
    assert_eq!(value.get("id"), Some(&Value::Int32(1)));
    assert_eq!(value.get("name"), Some(&Value::Bytes(HI_IBM285.to_vec())));

    assert_eq!(out.topic(), "postgres2-mytable2");
    assert_eq!(out.partition(), Some(3));
    assert_eq!(out.timestamp(), Some(1_700_000_000_000));
    assert_eq!(out.key(), &Value::from("k"));
    assert_eq!(out.headers().len(), 1);
}

#[test]
fn test_second_record_hits_cache() {
    let converter = value_converter("name");
    let schema = row_schema("mytable");

    let first = converter.apply(typed_record(&schema, 1, "hi")).unwrap();
    assert_eq!(
        converter.cache_stats(),
        Some(CacheStats { hits: 0, misses: 1, evictions: 0 })
    );

    // A structurally equal schema built separately shares the cache entry.
    let rebuilt = row_schema("mytable");
    let second = converter.apply(typed_record(&rebuilt, 2, "there")).unwrap();
    assert_eq!(
        converter.cache_stats(),
        Some(CacheStats { hits: 1, misses: 1, evictions: 0 })
    );
    assert!(std::sync::Arc::ptr_eq(
        first.value_schema().unwrap(),
        second.value_schema().unwrap()
    ));
}

#[test]
fn test_missing_field_in_schema() {
    let converter = value_converter("absent");
    let schema = row_schema("mytable");

    let out = converter.apply(typed_record(&schema, 1, "hi")).unwrap();

    assert_eq!(out.value_schema().unwrap(), &schema);
    let value = out.value().as_struct().unwrap();
    assert_eq!(value.get("name"), Some(&Value::from("hi")));
}

#[test]
fn test_nested_struct_copied_unchanged() {
    let address = SchemaBuilder::struct_type()
        .name("address")
        .field("city", SchemaBuilder::string().build())
        .unwrap()
        .build();
    let schema = SchemaBuilder::struct_type()
        .field("name", SchemaBuilder::string().build())
        .unwrap()
        .field("address", address.clone())
        .unwrap()
        .field("tags", SchemaBuilder::array(SchemaBuilder::string().build()).optional().build())
        .unwrap()
        .build();

    let mut addr = Struct::new(address);
    addr.put("city", "London").unwrap();
    let mut value = Struct::new(schema.clone());
    value.put("name", "hi").unwrap();
    value.put("address", addr.clone()).unwrap();
    value.put("tags", Value::Array(vec![Value::from("a")])).unwrap();
    let record = Record::new("t", None, None, Value::Null, Some(schema), value.into(), None);

    let out = value_converter("name").apply(record).unwrap();

    let out_value = out.value().as_struct().unwrap();
    assert_eq!(out_value.get("address"), Some(&Value::Struct(addr)));
    assert_eq!(out_value.get("tags"), Some(&Value::Array(vec![Value::from("a")])));
    assert_eq!(
        out.value_schema().unwrap().field("name").unwrap().schema(),
        &*OPTIONAL_BYTES_SCHEMA
    );
}

#[test]
fn test_unsupported_target_encoding() {
    let converter = configure(
        BytesConverter::value(),
        &[("field.name", "name"), ("target.charset", "NOT-A-CHARSET")],
    );
    let record = Record::schemaless("t", Value::map_from([("name", Value::from("hi"))]));

    let err = converter.apply(record).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedEncoding);
    assert!(err.message().contains("name"));
    assert!(err.message().contains("ISO-8859-1"));
    assert!(err.message().contains("NOT-A-CHARSET"));
}

#[test]
fn test_unsupported_encoding_on_typed_path() {
    let converter = configure(
        BytesConverter::value(),
        &[("field.name", "name"), ("source.charset", "bogus")],
    );
    let schema = row_schema("mytable");
    let err = converter.apply(typed_record(&schema, 1, "hi")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedEncoding);
    assert!(err.message().contains("bogus"));
}

#[test]
fn test_fail_on_unmappable_character() {
    let converter = configure(
        BytesConverter::value(),
        &[("field.name", "name"), ("unmappable.action", "fail")],
    );
    let record = Record::schemaless("t", Value::map_from([("name", Value::from("€"))]));
    let err = converter.apply(record).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Encoding);
    assert!(err.message().contains("field 'name'"));
}

#[test]
fn test_replacement_byte_for_unmappable() {
    let converter = value_converter("name");
    let record = Record::schemaless("t", Value::map_from([("name", Value::from("£5 €x é"))]));
    let out = converter.apply(record).unwrap();
    assert_eq!(
        out.value().map_get("name"),
        Some(&Value::Bytes(vec![0x5B, 0xF5, 0x40, 0x3F, 0xA7, 0x40, 0x51]))
    );
}

#[test]
fn test_key_variant_leaves_value_alone() {
    let converter = configure(
        BytesConverter::key(),
        &[("field.name", "id"), ("target.charset", "IBM037")],
    );
    let key_schema = SchemaBuilder::struct_type()
        .field("id", SchemaBuilder::string().build())
        .unwrap()
        .build();
    let mut key = Struct::new(key_schema.clone());
    key.put("id", "id-42 Ünïcode").unwrap();
    let value_schema = row_schema("mytable");
    let value = row(&value_schema, 9, "hi");
    let headers = vec![Header { key: "h".into(), value: Value::Int32(1) }];
    let record = Record::new(
        "t",
        Some(0),
        Some(key_schema),
        key.into(),
        Some(value_schema.clone()),
        value.clone(),
        Some(5),
    )
    .with_headers(headers.clone());

    let out = converter.apply(record).unwrap();

    assert_eq!(out.value_schema(), Some(&value_schema));
    assert_eq!(out.value(), &value);
    assert_eq!(out.headers(), headers.as_slice());
    assert_eq!(out.partition(), Some(0));
    assert_eq!(out.timestamp(), Some(5));
    assert_eq!(
        out.key().as_struct().unwrap().get("id"),
        Some(&Value::Bytes(vec![
            0x89, 0x84, 0x60, 0xF4, 0xF2, 0x40, 0xFC, 0x95, 0x57, 0x83, 0x96, 0x84, 0x85
        ]))
    );
    assert_eq!(
        out.key_schema().unwrap().field("id").unwrap().schema(),
        &*OPTIONAL_BYTES_SCHEMA
    );
}

#[test]
fn test_cache_bounded_by_capacity() {
    let converter = value_converter("name");
    for i in 0..40 {
        let schema = row_schema(&format!("table{i}"));
        converter.apply(typed_record(&schema, i, "hi")).unwrap();
        assert!(converter.cache_size().unwrap() <= SCHEMA_CACHE_CAPACITY);
    }
    let stats = converter.cache_stats().unwrap();
    assert_eq!(stats.misses, 40);
    assert_eq!(stats.evictions, 40 - SCHEMA_CACHE_CAPACITY as u64);
}

#[test]
fn test_concurrent_apply_shares_mutated_schema() {
    let converter = value_converter("name");
    let schemas: Vec<_> = (0..4).map(|i| row_schema(&format!("table{i}"))).collect();

    let outputs: Vec<Vec<Record>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let converter = &converter;
                let schemas = &schemas;
                s.spawn(move || {
                    (0..200)
                        .map(|i| {
                            let schema = &schemas[(t + i) % schemas.len()];
                            converter.apply(typed_record(schema, i as i32, "hi")).unwrap()
                        })
                        .collect::<Vec<Record>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for out in outputs.iter().flatten() {
        let schema = out.value_schema().unwrap();
        assert_eq!(schema.field("name").unwrap().schema(), &*OPTIONAL_BYTES_SCHEMA);
        assert_eq!(
            out.value().as_struct().unwrap().get("name"),
            Some(&Value::Bytes(HI_IBM285.to_vec()))
        );
    }
    assert_eq!(converter.cache_size(), Some(4));
}

#[test]
fn test_trace_dump_does_not_change_output() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
    let converter = value_converter("name");
    let record = Record::schemaless("t", Value::map_from([("name", Value::from("hi 😀"))]));
    let out = converter.apply(record).unwrap();
    assert_eq!(
        out.value().map_get("name"),
        Some(&Value::Bytes(vec![0x88, 0x89, 0x40, 0x3F]))
    );
}
