use byteconv_api::error::TransformError;
use byteconv_api::schema::{OPTIONAL_BYTES_SCHEMA, Schema, SchemaBuilder, SchemaRef, copy_schema_basics};

/// Derive the schema of a rewritten struct: `field_name` becomes optional
/// bytes, every other field keeps its schema, order is unchanged.
///
/// A schema without `field_name` yields a structurally equal copy (minus any
/// struct-level default).
pub fn derive_mutated_schema(schema: &Schema, field_name: &str) -> Result<SchemaRef, TransformError> {
    let mut builder = copy_schema_basics(schema, SchemaBuilder::struct_type());
    if schema.is_optional() {
        builder = builder.optional();
    }

    for field in schema.fields() {
        let field_schema = if field.name() == field_name {
            OPTIONAL_BYTES_SCHEMA.clone()
        } else {
            field.schema().clone()
        };
        builder = builder.field(field.name(), field_schema)?;
    }

    let mutated = builder.build();

    if tracing::enabled!(tracing::Level::DEBUG) {
        for field in mutated.fields() {
            tracing::debug!(field = %field.name(), schema = %field.schema(), "mutated schema field");
        }
    }

    Ok(mutated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteconv_api::schema::SchemaType;

    fn input() -> SchemaRef {
        let address = SchemaBuilder::struct_type()
            .name("address")
            .field("city", SchemaBuilder::string().build())
            .unwrap()
            .build();
        SchemaBuilder::struct_type()
            .name("mytable")
            .version(3)
            .doc("rows")
            .parameter("connect.name", "mytable")
            .field("id", SchemaBuilder::int32().build())
            .unwrap()
            .field("data", SchemaBuilder::string().build())
            .unwrap()
            .field("address", address)
            .unwrap()
            .build()
    }

    #[test]
    fn test_target_becomes_optional_bytes() {
        let schema = input();
        let mutated = derive_mutated_schema(&schema, "data").unwrap();

        let names: Vec<_> = mutated.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, ["id", "data", "address"]);
        assert_eq!(mutated.field("data").unwrap().schema(), &*OPTIONAL_BYTES_SCHEMA);
        assert_eq!(mutated.field("id").unwrap().schema().schema_type(), SchemaType::Int32);
        assert_eq!(
            mutated.field("address").unwrap().schema(),
            schema.field("address").unwrap().schema()
        );
    }

    #[test]
    fn test_metadata_copied() {
        let mutated = derive_mutated_schema(&input(), "data").unwrap();
        assert_eq!(mutated.name(), Some("mytable"));
        assert_eq!(mutated.version(), Some(3));
        assert_eq!(mutated.doc(), Some("rows"));
        assert_eq!(mutated.parameters().get("connect.name").map(String::as_str), Some("mytable"));
    }

    #[test]
    fn test_missing_field_keeps_shape() {
        let schema = input();
        let mutated = derive_mutated_schema(&schema, "nope").unwrap();
        assert_eq!(&mutated, &schema);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let schema = input();
        let a = derive_mutated_schema(&schema, "data").unwrap();
        let b = derive_mutated_schema(&schema, "data").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a, schema);
    }
}
