use crate::schema::SchemaRef;
use crate::value::Value;

/// A single record header. Headers ride along untouched through transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub key: String,
    pub value: Value,
}

/// Universal pipeline record.
///
/// Key and value are independent halves, each with an optional schema.
/// A half without a schema is schemaless (usually a `Map`); a half with a
/// schema carries a `Struct` or primitive conforming to it.
/// `topic`, `partition`, `timestamp` and `headers` are pass-through metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    topic: String,
    partition: Option<i32>,
    key_schema: Option<SchemaRef>,
    key: Value,
    value_schema: Option<SchemaRef>,
    value: Value,
    timestamp: Option<i64>,
    headers: Vec<Header>,
}

impl Record {
    pub fn new(
        topic: impl Into<String>,
        partition: Option<i32>,
        key_schema: Option<SchemaRef>,
        key: Value,
        value_schema: Option<SchemaRef>,
        value: Value,
        timestamp: Option<i64>,
    ) -> Self {
        Self {
            topic: topic.into(),
            partition,
            key_schema,
            key,
            value_schema,
            value,
            timestamp,
            headers: Vec::new(),
        }
    }

    /// Schemaless record with a null key.
    pub fn schemaless(topic: impl Into<String>, value: Value) -> Self {
        Self::new(topic, None, None, Value::Null, None, value, None)
    }

    pub fn with_headers(mut self, headers: Vec<Header>) -> Self {
        self.headers = headers;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn partition(&self) -> Option<i32> {
        self.partition
    }

    pub fn key_schema(&self) -> Option<&SchemaRef> {
        self.key_schema.as_ref()
    }

    pub fn key(&self) -> &Value {
        &self.key
    }

    pub fn value_schema(&self) -> Option<&SchemaRef> {
        self.value_schema.as_ref()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Move the key half out, leaving `Null` and no schema behind.
    pub fn take_key(&mut self) -> (Option<SchemaRef>, Value) {
        (self.key_schema.take(), std::mem::replace(&mut self.key, Value::Null))
    }

    /// Move the value half out, leaving `Null` and no schema behind.
    pub fn take_value(&mut self) -> (Option<SchemaRef>, Value) {
        (
            self.value_schema.take(),
            std::mem::replace(&mut self.value, Value::Null),
        )
    }

    /// Rebuild the record with new halves. Headers are carried over.
    #[allow(clippy::too_many_arguments)]
    pub fn new_record(
        self,
        topic: impl Into<String>,
        partition: Option<i32>,
        key_schema: Option<SchemaRef>,
        key: Value,
        value_schema: Option<SchemaRef>,
        value: Value,
        timestamp: Option<i64>,
    ) -> Self {
        Self {
            topic: topic.into(),
            partition,
            key_schema,
            key,
            value_schema,
            value,
            timestamp,
            headers: self.headers,
        }
    }

    /// Replace only the key half; everything else is preserved.
    pub fn with_key(self, key_schema: Option<SchemaRef>, key: Value) -> Self {
        Self { key_schema, key, ..self }
    }

    /// Replace only the value half; everything else is preserved.
    pub fn with_value(self, value_schema: Option<SchemaRef>, value: Value) -> Self {
        Self { value_schema, value, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaBuilder;

    #[test]
    fn test_with_value_preserves_metadata() {
        let key_schema = SchemaBuilder::string().build();
        let record = Record::new(
            "orders",
            Some(3),
            Some(key_schema.clone()),
            Value::from("k1"),
            None,
            Value::from("old"),
            Some(1_700_000_000_000),
        )
        .with_headers(vec![Header { key: "trace".into(), value: Value::from("abc") }]);

        let updated = record.with_value(None, Value::Bytes(vec![1, 2]));
        assert_eq!(updated.topic(), "orders");
        assert_eq!(updated.partition(), Some(3));
        assert_eq!(updated.key_schema(), Some(&key_schema));
        assert_eq!(updated.key(), &Value::from("k1"));
        assert_eq!(updated.value(), &Value::Bytes(vec![1, 2]));
        assert_eq!(updated.timestamp(), Some(1_700_000_000_000));
        assert_eq!(updated.headers().len(), 1);
    }

    #[test]
    fn test_take_key_leaves_null() {
        let mut record = Record::new("t", None, None, Value::from("k"), None, Value::Null, None);
        let (schema, key) = record.take_key();
        assert!(schema.is_none());
        assert_eq!(key, Value::from("k"));
        assert!(record.key().is_null());
    }
}
