//! Field-to-bytes charset conversion for pipeline records.
//!
//! [`BytesConverter`] rewrites one named textual field of a record's key or
//! value into the bytes of that text under a target charset. Schema-typed
//! records get a mutated schema in which the field is optional bytes; mutated
//! schemas are kept in a small LRU cache keyed by the input schema.

pub mod charset;
pub mod config;
pub mod convert;
pub mod converter;
pub mod mutate;

pub use charset::{Charset, UnmappableAction};
pub use config::{BytesConverterConfig, DEFAULT_SOURCE_CHARSET, DEFAULT_TARGET_CHARSET};
pub use convert::{Hex, convert, convert_with};
pub use converter::{BytesConverter, RecordHalf, SCHEMA_CACHE_CAPACITY};
pub use mutate::derive_mutated_schema;
