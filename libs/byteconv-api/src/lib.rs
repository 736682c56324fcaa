pub mod cache;
pub mod config;

pub use byteconv_api_derive::ConfigParams;
pub mod error;
pub mod json;
pub mod record;
pub mod schema;
pub mod transform;
pub mod value;
