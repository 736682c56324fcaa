//! Pipeline side of byteconv: configuration file, transform registry and
//! the transform chain that drives configure / apply / close.

pub mod chain;
pub mod config;
pub mod error;
pub mod registry;

pub use chain::TransformChain;
pub use config::{ByteconvConfig, ConfigParser, TomlParser, TransformConfig};
pub use error::EngineError;
pub use registry::TransformRegistry;
