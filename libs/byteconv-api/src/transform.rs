use crate::config::{ConfigParam, ConfigValues};
use crate::error::TransformError;
use crate::record::Record;

/// Single-message transformation, one stage of the record path.
///
/// Lifecycle:
/// 1. `configure()`: exactly once, from the controlling thread.
/// 2. `apply()`: any number of times, concurrently from pipeline workers.
/// 3. `close()`: once, after the last `apply()` has returned.
///
/// `apply()` never blocks or suspends; a failure aborts the record and is
/// surfaced to the caller as-is.
pub trait Transformation: Send + Sync {
    /// Parameter declarations used to validate the option map.
    fn config_params(&self) -> Vec<ConfigParam>;

    fn configure(&mut self, config: &ConfigValues) -> Result<(), TransformError>;

    /// Consume a record and produce its replacement.
    fn apply(&self, record: Record) -> Result<Record, TransformError>;

    /// Release resources. No `apply()` calls are valid afterwards.
    fn close(&mut self);
}
