use byteconv_api::record::Record;
use byteconv_api::transform::Transformation;

use crate::config::ByteconvConfig;
use crate::error::EngineError;
use crate::registry::TransformRegistry;

struct Stage {
    name: String,
    transform: Box<dyn Transformation>,
}

/// Configured transforms, applied in file order.
///
/// `apply` may be called from many threads at once; `close` (or drop)
/// happens once no `apply` is in flight.
pub struct TransformChain {
    stages: Vec<Stage>,
}

impl std::fmt::Debug for TransformChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformChain")
            .field("stages", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl TransformChain {
    /// Build and configure every transform listed in `config`.
    pub fn bootstrap(
        config: &ByteconvConfig,
        registry: &TransformRegistry,
    ) -> Result<Self, EngineError> {
        let mut stages = Vec::with_capacity(config.transforms.len());
        for transform_cfg in &config.transforms {
            let ctx = format!("transform '{}'", transform_cfg.name);
            let transform = registry
                .build(transform_cfg)
                .map_err(|e| e.with_context(&ctx))?;

            tracing::info!(
                transform = %transform_cfg.name,
                transform_type = %transform_cfg.transform_type,
                "configured transform"
            );
            stages.push(Stage {
                name: transform_cfg.name.clone(),
                transform,
            });
        }
        Ok(Self { stages })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run `record` through every stage. The first failure aborts it.
    pub fn apply(&self, record: Record) -> Result<Record, EngineError> {
        self.stages.iter().try_fold(record, |record, stage| {
            stage
                .transform
                .apply(record)
                .map_err(|e| EngineError::from(e).with_context(format!("transform '{}'", stage.name)))
        })
    }

    /// Apply the chain to each record in order. Fails fast on the first
    /// record that fails.
    pub fn apply_batch(&self, records: Vec<Record>) -> Result<Vec<Record>, EngineError> {
        records
            .into_iter()
            .enumerate()
            .map(|(i, record)| self.apply(record).map_err(|e| e.with_context(format!("record {i}"))))
            .collect()
    }

    /// Close every stage, last first. Safe to call more than once.
    pub fn close(&mut self) {
        while let Some(mut stage) = self.stages.pop() {
            stage.transform.close();
            tracing::debug!(transform = %stage.name, "closed transform");
        }
    }
}

impl Drop for TransformChain {
    fn drop(&mut self) {
        self.close();
    }
}
