use crate::app::pipelines::OutputTarget;
use crate::config::toml_config::EtlConfig;
use crate::core::columns::{merged_from_table, normalized_table};
use crate::core::normalizer::{normalize_batch, NormalizeConfig};
use crate::core::{Pipeline, Storage, TransformResult};
use crate::domain::model::MergedRecord;
use crate::utils::error::Result;
use async_trait::async_trait;

pub struct NormalizePipeline<S: Storage> {
    output: OutputTarget<S>,
    normalize: NormalizeConfig,
    merged_file: String,
    normalized_file: String,
}

impl<S: Storage> NormalizePipeline<S> {
    pub fn new(output: OutputTarget<S>, config: &EtlConfig) -> Self {
        Self {
            output,
            normalize: config.normalize.clone(),
            merged_file: config.output.merged_file.clone(),
            normalized_file: config.output.normalized_file.clone(),
        }
    }
}

#[async_trait]
impl<S: Storage> Pipeline for NormalizePipeline<S> {
    type Extracted = Vec<MergedRecord>;

    fn name(&self) -> &'static str {
        "normalize"
    }

    async fn extract(&self) -> Result<Vec<MergedRecord>> {
        let table = self.output.read_table(&self.merged_file).await?;
        Ok(merged_from_table(&table))
    }

    async fn transform(&self, data: Vec<MergedRecord>) -> Result<TransformResult> {
        let rows = normalize_batch(&data);
        Ok(TransformResult::new(normalized_table(&rows, self.normalize.layout)))
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        self.output.write(&self.normalized_file, result).await
    }
}
