use crate::app::pipelines::OutputTarget;
use crate::config::toml_config::EtlConfig;
use crate::core::columns::{merged_table, videos_from_table, webcasts_from_table};
use crate::core::merger::{MergeConfig, Merger};
use crate::core::{Pipeline, Storage, TransformResult};
use crate::domain::model::MergeInput;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Joins the webcast summary with the video summary written by the two collectors.
pub struct MergePipeline<S: Storage> {
    output: OutputTarget<S>,
    merge: MergeConfig,
    webcast_file: String,
    video_file: String,
    merged_file: String,
}

impl<S: Storage> MergePipeline<S> {
    pub fn new(output: OutputTarget<S>, config: &EtlConfig) -> Self {
        Self {
            output,
            merge: config.merge.clone(),
            webcast_file: config.output.webcast_file.clone(),
            video_file: config.output.video_file.clone(),
            merged_file: config.output.merged_file.clone(),
        }
    }
}

#[async_trait]
impl<S: Storage> Pipeline for MergePipeline<S> {
    type Extracted = MergeInput;

    fn name(&self) -> &'static str {
        "merge"
    }

    async fn extract(&self) -> Result<MergeInput> {
        let webcasts = webcasts_from_table(&self.output.read_table(&self.webcast_file).await?);
        let videos = videos_from_table(&self.output.read_table(&self.video_file).await?);
        Ok(MergeInput { webcasts, videos })
    }

    async fn transform(&self, data: MergeInput) -> Result<TransformResult> {
        let merged = Merger::new(self.merge.clone()).merge(data.webcasts, &data.videos);
        Ok(TransformResult::new(merged_table(&merged)))
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        self.output.write(&self.merged_file, result).await
    }
}
