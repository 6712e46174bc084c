use crate::domain::model::{Batch, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;

    /// Must never leave a partially written file under `path`.
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Where `path` ends up, for log and CLI output.
    fn location(&self, path: &str) -> String;
}

/// One stage of the batch: extract from the API or from earlier files, shape into a
/// table, write it out. `load` returns the location of the written file.
#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: Batch + Send;

    fn name(&self) -> &'static str;
    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
