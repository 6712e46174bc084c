use crate::core::Pipeline;
use crate::domain::model::Batch;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Runs extract, transform and load once. Returns where the output was written.
    pub async fn run(&self) -> Result<String> {
        let stage = self.pipeline.name();
        tracing::info!(stage, monitored = self.monitor.is_enabled(), "starting stage");
        self.monitor.log_stats("start");

        let raw_data = self.pipeline.extract().await?;
        tracing::info!(stage, records = raw_data.record_count(), "extracted");
        self.monitor.log_stats("extract");

        let transformed = self.pipeline.transform(raw_data).await?;
        tracing::info!(
            stage,
            rows = transformed.table.rows.len(),
            side_outputs = transformed.side_outputs.len(),
            "transformed"
        );
        self.monitor.log_stats("transform");

        let output_path = self.pipeline.load(transformed).await?;
        tracing::info!(stage, output = %output_path, "loaded");
        self.monitor.log_stats("load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Table, TransformResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recording {
        loaded: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl Pipeline for Recording {
        type Extracted = Vec<u32>;

        fn name(&self) -> &'static str {
            "recording"
        }

        async fn extract(&self) -> Result<Vec<u32>> {
            Ok(vec![1, 2, 3])
        }

        async fn transform(&self, data: Vec<u32>) -> Result<TransformResult> {
            Ok(TransformResult::new(Table {
                headers: vec!["n".to_string()],
                rows: data.iter().map(|n| vec![Some(n.to_string())]).collect(),
            }))
        }

        async fn load(&self, result: TransformResult) -> Result<String> {
            self.loaded.lock().unwrap().push(result.table.rows.len());
            Ok("memory://out.csv".to_string())
        }
    }

    #[tokio::test]
    async fn test_run_passes_data_through_all_phases() {
        let engine = EtlEngine::new(Recording {
            loaded: Mutex::new(Vec::new()),
        });

        let location = engine.run().await.unwrap();

        assert_eq!(location, "memory://out.csv");
        assert_eq!(*engine.pipeline().loaded.lock().unwrap(), vec![3]);
    }
}
