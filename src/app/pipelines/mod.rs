pub mod merge_pipeline;
pub mod normalize_pipeline;
pub mod video_pipeline;
pub mod webcast_pipeline;

pub use merge_pipeline::MergePipeline;
pub use normalize_pipeline::NormalizePipeline;
pub use video_pipeline::VideoPipeline;
pub use webcast_pipeline::WebcastPipeline;

use crate::core::table::{decode_csv, encode_csv};
use crate::core::{Storage, TransformResult};
use crate::domain::model::Table;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};

/// Where a stage writes: the output directory plus an optional publish copy.
#[derive(Debug, Clone)]
pub struct OutputTarget<S: Storage> {
    pub storage: S,
    pub publish: Option<S>,
}

impl<S: Storage> OutputTarget<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            publish: None,
        }
    }

    pub fn with_publish(mut self, publish: Option<S>) -> Self {
        self.publish = publish;
        self
    }

    pub async fn read_table(&self, file_name: &str) -> Result<Table> {
        let data = self.storage.read_file(file_name).await?;
        let table = decode_csv(&data)?;
        tracing::debug!(
            file = %self.storage.location(file_name),
            rows = table.rows.len(),
            columns = table.headers.len(),
            "read input table"
        );
        Ok(table)
    }

    /// Writes the main table and any side outputs, then copies the main table to the
    /// publish directory. Returns the main table's location.
    pub async fn write(&self, file_name: &str, result: TransformResult) -> Result<String> {
        let csv = encode_csv(&result.table)?;
        self.storage.write_file(file_name, &csv).await?;
        let location = self.storage.location(file_name);
        tracing::info!(file = %location, rows = result.table.rows.len(), "wrote output");

        for side in &result.side_outputs {
            self.storage.write_file(&side.file_name, &side.contents).await?;
            tracing::info!(file = %self.storage.location(&side.file_name), "wrote side output");
        }

        if let Some(publish) = &self.publish {
            publish.write_file(file_name, &csv).await?;
            tracing::info!(file = %publish.location(file_name), "published output");
        }

        Ok(location)
    }
}

/// `2024-09-15T14:00:00.000Z`, the timestamp format the API expects in queries.
pub fn api_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::LocalStorage;
    use crate::domain::model::SideOutput;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn table() -> Table {
        Table {
            headers: vec!["id".to_string()],
            rows: vec![vec![Some("w1".to_string())]],
        }
    }

    #[tokio::test]
    async fn test_write_publishes_main_table_only() {
        let out = TempDir::new().unwrap();
        let share = TempDir::new().unwrap();
        let target = OutputTarget::new(LocalStorage::new(out.path().display().to_string()))
            .with_publish(Some(LocalStorage::new(share.path().display().to_string())));

        let mut result = TransformResult::new(table());
        result.side_outputs.push(SideOutput {
            file_name: "dump.json".to_string(),
            contents: b"[]".to_vec(),
        });
        let location = target.write("summary.csv", result).await.unwrap();

        assert!(location.ends_with("summary.csv"));
        assert_eq!(std::fs::read_to_string(out.path().join("summary.csv")).unwrap(), "id\nw1\n");
        assert!(out.path().join("dump.json").exists());
        assert_eq!(std::fs::read_to_string(share.path().join("summary.csv")).unwrap(), "id\nw1\n");
        assert!(!share.path().join("dump.json").exists());

        let back = target.read_table("summary.csv").await.unwrap();
        assert_eq!(back, table());
    }

    #[test]
    fn test_api_timestamp_format() {
        let at = Utc.with_ymd_and_hms(2025, 7, 1, 8, 30, 0).unwrap();
        assert_eq!(api_timestamp(at), "2025-07-01T08:30:00.000Z");
    }
}
