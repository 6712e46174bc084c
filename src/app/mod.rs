pub mod pipelines;

use crate::api::VbrickClient;
use crate::config::cli::LocalStorage;
use crate::config::toml_config::EtlConfig;
use crate::core::etl::EtlEngine;
use crate::utils::error::Result;
use pipelines::{MergePipeline, NormalizePipeline, OutputTarget, VideoPipeline, WebcastPipeline};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Videos,
    Webcasts,
    Merge,
    Normalize,
}

impl Stage {
    /// Run order for a full batch. Merge reads what the two collectors wrote.
    pub const ALL: [Stage; 4] = [Stage::Videos, Stage::Webcasts, Stage::Merge, Stage::Normalize];

    /// Whether the stage talks to the API.
    pub fn fetches(&self) -> bool {
        matches!(self, Stage::Videos | Stage::Webcasts)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Videos => "videos",
            Stage::Webcasts => "webcasts",
            Stage::Merge => "merge",
            Stage::Normalize => "normalize",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn output_target(config: &EtlConfig) -> OutputTarget<LocalStorage> {
    let publish = config
        .output
        .publish_dir
        .as_ref()
        .filter(|dir| !dir.trim().is_empty())
        .map(|dir| LocalStorage::new(dir.clone()));
    OutputTarget::new(LocalStorage::new(config.output.directory.clone())).with_publish(publish)
}

fn shared_client(
    slot: &mut Option<Arc<VbrickClient>>,
    config: &EtlConfig,
) -> Result<Arc<VbrickClient>> {
    if let Some(client) = slot {
        return Ok(client.clone());
    }
    let client = Arc::new(VbrickClient::new(&config.api, &config.retry)?);
    *slot = Some(client.clone());
    Ok(client)
}

/// Runs `stages` in order and stops at the first failure. Returns where each stage
/// wrote its main file. The collectors share one client, so one token.
pub async fn run_stages(
    stages: &[Stage],
    config: &EtlConfig,
    monitor: bool,
) -> Result<Vec<(Stage, String)>> {
    let mut client = None;
    let mut written = Vec::with_capacity(stages.len());

    for &stage in stages {
        let location = match stage {
            Stage::Videos => {
                let client = shared_client(&mut client, config)?;
                let pipeline = VideoPipeline::new(output_target(config), client, config);
                EtlEngine::new_with_monitoring(pipeline, monitor).run().await?
            }
            Stage::Webcasts => {
                let client = shared_client(&mut client, config)?;
                let pipeline = WebcastPipeline::new(output_target(config), client, config);
                EtlEngine::new_with_monitoring(pipeline, monitor).run().await?
            }
            Stage::Merge => {
                let pipeline = MergePipeline::new(output_target(config), config);
                EtlEngine::new_with_monitoring(pipeline, monitor).run().await?
            }
            Stage::Normalize => {
                let pipeline = NormalizePipeline::new(output_target(config), config);
                EtlEngine::new_with_monitoring(pipeline, monitor).run().await?
            }
        };
        written.push((stage, location));
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_only_collectors_fetch() {
        let fetching: Vec<Stage> = Stage::ALL.into_iter().filter(Stage::fetches).collect();
        assert_eq!(fetching, vec![Stage::Videos, Stage::Webcasts]);
    }

    #[tokio::test]
    async fn test_local_stages_need_no_credentials() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("merged_webcast_video_summary.csv"),
            "id,title,matchType,zone_APAC\nw1,Town Hall,none,3\n",
        )
        .unwrap();

        let mut config = EtlConfig::default();
        config.output.directory = dir.path().display().to_string();

        let written = run_stages(&[Stage::Normalize], &config, false).await.unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].1.ends_with("normalized_webcast_video_summary.csv"));
    }
}
