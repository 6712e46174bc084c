use crate::api::models::{duration_seconds, KeyCount, SummaryStatistics, VideoDto};
use crate::api::VbrickClient;
use crate::app::pipelines::{api_timestamp, OutputTarget};
use crate::config::toml_config::{EtlConfig, VideosConfig};
use crate::core::columns::{daily_table, video_table};
use crate::core::{Pipeline, Storage, TransformResult};
use crate::domain::mapping::{GroupingTable, Mappings};
use crate::domain::model::{parse_day, Breakdown, DailyStat, SideOutput, VideoRecord};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

pub const VIDEO_DUMP_FILE: &str = "video_summary.json";

/// A video as the API returned it, plus its summary statistics.
#[derive(Debug, Clone, Serialize)]
pub struct FetchedVideo {
    pub metadata: VideoDto,
    pub statistics: SummaryStatistics,
}

pub struct VideoPipeline<S: Storage> {
    output: OutputTarget<S>,
    client: Arc<VbrickClient>,
    videos: VideosConfig,
    mappings: Mappings,
    video_file: String,
    daily_file: String,
}

impl<S: Storage> VideoPipeline<S> {
    pub fn new(output: OutputTarget<S>, client: Arc<VbrickClient>, config: &EtlConfig) -> Self {
        Self {
            output,
            client,
            videos: config.videos.clone(),
            mappings: config.mappings.clone(),
            video_file: config.output.video_file.clone(),
            daily_file: config.output.daily_file.clone(),
        }
    }
}

#[async_trait]
impl<S: Storage> Pipeline for VideoPipeline<S> {
    type Extracted = Vec<FetchedVideo>;

    fn name(&self) -> &'static str {
        "videos"
    }

    async fn extract(&self) -> Result<Vec<FetchedVideo>> {
        let now = Utc::now();
        let from_upload = api_timestamp(now - Duration::days(self.videos.lookback_days));
        let before = now.format("%Y-%m-%d").to_string();
        let stats_floor = self
            .videos
            .analytics_lookback_days
            .map(|days| (now - Duration::days(days)).format("%Y-%m-%d").to_string());

        let listed = self
            .client
            .search_all_videos(&from_upload, self.videos.page_size)
            .await?;

        let mut fetched = Vec::with_capacity(listed.len());
        for (i, video) in listed.into_iter().enumerate() {
            if i > 0 {
                self.client.pause().await;
            }
            let after = stats_floor
                .clone()
                .or_else(|| video.when_uploaded.as_deref().and_then(|d| d.get(..10)).map(str::to_string))
                .unwrap_or_else(|| from_upload[..10].to_string());

            tracing::debug!(video = %video.id, after = %after, "fetching summary statistics");
            let statistics = self.client.video_summary(&video.id, &after, &before).await?;
            fetched.push(FetchedVideo {
                metadata: video,
                statistics,
            });
        }

        Ok(fetched)
    }

    async fn transform(&self, data: Vec<FetchedVideo>) -> Result<TransformResult> {
        let records: Vec<VideoRecord> = data
            .iter()
            .map(|video| to_video_record(video, &self.mappings))
            .collect();

        let mut result = TransformResult::new(video_table(&records));
        if self.videos.write_daily {
            let daily = daily_table(&records);
            result.side_outputs.push(SideOutput {
                file_name: self.daily_file.clone(),
                contents: crate::core::table::encode_csv(&daily)?,
            });
        }
        if self.videos.dump_json {
            result.side_outputs.push(SideOutput {
                file_name: VIDEO_DUMP_FILE.to_string(),
                contents: serde_json::to_vec_pretty(&data)?,
            });
        }
        Ok(result)
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        self.output.write(&self.video_file, result).await
    }
}

pub fn to_video_record(video: &FetchedVideo, mappings: &Mappings) -> VideoRecord {
    let meta = &video.metadata;
    let stats = &video.statistics;

    let daily_stats: Vec<DailyStat> = stats
        .total_views_by_day
        .iter()
        .filter_map(|day| {
            let raw = day.key.as_deref()?;
            match parse_day(raw) {
                Some(date) => Some(DailyStat {
                    date,
                    views: day.value.unwrap_or(0),
                    unique_viewers: None,
                    minutes_watched: None,
                }),
                None => {
                    tracing::warn!(video = %meta.id, key = raw, "skipping daily row with unreadable date");
                    None
                }
            }
        })
        .collect();
    let daily_total: u64 = daily_stats.iter().map(|d| d.views).sum();

    VideoRecord {
        id: meta.id.clone(),
        title: meta.title.clone().unwrap_or_default(),
        description: meta.description.clone(),
        duration_seconds: meta.duration.as_ref().and_then(duration_seconds),
        upload_date: meta.when_uploaded.clone(),
        owner: meta.uploaded_by.clone(),
        playback_url: meta.playback_url.clone(),
        last_viewed: meta.last_viewed.clone(),
        when_published: meta.when_published.clone(),
        tags: meta.tags.clone(),
        total_views: meta.total_views.or(stats.total_views).unwrap_or(daily_total),
        likes: meta.likes.unwrap_or(0),
        dislikes: meta.dislikes.unwrap_or(0),
        daily_stats,
        browser_breakdown: group_counts(&stats.browser_counts, &mappings.video_browser),
        device_breakdown: group_counts(&stats.device_counts, &mappings.video_device),
    }
}

fn group_counts(counts: &[KeyCount], table: &GroupingTable) -> Breakdown {
    let mut grouped = Breakdown::new();
    for count in counts {
        *grouped.entry(table.group(count.key.as_deref())).or_insert(0) += count.value.unwrap_or(0);
    }
    grouped
}
