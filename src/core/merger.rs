use crate::domain::model::{MatchKind, MergedRecord, VideoRecord, WebcastEvent};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Inclusive window, in days, between a video's upload date and the event start.
    pub tolerance_days: i64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self { tolerance_days: 2 }
    }
}

/// Attaches at most one recording to every webcast.
pub struct Merger {
    config: MergeConfig,
}

struct Candidate<'a> {
    video: &'a VideoRecord,
    title_key: String,
    upload_day: Option<NaiveDate>,
}

impl Merger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    pub fn merge(&self, webcasts: Vec<WebcastEvent>, videos: &[VideoRecord]) -> Vec<MergedRecord> {
        let by_id: HashMap<&str, &VideoRecord> =
            videos.iter().map(|v| (v.id.as_str(), v)).collect();
        let candidates: Vec<Candidate<'_>> = videos
            .iter()
            .map(|video| Candidate {
                video,
                title_key: normalize_title(&video.title),
                upload_day: video.upload_day(),
            })
            .collect();

        let mut exact = 0usize;
        let mut fuzzy = 0usize;
        let merged: Vec<MergedRecord> = webcasts
            .into_iter()
            .map(|webcast| {
                let (video, match_kind) = self.find_match(&webcast, &by_id, &candidates);
                match match_kind {
                    MatchKind::Exact => exact += 1,
                    MatchKind::Fuzzy => fuzzy += 1,
                    MatchKind::None => {}
                }
                MergedRecord {
                    video: video.cloned(),
                    webcast,
                    match_kind,
                }
            })
            .collect();

        tracing::info!(
            webcasts = merged.len(),
            videos = videos.len(),
            exact,
            fuzzy,
            unmatched = merged.len() - exact - fuzzy,
            "merged webcasts with recordings"
        );
        merged
    }

    fn find_match<'a>(
        &self,
        webcast: &WebcastEvent,
        by_id: &HashMap<&str, &'a VideoRecord>,
        candidates: &[Candidate<'a>],
    ) -> (Option<&'a VideoRecord>, MatchKind) {
        if let Some(linked) = webcast.linked_video_id.as_deref().map(str::trim) {
            if let Some(video) = by_id.get(linked) {
                return (Some(*video), MatchKind::Exact);
            }
            if !linked.is_empty() {
                tracing::debug!(webcast = %webcast.id, vod_id = linked, "linked recording not found");
            }
        }

        let title_key = normalize_title(&webcast.title);
        let Some(start_day) = webcast.start_day() else {
            return (None, MatchKind::None);
        };
        if title_key.is_empty() {
            return (None, MatchKind::None);
        }

        let best = candidates
            .iter()
            .filter(|c| c.title_key == title_key)
            .filter_map(|c| {
                let gap = (c.upload_day? - start_day).num_days().abs();
                (gap <= self.config.tolerance_days).then_some((gap, c.video))
            })
            .min_by(|(gap_a, a), (gap_b, b)| gap_a.cmp(gap_b).then_with(|| a.id.cmp(&b.id)));

        match best {
            Some((_, video)) => (Some(video), MatchKind::Fuzzy),
            None => (None, MatchKind::None),
        }
    }
}

/// Case-folded title with punctuation and whitespace removed.
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
