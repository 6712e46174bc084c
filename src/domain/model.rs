use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label -> count. Ordered so that flattened columns come out sorted.
pub type Breakdown = BTreeMap<String, u64>;

pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub views: u64,
    pub unique_viewers: Option<u64>,
    pub minutes_watched: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub duration_seconds: Option<u64>,
    /// Raw upload timestamp as reported by the API.
    pub upload_date: Option<String>,
    pub owner: Option<String>,
    pub playback_url: Option<String>,
    pub last_viewed: Option<String>,
    pub when_published: Option<String>,
    pub tags: Vec<String>,
    pub total_views: u64,
    pub likes: u64,
    pub dislikes: u64,
    pub daily_stats: Vec<DailyStat>,
    pub browser_breakdown: Breakdown,
    pub device_breakdown: Breakdown,
}

impl VideoRecord {
    pub fn upload_day(&self) -> Option<NaiveDate> {
        self.upload_date.as_deref().and_then(parse_day)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendeeSession {
    pub attendee_id: Option<String>,
    /// Raw zone / location string; grouped into a coarse zone later.
    pub location: Option<String>,
    pub browser: Option<String>,
    pub device: Option<String>,
    pub viewing_seconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebcastEvent {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub event_url: Option<String>,
    /// Explicit reference to the recording (`vodId` in the exports).
    pub linked_video_id: Option<String>,
    pub attendee_count: Option<u64>,
    pub attendee_total: u64,
    pub total_viewing_seconds: u64,
    pub attendee_sessions: Vec<AttendeeSession>,
    pub category: String,
    pub subcategory: String,
    pub zone_breakdown: Breakdown,
    pub browser_breakdown: Breakdown,
    pub device_breakdown: Breakdown,
}

impl WebcastEvent {
    pub fn start_day(&self) -> Option<NaiveDate> {
        self.start_date.as_deref().and_then(parse_day)
    }

    /// Text fed to the categorizer.
    pub fn categorization_text(&self) -> String {
        match self.description.as_deref() {
            Some(description) if !description.trim().is_empty() => {
                format!("{} {}", self.title, description)
            }
            _ => self.title.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Fuzzy,
    None,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::Fuzzy => "fuzzy",
            MatchKind::None => "none",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "exact" => MatchKind::Exact,
            "fuzzy" => MatchKind::Fuzzy,
            _ => MatchKind::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub webcast: WebcastEvent,
    pub video: Option<VideoRecord>,
    pub match_kind: MatchKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Zone,
    WebcastBrowser,
    WebcastDevice,
    VideoBrowser,
    VideoDevice,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Zone,
        Dimension::WebcastBrowser,
        Dimension::WebcastDevice,
        Dimension::VideoBrowser,
        Dimension::VideoDevice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Zone => "zone",
            Dimension::WebcastBrowser => "webcast_browser",
            Dimension::WebcastDevice => "webcast_device",
            Dimension::VideoBrowser => "video_browser",
            Dimension::VideoDevice => "video_device",
        }
    }

    pub fn metric_name(&self) -> &'static str {
        match self {
            Dimension::Zone | Dimension::WebcastBrowser | Dimension::WebcastDevice => "attendeeTotal",
            Dimension::VideoBrowser | Dimension::VideoDevice => "v_views",
        }
    }

    pub fn breakdown<'a>(&self, record: &'a MergedRecord) -> Option<&'a Breakdown> {
        match self {
            Dimension::Zone => Some(&record.webcast.zone_breakdown),
            Dimension::WebcastBrowser => Some(&record.webcast.browser_breakdown),
            Dimension::WebcastDevice => Some(&record.webcast.device_breakdown),
            Dimension::VideoBrowser => record.video.as_ref().map(|v| &v.browser_breakdown),
            Dimension::VideoDevice => record.video.as_ref().map(|v| &v.device_breakdown),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimensionEntry {
    pub dimension: Dimension,
    pub value: String,
    pub metric: u64,
}

/// One long-format row. `entry` is `None` only for the single placeholder row of a
/// record without any populated breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub id: String,
    pub title: String,
    pub vod_id: Option<String>,
    pub event_url: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub total_viewing_time: u64,
    pub category: String,
    pub subcategory: String,
    pub match_kind: MatchKind,
    pub v_duration: Option<u64>,
    pub v_last_viewed: Option<String>,
    pub v_when_published: Option<String>,
    pub entry: Option<DimensionEntry>,
}

/// In-memory CSV: a header row plus string cells, `None` being an empty cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Clone)]
pub struct SideOutput {
    pub file_name: String,
    pub contents: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub table: Table,
    pub side_outputs: Vec<SideOutput>,
}

impl TransformResult {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            side_outputs: Vec::new(),
        }
    }
}

/// Anything a pipeline extracts, so the engine can report how much it got.
pub trait Batch {
    fn record_count(&self) -> usize;
}

impl<T> Batch for Vec<T> {
    fn record_count(&self) -> usize {
        self.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MergeInput {
    pub webcasts: Vec<WebcastEvent>,
    pub videos: Vec<VideoRecord>,
}

impl Batch for MergeInput {
    fn record_count(&self) -> usize {
        self.webcasts.len() + self.videos.len()
    }
}

/// Accepts `2024-09-15`, `2024-09-15T14:00:00Z` and similar ISO-ish timestamps.
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let day = trimmed.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 9, 15);
        assert_eq!(parse_day("2024-09-15"), expected);
        assert_eq!(parse_day("2024-09-15T14:30:00.000Z"), expected);
        assert_eq!(parse_day(" 2024-09-15 08:00:00 "), expected);
        assert_eq!(parse_day("15/09/2024"), None);
        assert_eq!(parse_day(""), None);
    }

    #[test]
    fn test_categorization_text_includes_description() {
        let mut event = WebcastEvent {
            title: "Quarterly Results".to_string(),
            ..Default::default()
        };
        assert_eq!(event.categorization_text(), "Quarterly Results");

        event.description = Some("CFO briefing".to_string());
        assert_eq!(event.categorization_text(), "Quarterly Results CFO briefing");
    }

    #[test]
    fn test_video_dimensions_absent_without_match() {
        let record = MergedRecord {
            webcast: WebcastEvent::default(),
            video: None,
            match_kind: MatchKind::None,
        };
        assert!(Dimension::Zone.breakdown(&record).is_some());
        assert!(Dimension::VideoBrowser.breakdown(&record).is_none());
        assert_eq!(Dimension::VideoDevice.metric_name(), "v_views");
    }
}
