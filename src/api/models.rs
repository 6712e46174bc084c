//! Wire types for the Vbrick REST API. Every field the pipeline does not strictly need
//! is optional; conversion into domain records happens in the collector pipelines.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest<'a> {
    pub api_key: &'a str,
    pub api_secret: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSearchPage {
    #[serde(default)]
    pub videos: Vec<VideoDto>,
    #[serde(default)]
    pub scroll_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_videos: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDto {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Usually `HH:MM:SS`, occasionally plain seconds.
    #[serde(default)]
    pub duration: Option<Value>,
    #[serde(default)]
    pub when_uploaded: Option<String>,
    #[serde(default)]
    pub last_viewed: Option<String>,
    #[serde(default)]
    pub when_published: Option<String>,
    #[serde(default)]
    pub uploaded_by: Option<String>,
    #[serde(default)]
    pub playback_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_views: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub likes: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub dislikes: Option<u64>,
    /// Everything else, kept for the raw JSON dumps.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyCount {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub value: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStatistics {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_views: Option<u64>,
    #[serde(default)]
    pub total_views_by_day: Vec<KeyCount>,
    #[serde(default)]
    pub device_counts: Vec<KeyCount>,
    #[serde(default)]
    pub browser_counts: Vec<KeyCount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEventDto {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub event_url: Option<String>,
    #[serde(default)]
    pub linked_video_id: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostEventReport {
    #[serde(default)]
    pub sessions: Vec<SessionDto>,
    #[serde(default)]
    pub scroll_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub attendee_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub viewing_time: Option<String>,
}

/// Numbers arrive as JSON numbers, numeric strings, or `null`.
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_u64))
}

fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    })
}

pub fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<u64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.round() as u64)
            })
        }
        _ => None,
    }
}

/// `HH:MM:SS` (hours may exceed 24), `MM:SS`, or plain seconds.
pub fn parse_duration_seconds(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() > 3 {
        return None;
    }

    let mut total = 0u64;
    for part in &parts {
        // Fractional seconds are dropped.
        let whole = part.split('.').next().unwrap_or(part);
        let value: u64 = whole.trim().parse().ok()?;
        total = total.checked_mul(60)?.checked_add(value)?;
    }
    Some(total)
}

pub fn duration_seconds(value: &Value) -> Option<u64> {
    match value {
        Value::String(s) => parse_duration_seconds(s),
        other => value_as_u64(other),
    }
}
