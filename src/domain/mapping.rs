use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const OTHER: &str = "Other";

/// Maps raw API labels (zone names, user agents, device types) onto a small set of groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupingTable {
    pub entries: HashMap<String, String>,
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

fn default_fallback() -> String {
    OTHER.to_string()
}

impl GroupingTable {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            entries: pairs
                .iter()
                .map(|(raw, group)| (raw.to_string(), group.to_string()))
                .collect(),
            fallback: default_fallback(),
        }
    }

    /// Missing, blank and unknown labels all fall back.
    pub fn group(&self, raw: Option<&str>) -> String {
        raw.map(str::trim)
            .filter(|label| !label.is_empty())
            .and_then(|label| self.entries.get(label))
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    pub fn default_zones() -> Self {
        Self::new(&[
            ("APAC", "APAC"),
            ("APAC CS", "APAC"),
            ("APAC Cloud VDI's & Surface Device's", "APAC"),
            ("America", "America"),
            ("America CS", "America"),
            ("America Cloud VDI's & Surface Device's", "America"),
            ("Americas", "America"),
            ("EMEA", "EMEA"),
            ("EMEA CS", "EMEA"),
            ("EMEA Cloud VDI's & Surface Device's", "EMEA"),
            ("Swiss", "Swiss"),
            ("Swiss CS", "Swiss"),
            ("Swiss Cloud VDI's & Surface Device's", "Swiss"),
        ])
    }

    pub fn default_webcast_browsers() -> Self {
        Self::new(&[
            ("Chrome", "Chrome"),
            ("Chrome mobile", "Chrome"),
            ("Chrome Mobile", "Chrome"),
            ("Microsoft Edge", "Edge"),
            ("Microsoft Edge mobile", "Edge"),
        ])
    }

    pub fn default_webcast_devices() -> Self {
        Self::new(&[("PC", "PC"), ("Mobile Device", "Mobile")])
    }

    pub fn default_video_browsers() -> Self {
        Self::new(&[
            ("Chrome", "Chrome"),
            ("Chrome Mobile", "Chrome"),
            ("Microsoft Edge", "Edge"),
            ("Microsoft Edge mobile", "Edge"),
        ])
    }

    pub fn default_video_devices() -> Self {
        Self::new(&[("PC", "Desktop"), ("Mobile Device", "Mobile")])
    }
}

/// All grouping tables used by the collectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mappings {
    #[serde(default = "GroupingTable::default_zones")]
    pub zone: GroupingTable,
    #[serde(default = "GroupingTable::default_webcast_browsers")]
    pub webcast_browser: GroupingTable,
    #[serde(default = "GroupingTable::default_webcast_devices")]
    pub webcast_device: GroupingTable,
    #[serde(default = "GroupingTable::default_video_browsers")]
    pub video_browser: GroupingTable,
    #[serde(default = "GroupingTable::default_video_devices")]
    pub video_device: GroupingTable,
}

impl Default for Mappings {
    fn default() -> Self {
        Self {
            zone: GroupingTable::default_zones(),
            webcast_browser: GroupingTable::default_webcast_browsers(),
            webcast_device: GroupingTable::default_webcast_devices(),
            video_browser: GroupingTable::default_video_browsers(),
            video_device: GroupingTable::default_video_devices(),
        }
    }
}
