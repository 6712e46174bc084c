use crate::domain::model::{Dimension, DimensionEntry, MergedRecord, NormalizedRow};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLayout {
    /// `dimensionType` / `dimensionValue` / `metricName` / `metricValue`.
    #[default]
    Long,
    /// One column per axis plus `attendeeTotal` and `v_views`.
    Axis,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub layout: OutputLayout,
}

/// Union of breakdown labels per dimension across a batch. Iterating these instead of
/// each record's own map keeps row order identical between records.
#[derive(Debug, Default)]
pub struct DimensionKeys {
    keys: BTreeMap<Dimension, BTreeSet<String>>,
}

impl DimensionKeys {
    pub fn collect(records: &[MergedRecord]) -> Self {
        let mut keys: BTreeMap<Dimension, BTreeSet<String>> = BTreeMap::new();
        for record in records {
            for dimension in Dimension::ALL {
                if let Some(breakdown) = dimension.breakdown(record) {
                    keys.entry(dimension)
                        .or_default()
                        .extend(breakdown.keys().cloned());
                }
            }
        }
        Self { keys }
    }

    pub fn labels(&self, dimension: Dimension) -> impl Iterator<Item = &String> {
        self.keys.get(&dimension).into_iter().flatten()
    }
}

pub fn normalize_batch(records: &[MergedRecord]) -> Vec<NormalizedRow> {
    let keys = DimensionKeys::collect(records);
    let rows: Vec<NormalizedRow> = records
        .iter()
        .flat_map(|record| normalize_record(record, &keys))
        .collect();

    tracing::info!(records = records.len(), rows = rows.len(), "normalized merged records");
    rows
}

pub fn normalize_record(record: &MergedRecord, keys: &DimensionKeys) -> Vec<NormalizedRow> {
    let mut rows = Vec::new();
    for dimension in Dimension::ALL {
        let Some(breakdown) = dimension.breakdown(record) else {
            continue;
        };
        for label in keys.labels(dimension) {
            if let Some(&metric) = breakdown.get(label) {
                rows.push(base_row(
                    record,
                    Some(DimensionEntry {
                        dimension,
                        value: label.clone(),
                        metric,
                    }),
                ));
            }
        }
    }

    if rows.is_empty() {
        rows.push(base_row(record, None));
    }
    rows
}

fn base_row(record: &MergedRecord, entry: Option<DimensionEntry>) -> NormalizedRow {
    let webcast = &record.webcast;
    let video = record.video.as_ref();
    NormalizedRow {
        id: webcast.id.clone(),
        title: webcast.title.clone(),
        vod_id: webcast.linked_video_id.clone(),
        event_url: webcast.event_url.clone(),
        start_date: webcast.start_date.clone(),
        end_date: webcast.end_date.clone(),
        total_viewing_time: webcast.total_viewing_seconds,
        category: webcast.category.clone(),
        subcategory: webcast.subcategory.clone(),
        match_kind: record.match_kind,
        v_duration: video.and_then(|v| v.duration_seconds),
        v_last_viewed: video.and_then(|v| v.last_viewed.clone()),
        v_when_published: video.and_then(|v| v.when_published.clone()),
        entry,
    }
}
