//! Column layouts of the four CSV files, and the conversions between them and the
//! typed records.

use crate::core::normalizer::OutputLayout;
use crate::core::table::{cell, text_cell, RowView, TableReader};
use crate::domain::model::{
    Breakdown, MatchKind, MergedRecord, NormalizedRow, Table, VideoRecord, WebcastEvent,
};
use std::collections::{BTreeSet, HashMap};

pub const BROWSER_PREFIX: &str = "browser_";
pub const DEVICE_PREFIX: &str = "device_";
pub const ZONE_PREFIX: &str = "zone_";
pub const VIDEO_PREFIX: &str = "v_";

/// Webcast device prefix used by older exports.
const LEGACY_DEVICE_PREFIX: &str = "deviceType_";

/// Older video exports carry unprefixed group columns. Each maps to the group label
/// the current grouping tables produce.
const LEGACY_VIDEO_BROWSERS: [(&str, &str); 3] = [
    ("Chrome", "Chrome"),
    ("Microsoft Edge", "Edge"),
    ("Other Browser", "Other"),
];
const LEGACY_VIDEO_DEVICES: [(&str, &str); 3] = [
    ("Desktop", "Desktop"),
    ("Mobile", "Mobile"),
    ("Other Device", "Other"),
];

const VIDEO_COLUMNS: [&str; 13] = [
    "video_id",
    "title",
    "description",
    "playbackUrl",
    "duration",
    "whenUploaded",
    "lastViewed",
    "whenPublished",
    "uploadedBy",
    "tags",
    "views",
    "likes",
    "dislikes",
];

const DAILY_COLUMNS: [&str; 6] = [
    "video_id",
    "title",
    "date",
    "views",
    "uniqueViewers",
    "minutesWatched",
];

const WEBCAST_COLUMNS: [&str; 11] = [
    "id",
    "title",
    "vodId",
    "eventUrl",
    "attendeeCount",
    "attendeeTotal",
    "startDate",
    "endDate",
    "total_viewingTime",
    "category",
    "subcategory",
];

const MATCH_COLUMN: &str = "matchType";

/// Video scalar columns carried into the merged file, without the `v_` prefix.
const MERGED_VIDEO_COLUMNS: [&str; 9] = [
    "video_id",
    "title",
    "duration",
    "whenUploaded",
    "lastViewed",
    "whenPublished",
    "views",
    "likes",
    "dislikes",
];

const NORMALIZED_PASSTHROUGH: [&str; 13] = [
    "id",
    "title",
    "vodId",
    "eventUrl",
    "startDate",
    "endDate",
    "total_viewingTime",
    "category",
    "subcategory",
    MATCH_COLUMN,
    "v_duration",
    "v_lastViewed",
    "v_whenPublished",
];

const LONG_COLUMNS: [&str; 4] = ["dimensionType", "dimensionValue", "metricName", "metricValue"];

const AXIS_COLUMNS: [&str; 7] = [
    "zone",
    "webcast_browser",
    "webcast_device",
    "video_browser",
    "video_device",
    "attendeeTotal",
    "v_views",
];

fn headers(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}

fn union_keys<'a, I>(breakdowns: I) -> Vec<String>
where
    I: Iterator<Item = &'a Breakdown>,
{
    let keys: BTreeSet<&String> = breakdowns.flat_map(|b| b.keys()).collect();
    keys.into_iter().cloned().collect()
}

fn breakdown_cells(breakdown: Option<&Breakdown>, keys: &[String]) -> Vec<Option<String>> {
    keys.iter()
        .map(|key| cell(breakdown.and_then(|b| b.get(key))))
        .collect()
}

fn prefixed(prefix: &str, keys: &[String]) -> Vec<String> {
    keys.iter().map(|key| format!("{prefix}{key}")).collect()
}

// ---- video file -------------------------------------------------------------

fn video_scalars(video: &VideoRecord) -> Vec<Option<String>> {
    vec![
        text_cell(&video.id),
        text_cell(&video.title),
        video.description.clone(),
        video.playback_url.clone(),
        cell(video.duration_seconds),
        video.upload_date.clone(),
        video.last_viewed.clone(),
        video.when_published.clone(),
        video.owner.clone(),
        tags_cell(&video.tags),
        Some(video.total_views.to_string()),
        Some(video.likes.to_string()),
        Some(video.dislikes.to_string()),
    ]
}

/// Tags are written as a JSON array so a tag may itself contain a comma.
fn tags_cell(tags: &[String]) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    serde_json::to_string(tags).ok()
}

/// Reads a JSON tag array, or the comma-separated list of older exports.
fn tags_from_cell(cell: &str) -> Vec<String> {
    if let Ok(tags) = serde_json::from_str::<Vec<String>>(cell) {
        return tags;
    }
    cell.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn video_table(videos: &[VideoRecord]) -> Table {
    let browsers = union_keys(videos.iter().map(|v| &v.browser_breakdown));
    let devices = union_keys(videos.iter().map(|v| &v.device_breakdown));

    let mut header = headers(&VIDEO_COLUMNS);
    header.extend(prefixed(BROWSER_PREFIX, &browsers));
    header.extend(prefixed(DEVICE_PREFIX, &devices));

    let rows = videos
        .iter()
        .map(|video| {
            let mut row = video_scalars(video);
            row.extend(breakdown_cells(Some(&video.browser_breakdown), &browsers));
            row.extend(breakdown_cells(Some(&video.device_breakdown), &devices));
            row
        })
        .collect();

    Table { headers: header, rows }
}

pub fn daily_table(videos: &[VideoRecord]) -> Table {
    let rows = videos
        .iter()
        .flat_map(|video| {
            video.daily_stats.iter().map(move |day| {
                vec![
                    text_cell(&video.id),
                    text_cell(&video.title),
                    Some(day.date.format("%Y-%m-%d").to_string()),
                    Some(day.views.to_string()),
                    cell(day.unique_viewers),
                    cell(day.minutes_watched),
                ]
            })
        })
        .collect();

    Table {
        headers: headers(&DAILY_COLUMNS),
        rows,
    }
}

fn video_from_row(row: &RowView<'_>, prefix: &str) -> VideoRecord {
    let column = |name: &str| format!("{prefix}{name}");
    VideoRecord {
        id: row.text(&column("video_id")),
        title: row.text(&column("title")),
        description: row.owned(&column("description")),
        duration_seconds: row.count(&column("duration")),
        upload_date: row.owned(&column("whenUploaded")),
        owner: row.owned(&column("uploadedBy")),
        playback_url: row.owned(&column("playbackUrl")),
        last_viewed: row.owned(&column("lastViewed")),
        when_published: row.owned(&column("whenPublished")),
        tags: row.get(&column("tags")).map(tags_from_cell).unwrap_or_default(),
        total_views: row.count(&column("views")).unwrap_or(0),
        likes: row.count(&column("likes")).unwrap_or(0),
        dislikes: row.count(&column("dislikes")).unwrap_or(0),
        daily_stats: Vec::new(),
        browser_breakdown: breakdown_or_legacy(row, prefix, BROWSER_PREFIX, &LEGACY_VIDEO_BROWSERS),
        device_breakdown: breakdown_or_legacy(row, prefix, DEVICE_PREFIX, &LEGACY_VIDEO_DEVICES),
    }
}

/// Reads `<prefix><group_prefix><label>` columns, or the unprefixed group columns of
/// older exports when the file has none of the current ones.
fn breakdown_or_legacy(
    row: &RowView<'_>,
    prefix: &str,
    group_prefix: &str,
    legacy: &[(&str, &str)],
) -> Breakdown {
    let current = format!("{prefix}{group_prefix}");
    if row.has_prefixed_column(&current) {
        return row.breakdown(&current);
    }

    let mut breakdown = Breakdown::new();
    for (column, label) in legacy {
        if let Some(count) = row.count(&format!("{prefix}{column}")) {
            *breakdown.entry(label.to_string()).or_insert(0) += count;
        }
    }
    breakdown
}

fn webcast_devices(row: &RowView<'_>) -> Breakdown {
    let mut devices = row.breakdown(DEVICE_PREFIX);
    for (label, count) in row.breakdown(LEGACY_DEVICE_PREFIX) {
        *devices.entry(label).or_insert(0) += count;
    }
    devices
}

/// Reads the video file. A file in the per-day layout (one row per video and `date`)
/// is folded into one record per video: views summed, everything else from the first row.
pub fn videos_from_table(table: &Table) -> Vec<VideoRecord> {
    let reader = TableReader::new(table);
    let daily_layout = reader.has_column("date");

    let mut videos: Vec<VideoRecord> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for row in reader.rows() {
        let video = video_from_row(&row, "");
        if video.id.is_empty() {
            tracing::warn!(title = %video.title, "skipping video row without video_id");
            continue;
        }

        match positions.get(&video.id) {
            Some(&position) if daily_layout => {
                videos[position].total_views += video.total_views;
            }
            Some(_) => {
                tracing::warn!(video_id = %video.id, "duplicate video row ignored");
            }
            None => {
                positions.insert(video.id.clone(), videos.len());
                videos.push(video);
            }
        }
    }

    videos
}

// ---- webcast file -----------------------------------------------------------

fn webcast_scalars(event: &WebcastEvent) -> Vec<Option<String>> {
    vec![
        text_cell(&event.id),
        text_cell(&event.title),
        event.linked_video_id.clone(),
        event.event_url.clone(),
        cell(event.attendee_count),
        Some(event.attendee_total.to_string()),
        event.start_date.clone(),
        event.end_date.clone(),
        Some(event.total_viewing_seconds.to_string()),
        text_cell(&event.category),
        text_cell(&event.subcategory),
    ]
}

struct WebcastKeys {
    browsers: Vec<String>,
    devices: Vec<String>,
    zones: Vec<String>,
}

impl WebcastKeys {
    fn collect<'a, I>(events: I) -> Self
    where
        I: Iterator<Item = &'a WebcastEvent> + Clone,
    {
        Self {
            browsers: union_keys(events.clone().map(|e| &e.browser_breakdown)),
            devices: union_keys(events.clone().map(|e| &e.device_breakdown)),
            zones: union_keys(events.map(|e| &e.zone_breakdown)),
        }
    }

    fn headers(&self) -> Vec<String> {
        let mut header = prefixed(BROWSER_PREFIX, &self.browsers);
        header.extend(prefixed(DEVICE_PREFIX, &self.devices));
        header.extend(prefixed(ZONE_PREFIX, &self.zones));
        header
    }

    fn cells(&self, event: &WebcastEvent) -> Vec<Option<String>> {
        let mut row = breakdown_cells(Some(&event.browser_breakdown), &self.browsers);
        row.extend(breakdown_cells(Some(&event.device_breakdown), &self.devices));
        row.extend(breakdown_cells(Some(&event.zone_breakdown), &self.zones));
        row
    }
}

pub fn webcast_table(events: &[WebcastEvent]) -> Table {
    let keys = WebcastKeys::collect(events.iter());

    let mut header = headers(&WEBCAST_COLUMNS);
    header.extend(keys.headers());

    let rows = events
        .iter()
        .map(|event| {
            let mut row = webcast_scalars(event);
            row.extend(keys.cells(event));
            row
        })
        .collect();

    Table { headers: header, rows }
}

fn webcast_from_row(row: &RowView<'_>) -> WebcastEvent {
    WebcastEvent {
        id: row.text("id"),
        title: row.text("title"),
        description: None,
        start_date: row.owned("startDate"),
        end_date: row.owned("endDate"),
        event_url: row.owned("eventUrl"),
        linked_video_id: row.owned("vodId"),
        attendee_count: row.count("attendeeCount"),
        attendee_total: row.count("attendeeTotal").unwrap_or(0),
        total_viewing_seconds: row.count("total_viewingTime").unwrap_or(0),
        attendee_sessions: Vec::new(),
        category: row.text("category"),
        subcategory: row.text("subcategory"),
        zone_breakdown: row.breakdown(ZONE_PREFIX),
        browser_breakdown: row.breakdown(BROWSER_PREFIX),
        device_breakdown: webcast_devices(row),
    }
}

pub fn webcasts_from_table(table: &Table) -> Vec<WebcastEvent> {
    let reader = TableReader::new(table);
    reader
        .rows()
        .map(|row| webcast_from_row(&row))
        .filter(|event| {
            if event.id.is_empty() {
                tracing::warn!(title = %event.title, "skipping webcast row without id");
            }
            !event.id.is_empty()
        })
        .collect()
}

// ---- merged file ------------------------------------------------------------

pub fn merged_table(records: &[MergedRecord]) -> Table {
    let keys = WebcastKeys::collect(records.iter().map(|r| &r.webcast));
    let videos = records.iter().filter_map(|r| r.video.as_ref());
    let video_browsers = union_keys(videos.clone().map(|v| &v.browser_breakdown));
    let video_devices = union_keys(videos.map(|v| &v.device_breakdown));

    let mut header = headers(&WEBCAST_COLUMNS);
    header.push(MATCH_COLUMN.to_string());
    header.extend(keys.headers());
    header.extend(
        MERGED_VIDEO_COLUMNS
            .iter()
            .map(|c| format!("{VIDEO_PREFIX}{c}")),
    );
    header.extend(prefixed(&format!("{VIDEO_PREFIX}{BROWSER_PREFIX}"), &video_browsers));
    header.extend(prefixed(&format!("{VIDEO_PREFIX}{DEVICE_PREFIX}"), &video_devices));

    let rows = records
        .iter()
        .map(|record| {
            let mut row = webcast_scalars(&record.webcast);
            row.push(Some(record.match_kind.as_str().to_string()));
            row.extend(keys.cells(&record.webcast));

            match &record.video {
                Some(video) => {
                    row.extend([
                        text_cell(&video.id),
                        text_cell(&video.title),
                        cell(video.duration_seconds),
                        video.upload_date.clone(),
                        video.last_viewed.clone(),
                        video.when_published.clone(),
                        Some(video.total_views.to_string()),
                        Some(video.likes.to_string()),
                        Some(video.dislikes.to_string()),
                    ]);
                }
                None => row.extend(std::iter::repeat(None).take(MERGED_VIDEO_COLUMNS.len())),
            }

            let video = record.video.as_ref();
            row.extend(breakdown_cells(video.map(|v| &v.browser_breakdown), &video_browsers));
            row.extend(breakdown_cells(video.map(|v| &v.device_breakdown), &video_devices));
            row
        })
        .collect();

    Table { headers: header, rows }
}

pub fn merged_from_table(table: &Table) -> Vec<MergedRecord> {
    let reader = TableReader::new(table);
    let video_id_column = format!("{VIDEO_PREFIX}video_id");

    reader
        .rows()
        .filter_map(|row| {
            let webcast = webcast_from_row(&row);
            if webcast.id.is_empty() {
                tracing::warn!(title = %webcast.title, "skipping merged row without id");
                return None;
            }

            // Older merged exports drop `v_video_id`; their video columns sit next to `vodId`.
            let video = match row.get(&video_id_column) {
                Some(_) => Some(video_from_row(&row, VIDEO_PREFIX)),
                None if row.get(&format!("{VIDEO_PREFIX}views")).is_some() => {
                    let mut video = video_from_row(&row, VIDEO_PREFIX);
                    video.id = webcast.linked_video_id.clone().unwrap_or_default();
                    Some(video)
                }
                None => None,
            };
            let match_kind = match row.get(MATCH_COLUMN) {
                Some(value) => MatchKind::parse(value),
                None if video.is_some() => MatchKind::Exact,
                None => MatchKind::None,
            };

            Some(MergedRecord {
                webcast,
                video,
                match_kind,
            })
        })
        .collect()
}

// ---- normalized file --------------------------------------------------------

fn passthrough_cells(row: &NormalizedRow) -> Vec<Option<String>> {
    vec![
        text_cell(&row.id),
        text_cell(&row.title),
        row.vod_id.clone(),
        row.event_url.clone(),
        row.start_date.clone(),
        row.end_date.clone(),
        Some(row.total_viewing_time.to_string()),
        text_cell(&row.category),
        text_cell(&row.subcategory),
        Some(row.match_kind.as_str().to_string()),
        cell(row.v_duration),
        row.v_last_viewed.clone(),
        row.v_when_published.clone(),
    ]
}

pub fn normalized_table(rows: &[NormalizedRow], layout: OutputLayout) -> Table {
    let mut header = headers(&NORMALIZED_PASSTHROUGH);
    match layout {
        OutputLayout::Long => header.extend(headers(&LONG_COLUMNS)),
        OutputLayout::Axis => header.extend(headers(&AXIS_COLUMNS)),
    }

    let rows = rows
        .iter()
        .map(|row| {
            let mut cells = passthrough_cells(row);
            match layout {
                OutputLayout::Long => match &row.entry {
                    Some(entry) => cells.extend([
                        Some(entry.dimension.as_str().to_string()),
                        text_cell(&entry.value),
                        Some(entry.dimension.metric_name().to_string()),
                        Some(entry.metric.to_string()),
                    ]),
                    None => cells.extend(std::iter::repeat(None).take(LONG_COLUMNS.len())),
                },
                OutputLayout::Axis => {
                    let mut axis: Vec<Option<String>> = vec![None; AXIS_COLUMNS.len()];
                    if let Some(entry) = &row.entry {
                        let dimension_slot = AXIS_COLUMNS
                            .iter()
                            .position(|c| *c == entry.dimension.as_str());
                        let metric_slot = AXIS_COLUMNS
                            .iter()
                            .position(|c| *c == entry.dimension.metric_name());
                        if let (Some(d), Some(m)) = (dimension_slot, metric_slot) {
                            axis[d] = text_cell(&entry.value);
                            axis[m] = Some(entry.metric.to_string());
                        }
                    }
                    cells.extend(axis);
                }
            }
            cells
        })
        .collect();

    Table { headers: header, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::{decode_csv, encode_csv};
    use crate::domain::model::{DailyStat, Dimension, DimensionEntry};
    use chrono::NaiveDate;

    fn breakdown(pairs: &[(&str, u64)]) -> Breakdown {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn sample_video() -> VideoRecord {
        VideoRecord {
            id: "v123".to_string(),
            title: "Product Demo".to_string(),
            duration_seconds: Some(1800),
            upload_date: Some("2024-09-14T10:00:00Z".to_string()),
            tags: vec!["demo".to_string(), "product".to_string()],
            total_views: 175,
            daily_stats: vec![DailyStat {
                date: NaiveDate::from_ymd_opt(2024, 9, 14).unwrap(),
                views: 175,
                unique_viewers: Some(120),
                minutes_watched: None,
            }],
            browser_breakdown: breakdown(&[("Chrome", 100), ("Edge", 50), ("Other", 25)]),
            device_breakdown: breakdown(&[("Desktop", 150), ("Mobile", 25)]),
            ..Default::default()
        }
    }

    #[test]
    fn test_video_table_flattens_breakdowns() {
        let table = video_table(&[sample_video()]);

        assert!(table.headers.contains(&"browser_Chrome".to_string()));
        assert!(table.headers.contains(&"device_Desktop".to_string()));
        assert_eq!(table.rows.len(), 1);

        let parsed = videos_from_table(&decode_csv(&encode_csv(&table).unwrap()).unwrap());
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].browser_breakdown.get("Edge"), Some(&50));
        assert_eq!(parsed[0].tags, vec!["demo", "product"]);
        assert_eq!(parsed[0].total_views, 175);
    }

    #[test]
    fn test_daily_layout_is_aggregated_per_video() {
        let csv = "video_id,title,whenUploaded,date,views,browser_Chrome\n\
                   v1,Demo,2024-09-14,2024-09-14,10,4\n\
                   v1,Demo,2024-09-14,2024-09-15,5,4\n\
                   v2,Other,2024-09-01,2024-09-02,1,\n";
        let videos = videos_from_table(&decode_csv(csv.as_bytes()).unwrap());

        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].id, "v1");
        assert_eq!(videos[0].total_views, 15);
        assert_eq!(videos[0].browser_breakdown.get("Chrome"), Some(&4));
        assert!(videos[1].browser_breakdown.is_empty());
    }

    #[test]
    fn test_tags_with_commas_survive_the_video_file() {
        let mut video = sample_video();
        video.tags = vec!["Q3, 2024".to_string(), "town hall".to_string()];

        let table = video_table(&[video]);
        let parsed = videos_from_table(&decode_csv(&encode_csv(&table).unwrap()).unwrap());
        assert_eq!(parsed[0].tags, vec!["Q3, 2024", "town hall"]);

        let older = "video_id,title,tags\nv1,Demo,\"demo, product\"\n";
        let parsed = videos_from_table(&decode_csv(older.as_bytes()).unwrap());
        assert_eq!(parsed[0].tags, vec!["demo", "product"]);
    }

    #[test]
    fn test_unprefixed_video_group_columns_are_read() {
        let csv = "video_id,title,date,views,Desktop,Mobile,Other Device,Chrome,Microsoft Edge,Other Browser\n\
                   v1,Demo,2024-09-14,10,7,3,,6,4,0\n";
        let videos = videos_from_table(&decode_csv(csv.as_bytes()).unwrap());

        assert_eq!(videos[0].device_breakdown, breakdown(&[("Desktop", 7), ("Mobile", 3)]));
        assert_eq!(
            videos[0].browser_breakdown,
            breakdown(&[("Chrome", 6), ("Edge", 4), ("Other", 0)])
        );
    }

    #[test]
    fn test_older_webcast_and_merged_columns_are_read() {
        let csv = "id,title,vodId,deviceType_PC,deviceType_Mobile Device,zone_APAC,v_views,v_Desktop,v_Chrome\n\
                   w1,Town Hall,v9,5,2,7,40,30,25\n\
                   w2,Lunch,,1,,1,,,\n";
        let records = merged_from_table(&decode_csv(csv.as_bytes()).unwrap());

        assert_eq!(
            records[0].webcast.device_breakdown,
            breakdown(&[("Mobile Device", 2), ("PC", 5)])
        );
        let video = records[0].video.as_ref().unwrap();
        assert_eq!(video.id, "v9");
        assert_eq!(video.total_views, 40);
        assert_eq!(video.device_breakdown, breakdown(&[("Desktop", 30)]));
        assert_eq!(video.browser_breakdown, breakdown(&[("Chrome", 25)]));
        assert_eq!(records[0].match_kind, MatchKind::Exact);
        assert!(records[1].video.is_none());
        assert_eq!(records[1].match_kind, MatchKind::None);
    }

    #[test]
    fn test_daily_table_one_row_per_day() {
        let table = daily_table(&[sample_video()]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][2].as_deref(), Some("2024-09-14"));
        assert_eq!(table.rows[0][4].as_deref(), Some("120"));
        assert_eq!(table.rows[0][5], None);
    }

    #[test]
    fn test_unmatched_merged_row_has_empty_video_cells() {
        let record = MergedRecord {
            webcast: WebcastEvent {
                id: "w789".to_string(),
                title: "Global All-Hands".to_string(),
                zone_breakdown: breakdown(&[("APAC", 300)]),
                ..Default::default()
            },
            video: None,
            match_kind: MatchKind::None,
        };
        let matched = MergedRecord {
            webcast: WebcastEvent {
                id: "w1".to_string(),
                ..Default::default()
            },
            video: Some(sample_video()),
            match_kind: MatchKind::Fuzzy,
        };

        let table = merged_table(&[record, matched]);
        let first = &table.rows[0];
        for (header, value) in table.headers.iter().zip(first) {
            if header.starts_with(VIDEO_PREFIX) {
                assert_eq!(value, &None, "{header} should be empty");
            }
        }

        let parsed = merged_from_table(&table);
        assert!(parsed[0].video.is_none());
        assert_eq!(parsed[0].match_kind, MatchKind::None);
        assert_eq!(parsed[1].match_kind, MatchKind::Fuzzy);
        let video = parsed[1].video.as_ref().unwrap();
        assert_eq!(video.id, "v123");
        assert_eq!(video.device_breakdown.get("Mobile"), Some(&25));
    }

    #[test]
    fn test_axis_layout_sets_one_dimension() {
        let row = NormalizedRow {
            id: "w1".to_string(),
            title: "Town Hall".to_string(),
            vod_id: None,
            event_url: None,
            start_date: None,
            end_date: None,
            total_viewing_time: 0,
            category: String::new(),
            subcategory: String::new(),
            match_kind: MatchKind::None,
            v_duration: None,
            v_last_viewed: None,
            v_when_published: None,
            entry: Some(DimensionEntry {
                dimension: Dimension::VideoBrowser,
                value: "Chrome".to_string(),
                metric: 100,
            }),
        };
        let table = normalized_table(&[row], OutputLayout::Axis);
        let reader = TableReader::new(&table);
        let view = reader.rows().next().unwrap();

        assert_eq!(view.get("video_browser"), Some("Chrome"));
        assert_eq!(view.get("v_views"), Some("100"));
        assert_eq!(view.get("zone"), None);
        assert_eq!(view.get("attendeeTotal"), None);
    }
}
