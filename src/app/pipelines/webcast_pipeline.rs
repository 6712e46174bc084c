use crate::api::models::{parse_duration_seconds, PostEventReport, ScheduledEventDto};
use crate::api::VbrickClient;
use crate::app::pipelines::{api_timestamp, OutputTarget};
use crate::config::toml_config::{EtlConfig, WebcastsConfig};
use crate::core::categorizer::{Categorizer, CategorizerConfig};
use crate::core::columns::webcast_table;
use crate::core::{Pipeline, Storage, TransformResult};
use crate::domain::mapping::Mappings;
use crate::domain::model::{AttendeeSession, Breakdown, SideOutput, WebcastEvent, UNCATEGORIZED};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

pub const WEBCAST_DUMP_FILE: &str = "webcast_metadata_categorized.json";

#[derive(Debug, Clone, Serialize)]
pub struct FetchedWebcast {
    pub event: ScheduledEventDto,
    pub report: PostEventReport,
}

pub struct WebcastPipeline<S: Storage> {
    output: OutputTarget<S>,
    client: Arc<VbrickClient>,
    webcasts: WebcastsConfig,
    categorizer: CategorizerConfig,
    mappings: Mappings,
    webcast_file: String,
}

impl<S: Storage> WebcastPipeline<S> {
    pub fn new(output: OutputTarget<S>, client: Arc<VbrickClient>, config: &EtlConfig) -> Self {
        Self {
            output,
            client,
            webcasts: config.webcasts.clone(),
            categorizer: config.categorizer.clone(),
            mappings: config.mappings.clone(),
            webcast_file: config.output.webcast_file.clone(),
        }
    }

    fn window_start(&self) -> String {
        match &self.webcasts.start_date {
            Some(start) => start.clone(),
            None => api_timestamp(Utc::now() - Duration::days(self.webcasts.lookback_days)),
        }
    }
}

#[async_trait]
impl<S: Storage> Pipeline for WebcastPipeline<S> {
    type Extracted = Vec<FetchedWebcast>;

    fn name(&self) -> &'static str {
        "webcasts"
    }

    async fn extract(&self) -> Result<Vec<FetchedWebcast>> {
        let after = self.window_start();
        let before = api_timestamp(Utc::now());
        let events = self.client.scheduled_events(&after, &before).await?;
        tracing::info!(events = events.len(), after = %after, "fetched scheduled events");

        let mut fetched = Vec::with_capacity(events.len());
        for (i, event) in events.into_iter().enumerate() {
            if i > 0 {
                self.client.pause().await;
            }
            let report = self
                .client
                .post_event_report(&event.id, self.webcasts.max_report_pages)
                .await?;
            fetched.push(FetchedWebcast { event, report });
        }
        Ok(fetched)
    }

    async fn transform(&self, data: Vec<FetchedWebcast>) -> Result<TransformResult> {
        if data.is_empty() {
            tracing::warn!("no webcasts in the requested window");
        }

        let mut events: Vec<WebcastEvent> = data
            .iter()
            .map(|webcast| to_webcast_event(webcast, &self.mappings))
            .collect();
        categorize(&mut events, &self.categorizer);

        let mut result = TransformResult::new(webcast_table(&events));
        if self.webcasts.dump_json {
            let dump: Vec<serde_json::Value> = data
                .iter()
                .zip(&events)
                .map(|(fetched, event)| -> Result<serde_json::Value> {
                    let mut value = serde_json::to_value(&fetched.event)?;
                    if let Some(object) = value.as_object_mut() {
                        object.insert("category".to_string(), event.category.clone().into());
                        object.insert("subcategory".to_string(), event.subcategory.clone().into());
                    }
                    Ok(value)
                })
                .collect::<Result<_>>()?;
            result.side_outputs.push(SideOutput {
                file_name: WEBCAST_DUMP_FILE.to_string(),
                contents: serde_json::to_vec_pretty(&dump)?,
            });
        }
        Ok(result)
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        self.output.write(&self.webcast_file, result).await
    }
}

pub fn to_webcast_event(webcast: &FetchedWebcast, mappings: &Mappings) -> WebcastEvent {
    let event = &webcast.event;
    let sessions: Vec<AttendeeSession> = webcast
        .report
        .sessions
        .iter()
        .map(|session| AttendeeSession {
            attendee_id: session.user_id.clone().or_else(|| session.username.clone()),
            location: session.zone.clone(),
            browser: session.browser.clone(),
            device: session.device_type.clone(),
            viewing_seconds: session
                .viewing_time
                .as_deref()
                .and_then(parse_duration_seconds)
                .unwrap_or(0),
        })
        .collect();

    let mut zones = Breakdown::new();
    let mut browsers = Breakdown::new();
    let mut devices = Breakdown::new();
    for session in &sessions {
        *zones.entry(mappings.zone.group(session.location.as_deref())).or_insert(0) += 1;
        *browsers.entry(mappings.webcast_browser.group(session.browser.as_deref())).or_insert(0) += 1;
        *devices.entry(mappings.webcast_device.group(session.device.as_deref())).or_insert(0) += 1;
    }

    WebcastEvent {
        id: event.id.clone(),
        title: event.title.clone().unwrap_or_default(),
        description: event.description.clone(),
        start_date: event.start_date.clone(),
        end_date: event.end_date.clone(),
        event_url: event.event_url.clone(),
        linked_video_id: event.linked_video_id.clone().filter(|id| !id.trim().is_empty()),
        attendee_count: webcast.report.attendee_count,
        attendee_total: sessions.len() as u64,
        total_viewing_seconds: sessions.iter().map(|s| s.viewing_seconds).sum(),
        attendee_sessions: sessions,
        category: UNCATEGORIZED.to_string(),
        subcategory: UNCATEGORIZED.to_string(),
        zone_breakdown: zones,
        browser_breakdown: browsers,
        device_breakdown: devices,
    }
}

/// Labels every event with the category of its cluster.
pub fn categorize(events: &mut [WebcastEvent], config: &CategorizerConfig) {
    let texts: Vec<String> = events.iter().map(WebcastEvent::categorization_text).collect();
    let categorization = Categorizer::new(config.clone()).categorize(&texts);

    for (i, event) in events.iter_mut().enumerate() {
        if let Some(label) = categorization.label_for(i) {
            event.category = label.category.clone();
            event.subcategory = label.subcategory.clone();
        }
    }
    tracing::info!(
        events = events.len(),
        clusters = categorization.cluster_count(),
        "categorized webcasts"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fetched(id: &str, title: &str, sessions: serde_json::Value) -> FetchedWebcast {
        FetchedWebcast {
            event: serde_json::from_value(json!({
                "id": id,
                "title": title,
                "startDate": "2024-09-15T14:00:00Z",
                "linkedVideoId": "",
                "eventUrl": format!("https://example.com/#/events/{id}")
            }))
            .unwrap(),
            report: serde_json::from_value(json!({"attendeeCount": 4, "sessions": sessions})).unwrap(),
        }
    }

    #[test]
    fn test_sessions_are_grouped_and_timed() {
        let webcast = fetched(
            "w789",
            "Global All-Hands",
            json!([
                {"zone": "APAC CS", "browser": "Chrome", "deviceType": "PC", "viewingTime": "00:10:00"},
                {"zone": "America", "browser": "Microsoft Edge", "deviceType": "Mobile Device", "viewingTime": "01:00:00"},
                {"zone": "EMEA Cloud VDI's & Surface Device's", "browser": "Safari", "viewingTime": "garbage"},
                {"zone": null, "browser": "Chrome mobile", "deviceType": "PC"}
            ]),
        );

        let event = to_webcast_event(&webcast, &Mappings::default());

        assert_eq!(event.attendee_total, 4);
        assert_eq!(event.attendee_count, Some(4));
        assert_eq!(event.total_viewing_seconds, 4200);
        assert_eq!(event.linked_video_id, None);
        assert_eq!(event.zone_breakdown.get("APAC"), Some(&1));
        assert_eq!(event.zone_breakdown.get("America"), Some(&1));
        assert_eq!(event.zone_breakdown.get("EMEA"), Some(&1));
        assert_eq!(event.zone_breakdown.get("Other"), Some(&1));
        assert_eq!(event.browser_breakdown.get("Chrome"), Some(&2));
        assert_eq!(event.browser_breakdown.get("Edge"), Some(&1));
        assert_eq!(event.device_breakdown.get("PC"), Some(&2));
        assert_eq!(event.device_breakdown.get("Mobile"), Some(&1));
        assert_eq!(event.device_breakdown.get("Other"), Some(&1));
    }

    #[test]
    fn test_event_without_sessions_has_empty_breakdowns() {
        let event = to_webcast_event(&fetched("w1", "Quiet Event", json!([])), &Mappings::default());
        assert_eq!(event.attendee_total, 0);
        assert!(event.zone_breakdown.is_empty());
    }

    #[test]
    fn test_categorize_assigns_labels_to_every_event() {
        let mut events: Vec<WebcastEvent> = ["Markets Outlook", "Markets Outlook Q&A", "Cyber Training"]
            .iter()
            .enumerate()
            .map(|(i, title)| WebcastEvent {
                id: format!("w{i}"),
                title: title.to_string(),
                ..Default::default()
            })
            .collect();

        categorize(&mut events, &CategorizerConfig::default());

        assert!(events.iter().all(|e| !e.category.is_empty()));
        assert_eq!(events[0].category, events[1].category);
    }
}
