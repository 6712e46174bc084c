use crate::api::auth::TokenManager;
use crate::api::models::{PostEventReport, ScheduledEventDto, SummaryStatistics, VideoDto, VideoSearchPage};
use crate::api::retry::{FailureClass, RetryConfig, RetryDecision, RetryPolicy};
use crate::utils::error::{EtlError, Result};
use reqwest::{Client, Proxy};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub proxy_url: Option<String>,
    pub timeout_secs: u64,
    /// Pause between paginated requests.
    pub request_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            proxy_url: None,
            timeout_secs: 20,
            request_delay_ms: 100,
        }
    }
}

/// Sequential client for the Vbrick v2 REST API. Owns its HTTP client and token.
pub struct VbrickClient {
    http: Client,
    base_url: String,
    auth: TokenManager,
    retry: RetryPolicy,
    request_delay: Duration,
}

impl VbrickClient {
    pub fn new(config: &ApiConfig, retry: &RetryConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .user_agent(concat!("vbrick-etl/", env!("CARGO_PKG_VERSION")));
        if let Some(proxy_url) = config.proxy_url.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy = Proxy::all(proxy_url).map_err(|e| EtlError::InvalidConfigValueError {
                field: "api.proxy_url".to_string(),
                value: proxy_url.to_string(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }
        let http = builder.build()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let auth = TokenManager::new(http.clone(), &base_url, &config.api_key, &config.api_secret);

        Ok(Self {
            http,
            base_url,
            auth,
            retry: RetryPolicy::new(retry),
            request_delay: Duration::from_millis(config.request_delay_ms),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The configured delay between consecutive requests.
    pub async fn pause(&self) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
    }

    /// One page of active videos uploaded since `from_upload_date`.
    pub async fn search_videos(
        &self,
        from_upload_date: &str,
        count: u32,
        scroll_id: Option<&str>,
    ) -> Result<VideoSearchPage> {
        let mut query = vec![
            ("count", count.to_string()),
            ("status", "Active".to_string()),
            ("fromUploadDate", from_upload_date.to_string()),
        ];
        if let Some(scroll_id) = scroll_id {
            query.push(("scrollId", scroll_id.to_string()));
        }
        self.get_json("/api/v2/videos/search", &query).await
    }

    /// Follows the scroll cursor until it runs out, a page comes back empty, or the
    /// reported total has been reached.
    pub async fn search_all_videos(&self, from_upload_date: &str, page_size: u32) -> Result<Vec<VideoDto>> {
        let mut videos = Vec::new();
        let mut scroll_id: Option<String> = None;
        let mut page = 0usize;

        loop {
            if page > 0 {
                self.pause().await;
            }
            let response = self
                .search_videos(from_upload_date, page_size, scroll_id.as_deref())
                .await?;
            page += 1;

            let fetched = response.videos.len();
            videos.extend(response.videos);
            tracing::debug!(page, fetched, total = videos.len(), "fetched video page");

            let reached_total = response
                .total_videos
                .is_some_and(|total| videos.len() as u64 >= total);
            match response.scroll_id.filter(|s| !s.is_empty()) {
                Some(next) if fetched > 0 && !reached_total => scroll_id = Some(next),
                _ => break,
            }
        }

        tracing::info!(videos = videos.len(), pages = page, "fetched active videos");
        Ok(videos)
    }

    pub async fn video_summary(&self, video_id: &str, after: &str, before: &str) -> Result<SummaryStatistics> {
        let path = format!("/api/v2/videos/{video_id}/summary-statistics");
        let query = [("after", after.to_string()), ("before", before.to_string())];
        self.get_json(&path, &query).await
    }

    pub async fn scheduled_events(&self, after: &str, before: &str) -> Result<Vec<ScheduledEventDto>> {
        let query = [
            ("after", after.to_string()),
            ("before", before.to_string()),
            ("sortField", "startDate".to_string()),
            ("sortDirection", "asc".to_string()),
        ];
        self.get_json("/api/v2/scheduled-events", &query).await
    }

    /// All attendee sessions of an event, at most `max_pages` pages of them.
    pub async fn post_event_report(&self, event_id: &str, max_pages: usize) -> Result<PostEventReport> {
        let path = format!("/api/v2/scheduled-events/{event_id}/post-event-report");
        let mut report = PostEventReport::default();
        let mut scroll_id: Option<String> = None;
        let mut pages = 0usize;

        loop {
            if pages > 0 {
                self.pause().await;
            }
            let query: Vec<(&str, String)> = scroll_id
                .iter()
                .map(|id| ("scrollId", id.clone()))
                .collect();
            let page: PostEventReport = self.get_json(&path, &query).await?;
            pages += 1;

            if page.attendee_count.is_some() {
                report.attendee_count = page.attendee_count;
            }
            if page.sessions.is_empty() {
                break;
            }
            report.sessions.extend(page.sessions);

            match page.scroll_id.filter(|s| !s.is_empty()) {
                Some(next) => scroll_id = Some(next),
                None => break,
            }
            if pages >= max_pages {
                tracing::warn!(event = event_id, pages, "stopping at report page limit");
                break;
            }
        }

        tracing::debug!(event = event_id, sessions = report.sessions.len(), pages, "fetched post-event report");
        Ok(report)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0u32;
        let mut reauthenticated = false;

        loop {
            attempt += 1;
            let token = self.auth.token().await?;
            let sent = self
                .http
                .get(&url)
                .bearer_auth(&token)
                .header("Accept", "application/json")
                .query(query)
                .send()
                .await;

            let (class, detail) = match sent {
                Ok(response) if response.status().is_success() => {
                    let body = response.text().await?;
                    return Ok(serde_json::from_str(&body)?);
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    let class = FailureClass::from_status(status);
                    if class == FailureClass::Unauthorized {
                        self.auth.invalidate().await;
                    }
                    if class == FailureClass::ClientError {
                        return Err(EtlError::FetchError {
                            url,
                            status: status.as_u16(),
                            body,
                        });
                    }
                    (class, format!("HTTP {}: {}", status.as_u16(), body))
                }
                Err(e) => (FailureClass::from_transport(&e), e.to_string()),
            };

            match self.retry.decide(attempt, class, reauthenticated) {
                RetryDecision::RetryAfter(delay) => {
                    if class == FailureClass::Unauthorized {
                        reauthenticated = true;
                    }
                    tracing::warn!(
                        url = %url,
                        attempt,
                        max_attempts = self.retry.max_attempts(),
                        failure = ?class,
                        delay_ms = delay.as_millis() as u64,
                        detail = %detail,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp if class == FailureClass::Unauthorized => {
                    return Err(EtlError::AuthError {
                        message: format!("{url} rejected the API token: {detail}"),
                    });
                }
                RetryDecision::GiveUp => {
                    return Err(EtlError::TransientFetchError {
                        url,
                        attempts: attempt,
                        message: detail,
                    });
                }
            }
        }
    }
}
