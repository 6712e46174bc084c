use crate::api::models::{AuthRequest, AuthResponse};
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct Token {
    value: String,
    expires_at: Instant,
}

/// Holds the session token and refreshes it shortly before it lapses.
pub struct TokenManager {
    http: Client,
    endpoint: String,
    api_key: String,
    api_secret: String,
    token: Mutex<Option<Token>>,
}

impl TokenManager {
    pub fn new(http: Client, base_url: &str, api_key: &str, api_secret: &str) -> Self {
        Self {
            http,
            endpoint: format!("{}/api/v2/authenticate", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            token: Mutex::new(None),
        }
    }

    /// A token with at least a minute of validity left.
    pub async fn token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.expires_at > Instant::now() + REFRESH_MARGIN {
                return Ok(token.value.clone());
            }
        }

        let token = self.authenticate().await?;
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }

    /// Forces the next `token()` call to authenticate again.
    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    async fn authenticate(&self) -> Result<Token> {
        tracing::debug!(endpoint = %self.endpoint, "requesting API token");
        let response = self
            .http
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(&AuthRequest {
                api_key: &self.api_key,
                api_secret: &self.api_secret,
            })
            .send()
            .await
            .map_err(|e| EtlError::AuthError {
                message: format!("authentication request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EtlError::AuthError {
                message: format!("authentication returned HTTP {}: {}", status.as_u16(), body),
            });
        }

        let payload: AuthResponse = response.json().await.map_err(|e| EtlError::AuthError {
            message: format!("unreadable authentication response: {e}"),
        })?;
        let value = payload
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| EtlError::AuthError {
                message: "authentication response carried no token".to_string(),
            })?;
        let lifetime = payload.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        tracing::info!(expires_in = lifetime, "obtained API token");

        Ok(Token {
            value,
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        })
    }
}
