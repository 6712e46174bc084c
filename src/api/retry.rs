use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per request, the first one included.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
            max_delay_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    RateLimited,
    ServerError,
    Timeout,
    Connection,
    Unauthorized,
    ClientError,
}

impl FailureClass {
    pub fn from_status(status: StatusCode) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS {
            FailureClass::RateLimited
        } else if status == StatusCode::UNAUTHORIZED {
            FailureClass::Unauthorized
        } else if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
            FailureClass::Timeout
        } else if status.is_server_error() {
            FailureClass::ServerError
        } else {
            FailureClass::ClientError
        }
    }

    pub fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            FailureClass::Timeout
        } else {
            FailureClass::Connection
        }
    }

    /// Failures that may clear up on their own.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FailureClass::RateLimited
                | FailureClass::ServerError
                | FailureClass::Timeout
                | FailureClass::Connection
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Pure retry schedule, kept apart from the transport so it can be tested directly.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms.max(config.base_delay_ms)),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// `attempt` is the 1-based number of the attempt that just failed. `reauthenticated`
    /// is whether this request already retried with a fresh token; an unauthorized
    /// response gets exactly one such retry, whatever failed before it.
    pub fn decide(&self, attempt: u32, class: FailureClass, reauthenticated: bool) -> RetryDecision {
        match class {
            FailureClass::Unauthorized if !reauthenticated => RetryDecision::RetryAfter(Duration::ZERO),
            class if !class.is_transient() => RetryDecision::GiveUp,
            _ if attempt >= self.max_attempts => RetryDecision::GiveUp,
            _ => RetryDecision::RetryAfter(self.backoff(attempt)),
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(&RetryConfig {
            max_attempts,
            base_delay_ms: 100,
            max_delay_ms: 350,
        })
    }

    #[test]
    fn test_transient_failures_back_off_exponentially() {
        let policy = policy(5);
        assert_eq!(
            policy.decide(1, FailureClass::RateLimited, false),
            RetryDecision::RetryAfter(Duration::from_millis(100))
        );
        assert_eq!(
            policy.decide(2, FailureClass::ServerError, false),
            RetryDecision::RetryAfter(Duration::from_millis(200))
        );
        // Capped.
        assert_eq!(
            policy.decide(3, FailureClass::Timeout, false),
            RetryDecision::RetryAfter(Duration::from_millis(350))
        );
        assert_eq!(policy.decide(5, FailureClass::Connection, false), RetryDecision::GiveUp);
    }

    #[test]
    fn test_client_errors_are_final() {
        assert_eq!(policy(5).decide(1, FailureClass::ClientError, false), RetryDecision::GiveUp);
    }

    #[test]
    fn test_unauthorized_retries_once() {
        let policy = policy(5);
        assert_eq!(
            policy.decide(1, FailureClass::Unauthorized, false),
            RetryDecision::RetryAfter(Duration::ZERO)
        );
        assert_eq!(policy.decide(2, FailureClass::Unauthorized, true), RetryDecision::GiveUp);
    }

    #[test]
    fn test_unauthorized_after_transient_failure_still_retries() {
        let policy = policy(3);
        assert!(matches!(
            policy.decide(1, FailureClass::ServerError, false),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(
            policy.decide(2, FailureClass::Unauthorized, false),
            RetryDecision::RetryAfter(Duration::ZERO)
        );
        // The token retry is owed even when the transport budget is spent.
        assert_eq!(
            policy.decide(3, FailureClass::Unauthorized, false),
            RetryDecision::RetryAfter(Duration::ZERO)
        );
        assert_eq!(policy.decide(3, FailureClass::ServerError, true), RetryDecision::GiveUp);
    }

    #[test]
    fn test_single_attempt_never_retries() {
        assert_eq!(policy(1).decide(1, FailureClass::ServerError, false), RetryDecision::GiveUp);
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(FailureClass::from_status(StatusCode::TOO_MANY_REQUESTS), FailureClass::RateLimited);
        assert_eq!(FailureClass::from_status(StatusCode::BAD_GATEWAY), FailureClass::ServerError);
        assert_eq!(FailureClass::from_status(StatusCode::GATEWAY_TIMEOUT), FailureClass::Timeout);
        assert_eq!(FailureClass::from_status(StatusCode::UNAUTHORIZED), FailureClass::Unauthorized);
        assert_eq!(FailureClass::from_status(StatusCode::NOT_FOUND), FailureClass::ClientError);
        assert!(!FailureClass::ClientError.is_transient());
    }
}
