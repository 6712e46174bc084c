use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    #[error("Request to {url} failed after {attempts} attempts: {message}")]
    TransientFetchError {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("Request to {url} returned HTTP {status}: {body}")]
    FetchError {
        url: String,
        status: u16,
        body: String,
    },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    Network,
    Data,
    Io,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::AuthError { .. } => ErrorCategory::Authentication,
            EtlError::TransientFetchError { .. }
            | EtlError::FetchError { .. }
            | EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::CsvError(_) | EtlError::SerializationError(_) => ErrorCategory::Data,
            EtlError::IoError(_) => ErrorCategory::Io,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EtlError::AuthError { .. } => ErrorSeverity::Critical,
            EtlError::TransientFetchError { .. } | EtlError::ApiError(_) => ErrorSeverity::Medium,
            EtlError::IoError(_) => ErrorSeverity::Critical,
            EtlError::FetchError { .. }
            | EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorSeverity::High,
        }
    }

    /// Whether re-running the same stage later has a reasonable chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        matches!(self.severity(), ErrorSeverity::Medium)
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::AuthError { .. } => {
                "Check VBRICK_API_KEY / VBRICK_API_SECRET and that the API user is still active"
            }
            EtlError::TransientFetchError { .. } | EtlError::ApiError(_) => {
                "The API is rate limiting or unavailable; re-run the stage later or raise retry.max_attempts"
            }
            EtlError::FetchError { .. } => {
                "The API rejected the request; check the base URL and the API user's permissions"
            }
            EtlError::CsvError(_) => {
                "An input CSV is malformed; re-run the stage that produced it"
            }
            EtlError::IoError(_) => "Check that the input files exist and the output directory is writable",
            EtlError::SerializationError(_) => {
                "The API returned an unexpected payload; run with --verbose to inspect it"
            }
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => "Fix the configuration file and try again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Authentication => format!("Could not authenticate with the API: {}", self),
            ErrorCategory::Network => format!("Could not fetch data from the API: {}", self),
            ErrorCategory::Data => format!("Could not process the data: {}", self),
            ErrorCategory::Io => format!("File system error: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_is_critical() {
        let err = EtlError::AuthError {
            message: "no token".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Authentication);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_transient_fetch_error_is_retryable() {
        let err = EtlError::TransientFetchError {
            url: "https://example.com/api".to_string(),
            attempts: 3,
            message: "HTTP 503".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("after 3 attempts"));
    }

    #[test]
    fn test_malformed_input_is_not_retryable() {
        let err = EtlError::FetchError {
            url: "https://example.com/api".to_string(),
            status: 404,
            body: String::new(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_user_friendly_message_mentions_config() {
        let err = EtlError::MissingConfigError {
            field: "api.base_url".to_string(),
        };
        assert!(err.user_friendly_message().starts_with("Invalid configuration"));
    }
}
