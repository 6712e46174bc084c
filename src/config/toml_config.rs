use crate::api::{ApiConfig, RetryConfig};
use crate::app::Stage;
use crate::core::categorizer::CategorizerConfig;
use crate::core::merger::MergeConfig;
use crate::core::normalizer::NormalizeConfig;
use crate::domain::mapping::Mappings;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const API_KEY_ENV: &str = "VBRICK_API_KEY";
pub const API_SECRET_ENV: &str = "VBRICK_API_SECRET";

/// Everything the four stages need, loaded from one TOML file. Every section is
/// optional and falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub videos: VideosConfig,
    pub webcasts: WebcastsConfig,
    pub categorizer: CategorizerConfig,
    pub merge: MergeConfig,
    pub normalize: NormalizeConfig,
    pub output: OutputConfig,
    pub mappings: Mappings,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideosConfig {
    /// Only videos uploaded within this many days are collected.
    pub lookback_days: i64,
    pub page_size: u32,
    /// Limits the statistics window; by default it starts at the upload date.
    pub analytics_lookback_days: Option<i64>,
    pub write_daily: bool,
    pub dump_json: bool,
}

impl Default for VideosConfig {
    fn default() -> Self {
        Self {
            lookback_days: 730,
            page_size: 100,
            analytics_lookback_days: None,
            write_daily: true,
            dump_json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebcastsConfig {
    /// ISO date or timestamp; overrides `lookback_days` when set.
    pub start_date: Option<String>,
    pub lookback_days: i64,
    pub max_report_pages: usize,
    pub dump_json: bool,
}

impl Default for WebcastsConfig {
    fn default() -> Self {
        Self {
            start_date: None,
            lookback_days: 365,
            max_report_pages: 40,
            dump_json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: String,
    /// Network share the finished files are copied to.
    pub publish_dir: Option<String>,
    pub video_file: String,
    pub daily_file: String,
    pub webcast_file: String,
    pub merged_file: String,
    pub normalized_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "./output".to_string(),
            publish_dir: None,
            video_file: "vbrick_analytics.csv".to_string(),
            daily_file: "video_daily_analytics.csv".to_string(),
            webcast_file: "webcast_summary.csv".to_string(),
            merged_file: "merged_webcast_video_summary.csv".to_string(),
            normalized_file: "normalized_webcast_video_summary.csv".to_string(),
        }
    }
}

impl OutputConfig {
    fn file_names(&self) -> [&str; 5] {
        [
            &self.video_file,
            &self.daily_file,
            &self.webcast_file,
            &self.merged_file,
            &self.normalized_file,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl EtlConfig {
    /// Loads `path` when given, otherwise starts from defaults. Credentials left empty
    /// are taken from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_fallbacks();
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| EtlError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::from_toml_str_with(content, env_lookup)
    }

    /// Parses `content`, resolving `${VAR}` through `lookup` instead of the process
    /// environment.
    pub fn from_toml_str_with<F>(content: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let processed = substitute_env_vars(content, lookup)?;
        toml::from_str(&processed).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn apply_env_fallbacks(&mut self) {
        self.apply_env_fallbacks_with(env_lookup);
    }

    pub fn apply_env_fallbacks_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fill_from_env(&mut self.api.api_key, API_KEY_ENV, &lookup);
        fill_from_env(&mut self.api.api_secret, API_SECRET_ENV, &lookup);
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }

    /// Checks only what the given stages use, so merge/normalize run without credentials.
    pub fn validate_for(&self, stages: &[Stage]) -> Result<()> {
        validation::validate_path("output.directory", &self.output.directory)?;
        validation::validate_file_extensions("output", &self.output.file_names(), &["csv"])?;
        if let Some(publish_dir) = &self.output.publish_dir {
            validation::validate_path("output.publish_dir", publish_dir)?;
        }

        if stages.iter().any(Stage::fetches) {
            self.validate_api()?;
        }
        if stages.contains(&Stage::Videos) {
            validation::validate_range("videos.page_size", self.videos.page_size, 1, 1000)?;
            validation::validate_range("videos.lookback_days", self.videos.lookback_days, 1, 36_500)?;
        }
        if stages.contains(&Stage::Webcasts) {
            validation::validate_positive_number(
                "webcasts.max_report_pages",
                self.webcasts.max_report_pages,
                1,
            )?;
            if let Some(start) = &self.webcasts.start_date {
                if crate::domain::model::parse_day(start).is_none() {
                    return Err(EtlError::InvalidConfigValueError {
                        field: "webcasts.start_date".to_string(),
                        value: start.clone(),
                        reason: "expected an ISO date such as 2025-07-01".to_string(),
                    });
                }
            }
            self.validate_categorizer()?;
        }
        if stages.contains(&Stage::Merge) {
            validation::validate_range("merge.tolerance_days", self.merge.tolerance_days, 0, 365)?;
        }
        Ok(())
    }

    fn validate_api(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api.base_url)?;
        if self.api.api_key.trim().is_empty() {
            return Err(EtlError::MissingConfigError {
                field: format!("api.api_key (or {API_KEY_ENV})"),
            });
        }
        if self.api.api_secret.trim().is_empty() {
            return Err(EtlError::MissingConfigError {
                field: format!("api.api_secret (or {API_SECRET_ENV})"),
            });
        }
        if let Some(proxy) = self.api.proxy_url.as_deref().filter(|p| !p.trim().is_empty()) {
            validation::validate_url("api.proxy_url", proxy)?;
        }
        validation::validate_range("retry.max_attempts", self.retry.max_attempts, 1, 20)?;
        validation::validate_positive_number("api.timeout_secs", self.api.timeout_secs as usize, 1)
    }

    fn validate_categorizer(&self) -> Result<()> {
        let categorizer = &self.categorizer;
        validation::validate_positive_number("categorizer.max_features", categorizer.max_features, 1)?;
        validation::validate_positive_number("categorizer.max_clusters", categorizer.max_clusters, 2)?;
        validation::validate_range("categorizer.top_terms", categorizer.top_terms, 1, 10)?;
        if let Some(k) = categorizer.clusters {
            validation::validate_positive_number("categorizer.clusters", k, 1)?;
        }
        Ok(())
    }
}

impl Validate for EtlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_for(&Stage::ALL)
    }
}

fn env_lookup(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

/// Replaces `${VAR}` with the variable's value; unknown variables are left untouched.
fn substitute_env_vars<F>(content: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
        message: format!("invalid substitution pattern: {e}"),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
    });
    Ok(result.into_owned())
}

fn fill_from_env<F>(value: &mut String, var: &str, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    let unresolved = value.trim().is_empty() || value.contains("${");
    if unresolved {
        if let Some(from_env) = lookup(var) {
            *value = from_env;
        } else if value.contains("${") {
            value.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalizer::OutputLayout;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL_CONFIG: &str = r#"
[api]
base_url = "https://company.rev.vbrick.com"
api_key = "key"
api_secret = "secret"
proxy_url = "http://proxy.local:8080"

[retry]
max_attempts = 5

[videos]
lookback_days = 365
write_daily = false

[webcasts]
start_date = "2025-07-01T00:00:00Z"

[categorizer]
extra_stop_words = ["acme", "2024", "2025"]
clusters = 4

[merge]
tolerance_days = 3

[normalize]
layout = "axis"

[output]
directory = "./out"
publish_dir = "/mnt/share/vbrick"

[mappings.zone]
entries = { "APAC CS" = "APAC", "Zurich" = "Swiss" }
"#;

    #[test]
    fn test_parse_full_config() {
        let config = EtlConfig::from_toml_str(FULL_CONFIG).unwrap();

        assert_eq!(config.api.base_url, "https://company.rev.vbrick.com");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, RetryConfig::default().base_delay_ms);
        assert_eq!(config.videos.lookback_days, 365);
        assert!(!config.videos.write_daily);
        assert_eq!(config.webcasts.max_report_pages, 40);
        assert_eq!(config.categorizer.clusters, Some(4));
        assert_eq!(config.categorizer.seed, 42);
        assert_eq!(config.merge.tolerance_days, 3);
        assert_eq!(config.normalize.layout, OutputLayout::Axis);
        assert_eq!(config.output.webcast_file, "webcast_summary.csv");
        assert_eq!(config.mappings.zone.group(Some("Zurich")), "Swiss");
        assert_eq!(config.mappings.zone.group(Some("EMEA")), "Other");
        assert_eq!(config.mappings.video_device.group(Some("PC")), "Desktop");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EtlConfig::from_toml_str("").unwrap();
        assert_eq!(config, EtlConfig::default());
        assert_eq!(config.api.request_delay_ms, 100);
        assert_eq!(config.merge.tolerance_days, 2);
        assert_eq!(config.normalize.layout, OutputLayout::Long);
    }

    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
        }
    }

    #[test]
    fn test_env_var_substitution() {
        let config = EtlConfig::from_toml_str_with(
            "[api]\nbase_url = \"${BASE_URL}\"\n",
            vars(&[("BASE_URL", "https://subst.example.com")]),
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://subst.example.com");
    }

    #[test]
    fn test_unresolved_placeholder_is_left_alone() {
        let config =
            EtlConfig::from_toml_str_with("[output]\ndirectory = \"${UNSET_DIR}\"\n", vars(&[])).unwrap();
        assert_eq!(config.output.directory, "${UNSET_DIR}");
    }

    #[test]
    fn test_credentials_fall_back_to_environment() {
        let env = vars(&[(API_KEY_ENV, "ignored"), (API_SECRET_ENV, "from-env")]);
        let mut config = EtlConfig::from_toml_str_with("[api]\napi_key = \"inline\"\n", &env).unwrap();
        config.apply_env_fallbacks_with(&env);
        assert_eq!(config.api.api_key, "inline");
        assert_eq!(config.api.api_secret, "from-env");
    }

    #[test]
    fn test_unresolvable_credential_placeholder_is_cleared() {
        let toml = "[api]\napi_key = \"${MISSING_KEY}\"\napi_secret = \"s\"\n";
        let mut config = EtlConfig::from_toml_str_with(toml, vars(&[])).unwrap();
        config.apply_env_fallbacks_with(vars(&[]));
        assert_eq!(config.api.api_key, "");
        assert!(config.validate_for(&[Stage::Videos]).is_err());
    }

    #[test]
    fn test_offline_stages_need_no_credentials() {
        let config = EtlConfig::default();
        assert!(config.validate_for(&[Stage::Merge, Stage::Normalize]).is_ok());

        let err = config.validate_for(&[Stage::Videos]).unwrap_err();
        assert!(matches!(err, EtlError::InvalidConfigValueError { .. } | EtlError::MissingConfigError { .. }));
    }

    #[test]
    fn test_rejects_non_csv_output_names() {
        let config = EtlConfig::from_toml_str("[output]\nmerged_file = \"merged.xlsx\"\n").unwrap();
        let err = config.validate_for(&[Stage::Merge]).unwrap_err();
        assert!(err.to_string().contains("merged.xlsx"));
    }

    #[test]
    fn test_rejects_bad_tolerance_and_start_date() {
        let config = EtlConfig::from_toml_str("[merge]\ntolerance_days = -1\n").unwrap();
        assert!(config.validate_for(&[Stage::Merge]).is_err());

        let mut config = EtlConfig::from_toml_str(FULL_CONFIG).unwrap();
        config.webcasts.start_date = Some("July 1st".to_string());
        assert!(config.validate_for(&[Stage::Webcasts]).is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(FULL_CONFIG.as_bytes()).unwrap();

        let config = EtlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.output.directory, "./out");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = EtlConfig::from_file("/nonexistent/vbrick-etl.toml").unwrap_err();
        assert!(matches!(err, EtlError::ConfigError { .. }));
    }
}
