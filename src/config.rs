use crate::error::ConfigError;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Default minimum passing score
pub const DEFAULT_THRESHOLD: u32 = 70;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// Minimum score for a spec to pass
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub lint: LintConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RegistryConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
    /// Spec type sent when uploading
    #[serde(default = "default_spec_type")]
    pub spec_type: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PollConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_poll_max_attempts")]
    pub max_attempts: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BatchConfig {
    /// Pause between successive registry writes in a batch
    #[serde(default = "default_batch_delay_ms")]
    pub delay_ms: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LintConfig {
    #[serde(default = "default_lint_command")]
    pub command: String,
    /// Arguments; `{target}`, `{format}` and `{workspace}` are substituted
    #[serde(default = "default_lint_args")]
    pub args: Vec<String>,
    #[serde(default)]
    pub format: crate::lint::OutputFormat,
    #[serde(default = "default_lint_timeout_secs")]
    pub timeout_secs: u64,
    /// File extensions treated as specs in directory mode
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct NotifyConfig {
    /// Per-spec lines included in a batch card
    #[serde(default = "default_max_detail_lines")]
    pub max_detail_lines: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            registry: RegistryConfig::default(),
            retry: RetryConfig::default(),
            poll: PollConfig::default(),
            batch: BatchConfig::default(),
            lint: LintConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_header: default_api_key_header(),
            spec_type: default_spec_type(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            max_attempts: default_poll_max_attempts(),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_batch_delay_ms(),
        }
    }
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            command: default_lint_command(),
            args: default_lint_args(),
            format: crate::lint::OutputFormat::default(),
            timeout_secs: default_lint_timeout_secs(),
            extensions: default_extensions(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            max_detail_lines: default_max_detail_lines(),
        }
    }
}

fn default_threshold() -> u32 {
    DEFAULT_THRESHOLD
}

fn default_base_url() -> String {
    "https://api.getpostman.com".to_string()
}

fn default_api_key_header() -> String {
    "X-Api-Key".to_string()
}

fn default_spec_type() -> String {
    "OPENAPI:3.0".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    crate::retry::DEFAULT_MAX_RETRIES
}

fn default_base_delay_ms() -> u64 {
    crate::retry::DEFAULT_BASE_DELAY_MS
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_poll_max_attempts() -> u32 {
    30
}

fn default_batch_delay_ms() -> u64 {
    1500
}

fn default_lint_command() -> String {
    "postman".to_string()
}

fn default_lint_args() -> Vec<String> {
    ["spec", "lint", "{target}", "--output", "{format}"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_lint_timeout_secs() -> u64 {
    120
}

fn default_extensions() -> Vec<String> {
    vec!["yaml".into(), "yml".into(), "json".into()]
}

fn default_max_detail_lines() -> usize {
    10
}

impl Config {
    /// Load the config file, falling back to defaults when it does not exist
    pub fn load(path: &str, overrides: &[String]) -> Result<Self, ConfigError> {
        let mut value = if Path::new(path).exists() {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_string(),
                source,
            })?;
            content
                .parse::<toml::Table>()
                .map_err(|e| ConfigError::Parse {
                    path: path.to_string(),
                    message: e.to_string(),
                })?
        } else {
            debug!("Config file {} not found, using defaults", path);
            toml::Table::new()
        };

        for item in overrides {
            apply_override(&mut value, item)?;
        }

        let invalid = |message: String| ConfigError::Parse {
            path: path.to_string(),
            message,
        };
        let merged = toml::to_string(&value).map_err(|e| invalid(e.to_string()))?;
        toml::from_str(&merged).map_err(|e| invalid(e.to_string()))
    }

    /// Render the default config as TOML
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry.max_retries, self.retry.base_delay_ms)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch.delay_ms)
    }
}

/// Apply a `key.path=value` override to a TOML table
///
/// The value is read as a TOML literal when it parses as one, otherwise it is
/// taken as a plain string.
pub fn apply_override(table: &mut toml::Table, item: &str) -> Result<(), ConfigError> {
    let (key, raw) = item
        .split_once('=')
        .ok_or_else(|| ConfigError::Override(item.to_string()))?;
    let parts: Vec<&str> = key.trim().split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(ConfigError::Override(item.to_string()));
    }

    let raw = raw.trim();
    let value = format!("v = {}", raw)
        .parse::<toml::Table>()
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()));

    let (last, parents) = parts
        .split_last()
        .ok_or_else(|| ConfigError::Override(item.to_string()))?;
    let mut current = table;
    for part in parents {
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        current = entry
            .as_table_mut()
            .ok_or_else(|| ConfigError::Override(item.to_string()))?;
    }
    current.insert(last.to_string(), value);
    Ok(())
}

/// Per-invocation values resolved from flags and environment
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub api_key: Option<String>,
    pub workspace_id: Option<String>,
    pub webhook_url: Option<String>,
}

impl Credentials {
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        non_empty(self.api_key.as_deref()).ok_or(ConfigError::Missing {
            what: "registry API key",
            flag: "--api-key",
            env_var: "SPECWARDEN_API_KEY",
        })
    }

    pub fn require_workspace_id(&self) -> Result<&str, ConfigError> {
        non_empty(self.workspace_id.as_deref()).ok_or(ConfigError::Missing {
            what: "workspace id",
            flag: "--workspace-id",
            env_var: "SPECWARDEN_WORKSPACE_ID",
        })
    }

    pub fn require_webhook_url(&self) -> Result<&str, ConfigError> {
        non_empty(self.webhook_url.as_deref()).ok_or(ConfigError::Missing {
            what: "webhook URL",
            flag: "--webhook-url",
            env_var: "SPECWARDEN_WEBHOOK_URL",
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Everything an operation needs, built once per process
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    pub credentials: Credentials,
}

impl Settings {
    pub fn new(config: Config, credentials: Credentials) -> Self {
        Self {
            config,
            credentials,
        }
    }

    /// Threshold from the flag if given, else from the config file
    pub fn threshold(&self, flag: Option<u32>) -> Result<u32, ConfigError> {
        let threshold = flag.unwrap_or(self.config.threshold);
        if threshold > crate::lint::score::MAX_SCORE {
            return Err(ConfigError::Invalid(format!(
                "threshold {} is above {}",
                threshold,
                crate::lint::score::MAX_SCORE
            )));
        }
        Ok(threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load("/nonexistent/specwarden.toml", &[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.threshold, 70);
        assert_eq!(config.poll.max_attempts, 30);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "threshold = 80\n[lint]\ncommand = \"spectral\"").unwrap();
        let config = Config::load(file.path().to_str().unwrap(), &[]).unwrap();
        assert_eq!(config.threshold, 80);
        assert_eq!(config.lint.command, "spectral");
        assert_eq!(config.lint.args, default_lint_args());
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "threshold = [").unwrap();
        let err = Config::load(file.path().to_str().unwrap(), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_overrides_apply_typed_and_string_values() {
        let config = Config::load(
            "/nonexistent/specwarden.toml",
            &[
                "threshold=85".to_string(),
                "lint.command=spectral".to_string(),
                "lint.args=[\"lint\", \"{target}\"]".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(config.threshold, 85);
        assert_eq!(config.lint.command, "spectral");
        assert_eq!(config.lint.args, vec!["lint", "{target}"]);
    }

    #[test]
    fn test_override_without_equals_is_rejected() {
        let mut table = toml::Table::new();
        assert!(apply_override(&mut table, "threshold").is_err());
        assert!(apply_override(&mut table, "lint..command=x").is_err());
    }

    #[test]
    fn test_default_toml_round_trips() {
        let rendered = Config::default_toml();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_blank_credentials_are_missing() {
        let creds = Credentials {
            api_key: Some("  ".into()),
            ..Credentials::default()
        };
        assert!(creds.require_api_key().is_err());
        assert!(creds.require_workspace_id().is_err());
    }

    #[test]
    fn test_threshold_flag_wins_and_is_bounded() {
        let settings = Settings::new(Config::default(), Credentials::default());
        assert_eq!(settings.threshold(None).unwrap(), 70);
        assert_eq!(settings.threshold(Some(90)).unwrap(), 90);
        assert!(settings.threshold(Some(101)).is_err());
    }
}
