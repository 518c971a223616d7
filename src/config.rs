//! Configuration file parser for `blogfeed.toml`.
//!
//! The config file is optional; a missing file yields `Config::default()`,
//! which crawls the two built-in blog sections. Unknown keys are accepted by
//! serde, though we log a warning when the file contains potential typos.
use crate::model::{SourceConfig, SourceIdentity};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Built-in sources
// ============================================================================

const PRIMARY_ROOT: &str = "https://monzo.com/blog";
const US_ROOT: &str = "https://monzo.com/us/blog";

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            name: "blog".to_string(),
            url: PRIMARY_ROOT.to_string(),
            identity: SourceIdentity {
                title: "Monzo".to_string(),
                link: PRIMARY_ROOT.to_string(),
                description: "An unofficial Monzo blog feed".to_string(),
            },
            tag_filters: vec!["Technology".to_string()],
        },
        SourceConfig {
            name: "us_blog".to_string(),
            url: US_ROOT.to_string(),
            identity: SourceIdentity {
                title: "Monzo US".to_string(),
                link: US_ROOT.to_string(),
                description: "An unofficial Monzo US blog feed".to_string(),
            },
            tag_filters: Vec::new(),
        },
    ]
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Where finished artifacts are placed. Both directories must already exist.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Raw record dumps (`{name}_feed_items.json`).
    pub records_dir: PathBuf,
    /// Syndication files (`{name}.rss`, `{name}.json`).
    pub feeds_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            records_dir: PathBuf::from(".json"),
            feeds_dir: PathBuf::from("feeds"),
        }
    }
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Specifying `[[sources]]` replaces the built-in list entirely.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Origin that relative card links are resolved against.
    pub site_origin: String,

    /// Transport-level timeout applied to every request.
    pub request_timeout_secs: u64,

    /// Retries after a 429 or 5xx response.
    pub max_retries: u32,

    /// First backoff delay; doubles on each retry.
    pub retry_base_delay_ms: u64,

    /// Upper bound on a single listing page body.
    pub max_page_bytes: usize,

    pub user_agent: String,

    /// Escalate any failed listing page to a source-level failure.
    pub fail_on_page_error: bool,

    pub output: OutputConfig,

    pub sources: Vec<SourceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_origin: "https://monzo.com".to_string(),
            request_timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            max_page_bytes: 10 * 1024 * 1024,
            user_agent: concat!("blogfeed/", env!("CARGO_PKG_VERSION")).to_string(),
            fail_on_page_error: false,
            output: OutputConfig::default(),
            sources: default_sources(),
        }
    }
}

/// Settings the HTTP fetch layer needs, split out so it can be built
/// without a full [`Config`].
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub max_page_bytes: usize,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Config::default().fetch_settings()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 9] = [
        "site_origin",
        "request_timeout_secs",
        "max_retries",
        "retry_base_delay_ms",
        "max_page_bytes",
        "user_agent",
        "fail_on_page_error",
        "output",
        "sources",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    /// - Semantically invalid values → `Err(ConfigError::Invalid)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            sources = config.sources.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Reject configurations that would only fail later, mid-crawl.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::Invalid("at least one source is required".into()));
        }
        url::Url::parse(&self.site_origin).map_err(|e| {
            ConfigError::Invalid(format!("site_origin '{}': {}", self.site_origin, e))
        })?;

        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(ConfigError::Invalid("source name must not be empty".into()));
            }
            if !is_file_name_safe(&source.name) {
                return Err(ConfigError::Invalid(format!(
                    "source name '{}' must not contain path separators",
                    source.name
                )));
            }
            if !names.insert(source.name.to_lowercase()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
            url::Url::parse(&source.url).map_err(|e| {
                ConfigError::Invalid(format!("source '{}' url '{}': {}", source.name, source.url, e))
            })?;
            if source.tag_filters.iter().any(|t| t.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!(
                    "source '{}' has an empty tag filter",
                    source.name
                )));
            }
            if let Some(filter) = source.tag_filters.iter().find(|t| !is_file_name_safe(t)) {
                return Err(ConfigError::Invalid(format!(
                    "source '{}' tag filter '{}' must not contain path separators",
                    source.name, filter
                )));
            }
        }
        Ok(())
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_retries: self.max_retries,
            retry_base_delay: Duration::from_millis(self.retry_base_delay_ms),
            max_page_bytes: self.max_page_bytes,
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Source names and tag filters become output file names.
fn is_file_name_safe(part: &str) -> bool {
    !part.contains(['/', '\\', '\0'])
}

// ============================================================================
// Tests
// ============================================================================
