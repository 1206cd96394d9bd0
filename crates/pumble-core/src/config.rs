//! Configuration types and loading for the application.

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::paths::{expand_str_path, write_default_config};
use crate::pumble::http::DEFAULT_BASE_URL;
use crate::{API_KEY_ENV, AppPaths, CoreError, Result, env_prefix};

/// Default number of messages requested per page when walking a full history.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default upper bound on pages fetched by a single full-history walk.
pub const DEFAULT_MAX_PAGES: usize = 1_000;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
#[schemars(
    title = "Application Configuration",
    description = "Main configuration for the application"
)]
pub struct AppConfig {
    /// JSON Schema reference for editor support.
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub schema: Option<String>,

    /// Active configuration profile.
    #[schemars(default = "default_profile")]
    pub profile: String,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Pumble API access.
    pub api: ApiConfig,
}

fn default_profile() -> String {
    "default".to_string()
}

impl AppConfig {
    /// Override the profile if a value is provided.
    #[must_use]
    pub fn with_profile_override(mut self, profile: Option<String>) -> Self {
        if let Some(profile) = profile {
            self.profile = profile;
        }
        self
    }

    /// Load configuration from file and environment, creating defaults if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the file cannot be parsed, or an IO
    /// error if the default file cannot be written.
    pub fn load(paths: &AppPaths, dry_run: bool) -> Result<Self> {
        if !paths.config_file.exists() {
            if dry_run {
                log::info!(
                    "dry-run: would create default config at {}",
                    paths.config_file.display()
                );
            } else {
                write_default_config(&paths.config_file)?;
            }
        }

        Self::load_from_path(&paths.config_file)
    }

    /// Load configuration from a specific path.
    ///
    /// Sources are layered: built-in defaults, the TOML file, `PUMBLE_*`
    /// variables (`__` separates nesting, e.g. `PUMBLE_API__TIMEOUT`) and
    /// finally `PUMBLE_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if a source is malformed or a value has
    /// the wrong type, and [`CoreError::Path`] if `logging.file` cannot be
    /// expanded.
    pub fn load_from_path(config_file: &Path) -> Result<Self> {
        let env_prefix = env_prefix();
        let built = Config::builder()
            .set_default("profile", "default")?
            .set_default("logging.level", "info")?
            .set_default("api.base_url", DEFAULT_BASE_URL)?
            .set_default("api.timeout", DEFAULT_TIMEOUT_SECS as i64)?
            .set_default("api.page_size", i64::from(DEFAULT_PAGE_SIZE))?
            .set_default("api.max_pages", DEFAULT_MAX_PAGES as i64)?
            .add_source(
                File::from(config_file)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(env_prefix.as_str())
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("api.api_key", std::env::var(API_KEY_ENV).ok())?
            .build()?;

        let mut config: Self = built.try_deserialize()?;

        if let Some(ref file) = config.logging.file {
            let expanded = expand_str_path(file)?;
            config.logging.file = Some(expanded.display().to_string());
        }

        Ok(config)
    }

    /// Render as TOML, the format the loader reads.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Serialization`] if TOML encoding fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CoreError::Serialization(format!("encoding config as TOML: {e}")))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema: None,
            profile: default_profile(),
            logging: LoggingConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
#[schemars(description = "Logging configuration")]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace).
    #[schemars(default = "default_log_level")]
    pub level: LogLevel,

    /// Optional path for log file output. Supports ~ and environment variables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Log level enumeration for schema validation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only emit error-level messages.
    Error,
    /// Emit warnings and errors.
    Warn,
    /// Emit informational messages and above (default).
    #[default]
    Info,
    /// Emit debug diagnostics and above.
    Debug,
    /// Emit all messages including fine-grained traces.
    Trace,
}

impl LogLevel {
    /// The matching `log` filter.
    #[must_use]
    pub const fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

const fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
        }
    }
}

/// Pumble API access configuration.
#[derive(Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
#[schemars(description = "Pumble API access")]
pub struct ApiConfig {
    /// API key generated in Pumble with `/api-keys generate`.
    /// Prefer the `PUMBLE_API_KEY` environment variable over storing it here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the API-keys addon.
    pub base_url: String,

    /// Request timeout in seconds.
    #[schemars(range(min = 1))]
    pub timeout: u64,

    /// Messages per page when fetching a full channel history.
    #[schemars(range(min = 1))]
    pub page_size: u32,

    /// Maximum number of pages a full-history fetch may request.
    #[schemars(range(min = 1))]
    pub max_pages: usize,
}

impl ApiConfig {
    /// The configured API key, rejecting absent or blank values.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingApiKey`] if no usable key is configured.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(CoreError::MissingApiKey)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("create temp config");
        file.write_all(body.as_bytes()).expect("write temp config");
        file
    }

    #[test]
    fn defaults_apply_when_file_is_empty() {
        let file = write_config("");
        let config = AppConfig::load_from_path(file.path()).expect("load config");
        assert_eq!(config.profile, "default");
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.api.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.api.max_pages, DEFAULT_MAX_PAGES);
    }

    #[test]
    fn file_values_override_defaults() {
        let file = write_config(
            r#"
profile = "work"

[logging]
level = "debug"

[api]
api_key = "from-file"
base_url = "http://localhost:9999"
page_size = 25
max_pages = 4
"#,
        );
        let config = AppConfig::load_from_path(file.path()).expect("load config");
        assert_eq!(config.profile, "work");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.api.base_url, "http://localhost:9999");
        assert_eq!(config.api.page_size, 25);
        assert_eq!(config.api.max_pages, 4);
        assert_eq!(config.api.timeout, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn malformed_values_are_config_errors() {
        let file = write_config(
            r#"
[api]
page_size = "lots"
"#,
        );
        let err = AppConfig::load_from_path(file.path()).expect_err("page_size is not a number");
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn default_toml_loads_back() {
        let rendered = AppConfig::default().to_toml().expect("render");
        let file = write_config(&rendered);
        let config = AppConfig::load_from_path(file.path()).expect("load rendered");
        assert_eq!(config.api.max_pages, DEFAULT_MAX_PAGES);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let mut api = ApiConfig::default();
        assert!(matches!(api.api_key(), Err(CoreError::MissingApiKey)));

        api.api_key = Some("   ".to_string());
        assert!(matches!(api.api_key(), Err(CoreError::MissingApiKey)));

        api.api_key = Some(" secret ".to_string());
        assert_eq!(api.api_key().expect("key present"), "secret");
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let api = ApiConfig {
            api_key: Some("super-secret".to_string()),
            ..ApiConfig::default()
        };
        let rendered = format!("{api:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn profile_override_replaces_profile() {
        let config = AppConfig::default().with_profile_override(Some("ci".to_string()));
        assert_eq!(config.profile, "ci");
        let config = config.with_profile_override(None);
        assert_eq!(config.profile, "ci");
    }
}
