//! Configuration management using the prefer crate for file discovery.
//!
//! Precedence, lowest to highest: built-in defaults, the config file,
//! environment variables, command-line flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::arcgis::QueryOptions;

/// Name used for config file discovery (`arcgis-connector.toml`, ...).
pub const CONFIG_NAME: &str = "arcgis-connector";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
/// Transport-level timeout for outbound calls.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
/// Attribute holding the district name in tradeoff results.
pub const DEFAULT_DISTRICT_NAME_FIELD: &str = "D_NAME_EN";

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    /// Interface the HTTP server binds to.
    pub host: String,
    pub port: u16,
    /// Outbound request timeout in seconds.
    pub request_timeout_secs: u64,
    /// User agent for outbound requests.
    pub user_agent: String,
    /// Result cap for feature queries.
    pub result_record_count: u32,
    /// Page size for portal item searches.
    pub search_page_size: u32,
    /// Half-width in degrees of the nearest-facility search envelope.
    pub nearest_buffer_degrees: f64,
    pub district_name_field: String,
}

impl Default for Settings {
    fn default() -> Self {
        let options = QueryOptions::default();
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: format!("arcgis-connector/{}", env!("CARGO_PKG_VERSION")),
            result_record_count: options.result_record_count,
            search_page_size: options.search_page_size,
            nearest_buffer_degrees: options.nearest_buffer_degrees,
            district_name_field: DEFAULT_DISTRICT_NAME_FIELD.to_string(),
        }
    }
}

impl Settings {
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            result_record_count: self.result_record_count,
            search_page_size: self.search_page_size,
            nearest_buffer_degrees: self.nearest_buffer_degrees,
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `ARCGIS_CONNECTOR_HOST`
    /// - `ARCGIS_CONNECTOR_PORT`, or `PORT`
    /// - `ARCGIS_CONNECTOR_TIMEOUT`: seconds
    /// - `ARCGIS_CONNECTOR_USER_AGENT`
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok());
        self
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("ARCGIS_CONNECTOR_HOST") {
            self.host = host;
        }
        let port = lookup("ARCGIS_CONNECTOR_PORT").or_else(|| lookup("PORT"));
        if let Some(port) = port {
            match port.trim().parse() {
                Ok(port) => self.port = port,
                Err(_) => warn!("Ignoring invalid port override: {}", port),
            }
        }
        if let Some(timeout) = lookup("ARCGIS_CONNECTOR_TIMEOUT") {
            match timeout.trim().parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(_) => warn!("Ignoring invalid timeout override: {}", timeout),
            }
        }
        if let Some(user_agent) = lookup("ARCGIS_CONNECTOR_USER_AGENT") {
            self.user_agent = user_agent;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.result_record_count == 0 {
            return Err("result_record_count must be at least 1".to_string());
        }
        if self.search_page_size == 0 {
            return Err("search_page_size must be at least 1".to_string());
        }
        if !(self.nearest_buffer_degrees.is_finite() && self.nearest_buffer_degrees > 0.0) {
            return Err("nearest_buffer_degrees must be a positive number".to_string());
        }
        if self.district_name_field.trim().is_empty() {
            return Err("district_name_field must not be empty".to_string());
        }
        Ok(())
    }
}

/// Configuration file structure. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_record_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearest_buffer_degrees: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district_name_field: Option<String>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults when no file is found or it fails to parse.
    pub async fn load() -> Self {
        match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            warn!("{}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        if let Some(ref host) = self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout_secs = timeout;
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = user_agent.clone();
        }
        if let Some(count) = self.result_record_count {
            settings.result_record_count = count;
        }
        if let Some(size) = self.search_page_size {
            settings.search_page_size = size;
        }
        if let Some(buffer) = self.nearest_buffer_degrees {
            settings.nearest_buffer_degrees = buffer;
        }
        if let Some(ref field) = self.district_name_field {
            settings.district_name_field = field.clone();
        }
    }
}

/// Load settings from an explicit config file, or a discovered one, then
/// apply environment overrides.
pub async fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path)
            .await
            .map_err(anyhow::Error::msg)?,
        None => Config::load().await,
    };

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings);
    let settings = settings.with_env_overrides();
    settings.validate().map_err(anyhow::Error::msg)?;
    Ok(settings)
}
