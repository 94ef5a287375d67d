//! Configuration for the channel claim CDC service.
//!
//! Loads configuration from a TOML file with environment variable substitution.
//!
//! # Example
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [event_bus]
//! endpoint = "${EVENT_BUS_ENDPOINT}"
//! bus_name = "customer-events"
//!
//! [events]
//! claim_id_namespace = "https://api.nva.unit.no/customer/channel-claim"
//! ```

use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::customer::EventSynthesizer;
use crate::messaging::{PublisherSettings, MAX_BATCH_ENTRIES};
use crate::utils::RetryConfig;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "CHANNEL_CLAIM_CDC_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config/channel-claim-cdc.toml";

static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub event_bus: EventBusConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventBusConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_bus_name")]
    pub bus_name: String,

    #[serde(default = "default_source")]
    pub source: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_batch_entries")]
    pub max_batch_entries: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            bus_name: default_bus_name(),
            source: default_source(),
            timeout_ms: default_timeout_ms(),
            max_batch_entries: default_max_batch_entries(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:4566".to_string()
}

fn default_bus_name() -> String {
    "default".to_string()
}

fn default_source() -> String {
    "customer.channel-claims".to_string()
}

fn default_timeout_ms() -> u64 {
    10000
}

fn default_max_batch_entries() -> usize {
    MAX_BATCH_ENTRIES
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventsConfig {
    /// Prefix of the synthesized claim resource ids
    #[serde(default = "default_claim_id_namespace")]
    pub claim_id_namespace: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            claim_id_namespace: default_claim_id_namespace(),
        }
    }
}

fn default_claim_id_namespace() -> String {
    "https://api.nva.unit.no/customer/channel-claim".to_string()
}

/// Host-level retry of whole invocations (replay mode)
#[derive(Debug, Deserialize, Clone)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    5000
}

impl AppConfig {
    /// Load configuration from the default path or CHANNEL_CLAIM_CDC_CONFIG.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            info!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        info!(path = %path.display(), "Loading configuration");

        let content = fs::read_to_string(path)?;
        let config = Self::parse(&substitute_env_vars(&content))?;

        info!(
            endpoint = %config.event_bus.endpoint,
            bus_name = %config.event_bus.bus_name,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Parse and validate an already substituted TOML document.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        debug!("Parsing TOML configuration");
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = &self.event_bus.endpoint;

        if endpoint.contains("${") {
            warn!(
                endpoint = %endpoint,
                "Event bus endpoint contains unsubstituted environment variable"
            );
        }

        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "event_bus.endpoint {endpoint:?} must start with http:// or https://"
            )));
        }

        if self.event_bus.bus_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "event_bus.bus_name cannot be empty".to_string(),
            ));
        }

        if !(1..=MAX_BATCH_ENTRIES).contains(&self.event_bus.max_batch_entries) {
            return Err(ConfigError::ValidationError(format!(
                "event_bus.max_batch_entries must be between 1 and {MAX_BATCH_ENTRIES}"
            )));
        }

        self.synthesizer()?;

        Ok(())
    }

    pub fn synthesizer(&self) -> Result<EventSynthesizer, ConfigError> {
        EventSynthesizer::new(&self.events.claim_id_namespace).map_err(|e| {
            ConfigError::ValidationError(format!("events.claim_id_namespace: {e}"))
        })
    }

    pub fn publisher_settings(&self) -> PublisherSettings {
        PublisherSettings {
            event_bus_name: self.event_bus.bus_name.clone(),
            source: self.event_bus.source.clone(),
            max_batch_entries: self.event_bus.max_batch_entries,
        }
    }

    pub fn bus_timeout(&self) -> Duration {
        Duration::from_millis(self.event_bus.timeout_ms)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry.max_attempts,
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
            ..RetryConfig::default()
        }
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(content: &str) -> String {
    ENV_PLACEHOLDER
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    debug!(var = %var_name, "Environment variable not set, keeping placeholder");
                    caps[0].to_string()
                }
            }
        })
        .to_string()
}
