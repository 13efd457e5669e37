//! Configuration management
//!
//! Configuration is read from the same environment variables the cloud
//! controller has always used, or from a TOML file with the same fields
//! for local runs.

use serde::{Deserialize, Deserializer, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::client::{HcloudClientConfig, RobotClientConfig};
use crate::error::{Error, Result};

pub const HCLOUD_TOKEN_ENV: &str = "HCLOUD_TOKEN";
pub const HCLOUD_ENDPOINT_ENV: &str = "HCLOUD_ENDPOINT";
pub const HCLOUD_NETWORK_ENV: &str = "HCLOUD_NETWORK";
pub const HCLOUD_DEBUG_ENV: &str = "HCLOUD_DEBUG";
pub const HCLOUD_LOAD_BALANCERS_ENABLED_ENV: &str = "HCLOUD_LOAD_BALANCERS_ENABLED";
pub const NODE_NAME_ENV: &str = "NODE_NAME";
pub const HROBOT_USER_ENV: &str = "HROBOT_USER";
pub const HROBOT_PASS_ENV: &str = "HROBOT_PASS";
pub const HROBOT_ENDPOINT_ENV: &str = "HROBOT_ENDPOINT";
pub const HROBOT_PERIOD_ENV: &str = "HROBOT_PERIOD";
pub const HCLOUD_LOG_LEVEL_ENV: &str = "HCLOUD_LOG_LEVEL";
pub const HCLOUD_LOG_FORMAT_ENV: &str = "HCLOUD_LOG_FORMAT";
pub const HCLOUD_METRICS_ADDRESS_ENV: &str = "HCLOUD_METRICS_ADDRESS";

/// Address the metrics endpoint listens on unless configured otherwise
pub const DEFAULT_METRICS_ADDRESS: &str = "0.0.0.0:8233";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["text", "json"];

/// Inventory polling period used when none (or an invalid one) is configured
pub const DEFAULT_POLL_PERIOD_SECS: u64 = 180;

/// Required length of a cloud API token
pub const HCLOUD_TOKEN_LEN: usize = 64;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name of the node this process runs on
    pub node_name: String,

    /// Cloud API configuration
    pub hcloud: HcloudConfig,

    /// Inventory API configuration
    pub robot: RobotConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Listen address of the Prometheus endpoint; empty disables it
    #[serde(default = "default_metrics_address")]
    pub metrics_address: String,
}

/// Cloud API configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct HcloudConfig {
    /// API token
    pub token: String,

    /// Endpoint override
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Private network ID or name
    #[serde(default)]
    pub network: Option<String>,

    /// Log API traffic
    #[serde(default)]
    pub debug: bool,

    /// Whether load balancer support is offered to the orchestrator
    #[serde(default = "default_true")]
    pub load_balancers_enabled: bool,
}

/// Inventory API configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Web service user
    pub user: String,

    /// Web service password
    pub password: String,

    /// Endpoint override
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Polling period in seconds
    #[serde(default = "default_period", deserialize_with = "deserialize_period")]
    pub period_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl LoggingConfig {
    /// Apply command line overrides; `verbose` forces debug level
    #[must_use]
    pub fn with_overrides(&self, format: Option<&str>, verbose: bool) -> Self {
        Self {
            level: if verbose {
                String::from("debug")
            } else {
                self.level.clone()
            },
            format: format.map_or_else(|| self.format.clone(), str::to_string),
        }
    }

    /// `EnvFilter` directive for this configuration
    pub fn filter_directive(&self) -> String {
        format!("hcloud_resolver={},warn", self.level)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_period() -> u64 {
    DEFAULT_POLL_PERIOD_SECS
}

fn default_metrics_address() -> String {
    DEFAULT_METRICS_ADDRESS.to_string()
}

// Same fallback as the environment: zero or negative means the default
fn deserialize_period<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = i64::deserialize(deserializer)?;
    Ok(normalize_period(secs))
}

fn normalize_period(secs: i64) -> u64 {
    u64::try_from(secs)
        .ok()
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_POLL_PERIOD_SECS)
}

/// Parse a polling period; anything but a positive integer means the default
pub fn parse_period(value: Option<&str>) -> u64 {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map_or(DEFAULT_POLL_PERIOD_SECS, normalize_period)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::config(format!("environment variable {key:?} is required")))
        };

        let token = required(HCLOUD_TOKEN_ENV)?;
        let node_name = required(NODE_NAME_ENV)?;
        let user = required(HROBOT_USER_ENV)?;
        let password = required(HROBOT_PASS_ENV)?;

        let config = Self {
            node_name,
            hcloud: HcloudConfig {
                token,
                endpoint: lookup(HCLOUD_ENDPOINT_ENV).filter(|v| !v.is_empty()),
                network: lookup(HCLOUD_NETWORK_ENV),
                debug: lookup(HCLOUD_DEBUG_ENV).as_deref() == Some("true"),
                load_balancers_enabled: lookup(HCLOUD_LOAD_BALANCERS_ENABLED_ENV).as_deref()
                    != Some("false"),
            },
            robot: RobotConfig {
                user,
                password,
                endpoint: lookup(HROBOT_ENDPOINT_ENV).filter(|v| !v.is_empty()),
                period_secs: parse_period(lookup(HROBOT_PERIOD_ENV).as_deref()),
            },
            logging: LoggingConfig {
                level: lookup(HCLOUD_LOG_LEVEL_ENV).unwrap_or_else(|| String::from("info")),
                format: lookup(HCLOUD_LOG_FORMAT_ENV).unwrap_or_else(|| String::from("text")),
            },
            metrics_address: lookup(HCLOUD_METRICS_ADDRESS_ENV)
                .unwrap_or_else(default_metrics_address),
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            Error::config(format!("failed to parse config file {}: {e}", path.display()))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.hcloud.token.len() != HCLOUD_TOKEN_LEN {
            return Err(Error::config(format!(
                "entered token is invalid (must be exactly {HCLOUD_TOKEN_LEN} characters long)"
            )));
        }

        if self.node_name.is_empty() {
            return Err(Error::config("node name must not be empty"));
        }

        if self.robot.user.is_empty() || self.robot.password.is_empty() {
            return Err(Error::config("inventory credentials must not be empty"));
        }

        for endpoint in [&self.hcloud.endpoint, &self.robot.endpoint].into_iter().flatten() {
            url::Url::parse(endpoint)
                .map_err(|e| Error::config(format!("invalid endpoint {endpoint:?}: {e}")))?;
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(Error::config(format!(
                "invalid log level {:?} (expected one of {})",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(Error::config(format!(
                "invalid log format {:?} (expected one of {})",
                self.logging.format,
                LOG_FORMATS.join(", ")
            )));
        }

        self.metrics_addr()?;

        Ok(())
    }

    /// Parsed metrics listen address, `None` when the endpoint is disabled
    pub fn metrics_addr(&self) -> Result<Option<SocketAddr>> {
        let address = self.metrics_address.trim();
        if address.is_empty() {
            return Ok(None);
        }

        address
            .parse()
            .map(Some)
            .map_err(|e| Error::config(format!("invalid metrics address {address:?}: {e}")))
    }

    /// Inventory polling period
    #[must_use]
    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(self.robot.period_secs)
    }

    /// Cloud API client configuration
    pub fn hcloud_client_config(&self) -> HcloudClientConfig {
        let mut client = HcloudClientConfig::new(self.hcloud.token.clone()).with_debug(self.hcloud.debug);
        if let Some(endpoint) = &self.hcloud.endpoint {
            client = client.with_endpoint(endpoint.clone());
        }
        client
    }

    /// Inventory API client configuration
    pub fn robot_client_config(&self) -> RobotClientConfig {
        let mut client = RobotClientConfig::new(self.robot.user.clone(), self.robot.password.clone());
        if let Some(endpoint) = &self.robot.endpoint {
            client = client.with_endpoint(endpoint.clone());
        }
        client
    }
}

impl std::fmt::Debug for HcloudConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HcloudConfig")
            .field("token", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("network", &self.network)
            .field("debug", &self.debug)
            .field("load_balancers_enabled", &self.load_balancers_enabled)
            .finish()
    }
}

impl std::fmt::Debug for RobotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RobotConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("period_secs", &self.period_secs)
            .finish()
    }
}
