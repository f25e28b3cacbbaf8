//! Configuration for the Mosquitto exporter.

use std::collections::BTreeMap;
use std::path::Path;

use mosquitto_exporter_core::CollectorOptions;
use mosquitto_exporter_core::exposition::sanitize_label_name;
use mosquitto_exporter_core::families::{BROKER_LABEL, reserved_label_names};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mqtt::BrokerAddress;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Broker connection settings.
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Which collectors are enabled.
    #[serde(default)]
    pub collectors: CollectorOptions,

    /// Prometheus exporter settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// MQTT broker connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Broker connection string (default: "tcp://127.0.0.1:1883").
    #[serde(default = "default_broker")]
    pub broker: String,

    /// Client ID to use when connected to the broker.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// MQTT keep-alive interval (seconds).
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    /// How long to wait for the broker to acknowledge subscriptions (seconds).
    #[serde(default = "default_subscribe_timeout")]
    pub subscribe_timeout_secs: u64,

    /// Pause between reconnection attempts (seconds).
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
}

fn default_broker() -> String {
    "tcp://127.0.0.1:1883".to_string()
}

fn default_client_id() -> String {
    "mosquitto-exporter".to_string()
}

fn default_keep_alive() -> u64 {
    30
}

fn default_subscribe_timeout() -> u64 {
    10
}

fn default_reconnect_delay() -> u64 {
    5
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker: default_broker(),
            client_id: default_client_id(),
            username: None,
            password: None,
            keep_alive_secs: default_keep_alive(),
            subscribe_timeout_secs: default_subscribe_timeout(),
            reconnect_delay_secs: default_reconnect_delay(),
        }
    }
}

/// Prometheus HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Address to listen on (default: "0.0.0.0:2112").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for metrics endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,

    /// Extra labels added to every broker metric.
    #[serde(default)]
    pub default_labels: BTreeMap<String, String>,
}

fn default_listen() -> String {
    "0.0.0.0:2112".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
            default_labels: BTreeMap::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mqtt
            .broker
            .parse::<BrokerAddress>()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        if self.mqtt.client_id.is_empty() {
            return Err(ConfigError::Validation(
                "client_id must not be empty".to_string(),
            ));
        }

        if self.mqtt.keep_alive_secs == 0 {
            return Err(ConfigError::Validation(
                "keep_alive_secs must be > 0".to_string(),
            ));
        }

        if self.mqtt.subscribe_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "subscribe_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.mqtt.reconnect_delay_secs == 0 {
            return Err(ConfigError::Validation(
                "reconnect_delay_secs must be > 0".to_string(),
            ));
        }

        if self.mqtt.password.is_some() && self.mqtt.username.is_none() {
            return Err(ConfigError::Validation(
                "password requires a username".to_string(),
            ));
        }

        if self
            .prometheus
            .listen
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::Validation(format!(
                "Invalid listen address: {}",
                self.prometheus.listen
            )));
        }

        if !self.prometheus.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        let reserved = reserved_label_names();
        for name in self.prometheus.default_labels.keys() {
            if sanitize_label_name(name) != *name {
                return Err(ConfigError::Validation(format!(
                    "Invalid label name: {}",
                    name
                )));
            }
            if reserved.contains(&name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "Reserved label name: {}",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Labels attached to every broker metric: the broker address first,
    /// then the configured default labels.
    ///
    /// Assumes a validated configuration, which never carries reserved names.
    pub fn const_labels(&self) -> Vec<(String, String)> {
        let mut labels = vec![(BROKER_LABEL.to_string(), self.mqtt.broker.clone())];
        labels.extend(
            self.prometheus
                .default_labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        labels
    }
}
