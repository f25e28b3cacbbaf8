//! CLI argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::config::ExporterConfig;

/// Prometheus exporter for Mosquitto $SYS statistics.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "mosquitto-exporter")]
#[command(about = "Export Mosquitto $SYS broker statistics as Prometheus metrics")]
#[command(version)]
pub struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Broker connection string.
    #[arg(short, long)]
    pub broker: Option<String>,

    /// Client ID to use when connected to the broker.
    #[arg(long)]
    pub client_id: Option<String>,

    /// Username for broker authentication.
    #[arg(long, env = "MQTT_USERNAME")]
    pub username: Option<String>,

    /// Password for broker authentication.
    #[arg(long, env = "MQTT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Enable the clients collector.
    #[arg(long = "collector.clients")]
    pub collector_clients: bool,

    /// Enable the messages collector.
    #[arg(long = "collector.messages")]
    pub collector_messages: bool,

    /// Enable the load collector.
    #[arg(long = "collector.load")]
    pub collector_load: bool,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    pub listen: Option<String>,

    /// Metrics endpoint path (overrides config).
    #[arg(long)]
    pub path: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Load the configuration file, if any, and apply CLI overrides.
    pub fn into_config(self) -> anyhow::Result<ExporterConfig> {
        let mut config = match &self.config {
            Some(path) => ExporterConfig::load_from_file(path)?,
            None => ExporterConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Override configuration values with the ones given on the command line.
    ///
    /// Collector flags only ever enable a collector.
    pub fn apply(&self, config: &mut ExporterConfig) {
        if let Some(broker) = &self.broker {
            config.mqtt.broker = broker.clone();
        }
        if let Some(client_id) = &self.client_id {
            config.mqtt.client_id = client_id.clone();
        }
        if let Some(username) = &self.username {
            config.mqtt.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.mqtt.password = Some(password.clone());
        }

        config.collectors.clients |= self.collector_clients;
        config.collectors.messages |= self.collector_messages;
        config.collectors.load |= self.collector_load;

        if let Some(listen) = &self.listen {
            config.prometheus.listen = listen.clone();
        }
        if let Some(path) = &self.path {
            config.prometheus.path = path.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}
