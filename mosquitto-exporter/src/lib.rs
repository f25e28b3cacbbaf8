//! Prometheus exporter for Mosquitto `$SYS` broker statistics.
//!
//! This crate connects to an MQTT broker, subscribes to its `$SYS/broker/#`
//! statistics topics and exposes them via an HTTP `/metrics` endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │  MQTT broker    │────>│   Collectors    │────>│   HTTP Server   │
//! │ ($SYS/broker/#) │     │  (last value)   │     │   (/metrics)    │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! mosquitto-exporter -b tcp://127.0.0.1:1883 --collector.clients --collector.load
//! mosquitto-exporter --config exporter.json5
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod args;
pub mod config;
pub mod http;
pub mod mqtt;

pub use args::Args;
pub use config::ExporterConfig;
pub use http::{HttpServer, SharedRegistry};
pub use mqtt::{BrokerAddress, MqttSession, SessionError};
