//! Moving averages published under `$SYS/broker/load`.
//!
//! The broker publishes each average under a period suffix
//! (`.../load/connections/1min`), which is the store key, while the exported
//! metrics follow the `load1`/`load5`/`load15` naming.

use crate::collector::{Collector, Route};
use crate::descriptor::{Descriptor, MetricKind};
use crate::handler;

pub const NAME: &str = "load";

pub const TOPIC: &str = "$SYS/broker/load/#";

/// Averaging window of a load metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPeriod {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
}

impl LoadPeriod {
    pub const ALL: [LoadPeriod; 3] = [
        LoadPeriod::OneMinute,
        LoadPeriod::FiveMinutes,
        LoadPeriod::FifteenMinutes,
    ];

    /// Topic suffix published by the broker.
    pub fn topic_suffix(&self) -> &'static str {
        match self {
            LoadPeriod::OneMinute => "1min",
            LoadPeriod::FiveMinutes => "5min",
            LoadPeriod::FifteenMinutes => "15min",
        }
    }

    /// Suffix of the exported metric name.
    pub fn metric_suffix(&self) -> &'static str {
        match self {
            LoadPeriod::OneMinute => "load1",
            LoadPeriod::FiveMinutes => "load5",
            LoadPeriod::FifteenMinutes => "load15",
        }
    }
}

/// Load families and their help text.
pub const FAMILIES: &[(&str, &str)] = &[
    (
        "connections",
        "The moving average of the number of connections opened to the broker",
    ),
    (
        "sockets",
        "The moving average of the number of socket connections opened to the broker",
    ),
    (
        "bytes_received",
        "The moving average of the number of bytes received by the broker",
    ),
    (
        "bytes_sent",
        "The moving average of the number of bytes sent by the broker",
    ),
    (
        "messages_received",
        "The moving average of the number of messages received by the broker",
    ),
    (
        "messages_sent",
        "The moving average of the number of messages sent by the broker",
    ),
    (
        "publish_received",
        "The moving average of the number of publish messages received by the broker",
    ),
    (
        "publish_sent",
        "The moving average of the number of publish messages sent by the broker",
    ),
    (
        "publish_dropped",
        "The moving average of the number of publish messages dropped by the broker",
    ),
];

/// Store key for a family and period, e.g. `connections_15min`.
pub fn store_key(family: &str, period: LoadPeriod) -> String {
    family.to_string() + "_" + period.topic_suffix()
}

/// Exported name for a family and period, e.g. `mosquitto_connections_load15`.
pub fn metric_name(family: &str, period: LoadPeriod) -> String {
    "mosquitto_".to_string() + family + "_" + period.metric_suffix()
}

/// Three descriptors per family, one per period.
fn descriptors(labels: &[(String, String)]) -> Vec<Descriptor> {
    FAMILIES
        .iter()
        .flat_map(|(family, help)| {
            LoadPeriod::ALL.into_iter().map(move |period| Descriptor {
                store_key: store_key(family, period),
                name: metric_name(family, period),
                help: help.to_string(),
                kind: MetricKind::Gauge,
                const_labels: labels.to_vec(),
                variable_label: None,
            })
        })
        .collect()
}

/// Build the load collector.
pub fn collector(labels: &[(String, String)]) -> Collector {
    Collector::new(
        NAME,
        descriptors(labels),
        vec![Route::new(TOPIC, handler::load)],
    )
}
