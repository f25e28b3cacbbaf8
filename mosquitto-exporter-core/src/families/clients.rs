//! Connected, active and historical client counts.

use crate::collector::{Collector, Route};
use crate::descriptor::{MetricDef, build_table};
use crate::handler;

pub const NAME: &str = "clients";

pub const TOPIC: &str = "$SYS/broker/clients/#";

pub const METRICS: &[MetricDef] = &[
    MetricDef::gauge(
        "active",
        "mosquitto_active_clients_count",
        "Number of active clients",
    ),
    MetricDef::gauge(
        "connected",
        "mosquitto_connected_clients_count",
        "Number of connected clients",
    ),
    MetricDef::gauge(
        "disconnected",
        "mosquitto_disconnected_clients_count",
        "Number of disconnected clients",
    ),
    MetricDef::gauge(
        "expired",
        "mosquitto_expired_clients_count",
        "Number of expired clients",
    ),
    MetricDef::gauge(
        "inactive",
        "mosquitto_inactive_clients_count",
        "Number of inactive clients",
    ),
    MetricDef::gauge(
        "maximum",
        "mosquitto_maximum_clients_count",
        "Maximum number of simultaneously connected clients",
    ),
    MetricDef::gauge(
        "total",
        "mosquitto_total_clients_count",
        "Total number of clients",
    ),
];

/// Build the clients collector.
pub fn collector(labels: &[(String, String)]) -> Collector {
    Collector::new(
        NAME,
        build_table(METRICS, labels),
        vec![Route::new(TOPIC, handler::clients)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_clients_end_to_end() {
        let collector = collector(&[]);
        collector.handle("$SYS/broker/clients/active", b"42");

        let sample = collector
            .snapshot()
            .into_iter()
            .find(|s| s.descriptor.store_key == "active")
            .unwrap();
        assert_eq!(sample.descriptor.name, "mosquitto_active_clients_count");
        assert_eq!(sample.value, 42.0);
    }

    #[test]
    fn test_table_has_every_client_metric() {
        let collector = collector(&[]);
        let keys: Vec<&str> = collector
            .descriptors()
            .iter()
            .map(|d| d.store_key.as_str())
            .collect();
        assert_eq!(
            keys,
            vec![
                "active",
                "connected",
                "disconnected",
                "expired",
                "inactive",
                "maximum",
                "total"
            ]
        );
    }
}
