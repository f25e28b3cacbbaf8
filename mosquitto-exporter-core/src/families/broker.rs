//! Broker-wide metrics: uptime, version and subscription counts.
//!
//! Brokers differ in which of these topics they publish: older Mosquitto
//! releases have no shared subscriptions, so the subscription counts can be
//! turned off.

use crate::collector::{Collector, Route};
use crate::descriptor::{MetricDef, build_table};
use crate::handler;

pub const NAME: &str = "broker";

pub const UPTIME_TOPIC: &str = "$SYS/broker/uptime";
pub const VERSION_TOPIC: &str = "$SYS/broker/version";
pub const SUBSCRIPTIONS_TOPIC: &str = "$SYS/broker/subscriptions/count";
pub const SHARED_SUBSCRIPTIONS_TOPIC: &str = "$SYS/broker/shared_subscriptions/count";

pub const METRICS: &[MetricDef] = &[
    MetricDef::counter(
        "uptime",
        "mosquitto_uptime_seconds",
        "Seconds since the broker was started",
    ),
    MetricDef::gauge("version", "mosquitto_version_info", "Mosquitto version")
        .with_variable_label("version"),
];

pub const SUBSCRIPTION_METRICS: &[MetricDef] = &[
    MetricDef::gauge(
        "subscriptions_total",
        "mosquitto_subscriptions_total",
        "Number of active subscriptions",
    ),
    MetricDef::gauge(
        "shared_subscriptions_total",
        "mosquitto_shared_subscriptions_total",
        "Number of active shared subscriptions",
    ),
];

/// Build the broker collector, optionally with subscription counts.
pub fn collector(labels: &[(String, String)], subscription_counts: bool) -> Collector {
    let mut descriptors = build_table(METRICS, labels);
    let mut routes = vec![
        Route::new(UPTIME_TOPIC, handler::uptime),
        Route::new(VERSION_TOPIC, handler::version),
    ];

    if subscription_counts {
        descriptors.extend(build_table(SUBSCRIPTION_METRICS, labels));
        routes.push(Route::new(SUBSCRIPTIONS_TOPIC, handler::subscriptions));
        routes.push(Route::new(
            SHARED_SUBSCRIPTIONS_TOPIC,
            handler::shared_subscriptions,
        ));
    }

    Collector::new(NAME, descriptors, routes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uptime_and_version_end_to_end() {
        let collector = collector(&[], true);
        collector.handle(UPTIME_TOPIC, b"12345 seconds");
        collector.handle(VERSION_TOPIC, b"mosquitto version 2.0.15");

        let snapshot = collector.snapshot();
        assert_eq!(snapshot[0].descriptor.name, "mosquitto_uptime_seconds");
        assert_eq!(snapshot[0].value, 12345.0);
        assert_eq!(snapshot[1].descriptor.name, "mosquitto_version_info");
        assert_eq!(snapshot[1].value, 1.0);
        assert_eq!(snapshot[1].label_value.as_deref(), Some("2.0.15"));
    }

    #[test]
    fn test_subscription_counts_variant() {
        let full = collector(&[], true);
        assert_eq!(full.descriptors().len(), 4);
        assert_eq!(full.routes().len(), 4);

        full.handle(SHARED_SUBSCRIPTIONS_TOPIC, b"3");
        let shared = full
            .snapshot()
            .into_iter()
            .find(|s| s.descriptor.name == "mosquitto_shared_subscriptions_total")
            .unwrap();
        assert_eq!(shared.value, 3.0);

        let reduced = collector(&[], false);
        assert_eq!(reduced.descriptors().len(), 2);
        assert!(!reduced.handle(SUBSCRIPTIONS_TOPIC, b"3"));
    }
}
