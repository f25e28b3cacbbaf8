//! Message throughput and retained store counters.

use crate::collector::{Collector, Route};
use crate::descriptor::{MetricDef, build_table};
use crate::handler;

pub const NAME: &str = "messages";

pub const MESSAGES_TOPIC: &str = "$SYS/broker/messages/#";
pub const STORE_TOPIC: &str = "$SYS/broker/store/messages/#";

pub const METRICS: &[MetricDef] = &[
    MetricDef::counter(
        "received",
        "mosquitto_received_messages_count",
        "Number of received messages",
    ),
    MetricDef::counter(
        "sent",
        "mosquitto_sent_messages_count",
        "Number of sent messages",
    ),
    MetricDef::gauge(
        "stored_count",
        "mosquitto_stored_messages_count",
        "Number of stored messages",
    ),
    MetricDef::gauge(
        "stored_bytes",
        "mosquitto_stored_messages_bytes",
        "Stored messages size in bytes",
    ),
    MetricDef::gauge(
        "inflight",
        "mosquitto_inflight_messages_gauge",
        "Number of inflight messages",
    ),
];

/// Build the messages collector.
pub fn collector(labels: &[(String, String)]) -> Collector {
    Collector::new(
        NAME,
        build_table(METRICS, labels),
        vec![
            Route::new(MESSAGES_TOPIC, handler::messages),
            Route::new(STORE_TOPIC, handler::stored_messages),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::MetricKind;
    use crate::handler::ParsedValue;

    #[test]
    fn test_stored_bytes_end_to_end() {
        let collector = collector(&[]);
        collector.handle("$SYS/broker/store/messages/bytes", b"1024");

        assert_eq!(
            collector.store().get("stored_bytes"),
            Some(ParsedValue::Numeric(1024.0))
        );
        let sample = collector
            .snapshot()
            .into_iter()
            .find(|s| s.descriptor.name == "mosquitto_stored_messages_bytes")
            .unwrap();
        assert_eq!(sample.value, 1024.0);
    }

    #[test]
    fn test_plain_counters_keep_last_segment() {
        let collector = collector(&[]);
        collector.handle("$SYS/broker/messages/received", b"5");
        collector.handle("$SYS/broker/messages/received", b"7");
        collector.handle("$SYS/broker/messages/inflight", b"2");

        assert_eq!(
            collector.store().get("received"),
            Some(ParsedValue::Numeric(7.0))
        );
        assert_eq!(
            collector.store().get("inflight"),
            Some(ParsedValue::Numeric(2.0))
        );
    }

    #[test]
    fn test_counter_kinds() {
        let collector = collector(&[]);
        let kinds: Vec<MetricKind> = collector.descriptors().iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MetricKind::Counter,
                MetricKind::Counter,
                MetricKind::Gauge,
                MetricKind::Gauge,
                MetricKind::Gauge
            ]
        );
    }
}
