//! Descriptor tables and topic routes for each `$SYS` metric family.

pub mod broker;
pub mod clients;
pub mod load;
pub mod messages;

use crate::descriptor::MetricDef;

/// Label attached to every metric to identify the monitored broker.
pub const BROKER_LABEL: &str = "broker";

/// Label names filled in by the exporter itself.
///
/// Constant labels must not reuse any of these, or a series would carry
/// the same label name twice.
pub fn reserved_label_names() -> Vec<&'static str> {
    let tables: [&[MetricDef]; 4] = [
        clients::METRICS,
        messages::METRICS,
        broker::METRICS,
        broker::SUBSCRIPTION_METRICS,
    ];

    let mut names = vec![BROKER_LABEL];
    for def in tables.iter().flat_map(|t| t.iter()) {
        if let Some(label) = def.variable_label {
            if !names.contains(&label) {
                names.push(label);
            }
        }
    }
    names
}
