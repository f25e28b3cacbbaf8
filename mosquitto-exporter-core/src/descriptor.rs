//! Static metric metadata.

/// Prometheus metric kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    /// Get the TYPE comment string for Prometheus exposition format.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

/// One row of a collector's static descriptor table.
#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    /// Store key the metric is read from.
    pub key: &'static str,
    /// Exported metric name.
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    /// Label carrying a string value from the store (only the version metric).
    pub variable_label: Option<&'static str>,
}

impl MetricDef {
    pub const fn gauge(key: &'static str, name: &'static str, help: &'static str) -> Self {
        Self {
            key,
            name,
            help,
            kind: MetricKind::Gauge,
            variable_label: None,
        }
    }

    pub const fn counter(key: &'static str, name: &'static str, help: &'static str) -> Self {
        Self {
            key,
            name,
            help,
            kind: MetricKind::Counter,
            variable_label: None,
        }
    }

    /// Attach a label whose value comes from the store.
    pub const fn with_variable_label(mut self, label: &'static str) -> Self {
        self.variable_label = Some(label);
        self
    }
}

/// Constant labels attached to every descriptor of a process.
pub type ConstLabels = Vec<(String, String)>;

/// Immutable description of one exported metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    /// Key looked up in the owning collector's store.
    pub store_key: String,
    /// The full Prometheus metric name.
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    /// Labels fixed at construction (broker address, configured defaults).
    pub const_labels: ConstLabels,
    pub variable_label: Option<String>,
}

impl Descriptor {
    /// Build a descriptor from a table row and the process-wide labels.
    pub fn from_def(def: &MetricDef, labels: &[(String, String)]) -> Self {
        Self {
            store_key: def.key.to_string(),
            name: def.name.to_string(),
            help: def.help.to_string(),
            kind: def.kind,
            const_labels: labels.to_vec(),
            variable_label: def.variable_label.map(str::to_string),
        }
    }

    /// All label names in rendering order.
    pub fn label_names(&self) -> Vec<&str> {
        self.const_labels
            .iter()
            .map(|(k, _)| k.as_str())
            .chain(self.variable_label.as_deref())
            .collect()
    }
}

/// Build a descriptor set from a static table.
pub fn build_table(defs: &[MetricDef], labels: &[(String, String)]) -> Vec<Descriptor> {
    defs.iter().map(|d| Descriptor::from_def(d, labels)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broker_labels() -> ConstLabels {
        vec![("broker".to_string(), "tcp://127.0.0.1:1883".to_string())]
    }

    #[test]
    fn test_descriptor_from_def_appends_labels() {
        let def = MetricDef::gauge("active", "mosquitto_active_clients_count", "Active");
        let desc = Descriptor::from_def(&def, &broker_labels());

        assert_eq!(desc.store_key, "active");
        assert_eq!(desc.name, "mosquitto_active_clients_count");
        assert_eq!(desc.kind, MetricKind::Gauge);
        assert_eq!(desc.label_names(), vec!["broker"]);
    }

    #[test]
    fn test_variable_label_is_last() {
        let def = MetricDef::gauge("version", "mosquitto_version_info", "Version")
            .with_variable_label("version");
        let desc = Descriptor::from_def(&def, &broker_labels());

        assert_eq!(desc.label_names(), vec!["broker", "version"]);
    }

    #[test]
    fn test_kind_as_str() {
        assert_eq!(MetricKind::Counter.as_str(), "counter");
        assert_eq!(MetricKind::Gauge.as_str(), "gauge");
    }
}
