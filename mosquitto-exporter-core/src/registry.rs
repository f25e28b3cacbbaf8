//! The set of enabled collectors and the scrape-facing facade over them.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::collector::{Collector, CollectorStats, Sample};
use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::exposition;
use crate::families::{broker, clients, load, messages};
use crate::source::SubscriptionSource;

/// Which collectors to build. The broker collector is always enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorOptions {
    /// Enable the clients collector.
    #[serde(default)]
    pub clients: bool,

    /// Enable the messages collector.
    #[serde(default)]
    pub messages: bool,

    /// Enable the load collector.
    #[serde(default)]
    pub load: bool,

    /// Export subscription and shared subscription counts from the broker
    /// collector. Disable for brokers that do not publish those topics.
    #[serde(default = "default_subscription_counts")]
    pub subscription_counts: bool,
}

fn default_subscription_counts() -> bool {
    true
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            clients: false,
            messages: false,
            load: false,
            subscription_counts: default_subscription_counts(),
        }
    }
}

/// Enabled collectors, built once at startup.
#[derive(Debug)]
pub struct Registry {
    collectors: Vec<Collector>,
}

impl Registry {
    /// Build exactly the collectors enabled in `options`.
    ///
    /// `labels` are attached to every exported metric.
    pub fn new(options: &CollectorOptions, labels: &[(String, String)]) -> Self {
        let mut collectors = Vec::with_capacity(4);

        if options.clients {
            collectors.push(clients::collector(labels));
        }
        if options.messages {
            collectors.push(messages::collector(labels));
        }
        if options.load {
            collectors.push(load::collector(labels));
        }
        collectors.push(broker::collector(labels, options.subscription_counts));

        info!(
            collectors = ?collectors.iter().map(Collector::name).collect::<Vec<_>>(),
            "Collector registry built"
        );

        Self { collectors }
    }

    /// Build a registry from explicit collectors.
    pub fn from_collectors(collectors: Vec<Collector>) -> Self {
        Self { collectors }
    }

    pub fn collectors(&self) -> &[Collector] {
        &self.collectors
    }

    /// Look up a collector by name.
    pub fn collector(&self, name: &str) -> Option<&Collector> {
        self.collectors.iter().find(|c| c.name() == name)
    }

    /// Subscribe every collector. The first rejection aborts the whole set.
    pub fn subscribe(&self, source: &mut dyn SubscriptionSource) -> Result<()> {
        for collector in &self.collectors {
            collector.subscribe(source)?;
        }
        Ok(())
    }

    /// Every descriptor of every collector.
    pub fn descriptors(&self) -> Vec<&Descriptor> {
        self.collectors
            .iter()
            .flat_map(|c| c.descriptors())
            .collect()
    }

    /// Current snapshot of every collector.
    pub fn gather(&self) -> Vec<Sample<'_>> {
        self.collectors.iter().flat_map(|c| c.snapshot()).collect()
    }

    /// Render all collectors in Prometheus text format.
    pub fn render(&self) -> String {
        exposition::render(&self.collectors)
    }

    /// Statistics per collector name.
    pub fn stats(&self) -> Vec<(&'static str, CollectorStats)> {
        self.collectors
            .iter()
            .map(|c| (c.name(), c.stats()))
            .collect()
    }

    /// Total updates applied across collectors.
    pub fn updates_received(&self) -> u64 {
        self.collectors.iter().map(|c| c.stats().updates).sum()
    }
}
