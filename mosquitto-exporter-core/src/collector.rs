//! Collectors owning one family of `$SYS` metrics from subscription to snapshot.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, trace};

use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::handler::{HandlerFn, ParsedValue};
use crate::source::{SubscriptionSource, TopicFilter};
use crate::store::MetricStore;

/// A topic filter and the handler parsing publications on it.
#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub filter: &'static str,
    pub handler: HandlerFn,
}

impl Route {
    pub const fn new(filter: &'static str, handler: HandlerFn) -> Self {
        Self { filter, handler }
    }
}

/// Collector statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectorStats {
    /// Updates written to the store.
    pub updates: u64,
    /// Updates whose payload did not parse and were stored as the default.
    pub malformed: u64,
    /// Publications whose topic produced no metric key.
    pub unmatched: u64,
}

/// One rendered metric: a descriptor paired with its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<'a> {
    pub descriptor: &'a Descriptor,
    pub value: f64,
    /// Value of the descriptor's variable label, if it has one.
    pub label_value: Option<String>,
}

/// State reachable from the handlers registered with a subscription source.
struct Shared {
    name: &'static str,
    store: MetricStore,
    stats: RwLock<CollectorStats>,
}

impl Shared {
    fn apply(&self, handler: HandlerFn, topic: &str, payload: &[u8]) {
        let Some(update) = handler(topic, payload) else {
            debug!(collector = self.name, topic, "Topic yields no metric key");
            self.stats.write().unmatched += 1;
            return;
        };

        if update.malformed {
            debug!(
                collector = self.name,
                topic,
                payload = %String::from_utf8_lossy(payload),
                key = %update.key,
                "Malformed payload, storing default value"
            );
        } else {
            trace!(collector = self.name, key = %update.key, value = ?update.value, "Metric updated");
        }

        self.store.set(update.key, update.value);

        let mut stats = self.stats.write();
        stats.updates += 1;
        if update.malformed {
            stats.malformed += 1;
        }
    }
}

/// A pluggable collector: descriptor table, topic routes and value store.
pub struct Collector {
    descriptors: Vec<Descriptor>,
    routes: Vec<Route>,
    /// Parsed route filters, aligned with `routes`. `None` for a filter
    /// that does not parse; `subscribe` reports those.
    filters: Vec<Option<TopicFilter>>,
    shared: Arc<Shared>,
}

impl Collector {
    /// Create a collector from its descriptor set and topic routes.
    pub fn new(name: &'static str, descriptors: Vec<Descriptor>, routes: Vec<Route>) -> Self {
        let filters = routes
            .iter()
            .map(|r| TopicFilter::parse(r.filter).ok())
            .collect();

        Self {
            descriptors,
            routes,
            filters,
            shared: Arc::new(Shared {
                name,
                store: MetricStore::new(),
                stats: RwLock::new(CollectorStats::default()),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.shared.name
    }

    /// Every descriptor this collector exports, stable for its lifetime.
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn store(&self) -> &MetricStore {
        &self.shared.store
    }

    pub fn stats(&self) -> CollectorStats {
        self.shared.stats.read().clone()
    }

    /// Register every route with `source`.
    ///
    /// Stops at the first rejected filter; callers treat that as fatal.
    pub fn subscribe(&self, source: &mut dyn SubscriptionSource) -> Result<()> {
        for route in &self.routes {
            let shared = self.shared.clone();
            let handler = route.handler;
            source.subscribe(
                route.filter,
                Arc::new(move |topic, payload| shared.apply(handler, topic, payload)),
            )?;
        }

        info!(
            collector = self.name(),
            filters = self.routes.len(),
            "Collector subscribed"
        );
        Ok(())
    }

    /// Feed a publication directly, bypassing any subscription source.
    ///
    /// Meant for tests and diagnostics. Unlike [`TopicRouter::dispatch`],
    /// only the first matching route runs. Returns `false` when no route
    /// matches the topic.
    ///
    /// [`TopicRouter::dispatch`]: crate::source::TopicRouter::dispatch
    pub fn handle(&self, topic: &str, payload: &[u8]) -> bool {
        let route = self
            .routes
            .iter()
            .zip(&self.filters)
            .find(|(_, filter)| filter.as_ref().is_some_and(|f| f.matches(topic)))
            .map(|(route, _)| route);

        match route {
            Some(route) => {
                self.shared.apply(route.handler, topic, payload);
                true
            }
            None => false,
        }
    }

    /// Pair every descriptor with its current value.
    ///
    /// The store is read one descriptor at a time, so concurrent writers may
    /// leave a snapshot mixing values from slightly different instants.
    pub fn snapshot(&self) -> Vec<Sample<'_>> {
        self.descriptors
            .iter()
            .map(|descriptor| {
                let stored = self.shared.store.get(&descriptor.store_key);
                let (value, label_value) = match (&descriptor.variable_label, stored) {
                    (Some(_), Some(ParsedValue::Labeled(label))) => (1.0, Some(label)),
                    (Some(_), _) => (1.0, Some(String::new())),
                    (None, Some(v)) => (v.value(), None),
                    (None, None) => (0.0, None),
                };
                Sample {
                    descriptor,
                    value,
                    label_value,
                }
            })
            .collect()
    }
}

impl fmt::Debug for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector")
            .field("name", &self.name())
            .field("descriptors", &self.descriptors.len())
            .field("routes", &self.routes)
            .finish()
    }
}
