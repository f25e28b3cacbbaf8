//! Collector subsystem of the Mosquitto Prometheus exporter.
//!
//! Collectors declare the `$SYS` topics they care about, parse the broker's
//! publications into typed values, keep the latest value per metric and
//! render a snapshot whenever Prometheus scrapes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │  $SYS/broker/#   │────>│  Topic handler  │────>│  Metric store   │
//! │ (TopicRouter)    │     │    (parse)      │     │ (RwLock, LWW)   │
//! └──────────────────┘     └─────────────────┘     └────────┬────────┘
//!                                                           │ snapshot
//!                          ┌─────────────────┐     ┌────────▼────────┐
//!                          │  text format    │<────│    Registry     │
//!                          └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use mosquitto_exporter_core::{CollectorOptions, Registry, TopicRouter};
//!
//! let options = CollectorOptions { clients: true, ..Default::default() };
//! let registry = Registry::new(&options, &[]);
//!
//! let mut router = TopicRouter::new();
//! registry.subscribe(&mut router).unwrap();
//! router.dispatch("$SYS/broker/clients/active", b"42");
//!
//! assert!(registry.render().contains("mosquitto_active_clients_count 42"));
//! ```

pub mod collector;
pub mod descriptor;
pub mod error;
pub mod exposition;
pub mod families;
pub mod handler;
pub mod registry;
pub mod source;
pub mod store;

pub use collector::{Collector, CollectorStats, Route, Sample};
pub use descriptor::{ConstLabels, Descriptor, MetricDef, MetricKind};
pub use error::{Error, Result};
pub use handler::{ParsedValue, TopicUpdate};
pub use registry::{CollectorOptions, Registry};
pub use source::{SubscriptionSource, TopicFilter, TopicHandler, TopicRouter};
pub use store::MetricStore;
