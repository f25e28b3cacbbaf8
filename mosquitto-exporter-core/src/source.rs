//! Subscription sources and MQTT topic filter routing.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{Error, Result};

/// Callback invoked for every publication matching a subscribed filter.
pub type TopicHandler = Arc<dyn Fn(&str, &[u8]) + Send + Sync>;

/// Anything collectors can register topic handlers with.
pub trait SubscriptionSource {
    /// Register `handler` for every topic matching `filter`.
    fn subscribe(&mut self, filter: &str, handler: TopicHandler) -> Result<()>;
}

/// A validated MQTT topic filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFilter {
    filter: String,
}

impl TopicFilter {
    /// Parse and validate a filter according to MQTT 3.1.1 section 4.7.
    pub fn parse(filter: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidFilter {
            filter: filter.to_string(),
            reason,
        };

        if filter.is_empty() {
            return Err(invalid("filter is empty"));
        }

        let levels: Vec<&str> = filter.split('/').collect();
        for (i, level) in levels.iter().enumerate() {
            if level.contains('#') && (*level != "#" || i != levels.len() - 1) {
                return Err(invalid("'#' must be the last level on its own"));
            }
            if level.contains('+') && *level != "+" {
                return Err(invalid("'+' must occupy a whole level"));
            }
        }

        Ok(Self {
            filter: filter.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.filter
    }

    /// Check whether a concrete topic name matches this filter.
    pub fn matches(&self, topic: &str) -> bool {
        let mut filter_levels = self.filter.split('/');
        let mut topic_levels = topic.split('/');

        // Wildcards in the first level never match `$` topics.
        if topic.starts_with('$') && matches!(self.filter.chars().next(), Some('+' | '#')) {
            return false;
        }

        loop {
            match (filter_levels.next(), topic_levels.next()) {
                (Some("#"), _) => return true,
                (Some("+"), Some(_)) => {}
                (Some(f), Some(t)) if f == t => {}
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

impl fmt::Display for TopicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filter)
    }
}

/// In-process subscription source dispatching topics to registered handlers.
#[derive(Default)]
pub struct TopicRouter {
    routes: Vec<(TopicFilter, TopicHandler)>,
}

impl TopicRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every registered filter, in registration order.
    pub fn filters(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|(f, _)| f.as_str().to_string())
            .collect()
    }

    /// Deliver a publication to every matching handler.
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch(&self, topic: &str, payload: &[u8]) -> usize {
        let mut delivered = 0;
        for (filter, handler) in &self.routes {
            if filter.matches(topic) {
                handler(topic, payload);
                delivered += 1;
            }
        }

        if delivered == 0 {
            trace!(topic, "No handler for topic");
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl SubscriptionSource for TopicRouter {
    fn subscribe(&mut self, filter: &str, handler: TopicHandler) -> Result<()> {
        let filter = TopicFilter::parse(filter)?;
        self.routes.push((filter, handler));
        Ok(())
    }
}

impl fmt::Debug for TopicRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopicRouter")
            .field("filters", &self.filters())
            .finish()
    }
}
