//! Last-write-wins metric store shared by a collector's handlers and scrapes.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::handler::ParsedValue;

/// Thread-safe map from metric key to its latest value.
#[derive(Debug, Default)]
pub struct MetricStore {
    values: RwLock<HashMap<String, ParsedValue>>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value stored under `key`.
    pub fn set(&self, key: impl Into<String>, value: ParsedValue) {
        self.values.write().insert(key.into(), value);
    }

    /// Read the value under `key`, if it was ever written.
    pub fn get(&self, key: &str) -> Option<ParsedValue> {
        self.values.read().get(key).cloned()
    }

    /// Number of distinct keys written so far.
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_reads_none() {
        let store = MetricStore::new();
        assert_eq!(store.get("active"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let store = MetricStore::new();
        store.set("active", ParsedValue::Numeric(5.0));
        store.set("active", ParsedValue::Numeric(7.0));

        assert_eq!(store.get("active"), Some(ParsedValue::Numeric(7.0)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_writers_distinct_keys() {
        let store = MetricStore::new();

        std::thread::scope(|s| {
            for i in 0..8 {
                let store = &store;
                s.spawn(move || {
                    for n in 0..100 {
                        store.set(format!("key{}", i), ParsedValue::Numeric(n as f64));
                    }
                });
            }
        });

        assert_eq!(store.len(), 8);
        for i in 0..8 {
            assert_eq!(
                store.get(&format!("key{}", i)),
                Some(ParsedValue::Numeric(99.0))
            );
        }
    }
}
