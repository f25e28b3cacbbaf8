//! Pure topic handlers turning `$SYS` publications into store updates.
//!
//! Handlers never fail: a payload that does not parse yields the default
//! value and is flagged as malformed so the caller can log and count it.

use std::str;

/// Signature shared by every topic handler.
pub type HandlerFn = fn(&str, &[u8]) -> Option<TopicUpdate>;

/// A value parsed from a broker payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedValue {
    Numeric(f64),
    /// Rendered as value `1` with the string as a label.
    Labeled(String),
}

impl ParsedValue {
    /// Numeric value used when rendering.
    pub fn value(&self) -> f64 {
        match self {
            ParsedValue::Numeric(v) => *v,
            ParsedValue::Labeled(_) => 1.0,
        }
    }

    /// Label value, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            ParsedValue::Numeric(_) => None,
            ParsedValue::Labeled(s) => Some(s),
        }
    }
}

/// A single store write produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicUpdate {
    pub key: String,
    pub value: ParsedValue,
    /// The payload did not parse and `value` holds the default.
    pub malformed: bool,
}

impl TopicUpdate {
    fn numeric(key: impl Into<String>, parsed: Option<f64>) -> Self {
        Self {
            key: key.into(),
            value: ParsedValue::Numeric(parsed.unwrap_or(0.0)),
            malformed: parsed.is_none(),
        }
    }
}

/// Last `/`-separated segment of a topic.
fn last_segment(topic: &str) -> &str {
    topic.rsplit('/').next().unwrap_or(topic)
}

fn payload_str(payload: &[u8]) -> Option<&str> {
    str::from_utf8(payload).ok().map(str::trim)
}

/// Parse an integer count payload.
pub fn parse_count(payload: &[u8]) -> Option<f64> {
    payload_str(payload)?.parse::<i64>().ok().map(|n| n as f64)
}

/// Parse a fractional payload such as a load average.
pub fn parse_float(payload: &[u8]) -> Option<f64> {
    payload_str(payload)?.parse::<f64>().ok()
}

/// Parse `"<integer> seconds"`.
pub fn parse_uptime(payload: &[u8]) -> Option<f64> {
    let first = payload_str(payload)?.split(' ').next()?;
    first.parse::<i64>().ok().map(|n| n as f64)
}

/// Parse `"mosquitto version <semver>"`, keeping only the third token.
pub fn parse_version(payload: &[u8]) -> Option<String> {
    payload_str(payload)?
        .split_whitespace()
        .nth(2)
        .map(str::to_string)
}

/// `$SYS/broker/clients/<key>`.
pub fn clients(topic: &str, payload: &[u8]) -> Option<TopicUpdate> {
    Some(TopicUpdate::numeric(last_segment(topic), parse_count(payload)))
}

/// `$SYS/broker/messages/<key>`.
pub fn messages(topic: &str, payload: &[u8]) -> Option<TopicUpdate> {
    Some(TopicUpdate::numeric(last_segment(topic), parse_count(payload)))
}

/// `$SYS/broker/store/messages/<key>`, stored as `stored_<key>`.
pub fn stored_messages(topic: &str, payload: &[u8]) -> Option<TopicUpdate> {
    let key = "stored_".to_string() + last_segment(topic);
    Some(TopicUpdate::numeric(key, parse_count(payload)))
}

/// Store key for a load topic: segments from index 3 joined with `_`.
///
/// Only 5 and 6 segment topics carry a load average
/// (`$SYS/broker/load/connections/1min`, `$SYS/broker/load/bytes/sent/5min`).
pub fn load_key(topic: &str) -> Option<String> {
    let segments: Vec<&str> = topic.split('/').collect();
    match segments.len() {
        5 | 6 => Some(segments[3..].join("_")),
        _ => None,
    }
}

/// `$SYS/broker/load/...`.
pub fn load(topic: &str, payload: &[u8]) -> Option<TopicUpdate> {
    let key = load_key(topic)?;
    Some(TopicUpdate::numeric(key, parse_float(payload)))
}

/// `$SYS/broker/uptime`.
pub fn uptime(_topic: &str, payload: &[u8]) -> Option<TopicUpdate> {
    Some(TopicUpdate::numeric("uptime", parse_uptime(payload)))
}

/// `$SYS/broker/version`.
pub fn version(_topic: &str, payload: &[u8]) -> Option<TopicUpdate> {
    let parsed = parse_version(payload);
    Some(TopicUpdate {
        key: "version".to_string(),
        malformed: parsed.is_none(),
        value: ParsedValue::Labeled(parsed.unwrap_or_default()),
    })
}

/// `$SYS/broker/subscriptions/count`.
pub fn subscriptions(_topic: &str, payload: &[u8]) -> Option<TopicUpdate> {
    Some(TopicUpdate::numeric("subscriptions_total", parse_count(payload)))
}

/// `$SYS/broker/shared_subscriptions/count`.
pub fn shared_subscriptions(_topic: &str, payload: &[u8]) -> Option<TopicUpdate> {
    Some(TopicUpdate::numeric(
        "shared_subscriptions_total",
        parse_count(payload),
    ))
}
