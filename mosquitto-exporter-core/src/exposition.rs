//! Prometheus text exposition format (version 0.0.4).

use std::fmt::Write;

use crate::collector::{Collector, Sample};

/// Content type served with [`render`] output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Prefix of the exporter's own metrics.
pub const SELF_PREFIX: &str = "mosquitto_exporter";

/// Render the snapshot of every collector followed by exporter self-metrics.
pub fn render(collectors: &[Collector]) -> String {
    let mut output = String::with_capacity(4096);

    for collector in collectors {
        for sample in collector.snapshot() {
            write_sample(&mut output, &sample);
        }
    }

    write_self_metric(
        &mut output,
        "updates_total",
        "Topic updates applied to the metric store",
        collectors,
        |c| c.stats().updates,
    );
    write_self_metric(
        &mut output,
        "malformed_updates_total",
        "Topic updates whose payload could not be parsed",
        collectors,
        |c| c.stats().malformed,
    );

    output
}

fn write_sample(output: &mut String, sample: &Sample<'_>) {
    let descriptor = sample.descriptor;
    writeln!(
        output,
        "# HELP {} {}",
        descriptor.name,
        escape_help(&descriptor.help)
    )
    .ok();
    writeln!(
        output,
        "# TYPE {} {}",
        descriptor.name,
        descriptor.kind.as_str()
    )
    .ok();

    let mut labels = descriptor.const_labels.clone();
    if let (Some(name), Some(value)) = (&descriptor.variable_label, &sample.label_value) {
        labels.push((name.clone(), value.clone()));
    }

    writeln!(
        output,
        "{}{} {}",
        descriptor.name,
        format_labels(&labels),
        format_value(sample.value)
    )
    .ok();
}

fn write_self_metric(
    output: &mut String,
    suffix: &str,
    help: &str,
    collectors: &[Collector],
    value: impl Fn(&Collector) -> u64,
) {
    if collectors.is_empty() {
        return;
    }

    let name = format!("{}_{}", SELF_PREFIX, suffix);
    writeln!(output, "# HELP {} {}", name, help).ok();
    writeln!(output, "# TYPE {} counter", name).ok();
    for collector in collectors {
        let labels = [("collector".to_string(), collector.name().to_string())];
        writeln!(
            output,
            "{}{} {}",
            name,
            format_labels(&labels),
            value(collector)
        )
        .ok();
    }
}

/// Escape special characters in label values.
fn escape_label_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape help text, which unlike label values keeps quotes as-is.
fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Format a floating point value for Prometheus.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "+Inf".to_string()
        } else {
            "-Inf".to_string()
        }
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Format labels for Prometheus exposition format.
fn format_labels(labels: &[(String, String)]) -> String {
    if labels.is_empty() {
        return String::new();
    }

    let parts: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect();

    format!("{{{}}}", parts.join(","))
}

/// Sanitize a label name to be Prometheus-compatible.
///
/// Prometheus label names must match `[a-zA-Z_][a-zA-Z0-9_]*`.
/// Labels starting with `__` are reserved for internal use.
pub fn sanitize_label_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut last_was_underscore = false;

    for (i, c) in name.chars().enumerate() {
        let valid = if i == 0 {
            c.is_ascii_alphabetic() || c == '_'
        } else {
            c.is_ascii_alphanumeric() || c == '_'
        };

        if valid {
            result.push(c);
            last_was_underscore = c == '_';
        } else if !last_was_underscore {
            result.push('_');
            last_was_underscore = true;
        }
    }

    while result.ends_with('_') {
        result.pop();
    }

    if result.is_empty() {
        return "label".to_string();
    }

    if result.starts_with("__") {
        result.insert(0, 'z');
    }

    result
}
