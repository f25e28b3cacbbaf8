//! Integration tests for the Mosquitto exporter.
//!
//! These tests verify the full flow from `$SYS` publications arriving at
//! the topic router to exposing them via the HTTP /metrics endpoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mosquitto_exporter::{Args, ExporterConfig, HttpServer, MqttSession, SharedRegistry};
use mosquitto_exporter_core::{CollectorOptions, Registry, TopicRouter};
use tokio::sync::watch;

/// Helper to build a registry from config and wire it into a router.
fn create_registry(config: &ExporterConfig) -> (SharedRegistry, TopicRouter) {
    let registry = Arc::new(Registry::new(&config.collectors, &config.const_labels()));
    let mut router = TopicRouter::new();
    registry.subscribe(&mut router).unwrap();
    (registry, router)
}

fn all_collectors() -> ExporterConfig {
    ExporterConfig {
        collectors: CollectorOptions {
            clients: true,
            messages: true,
            load: true,
            subscription_counts: true,
        },
        ..Default::default()
    }
}

/// Helper to parse Prometheus text format and find a sample value.
fn sample_value(output: &str, series: &str) -> Option<f64> {
    output
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let (name, value) = line.rsplit_once(' ')?;
            (name == series).then(|| value.parse().ok()).flatten()
        })
}

#[test]
fn test_full_flow_all_collectors() {
    let config = all_collectors();
    let (registry, router) = create_registry(&config);

    router.dispatch("$SYS/broker/clients/connected", b"12");
    router.dispatch("$SYS/broker/messages/received", b"1000");
    router.dispatch("$SYS/broker/store/messages/count", b"7");
    router.dispatch("$SYS/broker/load/bytes/received/5min", b"2048.25");
    router.dispatch("$SYS/broker/subscriptions/count", b"30");
    router.dispatch("$SYS/broker/uptime", b"86400 seconds");

    let output = registry.render();
    let broker = r#"{broker="tcp://127.0.0.1:1883"}"#;

    assert_eq!(
        sample_value(&output, &format!("mosquitto_connected_clients_count{}", broker)),
        Some(12.0)
    );
    assert_eq!(
        sample_value(&output, &format!("mosquitto_received_messages_count{}", broker)),
        Some(1000.0)
    );
    assert_eq!(
        sample_value(&output, &format!("mosquitto_stored_messages_count{}", broker)),
        Some(7.0)
    );
    assert_eq!(
        sample_value(&output, &format!("mosquitto_bytes_received_load5{}", broker)),
        Some(2048.25)
    );
    assert_eq!(
        sample_value(&output, &format!("mosquitto_subscriptions_total{}", broker)),
        Some(30.0)
    );
    assert_eq!(
        sample_value(&output, &format!("mosquitto_uptime_seconds{}", broker)),
        Some(86400.0)
    );
    assert!(output.contains("# TYPE mosquitto_received_messages_count counter"));
}

#[test]
fn test_disabled_collectors_are_absent() {
    let (registry, router) = create_registry(&ExporterConfig::default());

    router.dispatch("$SYS/broker/clients/connected", b"12");

    let output = registry.render();
    assert!(!output.contains("mosquitto_connected_clients_count"));
    assert!(!output.contains("_load1"));
    assert!(output.contains("mosquitto_uptime_seconds"));
    assert!(output.contains("mosquitto_version_info"));
}

#[test]
fn test_default_labels_reach_every_series() {
    let config = ExporterConfig::parse(
        r#"{
            collectors: { load: true },
            prometheus: { default_labels: { site: "lab" } },
        }"#,
    )
    .unwrap();
    let (registry, _router) = create_registry(&config);

    let output = registry.render();
    for line in output
        .lines()
        .filter(|l| !l.starts_with('#') && !l.starts_with("mosquitto_exporter_"))
    {
        assert!(line.contains(r#"site="lab""#), "missing label: {}", line);
        assert!(line.contains("broker="), "missing broker label: {}", line);
    }
}

#[test]
fn test_cli_flags_build_session() {
    let args = Args {
        broker: Some("tcp://10.20.30.40:1884".to_string()),
        client_id: Some("exporter-it".to_string()),
        collector_clients: true,
        ..Default::default()
    };
    let config = args.into_config().unwrap();
    let (_registry, router) = create_registry(&config);
    let filters = router.filters();

    let session = MqttSession::new(&config.mqtt, router).unwrap();
    assert_eq!(session.filters(), filters.as_slice());
    assert!(filters.iter().any(|f| f == "$SYS/broker/clients/#"));
    assert!(!filters.iter().any(|f| f == "$SYS/broker/load/#"));
}

#[tokio::test]
async fn test_http_server_end_to_end() {
    let (registry, router) = create_registry(&all_collectors());
    router.dispatch("$SYS/broker/clients/active", b"42");
    router.dispatch("$SYS/broker/version", b"mosquitto version 2.0.18");

    // Find a free port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = HttpServer::new(registry, addr, "/metrics".to_string());
    let server_handle = tokio::spawn(async move {
        let _ = server.run(shutdown_rx).await;
    });

    // Give the server time to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{}/metrics", addr))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = response.text().await.unwrap();
    assert!(body.contains(r#"mosquitto_active_clients_count{broker="tcp://127.0.0.1:1883"} 42"#));
    assert!(body.contains(r#"version="2.0.18"} 1"#));
    assert!(body.contains("mosquitto_exporter_updates_total"));

    let ready = client
        .get(format!("http://{}/ready", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(ready.status(), 200);

    shutdown_tx.send(true).unwrap();
    let _ = tokio::time::timeout(Duration::from_secs(2), server_handle).await;
}
