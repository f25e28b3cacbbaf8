//! Prometheus exporter for Mosquitto $SYS statistics.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use mosquitto_exporter_core::{Registry, TopicRouter};
use tokio::sync::watch;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use mosquitto_exporter::config::LogFormat;
use mosquitto_exporter::{Args, HttpServer, MqttSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;

    // Initialize logging
    let log_level = config.logging.level.parse().unwrap_or(Level::INFO);
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("mosquitto_exporter={}", log_level).parse()?)
        .add_directive(format!("mosquitto_exporter_core={}", log_level).parse()?)
        .add_directive("rumqttc=warn".parse()?);

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    info!(broker = %config.mqtt.broker, "Starting Mosquitto exporter");

    let registry = Arc::new(Registry::new(&config.collectors, &config.const_labels()));

    // Subscriptions are all-or-nothing: any failure here aborts startup.
    let mut router = TopicRouter::new();
    registry.subscribe(&mut router)?;

    let mut session = MqttSession::new(&config.mqtt, router)?;
    session.subscribe_all().await?;

    let listen_addr = config
        .prometheus
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_server = HttpServer::new(
        registry.clone(),
        listen_addr,
        config.prometheus.path.clone(),
    );

    let session_shutdown = shutdown_rx.clone();
    let session_task = tokio::spawn(async move {
        if let Err(e) = session.run(session_shutdown).await {
            error!("MQTT session error: {}", e);
        }
    });

    let http_shutdown = shutdown_rx.clone();
    let http_task = tokio::spawn(async move {
        if let Err(e) = http_server.run(http_shutdown).await {
            error!("HTTP server error: {}", e);
        }
    });

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(e) => {
                        error!("Failed to install SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("Received SIGTERM, shutting down...");
        }
    }

    shutdown_tx.send(true)?;

    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = session_task.await;
        let _ = http_task.await;
    })
    .await;

    for (collector, stats) in registry.stats() {
        info!(
            collector,
            updates = stats.updates,
            malformed = stats.malformed,
            unmatched = stats.unmatched,
            "Final statistics"
        );
    }

    info!("Exporter stopped");
    Ok(())
}
