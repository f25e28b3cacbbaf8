//! HTTP server for the Prometheus metrics endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use mosquitto_exporter_core::Registry;
use mosquitto_exporter_core::exposition::CONTENT_TYPE;
use serde_json::json;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shareable collector registry handle.
pub type SharedRegistry = Arc<Registry>;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    registry: SharedRegistry,
}

/// Create the HTTP router.
fn create_router(registry: SharedRegistry, metrics_path: &str) -> Router {
    let state = AppState { registry };

    Router::new()
        .route(metrics_path, get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/status", get(status_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler for the metrics endpoint.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let body = state.registry.render();

    (StatusCode::OK, [("content-type", CONTENT_TYPE)], body).into_response()
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

/// Handler for the /ready endpoint.
async fn ready_handler(State(state): State<AppState>) -> Response {
    // Retained $SYS topics arrive right after subscribing, so an idle
    // registry means the broker has not delivered anything yet.
    if state.registry.updates_received() > 0 {
        (StatusCode::OK, "ready\n").into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "not ready - no broker statistics received yet\n",
        )
            .into_response()
    }
}

/// Handler for the /status endpoint: per-collector statistics as JSON.
async fn status_handler(State(state): State<AppState>) -> Response {
    let collectors: Vec<_> = state
        .registry
        .stats()
        .into_iter()
        .map(|(name, stats)| {
            json!({
                "name": name,
                "updates": stats.updates,
                "malformed": stats.malformed,
                "unmatched": stats.unmatched,
            })
        })
        .collect();

    Json(json!({ "collectors": collectors })).into_response()
}

/// HTTP server configuration.
pub struct HttpServer {
    registry: SharedRegistry,
    listen_addr: SocketAddr,
    metrics_path: String,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(registry: SharedRegistry, listen_addr: SocketAddr, metrics_path: String) -> Self {
        Self {
            registry,
            listen_addr,
            metrics_path,
        }
    }

    /// Run the HTTP server until the shutdown signal is received.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let router = create_router(self.registry, &self.metrics_path);

        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        info!(
            addr = %self.listen_addr,
            path = %self.metrics_path,
            "HTTP server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use mosquitto_exporter_core::{CollectorOptions, TopicRouter};
    use tower::ServiceExt;

    fn make_registry() -> SharedRegistry {
        let options = CollectorOptions {
            clients: true,
            ..Default::default()
        };
        Arc::new(Registry::new(&options, &[]))
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let registry = make_registry();
        let router = create_router(registry, "/metrics");

        let response = router
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get("content-type").unwrap();
        assert!(content_type.to_str().unwrap().contains("version=0.0.4"));

        let body = body_string(response).await;
        assert!(body.contains("# TYPE mosquitto_active_clients_count gauge"));
        assert!(body.contains("mosquitto_uptime_seconds 0"));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let router = create_router(make_registry(), "/metrics");

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_endpoint_not_ready() {
        let router = create_router(make_registry(), "/metrics");

        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_ready_endpoint_ready() {
        let registry = make_registry();
        let mut source = TopicRouter::new();
        registry.subscribe(&mut source).unwrap();
        source.dispatch("$SYS/broker/uptime", b"5 seconds");

        let router = create_router(registry, "/metrics");
        let response = router
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let registry = make_registry();
        registry
            .collector("clients")
            .unwrap()
            .handle("$SYS/broker/clients/total", b"oops");

        let router = create_router(registry, "/metrics");
        let response = router
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["collectors"][0]["name"], "clients");
        assert_eq!(body["collectors"][0]["updates"], 1);
        assert_eq!(body["collectors"][0]["malformed"], 1);
        assert_eq!(body["collectors"][1]["name"], "broker");
    }

    #[tokio::test]
    async fn test_custom_metrics_path() {
        let router = create_router(make_registry(), "/probe/metrics");

        let response = router
            .clone()
            .oneshot(Request::get("/probe/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
