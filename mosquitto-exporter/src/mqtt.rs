//! MQTT session feeding `$SYS` publications into the topic router.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use mosquitto_exporter_core::TopicRouter;
use rumqttc::{
    AsyncClient, ClientError, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet,
    Publish, QoS, SubscribeReasonCode,
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::config::MqttConfig;

/// Default MQTT port when the broker string has none.
pub const DEFAULT_PORT: u16 = 1883;

/// Capacity of the request channel between client handle and event loop.
const REQUEST_CAPACITY: usize = 64;

/// Errors raised while establishing the broker session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid broker address: {0}")]
    InvalidBroker(String),

    #[error("MQTT client error: {0}")]
    Client(#[from] ClientError),

    #[error("MQTT connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Broker rejected subscription to '{filter}'")]
    SubscriptionRejected { filter: String },

    #[error("Timed out after {0}s waiting for subscription acknowledgements")]
    SubscribeTimeout(u64),
}

/// Host and port of the broker to monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    pub host: String,
    pub port: u16,
}

impl FromStr for BrokerAddress {
    type Err = SessionError;

    /// Accepts `tcp://host:port`, `mqtt://host:port` and bare `host[:port]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = match s.split_once("://") {
            Some(("tcp" | "mqtt", rest)) => rest,
            Some((scheme, _)) => {
                return Err(SessionError::InvalidBroker(format!(
                    "unsupported scheme '{}' in '{}'",
                    scheme, s
                )));
            }
            None => s,
        };
        let rest = rest.trim_end_matches('/');

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) if !host.ends_with(':') => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| SessionError::InvalidBroker(format!("invalid port in '{}'", s)))?;
                (host, port)
            }
            _ => (rest, DEFAULT_PORT),
        };
        let host = host.trim_start_matches('[').trim_end_matches(']');

        if host.is_empty() {
            return Err(SessionError::InvalidBroker(format!("missing host in '{}'", s)));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for BrokerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Build client options from configuration.
pub fn mqtt_options(config: &MqttConfig) -> Result<MqttOptions, SessionError> {
    let address: BrokerAddress = config.broker.parse()?;

    let mut options = MqttOptions::new(config.client_id.clone(), address.host, address.port);
    options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));
    options.set_clean_session(true);

    if let Some(username) = &config.username {
        options.set_credentials(
            username.clone(),
            config.password.clone().unwrap_or_default(),
        );
    }

    Ok(options)
}

fn dispatch(router: &TopicRouter, publish: &Publish) {
    let delivered = router.dispatch(&publish.topic, &publish.payload);
    trace!(topic = %publish.topic, delivered, "Publication received");
}

fn rejected(codes: &[SubscribeReasonCode]) -> bool {
    codes
        .iter()
        .any(|c| matches!(c, SubscribeReasonCode::Failure))
}

/// Connection to the broker delivering publications to a [`TopicRouter`].
pub struct MqttSession {
    client: AsyncClient,
    eventloop: EventLoop,
    router: Arc<TopicRouter>,
    filters: Vec<String>,
    broker: String,
    subscribe_timeout: Duration,
    reconnect_delay: Duration,
}

impl MqttSession {
    /// Create a session for every filter registered in `router`.
    ///
    /// No network activity happens until [`MqttSession::subscribe_all`].
    pub fn new(config: &MqttConfig, router: TopicRouter) -> Result<Self, SessionError> {
        let options = mqtt_options(config)?;
        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY.max(router.len()));

        Ok(Self {
            client,
            eventloop,
            filters: router.filters(),
            router: Arc::new(router),
            broker: config.broker.clone(),
            subscribe_timeout: Duration::from_secs(config.subscribe_timeout_secs),
            reconnect_delay: Duration::from_secs(config.reconnect_delay_secs),
        })
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    /// Connect and subscribe to every filter, waiting for all SUBACKs.
    ///
    /// Any rejection, connection failure or timeout fails the whole set.
    pub async fn subscribe_all(&mut self) -> Result<(), SessionError> {
        info!(broker = %self.broker, filters = self.filters.len(), "Connecting to broker");

        for filter in &self.filters {
            self.client
                .subscribe(filter.as_str(), QoS::AtMostOnce)
                .await?;
        }

        let timeout = self.subscribe_timeout;
        tokio::time::timeout(timeout, self.await_subacks())
            .await
            .map_err(|_| SessionError::SubscribeTimeout(timeout.as_secs()))?
    }

    async fn await_subacks(&mut self) -> Result<(), SessionError> {
        let mut pending: VecDeque<&str> = self.filters.iter().map(String::as_str).collect();
        let mut by_pkid: HashMap<u16, &str> = HashMap::new();
        let mut acked = 0;

        while acked < self.filters.len() {
            match self.eventloop.poll().await? {
                Event::Incoming(Packet::ConnAck(_)) => {
                    info!(broker = %self.broker, "Connected to broker");
                }
                Event::Outgoing(Outgoing::Subscribe(pkid)) => {
                    if let Some(filter) = pending.pop_front() {
                        by_pkid.insert(pkid, filter);
                    }
                }
                Event::Incoming(Packet::SubAck(ack)) => {
                    let filter = by_pkid.get(&ack.pkid).copied().unwrap_or("<unknown>");
                    if rejected(&ack.return_codes) {
                        return Err(SessionError::SubscriptionRejected {
                            filter: filter.to_string(),
                        });
                    }
                    debug!(filter, "Subscription acknowledged");
                    acked += 1;
                }
                Event::Incoming(Packet::Publish(publish)) => dispatch(&self.router, &publish),
                _ => {}
            }
        }

        info!(filters = acked, "All subscriptions acknowledged");
        Ok(())
    }

    /// Re-issue every subscription after the broker lost our session.
    fn resubscribe(&self) {
        for filter in &self.filters {
            if let Err(e) = self.client.try_subscribe(filter.as_str(), QoS::AtMostOnce) {
                warn!(filter = %filter, error = %e, "Failed to queue resubscription");
            }
        }
    }

    /// Deliver publications until the shutdown signal is received.
    ///
    /// Connection errors are logged and retried after the reconnect delay.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown signal received, closing MQTT session");
                        break;
                    }
                }

                event = self.eventloop.poll() => {
                    match event {
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            dispatch(&self.router, &publish);
                        }
                        Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                            info!(
                                broker = %self.broker,
                                session_present = ack.session_present,
                                "Reconnected to broker"
                            );
                            if !ack.session_present {
                                self.resubscribe();
                            }
                        }
                        Ok(Event::Incoming(Packet::SubAck(ack))) => {
                            if rejected(&ack.return_codes) {
                                warn!(pkid = ack.pkid, "Broker rejected resubscription");
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(
                                broker = %self.broker,
                                error = %e,
                                retry_in_secs = self.reconnect_delay.as_secs(),
                                "MQTT connection error"
                            );
                            tokio::select! {
                                _ = tokio::time::sleep(self.reconnect_delay) => {}
                                changed = shutdown.changed() => {
                                    if changed.is_err() || *shutdown.borrow() {
                                        info!("Shutdown signal received during reconnect delay");
                                        break;
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        // Best effort: the process is exiting either way.
        if let Err(e) = self.client.try_disconnect() {
            debug!(error = %e, "Failed to queue disconnect");
        }
        let _ = tokio::time::timeout(Duration::from_millis(250), self.eventloop.poll()).await;

        info!("MQTT session closed");
        Ok(())
    }
}
