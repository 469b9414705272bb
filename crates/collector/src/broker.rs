//! Message broker abstraction.
//!
//! The [`BrokerClient`] trait is the publish boundary of the pipeline. The
//! durable client lives outside this crate; [`LoggingBroker`] is the shipped
//! stand-in and [`MemoryBroker`] records messages for tests and embedding.
//!
//! Every published message is built by [`BrokerMessage::from_event`]:
//!
//! | part    | value                                                  |
//! |---------|--------------------------------------------------------|
//! | key     | `{device_ip}_{YYYYMMDDHH}` of the event timestamp (UTC) |
//! | payload | camelCase JSON of the event                           |
//! | headers | `source`, `device-type`, `timestamp` (RFC 3339)        |
//!
//! # Examples
//!
//! ```ignore
//! let broker = Arc::new(LoggingBroker::new(&core_config.broker));
//! broker.publish_batch(&events).await?;
//! broker.close().await?;
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::SecondsFormat;
use netsentry_core::config::BrokerConfig;
use netsentry_core::error::BrokerError;
use netsentry_core::event::NormalizedTrafficEvent;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A single message ready for the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    /// Partition / routing key.
    pub key: String,
    /// JSON body.
    pub payload: String,
    /// Message headers in insertion order.
    pub headers: Vec<(String, String)>,
}

impl BrokerMessage {
    /// Builds the broker message for an event.
    pub fn from_event(event: &NormalizedTrafficEvent) -> Result<Self, BrokerError> {
        let payload =
            serde_json::to_string(event).map_err(|e| BrokerError::Serialize(e.to_string()))?;
        let timestamp = event.timestamp();
        Ok(Self {
            key: format!("{}_{}", event.device_ip, timestamp.format("%Y%m%d%H")),
            payload,
            headers: vec![
                ("source".to_owned(), event.source.as_str().to_owned()),
                ("device-type".to_owned(), event.device_type.clone()),
                (
                    "timestamp".to_owned(),
                    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                ),
            ],
        })
    }

    /// Looks up a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Trait abstracting the message broker.
///
/// Implementations must be safe for concurrent publish calls; one instance is
/// shared by all services.
pub trait BrokerClient: Send + Sync + 'static {
    /// Publishes a single event.
    fn publish(
        &self,
        event: &NormalizedTrafficEvent,
    ) -> impl Future<Output = Result<(), BrokerError>> + Send;

    /// Publishes a batch of events.
    fn publish_batch(
        &self,
        events: &[NormalizedTrafficEvent],
    ) -> impl Future<Output = Result<(), BrokerError>> + Send;

    /// Returns `true` when the broker is reachable.
    fn health_check(&self) -> impl Future<Output = bool> + Send;

    /// Flushes client-side buffers.
    fn flush(&self, _timeout: Duration) -> impl Future<Output = Result<(), BrokerError>> + Send {
        async { Ok(()) }
    }

    /// Flushes and releases the connection. Publishing after close fails.
    fn close(&self) -> impl Future<Output = Result<(), BrokerError>> + Send {
        async { Ok(()) }
    }
}

/// Broker stand-in that logs each message on its topic at `debug`.
pub struct LoggingBroker {
    topic: String,
    bootstrap_servers: Vec<String>,
    health_timeout: Duration,
    published: AtomicU64,
    closed: AtomicBool,
}

impl LoggingBroker {
    pub fn new(config: &BrokerConfig) -> Self {
        Self {
            topic: config.topic_name.clone(),
            bootstrap_servers: config.bootstrap_servers.clone(),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
            published: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Total messages published so far.
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    fn ensure_open(&self) -> Result<(), BrokerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BrokerError::Unavailable("broker client closed".to_owned()));
        }
        Ok(())
    }

    fn emit(&self, message: &BrokerMessage) {
        debug!(
            topic = %self.topic,
            key = %message.key,
            bytes = message.payload.len(),
            "message published"
        );
        self.published.fetch_add(1, Ordering::Relaxed);
    }
}

impl BrokerClient for LoggingBroker {
    async fn publish(&self, event: &NormalizedTrafficEvent) -> Result<(), BrokerError> {
        self.ensure_open()?;
        let message = BrokerMessage::from_event(event)?;
        self.emit(&message);
        Ok(())
    }

    async fn publish_batch(&self, events: &[NormalizedTrafficEvent]) -> Result<(), BrokerError> {
        self.ensure_open()?;
        let messages = events
            .iter()
            .map(BrokerMessage::from_event)
            .collect::<Result<Vec<_>, _>>()?;
        for message in &messages {
            self.emit(message);
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    async fn flush(&self, timeout: Duration) -> Result<(), BrokerError> {
        debug!(topic = %self.topic, timeout_ms = timeout.as_millis() as u64, "broker flushed");
        Ok(())
    }

    async fn close(&self) -> Result<(), BrokerError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.flush(self.health_timeout).await?;
        info!(
            topic = %self.topic,
            servers = ?self.bootstrap_servers,
            published = self.published_count(),
            "broker client closed"
        );
        Ok(())
    }
}

/// In-memory broker that keeps every published message.
///
/// Publishing can be switched to fail, which makes it useful for exercising
/// breaker and health paths.
#[derive(Default)]
pub struct MemoryBroker {
    messages: Mutex<Vec<BrokerMessage>>,
    batches: AtomicU64,
    failing: AtomicBool,
    closed: AtomicBool,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent publish and health calls fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    /// Copies of all messages published so far.
    pub async fn messages(&self) -> Vec<BrokerMessage> {
        self.messages.lock().await.clone()
    }

    /// Number of successful `publish_batch` calls.
    pub fn batch_count(&self) -> u64 {
        self.batches.load(Ordering::Acquire)
    }

    fn check(&self) -> Result<(), BrokerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BrokerError::Unavailable("broker client closed".to_owned()));
        }
        if self.failing.load(Ordering::Acquire) {
            return Err(BrokerError::Unavailable("broker unreachable".to_owned()));
        }
        Ok(())
    }
}

impl BrokerClient for MemoryBroker {
    async fn publish(&self, event: &NormalizedTrafficEvent) -> Result<(), BrokerError> {
        self.check()?;
        let message = BrokerMessage::from_event(event)?;
        self.messages.lock().await.push(message);
        Ok(())
    }

    async fn publish_batch(&self, events: &[NormalizedTrafficEvent]) -> Result<(), BrokerError> {
        self.check()?;
        let messages = events
            .iter()
            .map(BrokerMessage::from_event)
            .collect::<Result<Vec<_>, _>>()?;
        self.messages.lock().await.extend(messages);
        self.batches.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        self.check().is_ok()
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
