//! SNMP 폴링 서비스
//!
//! ```text
//! SnmpPoller -> mpsc -> normalize + enrich -> EventAccumulator -> BatchPublisher -> broker
//! ```
//!
//! # 플러시 조건
//! - `flush_interval`마다 최대 `batch_size`개
//! - 누적 개수가 `buffer_size`에 도달하면 타이머를 기다리지 않고 즉시 최대 `batch_size`개
//! - 정지 시 남은 이벤트 전부 (`batch_size` 단위)

use std::sync::Arc;

use netsentry_core::error::{NetsentryError, PipelineError};
use netsentry_core::event::{MODULE_SNMP, NormalizedTrafficEvent};
use netsentry_core::metrics as m;
use netsentry_core::pipeline::{HealthStatus, Pipeline};
use netsentry_core::plugin::{Plugin, PluginInfo, PluginState, PluginType};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{ENRICHMENT_OPERATIONS, running_health};
use crate::broker::BrokerClient;
use crate::buffer::EventAccumulator;
use crate::config::CollectorConfig;
use crate::enrich::{Enricher, GeoIpProvider, GeoIpService, IpApiProvider};
use crate::error::CollectorError;
use crate::parser::SnmpNormalizer;
use crate::publisher::{BatchPublisher, FLUSH_SNMP_OPERATION};
use crate::resilience::ErrorHandler;
use crate::snmp::{SnmpClient, SnmpPoller, TargetPoll};

/// 폴링 결과 정규화 작업 이름
pub const PROCESS_SNMP_OPERATION: &str = "ProcessSnmpData";

/// 폴링 결과 채널 용량
const POLL_CHANNEL_CAPACITY: usize = 256;

/// 폴링 결과를 이벤트로 바꾸고 누적/발행하는 작업자
struct SnmpWorker<B: BrokerClient, P: GeoIpProvider> {
    normalizer: SnmpNormalizer,
    enricher: Option<Enricher<P>>,
    accumulator: Arc<EventAccumulator>,
    publisher: Arc<BatchPublisher<B>>,
    handler: Arc<ErrorHandler>,
    buffer_size: usize,
    batch_size: usize,
}

impl<B: BrokerClient, P: GeoIpProvider> SnmpWorker<B, P> {
    async fn run(
        self,
        mut rx: mpsc::Receiver<TargetPoll>,
        flush_interval: std::time::Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 첫 tick은 즉시 완료되므로 소비해 둡니다
        ticker.tick().await;

        loop {
            tokio::select! {
                poll = rx.recv() => {
                    let Some(poll) = poll else { break };
                    self.accept(poll).await;
                }
                _ = ticker.tick() => {
                    self.flush_batch().await;
                }
                () = cancel.cancelled() => break,
            }
        }

        // 폴러가 멈춘 뒤 채널에 남은 결과도 누적합니다
        rx.close();
        while let Some(poll) = rx.recv().await {
            self.accept(poll).await;
        }
        self.flush_all().await;
    }

    async fn accept(&self, poll: TargetPoll) {
        let events = self.events_from(&poll).await;
        if events.is_empty() {
            debug!(device_ip = %poll.device_ip, "snmp poll produced no events");
            return;
        }
        metrics::counter!(m::PIPELINE_EVENTS_NORMALIZED_TOTAL, m::LABEL_SOURCE => "snmp")
            .increment(events.len() as u64);

        let pending = self.accumulator.extend(events).await;
        if pending >= self.buffer_size {
            debug!(pending, threshold = self.buffer_size, "snmp buffer threshold reached");
            self.flush_batch().await;
        }
    }

    async fn events_from(&self, poll: &TargetPoll) -> Vec<NormalizedTrafficEvent> {
        let mut events = self
            .handler
            .safe_execute(PROCESS_SNMP_OPERATION, Vec::new(), || {
                self.normalizer.normalize(&poll.device_ip, &poll.data)
            });
        if let Some(enricher) = &self.enricher {
            for event in &mut events {
                enricher.enrich(event).await;
            }
        }
        events
    }

    async fn flush_batch(&self) {
        let batch = self.accumulator.drain_batch(self.batch_size).await;
        self.publisher.publish(batch).await;
    }

    async fn flush_all(&self) {
        let mut flushed = 0;
        loop {
            let batch = self.accumulator.drain_batch(self.batch_size).await;
            if batch.is_empty() {
                break;
            }
            flushed += batch.len();
            self.publisher.publish(batch).await;
        }
        if flushed > 0 {
            info!(count = flushed, "flushed remaining snmp events");
        }
    }
}

/// SNMP 폴링 서비스
pub struct SnmpService<B: BrokerClient, C: SnmpClient, P: GeoIpProvider = IpApiProvider> {
    config: CollectorConfig,
    info: PluginInfo,
    state: PluginState,
    handler: Arc<ErrorHandler>,
    client: Arc<C>,
    geoip: Option<Arc<GeoIpService<P>>>,
    publisher: Arc<BatchPublisher<B>>,
    accumulator: Arc<EventAccumulator>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl<B: BrokerClient, C: SnmpClient, P: GeoIpProvider> SnmpService<B, C, P> {
    pub fn new(
        config: CollectorConfig,
        client: Arc<C>,
        broker: Arc<B>,
        handler: Arc<ErrorHandler>,
        geoip: Option<Arc<GeoIpService<P>>>,
    ) -> Result<Self, CollectorError> {
        config.validate()?;
        if config.snmp.polling_interval_secs == 0 {
            return Err(CollectorError::Config {
                field: "snmp.polling_interval_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        let publisher = Arc::new(BatchPublisher::new(
            broker,
            Arc::clone(&handler),
            config.batch_size,
            FLUSH_SNMP_OPERATION,
            "snmp",
        ));
        Ok(Self {
            info: PluginInfo {
                name: MODULE_SNMP.to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                description: "SNMP v2c device poller".to_owned(),
                plugin_type: PluginType::Poller,
            },
            config,
            state: PluginState::Created,
            handler,
            client,
            geoip,
            publisher,
            accumulator: Arc::new(EventAccumulator::new()),
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        })
    }

    pub fn publisher(&self) -> &BatchPublisher<B> {
        &self.publisher
    }

    pub fn error_handler(&self) -> &Arc<ErrorHandler> {
        &self.handler
    }

    /// 발행 대기 중인 이벤트 수
    pub async fn pending(&self) -> usize {
        self.accumulator.len().await
    }
}

fn owned_by_snmp(operation: &str) -> bool {
    operation.starts_with("snmp_")
        || operation == PROCESS_SNMP_OPERATION
        || operation == FLUSH_SNMP_OPERATION
        || ENRICHMENT_OPERATIONS.contains(&operation)
}

impl<B: BrokerClient, C: SnmpClient, P: GeoIpProvider> Pipeline for SnmpService<B, C, P> {
    async fn start(&mut self) -> Result<(), NetsentryError> {
        if self.state == PluginState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }
        if self.config.snmp.targets.is_empty() {
            warn!("snmp service started without targets");
        }

        self.cancel = CancellationToken::new();
        let (tx, rx) = mpsc::channel(POLL_CHANNEL_CAPACITY);

        let poller = SnmpPoller::new(
            Arc::clone(&self.client),
            Arc::clone(&self.handler),
            self.config.snmp.targets.clone(),
            std::time::Duration::from_secs(self.config.snmp.polling_interval_secs),
        );
        let poller_cancel = self.cancel.clone();
        self.tasks.push(tokio::spawn(async move {
            poller.run(tx, poller_cancel).await;
        }));

        let worker = SnmpWorker {
            normalizer: SnmpNormalizer::new(),
            enricher: self
                .config
                .enable_enrichment
                .then(|| Enricher::new(Arc::clone(&self.handler), self.geoip.clone())),
            accumulator: Arc::clone(&self.accumulator),
            publisher: Arc::clone(&self.publisher),
            handler: Arc::clone(&self.handler),
            buffer_size: self.config.buffer_size,
            batch_size: self.config.batch_size,
        };
        let flush_interval = self.config.flush_interval();
        let worker_cancel = self.cancel.clone();
        self.tasks
            .push(tokio::spawn(worker.run(rx, flush_interval, worker_cancel)));

        self.state = PluginState::Running;
        info!(
            targets = self.config.snmp.targets.len(),
            polling_interval_secs = self.config.snmp.polling_interval_secs,
            flush_interval_secs = self.config.flush_interval_secs,
            "snmp service started"
        );
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), NetsentryError> {
        if self.state != PluginState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping snmp service");
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!(error = %e, "snmp task failed");
            }
        }

        self.state = PluginState::Stopped;
        info!(
            published = self.publisher.published_events(),
            failed_batches = self.publisher.failed_batches(),
            "snmp service stopped"
        );
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PluginState::Running => {
                let broker_healthy = self.publisher.broker_healthy().await;
                running_health(&self.handler, owned_by_snmp, broker_healthy)
            }
            PluginState::Created => HealthStatus::Unhealthy("not started".to_owned()),
            PluginState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
            PluginState::Failed => HealthStatus::Unhealthy("failed to start".to_owned()),
        }
    }
}

impl<B: BrokerClient, C: SnmpClient, P: GeoIpProvider> Plugin for SnmpService<B, C, P> {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn state(&self) -> PluginState {
        self.state
    }
}
