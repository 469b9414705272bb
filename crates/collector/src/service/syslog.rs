//! syslog 수집 서비스
//!
//! ```text
//! UDP/TCP listener -> SyslogProcessor (normalize + enrich) -> EventQueue -> BatchPublisher -> broker
//! ```
//!
//! 큐 용량은 `buffer_size`의 2배이며, 가득 차면 가장 오래된 이벤트를 버립니다.
//! 정지 시 리스너를 먼저 멈추고, 큐를 닫은 뒤 발행기가 남은 이벤트를 모두
//! 발행할 때까지 기다립니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use netsentry_core::error::{NetsentryError, PipelineError};
use netsentry_core::event::{MODULE_SYSLOG, NormalizedTrafficEvent, RawSyslogMessage};
use netsentry_core::pipeline::{HealthStatus, Pipeline};
use netsentry_core::plugin::{Plugin, PluginInfo, PluginState, PluginType};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{ENRICHMENT_OPERATIONS, running_health};
use crate::broker::BrokerClient;
use crate::buffer::EventQueue;
use crate::collector::syslog_tcp::TcpListenerSettings;
use crate::collector::{
    MessageHandler, SyslogTcpListener, SyslogUdpListener, TCP_ACCEPT_OPERATION,
    UDP_RECEIVE_OPERATION,
};
use crate::config::CollectorConfig;
use crate::enrich::{Enricher, GeoIpProvider, GeoIpService, IpApiProvider};
use crate::error::CollectorError;
use crate::parser::SyslogNormalizer;
use crate::publisher::{BatchPublisher, FLUSH_EVENTS_OPERATION};
use crate::resilience::ErrorHandler;

/// 메시지 처리 작업 이름
pub const PROCESS_SYSLOG_OPERATION: &str = "ProcessSyslogMessage";

const SYSLOG_OPERATIONS: [&str; 4] = [
    UDP_RECEIVE_OPERATION,
    TCP_ACCEPT_OPERATION,
    PROCESS_SYSLOG_OPERATION,
    FLUSH_EVENTS_OPERATION,
];

/// 리스너가 넘긴 메시지를 정규화/보강하여 큐에 넣는 처리기
pub struct SyslogProcessor<P: GeoIpProvider = IpApiProvider> {
    normalizer: SyslogNormalizer,
    enricher: Option<Enricher<P>>,
    queue: Arc<EventQueue>,
    handler: Arc<ErrorHandler>,
}

impl<P: GeoIpProvider> SyslogProcessor<P> {
    pub fn new(
        normalizer: SyslogNormalizer,
        enricher: Option<Enricher<P>>,
        queue: Arc<EventQueue>,
        handler: Arc<ErrorHandler>,
    ) -> Self {
        Self {
            normalizer,
            enricher,
            queue,
            handler,
        }
    }

    /// 메시지 하나를 이벤트로 만듭니다. 이벤트가 없으면 `None`.
    pub async fn process(&self, message: &RawSyslogMessage) -> Option<NormalizedTrafficEvent> {
        let mut event = self
            .handler
            .safe_execute(PROCESS_SYSLOG_OPERATION, None, || {
                self.normalizer.normalize(message)
            })?;
        if let Some(enricher) = &self.enricher {
            enricher.enrich(&mut event).await;
        }
        Some(event)
    }
}

impl<P: GeoIpProvider> MessageHandler for SyslogProcessor<P> {
    async fn handle(&self, message: RawSyslogMessage) {
        let Some(event) = self.process(&message).await else {
            return;
        };
        if let Err(e) = self.queue.push(event).await {
            debug!(error = %e, device_ip = %message.source_ip, "event discarded");
        }
    }
}

/// syslog 수집 서비스
pub struct SyslogService<B: BrokerClient, P: GeoIpProvider = IpApiProvider> {
    config: CollectorConfig,
    info: PluginInfo,
    state: PluginState,
    handler: Arc<ErrorHandler>,
    geoip: Option<Arc<GeoIpService<P>>>,
    publisher: Arc<BatchPublisher<B>>,
    queue: Option<Arc<EventQueue>>,
    cancel: CancellationToken,
    listener_tasks: Vec<JoinHandle<()>>,
    publisher_task: Option<JoinHandle<()>>,
    local_addrs: Vec<SocketAddr>,
}

impl<B: BrokerClient, P: GeoIpProvider> SyslogService<B, P> {
    /// 서비스를 생성합니다. 설정이 잘못되었으면 에러를 반환합니다.
    ///
    /// `geoip`가 `None`이면 보강 시 공인 주소의 국가는 "Unknown"이 됩니다.
    pub fn new(
        config: CollectorConfig,
        broker: Arc<B>,
        handler: Arc<ErrorHandler>,
        geoip: Option<Arc<GeoIpService<P>>>,
    ) -> Result<Self, CollectorError> {
        config.validate()?;
        let publisher = Arc::new(BatchPublisher::new(
            broker,
            Arc::clone(&handler),
            config.batch_size,
            FLUSH_EVENTS_OPERATION,
            "syslog",
        ));
        Ok(Self {
            info: PluginInfo {
                name: MODULE_SYSLOG.to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                description: "syslog UDP/TCP collector".to_owned(),
                plugin_type: PluginType::Collector,
            },
            config,
            state: PluginState::Created,
            handler,
            geoip,
            publisher,
            queue: None,
            cancel: CancellationToken::new(),
            listener_tasks: Vec::new(),
            publisher_task: None,
            local_addrs: Vec::new(),
        })
    }

    /// 실제 바인드된 리스너 주소 (UDP, TCP 순)
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.local_addrs
    }

    /// 발행기 통계 접근
    pub fn publisher(&self) -> &BatchPublisher<B> {
        &self.publisher
    }

    pub fn error_handler(&self) -> &Arc<ErrorHandler> {
        &self.handler
    }

    /// 현재 큐에 대기 중인 이벤트 수
    pub async fn queued(&self) -> usize {
        match &self.queue {
            Some(queue) => queue.len().await,
            None => 0,
        }
    }

    /// 이번 실행에서 큐에 들어온 이벤트 수 (드롭 포함)
    pub async fn accepted(&self) -> u64 {
        match &self.queue {
            Some(queue) => queue.total_received().await,
            None => 0,
        }
    }

    fn processor(&self, queue: &Arc<EventQueue>) -> Result<SyslogProcessor<P>, CollectorError> {
        let normalizer = SyslogNormalizer::with_defaults(self.config.syslog.max_message_size)?
            .with_filtering(self.config.enable_filtering);
        let enricher = self
            .config
            .enable_enrichment
            .then(|| Enricher::new(Arc::clone(&self.handler), self.geoip.clone()));
        Ok(SyslogProcessor::new(
            normalizer,
            enricher,
            Arc::clone(queue),
            Arc::clone(&self.handler),
        ))
    }

    async fn bind_listeners(
        &self,
    ) -> Result<(Option<SyslogUdpListener>, Option<SyslogTcpListener>), CollectorError> {
        let addr = self.config.syslog_addr()?;
        let udp = if self.config.syslog.enable_udp {
            Some(
                SyslogUdpListener::bind(
                    addr,
                    self.config.syslog.max_message_size,
                    Arc::clone(&self.handler),
                )
                .await?,
            )
        } else {
            None
        };
        let tcp = if self.config.syslog.enable_tcp {
            let settings = TcpListenerSettings {
                max_message_size: self.config.syslog.max_message_size,
                max_connections: self.config.syslog.max_connections,
                idle_timeout: Duration::from_secs(self.config.syslog.connection_timeout_secs),
            };
            Some(SyslogTcpListener::bind(addr, settings, Arc::clone(&self.handler)).await?)
        } else {
            None
        };
        Ok((udp, tcp))
    }
}

impl<B: BrokerClient, P: GeoIpProvider> Pipeline for SyslogService<B, P> {
    async fn start(&mut self) -> Result<(), NetsentryError> {
        if self.state == PluginState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        let (udp, tcp) = match self.bind_listeners().await {
            Ok(bound) => bound,
            Err(e) => {
                self.state = PluginState::Failed;
                return Err(e.into());
            }
        };
        if udp.is_none() && tcp.is_none() {
            warn!("syslog service started with both UDP and TCP listeners disabled");
        }

        let queue = Arc::new(EventQueue::new(self.config.queue_capacity()));
        let processor = Arc::new(self.processor(&queue)?);
        self.cancel = CancellationToken::new();
        self.local_addrs.clear();

        let publisher = Arc::clone(&self.publisher);
        let consumer_queue = Arc::clone(&queue);
        self.publisher_task = Some(tokio::spawn(async move {
            publisher.run(consumer_queue).await;
        }));

        if let Some(listener) = udp {
            self.local_addrs.push(listener.local_addr()?);
            let task = tokio::spawn(listener.run(Arc::clone(&processor), self.cancel.clone()));
            self.listener_tasks.push(task);
        }
        if let Some(listener) = tcp {
            self.local_addrs.push(listener.local_addr()?);
            let task = tokio::spawn(listener.run(Arc::clone(&processor), self.cancel.clone()));
            self.listener_tasks.push(task);
        }

        self.queue = Some(queue);
        self.state = PluginState::Running;
        info!(
            addrs = ?self.local_addrs,
            queue_capacity = self.config.queue_capacity(),
            batch_size = self.config.batch_size,
            "syslog service started"
        );
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), NetsentryError> {
        if self.state != PluginState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping syslog service");
        self.cancel.cancel();
        for task in self.listener_tasks.drain(..) {
            if let Err(e) = task.await {
                warn!(error = %e, "syslog listener task failed");
            }
        }

        if let Some(queue) = self.queue.take() {
            let remaining = queue.len().await;
            queue.close().await;
            if remaining > 0 {
                info!(count = remaining, "flushing remaining queued events");
            }
        }
        if let Some(task) = self.publisher_task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "syslog publisher task failed");
            }
        }

        self.state = PluginState::Stopped;
        info!(
            published = self.publisher.published_events(),
            failed_batches = self.publisher.failed_batches(),
            "syslog service stopped"
        );
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PluginState::Running => {
                let broker_healthy = self.publisher.broker_healthy().await;
                running_health(
                    &self.handler,
                    |op| SYSLOG_OPERATIONS.contains(&op) || ENRICHMENT_OPERATIONS.contains(&op),
                    broker_healthy,
                )
            }
            PluginState::Created => HealthStatus::Unhealthy("not started".to_owned()),
            PluginState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
            PluginState::Failed => HealthStatus::Unhealthy("failed to start".to_owned()),
        }
    }
}

impl<B: BrokerClient, P: GeoIpProvider> Plugin for SyslogService<B, P> {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn state(&self) -> PluginState {
        self.state
    }
}
