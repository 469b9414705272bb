//! 배치 발행기
//!
//! [`BatchPublisher`]는 이벤트 배치를 [`BrokerClient`]로 보냅니다.
//! 발행은 항상 [`ErrorHandler`]를 거치며, 실패한 배치는 로그와 실패 통계만 남기고
//! 다시 큐에 넣지 않습니다 (at-most-once).
//!
//! [`run`](BatchPublisher::run)은 [`EventQueue`]의 단일 소비자로 동작합니다.
//! 배치가 `batch_size`에 도달하면 발행하고, 큐가 닫히면 남은 부분 배치를 발행한 뒤
//! 종료합니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use netsentry_core::event::NormalizedTrafficEvent;
use netsentry_core::metrics as m;
use tracing::{debug, info};

use crate::broker::BrokerClient;
use crate::buffer::EventQueue;
use crate::resilience::ErrorHandler;

/// syslog 큐 플러시 작업 이름
pub const FLUSH_EVENTS_OPERATION: &str = "FlushEventsBatch";

/// SNMP 누적 이벤트 플러시 작업 이름
pub const FLUSH_SNMP_OPERATION: &str = "FlushSnmpEvents";

/// 브로커 배치 발행기
pub struct BatchPublisher<B: BrokerClient> {
    broker: Arc<B>,
    handler: Arc<ErrorHandler>,
    batch_size: usize,
    /// error handler 작업 이름
    operation: &'static str,
    /// 메트릭 source 레이블
    source: &'static str,
    published_events: AtomicU64,
    published_batches: AtomicU64,
    failed_batches: AtomicU64,
}

impl<B: BrokerClient> BatchPublisher<B> {
    /// 새 발행기를 생성합니다. 배치 크기 0은 1로 취급합니다.
    pub fn new(
        broker: Arc<B>,
        handler: Arc<ErrorHandler>,
        batch_size: usize,
        operation: &'static str,
        source: &'static str,
    ) -> Self {
        Self {
            broker,
            handler,
            batch_size: batch_size.max(1),
            operation,
            source,
            published_events: AtomicU64::new(0),
            published_batches: AtomicU64::new(0),
            failed_batches: AtomicU64::new(0),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// 배치 하나를 발행합니다. 성공하면 `true`.
    ///
    /// 빈 배치는 브로커를 호출하지 않고 `true`입니다.
    pub async fn publish(&self, batch: Vec<NormalizedTrafficEvent>) -> bool {
        if batch.is_empty() {
            return true;
        }
        let count = batch.len();
        let published = self
            .handler
            .safe_execute_async(self.operation, false, || async {
                self.broker.publish_batch(&batch).await.map(|()| true)
            })
            .await;

        if published {
            self.published_batches.fetch_add(1, Ordering::Relaxed);
            self.published_events
                .fetch_add(count as u64, Ordering::Relaxed);
            metrics::counter!(m::PIPELINE_BATCHES_PUBLISHED_TOTAL, m::LABEL_SOURCE => self.source)
                .increment(1);
            metrics::counter!(m::PIPELINE_EVENTS_PUBLISHED_TOTAL, m::LABEL_SOURCE => self.source)
                .increment(count as u64);
            debug!(operation = self.operation, events = count, "batch published");
        } else {
            self.failed_batches.fetch_add(1, Ordering::Relaxed);
            metrics::counter!(m::PIPELINE_BATCHES_FAILED_TOTAL, m::LABEL_SOURCE => self.source)
                .increment(1);
            debug!(operation = self.operation, events = count, "batch discarded");
        }
        published
    }

    /// 큐를 소비하며 배치를 발행합니다. 큐가 닫히고 비워지면 반환합니다.
    pub async fn run(&self, queue: Arc<EventQueue>) {
        let mut batch = Vec::with_capacity(self.batch_size.min(10_000));
        while let Some(event) = queue.recv().await {
            batch.push(event);
            if batch.len() >= self.batch_size {
                let full = std::mem::replace(
                    &mut batch,
                    Vec::with_capacity(self.batch_size.min(10_000)),
                );
                self.publish(full).await;
            }
        }

        let remaining = batch.len();
        self.publish(batch).await;
        info!(
            operation = self.operation,
            flushed = remaining,
            published_events = self.published_events(),
            "publisher stopped"
        );
    }

    /// 발행 성공한 이벤트 수
    pub fn published_events(&self) -> u64 {
        self.published_events.load(Ordering::Relaxed)
    }

    /// 발행 성공한 배치 수
    pub fn published_batches(&self) -> u64 {
        self.published_batches.load(Ordering::Relaxed)
    }

    /// 실패하거나 차단되어 버려진 배치 수
    pub fn failed_batches(&self) -> u64 {
        self.failed_batches.load(Ordering::Relaxed)
    }

    /// 브로커 헬스 체크
    pub async fn broker_healthy(&self) -> bool {
        self.broker.health_check().await
    }
}
