//! 이벤트 버퍼링
//!
//! 두 가지 전략을 제공합니다.
//!
//! - [`EventQueue`]: 고정 용량 큐. 가득 차면 가장 오래된 이벤트를 버리고 새 이벤트를
//!   넣으므로 생산자를 막지 않습니다. 단일 소비자가 FIFO 순서로 꺼냅니다. (syslog 경로)
//! - [`EventAccumulator`]: 용량 제한 없는 누적 저장소. 타이머나 임계값에 따라
//!   배치 단위로 드레인합니다. (SNMP 경로)

use std::collections::VecDeque;

use netsentry_core::event::NormalizedTrafficEvent;
use netsentry_core::metrics as m;
use tokio::sync::{Mutex, Notify};

use crate::error::CollectorError;

struct QueueState {
    items: VecDeque<NormalizedTrafficEvent>,
    closed: bool,
    dropped_count: u64,
    total_received: u64,
}

/// drop-oldest 고정 용량 이벤트 큐
///
/// 여러 생산자가 동시에 [`push`](Self::push)할 수 있고, 소비자는 하나를 가정합니다.
/// [`close`](Self::close) 이후 남은 이벤트는 모두 꺼낼 수 있으며, 비워지면
/// [`recv`](Self::recv)가 `None`을 반환합니다.
pub struct EventQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    capacity: usize,
}

impl EventQueue {
    /// 새 큐를 생성합니다. 용량 0은 1로 취급합니다.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.min(10_000)),
                closed: false,
                dropped_count: 0,
                total_received: 0,
            }),
            notify: Notify::new(),
            capacity,
        }
    }

    /// 이벤트를 추가합니다.
    ///
    /// 드롭이 발생하면 `Ok(true)`, 닫힌 큐에는 `CollectorError::Channel`을 반환합니다.
    pub async fn push(&self, event: NormalizedTrafficEvent) -> Result<bool, CollectorError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(CollectorError::Channel("event queue closed".to_owned()));
        }
        state.total_received += 1;

        let mut dropped = false;
        if state.items.len() >= self.capacity {
            state.dropped_count += 1;
            dropped = true;
            metrics::counter!(m::PIPELINE_EVENTS_DROPPED_TOTAL).increment(1);
            state.items.pop_front();
            tracing::warn!(
                dropped = state.dropped_count,
                capacity = self.capacity,
                "event queue full, dropped oldest event"
            );
        }

        state.items.push_back(event);
        metrics::gauge!(m::PIPELINE_QUEUE_DEPTH).set(state.items.len() as f64);
        drop(state);
        self.notify.notify_one();
        Ok(dropped)
    }

    /// 다음 이벤트를 꺼냅니다. 비어 있으면 새 이벤트나 종료를 기다립니다.
    ///
    /// 닫히고 비워진 큐는 `None`을 반환합니다.
    pub async fn recv(&self) -> Option<NormalizedTrafficEvent> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock().await;
                if let Some(event) = state.items.pop_front() {
                    metrics::gauge!(m::PIPELINE_QUEUE_DEPTH).set(state.items.len() as f64);
                    return Some(event);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// 큐를 닫습니다. 이후 push는 실패하고, 남은 이벤트는 계속 꺼낼 수 있습니다.
    pub async fn close(&self) {
        self.state.lock().await.closed = true;
        self.notify.notify_waiters();
        self.notify.notify_one();
    }

    /// 남은 이벤트를 모두 꺼냅니다.
    pub async fn drain(&self) -> Vec<NormalizedTrafficEvent> {
        let mut state = self.state.lock().await;
        metrics::gauge!(m::PIPELINE_QUEUE_DEPTH).set(0.0);
        state.items.drain(..).collect()
    }

    /// 현재 저장된 이벤트 수
    pub async fn len(&self) -> usize {
        self.state.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.items.is_empty()
    }

    /// 최대 용량
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 지금까지 드롭된 이벤트 수
    pub async fn dropped_count(&self) -> u64 {
        self.state.lock().await.dropped_count
    }

    /// 총 유입 이벤트 수
    pub async fn total_received(&self) -> u64 {
        self.state.lock().await.total_received
    }
}

/// 용량 제한 없는 이벤트 누적기
///
/// 드레인 순서는 보장하지 않습니다. 한 번 드레인된 이벤트는 다시 나오지 않습니다.
#[derive(Default)]
pub struct EventAccumulator {
    items: Mutex<Vec<NormalizedTrafficEvent>>,
}

impl EventAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이벤트를 추가하고 추가 후 누적 개수를 반환합니다.
    pub async fn extend(&self, events: impl IntoIterator<Item = NormalizedTrafficEvent>) -> usize {
        let mut items = self.items.lock().await;
        items.extend(events);
        items.len()
    }

    /// 최대 `batch_size`개를 꺼냅니다.
    pub async fn drain_batch(&self, batch_size: usize) -> Vec<NormalizedTrafficEvent> {
        let mut items = self.items.lock().await;
        let count = batch_size.min(items.len());
        items.drain(..count).collect()
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }
}
