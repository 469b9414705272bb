//! 작업별 circuit breaker 상태
//!
//! 잠금 없이 원자 연산만으로 상태를 관리합니다.
//! 시간은 `tokio::time::Instant` 기준이므로 `start_paused` 테스트에서 가상 시간이 적용됩니다.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// 차단(open) 전환에 필요한 실패 횟수
pub const FAILURE_THRESHOLD: u32 = 10;

/// 마지막 실패 이후 다시 닫히기까지의 대기 시간
pub const BREAKER_COOLDOWN: Duration = Duration::from_secs(30);

const NO_FAILURE: u64 = u64::MAX;

/// 단일 작업 이름에 대한 circuit breaker 상태
#[derive(Debug)]
pub struct CircuitBreakerState {
    failure_count: AtomicU32,
    open: AtomicBool,
    /// `epoch` 기준 마지막 실패 시각 (밀리초)
    last_failure_ms: AtomicU64,
    epoch: Instant,
}

impl CircuitBreakerState {
    pub fn new() -> Self {
        Self {
            failure_count: AtomicU32::new(0),
            open: AtomicBool::new(false),
            last_failure_ms: AtomicU64::new(NO_FAILURE),
            epoch: Instant::now(),
        }
    }

    /// 호출을 건너뛰어야 하는지 확인합니다.
    ///
    /// 열린 상태에서 쿨다운이 지났으면 카운터를 초기화하고 닫습니다.
    pub fn should_break(&self) -> bool {
        if !self.open.load(Ordering::Acquire) {
            return false;
        }

        match self.since_last_failure() {
            Some(elapsed) if elapsed < BREAKER_COOLDOWN => true,
            _ => {
                self.reset();
                false
            }
        }
    }

    /// 성공을 기록합니다. 카운터를 초기화하고 닫습니다.
    pub fn record_success(&self) {
        self.reset();
    }

    /// 실패를 기록합니다.
    ///
    /// 이번 실패로 차단 상태로 전환되었으면 `true`를 반환합니다.
    pub fn record_failure(&self) -> bool {
        let now_ms = u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(NO_FAILURE - 1);
        self.last_failure_ms.store(now_ms, Ordering::Release);

        let count = self.failure_count.fetch_add(1, Ordering::AcqRel).saturating_add(1);
        if count >= FAILURE_THRESHOLD {
            return !self.open.swap(true, Ordering::AcqRel);
        }
        false
    }

    /// 현재 누적 실패 횟수
    pub fn failure_count(&self) -> u32 {
        self.failure_count.load(Ordering::Acquire)
    }

    /// 차단 상태 여부
    ///
    /// 쿨다운이 지난 breaker는 아직 리셋되지 않았어도 닫힌 것으로 봅니다.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
            && self
                .since_last_failure()
                .is_some_and(|elapsed| elapsed < BREAKER_COOLDOWN)
    }

    /// 상태 이름 ("open" 또는 "closed")
    pub fn state_name(&self) -> &'static str {
        if self.is_open() { "open" } else { "closed" }
    }

    /// 마지막 실패 이후 경과 시간
    pub fn since_last_failure(&self) -> Option<Duration> {
        let last = self.last_failure_ms.load(Ordering::Acquire);
        if last == NO_FAILURE {
            return None;
        }
        let now_ms = u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX);
        Some(Duration::from_millis(now_ms.saturating_sub(last)))
    }

    fn reset(&self) {
        self.failure_count.store(0, Ordering::Release);
        self.open.store(false, Ordering::Release);
    }
}

impl Default for CircuitBreakerState {
    fn default() -> Self {
        Self::new()
    }
}
