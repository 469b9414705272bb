//! 작업 단위 에러 처리기
//!
//! [`ErrorHandler`]는 이름 붙은 작업마다 circuit breaker와 누적 통계를 유지하고,
//! 실패 가능한 호출을 감싸는 safe-execution 래퍼를 제공합니다.
//!
//! 모든 호출 형태는 같은 규칙을 따릅니다.
//! 1. 차단 상태면 작업을 실행하지 않고 기본값을 반환
//! 2. 실행 후 `Ok`이면 성공 기록, `Err`이면 실패 기록 후 기본값 반환
//!
//! 핸들러는 명시적으로 생성하여 `Arc`로 각 호출 지점에 주입합니다.
//!
//! # 사용 예시
//! ```ignore
//! let handler = Arc::new(ErrorHandler::new());
//! let published = handler
//!     .safe_execute_async("FlushEventsBatch", false, || async {
//!         broker.publish_batch(&batch).await.map(|_| true)
//!     })
//!     .await;
//! ```

mod breaker;
mod stats;

pub use breaker::{BREAKER_COOLDOWN, CircuitBreakerState, FAILURE_THRESHOLD};
pub use stats::ErrorMetrics;

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use netsentry_core::metrics as m;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// 단일 작업의 상태 스냅샷
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationSnapshot {
    /// 작업 이름
    pub operation: String,
    /// breaker 상태 ("open" / "closed")
    pub state: &'static str,
    /// 현재 누적 실패 횟수 (리셋 이후)
    pub failure_count: u32,
    /// 전체 호출 수
    pub total_operations: u64,
    /// 실패 호출 수
    pub failed_operations: u64,
    /// 실패율
    pub error_rate: f64,
}

/// 작업별 circuit breaker 및 통계를 관리하는 에러 처리기
#[derive(Debug, Default)]
pub struct ErrorHandler {
    breakers: DashMap<String, Arc<CircuitBreakerState>>,
    metrics: DashMap<String, Arc<ErrorMetrics>>,
}

impl ErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn breaker(&self, operation: &str) -> Arc<CircuitBreakerState> {
        if let Some(state) = self.breakers.get(operation) {
            return Arc::clone(state.value());
        }
        Arc::clone(
            self.breakers
                .entry(operation.to_owned())
                .or_default()
                .value(),
        )
    }

    fn stats(&self, operation: &str) -> Arc<ErrorMetrics> {
        if let Some(stats) = self.metrics.get(operation) {
            return Arc::clone(stats.value());
        }
        Arc::clone(
            self.metrics
                .entry(operation.to_owned())
                .or_default()
                .value(),
        )
    }

    /// 작업을 건너뛰어야 하는지 확인합니다.
    ///
    /// 쿨다운이 지난 breaker는 이 호출에서 닫힙니다.
    pub fn should_circuit_break(&self, operation: &str) -> bool {
        match self.breakers.get(operation) {
            Some(state) => state.should_break(),
            None => false,
        }
    }

    /// 작업 성공을 기록합니다.
    pub fn record_success(&self, operation: &str) {
        self.breaker(operation).record_success();
        self.stats(operation).record_success();
    }

    /// 작업 실패를 기록합니다.
    pub fn record_failure(&self, operation: &str) {
        let opened = self.breaker(operation).record_failure();
        self.stats(operation).record_failure();
        metrics::counter!(m::BREAKER_FAILURES_TOTAL, m::LABEL_OPERATION => operation.to_owned())
            .increment(1);

        if opened {
            warn!(
                operation,
                threshold = FAILURE_THRESHOLD,
                cooldown_secs = BREAKER_COOLDOWN.as_secs(),
                "circuit breaker opened"
            );
        }
    }

    /// 래핑된 호출 없이 발생한 에러를 로그에 남기고 실패로 기록합니다.
    pub fn report(&self, operation: &str, err: &dyn Display) {
        error!(operation, error = %err, "operation failed");
        self.record_failure(operation);
    }

    fn short_circuit(&self, operation: &str) {
        debug!(operation, "circuit breaker open, skipping operation");
        metrics::counter!(
            m::BREAKER_SHORT_CIRCUITS_TOTAL,
            m::LABEL_OPERATION => operation.to_owned()
        )
        .increment(1);
    }

    /// 동기 작업을 실행합니다.
    pub fn safe_execute<T, E, F>(&self, operation: &str, default: T, f: F) -> T
    where
        E: Display,
        F: FnOnce() -> Result<T, E>,
    {
        if self.should_circuit_break(operation) {
            self.short_circuit(operation);
            return default;
        }

        match f() {
            Ok(value) => {
                self.record_success(operation);
                value
            }
            Err(e) => {
                self.report(operation, &e);
                default
            }
        }
    }

    /// 비동기 작업을 실행합니다.
    ///
    /// 차단 상태면 `f`를 호출하지 않으므로 future도 생성되지 않습니다.
    pub async fn safe_execute_async<T, E, F, Fut>(&self, operation: &str, default: T, f: F) -> T
    where
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if self.should_circuit_break(operation) {
            self.short_circuit(operation);
            return default;
        }

        match f().await {
            Ok(value) => {
                self.record_success(operation);
                value
            }
            Err(e) => {
                self.report(operation, &e);
                default
            }
        }
    }

    /// 반환값이 없는 동기 작업을 실행합니다.
    pub fn safe_execute_void<E, F>(&self, operation: &str, f: F)
    where
        E: Display,
        F: FnOnce() -> Result<(), E>,
    {
        self.safe_execute(operation, (), f);
    }

    /// 비동기 작업을 별도 태스크로 실행합니다 (fire-and-forget).
    ///
    /// 반환된 핸들은 필요할 때만 기다리면 됩니다.
    pub fn spawn_safe<E, Fut>(self: &Arc<Self>, operation: impl Into<String>, fut: Fut) -> JoinHandle<()>
    where
        E: Display + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        let handler = Arc::clone(self);
        let operation = operation.into();
        tokio::spawn(async move {
            handler
                .safe_execute_async(&operation, (), || fut)
                .await;
        })
    }

    /// 작업의 실패율. 기록이 없으면 0.
    pub fn error_rate(&self, operation: &str) -> f64 {
        self.metrics
            .get(operation)
            .map_or(0.0, |stats| stats.error_rate())
    }

    /// 현재 차단 상태인 작업 이름 목록 (정렬됨)
    pub fn open_operations(&self) -> Vec<String> {
        let mut open: Vec<String> = self
            .breakers
            .iter()
            .filter(|entry| entry.value().is_open())
            .map(|entry| entry.key().clone())
            .collect();
        open.sort_unstable();
        open
    }

    /// 모든 작업의 스냅샷 (작업 이름순)
    pub fn snapshot(&self) -> Vec<OperationSnapshot> {
        let mut snapshots: Vec<OperationSnapshot> = self
            .metrics
            .iter()
            .map(|entry| {
                let operation = entry.key().clone();
                let stats = entry.value();
                let (state, failure_count) = self
                    .breakers
                    .get(&operation)
                    .map_or(("closed", 0), |b| (b.state_name(), b.failure_count()));
                OperationSnapshot {
                    state,
                    failure_count,
                    total_operations: stats.total_operations(),
                    failed_operations: stats.failed_operations(),
                    error_rate: stats.error_rate(),
                    operation,
                }
            })
            .collect();
        snapshots.sort_by(|a, b| a.operation.cmp(&b.operation));
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn fail_n_times(handler: &ErrorHandler, op: &str, n: u32) {
        for _ in 0..n {
            handler.safe_execute(op, (), || Err::<(), _>("boom"));
        }
    }

    #[test]
    fn safe_execute_returns_value_on_success() {
        let handler = ErrorHandler::new();
        let value = handler.safe_execute("op", 0, || Ok::<_, String>(42));
        assert_eq!(value, 42);
        assert_eq!(handler.error_rate("op"), 0.0);
    }

    #[test]
    fn safe_execute_returns_default_on_failure() {
        let handler = ErrorHandler::new();
        let value = handler.safe_execute("op", -1, || Err::<i32, _>("bad input"));
        assert_eq!(value, -1);
        assert!((handler.error_rate("op") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn breaker_opens_after_threshold_and_skips_body() {
        let handler = ErrorHandler::new();
        fail_n_times(&handler, "ProcessSyslogMessage", FAILURE_THRESHOLD);
        assert!(handler.should_circuit_break("ProcessSyslogMessage"));

        let calls = AtomicUsize::new(0);
        let value = handler.safe_execute("ProcessSyslogMessage", "default", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>("ran")
        });
        assert_eq!(value, "default");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(handler.open_operations(), vec!["ProcessSyslogMessage"]);
    }

    #[test]
    fn nine_failures_keep_breaker_closed() {
        let handler = ErrorHandler::new();
        fail_n_times(&handler, "op", FAILURE_THRESHOLD - 1);
        assert!(!handler.should_circuit_break("op"));
    }

    #[test]
    fn operations_are_isolated() {
        let handler = ErrorHandler::new();
        fail_n_times(&handler, "geoip_lookup", FAILURE_THRESHOLD);
        assert!(handler.should_circuit_break("geoip_lookup"));
        assert!(!handler.should_circuit_break("FlushEventsBatch"));
    }

    #[test]
    fn success_resets_failure_count() {
        let handler = ErrorHandler::new();
        fail_n_times(&handler, "op", FAILURE_THRESHOLD - 1);
        handler.safe_execute_void("op", || Ok::<_, String>(()));
        fail_n_times(&handler, "op", FAILURE_THRESHOLD - 1);
        assert!(!handler.should_circuit_break("op"));
    }

    #[test]
    fn report_counts_as_failure() {
        let handler = ErrorHandler::new();
        for _ in 0..FAILURE_THRESHOLD {
            handler.report("UDP message receive", &"socket error");
        }
        assert!(handler.should_circuit_break("UDP message receive"));
    }

    #[tokio::test(start_paused = true)]
    async fn open_operations_drop_breakers_past_cooldown() {
        let handler = ErrorHandler::new();
        fail_n_times(&handler, "snmp_poll:10.0.0.1", FAILURE_THRESHOLD);
        assert_eq!(handler.open_operations(), vec!["snmp_poll:10.0.0.1"]);

        tokio::time::advance(BREAKER_COOLDOWN).await;
        assert!(handler.open_operations().is_empty());
        assert_eq!(handler.snapshot()[0].state, "closed");
    }

    #[test]
    fn snapshot_lists_operations_sorted() {
        let handler = ErrorHandler::new();
        handler.safe_execute_void("b", || Ok::<_, String>(()));
        handler.safe_execute_void("a", || Err::<(), _>("x"));

        let snapshot = handler.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].operation, "a");
        assert_eq!(snapshot[0].failed_operations, 1);
        assert_eq!(snapshot[0].state, "closed");
        assert_eq!(snapshot[1].operation, "b");
        assert_eq!(snapshot[1].total_operations, 1);
    }

    #[tokio::test]
    async fn async_body_not_invoked_when_open() {
        let handler = ErrorHandler::new();
        fail_n_times(&handler, "FlushEventsBatch", FAILURE_THRESHOLD);

        let calls = AtomicUsize::new(0);
        let result = handler
            .safe_execute_async("FlushEventsBatch", false, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(true)
            })
            .await;
        assert!(!result);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn breaker_recovers_after_cooldown_then_success_closes() {
        let handler = ErrorHandler::new();
        fail_n_times(&handler, "op", FAILURE_THRESHOLD);

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(handler.should_circuit_break("op"));

        tokio::time::advance(Duration::from_secs(1)).await;
        let value = handler
            .safe_execute_async("op", 0, || async { Ok::<_, String>(7) })
            .await;
        assert_eq!(value, 7);
        assert!(handler.open_operations().is_empty());
    }

    #[tokio::test]
    async fn spawn_safe_records_outcome() {
        let handler = Arc::new(ErrorHandler::new());
        handler
            .spawn_safe("spawned", async { Err::<(), _>("failed in task") })
            .await
            .unwrap();
        assert!((handler.error_rate("spawned") - 1.0).abs() < f64::EPSILON);
    }
}
