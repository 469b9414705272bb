//! 작업별 누적 성공/실패 통계

use std::sync::atomic::{AtomicU64, Ordering};

/// 단일 작업 이름에 대한 누적 통계
///
/// 카운터는 단조 증가만 합니다.
#[derive(Debug, Default)]
pub struct ErrorMetrics {
    total: AtomicU64,
    failed: AtomicU64,
}

impl ErrorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_operations(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn failed_operations(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// 실패율 = 실패 / 전체. 기록이 없으면 0.
    #[allow(clippy::cast_precision_loss)]
    pub fn error_rate(&self) -> f64 {
        let total = self.total_operations();
        if total == 0 {
            return 0.0;
        }
        self.failed_operations() as f64 / total as f64
    }
}
