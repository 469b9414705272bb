//! 파이프라인 trait -- 수집 서비스의 생명주기 확장 포인트 정의

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::NetsentryError;

/// `Send` 바운드가 있는 박싱된 future
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 컴포넌트 건강 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// 정상 동작
    Healthy,
    /// 동작 중이나 일부 기능 저하 (사유 포함)
    Degraded(String),
    /// 동작 불가 (사유 포함)
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

/// 시작/정지 가능한 수집 파이프라인
///
/// syslog 수집 서비스와 SNMP 폴링 서비스가 이 trait을 구현합니다.
pub trait Pipeline: Send + Sync {
    /// 파이프라인을 시작합니다. 백그라운드 태스크를 띄우고 즉시 반환합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), NetsentryError>> + Send;

    /// 파이프라인을 정지합니다. 버퍼에 남은 이벤트를 모두 플러시한 뒤 반환합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), NetsentryError>> + Send;

    /// 현재 건강 상태를 확인합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_predicates() {
        assert!(HealthStatus::Healthy.is_healthy());
        assert!(HealthStatus::Degraded("breaker open".to_owned()).is_degraded());
        assert!(HealthStatus::Unhealthy("stopped".to_owned()).is_unhealthy());
        assert!(!HealthStatus::Healthy.is_unhealthy());
    }
}
