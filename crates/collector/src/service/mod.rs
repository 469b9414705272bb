//! 수집 서비스 -- core [`Plugin`](netsentry_core::plugin::Plugin) 구현
//!
//! - [`SyslogService`]: UDP/TCP 리스너 -> 정규화 -> 보강 -> 드롭 큐 -> 배치 발행
//! - [`SnmpService`]: 폴러 -> 정규화 -> 보강 -> 누적기 -> 주기/임계값 발행
//!
//! 두 서비스는 같은 [`ErrorHandler`](crate::resilience::ErrorHandler)와
//! 브로커 클라이언트를 공유합니다.

pub mod snmp;
pub mod syslog;

pub use snmp::SnmpService;
pub use syslog::{SyslogProcessor, SyslogService};

use netsentry_core::pipeline::HealthStatus;

use crate::enrich::geoip::GEOIP_LOOKUP_OPERATION;
use crate::enrich::{BASIC_ENRICHMENT_OPERATION, GEOIP_ENRICHMENT_OPERATION};
use crate::resilience::ErrorHandler;

/// 보강 단계 작업 이름
pub(crate) const ENRICHMENT_OPERATIONS: [&str; 3] = [
    BASIC_ENRICHMENT_OPERATION,
    GEOIP_ENRICHMENT_OPERATION,
    GEOIP_LOOKUP_OPERATION,
];

/// 실행 중인 서비스의 건강 상태를 판정합니다.
///
/// `owns`가 참인 작업 중 차단된 것이 있거나 브로커가 응답하지 않으면 `Degraded`입니다.
pub(crate) fn running_health(
    handler: &ErrorHandler,
    owns: impl Fn(&str) -> bool,
    broker_healthy: bool,
) -> HealthStatus {
    let open: Vec<String> = handler
        .open_operations()
        .into_iter()
        .filter(|op| owns(op))
        .collect();
    if !open.is_empty() {
        return HealthStatus::Degraded(format!("circuit breaker open: {}", open.join(", ")));
    }
    if !broker_healthy {
        return HealthStatus::Degraded("broker health check failed".to_owned());
    }
    HealthStatus::Healthy
}
