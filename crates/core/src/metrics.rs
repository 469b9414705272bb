//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `netsentry_`
//! - 영역명: `syslog_`, `snmp_`, `pipeline_`, `geoip_`, `breaker_`, `daemon_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(netsentry_core::metrics::SYSLOG_MESSAGES_RECEIVED_TOTAL, "transport" => "udp")
//!     .increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 전송 계층 레이블 키 (udp, tcp)
pub const LABEL_TRANSPORT: &str = "transport";

/// 수집 경로 레이블 키 (syslog, snmp)
pub const LABEL_SOURCE: &str = "source";

/// 작업 이름 레이블 키 (circuit breaker 작업명)
pub const LABEL_OPERATION: &str = "operation";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Syslog 메트릭 ─────────────────────────────────────────────────

/// Syslog: 수신된 메시지 수 (counter, label: transport)
pub const SYSLOG_MESSAGES_RECEIVED_TOTAL: &str = "netsentry_syslog_messages_received_total";

/// Syslog: 어떤 형식에도 매칭되지 않아 버려진 메시지 수 (counter)
pub const SYSLOG_MESSAGES_UNPARSED_TOTAL: &str = "netsentry_syslog_messages_unparsed_total";

/// Syslog: 활성 TCP 연결 수 (gauge)
pub const SYSLOG_TCP_ACTIVE_CONNECTIONS: &str = "netsentry_syslog_tcp_active_connections";

// ─── SNMP 메트릭 ───────────────────────────────────────────────────

/// SNMP: 완료된 대상 폴링 수 (counter)
pub const SNMP_POLLS_TOTAL: &str = "netsentry_snmp_polls_total";

/// SNMP: 실패한 OID 조회 수 (counter)
pub const SNMP_OID_FAILURES_TOTAL: &str = "netsentry_snmp_oid_failures_total";

// ─── Pipeline 메트릭 ───────────────────────────────────────────────

/// Pipeline: 정규화된 이벤트 수 (counter, label: source)
pub const PIPELINE_EVENTS_NORMALIZED_TOTAL: &str = "netsentry_pipeline_events_normalized_total";

/// Pipeline: 큐 오버플로로 버려진 이벤트 수 (counter)
pub const PIPELINE_EVENTS_DROPPED_TOTAL: &str = "netsentry_pipeline_events_dropped_total";

/// Pipeline: 큐 내 이벤트 수 (gauge, label: source)
pub const PIPELINE_QUEUE_DEPTH: &str = "netsentry_pipeline_queue_depth";

/// Pipeline: 발행된 배치 수 (counter, label: source)
pub const PIPELINE_BATCHES_PUBLISHED_TOTAL: &str = "netsentry_pipeline_batches_published_total";

/// Pipeline: 발행 실패로 버려진 배치 수 (counter, label: source)
pub const PIPELINE_BATCHES_FAILED_TOTAL: &str = "netsentry_pipeline_batches_failed_total";

/// Pipeline: 발행된 이벤트 수 (counter)
pub const PIPELINE_EVENTS_PUBLISHED_TOTAL: &str = "netsentry_pipeline_events_published_total";

// ─── GeoIP 메트릭 ──────────────────────────────────────────────────

/// GeoIP: 외부 조회 수 (counter, label: result)
pub const GEOIP_LOOKUPS_TOTAL: &str = "netsentry_geoip_lookups_total";

/// GeoIP: 캐시 적중 수 (counter)
pub const GEOIP_CACHE_HITS_TOTAL: &str = "netsentry_geoip_cache_hits_total";

// ─── Circuit Breaker 메트릭 ────────────────────────────────────────

/// Breaker: 차단되어 실행되지 않은 호출 수 (counter, label: operation)
pub const BREAKER_SHORT_CIRCUITS_TOTAL: &str = "netsentry_breaker_short_circuits_total";

/// Breaker: 기록된 작업 실패 수 (counter, label: operation)
pub const BREAKER_FAILURES_TOTAL: &str = "netsentry_breaker_failures_total";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "netsentry_daemon_uptime_seconds";

/// Daemon: 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "netsentry_daemon_build_info";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        SYSLOG_MESSAGES_RECEIVED_TOTAL,
        "Syslog messages received per transport"
    );
    describe_counter!(
        SYSLOG_MESSAGES_UNPARSED_TOTAL,
        "Syslog messages that matched no known format"
    );
    describe_gauge!(
        SYSLOG_TCP_ACTIVE_CONNECTIONS,
        "Currently open syslog TCP connections"
    );

    describe_counter!(SNMP_POLLS_TOTAL, "Completed SNMP target polling passes");
    describe_counter!(SNMP_OID_FAILURES_TOTAL, "SNMP GET requests that failed");

    describe_counter!(
        PIPELINE_EVENTS_NORMALIZED_TOTAL,
        "Traffic events produced by the normalizer"
    );
    describe_counter!(
        PIPELINE_EVENTS_DROPPED_TOTAL,
        "Traffic events evicted by the drop-oldest queue"
    );
    describe_gauge!(PIPELINE_QUEUE_DEPTH, "Events waiting to be published");
    describe_counter!(
        PIPELINE_BATCHES_PUBLISHED_TOTAL,
        "Batches handed to the broker client"
    );
    describe_counter!(
        PIPELINE_BATCHES_FAILED_TOTAL,
        "Batches discarded after a failed or skipped publish"
    );
    describe_counter!(
        PIPELINE_EVENTS_PUBLISHED_TOTAL,
        "Events handed to the broker client"
    );

    describe_counter!(GEOIP_LOOKUPS_TOTAL, "External GeoIP lookups");
    describe_counter!(GEOIP_CACHE_HITS_TOTAL, "GeoIP lookups served from cache");

    describe_counter!(
        BREAKER_SHORT_CIRCUITS_TOTAL,
        "Calls skipped because the operation's breaker was open"
    );
    describe_counter!(
        BREAKER_FAILURES_TOTAL,
        "Failures recorded against a named operation"
    );

    describe_gauge!(DAEMON_UPTIME_SECONDS, "NetSentry daemon uptime in seconds");
    describe_gauge!(
        DAEMON_BUILD_INFO,
        "Build information (always 1, with version label)"
    );
}
