//! 설정 관리 -- netsentry.toml 파싱 및 런타임 설정
//!
//! [`NetsentryConfig`]는 모든 서비스의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`NETSENTRY_SYSLOG_PORT=5514` 형식)
//! 3. 설정 파일 (`netsentry.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), netsentry_core::error::NetsentryError> {
//! use netsentry_core::config::NetsentryConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = NetsentryConfig::load("netsentry.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = NetsentryConfig::parse("[syslog]\nport = 5514")?;
//! # Ok(())
//! # }
//! ```

use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, NetsentryError};
use crate::types::SnmpTarget;

/// syslog 메시지 최소 허용 크기 (바이트)
pub const MIN_MESSAGE_SIZE: usize = 512;
/// syslog 메시지 최대 허용 크기 (바이트)
pub const MAX_MESSAGE_SIZE: usize = 65_536;

/// NetSentry 통합 설정
///
/// `netsentry.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 서비스는 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetsentryConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// syslog 리스너 설정
    #[serde(default)]
    pub syslog: SyslogConfig,
    /// SNMP 폴러 설정
    #[serde(default)]
    pub snmp: SnmpConfig,
    /// 메시지 브로커 설정
    #[serde(default)]
    pub broker: BrokerConfig,
    /// 처리(필터링/보강/버퍼) 설정
    #[serde(default)]
    pub processing: ProcessingConfig,
    /// GeoIP 조회 설정
    #[serde(default)]
    pub geoip: GeoIpConfig,
    /// Prometheus 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl NetsentryConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, NetsentryError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, NetsentryError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                NetsentryError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                NetsentryError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, NetsentryError> {
        toml::from_str(toml_str).map_err(|e| {
            NetsentryError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `NETSENTRY_{SECTION}_{FIELD}`
    /// SNMP 대상 목록은 파일로만 설정합니다.
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "NETSENTRY_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "NETSENTRY_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.pid_file, "NETSENTRY_GENERAL_PID_FILE");

        // Syslog
        override_u16(&mut self.syslog.port, "NETSENTRY_SYSLOG_PORT");
        override_string(
            &mut self.syslog.bind_address,
            "NETSENTRY_SYSLOG_BIND_ADDRESS",
        );
        override_bool(&mut self.syslog.enable_udp, "NETSENTRY_SYSLOG_ENABLE_UDP");
        override_bool(&mut self.syslog.enable_tcp, "NETSENTRY_SYSLOG_ENABLE_TCP");
        override_usize(
            &mut self.syslog.max_message_size,
            "NETSENTRY_SYSLOG_MAX_MESSAGE_SIZE",
        );
        override_usize(
            &mut self.syslog.max_connections,
            "NETSENTRY_SYSLOG_MAX_CONNECTIONS",
        );

        // SNMP
        override_bool(&mut self.snmp.enabled, "NETSENTRY_SNMP_ENABLED");
        override_u64(
            &mut self.snmp.polling_interval_secs,
            "NETSENTRY_SNMP_POLLING_INTERVAL_SECS",
        );
        override_u64(&mut self.snmp.timeout_secs, "NETSENTRY_SNMP_TIMEOUT_SECS");
        override_u32(&mut self.snmp.retries, "NETSENTRY_SNMP_RETRIES");

        // Broker
        override_csv(
            &mut self.broker.bootstrap_servers,
            "NETSENTRY_BROKER_BOOTSTRAP_SERVERS",
        );
        override_string(&mut self.broker.topic_name, "NETSENTRY_BROKER_TOPIC_NAME");
        override_usize(&mut self.broker.batch_size, "NETSENTRY_BROKER_BATCH_SIZE");
        override_u64(&mut self.broker.linger_ms, "NETSENTRY_BROKER_LINGER_MS");

        // Processing
        override_bool(
            &mut self.processing.enable_filtering,
            "NETSENTRY_PROCESSING_ENABLE_FILTERING",
        );
        override_bool(
            &mut self.processing.enable_enrichment,
            "NETSENTRY_PROCESSING_ENABLE_ENRICHMENT",
        );
        override_usize(
            &mut self.processing.buffer_size,
            "NETSENTRY_PROCESSING_BUFFER_SIZE",
        );
        override_u64(
            &mut self.processing.flush_interval_secs,
            "NETSENTRY_PROCESSING_FLUSH_INTERVAL_SECS",
        );

        // GeoIP
        override_bool(&mut self.geoip.enabled, "NETSENTRY_GEOIP_ENABLED");
        override_string(&mut self.geoip.base_url, "NETSENTRY_GEOIP_BASE_URL");
        override_u64(&mut self.geoip.timeout_ms, "NETSENTRY_GEOIP_TIMEOUT_MS");

        // Metrics
        override_bool(&mut self.metrics.enabled, "NETSENTRY_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "NETSENTRY_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "NETSENTRY_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), NetsentryError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        // Syslog
        if self.syslog.port == 0 {
            return Err(invalid("syslog.port", "must be non-zero"));
        }
        if self.syslog.bind_address.parse::<IpAddr>().is_err() {
            return Err(invalid(
                "syslog.bind_address",
                format!("'{}' is not an IP address", self.syslog.bind_address),
            ));
        }
        if !(MIN_MESSAGE_SIZE..=MAX_MESSAGE_SIZE).contains(&self.syslog.max_message_size) {
            return Err(invalid(
                "syslog.max_message_size",
                format!("must be between {MIN_MESSAGE_SIZE} and {MAX_MESSAGE_SIZE}"),
            ));
        }
        if self.syslog.max_connections == 0 {
            return Err(invalid("syslog.max_connections", "must be greater than 0"));
        }

        // SNMP
        if self.snmp.enabled {
            if self.snmp.polling_interval_secs == 0 {
                return Err(invalid(
                    "snmp.polling_interval_secs",
                    "must be greater than 0",
                ));
            }
            if self.snmp.timeout_secs == 0 {
                return Err(invalid("snmp.timeout_secs", "must be greater than 0"));
            }
            for (idx, target) in self.snmp.targets.iter().enumerate() {
                if target.ip_address.parse::<IpAddr>().is_err() {
                    return Err(invalid(
                        &format!("snmp.targets[{idx}].ip_address"),
                        format!("'{}' is not an IP address", target.ip_address),
                    ));
                }
                if target.port == 0 {
                    return Err(invalid(
                        &format!("snmp.targets[{idx}].port"),
                        "must be non-zero",
                    ));
                }
            }
        }

        // Broker
        if self.broker.batch_size == 0 {
            return Err(invalid("broker.batch_size", "must be greater than 0"));
        }
        if self.broker.topic_name.trim().is_empty() {
            return Err(invalid("broker.topic_name", "must not be empty"));
        }

        // Processing
        if self.processing.buffer_size == 0 {
            return Err(invalid("processing.buffer_size", "must be greater than 0"));
        }
        if self.processing.flush_interval_secs == 0 {
            return Err(invalid(
                "processing.flush_interval_secs",
                "must be greater than 0",
            ));
        }

        // GeoIP
        if self.geoip.enabled && self.geoip.timeout_ms == 0 {
            return Err(invalid("geoip.timeout_ms", "must be greater than 0"));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> NetsentryError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// PID 파일 경로 (빈 문자열이면 사용하지 않음)
    pub pid_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            pid_file: String::new(),
        }
    }
}

/// syslog 리스너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyslogConfig {
    /// 수신 포트 (UDP, TCP 공통)
    pub port: u16,
    /// 바인드 주소
    pub bind_address: String,
    /// UDP 리스너 활성화
    pub enable_udp: bool,
    /// TCP 리스너 활성화
    pub enable_tcp: bool,
    /// 메시지 최대 크기 (바이트)
    pub max_message_size: usize,
    /// 최대 동시 TCP 연결 수
    pub max_connections: usize,
    /// TCP 유휴 타임아웃 (초)
    pub connection_timeout_secs: u64,
}

impl Default for SyslogConfig {
    fn default() -> Self {
        Self {
            port: 514,
            bind_address: "0.0.0.0".to_owned(),
            enable_udp: true,
            enable_tcp: true,
            max_message_size: 8192,
            max_connections: 256,
            connection_timeout_secs: 300,
        }
    }
}

/// SNMP 폴러 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnmpConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 폴링 주기 (초)
    pub polling_interval_secs: u64,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 타임아웃 시 재시도 횟수
    pub retries: u32,
    /// 폴링 대상 목록
    pub targets: Vec<SnmpTarget>,
}

impl Default for SnmpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            polling_interval_secs: 30,
            timeout_secs: 5,
            retries: 3,
            targets: Vec::new(),
        }
    }
}

/// 메시지 브로커 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// 부트스트랩 서버 목록
    pub bootstrap_servers: Vec<String>,
    /// 발행 토픽
    pub topic_name: String,
    /// 배치 크기
    pub batch_size: usize,
    /// 배치 대기 시간 (밀리초)
    pub linger_ms: u64,
    /// 헬스 체크 타임아웃 (초)
    pub health_timeout_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: vec!["localhost:9092".to_owned()],
            topic_name: "network-traffic".to_owned(),
            batch_size: 100,
            linger_ms: 100,
            health_timeout_secs: 5,
        }
    }
}

/// 처리 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// 빈 메시지 필터링
    pub enable_filtering: bool,
    /// 분류 및 GeoIP 보강
    pub enable_enrichment: bool,
    /// 버퍼 크기 (syslog 큐 용량은 이 값의 2배)
    pub buffer_size: usize,
    /// 주기적 플러시 간격 (초)
    pub flush_interval_secs: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            enable_filtering: true,
            enable_enrichment: true,
            buffer_size: 1000,
            flush_interval_secs: 5,
        }
    }
}

/// GeoIP 조회 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoIpConfig {
    /// 외부 조회 활성화 (비활성화 시 사설 주소만 "Local"로 해석)
    pub enabled: bool,
    /// 조회 서비스 기본 URL
    pub base_url: String,
    /// HTTP 타임아웃 (밀리초)
    pub timeout_ms: u64,
    /// 캐시 TTL (초)
    pub cache_ttl_secs: u64,
    /// 캐시 최대 엔트리 수
    pub max_cache_entries: usize,
    /// User-Agent 헤더
    pub user_agent: String,
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://ip-api.com".to_owned(),
            timeout_ms: 2000,
            cache_ttl_secs: 24 * 60 * 60,
            max_cache_entries: 10_000,
            user_agent: concat!("netsentry-collector/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 바인드 주소
    pub listen_addr: String,
    /// 포트
    pub port: u16,
    /// 스크레이프 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    override_parsed(target, env_key, "bool");
}

fn override_usize(target: &mut usize, env_key: &str) {
    override_parsed(target, env_key, "usize");
}

fn override_u16(target: &mut u16, env_key: &str) {
    override_parsed(target, env_key, "u16");
}

fn override_u32(target: &mut u32, env_key: &str) {
    override_parsed(target, env_key, "u32");
}

fn override_u64(target: &mut u64, env_key: &str) {
    override_parsed(target, env_key, "u64");
}

fn override_parsed<T: std::str::FromStr>(target: &mut T, env_key: &str, type_name: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                expected = type_name,
                "failed to parse env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
