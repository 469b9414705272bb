//! 수집기 설정
//!
//! [`CollectorConfig`]는 core의 [`NetsentryConfig`](netsentry_core::config::NetsentryConfig)
//! 섹션들을 기반으로 수집 파이프라인 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use netsentry_core::config::NetsentryConfig;
//! use netsentry_collector::config::CollectorConfig;
//!
//! let core_config = NetsentryConfig::default();
//! let config = CollectorConfig::from_core(&core_config);
//! ```

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use netsentry_core::config::{GeoIpConfig, NetsentryConfig, SnmpConfig, SyslogConfig};
use serde::{Deserialize, Serialize};

use crate::error::CollectorError;

/// 수집 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// syslog 리스너 설정
    pub syslog: SyslogConfig,
    /// SNMP 폴러 설정
    pub snmp: SnmpConfig,
    /// GeoIP 조회 설정
    pub geoip: GeoIpConfig,
    /// 브로커 배치 크기
    pub batch_size: usize,
    /// 버퍼 크기 (syslog 큐 용량 = 2배, SNMP 즉시 플러시 임계값)
    pub buffer_size: usize,
    /// 주기적 플러시 간격 (초)
    pub flush_interval_secs: u64,
    /// 빈 메시지 필터링
    pub enable_filtering: bool,
    /// 분류 및 GeoIP 보강
    pub enable_enrichment: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self::from_core(&NetsentryConfig::default())
    }
}

impl CollectorConfig {
    /// core 설정에서 수집기 설정을 생성합니다.
    pub fn from_core(core: &NetsentryConfig) -> Self {
        Self {
            syslog: core.syslog.clone(),
            snmp: core.snmp.clone(),
            geoip: core.geoip.clone(),
            batch_size: core.broker.batch_size,
            buffer_size: core.processing.buffer_size,
            flush_interval_secs: core.processing.flush_interval_secs,
            enable_filtering: core.processing.enable_filtering,
            enable_enrichment: core.processing.enable_enrichment,
        }
    }

    /// syslog 큐 용량 (버퍼 크기의 2배)
    pub fn queue_capacity(&self) -> usize {
        self.buffer_size.saturating_mul(2)
    }

    /// 주기적 플러시 간격
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    /// syslog 리스너 바인드 주소
    pub fn syslog_addr(&self) -> Result<SocketAddr, CollectorError> {
        let ip: IpAddr = self
            .syslog
            .bind_address
            .parse()
            .map_err(|_| CollectorError::Config {
                field: "syslog.bind_address".to_owned(),
                reason: format!("'{}' is not an IP address", self.syslog.bind_address),
            })?;
        Ok(SocketAddr::new(ip, self.syslog.port))
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), CollectorError> {
        const MAX_BATCH_SIZE: usize = 100_000;
        const MAX_BUFFER_SIZE: usize = 5_000_000;
        const MAX_FLUSH_INTERVAL_SECS: u64 = 3600; // 1 hour

        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(CollectorError::Config {
                field: "batch_size".to_owned(),
                reason: format!("must be 1-{}", MAX_BATCH_SIZE),
            });
        }

        if self.buffer_size == 0 || self.buffer_size > MAX_BUFFER_SIZE {
            return Err(CollectorError::Config {
                field: "buffer_size".to_owned(),
                reason: format!("must be 1-{}", MAX_BUFFER_SIZE),
            });
        }

        if self.flush_interval_secs == 0 || self.flush_interval_secs > MAX_FLUSH_INTERVAL_SECS {
            return Err(CollectorError::Config {
                field: "flush_interval_secs".to_owned(),
                reason: format!("must be 1-{}", MAX_FLUSH_INTERVAL_SECS),
            });
        }

        if self.syslog.max_message_size == 0 {
            return Err(CollectorError::Config {
                field: "syslog.max_message_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.syslog.max_connections == 0 {
            return Err(CollectorError::Config {
                field: "syslog.max_connections".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.snmp.enabled && self.snmp.timeout_secs == 0 {
            return Err(CollectorError::Config {
                field: "snmp.timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        self.syslog_addr()?;
        Ok(())
    }
}

/// 수집기 설정 빌더
#[derive(Default)]
pub struct CollectorConfigBuilder {
    config: CollectorConfig,
}

impl CollectorConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// syslog 바인드 주소와 포트를 설정합니다.
    pub fn syslog_bind(mut self, address: impl Into<String>, port: u16) -> Self {
        self.config.syslog.bind_address = address.into();
        self.config.syslog.port = port;
        self
    }

    /// UDP/TCP 리스너 활성화 여부를 설정합니다.
    pub fn listeners(mut self, udp: bool, tcp: bool) -> Self {
        self.config.syslog.enable_udp = udp;
        self.config.syslog.enable_tcp = tcp;
        self
    }

    /// 메시지 최대 크기를 설정합니다.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.syslog.max_message_size = size;
        self
    }

    /// SNMP 설정을 교체합니다.
    pub fn snmp(mut self, snmp: SnmpConfig) -> Self {
        self.config.snmp = snmp;
        self
    }

    /// GeoIP 설정을 교체합니다.
    pub fn geoip(mut self, geoip: GeoIpConfig) -> Self {
        self.config.geoip = geoip;
        self
    }

    /// 배치 크기를 설정합니다.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// 버퍼 크기를 설정합니다.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    /// 플러시 간격(초)을 설정합니다.
    pub fn flush_interval_secs(mut self, secs: u64) -> Self {
        self.config.flush_interval_secs = secs;
        self
    }

    /// 필터링 여부를 설정합니다.
    pub fn enable_filtering(mut self, enabled: bool) -> Self {
        self.config.enable_filtering = enabled;
        self
    }

    /// 보강 여부를 설정합니다.
    pub fn enable_enrichment(mut self, enabled: bool) -> Self {
        self.config.enable_enrichment = enabled;
        self
    }

    /// 설정을 검증하고 `CollectorConfig`를 생성합니다.
    pub fn build(self) -> Result<CollectorConfig, CollectorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
