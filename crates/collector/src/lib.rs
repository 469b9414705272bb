#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`collector`]: syslog UDP/TCP 리스너
//! - [`snmp`]: SNMP v2c 코덱, 클라이언트, 폴러
//! - [`parser`]: syslog 매처와 SNMP 정규화
//! - [`enrich`]: 프로토콜 분류와 GeoIP 보강
//! - [`buffer`]: 드롭 큐와 SNMP 누적기
//! - [`publisher`]: 배치 발행기
//! - [`broker`]: 브로커 클라이언트 trait과 기본 구현
//! - [`resilience`]: 작업별 circuit breaker와 safe-execution 래퍼
//! - [`service`]: 생명주기를 가진 syslog/SNMP 서비스 (Plugin 구현)
//! - [`config`]: 수집기 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! UDP/TCP -> SyslogNormalizer -> Enricher -> EventQueue ------> BatchPublisher -> broker
//! SnmpPoller -> SnmpNormalizer -> Enricher -> EventAccumulator -/
//!                                                 |
//!                                     ErrorHandler (circuit breakers)
//! ```

pub mod broker;
pub mod buffer;
pub mod config;
pub mod error;
pub mod publisher;
pub mod resilience;

pub mod collector;
pub mod enrich;
pub mod parser;
pub mod service;
pub mod snmp;

// --- 주요 타입 re-export ---

// 서비스
pub use service::{SnmpService, SyslogProcessor, SyslogService};

// 설정
pub use config::{CollectorConfig, CollectorConfigBuilder};

// 에러
pub use error::CollectorError;

// 에러 처리
pub use resilience::ErrorHandler;

// 정규화
pub use parser::{SnmpNormalizer, SyslogNormalizer};

// 보강
pub use enrich::{Enricher, GeoIpProvider, GeoIpService, IpApiProvider};

// 버퍼와 발행
pub use buffer::{EventAccumulator, EventQueue};
pub use publisher::BatchPublisher;

// 브로커
pub use broker::{BrokerClient, BrokerMessage, LoggingBroker, MemoryBroker};

// 수집기
pub use collector::{MessageHandler, SyslogTcpListener, SyslogUdpListener};

// SNMP
pub use snmp::{SnmpClient, SnmpPoller, UdpSnmpClient};
