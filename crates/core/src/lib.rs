//! NetSentry 공통 크레이트
//!
//! 수집기와 데몬이 공유하는 에러, 설정, 이벤트 모델, 생명주기 trait,
//! 메트릭 이름을 정의합니다.

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod pipeline;
pub mod plugin;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{BrokerError, ConfigError, NetsentryError, ParseError, PipelineError, PluginError};

// 설정
pub use config::NetsentryConfig;

// 이벤트
pub use event::{NormalizedTrafficEvent, RawSyslogMessage};

// 파이프라인 trait
pub use pipeline::{BoxFuture, HealthStatus, Pipeline};
pub use plugin::{DynPlugin, Plugin, PluginInfo, PluginRegistry, PluginState, PluginType};

// 도메인 타입
pub use types::{SnmpTarget, SourceKind, TrafficAction};
