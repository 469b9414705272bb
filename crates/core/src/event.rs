//! 이벤트 모델 -- 파이프라인을 흐르는 정규화 트래픽 레코드
//!
//! [`NormalizedTrafficEvent`]는 수집 경로(syslog, SNMP)와 무관한 단일 레코드 형식입니다.
//! 파서가 생성하고 보강(enrichment) 단계가 제자리에서 수정하며,
//! 이벤트 버퍼에 넘겨진 뒤에는 더 이상 변경되지 않습니다.
//!
//! `id`와 `timestamp`는 생성 시점에 한 번 정해지고 getter만 제공합니다.
//! 메타데이터는 추가/덮어쓰기만 가능하고 삭제 API는 없습니다.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{SourceKind, TrafficAction};

// --- 모듈명 상수 ---

/// syslog 수집 서비스 모듈명
pub const MODULE_SYSLOG: &str = "syslog-collector";
/// SNMP 폴링 서비스 모듈명
pub const MODULE_SNMP: &str = "snmp-poller";

/// 정규화된 네트워크 트래픽 이벤트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTrafficEvent {
    id: String,
    timestamp: DateTime<Utc>,
    /// 수집 경로
    pub source: SourceKind,
    /// 이벤트를 보고한 장비 IP
    pub device_ip: String,
    /// 추정 장비 유형 (예: "cisco-firewall", "network-device")
    pub device_type: String,
    /// 전송 프로토콜 또는 통계 레이블 (예: "tcp", "interface-stats")
    pub protocol: String,
    /// 출발지 IP
    pub source_ip: Option<String>,
    /// 목적지 IP
    pub destination_ip: Option<String>,
    /// 출발지 포트
    pub source_port: Option<u16>,
    /// 목적지 포트
    pub destination_port: Option<u16>,
    /// 전송 바이트 (SNMP는 누적 카운터일 수 있음)
    pub bytes_transferred: u64,
    /// 처리 결과
    pub action: TrafficAction,
    /// 감사용 원문 메시지
    pub raw_message: String,
    metadata: BTreeMap<String, serde_json::Value>,
}

impl NormalizedTrafficEvent {
    /// 현재 시각을 수집 시각으로 하는 이벤트를 생성합니다.
    pub fn new(source: SourceKind, device_ip: impl Into<String>) -> Self {
        Self::captured_at(source, device_ip, Utc::now())
    }

    /// 지정한 수집 시각으로 이벤트를 생성합니다.
    pub fn captured_at(
        source: SourceKind,
        device_ip: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            source,
            device_ip: device_ip.into(),
            device_type: String::new(),
            protocol: String::new(),
            source_ip: None,
            destination_ip: None,
            source_port: None,
            destination_port: None,
            bytes_transferred: 0,
            action: TrafficAction::Unknown,
            raw_message: String::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// 이벤트 고유 ID (UUID v4)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 수집 시각
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// 메타데이터 항목을 추가하거나 덮어씁니다.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// 여러 메타데이터 항목을 한 번에 추가합니다.
    pub fn extend_metadata<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        for (key, value) in entries {
            self.set_metadata(key, value);
        }
    }

    /// 전체 메타데이터
    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    /// 단일 메타데이터 값
    pub fn metadata_value(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    /// 문자열 메타데이터 값
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

impl fmt::Display for NormalizedTrafficEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} {}:{} -> {}:{} action={} bytes={}",
            self.source,
            self.device_ip,
            self.protocol,
            self.source_ip.as_deref().unwrap_or("-"),
            OptPort(self.source_port),
            self.destination_ip.as_deref().unwrap_or("-"),
            OptPort(self.destination_port),
            self.action,
            self.bytes_transferred,
        )
    }
}

struct OptPort(Option<u16>);

impl fmt::Display for OptPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(port) => write!(f, "{port}"),
            None => f.write_str("-"),
        }
    }
}

/// 수신된 원시 syslog 메시지
///
/// 한 번의 파싱 호출 동안만 유지됩니다.
#[derive(Debug, Clone)]
pub struct RawSyslogMessage {
    /// 수신 시각
    pub received_at: DateTime<Utc>,
    /// 송신 장비 IP
    pub source_ip: String,
    /// 원문 텍스트
    pub text: String,
}

impl RawSyslogMessage {
    /// 현재 시각으로 수신 메시지를 생성합니다.
    pub fn new(source_ip: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            received_at: Utc::now(),
            source_ip: source_ip.into(),
            text: text.into(),
        }
    }
}
