//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 수집기, 데몬이 공유하는 작은 값 타입들을 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 이벤트 수집 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// UDP/TCP syslog 수신
    Syslog,
    /// SNMP 폴링
    Snmp,
}

impl SourceKind {
    /// 직렬화 및 헤더에 쓰이는 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Syslog => "syslog",
            Self::Snmp => "snmp",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 트래픽 처리 결과
///
/// 장비가 보고한 단어가 알려진 값이 아니면 [`TrafficAction::Other`]로
/// 원문을 그대로 보존합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrafficAction {
    Allow,
    Deny,
    Drop,
    #[default]
    Unknown,
    Other(String),
}

impl TrafficAction {
    /// 캡처된 원문을 그대로 해석합니다. 대소문자는 보존합니다.
    pub fn from_captured(word: &str) -> Self {
        match word {
            "allow" => Self::Allow,
            "deny" => Self::Deny,
            "drop" => Self::Drop,
            "unknown" => Self::Unknown,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::Drop => "drop",
            Self::Unknown => "unknown",
            Self::Other(word) => word,
        }
    }
}

impl fmt::Display for TrafficAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for TrafficAction {
    fn from(value: String) -> Self {
        Self::from_captured(&value)
    }
}

impl From<TrafficAction> for String {
    fn from(value: TrafficAction) -> Self {
        value.as_str().to_owned()
    }
}

/// SNMP 폴링 대상
///
/// 설정이 소유하며 파이프라인은 읽기만 합니다.
/// `oids`가 비어 있으면 `device_type`에 매핑된 기본 프로파일을 사용합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnmpTarget {
    /// 장비 IP 주소
    pub ip_address: String,
    /// SNMP 에이전트 포트
    pub port: u16,
    /// v2c 커뮤니티 문자열
    pub community: String,
    /// 장비 유형 태그 (router, switch, firewall, server)
    pub device_type: String,
    /// 명시적으로 조회할 OID 목록
    pub oids: Vec<String>,
}

impl Default for SnmpTarget {
    fn default() -> Self {
        Self {
            ip_address: String::new(),
            port: 161,
            community: "public".to_owned(),
            device_type: "router".to_owned(),
            oids: Vec::new(),
        }
    }
}

impl fmt::Display for SnmpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.ip_address, self.port, self.device_type)
    }
}
