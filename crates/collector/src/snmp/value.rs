//! SNMP 값 타입
//!
//! 응답의 varbind 값은 [`SnmpValue`]로 디코딩됩니다. 지원하지 않는 태그와
//! 예외 마커(noSuchObject 등)는 0이 아닌 [`SnmpValue::Absent`]로 표현됩니다.

use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde_json::Value;

use crate::error::CollectorError;

/// 친숙한 이름(또는 OID 문자열)을 키로 하는 폴링 결과
pub type SnmpData = BTreeMap<String, SnmpValue>;

/// 숫자 값 해석 실패
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("value '{value}' is not a non-negative number")]
pub struct NotNumeric {
    pub value: String,
}

/// 값이 없는 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absence {
    /// NULL (요청 시 자리 표시자)
    Null,
    /// noSuchObject 예외
    NoSuchObject,
    /// noSuchInstance 예외
    NoSuchInstance,
    /// endOfMibView 예외
    EndOfMibView,
    /// 지원하지 않는 BER 태그
    Unsupported(u8),
}

impl Absence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::NoSuchObject => "noSuchObject",
            Self::NoSuchInstance => "noSuchInstance",
            Self::EndOfMibView => "endOfMibView",
            Self::Unsupported(_) => "unsupported",
        }
    }
}

/// 디코딩된 SNMP 값
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpValue {
    Integer(i32),
    OctetString(Vec<u8>),
    ObjectIdentifier(Oid),
    IpAddress(Ipv4Addr),
    Counter32(u32),
    Gauge32(u32),
    TimeTicks(u32),
    Counter64(u64),
    Absent(Absence),
}

impl SnmpValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent(_))
    }

    /// 바이트/카운트 계산용 음이 아닌 정수로 해석합니다.
    ///
    /// - 부재 값은 `Ok(None)` (키가 없는 것과 동일)
    /// - 숫자 또는 10진수 문자열은 `Ok(Some(n))`
    /// - 그 외(문자열, OID, IP, 음수)는 에러
    pub fn as_count(&self) -> Result<Option<u64>, NotNumeric> {
        let not_numeric = || NotNumeric {
            value: self.to_string(),
        };
        match self {
            Self::Absent(_) => Ok(None),
            Self::Integer(n) => u64::try_from(*n).map(Some).map_err(|_| not_numeric()),
            Self::Counter32(n) | Self::Gauge32(n) | Self::TimeTicks(n) => Ok(Some(u64::from(*n))),
            Self::Counter64(n) => Ok(Some(*n)),
            Self::OctetString(bytes) => std::str::from_utf8(bytes)
                .ok()
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Some)
                .ok_or_else(not_numeric),
            Self::ObjectIdentifier(_) | Self::IpAddress(_) => Err(not_numeric()),
        }
    }

    /// 이벤트 메타데이터용 JSON 값 (부재 값은 `null`)
    pub fn to_json(&self) -> Value {
        match self {
            Self::Integer(n) => Value::from(*n),
            Self::Counter32(n) | Self::Gauge32(n) | Self::TimeTicks(n) => Value::from(*n),
            Self::Counter64(n) => Value::from(*n),
            Self::OctetString(bytes) => Value::from(String::from_utf8_lossy(bytes).into_owned()),
            Self::ObjectIdentifier(oid) => Value::from(oid.to_string()),
            Self::IpAddress(ip) => Value::from(ip.to_string()),
            Self::Absent(_) => Value::Null,
        }
    }
}

impl fmt::Display for SnmpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Counter32(n) | Self::Gauge32(n) | Self::TimeTicks(n) => write!(f, "{n}"),
            Self::Counter64(n) => write!(f, "{n}"),
            Self::OctetString(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            Self::ObjectIdentifier(oid) => write!(f, "{oid}"),
            Self::IpAddress(ip) => write!(f, "{ip}"),
            Self::Absent(Absence::Unsupported(tag)) => write!(f, "unsupported(0x{tag:02x})"),
            Self::Absent(absence) => f.write_str(absence.as_str()),
        }
    }
}

/// SNMP Object Identifier
///
/// 최소 두 개의 arc를 가지며, 첫 arc는 0-2, 첫 arc가 0 또는 1이면 두 번째 arc는 40 미만입니다.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid(Vec<u32>);

impl Oid {
    /// arc 목록에서 OID를 생성합니다.
    pub fn from_arcs(arcs: Vec<u32>) -> Result<Self, CollectorError> {
        let invalid = |reason: &str| CollectorError::Parse {
            format: "oid".to_owned(),
            reason: reason.to_owned(),
        };
        match arcs.as_slice() {
            [] | [_] => Err(invalid("an OID needs at least two arcs")),
            [first, _, ..] if *first > 2 => Err(invalid("first arc must be 0, 1 or 2")),
            [first, second, ..] if *first < 2 && *second >= 40 => {
                Err(invalid("second arc must be below 40"))
            }
            _ => Ok(Self(arcs)),
        }
    }

    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    /// `prefix`로 시작하는지 확인합니다.
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl FromStr for Oid {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('.');
        let arcs = trimmed
            .split('.')
            .map(|arc| {
                arc.parse::<u32>().map_err(|_| CollectorError::Parse {
                    format: "oid".to_owned(),
                    reason: format!("'{s}' has a non-numeric arc '{arc}'"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_arcs(arcs)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{arc}")?;
            first = false;
        }
        Ok(())
    }
}
