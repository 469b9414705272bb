//! syslog 형식별 매처
//!
//! 각 매처는 원시 메시지 한 줄을 받아 트래픽 이벤트를 만들거나 `None`을 반환합니다.
//! [`SyslogNormalizer`](super::SyslogNormalizer)는 등록 순서대로 매처를 시도하며
//! 첫 번째 성공 결과를 사용합니다.
//!
//! # 지원 형식
//! ```text
//! ACL 로그:     list ACL1 deny tcp 203.0.113.5(443) -> 198.51.100.9(51000)
//! 콤마 구분:    block,5,10.1.1.1,1234,10.2.2.2,80,tcp,0
//! 일반 방화벽:  공백으로 구분된 토큰 4개 이상
//! ```

use netsentry_core::event::{NormalizedTrafficEvent, RawSyslogMessage};
use netsentry_core::types::{SourceKind, TrafficAction};
use regex::Regex;

use crate::error::CollectorError;

/// ACL 로그 패턴: list-name, action, protocol, `src(port) -> dst(port)`
const ACL_PATTERN: &str = r"list\s+(\S+)\s+(\w+)\s+(\w+)\s+(\d+\.\d+\.\d+\.\d+)\((\d+)\)\s+->\s+(\d+\.\d+\.\d+\.\d+)\((\d+)\)";

/// 콤마 구분 패턴: action,code,src,sport,dst,dport,protocol,code2
const DELIMITED_PATTERN: &str =
    r"(\w+),(\d+),(\d+\.\d+\.\d+\.\d+),(\d+),(\d+\.\d+\.\d+\.\d+),(\d+),(\w+),(\d+)";

/// 일반 방화벽 매처가 요구하는 최소 토큰 수
pub const GENERIC_MIN_TOKENS: usize = 4;

/// syslog 한 줄을 트래픽 이벤트로 변환하는 매처
pub trait SyslogMatcher: Send + Sync {
    /// 매처 이름 (로그 및 메타데이터용)
    fn name(&self) -> &'static str;

    /// 메시지를 매칭합니다. 형식이 맞지 않으면 `None`.
    fn try_match(&self, message: &RawSyslogMessage) -> Option<NormalizedTrafficEvent>;
}

fn base_event(message: &RawSyslogMessage) -> NormalizedTrafficEvent {
    let mut event = NormalizedTrafficEvent::captured_at(
        SourceKind::Syslog,
        message.source_ip.clone(),
        message.received_at,
    );
    event.raw_message = message.text.clone();
    event
}

/// 캡처된 엔드포인트 필드를 이벤트에 채웁니다.
///
/// 포트가 `u16` 범위를 벗어나면 매칭 실패로 처리합니다.
fn fill_endpoints(
    event: &mut NormalizedTrafficEvent,
    src_ip: &str,
    src_port: &str,
    dst_ip: &str,
    dst_port: &str,
) -> Option<()> {
    event.source_port = Some(src_port.parse().ok()?);
    event.destination_port = Some(dst_port.parse().ok()?);
    event.source_ip = Some(src_ip.to_owned());
    event.destination_ip = Some(dst_ip.to_owned());
    Some(())
}

/// 벤더 ACL 로그 매처
pub struct AclLogMatcher {
    pattern: Regex,
}

impl AclLogMatcher {
    pub const DEVICE_TYPE: &'static str = "cisco-firewall";

    pub fn new() -> Result<Self, CollectorError> {
        Ok(Self {
            pattern: Regex::new(ACL_PATTERN)?,
        })
    }
}

impl SyslogMatcher for AclLogMatcher {
    fn name(&self) -> &'static str {
        "acl"
    }

    fn try_match(&self, message: &RawSyslogMessage) -> Option<NormalizedTrafficEvent> {
        let caps = self.pattern.captures(&message.text)?;
        let mut event = base_event(message);
        fill_endpoints(&mut event, &caps[4], &caps[5], &caps[6], &caps[7])?;
        event.action = TrafficAction::from_captured(&caps[2]);
        event.protocol = caps[3].to_owned();
        event.device_type = Self::DEVICE_TYPE.to_owned();
        Some(event)
    }
}

/// 콤마 구분 필터 로그 매처
pub struct DelimitedLogMatcher {
    pattern: Regex,
}

impl DelimitedLogMatcher {
    pub const DEVICE_TYPE: &'static str = "pfsense";

    pub fn new() -> Result<Self, CollectorError> {
        Ok(Self {
            pattern: Regex::new(DELIMITED_PATTERN)?,
        })
    }
}

impl SyslogMatcher for DelimitedLogMatcher {
    fn name(&self) -> &'static str {
        "delimited"
    }

    fn try_match(&self, message: &RawSyslogMessage) -> Option<NormalizedTrafficEvent> {
        let caps = self.pattern.captures(&message.text)?;
        let mut event = base_event(message);
        fill_endpoints(&mut event, &caps[3], &caps[4], &caps[5], &caps[6])?;
        event.action = TrafficAction::from_captured(&caps[1]);
        event.protocol = caps[7].to_owned();
        event.device_type = Self::DEVICE_TYPE.to_owned();
        Some(event)
    }
}

/// 형식을 알 수 없는 방화벽 로그용 fallback 매처
///
/// 트래픽 양을 집계할 수 있도록 protocol/action을 unknown으로 둔 이벤트를 만듭니다.
#[derive(Default)]
pub struct GenericFirewallMatcher;

impl GenericFirewallMatcher {
    pub const DEVICE_TYPE: &'static str = "generic-firewall";
    pub const UNKNOWN_PROTOCOL: &'static str = "unknown";
}

impl SyslogMatcher for GenericFirewallMatcher {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn try_match(&self, message: &RawSyslogMessage) -> Option<NormalizedTrafficEvent> {
        if message.text.split_whitespace().count() < GENERIC_MIN_TOKENS {
            return None;
        }
        let mut event = base_event(message);
        event.device_type = Self::DEVICE_TYPE.to_owned();
        event.protocol = Self::UNKNOWN_PROTOCOL.to_owned();
        event.action = TrafficAction::Unknown;
        Some(event)
    }
}
