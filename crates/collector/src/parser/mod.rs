//! 정규화 모듈 -- syslog 텍스트와 SNMP 폴링 결과를 트래픽 이벤트로 변환
//!
//! [`SyslogNormalizer`]는 등록된 [`SyslogMatcher`]를 순서대로 시도하여 첫 번째
//! 매칭 결과를 사용합니다. 어떤 매처에도 맞지 않는 메시지는 에러가 아니라
//! "이벤트 없음"으로 처리됩니다.
//!
//! # 사용 예시
//! ```ignore
//! use netsentry_collector::parser::SyslogNormalizer;
//!
//! let normalizer = SyslogNormalizer::with_defaults(8192)?;
//! let message = RawSyslogMessage::new("192.0.2.1", "list ACL1 deny tcp 10.0.0.1(1) -> 10.0.0.2(2)");
//! let event = normalizer.normalize(&message)?;
//! ```

pub mod snmp;
pub mod syslog;

pub use snmp::SnmpNormalizer;
pub use syslog::{AclLogMatcher, DelimitedLogMatcher, GenericFirewallMatcher, SyslogMatcher};

use netsentry_core::event::{NormalizedTrafficEvent, RawSyslogMessage};
use netsentry_core::metrics as m;
use tracing::debug;

use crate::error::CollectorError;

/// syslog 메시지 정규화기
pub struct SyslogNormalizer {
    /// 등록된 매처 (순서대로 시도)
    matchers: Vec<Box<dyn SyslogMatcher>>,
    /// 허용 최대 메시지 크기 (바이트)
    max_message_size: usize,
    /// 빈 메시지 필터링 여부
    enable_filtering: bool,
}

impl SyslogNormalizer {
    /// 매처가 없는 정규화기를 생성합니다.
    pub fn new(max_message_size: usize) -> Self {
        Self {
            matchers: Vec::new(),
            max_message_size,
            enable_filtering: true,
        }
    }

    /// 기본 매처 세트 (ACL -> 콤마 구분 -> 일반 방화벽)로 생성합니다.
    pub fn with_defaults(max_message_size: usize) -> Result<Self, CollectorError> {
        Ok(Self::new(max_message_size)
            .register(Box::new(AclLogMatcher::new()?))
            .register(Box::new(DelimitedLogMatcher::new()?))
            .register(Box::new(GenericFirewallMatcher)))
    }

    /// 매처를 등록합니다. 등록 순서대로 시도됩니다.
    pub fn register(mut self, matcher: Box<dyn SyslogMatcher>) -> Self {
        self.matchers.push(matcher);
        self
    }

    /// 빈 메시지 필터링 여부를 설정합니다.
    pub fn with_filtering(mut self, enabled: bool) -> Self {
        self.enable_filtering = enabled;
        self
    }

    /// 등록된 매처 이름 목록
    pub fn matcher_names(&self) -> Vec<&'static str> {
        self.matchers.iter().map(|m| m.name()).collect()
    }

    /// 메시지 한 줄을 정규화합니다.
    ///
    /// - 최대 크기 초과: `CollectorError::TooLarge`
    /// - 필터링 활성 시 공백뿐인 메시지: `Ok(None)`
    /// - 매칭되는 형식 없음: `Ok(None)`
    pub fn normalize(
        &self,
        message: &RawSyslogMessage,
    ) -> Result<Option<NormalizedTrafficEvent>, CollectorError> {
        let size = message.text.len();
        if size > self.max_message_size {
            return Err(CollectorError::TooLarge {
                size,
                max: self.max_message_size,
            });
        }

        if self.enable_filtering && message.text.trim().is_empty() {
            return Ok(None);
        }

        for matcher in &self.matchers {
            if let Some(event) = matcher.try_match(message) {
                debug!(
                    matcher = matcher.name(),
                    device_ip = %message.source_ip,
                    "syslog message normalized"
                );
                metrics::counter!(
                    m::PIPELINE_EVENTS_NORMALIZED_TOTAL,
                    m::LABEL_SOURCE => "syslog"
                )
                .increment(1);
                return Ok(Some(event));
            }
        }

        debug!(
            device_ip = %message.source_ip,
            size,
            "syslog message matched no known format"
        );
        metrics::counter!(m::SYSLOG_MESSAGES_UNPARSED_TOTAL).increment(1);
        Ok(None)
    }
}
