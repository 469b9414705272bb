//! 수집기 에러 타입
//!
//! [`CollectorError`]는 수집 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<CollectorError> for NetsentryError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use netsentry_core::error::{BrokerError, NetsentryError, ParseError, PipelineError};

/// 수집 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    /// 입력 파싱 실패
    #[error("parse error: {format}: {reason}")]
    Parse {
        /// 입력 형식 (syslog, snmp 등)
        format: String,
        /// 실패 사유
        reason: String,
    },

    /// 입력 크기 초과
    #[error("input too large: {size} bytes (max: {max})")]
    TooLarge {
        /// 입력 크기
        size: usize,
        /// 허용 최대 크기
        max: usize,
    },

    /// 리스너 에러 (바인드, accept, 수신)
    #[error("listener error: {source_type}: {reason}")]
    Listener {
        /// 리스너 유형 (syslog_udp, syslog_tcp)
        source_type: String,
        /// 에러 사유
        reason: String,
    },

    /// SNMP 요청 에러 (타임아웃, 에러 상태, 응답 불일치)
    #[error("snmp error: {target}: {reason}")]
    Snmp {
        /// 대상 장비 주소
        target: String,
        /// 에러 사유
        reason: String,
    },

    /// BER 인코딩/디코딩 에러
    #[error("snmp codec error at offset {offset}: {reason}")]
    Codec {
        /// 실패 위치 (바이트 오프셋)
        offset: usize,
        /// 실패 사유
        reason: String,
    },

    /// GeoIP 조회 에러
    #[error("geoip lookup failed for {ip}: {reason}")]
    GeoIp {
        /// 조회 대상 IP
        ip: String,
        /// 실패 사유
        reason: String,
    },

    /// 브로커 발행 에러
    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널/큐 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<CollectorError> for NetsentryError {
    fn from(err: CollectorError) -> Self {
        match err {
            CollectorError::Broker(e) => NetsentryError::Broker(e),
            CollectorError::Io(e) => NetsentryError::Io(e),
            CollectorError::TooLarge { size, max } => {
                NetsentryError::Parse(ParseError::TooLarge { size, max })
            }
            CollectorError::Parse { format, reason } => NetsentryError::Parse(ParseError::Failed {
                offset: 0,
                reason: format!("{format}: {reason}"),
            }),
            other => NetsentryError::Pipeline(PipelineError::InitFailed(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listener_error_display() {
        let err = CollectorError::Listener {
            source_type: "syslog_udp".to_owned(),
            reason: "address in use".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "listener error: syslog_udp: address in use"
        );
    }

    #[test]
    fn snmp_error_display() {
        let err = CollectorError::Snmp {
            target: "10.0.0.1:161".to_owned(),
            reason: "request timed out".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("10.0.0.1:161"));
        assert!(msg.contains("timed out"));
    }

    #[test]
    fn codec_error_display() {
        let err = CollectorError::Codec {
            offset: 7,
            reason: "truncated length".to_owned(),
        };
        assert!(err.to_string().contains("offset 7"));
    }

    #[test]
    fn broker_error_converts_through() {
        let err: CollectorError = BrokerError::Unavailable("no brokers".to_owned()).into();
        let top: NetsentryError = err.into();
        assert!(matches!(top, NetsentryError::Broker(_)));
    }

    #[test]
    fn too_large_converts_to_parse_error() {
        let top: NetsentryError = CollectorError::TooLarge {
            size: 9000,
            max: 8192,
        }
        .into();
        assert!(matches!(
            top,
            NetsentryError::Parse(ParseError::TooLarge { size: 9000, max: 8192 })
        ));
    }

    #[test]
    fn listener_error_converts_to_pipeline_error() {
        let top: NetsentryError = CollectorError::Listener {
            source_type: "syslog_tcp".to_owned(),
            reason: "bind failed".to_owned(),
        }
        .into();
        assert!(matches!(top, NetsentryError::Pipeline(_)));
        assert!(top.to_string().contains("bind failed"));
    }

    #[test]
    fn io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CollectorError = io_err.into();
        assert!(matches!(err, CollectorError::Io(_)));
    }
}
