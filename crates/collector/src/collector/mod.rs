//! syslog 수신 모듈 -- UDP/TCP 리스너
//!
//! # 수신 소스
//! - [`SyslogUdpListener`]: 데이터그램 하나를 메시지 하나로 취급
//! - [`SyslogTcpListener`]: 연결별 태스크에서 개행 단위로 분리
//!
//! # 아키텍처
//! 리스너는 수신한 텍스트를 [`RawSyslogMessage`]로 만들어 [`MessageHandler`]에
//! 넘깁니다. UDP는 메시지마다 태스크를 띄우고 결과를 기다리지 않으며,
//! TCP는 한 연결 안에서 줄 순서대로 처리합니다.
//! 두 리스너 모두 [`CancellationToken`](tokio_util::sync::CancellationToken)으로 종료합니다.

pub mod syslog_tcp;
pub mod syslog_udp;

pub use syslog_tcp::SyslogTcpListener;
pub use syslog_udp::SyslogUdpListener;

use std::future::Future;

use netsentry_core::event::RawSyslogMessage;

/// UDP 수신 에러 작업 이름
pub const UDP_RECEIVE_OPERATION: &str = "UDP message receive";

/// TCP accept 에러 작업 이름
pub const TCP_ACCEPT_OPERATION: &str = "TCP connection accept";

/// 수신 메시지 처리기
///
/// 처리 결과는 리스너로 돌아오지 않습니다. 실패는 구현 내부에서 해결해야 합니다.
pub trait MessageHandler: Send + Sync + 'static {
    fn handle(&self, message: RawSyslogMessage) -> impl Future<Output = ()> + Send;
}

/// 바이트열을 최대 `max`바이트의 문자열로 디코딩합니다.
///
/// 잘린 위치가 멀티바이트 문자 중간이면 그 문자 앞에서 자릅니다.
/// 유효하지 않은 UTF-8은 대체 문자로 바뀝니다.
pub(crate) fn decode_truncated(bytes: &[u8], max: usize) -> String {
    let mut end = bytes.len().min(max);
    if end < bytes.len() {
        while end > 0 && (bytes[end] & 0xC0) == 0x80 {
            end -= 1;
        }
    }

    let text = String::from_utf8_lossy(&bytes[..end]);
    if text.len() <= max {
        return text.into_owned();
    }

    // 대체 문자로 길어진 경우
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text[..cut].to_owned()
}
