//! TCP syslog 리스너
//!
//! 연결마다 별도 태스크에서 개행 단위로 메시지를 분리합니다.
//! 같은 연결의 줄은 받은 순서대로 처리됩니다.
//!
//! - 동시 연결 수는 `max_connections`로 제한되며 초과 연결은 즉시 닫습니다.
//! - `idle_timeout` 동안 데이터가 없으면 연결을 닫습니다.
//! - `max_message_size`를 넘는 줄은 그 크기에서 자르고 다음 개행까지 버립니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use netsentry_core::event::RawSyslogMessage;
use netsentry_core::metrics as m;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use super::{MessageHandler, TCP_ACCEPT_OPERATION, decode_truncated};
use crate::error::CollectorError;
use crate::resilience::ErrorHandler;

/// TCP 리스너 설정
#[derive(Debug, Clone)]
pub struct TcpListenerSettings {
    /// 줄 최대 크기 (바이트). 읽기 단위도 이 크기로 제한됩니다.
    pub max_message_size: usize,
    /// 최대 동시 연결 수
    pub max_connections: usize,
    /// 연결 유휴 타임아웃
    pub idle_timeout: Duration,
}

impl Default for TcpListenerSettings {
    fn default() -> Self {
        Self {
            max_message_size: 8192,
            max_connections: 256,
            idle_timeout: Duration::from_secs(300),
        }
    }
}

/// 바이트 스트림을 줄 단위로 나누는 분리기
///
/// 줄 끝의 `\r`은 제거됩니다. 최대 크기를 넘는 부분은 다음 개행까지 버립니다.
#[derive(Debug)]
pub(crate) struct LineSplitter {
    carry: Vec<u8>,
    max: usize,
    discarding: bool,
}

impl LineSplitter {
    pub(crate) fn new(max: usize) -> Self {
        Self {
            carry: Vec::new(),
            max: max.max(1),
            discarding: false,
        }
    }

    /// 받은 청크를 넣고 완성된 줄을 반환합니다.
    pub(crate) fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut segments = chunk.split(|&b| b == b'\n').peekable();
        while let Some(segment) = segments.next() {
            self.append(segment);
            if segments.peek().is_some() {
                lines.push(self.take_line());
            }
        }
        lines
    }

    /// 스트림 종료 시 남은 조각을 반환합니다.
    pub(crate) fn finish(mut self) -> Option<String> {
        if self.carry.is_empty() {
            return None;
        }
        Some(self.take_line())
    }

    fn append(&mut self, segment: &[u8]) {
        if self.discarding {
            return;
        }
        // 자를 위치의 문자 경계 판단을 위해 한 바이트 더 보관합니다
        let room = (self.max + 1).saturating_sub(self.carry.len());
        if segment.len() > room {
            self.carry.extend_from_slice(&segment[..room]);
            self.discarding = true;
        } else {
            self.carry.extend_from_slice(segment);
        }
    }

    fn take_line(&mut self) -> String {
        if self.carry.last() == Some(&b'\r') && self.carry.len() <= self.max {
            self.carry.pop();
        }
        let line = decode_truncated(&self.carry, self.max);
        self.carry.clear();
        self.discarding = false;
        line
    }
}

/// TCP syslog 리스너
pub struct SyslogTcpListener {
    listener: TcpListener,
    settings: TcpListenerSettings,
    handler: Arc<ErrorHandler>,
}

impl SyslogTcpListener {
    /// 리스닝 소켓을 바인드합니다. 실패는 호출자에게 전파됩니다.
    pub async fn bind(
        addr: SocketAddr,
        settings: TcpListenerSettings,
        handler: Arc<ErrorHandler>,
    ) -> Result<Self, CollectorError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| CollectorError::Listener {
                source_type: "syslog_tcp".to_owned(),
                reason: format!("failed to bind to {addr}: {e}"),
            })?;
        Ok(Self {
            listener,
            settings,
            handler,
        })
    }

    /// 실제 바인드된 주소
    pub fn local_addr(&self) -> Result<SocketAddr, CollectorError> {
        Ok(self.listener.local_addr()?)
    }

    /// 취소될 때까지 연결을 수락합니다.
    ///
    /// accept 에러는 error handler에 보고하고 루프를 계속합니다.
    /// 취소 후에는 열린 연결 태스크가 모두 끝날 때까지 기다립니다.
    pub async fn run<H: MessageHandler>(self, sink: Arc<H>, cancel: CancellationToken) {
        let local = self
            .listener
            .local_addr()
            .map_or_else(|_| "unknown".to_owned(), |a| a.to_string());
        info!(
            addr = %local,
            max_connections = self.settings.max_connections,
            "TCP syslog listener started"
        );

        let connection_semaphore = Arc::new(Semaphore::new(self.settings.max_connections));
        let connections = TaskTracker::new();

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    let (stream, peer) = match result {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            let err = CollectorError::Listener {
                                source_type: "syslog_tcp".to_owned(),
                                reason: format!("accept error: {e}"),
                            };
                            self.handler.report(TCP_ACCEPT_OPERATION, &err);
                            continue;
                        }
                    };

                    let Ok(permit) = Arc::clone(&connection_semaphore).try_acquire_owned() else {
                        warn!(peer = %peer, "max connections reached, rejecting connection");
                        continue;
                    };

                    debug!(peer = %peer, "accepted connection");
                    let sink = Arc::clone(&sink);
                    let settings = self.settings.clone();
                    let cancel = cancel.clone();
                    connections.spawn(async move {
                        metrics::gauge!(m::SYSLOG_TCP_ACTIVE_CONNECTIONS).increment(1.0);
                        handle_connection(stream, peer, sink.as_ref(), &settings, &cancel).await;
                        metrics::gauge!(m::SYSLOG_TCP_ACTIVE_CONNECTIONS).decrement(1.0);
                        drop(permit);
                    });
                }
                () = cancel.cancelled() => {
                    debug!(addr = %local, "TCP syslog listener received shutdown signal");
                    break;
                }
            }
        }

        connections.close();
        connections.wait().await;
        info!(addr = %local, "TCP syslog listener stopped");
    }
}

/// 단일 연결을 EOF, 읽기 에러, 유휴 타임아웃, 종료 신호 중 하나까지 처리합니다.
async fn handle_connection<H: MessageHandler>(
    mut stream: TcpStream,
    peer: SocketAddr,
    sink: &H,
    settings: &TcpListenerSettings,
    cancel: &CancellationToken,
) {
    let source_ip = peer.ip().to_string();
    let mut splitter = LineSplitter::new(settings.max_message_size);
    let mut buf = BytesMut::with_capacity(settings.max_message_size.max(1));

    loop {
        buf.clear();
        let read = tokio::select! {
            result = timeout(settings.idle_timeout, stream.read_buf(&mut buf)) => result,
            () = cancel.cancelled() => {
                debug!(peer = %peer, "connection received shutdown signal");
                break;
            }
        };

        match read {
            Ok(Ok(0)) => {
                debug!(peer = %peer, "connection closed by peer");
                if let Some(line) = splitter.finish() {
                    dispatch(sink, &source_ip, line).await;
                }
                return;
            }
            Ok(Ok(_)) => {
                for line in splitter.feed(&buf) {
                    dispatch(sink, &source_ip, line).await;
                }
            }
            Ok(Err(e)) => {
                warn!(peer = %peer, error = %e, "read error, closing connection");
                break;
            }
            Err(_) => {
                debug!(
                    peer = %peer,
                    idle_secs = settings.idle_timeout.as_secs(),
                    "idle timeout, closing connection"
                );
                break;
            }
        }
    }
}

async fn dispatch<H: MessageHandler>(sink: &H, source_ip: &str, line: String) {
    metrics::counter!(m::SYSLOG_MESSAGES_RECEIVED_TOTAL, m::LABEL_TRANSPORT => "tcp").increment(1);
    sink.handle(RawSyslogMessage::new(source_ip, line)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::sync::mpsc;

    #[test]
    fn splits_lines_across_chunks() {
        let mut splitter = LineSplitter::new(64);
        assert!(splitter.feed(b"first li").is_empty());
        assert_eq!(splitter.feed(b"ne\nsecond\nthi"), vec!["first line", "second"]);
        assert_eq!(splitter.finish(), Some("thi".to_owned()));
    }

    #[test]
    fn strips_carriage_return() {
        let mut splitter = LineSplitter::new(64);
        assert_eq!(splitter.feed(b"a\r\nb\r\n"), vec!["a", "b"]);
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn long_line_is_truncated_and_rest_discarded() {
        let mut splitter = LineSplitter::new(4);
        assert!(splitter.feed(b"abcdefgh").is_empty());
        assert_eq!(splitter.feed(b"ijk\nnext\n"), vec!["abcd", "next"]);
    }

    #[test]
    fn truncation_respects_char_boundary() {
        let mut splitter = LineSplitter::new(3);
        let lines = splitter.feed("a한글\n".as_bytes());
        assert_eq!(lines, vec!["a"]);
    }

    #[test]
    fn empty_lines_are_emitted() {
        let mut splitter = LineSplitter::new(16);
        assert_eq!(splitter.feed(b"\n\nx\n"), vec!["", "", "x"]);
    }

    struct ChannelSink(mpsc::UnboundedSender<RawSyslogMessage>);

    impl MessageHandler for ChannelSink {
        async fn handle(&self, message: RawSyslogMessage) {
            let _ = self.0.send(message);
        }
    }

    async fn start(
        settings: TcpListenerSettings,
    ) -> (
        SocketAddr,
        mpsc::UnboundedReceiver<RawSyslogMessage>,
        CancellationToken,
        tokio::task::JoinHandle<()>,
    ) {
        let listener = SyslogTcpListener::bind(
            "127.0.0.1:0".parse().unwrap(),
            settings,
            Arc::new(ErrorHandler::new()),
        )
        .await
        .unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(listener.run(Arc::new(ChannelSink(tx)), cancel.clone()));
        (addr, rx, cancel, task)
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<RawSyslogMessage>) -> RawSyslogMessage {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn lines_arrive_in_order_with_trailing_fragment() {
        let (addr, mut rx, cancel, task) = start(TcpListenerSettings::default()).await;
        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"one\ntwo\nthree").await.unwrap();
        client.shutdown().await.unwrap();

        assert_eq!(next(&mut rx).await.text, "one");
        assert_eq!(next(&mut rx).await.text, "two");
        let last = next(&mut rx).await;
        assert_eq!(last.text, "three");
        assert_eq!(last.source_ip, "127.0.0.1");

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn connections_above_limit_are_closed() {
        let settings = TcpListenerSettings {
            max_connections: 1,
            ..TcpListenerSettings::default()
        };
        let (addr, mut rx, cancel, task) = start(settings).await;

        let mut first = TcpStream::connect(addr).await.unwrap();
        first.write_all(b"held\n").await.unwrap();
        assert_eq!(next(&mut rx).await.text, "held");

        let mut second = TcpStream::connect(addr).await.unwrap();
        let mut byte = [0u8; 1];
        let read = tokio::time::timeout(Duration::from_secs(2), second.read(&mut byte))
            .await
            .unwrap();
        assert!(matches!(read, Ok(0) | Err(_)));

        cancel.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn idle_connection_is_closed() {
        let settings = TcpListenerSettings {
            idle_timeout: Duration::from_millis(50),
            ..TcpListenerSettings::default()
        };
        let (addr, _rx, cancel, task) = start(settings).await;
        let mut client = TcpStream::connect(addr).await.unwrap();

        let mut byte = [0u8; 1];
        let read = tokio::time::timeout(Duration::from_secs(2), client.read(&mut byte))
            .await
            .unwrap();
        assert!(matches!(read, Ok(0) | Err(_)));

        cancel.cancel();
        task.await.unwrap();
    }
}
