//! UDP syslog 리스너
//!
//! 데이터그램 하나를 메시지 하나로 취급합니다. 수신한 바이트는 UTF-8로
//! 손실 허용 디코딩되고 `max_message_size`로 잘립니다.

use std::net::SocketAddr;
use std::sync::Arc;

use netsentry_core::event::RawSyslogMessage;
use netsentry_core::metrics as m;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use super::{MessageHandler, UDP_RECEIVE_OPERATION, decode_truncated};
use crate::error::CollectorError;
use crate::resilience::ErrorHandler;

/// UDP 데이터그램 최대 크기
const MAX_DATAGRAM_SIZE: usize = 65_535;

/// UDP syslog 리스너
///
/// [`bind`](Self::bind)로 소켓을 먼저 열고 [`run`](Self::run)으로 수신 루프를 실행합니다.
pub struct SyslogUdpListener {
    socket: UdpSocket,
    max_message_size: usize,
    handler: Arc<ErrorHandler>,
}

impl SyslogUdpListener {
    /// 소켓을 바인드합니다. 실패는 호출자에게 전파됩니다.
    pub async fn bind(
        addr: SocketAddr,
        max_message_size: usize,
        handler: Arc<ErrorHandler>,
    ) -> Result<Self, CollectorError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| CollectorError::Listener {
                source_type: "syslog_udp".to_owned(),
                reason: format!("failed to bind to {addr}: {e}"),
            })?;
        Ok(Self {
            socket,
            max_message_size,
            handler,
        })
    }

    /// 실제 바인드된 주소 (포트 0 바인드 시 확인용)
    pub fn local_addr(&self) -> Result<SocketAddr, CollectorError> {
        Ok(self.socket.local_addr()?)
    }

    /// 취소될 때까지 데이터그램을 수신합니다.
    ///
    /// 메시지마다 태스크를 띄워 `sink`에 넘기고 기다리지 않습니다.
    /// 수신 에러는 error handler에 보고하고 루프를 계속합니다.
    /// 취소 후에는 이미 띄운 처리 태스크가 끝날 때까지 기다린 뒤 반환합니다.
    pub async fn run<H: MessageHandler>(self, sink: Arc<H>, cancel: CancellationToken) {
        let local = self
            .socket
            .local_addr()
            .map_or_else(|_| "unknown".to_owned(), |a| a.to_string());
        info!(addr = %local, "UDP syslog listener started");

        let in_flight = TaskTracker::new();
        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buf) => {
                    match result {
                        Ok((len, peer)) => {
                            let text = decode_truncated(&buf[..len], self.max_message_size);
                            metrics::counter!(
                                m::SYSLOG_MESSAGES_RECEIVED_TOTAL,
                                m::LABEL_TRANSPORT => "udp"
                            )
                            .increment(1);

                            let message = RawSyslogMessage::new(peer.ip().to_string(), text);
                            let sink = Arc::clone(&sink);
                            in_flight.spawn(async move {
                                sink.handle(message).await;
                            });
                        }
                        Err(e) => {
                            let err = CollectorError::Listener {
                                source_type: "syslog_udp".to_owned(),
                                reason: format!("receive error: {e}"),
                            };
                            self.handler.report(UDP_RECEIVE_OPERATION, &err);
                        }
                    }
                }
                () = cancel.cancelled() => {
                    debug!(addr = %local, "UDP syslog listener received shutdown signal");
                    break;
                }
            }
        }

        in_flight.close();
        in_flight.wait().await;
        info!(addr = %local, "UDP syslog listener stopped");
    }
}
