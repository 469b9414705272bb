//! SNMP transport abstraction.
//!
//! The [`SnmpClient`] trait hides the network round-trip so the poller can be
//! tested against scripted agents. [`UdpSnmpClient`] is the production
//! implementation: one v2c GET per call over a fresh UDP socket.
//!
//! # Retries
//!
//! Each GET is sent once and re-sent up to `retries` more times when no
//! matching response arrives within `timeout`. Responses carrying a different
//! request id are stale replies to an earlier request and are ignored.
//! Error-status responses and malformed datagrams fail immediately.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use tokio::net::UdpSocket;
use tracing::{debug, warn};

use super::codec;
use super::value::{Oid, SnmpValue};
use crate::error::CollectorError;

/// Largest datagram accepted from an agent.
const MAX_RESPONSE_SIZE: usize = 65_507;

/// Trait abstracting a single SNMP GET.
///
/// The trait is `Send + Sync + 'static` so one client can be shared by every
/// concurrently polled target.
pub trait SnmpClient: Send + Sync + 'static {
    /// Fetches one OID from `target` using `community`.
    ///
    /// # Errors
    ///
    /// Returns `CollectorError::Snmp` on timeout (after retries), error-status
    /// responses, or a response that does not carry the requested OID, and
    /// `CollectorError::Codec` for malformed responses.
    fn get(
        &self,
        target: SocketAddr,
        community: &str,
        oid: &Oid,
    ) -> impl Future<Output = Result<SnmpValue, CollectorError>> + Send;
}

/// Human-readable name of an SNMP error-status code.
pub fn error_status_name(status: i64) -> &'static str {
    match status {
        1 => "tooBig",
        2 => "noSuchName",
        3 => "badValue",
        4 => "readOnly",
        5 => "genErr",
        6 => "noAccess",
        16 => "authorizationError",
        _ => "error",
    }
}

/// SNMP v2c client over UDP.
pub struct UdpSnmpClient {
    timeout: Duration,
    retries: u32,
    next_request_id: AtomicI32,
}

impl UdpSnmpClient {
    /// Creates a client with a per-attempt timeout and a retry count.
    pub fn new(timeout: Duration, retries: u32) -> Self {
        Self {
            timeout,
            retries,
            next_request_id: AtomicI32::new(1),
        }
    }

    fn request_id(&self) -> i32 {
        // 0과 음수는 건너뜀
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        if id <= 0 {
            self.next_request_id.store(2, Ordering::Relaxed);
            return 1;
        }
        id
    }

    /// Waits for the response matching `request_id` on a connected socket.
    async fn receive_matching(
        socket: &UdpSocket,
        target: SocketAddr,
        request_id: i32,
        oid: &Oid,
    ) -> Result<SnmpValue, CollectorError> {
        let mut buf = vec![0u8; MAX_RESPONSE_SIZE];
        loop {
            let len = socket.recv(&mut buf).await?;
            let response = codec::decode_response(&buf[..len])?;

            if response.request_id != request_id {
                debug!(
                    target = %target,
                    expected = request_id,
                    received = response.request_id,
                    "ignoring stale SNMP response"
                );
                continue;
            }

            if response.error_status != 0 {
                return Err(CollectorError::Snmp {
                    target: target.to_string(),
                    reason: format!(
                        "{} (status {}, index {}) for {oid}",
                        error_status_name(response.error_status),
                        response.error_status,
                        response.error_index
                    ),
                });
            }

            return response
                .varbinds
                .into_iter()
                .find(|(name, _)| name == oid)
                .map(|(_, value)| value)
                .ok_or_else(|| CollectorError::Snmp {
                    target: target.to_string(),
                    reason: format!("response does not contain {oid}"),
                });
        }
    }
}

impl SnmpClient for UdpSnmpClient {
    async fn get(
        &self,
        target: SocketAddr,
        community: &str,
        oid: &Oid,
    ) -> Result<SnmpValue, CollectorError> {
        let bind_addr: SocketAddr = if target.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(target).await?;

        let request_id = self.request_id();
        let request = codec::encode_get_request(community, request_id, oid);
        let mut last_error = None;

        for attempt in 0..=self.retries {
            if attempt > 0 {
                warn!(
                    target = %target,
                    oid = %oid,
                    attempt = attempt,
                    timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                    "retrying SNMP GET"
                );
            }

            socket.send(&request).await?;

            match tokio::time::timeout(
                self.timeout,
                Self::receive_matching(&socket, target, request_id, oid),
            )
            .await
            {
                Ok(result) => return result,
                Err(_elapsed) => {
                    last_error = Some(CollectorError::Snmp {
                        target: target.to_string(),
                        reason: format!("request for {oid} timed out"),
                    });
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CollectorError::Snmp {
            target: target.to_string(),
            reason: "unknown error".to_owned(),
        }))
    }
}
