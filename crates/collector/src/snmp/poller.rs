//! SNMP 폴러 -- 주기적으로 모든 대상을 동시에 폴링합니다.
//!
//! 한 번의 폴링 주기(pass)마다 대상별 태스크를 띄우고, 대상 하나의 결과가
//! 준비되는 즉시 [`TargetPoll`]로 채널에 전달합니다.
//!
//! # 실패 격리
//! - OID 하나의 실패는 경고 로그 후 건너뜁니다 (`snmp_get:<ip>` breaker에 기록)
//! - 대상의 모든 OID가 실패하면 해당 pass가 실패로 기록됩니다 (`snmp_poll:<ip>`)
//! - 어떤 실패도 폴링 루프를 멈추지 않습니다

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use netsentry_core::metrics as m;
use netsentry_core::types::SnmpTarget;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::client::SnmpClient;
use super::oids::friendly_name;
use super::profiles::resolve_oids;
use super::value::{Oid, SnmpData};
use crate::error::CollectorError;
use crate::resilience::ErrorHandler;

/// 대상 하나의 폴링 결과
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPoll {
    /// 장비 IP (설정값 그대로)
    pub device_ip: String,
    /// 설정된 장비 유형 태그
    pub device_type: String,
    /// 친숙한 이름 -> 값
    pub data: SnmpData,
}

/// 대상별 pass 작업 이름
pub fn poll_operation(ip: &str) -> String {
    format!("snmp_poll:{ip}")
}

/// 대상별 OID GET 작업 이름
pub fn get_operation(ip: &str) -> String {
    format!("snmp_get:{ip}")
}

/// 주기적 SNMP 폴러
pub struct SnmpPoller<C: SnmpClient> {
    client: Arc<C>,
    handler: Arc<ErrorHandler>,
    targets: Arc<[SnmpTarget]>,
    interval: Duration,
}

impl<C: SnmpClient> SnmpPoller<C> {
    pub fn new(
        client: Arc<C>,
        handler: Arc<ErrorHandler>,
        targets: Vec<SnmpTarget>,
        interval: Duration,
    ) -> Self {
        Self {
            client,
            handler,
            targets: targets.into(),
            interval,
        }
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// 취소될 때까지 pass와 대기를 반복합니다.
    ///
    /// pass가 끝난 뒤 `interval`만큼 쉬며, 진행 중인 pass도 취소 시 중단됩니다.
    pub async fn run(&self, tx: mpsc::Sender<TargetPoll>, cancel: CancellationToken) {
        info!(
            targets = self.targets.len(),
            interval_secs = self.interval.as_secs(),
            "snmp poller started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                completed = self.poll_all(&tx) => {
                    debug!(completed, "snmp polling pass finished");
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("snmp poller stopped");
    }

    /// 모든 대상을 동시에 한 번씩 폴링합니다.
    ///
    /// 데이터를 얻은 대상 수를 반환합니다.
    pub async fn poll_all(&self, tx: &mpsc::Sender<TargetPoll>) -> usize {
        let mut tasks = JoinSet::new();
        for target in self.targets.iter().cloned() {
            let client = Arc::clone(&self.client);
            let handler = Arc::clone(&self.handler);
            let tx = tx.clone();
            tasks.spawn(async move {
                let operation = poll_operation(&target.ip_address);
                let data = handler
                    .safe_execute_async(&operation, SnmpData::new(), || {
                        poll_target(client.as_ref(), &handler, &target)
                    })
                    .await;
                metrics::counter!(m::SNMP_POLLS_TOTAL).increment(1);

                if data.is_empty() {
                    return false;
                }
                let poll = TargetPoll {
                    device_ip: target.ip_address.clone(),
                    device_type: target.device_type.clone(),
                    data,
                };
                tx.send(poll).await.is_ok()
            });
        }

        let mut completed = 0;
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(true) => completed += 1,
                Ok(false) => {}
                Err(e) => warn!(error = %e, "snmp polling task failed"),
            }
        }
        completed
    }
}

/// 대상 하나의 OID를 순서대로 조회합니다.
///
/// 주소가 잘못되었거나 모든 OID 조회가 실패하면 에러를 반환합니다.
pub async fn poll_target<C: SnmpClient>(
    client: &C,
    handler: &ErrorHandler,
    target: &SnmpTarget,
) -> Result<SnmpData, CollectorError> {
    let ip: IpAddr = target.ip_address.parse().map_err(|_| CollectorError::Snmp {
        target: target.ip_address.clone(),
        reason: "invalid target address".to_owned(),
    })?;
    let endpoint = SocketAddr::new(ip, target.port);
    let get_op = get_operation(&target.ip_address);

    let oids = resolve_oids(target);
    let mut data = SnmpData::new();
    let mut failures = 0usize;

    for raw_oid in &oids {
        if handler.should_circuit_break(&get_op) {
            debug!(target = %endpoint, oid = %raw_oid, "snmp get skipped, breaker open");
            failures += 1;
            continue;
        }

        let result = match raw_oid.parse::<Oid>() {
            Ok(oid) => client.get(endpoint, &target.community, &oid).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(value) => {
                handler.record_success(&get_op);
                let name = friendly_name(raw_oid).to_owned();
                debug!(target = %endpoint, oid = %name, value = %value, "snmp value");
                data.insert(name, value);
            }
            Err(e) => {
                warn!(target = %endpoint, oid = %raw_oid, error = %e, "failed to query OID");
                handler.record_failure(&get_op);
                metrics::counter!(m::SNMP_OID_FAILURES_TOTAL).increment(1);
                failures += 1;
            }
        }
    }

    if !oids.is_empty() && failures == oids.len() {
        return Err(CollectorError::Snmp {
            target: endpoint.to_string(),
            reason: format!("all {} OID requests failed", oids.len()),
        });
    }

    debug!(
        target = %endpoint,
        values = data.len(),
        failures,
        "snmp target polled"
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::FAILURE_THRESHOLD;
    use crate::snmp::oids::{interface, names, tcp};
    use crate::snmp::value::{Absence, SnmpValue};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// (ip, oid) 별로 응답을 지정하는 테스트 클라이언트
    #[derive(Default)]
    struct MockSnmpClient {
        responses: HashMap<(IpAddr, String), SnmpValue>,
        calls: Mutex<Vec<(SocketAddr, String)>>,
    }

    impl MockSnmpClient {
        fn with(mut self, ip: &str, oid: &str, value: SnmpValue) -> Self {
            self.responses
                .insert((ip.parse().unwrap(), oid.to_owned()), value);
            self
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl SnmpClient for MockSnmpClient {
        async fn get(
            &self,
            target: SocketAddr,
            _community: &str,
            oid: &Oid,
        ) -> Result<SnmpValue, CollectorError> {
            self.calls
                .lock()
                .unwrap()
                .push((target, oid.to_string()));
            self.responses
                .get(&(target.ip(), oid.to_string()))
                .cloned()
                .ok_or_else(|| CollectorError::Snmp {
                    target: target.to_string(),
                    reason: "request timed out".to_owned(),
                })
        }
    }

    fn target(ip: &str, oids: &[&str]) -> SnmpTarget {
        SnmpTarget {
            ip_address: ip.to_owned(),
            oids: oids.iter().map(|o| (*o).to_owned()).collect(),
            ..SnmpTarget::default()
        }
    }

    #[tokio::test]
    async fn poll_target_maps_friendly_names_and_skips_failures() {
        let client = MockSnmpClient::default()
            .with("10.0.0.1", interface::IN_OCTETS, SnmpValue::Counter32(1000))
            .with("10.0.0.1", interface::OUT_OCTETS, SnmpValue::Counter32(2000));
        let handler = ErrorHandler::new();
        let t = target(
            "10.0.0.1",
            &[interface::IN_OCTETS, interface::OUT_OCTETS, tcp::CURR_ESTAB],
        );

        let data = poll_target(&client, &handler, &t).await.unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[names::IF_IN_OCTETS], SnmpValue::Counter32(1000));
        assert_eq!(data[names::IF_OUT_OCTETS], SnmpValue::Counter32(2000));
        assert!(!data.contains_key(names::TCP_CURR_ESTAB));
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn unknown_oid_keeps_raw_name_and_absence() {
        let vendor = "1.3.6.1.4.1.9.2.1.58.0";
        let client = MockSnmpClient::default().with(
            "10.0.0.2",
            vendor,
            SnmpValue::Absent(Absence::NoSuchObject),
        );
        let handler = ErrorHandler::new();
        let data = poll_target(&client, &handler, &target("10.0.0.2", &[vendor]))
            .await
            .unwrap();
        assert_eq!(data[vendor], SnmpValue::Absent(Absence::NoSuchObject));
    }

    #[tokio::test]
    async fn all_failures_fail_the_pass() {
        let client = MockSnmpClient::default();
        let handler = ErrorHandler::new();
        let err = poll_target(&client, &handler, &target("10.0.0.3", &[tcp::CURR_ESTAB]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("all 1 OID requests failed"));
    }

    #[tokio::test]
    async fn invalid_address_and_oid_are_errors_not_panics() {
        let client = MockSnmpClient::default();
        let handler = ErrorHandler::new();
        assert!(
            poll_target(&client, &handler, &target("not-an-ip", &[tcp::CURR_ESTAB]))
                .await
                .is_err()
        );

        let client = MockSnmpClient::default()
            .with("10.0.0.4", tcp::CURR_ESTAB, SnmpValue::Gauge32(5));
        let data = poll_target(
            &client,
            &handler,
            &target("10.0.0.4", &["1.3.bad", tcp::CURR_ESTAB]),
        )
        .await
        .unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn open_get_breaker_skips_remaining_oids() {
        let client = MockSnmpClient::default();
        let handler = ErrorHandler::new();
        let oids: Vec<String> = (1..=15).map(|i| format!("1.3.6.1.4.1.99.{i}.0")).collect();
        let t = SnmpTarget {
            ip_address: "10.0.0.5".to_owned(),
            oids,
            ..SnmpTarget::default()
        };

        assert!(poll_target(&client, &handler, &t).await.is_err());
        assert_eq!(client.call_count(), FAILURE_THRESHOLD as usize);
        assert!(handler.should_circuit_break("snmp_get:10.0.0.5"));
    }

    #[tokio::test]
    async fn poll_all_sends_one_result_per_responsive_target() {
        let client = Arc::new(
            MockSnmpClient::default()
                .with("10.0.0.1", tcp::CURR_ESTAB, SnmpValue::Gauge32(12))
                .with("10.0.0.2", tcp::CURR_ESTAB, SnmpValue::Gauge32(3)),
        );
        let poller = SnmpPoller::new(
            client,
            Arc::new(ErrorHandler::new()),
            vec![
                target("10.0.0.1", &[tcp::CURR_ESTAB]),
                target("10.0.0.2", &[tcp::CURR_ESTAB]),
                target("10.0.0.9", &[tcp::CURR_ESTAB]),
            ],
            Duration::from_secs(30),
        );
        let (tx, mut rx) = mpsc::channel(8);

        assert_eq!(poller.poll_all(&tx).await, 2);
        drop(tx);

        let mut ips = Vec::new();
        while let Some(poll) = rx.recv().await {
            assert_eq!(poll.device_type, "router");
            ips.push(poll.device_ip);
        }
        ips.sort();
        assert_eq!(ips, vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn run_repeats_on_interval_until_cancelled() {
        let client = Arc::new(
            MockSnmpClient::default().with("10.0.0.1", tcp::CURR_ESTAB, SnmpValue::Gauge32(1)),
        );
        let poller = Arc::new(SnmpPoller::new(
            Arc::clone(&client),
            Arc::new(ErrorHandler::new()),
            vec![target("10.0.0.1", &[tcp::CURR_ESTAB])],
            Duration::from_secs(30),
        ));
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();

        let task = {
            let poller = Arc::clone(&poller);
            let cancel = cancel.clone();
            tokio::spawn(async move { poller.run(tx, cancel).await })
        };

        // 첫 pass는 즉시 실행
        assert!(rx.recv().await.is_some());
        // 다음 pass는 interval 이후
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(rx.recv().await.is_some());

        cancel.cancel();
        task.await.unwrap();
        assert_eq!(client.call_count(), 2);
    }
}
