//! SNMP 폴링 결과 정규화
//!
//! 대상 하나의 [`SnmpData`]에서 0개 이상의 트래픽 이벤트를 만듭니다.
//!
//! | 조건                               | protocol          | bytes_transferred       |
//! |------------------------------------|-------------------|-------------------------|
//! | `ifInOctets`와 `ifOutOctets` 존재  | `interface-stats` | 두 카운터의 합          |
//! | `tcpCurrEstab` 존재                | `tcp-stats`       | 현재 연결 수            |
//!
//! 각 이벤트의 메타데이터에는 폴링된 값 전체가 들어갑니다.
//! ICMP/UDP 카운터는 아직 이벤트를 만들지 않습니다. 새 범주는
//! [`SnmpNormalizer::derivers`] 목록에 추가하면 됩니다.

use netsentry_core::event::NormalizedTrafficEvent;
use netsentry_core::types::SourceKind;

use crate::error::CollectorError;
use crate::snmp::oids::names;
use crate::snmp::value::SnmpData;

pub const INTERFACE_STATS_PROTOCOL: &str = "interface-stats";
pub const TCP_STATS_PROTOCOL: &str = "tcp-stats";
pub const NETWORK_DEVICE: &str = "network-device";

/// 폴링 결과에서 이벤트 하나를 파생하는 함수
///
/// 필요한 키가 없으면 `Ok(None)`, 값이 숫자가 아니면 에러입니다.
pub type EventDeriver =
    fn(&str, &SnmpData) -> Result<Option<NormalizedTrafficEvent>, CollectorError>;

fn count(data: &SnmpData, key: &str) -> Result<Option<u64>, CollectorError> {
    match data.get(key) {
        None => Ok(None),
        Some(value) => value.as_count().map_err(|e| CollectorError::Parse {
            format: "snmp".to_owned(),
            reason: format!("{key}: {e}"),
        }),
    }
}

fn snmp_event(device_ip: &str, data: &SnmpData, protocol: &str, bytes: u64) -> NormalizedTrafficEvent {
    let mut event = NormalizedTrafficEvent::new(SourceKind::Snmp, device_ip);
    event.protocol = protocol.to_owned();
    event.device_type = NETWORK_DEVICE.to_owned();
    event.bytes_transferred = bytes;
    event.extend_metadata(data.iter().map(|(k, v)| (k.clone(), v.to_json())));
    event
}

/// 인터페이스 송수신 바이트 이벤트
pub fn interface_stats(
    device_ip: &str,
    data: &SnmpData,
) -> Result<Option<NormalizedTrafficEvent>, CollectorError> {
    let (Some(inbound), Some(outbound)) = (
        count(data, names::IF_IN_OCTETS)?,
        count(data, names::IF_OUT_OCTETS)?,
    ) else {
        return Ok(None);
    };
    let total = inbound.saturating_add(outbound);
    Ok(Some(snmp_event(device_ip, data, INTERFACE_STATS_PROTOCOL, total)))
}

/// TCP 현재 연결 수 이벤트
pub fn tcp_stats(
    device_ip: &str,
    data: &SnmpData,
) -> Result<Option<NormalizedTrafficEvent>, CollectorError> {
    let Some(established) = count(data, names::TCP_CURR_ESTAB)? else {
        return Ok(None);
    };
    Ok(Some(snmp_event(device_ip, data, TCP_STATS_PROTOCOL, established)))
}

/// SNMP 폴링 결과 정규화기
pub struct SnmpNormalizer {
    derivers: Vec<EventDeriver>,
}

impl SnmpNormalizer {
    pub fn new() -> Self {
        Self {
            derivers: vec![interface_stats, tcp_stats],
        }
    }

    /// 파생 함수를 추가합니다.
    pub fn with_deriver(mut self, deriver: EventDeriver) -> Self {
        self.derivers.push(deriver);
        self
    }

    /// 등록된 파생 함수 목록
    pub fn derivers(&self) -> &[EventDeriver] {
        &self.derivers
    }

    /// 폴링 결과를 이벤트 목록으로 변환합니다.
    ///
    /// 파생 함수 하나라도 에러를 내면 전체가 에러입니다.
    pub fn normalize(
        &self,
        device_ip: &str,
        data: &SnmpData,
    ) -> Result<Vec<NormalizedTrafficEvent>, CollectorError> {
        let mut events = Vec::new();
        for deriver in &self.derivers {
            if let Some(event) = deriver(device_ip, data)? {
                events.push(event);
            }
        }
        Ok(events)
    }
}

impl Default for SnmpNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::value::{Absence, SnmpValue};
    use serde_json::json;

    fn data(entries: &[(&str, SnmpValue)]) -> SnmpData {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn interface_octets_produce_summed_event() {
        let input = data(&[
            ("ifInOctets", SnmpValue::Counter32(1000)),
            ("ifOutOctets", SnmpValue::Counter32(2000)),
        ]);
        let events = SnmpNormalizer::new().normalize("10.0.0.1", &input).unwrap();

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.bytes_transferred, 3000);
        assert_eq!(event.protocol, "interface-stats");
        assert_eq!(event.device_ip, "10.0.0.1");
        assert_eq!(event.device_type, "network-device");
        assert_eq!(event.source, SourceKind::Snmp);
        assert_eq!(event.metadata_value("ifInOctets"), Some(&json!(1000)));
        assert_eq!(event.metadata_value("ifOutOctets"), Some(&json!(2000)));
    }

    #[test]
    fn tcp_established_produces_event_with_full_metadata() {
        let input = data(&[
            ("tcpCurrEstab", SnmpValue::Gauge32(42)),
            ("sysName", SnmpValue::OctetString(b"edge-fw".to_vec())),
        ]);
        let events = SnmpNormalizer::new().normalize("10.0.0.20", &input).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].protocol, "tcp-stats");
        assert_eq!(events[0].bytes_transferred, 42);
        assert_eq!(events[0].metadata_str("sysName"), Some("edge-fw"));
    }

    #[test]
    fn both_categories_produce_two_events() {
        let input = data(&[
            ("ifInOctets", SnmpValue::Counter64(10)),
            ("ifOutOctets", SnmpValue::Counter64(20)),
            ("tcpCurrEstab", SnmpValue::Gauge32(3)),
        ]);
        let events = SnmpNormalizer::new().normalize("10.0.0.1", &input).unwrap();
        let protocols: Vec<&str> = events.iter().map(|e| e.protocol.as_str()).collect();
        assert_eq!(protocols, vec!["interface-stats", "tcp-stats"]);
    }

    #[test]
    fn missing_keys_yield_no_events() {
        let only_in = data(&[("ifInOctets", SnmpValue::Counter32(5))]);
        assert!(SnmpNormalizer::new().normalize("10.0.0.1", &only_in).unwrap().is_empty());

        let icmp_only = data(&[("1.3.6.1.2.1.5.1.0", SnmpValue::Counter32(9))]);
        assert!(SnmpNormalizer::new().normalize("10.0.0.1", &icmp_only).unwrap().is_empty());
    }

    #[test]
    fn absent_values_count_as_missing() {
        let input = data(&[
            ("ifInOctets", SnmpValue::Absent(Absence::NoSuchInstance)),
            ("ifOutOctets", SnmpValue::Counter32(5)),
        ]);
        assert!(SnmpNormalizer::new().normalize("10.0.0.1", &input).unwrap().is_empty());
    }

    #[test]
    fn non_numeric_counter_is_error() {
        let input = data(&[("tcpCurrEstab", SnmpValue::OctetString(b"many".to_vec()))]);
        let err = SnmpNormalizer::new().normalize("10.0.0.1", &input).unwrap_err();
        assert!(err.to_string().contains("tcpCurrEstab"));
    }

    #[test]
    fn custom_deriver_is_appended() {
        fn always(ip: &str, d: &SnmpData) -> Result<Option<NormalizedTrafficEvent>, CollectorError> {
            Ok(Some(snmp_event(ip, d, "custom", 0)))
        }
        let normalizer = SnmpNormalizer::new().with_deriver(always);
        assert_eq!(normalizer.derivers().len(), 3);
        let events = normalizer.normalize("10.0.0.1", &SnmpData::new()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].protocol, "custom");
    }
}
