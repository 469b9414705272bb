//! 장비 유형별 기본 OID 프로파일

use netsentry_core::types::SnmpTarget;

use super::oids::{icmp, interface, ip, system, tcp, udp};

/// 폴링 프로파일
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnmpProfile {
    Basic,
    Interface,
    Router,
    Switch,
    Firewall,
    Server,
}

const BASIC: &[&str] = &[
    system::DESCRIPTION,
    system::UPTIME,
    system::NAME,
    interface::NUMBER,
];

const INTERFACE: &[&str] = &[
    interface::IN_OCTETS,
    interface::OUT_OCTETS,
    interface::IN_ERRORS,
    interface::OUT_ERRORS,
    interface::IN_DISCARDS,
    interface::OUT_DISCARDS,
    interface::OPER_STATUS,
    interface::ADMIN_STATUS,
];

const ROUTER: &[&str] = &[
    system::DESCRIPTION,
    system::UPTIME,
    interface::IN_OCTETS,
    interface::OUT_OCTETS,
    interface::IN_ERRORS,
    interface::OUT_ERRORS,
    ip::IN_RECEIVES,
    ip::OUT_REQUESTS,
    ip::FORW_DATAGRAMS,
    tcp::CURR_ESTAB,
    udp::IN_DATAGRAMS,
    udp::OUT_DATAGRAMS,
];

const SWITCH: &[&str] = &[
    system::DESCRIPTION,
    system::UPTIME,
    interface::IN_OCTETS,
    interface::OUT_OCTETS,
    interface::IN_UCAST_PKTS,
    interface::OUT_UCAST_PKTS,
    interface::IN_ERRORS,
    interface::OUT_ERRORS,
    interface::OPER_STATUS,
];

const FIREWALL: &[&str] = &[
    system::DESCRIPTION,
    system::UPTIME,
    interface::IN_OCTETS,
    interface::OUT_OCTETS,
    tcp::CURR_ESTAB,
    tcp::ACTIVE_OPENS,
    tcp::ATTEMPT_FAILS,
    udp::IN_DATAGRAMS,
    udp::NO_PORTS,
    icmp::IN_MSGS,
    icmp::OUT_MSGS,
];

const SERVER: &[&str] = &[
    system::DESCRIPTION,
    system::UPTIME,
    interface::IN_OCTETS,
    interface::OUT_OCTETS,
    tcp::CURR_ESTAB,
    tcp::IN_SEGS,
    tcp::OUT_SEGS,
    udp::IN_DATAGRAMS,
    udp::OUT_DATAGRAMS,
];

impl SnmpProfile {
    /// 장비 유형 태그로 프로파일을 선택합니다 (대소문자 무시).
    pub fn for_device_type(device_type: &str) -> Self {
        match device_type.to_ascii_lowercase().as_str() {
            "router" => Self::Router,
            "switch" => Self::Switch,
            "firewall" => Self::Firewall,
            "server" => Self::Server,
            _ => Self::Basic,
        }
    }

    pub fn oids(self) -> &'static [&'static str] {
        match self {
            Self::Basic => BASIC,
            Self::Interface => INTERFACE,
            Self::Router => ROUTER,
            Self::Switch => SWITCH,
            Self::Firewall => FIREWALL,
            Self::Server => SERVER,
        }
    }
}

/// 대상이 폴링할 OID 목록
///
/// 명시적 목록이 있으면 그것을, 없으면 장비 유형 프로파일을 사용합니다.
pub fn resolve_oids(target: &SnmpTarget) -> Vec<String> {
    if !target.oids.is_empty() {
        return target.oids.clone();
    }
    SnmpProfile::for_device_type(&target.device_type)
        .oids()
        .iter()
        .map(|oid| (*oid).to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_selects_profile_case_insensitively() {
        assert_eq!(SnmpProfile::for_device_type("Router"), SnmpProfile::Router);
        assert_eq!(SnmpProfile::for_device_type("SWITCH"), SnmpProfile::Switch);
        assert_eq!(SnmpProfile::for_device_type("firewall"), SnmpProfile::Firewall);
        assert_eq!(SnmpProfile::for_device_type("server"), SnmpProfile::Server);
        assert_eq!(SnmpProfile::for_device_type("printer"), SnmpProfile::Basic);
        assert_eq!(SnmpProfile::for_device_type(""), SnmpProfile::Basic);
    }

    #[test]
    fn explicit_oids_win_over_profile() {
        let target = SnmpTarget {
            device_type: "router".to_owned(),
            oids: vec!["1.3.6.1.2.1.1.5.0".to_owned()],
            ..SnmpTarget::default()
        };
        assert_eq!(resolve_oids(&target), vec!["1.3.6.1.2.1.1.5.0"]);
    }

    #[test]
    fn empty_oids_use_device_profile() {
        let target = SnmpTarget {
            device_type: "firewall".to_owned(),
            ..SnmpTarget::default()
        };
        let oids = resolve_oids(&target);
        assert_eq!(oids.len(), FIREWALL.len());
        assert!(oids.iter().any(|o| o == icmp::IN_MSGS));
    }

    #[test]
    fn every_traffic_profile_carries_octet_counters() {
        for profile in [
            SnmpProfile::Interface,
            SnmpProfile::Router,
            SnmpProfile::Switch,
            SnmpProfile::Firewall,
            SnmpProfile::Server,
        ] {
            let oids = profile.oids();
            assert!(oids.contains(&interface::IN_OCTETS), "{profile:?}");
            assert!(oids.contains(&interface::OUT_OCTETS), "{profile:?}");
        }
    }
}
