//! MIB-II OID 상수 및 친숙한 이름 매핑
//!
//! 인터페이스 테이블 값은 첫 번째 인터페이스 인스턴스(`.1`)를 조회합니다.

pub mod system {
    pub const DESCRIPTION: &str = "1.3.6.1.2.1.1.1.0";
    pub const OBJECT_ID: &str = "1.3.6.1.2.1.1.2.0";
    pub const UPTIME: &str = "1.3.6.1.2.1.1.3.0";
    pub const CONTACT: &str = "1.3.6.1.2.1.1.4.0";
    pub const NAME: &str = "1.3.6.1.2.1.1.5.0";
    pub const LOCATION: &str = "1.3.6.1.2.1.1.6.0";
    pub const SERVICES: &str = "1.3.6.1.2.1.1.7.0";
}

pub mod interface {
    pub const NUMBER: &str = "1.3.6.1.2.1.2.1.0";
    /// ifTable 엔트리 prefix (`ifEntry`)
    pub const ENTRY_PREFIX: &str = "1.3.6.1.2.1.2.2.1";
    pub const ADMIN_STATUS: &str = "1.3.6.1.2.1.2.2.1.7.1";
    pub const OPER_STATUS: &str = "1.3.6.1.2.1.2.2.1.8.1";
    pub const IN_OCTETS: &str = "1.3.6.1.2.1.2.2.1.10.1";
    pub const IN_UCAST_PKTS: &str = "1.3.6.1.2.1.2.2.1.11.1";
    pub const IN_DISCARDS: &str = "1.3.6.1.2.1.2.2.1.13.1";
    pub const IN_ERRORS: &str = "1.3.6.1.2.1.2.2.1.14.1";
    pub const OUT_OCTETS: &str = "1.3.6.1.2.1.2.2.1.16.1";
    pub const OUT_UCAST_PKTS: &str = "1.3.6.1.2.1.2.2.1.17.1";
    pub const OUT_DISCARDS: &str = "1.3.6.1.2.1.2.2.1.19.1";
    pub const OUT_ERRORS: &str = "1.3.6.1.2.1.2.2.1.20.1";
}

pub mod tcp {
    pub const ACTIVE_OPENS: &str = "1.3.6.1.2.1.6.5.0";
    pub const ATTEMPT_FAILS: &str = "1.3.6.1.2.1.6.7.0";
    pub const CURR_ESTAB: &str = "1.3.6.1.2.1.6.9.0";
    pub const IN_SEGS: &str = "1.3.6.1.2.1.6.10.0";
    pub const OUT_SEGS: &str = "1.3.6.1.2.1.6.11.0";
}

pub mod udp {
    pub const IN_DATAGRAMS: &str = "1.3.6.1.2.1.7.1.0";
    pub const NO_PORTS: &str = "1.3.6.1.2.1.7.2.0";
    pub const IN_ERRORS: &str = "1.3.6.1.2.1.7.3.0";
    pub const OUT_DATAGRAMS: &str = "1.3.6.1.2.1.7.4.0";
}

pub mod icmp {
    pub const IN_MSGS: &str = "1.3.6.1.2.1.5.1.0";
    pub const OUT_MSGS: &str = "1.3.6.1.2.1.5.14.0";
    pub const OUT_ERRORS: &str = "1.3.6.1.2.1.5.15.0";
}

pub mod ip {
    pub const IN_RECEIVES: &str = "1.3.6.1.2.1.4.3.0";
    pub const FORW_DATAGRAMS: &str = "1.3.6.1.2.1.4.6.0";
    pub const OUT_REQUESTS: &str = "1.3.6.1.2.1.4.10.0";
}

/// 정규화 단계가 참조하는 친숙한 이름
pub mod names {
    pub const IF_IN_OCTETS: &str = "ifInOctets";
    pub const IF_OUT_OCTETS: &str = "ifOutOctets";
    pub const TCP_CURR_ESTAB: &str = "tcpCurrEstab";
}

const FRIENDLY_NAMES: &[(&str, &str)] = &[
    (system::DESCRIPTION, "sysDescr"),
    (system::UPTIME, "sysUpTime"),
    (system::NAME, "sysName"),
    (system::CONTACT, "sysContact"),
    (system::LOCATION, "sysLocation"),
    (interface::NUMBER, "ifNumber"),
    (interface::IN_OCTETS, names::IF_IN_OCTETS),
    (interface::OUT_OCTETS, names::IF_OUT_OCTETS),
    (interface::IN_ERRORS, "ifInErrors"),
    (interface::OUT_ERRORS, "ifOutErrors"),
    (interface::IN_DISCARDS, "ifInDiscards"),
    (interface::OUT_DISCARDS, "ifOutDiscards"),
    (interface::OPER_STATUS, "ifOperStatus"),
    (interface::ADMIN_STATUS, "ifAdminStatus"),
    (tcp::ACTIVE_OPENS, "tcpActiveOpens"),
    (tcp::CURR_ESTAB, names::TCP_CURR_ESTAB),
    (tcp::IN_SEGS, "tcpInSegs"),
    (tcp::OUT_SEGS, "tcpOutSegs"),
    (udp::IN_DATAGRAMS, "udpInDatagrams"),
    (udp::OUT_DATAGRAMS, "udpOutDatagrams"),
    (udp::IN_ERRORS, "udpInErrors"),
    (ip::IN_RECEIVES, "ipInReceives"),
    (ip::OUT_REQUESTS, "ipOutRequests"),
    (ip::FORW_DATAGRAMS, "ipForwDatagrams"),
];

/// OID의 친숙한 이름을 반환합니다. 매핑이 없으면 OID 문자열 그대로.
pub fn friendly_name(oid: &str) -> &str {
    let oid = oid.trim_start_matches('.');
    FRIENDLY_NAMES
        .iter()
        .find(|(known, _)| *known == oid)
        .map_or(oid, |(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::value::Oid;

    #[test]
    fn known_oids_have_friendly_names() {
        assert_eq!(friendly_name(interface::IN_OCTETS), "ifInOctets");
        assert_eq!(friendly_name(tcp::CURR_ESTAB), "tcpCurrEstab");
        assert_eq!(friendly_name(".1.3.6.1.2.1.1.5.0"), "sysName");
    }

    #[test]
    fn unknown_oid_falls_back_to_oid_string() {
        let vendor = "1.3.6.1.4.1.9.9.109.1.1.1.1.5.1";
        assert_eq!(friendly_name(vendor), vendor);
    }

    #[test]
    fn interface_oids_address_first_instance() {
        for oid in [interface::IN_OCTETS, interface::OUT_OCTETS, interface::OPER_STATUS] {
            let rest = oid.strip_prefix(interface::ENTRY_PREFIX).unwrap();
            assert!(rest.ends_with(".1"), "{oid}");
        }
    }

    #[test]
    fn every_mapped_oid_is_well_formed() {
        for (oid, name) in FRIENDLY_NAMES {
            assert!(oid.parse::<Oid>().is_ok(), "{name} has malformed OID {oid}");
        }
    }

    #[test]
    fn friendly_names_are_unique() {
        let mut names: Vec<&str> = FRIENDLY_NAMES.iter().map(|(_, n)| *n).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(names.len(), before);
    }
}
