//! 프로토콜 + 목적지 포트 기반 분류

/// 메타데이터 키
pub const PROTOCOL_CATEGORY_KEY: &str = "protocol_category";

/// 범주를 결정합니다. 프로토콜은 대소문자를 구분하지 않으며,
/// 포트가 없으면 어떤 잘 알려진 포트와도 일치하지 않습니다.
pub fn classify_protocol(protocol: &str, destination_port: Option<u16>) -> &'static str {
    let port = destination_port.unwrap_or(0);
    if protocol.eq_ignore_ascii_case("tcp") {
        match port {
            80 | 8080 => "web",
            443 => "web-secure",
            22 => "ssh",
            23 => "telnet",
            25 => "smtp",
            53 => "dns",
            _ => "tcp-other",
        }
    } else if protocol.eq_ignore_ascii_case("udp") {
        match port {
            53 => "dns",
            67 | 68 => "dhcp",
            161 => "snmp",
            514 => "syslog",
            _ => "udp-other",
        }
    } else {
        "other"
    }
}
