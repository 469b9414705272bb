//! Health aggregation tests.

use netsentry_core::pipeline::HealthStatus;
use netsentry_core::plugin::PluginState;
use netsentry_daemon::health::{DaemonHealth, ModuleHealth, aggregate_status};

fn module(name: &str, status: HealthStatus) -> ModuleHealth {
    ModuleHealth {
        name: name.to_owned(),
        state: PluginState::Running,
        status,
    }
}

#[test]
fn test_aggregate_status_all_healthy() {
    let modules = vec![
        module("syslog-collector", HealthStatus::Healthy),
        module("snmp-poller", HealthStatus::Healthy),
    ];
    assert!(aggregate_status(&modules).is_healthy());
}

#[test]
fn test_aggregate_status_empty_is_healthy() {
    assert!(aggregate_status(&[]).is_healthy());
}

#[test]
fn test_aggregate_status_one_degraded() {
    let modules = vec![
        module("syslog-collector", HealthStatus::Healthy),
        module(
            "snmp-poller",
            HealthStatus::Degraded("circuit breaker open: snmp_poll:10.0.0.1".to_owned()),
        ),
    ];
    assert_eq!(
        aggregate_status(&modules),
        HealthStatus::Degraded("snmp-poller: circuit breaker open: snmp_poll:10.0.0.1".to_owned())
    );
}

#[test]
fn test_aggregate_status_unhealthy_wins_over_degraded() {
    let modules = vec![
        module(
            "syslog-collector",
            HealthStatus::Degraded("broker health check failed".to_owned()),
        ),
        module("snmp-poller", HealthStatus::Unhealthy("failed to start".to_owned())),
    ];
    assert_eq!(
        aggregate_status(&modules),
        HealthStatus::Unhealthy("snmp-poller: failed to start".to_owned())
    );
}

#[test]
fn test_aggregate_status_joins_reasons() {
    let modules = vec![
        module("syslog-collector", HealthStatus::Degraded("a".to_owned())),
        module("snmp-poller", HealthStatus::Degraded("b".to_owned())),
    ];
    assert_eq!(
        aggregate_status(&modules),
        HealthStatus::Degraded("syslog-collector: a; snmp-poller: b".to_owned())
    );
}

#[test]
fn test_daemon_health_serializes_to_json() {
    let health = DaemonHealth {
        status: HealthStatus::Degraded("snmp-poller: circuit breaker open".to_owned()),
        uptime_secs: 42,
        modules: vec![module(
            "snmp-poller",
            HealthStatus::Degraded("circuit breaker open".to_owned()),
        )],
    };

    let value = serde_json::to_value(&health).expect("serialize health");
    assert_eq!(value["uptime_secs"], 42);
    assert_eq!(value["modules"][0]["name"], "snmp-poller");
    assert_eq!(value["modules"][0]["state"], "Running");
    assert_eq!(
        value["modules"][0]["status"]["Degraded"],
        "circuit breaker open"
    );
}
