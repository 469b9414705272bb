//! Aggregated health check reporting.
//!
//! The overall daemon status is the worst status among all registered services.
//!
//! # Aggregation Rule
//!
//! - All Healthy -> Healthy
//! - Any Degraded, none Unhealthy -> Degraded(reason)
//! - Any Unhealthy -> Unhealthy(reason)

use serde::Serialize;

use netsentry_core::pipeline::HealthStatus;
use netsentry_core::plugin::PluginState;

/// Aggregated health report for the entire daemon.
#[derive(Debug, Clone, Serialize)]
pub struct DaemonHealth {
    /// Overall daemon health status (worst of all services).
    pub status: HealthStatus,
    /// Daemon uptime in seconds since start.
    pub uptime_secs: u64,
    /// Per-service health reports.
    pub modules: Vec<ModuleHealth>,
}

/// Health status for a single service.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleHealth {
    /// Service name (e.g., "syslog-collector", "snmp-poller").
    pub name: String,
    /// Lifecycle state at the time of the check.
    pub state: PluginState,
    /// Current health status of the service.
    pub status: HealthStatus,
}

/// Aggregate multiple service health statuses into a single status.
///
/// Returns the worst status found: Unhealthy > Degraded > Healthy.
/// Reasons of every non-healthy service at the worst level are joined with `"; "`.
pub fn aggregate_status(modules: &[ModuleHealth]) -> HealthStatus {
    let unhealthy: Vec<String> = modules
        .iter()
        .filter_map(|m| match &m.status {
            HealthStatus::Unhealthy(reason) => Some(format!("{}: {}", m.name, reason)),
            _ => None,
        })
        .collect();
    if !unhealthy.is_empty() {
        return HealthStatus::Unhealthy(unhealthy.join("; "));
    }

    let degraded: Vec<String> = modules
        .iter()
        .filter_map(|m| match &m.status {
            HealthStatus::Degraded(reason) => Some(format!("{}: {}", m.name, reason)),
            _ => None,
        })
        .collect();
    if !degraded.is_empty() {
        return HealthStatus::Degraded(degraded.join("; "));
    }

    HealthStatus::Healthy
}

/// Log an aggregated report at a level matching its status.
pub fn log_health(health: &DaemonHealth) {
    match &health.status {
        HealthStatus::Healthy => tracing::debug!(
            uptime_secs = health.uptime_secs,
            modules = health.modules.len(),
            "daemon healthy"
        ),
        HealthStatus::Degraded(reason) => tracing::warn!(
            uptime_secs = health.uptime_secs,
            reason = %reason,
            "daemon degraded"
        ),
        HealthStatus::Unhealthy(reason) => tracing::error!(
            uptime_secs = health.uptime_secs,
            reason = %reason,
            "daemon unhealthy"
        ),
    }
}
