//! 플러그인 시스템 -- 서비스 등록, 생명주기 관리
//!
//! [`Plugin`] trait은 [`Pipeline`]에 메타데이터와 상태 조회를 더한 것입니다.
//! [`PluginRegistry`]는 등록 순서를 보존하며 서비스를 시작/정지합니다.
//!
//! # 생명주기
//! ```text
//! Created → start() → Running → stop() → Stopped
//!                ↘ Failed
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{NetsentryError, PluginError};
use crate::pipeline::{BoxFuture, HealthStatus, Pipeline};

// ─── PluginType ──────────────────────────────────────────────────────

/// 플러그인 유형
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginType {
    /// 수신형 수집기 (syslog 리스너)
    Collector,
    /// 능동 폴러 (SNMP)
    Poller,
    /// 사용자 정의 플러그인
    Custom(String),
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collector => write!(f, "collector"),
            Self::Poller => write!(f, "poller"),
            Self::Custom(name) => write!(f, "custom:{name}"),
        }
    }
}

// ─── PluginInfo ──────────────────────────────────────────────────────

/// 플러그인 메타데이터
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginInfo {
    /// 플러그인 고유 이름 (예: `"syslog-collector"`)
    pub name: String,
    /// 플러그인 버전
    pub version: String,
    /// 플러그인 설명
    pub description: String,
    /// 플러그인 유형
    pub plugin_type: PluginType,
}

// ─── PluginState ─────────────────────────────────────────────────────

/// 플러그인 생명주기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginState {
    /// 생성됨 (start 전)
    Created,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
    /// 오류 상태
    Failed,
}

impl fmt::Display for PluginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

// ─── Plugin Trait ────────────────────────────────────────────────────

/// 레지스트리에 등록 가능한 파이프라인
pub trait Plugin: Pipeline {
    /// 플러그인 메타데이터를 반환합니다.
    fn info(&self) -> &PluginInfo;

    /// 현재 플러그인 상태를 반환합니다.
    fn state(&self) -> PluginState;
}

// ─── DynPlugin Trait ─────────────────────────────────────────────────

/// 객체 안전한 서비스 핸들
///
/// [`Pipeline`]의 async 메서드는 trait 객체로 쓸 수 없으므로
/// 레지스트리는 이 trait을 통해 [`BoxFuture`]로 호출합니다.
pub trait DynPlugin: Send + Sync {
    fn info(&self) -> &PluginInfo;

    fn state(&self) -> PluginState;

    fn start(&mut self) -> BoxFuture<'_, Result<(), NetsentryError>>;

    fn stop(&mut self) -> BoxFuture<'_, Result<(), NetsentryError>>;

    fn health_check(&self) -> BoxFuture<'_, HealthStatus>;
}

impl<T: Plugin> DynPlugin for T {
    fn info(&self) -> &PluginInfo {
        Plugin::info(self)
    }

    fn state(&self) -> PluginState {
        Plugin::state(self)
    }

    fn start(&mut self) -> BoxFuture<'_, Result<(), NetsentryError>> {
        Box::pin(Pipeline::start(self))
    }

    fn stop(&mut self) -> BoxFuture<'_, Result<(), NetsentryError>> {
        Box::pin(Pipeline::stop(self))
    }

    fn health_check(&self) -> BoxFuture<'_, HealthStatus> {
        Box::pin(Pipeline::health_check(self))
    }
}

// ─── Registry Reports ────────────────────────────────────────────────

/// [`PluginRegistry::start_each`] 결과
#[derive(Debug, Default)]
pub struct StartReport {
    /// 시작에 성공한 서비스 이름
    pub started: Vec<String>,
    /// 시작에 실패한 서비스 이름과 에러
    pub failed: Vec<(String, NetsentryError)>,
}

impl StartReport {
    /// 서비스가 하나 이상 등록되었지만 아무것도 시작되지 않았는지 여부
    pub fn nothing_started(&self) -> bool {
        self.started.is_empty() && !self.failed.is_empty()
    }

    /// 실패 사유를 `"name: error; ..."` 형식으로 합칩니다.
    pub fn failure_summary(&self) -> String {
        self.failed
            .iter()
            .map(|(name, e)| format!("{name}: {e}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// 서비스 하나의 상태 스냅샷
#[derive(Debug, Clone)]
pub struct ServiceStatus {
    pub name: String,
    pub state: PluginState,
    pub health: HealthStatus,
}

// ─── PluginRegistry ──────────────────────────────────────────────────

/// 수집 서비스 레지스트리
///
/// 등록 순서대로 시작하고 같은 순서로 정지합니다. 이름은 고유해야 합니다.
///
/// ```ignore
/// let mut registry = PluginRegistry::new();
/// registry.register(Box::new(syslog_service))?;
/// registry.register(Box::new(snmp_service))?;
///
/// let report = registry.start_each().await;
/// if report.nothing_started() { /* 기동 실패 */ }
/// registry.stop_all().await?;
/// ```
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn DynPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 서비스를 등록합니다. 같은 이름이 있으면 `AlreadyRegistered`입니다.
    pub fn register(&mut self, plugin: Box<dyn DynPlugin>) -> Result<(), NetsentryError> {
        let name = plugin.info().name.clone();
        if self.get(&name).is_some() {
            return Err(PluginError::AlreadyRegistered { name }.into());
        }
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn DynPlugin> {
        self.plugins
            .iter()
            .map(|p| p.as_ref())
            .find(|p| p.info().name == name)
    }

    /// 모든 서비스를 서로 독립적으로 시작합니다.
    ///
    /// 한 서비스의 실패는 기록만 하고 다음 서비스 시작을 계속합니다.
    pub async fn start_each(&mut self) -> StartReport {
        let mut report = StartReport::default();
        for plugin in &mut self.plugins {
            let name = plugin.info().name.clone();
            match plugin.start().await {
                Ok(()) => {
                    tracing::info!(service = %name, "service started");
                    report.started.push(name);
                }
                Err(e) => {
                    tracing::error!(service = %name, error = %e, "service failed to start");
                    report.failed.push((name, e));
                }
            }
        }
        report
    }

    /// `Running` 상태의 서비스만 정지합니다.
    ///
    /// 개별 실패가 있어도 끝까지 진행하고, 실패를 모아 `StopFailed`로 반환합니다.
    pub async fn stop_all(&mut self) -> Result<(), NetsentryError> {
        let mut errors = Vec::new();
        for plugin in self
            .plugins
            .iter_mut()
            .filter(|p| p.state() == PluginState::Running)
        {
            if let Err(e) = plugin.stop().await {
                errors.push(format!("{}: {}", plugin.info().name, e));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(PluginError::StopFailed(errors.join("; ")).into())
        }
    }

    pub fn count(&self) -> usize {
        self.plugins.len()
    }

    pub fn running_count(&self) -> usize {
        self.plugins
            .iter()
            .filter(|p| p.state() == PluginState::Running)
            .count()
    }

    /// 등록 순서대로 서비스 이름을 반환합니다.
    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.info().name.clone()).collect()
    }

    /// 모든 서비스의 상태와 건강 상태를 조회합니다.
    pub async fn statuses(&self) -> Vec<ServiceStatus> {
        let mut statuses = Vec::with_capacity(self.plugins.len());
        for plugin in &self.plugins {
            statuses.push(ServiceStatus {
                name: plugin.info().name.clone(),
                state: plugin.state(),
                health: plugin.health_check().await,
            });
        }
        statuses
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    /// 테스트용 Mock 플러그인
    struct MockPlugin {
        info: PluginInfo,
        state: PluginState,
        fail_on_start: bool,
        fail_on_stop: bool,
    }

    impl MockPlugin {
        fn new(name: &str, plugin_type: PluginType) -> Self {
            Self {
                info: PluginInfo {
                    name: name.to_owned(),
                    version: "0.1.0".to_owned(),
                    description: format!("Mock plugin: {name}"),
                    plugin_type,
                },
                state: PluginState::Created,
                fail_on_start: false,
                fail_on_stop: false,
            }
        }

        fn failing_start(mut self) -> Self {
            self.fail_on_start = true;
            self
        }

        fn failing_stop(mut self) -> Self {
            self.fail_on_stop = true;
            self
        }
    }

    impl Pipeline for MockPlugin {
        async fn start(&mut self) -> Result<(), NetsentryError> {
            if self.fail_on_start {
                self.state = PluginState::Failed;
                return Err(PipelineError::InitFailed("mock start failure".to_owned()).into());
            }
            self.state = PluginState::Running;
            Ok(())
        }

        async fn stop(&mut self) -> Result<(), NetsentryError> {
            if self.fail_on_stop {
                self.state = PluginState::Failed;
                return Err(PipelineError::InitFailed("mock stop failure".to_owned()).into());
            }
            self.state = PluginState::Stopped;
            Ok(())
        }

        async fn health_check(&self) -> HealthStatus {
            match self.state {
                PluginState::Running => HealthStatus::Healthy,
                PluginState::Failed => HealthStatus::Unhealthy("failed".to_owned()),
                _ => HealthStatus::Degraded("not running".to_owned()),
            }
        }
    }

    impl Plugin for MockPlugin {
        fn info(&self) -> &PluginInfo {
            &self.info
        }

        fn state(&self) -> PluginState {
            self.state
        }
    }

    #[test]
    fn plugin_type_display() {
        assert_eq!(PluginType::Collector.to_string(), "collector");
        assert_eq!(PluginType::Poller.to_string(), "poller");
        assert_eq!(
            PluginType::Custom("netflow".to_owned()).to_string(),
            "custom:netflow"
        );
    }

    fn registry_with(plugins: Vec<MockPlugin>) -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        for plugin in plugins {
            registry.register(Box::new(plugin)).unwrap();
        }
        registry
    }

    #[test]
    fn register_rejects_duplicate_name() {
        let mut registry =
            registry_with(vec![MockPlugin::new("syslog", PluginType::Collector)]);
        let err = registry
            .register(Box::new(MockPlugin::new("syslog", PluginType::Collector)))
            .unwrap_err();
        assert!(matches!(
            err,
            NetsentryError::Plugin(PluginError::AlreadyRegistered { .. })
        ));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn names_keep_registration_order() {
        let registry = registry_with(vec![
            MockPlugin::new("syslog", PluginType::Collector),
            MockPlugin::new("snmp", PluginType::Poller),
        ]);
        assert_eq!(registry.names(), vec!["syslog", "snmp"]);
        assert!(registry.get("snmp").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[tokio::test]
    async fn start_each_isolates_failures() {
        let mut registry = registry_with(vec![
            MockPlugin::new("syslog", PluginType::Collector),
            MockPlugin::new("snmp", PluginType::Poller).failing_start(),
        ]);

        let report = registry.start_each().await;
        assert_eq!(report.started, vec!["syslog"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "snmp");
        assert!(!report.nothing_started());
        assert!(report.failure_summary().starts_with("snmp: "));
        assert_eq!(registry.running_count(), 1);
    }

    #[tokio::test]
    async fn nothing_started_when_every_service_fails() {
        let mut registry = registry_with(vec![
            MockPlugin::new("syslog", PluginType::Collector).failing_start(),
            MockPlugin::new("snmp", PluginType::Poller).failing_start(),
        ]);
        let report = registry.start_each().await;
        assert!(report.nothing_started());
        assert_eq!(registry.running_count(), 0);
    }

    #[tokio::test]
    async fn empty_registry_reports_nothing_failed() {
        let mut registry = PluginRegistry::new();
        assert!(!registry.start_each().await.nothing_started());
    }

    #[tokio::test]
    async fn stop_all_continues_past_failures() {
        let mut registry = registry_with(vec![
            MockPlugin::new("a", PluginType::Collector).failing_stop(),
            MockPlugin::new("b", PluginType::Poller),
        ]);
        registry.start_each().await;

        let err = registry.stop_all().await.unwrap_err();
        assert!(err.to_string().contains("a: "));
        assert_eq!(registry.get("b").unwrap().state(), PluginState::Stopped);
    }

    #[tokio::test]
    async fn stop_all_skips_services_that_never_started() {
        let mut registry = registry_with(vec![
            MockPlugin::new("broken", PluginType::Poller)
                .failing_start()
                .failing_stop(),
        ]);
        registry.start_each().await;
        registry.stop_all().await.unwrap();
    }

    #[tokio::test]
    async fn statuses_report_each_service() {
        let mut registry = registry_with(vec![
            MockPlugin::new("syslog", PluginType::Collector),
            MockPlugin::new("snmp", PluginType::Poller).failing_start(),
        ]);
        registry.start_each().await;

        let statuses = registry.statuses().await;
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].state, PluginState::Running);
        assert!(statuses[0].health.is_healthy());
        assert_eq!(statuses[1].state, PluginState::Failed);
        assert!(statuses[1].health.is_unhealthy());
    }
}
