//! Service orchestration -- assembly and lifecycle management.
//!
//! The [`Orchestrator`] is the central coordinator of `netsentry-daemon`.
//! It builds the shared components (error handler, broker client, GeoIP
//! service), constructs the enabled collector services, starts them, and
//! runs the main loop until a shutdown signal arrives.
//!
//! # Startup
//!
//! Services are started independently: a service that fails to start is
//! logged and left stopped while the others keep running. Startup fails as a
//! whole only when no service is running afterwards.
//!
//! # Shutdown Order
//!
//! 1. Syslog collector (close listeners, drain queue, flush last batch)
//! 2. SNMP poller (stop polling, flush accumulated events)
//! 3. Broker client (flush and close)

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;

use netsentry_collector::broker::BrokerClient;
use netsentry_collector::{
    CollectorConfig, ErrorHandler, GeoIpService, IpApiProvider, LoggingBroker, SnmpService,
    SyslogService, UdpSnmpClient,
};
use netsentry_core::config::NetsentryConfig;
use netsentry_core::plugin::PluginRegistry;

use crate::health::{DaemonHealth, ModuleHealth, aggregate_status, log_health};
use crate::metrics_server;
use crate::pidfile::PidFile;

/// Seconds between aggregated health reports in the main loop.
const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Interval between `netsentry_daemon_uptime_seconds` gauge updates.
const UPTIME_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Maximum time the broker client gets to flush on shutdown.
const BROKER_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// The main daemon orchestrator.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: NetsentryConfig,
    /// Registry of all services (ordered for start/stop).
    plugins: PluginRegistry,
    /// Broker client shared by both services.
    broker: Arc<LoggingBroker>,
    /// Error handler shared by every wrapped operation.
    handler: Arc<ErrorHandler>,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read, parsed or
    /// validated, or if a service cannot be constructed.
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = NetsentryConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config).await
    }

    /// Build from an already-loaded configuration.
    pub async fn build_from_config(config: NetsentryConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        // Install metrics recorder before any service records a metric
        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
            record_daemon_metrics();
        }

        let handler = Arc::new(ErrorHandler::new());
        let broker = Arc::new(LoggingBroker::new(&config.broker));
        let collector_config = CollectorConfig::from_core(&config);

        let geoip = if config.processing.enable_enrichment && config.geoip.enabled {
            tracing::info!(base_url = %config.geoip.base_url, "initializing GeoIP lookups");
            let provider = IpApiProvider::new(&config.geoip)?;
            Some(Arc::new(GeoIpService::with_config(
                provider,
                Arc::clone(&handler),
                &config.geoip,
            )))
        } else {
            None
        };

        let mut plugins = PluginRegistry::new();

        tracing::info!("initializing syslog collector");
        let syslog: SyslogService<LoggingBroker> = SyslogService::new(
            collector_config.clone(),
            Arc::clone(&broker),
            Arc::clone(&handler),
            geoip.clone(),
        )?;
        plugins.register(Box::new(syslog))?;

        if config.snmp.enabled {
            tracing::info!(targets = config.snmp.targets.len(), "initializing SNMP poller");
            let client = Arc::new(UdpSnmpClient::new(
                Duration::from_secs(config.snmp.timeout_secs),
                config.snmp.retries,
            ));
            let snmp: SnmpService<LoggingBroker, UdpSnmpClient> = SnmpService::new(
                collector_config,
                client,
                Arc::clone(&broker),
                Arc::clone(&handler),
                geoip,
            )?;
            plugins.register(Box::new(snmp))?;
        }

        tracing::info!(total_plugins = plugins.count(), "orchestrator initialized");

        Ok(Self {
            config,
            plugins,
            broker,
            handler,
            start_time: Instant::now(),
        })
    }

    /// Start all services and block until SIGTERM or SIGINT.
    pub async fn run(&mut self) -> Result<()> {
        let shutdown = wait_for_shutdown_signal()?;
        self.run_until(shutdown).await
    }

    /// Start all services and block until `shutdown` completes.
    ///
    /// The future resolves to the name of the shutdown trigger, used for logging.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = &'static str>,
    {
        // Held until return; dropping it removes the file on every path.
        let _pid_file = PidFile::acquire_configured(&self.config.general.pid_file)?;

        tracing::info!("starting all plugins");
        let report = self.plugins.start_each().await;
        if report.nothing_started() {
            return Err(anyhow::anyhow!(
                "no service could be started: {}",
                report.failure_summary()
            ));
        }
        if !report.failed.is_empty() {
            tracing::warn!(
                failed = report.failed.len(),
                running = report.started.len(),
                "continuing with partially started services"
            );
        }

        tracing::info!("entering main event loop");
        let mut health_ticker = tokio::time::interval(HEALTH_CHECK_INTERVAL);
        health_ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        health_ticker.tick().await;
        let mut uptime_ticker = tokio::time::interval(UPTIME_REFRESH_INTERVAL);
        uptime_ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let publish_uptime = self.config.metrics.enabled;

        tokio::pin!(shutdown);
        let signal = loop {
            tokio::select! {
                signal = &mut shutdown => break signal,
                _ = health_ticker.tick() => {
                    let health = self.health().await;
                    log_health(&health);
                }
                _ = uptime_ticker.tick(), if publish_uptime => record_uptime(self.start_time),
            }
        };
        tracing::info!(signal = signal, "shutdown signal received");

        self.shutdown().await
    }

    /// Stop every running service, then flush and close the broker client.
    async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("stopping all plugins");
        let stopped = self.plugins.stop_all().await;

        if let Err(e) = self.broker.flush(BROKER_FLUSH_TIMEOUT).await {
            tracing::warn!(error = %e, "broker flush failed");
        }
        if let Err(e) = self.broker.close().await {
            tracing::warn!(error = %e, "broker close failed");
        }

        for snapshot in self.handler.snapshot() {
            if snapshot.failed_operations > 0 {
                tracing::info!(
                    operation = %snapshot.operation,
                    state = snapshot.state,
                    total = snapshot.total_operations,
                    failed = snapshot.failed_operations,
                    "operation summary"
                );
            }
        }

        stopped.map_err(Into::into)
    }

    /// Get the current aggregated health status.
    pub async fn health(&self) -> DaemonHealth {
        let modules: Vec<ModuleHealth> = self
            .plugins
            .statuses()
            .await
            .into_iter()
            .map(|s| ModuleHealth {
                name: s.name,
                state: s.state,
                status: s.health,
            })
            .collect();

        DaemonHealth {
            status: aggregate_status(&modules),
            uptime_secs: self.start_time.elapsed().as_secs(),
            modules,
        }
    }

    /// Names of the registered services, in start order.
    pub fn service_names(&self) -> Vec<String> {
        self.plugins.names()
    }

    /// Number of services currently running.
    pub fn running_count(&self) -> usize {
        self.plugins.running_count()
    }

    /// The shared broker client.
    pub fn broker(&self) -> &Arc<LoggingBroker> {
        &self.broker
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &NetsentryConfig {
        &self.config
    }
}

/// Install SIGTERM/SIGINT handlers and return a future that resolves on either.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
fn wait_for_shutdown_signal() -> Result<impl Future<Output = &'static str>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    })
}

/// Record the build info gauge once at startup.
fn record_daemon_metrics() {
    use netsentry_core::metrics as m;

    metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "daemon metrics recorded");
}

/// Set the uptime gauge from the daemon start time.
fn record_uptime(start_time: Instant) {
    #[allow(clippy::cast_precision_loss)]
    metrics::gauge!(netsentry_core::metrics::DAEMON_UPTIME_SECONDS)
        .set(start_time.elapsed().as_secs() as f64);
}
