// src/endpoints.rs
//
// SE4 standard endpoints, see https://github.com/beamly/SE4/blob/master/SE4.md
//
//   Status            GET  /service/status
//   Healthcheck       GET  /service/healthcheck
//   Good to Go        GET  /service/healthcheck/gtg
//   Service Canary    GET  /service/healthcheck/asg
//   Config (optional) GET  /service/config
use crate::error::EndpointsError;
use crate::health::{
    HealthCheckFn, HealthCheckReport, HealthCheckScheduler, HealthReportStore, SchedulerHandle,
};
use crate::metrics::MetricsCollector;
use crate::server::RequestHandler;
use crate::status::{
    default_provider, BuildInfo, StatusRecord, StatusSnapshotBuilder, SystemInfoProvider,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::info;

/// "Good to go": the service is operational and able to receive traffic.
pub type GoodToGoFn = Arc<dyn Fn() -> bool + Send + Sync>;

/// "Service canary": the service is healthy enough to shift traffic to.
pub type ServiceCanaryFn = Arc<dyn Fn() -> bool + Send + Sync>;

/// The configuration the service runs with, as served by `/config`.
pub type ConfigSourceFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Serialize `config` once and serve that value from then on.
pub fn to_config_source<T: Serialize>(config: &T) -> Result<ConfigSourceFn, EndpointsError> {
    let value = serde_json::to_value(config)?;
    Ok(Arc::new(move || value.clone()))
}

/// Everything the scheduler and request handlers share. One lock guards it
/// all, so the check set, its timer and the report change together.
pub(crate) struct EndpointState {
    pub(crate) report: HealthReportStore,
    pub(crate) generation: u64,
    health_checks: Arc<[HealthCheckFn]>,
    scheduler: Option<SchedulerHandle>,
    gtg_check: Option<GoodToGoFn>,
    canary_check: Option<ServiceCanaryFn>,
    config_source: Option<ConfigSourceFn>,
}

impl EndpointState {
    fn new() -> Self {
        Self {
            report: HealthReportStore::new(),
            generation: 0,
            health_checks: Arc::from(Vec::new()),
            scheduler: None,
            gtg_check: None,
            canary_check: None,
            config_source: None,
        }
    }
}

// A panicking predicate or check never leaves the state half written, so a
// poisoned lock is still safe to use.
pub(crate) fn lock_state(state: &Mutex<EndpointState>) -> MutexGuard<'_, EndpointState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One set of SE4 endpoints. Clones share the same state; the background
/// scheduler stops once the last clone is dropped.
#[derive(Clone)]
pub struct StandardEndpoints {
    status: Arc<StatusSnapshotBuilder>,
    state: Arc<Mutex<EndpointState>>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl StandardEndpoints {
    pub fn new() -> Self {
        Self::with_build_info(BuildInfo::undefined())
    }

    pub fn with_build_info(build_info: BuildInfo) -> Self {
        Self::with_system_info(build_info, default_provider())
    }

    pub fn with_system_info(build_info: BuildInfo, system: Arc<dyn SystemInfoProvider>) -> Self {
        Self {
            status: Arc::new(StatusSnapshotBuilder::new(build_info, system)),
            state: Arc::new(Mutex::new(EndpointState::new())),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn metrics(&self) -> Option<&Arc<MetricsCollector>> {
        self.metrics.as_ref()
    }

    /// Replace the health checks and run them every `interval`, starting now.
    ///
    /// Any previous schedule is stopped first; an empty list just stops it
    /// and leaves the last report in place. Checks run one after another and
    /// nothing limits how long one may take: a hanging check stalls every
    /// later report.
    pub fn set_health_check_funcs<I>(
        &self,
        interval: Duration,
        checks: I,
    ) -> Result<(), EndpointsError>
    where
        I: IntoIterator<Item = HealthCheckFn>,
    {
        let checks: Arc<[HealthCheckFn]> = checks.into_iter().collect();

        let runtime = if checks.is_empty() {
            None
        } else {
            if interval.is_zero() {
                return Err(EndpointsError::InvalidInterval(interval));
            }
            Some(Handle::try_current().map_err(|_| EndpointsError::NoRuntime)?)
        };

        let mut state = lock_state(&self.state);
        state.generation += 1;
        // Dropping the handle stops the old timer before a new one exists.
        state.scheduler = None;
        state.health_checks = Arc::clone(&checks);

        if let Some(metrics) = &self.metrics {
            metrics.set_registered_checks(checks.len());
        }

        let Some(runtime) = runtime else {
            info!("Health checks cleared, scheduler stopped");
            return Ok(());
        };

        let scheduler = HealthCheckScheduler::new(
            interval,
            checks,
            state.generation,
            Arc::downgrade(&self.state),
            self.metrics.clone(),
        );
        state.scheduler = Some(scheduler.spawn(&runtime));
        Ok(())
    }

    pub fn set_service_canary_func<F>(&self, canary_check: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        lock_state(&self.state).canary_check = Some(Arc::new(canary_check));
    }

    pub fn set_good_to_go_func<F>(&self, gtg_check: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        lock_state(&self.state).gtg_check = Some(Arc::new(gtg_check));
    }

    pub fn set_config_source_func(&self, config_source: ConfigSourceFn) {
        lock_state(&self.state).config_source = Some(config_source);
    }

    /// The most recently published report, or the zero report before the
    /// first tick has finished.
    pub fn health_report(&self) -> Arc<HealthCheckReport> {
        lock_state(&self.state).report.get()
    }

    pub fn health_check_count(&self) -> usize {
        lock_state(&self.state).health_checks.len()
    }

    pub fn is_scheduled(&self) -> bool {
        lock_state(&self.state).scheduler.is_some()
    }

    pub fn status(&self) -> StatusRecord {
        self.status.snapshot()
    }

    pub fn build_info(&self) -> &BuildInfo {
        self.status.build_info()
    }

    /// Unset means good to go. The predicate runs outside the lock.
    pub fn good_to_go(&self) -> bool {
        let check = lock_state(&self.state).gtg_check.clone();
        check.map_or(true, |check| check())
    }

    /// Unset means healthy. The predicate runs outside the lock.
    pub fn service_canary(&self) -> bool {
        let check = lock_state(&self.state).canary_check.clone();
        check.map_or(true, |check| check())
    }

    pub fn config(&self) -> Option<Value> {
        let source = lock_state(&self.state).config_source.clone();
        source.map(|source| source())
    }

    /// A `tower::Service` serving these endpoints under `prefix`.
    pub fn handler(&self, prefix: impl Into<String>) -> RequestHandler {
        RequestHandler::new(self.clone(), prefix)
    }
}

impl Default for StandardEndpoints {
    fn default() -> Self {
        Self::new()
    }
}
