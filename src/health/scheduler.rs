// src/health/scheduler.rs
use super::report::{HealthCheckReport, HealthCheckResult, HealthResult};
use crate::endpoints::{lock_state, EndpointState};
use crate::metrics::MetricsCollector;
use std::sync::{Arc, Mutex, Weak};
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::{self, JoinHandle};
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info};

/// A user supplied health check. It decides pass/fail itself and is treated
/// as infallible by the scheduler.
pub type HealthCheckFn = Arc<dyn Fn() -> HealthCheckResult + Send + Sync>;

pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(10);

/// Wrap a closure as a [`HealthCheckFn`].
pub fn health_check<F>(check: F) -> HealthCheckFn
where
    F: Fn() -> HealthCheckResult + Send + Sync + 'static,
{
    Arc::new(check)
}

/// Run every check in order on the current thread and assemble a report.
///
/// A check that blocks holds up every check after it and the report itself.
pub fn run_checks(checks: &[HealthCheckFn]) -> HealthCheckReport {
    let start = Instant::now();
    let results: Vec<HealthCheckResult> = checks.iter().map(|check| check()).collect();
    HealthCheckReport::new(start.elapsed(), results)
}

/// Owner side of a running scheduler task. Dropping it stops the task.
pub(crate) struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        self.task.abort();
    }
}

/// Repeating timer that runs one check set and publishes its reports.
///
/// Each scheduler is tagged with the generation it was configured under;
/// once the endpoints are reconfigured its reports are discarded, even if a
/// batch was already in flight.
pub(crate) struct HealthCheckScheduler {
    interval: Duration,
    checks: Arc<[HealthCheckFn]>,
    generation: u64,
    state: Weak<Mutex<EndpointState>>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl HealthCheckScheduler {
    pub(crate) fn new(
        interval: Duration,
        checks: Arc<[HealthCheckFn]>,
        generation: u64,
        state: Weak<Mutex<EndpointState>>,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        Self {
            interval,
            checks,
            generation,
            state,
            metrics,
        }
    }

    pub(crate) fn spawn(self, runtime: &Handle) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = runtime.spawn(self.run(shutdown_rx));
        SchedulerHandle { shutdown_tx, task }
    }

    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            "Starting health check scheduler: {} checks every {:?} (generation {})",
            self.checks.len(),
            self.interval,
            self.generation
        );

        // Fire right away, then every `interval` after each publication.
        loop {
            if let Some(report) = self.tick().await {
                if !self.publish(report) {
                    debug!("Health check scheduler generation {} superseded", self.generation);
                    break;
                }
            }

            tokio::select! {
                _ = sleep(self.interval) => {}
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Health check scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }

    async fn tick(&self) -> Option<HealthCheckReport> {
        let checks = Arc::clone(&self.checks);
        match task::spawn_blocking(move || run_checks(&checks)).await {
            Ok(report) => Some(report),
            Err(e) => {
                error!("Health check batch aborted, keeping previous report: {}", e);
                None
            }
        }
    }

    fn publish(&self, report: HealthCheckReport) -> bool {
        let Some(shared) = self.state.upgrade() else {
            return false;
        };
        let mut state = lock_state(&shared);
        if state.generation != self.generation {
            return false;
        }

        debug!(
            "Health check complete in {}: {} passed, {} failed",
            report.duration,
            report.count(HealthResult::Passed),
            report.count(HealthResult::Failed)
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_health_report(&report);
        }

        state.report.set(report);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_run_checks_preserves_registration_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let checks: Vec<HealthCheckFn> = ["first", "second", "third"]
            .into_iter()
            .map(|name| {
                let calls = calls.clone();
                health_check(move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    HealthCheckResult::passed(name, Duration::ZERO)
                })
            })
            .collect();

        let report = run_checks(&checks);

        let names: Vec<&str> = report.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(!report.is_zero());
    }

    #[test]
    fn test_batch_duration_covers_slow_checks() {
        let checks = vec![
            health_check(|| {
                std::thread::sleep(Duration::from_millis(15));
                HealthCheckResult::passed("slow", Duration::from_millis(15))
            }),
            health_check(|| HealthCheckResult::failed("fast", Duration::ZERO)),
        ];

        let report = run_checks(&checks);

        assert!(report.duration.as_duration() >= Duration::from_millis(15));
        assert_eq!(report.count(HealthResult::Failed), 1);
    }

    #[test]
    fn test_empty_check_set_yields_empty_report() {
        let report = run_checks(&[]);
        assert!(report.results.is_empty());
        assert!(!report.is_zero());
    }
}
