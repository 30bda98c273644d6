// src/health/store.rs
use super::report::HealthCheckReport;
use std::sync::Arc;

/// Holds the single current health report.
///
/// The store lives inside the endpoints' shared state and is only reached
/// through its lock, so `get` and `set` are serialized with scheduler
/// reconfiguration. Readers get a shared handle to a finished report; a
/// `set` swaps the whole value and never touches a report a reader holds.
#[derive(Debug, Clone)]
pub struct HealthReportStore {
    current: Arc<HealthCheckReport>,
}

impl HealthReportStore {
    pub fn new() -> Self {
        Self {
            current: Arc::new(HealthCheckReport::default()),
        }
    }

    pub fn get(&self) -> Arc<HealthCheckReport> {
        Arc::clone(&self.current)
    }

    pub fn set(&mut self, report: HealthCheckReport) {
        self.current = Arc::new(report);
    }
}

impl Default for HealthReportStore {
    fn default() -> Self {
        Self::new()
    }
}
