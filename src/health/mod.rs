// src/health/mod.rs
mod duration;
mod report;
mod scheduler;
mod store;

pub use duration::{duration_to_millis, format_duration, ReportDuration};
pub use report::{HealthCheckReport, HealthCheckResult, HealthResult};
pub use scheduler::{health_check, run_checks, HealthCheckFn, DEFAULT_HEALTH_CHECK_INTERVAL};
pub use store::HealthReportStore;

pub(crate) use scheduler::{HealthCheckScheduler, SchedulerHandle};
