// src/lib.rs
pub mod config;
pub mod endpoints;
pub mod error;
pub mod health;
pub mod metrics;
pub mod server;
pub mod status;

pub use endpoints::{
    to_config_source, ConfigSourceFn, GoodToGoFn, ServiceCanaryFn, StandardEndpoints,
};
pub use error::{ConfigError, EndpointsError};
pub use health::{
    duration_to_millis, health_check, HealthCheckFn, HealthCheckReport, HealthCheckResult,
    HealthResult, DEFAULT_HEALTH_CHECK_INTERVAL,
};
pub use server::{RequestHandler, DEFAULT_PATH_PREFIX};
pub use status::{BuildInfo, StatusRecord};
