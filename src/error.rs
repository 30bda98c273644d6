// src/error.rs
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum EndpointsError {
    #[error("Health check interval must be positive, got {0:?}")]
    InvalidInterval(Duration),

    #[error("Health checks can only be scheduled from within a Tokio runtime")]
    NoRuntime,

    #[error("Failed to serialize config source: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("health_check.interval_secs must be greater than zero")]
    ZeroInterval,

    #[error("Invalid path prefix {0:?}: must start with '/' and must not end with '/'")]
    InvalidPathPrefix(String),

    #[error("Invalid metrics path {0:?}: must start with '/'")]
    InvalidMetricsPath(String),

    #[error("Metrics port {0} collides with the endpoints listener")]
    PortCollision(u16),
}
