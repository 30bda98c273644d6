// src/metrics/collector.rs
use crate::health::HealthCheckReport;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

pub struct MetricsCollector {
    // Scheduler metrics
    pub health_check_ticks_total: IntCounter,
    pub health_check_batch_duration_seconds: Histogram,
    pub health_check_results_total: IntCounterVec,
    pub health_checks_registered: IntGauge,

    // Endpoint metrics
    pub endpoint_requests_total: IntCounterVec,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let health_check_ticks_total = IntCounter::new(
            "se4_health_check_ticks_total",
            "Health check batches that produced a report",
        )?;
        registry.register(Box::new(health_check_ticks_total.clone()))?;

        let health_check_batch_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "se4_health_check_batch_duration_seconds",
            "Time taken to run every registered health check",
        ))?;
        registry.register(Box::new(health_check_batch_duration_seconds.clone()))?;

        let health_check_results_total = IntCounterVec::new(
            Opts::new(
                "se4_health_check_results_total",
                "Health check results by check name and outcome",
            ),
            &["check", "result"],
        )?;
        registry.register(Box::new(health_check_results_total.clone()))?;

        let health_checks_registered = IntGauge::new(
            "se4_health_checks_registered",
            "Number of health checks currently scheduled",
        )?;
        registry.register(Box::new(health_checks_registered.clone()))?;

        let endpoint_requests_total = IntCounterVec::new(
            Opts::new("se4_endpoint_requests_total", "Requests served per route"),
            &["route", "status_code"],
        )?;
        registry.register(Box::new(endpoint_requests_total.clone()))?;

        Ok(Self {
            health_check_ticks_total,
            health_check_batch_duration_seconds,
            health_check_results_total,
            health_checks_registered,
            endpoint_requests_total,
        })
    }

    pub fn record_health_report(&self, report: &HealthCheckReport) {
        self.health_check_ticks_total.inc();
        self.health_check_batch_duration_seconds
            .observe(report.duration.as_duration().as_secs_f64());

        for result in &report.results {
            self.health_check_results_total
                .with_label_values(&[result.name.as_str(), result.result.as_str()])
                .inc();
        }
    }

    pub fn set_registered_checks(&self, count: usize) {
        self.health_checks_registered.set(count as i64);
    }

    pub fn record_request(&self, route: &str, status_code: u16) {
        let status = status_code.to_string();
        self.endpoint_requests_total
            .with_label_values(&[route, &status])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::HealthCheckResult;
    use std::time::Duration;

    #[test]
    fn test_report_metrics_are_exported() {
        let registry = MetricsRegistry::new().unwrap();
        let metrics = registry.collector();

        metrics.set_registered_checks(2);
        metrics.record_health_report(&HealthCheckReport::new(
            Duration::from_millis(4),
            vec![
                HealthCheckResult::passed("db", Duration::ZERO),
                HealthCheckResult::failed("cache", Duration::ZERO),
            ],
        ));
        metrics.record_request("gtg", 503);

        let text = String::from_utf8(registry.gather().unwrap()).unwrap();
        assert!(text.contains("se4_health_check_ticks_total 1"));
        assert!(text.contains("se4_health_checks_registered 2"));
        assert!(text.contains("check=\"cache\",result=\"failed\""));
        assert!(text.contains("route=\"gtg\",status_code=\"503\""));
    }
}
