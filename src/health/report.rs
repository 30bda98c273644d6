// src/health/report.rs
use super::duration::{duration_to_millis, ReportDuration};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

// 0001-01-01T00:00:00Z, the timestamp of a report that was never generated
const ZERO_TIMESTAMP_SECS: i64 = -62_135_596_800;

pub(crate) fn zero_timestamp() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ZERO_TIMESTAMP_SECS, 0).unwrap_or_default()
}

/// The state of a single test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthResult {
    #[default]
    NotRun,
    Running,
    Passed,
    Failed,
}

impl HealthResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthResult::NotRun => "not_run",
            HealthResult::Running => "running",
            HealthResult::Passed => "passed",
            HealthResult::Failed => "failed",
        }
    }
}

impl fmt::Display for HealthResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one health check function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthCheckResult {
    /// Milliseconds taken to run the test; see [`duration_to_millis`].
    pub duration_millis: f64,
    /// A name that is meaningful to supporting engineers.
    #[serde(rename = "test_name")]
    pub name: String,
    #[serde(rename = "test_result")]
    pub result: HealthResult,
    #[serde(rename = "tested_at")]
    pub timestamp: DateTime<Utc>,
}

impl HealthCheckResult {
    pub fn new(name: impl Into<String>, result: HealthResult, duration: Duration) -> Self {
        Self {
            duration_millis: duration_to_millis(duration),
            name: name.into(),
            result,
            timestamp: Utc::now(),
        }
    }

    pub fn passed(name: impl Into<String>, duration: Duration) -> Self {
        Self::new(name, HealthResult::Passed, duration)
    }

    pub fn failed(name: impl Into<String>, duration: Duration) -> Self {
        Self::new(name, HealthResult::Failed, duration)
    }

    /// Time `check` and record `passed` when it returns true.
    pub fn timed(name: impl Into<String>, check: impl FnOnce() -> bool) -> Self {
        let start = Instant::now();
        let healthy = check();
        let result = if healthy {
            HealthResult::Passed
        } else {
            HealthResult::Failed
        };
        Self::new(name, result, start.elapsed())
    }
}

impl Default for HealthCheckResult {
    fn default() -> Self {
        Self {
            duration_millis: 0.0,
            name: String::new(),
            result: HealthResult::NotRun,
            timestamp: zero_timestamp(),
        }
    }
}

/// One complete run of every registered check.
///
/// Reports are only ever replaced as a whole, never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthCheckReport {
    /// When this report was generated (not necessarily now).
    #[serde(rename = "report_as_of")]
    pub timestamp: DateTime<Utc>,
    /// How long it took to generate the report.
    #[serde(rename = "report_duration")]
    pub duration: ReportDuration,
    /// Results in registration order.
    #[serde(rename = "tests")]
    pub results: Vec<HealthCheckResult>,
}

impl HealthCheckReport {
    pub fn new(duration: Duration, results: Vec<HealthCheckResult>) -> Self {
        Self {
            timestamp: Utc::now(),
            duration: ReportDuration(duration),
            results,
        }
    }

    /// True for the placeholder served before the first tick completes.
    pub fn is_zero(&self) -> bool {
        self.timestamp == zero_timestamp() && self.results.is_empty()
    }

    pub fn count(&self, result: HealthResult) -> usize {
        self.results.iter().filter(|r| r.result == result).count()
    }
}

impl Default for HealthCheckReport {
    fn default() -> Self {
        Self {
            timestamp: zero_timestamp(),
            duration: ReportDuration::default(),
            results: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_zero_report_serialization() {
        let report = HealthCheckReport::default();
        assert!(report.is_zero());

        let json: Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["report_as_of"], "0001-01-01T00:00:00Z");
        assert_eq!(json["report_duration"], "0s");
        assert_eq!(json["tests"], Value::Array(vec![]));
    }

    #[test]
    fn test_result_field_names() {
        let result = HealthCheckResult::passed("some test", Duration::from_micros(20403));
        let body = serde_json::to_string(&result).unwrap();

        assert!(body.contains("\"duration_millis\":20.403"));
        assert!(body.contains("\"test_name\":\"some test\""));
        assert!(body.contains("\"test_result\":\"passed\""));
        assert!(body.contains("\"tested_at\":\""));
    }

    #[test]
    fn test_result_states_serialize_snake_case() {
        for (state, text) in [
            (HealthResult::NotRun, "\"not_run\""),
            (HealthResult::Running, "\"running\""),
            (HealthResult::Passed, "\"passed\""),
            (HealthResult::Failed, "\"failed\""),
        ] {
            assert_eq!(serde_json::to_string(&state).unwrap(), text);
            assert_eq!(format!("\"{state}\""), text);
        }
    }

    #[test]
    fn test_timed_records_check_outcome() {
        assert_eq!(HealthCheckResult::timed("up", || true).result, HealthResult::Passed);
        assert_eq!(HealthCheckResult::timed("down", || false).result, HealthResult::Failed);
    }

    #[test]
    fn test_report_counts() {
        let report = HealthCheckReport::new(
            Duration::from_millis(3),
            vec![
                HealthCheckResult::passed("a", Duration::ZERO),
                HealthCheckResult::failed("b", Duration::ZERO),
                HealthCheckResult::passed("c", Duration::ZERO),
            ],
        );
        assert!(!report.is_zero());
        assert_eq!(report.count(HealthResult::Passed), 2);
        assert_eq!(report.count(HealthResult::Failed), 1);
    }
}
