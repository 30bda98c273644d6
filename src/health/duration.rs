// src/health/duration.rs
use serde::{Serialize, Serializer};
use std::fmt;
use std::fmt::Write as _;
use std::time::Duration;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Convert a duration to fractional milliseconds.
///
/// Whole milliseconds and the sub-millisecond remainder are converted
/// separately, so 20403µs comes out as exactly `20.403`.
pub fn duration_to_millis(duration: Duration) -> f64 {
    let nanos = duration.as_nanos();
    (nanos / NANOS_PER_MILLI) as f64 + (nanos % NANOS_PER_MILLI) as f64 / 1e6
}

/// Render a duration the way SE4 consumers expect it: `"0s"`, `"350ns"`,
/// `"1.5µs"`, `"20.403ms"`, `"2.5s"`, `"1m30s"`, `"72h3m0.5s"`.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{nanos}ns");
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}µs", fixed_point(nanos, 3));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", fixed_point(nanos, 6));
    }

    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let rest = nanos - u128::from(hours * 3600 + minutes * 60) * NANOS_PER_SEC;

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let _ = write!(out, "{}s", fixed_point(rest, 9));
    out
}

// `value` scaled down by 10^digits, trailing fractional zeros dropped
fn fixed_point(value: u128, digits: usize) -> String {
    let unit = 10u128.pow(digits as u32);
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:0digits$}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Duration that serializes as a human readable string instead of a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReportDuration(pub Duration);

impl ReportDuration {
    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl From<Duration> for ReportDuration {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

impl fmt::Display for ReportDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(self.0))
    }
}

impl Serialize for ReportDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_millis_keeps_microsecond_precision() {
        assert_eq!(duration_to_millis(Duration::from_micros(20403)), 20.403);
        assert_eq!(duration_to_millis(Duration::from_millis(5)), 5.0);
        assert_eq!(duration_to_millis(Duration::ZERO), 0.0);
    }

    #[test]
    fn test_format_sub_second_units() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_nanos(350)), "350ns");
        assert_eq!(format_duration(Duration::from_nanos(1500)), "1.5µs");
        assert_eq!(format_duration(Duration::from_micros(20403)), "20.403ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
    }

    #[test]
    fn test_format_seconds_and_up() {
        assert_eq!(format_duration(Duration::from_secs(1)), "1s");
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "1h0m0s");
        assert_eq!(
            format_duration(Duration::from_secs(72 * 3600 + 180) + Duration::from_millis(500)),
            "72h3m0.5s"
        );
    }

    #[test]
    fn test_report_duration_serializes_as_string() {
        let json = serde_json::to_string(&ReportDuration(Duration::from_micros(1500))).unwrap();
        assert_eq!(json, "\"1.5ms\"");
    }

    proptest! {
        #[test]
        fn millis_track_nanoseconds(nanos in 0u64..10_000_000_000_000) {
            let millis = duration_to_millis(Duration::from_nanos(nanos));
            let expected = nanos as f64 / 1e6;
            prop_assert!((millis - expected).abs() <= expected.abs() * 1e-12 + 1e-9);
        }
    }
}
