// src/status/snapshot.rs
use super::build_info::BuildInfo;
use super::system::{SystemInfoProvider, UnameInfo};
use crate::health::format_duration;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, warn};

/// Reported as `os_avgload` whenever the load average can't be read.
pub const LOAD_AVERAGE_UNAVAILABLE: &str = "0.0";

/// Point-in-time status of this process, as served by `/status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    #[serde(flatten)]
    pub build_info: BuildInfo,

    pub compiler_version: String,
    pub current_time: String,
    pub group_id: String,

    pub machine_name: String,
    pub os_arch: String,
    pub os_avgload: String,
    pub os_name: String,
    pub os_numprocessors: String,
    pub os_version: String,

    pub up_duration: String,
    pub up_since: String,

    pub vm_name: String,
    pub vm_vendor: String,
    pub vm_version: String,

    pub runtime_flavor: String,
    pub num_threads: String,
}

/// Combines the fixed build/machine fields captured at startup with values
/// sampled on every request.
pub struct StatusSnapshotBuilder {
    template: StatusRecord,
    started_at: DateTime<Utc>,
    started: Instant,
    system: Arc<dyn SystemInfoProvider>,
}

impl StatusSnapshotBuilder {
    pub fn new(build_info: BuildInfo, system: Arc<dyn SystemInfoProvider>) -> Self {
        let started_at = Utc::now();
        let uname = system.uname().unwrap_or_else(|e| {
            warn!("Failed to read uname, OS fields will be empty: {}", e);
            UnameInfo::default()
        });
        let machine_name = system
            .hostname()
            .unwrap_or_else(|_| uname.nodename.clone());

        let template = StatusRecord {
            build_info,
            compiler_version: "rustc".to_string(),
            machine_name,
            os_arch: uname.machine,
            os_name: uname.sysname,
            os_numprocessors: num_cpus::get().to_string(),
            os_version: uname.release,
            up_since: started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            ..StatusRecord::default()
        };

        Self {
            template,
            started_at,
            started: Instant::now(),
            system,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn build_info(&self) -> &BuildInfo {
        &self.template.build_info
    }

    pub fn snapshot(&self) -> StatusRecord {
        let mut status = self.template.clone();
        let now = Utc::now();

        status.os_avgload = match self.system.load_average() {
            Ok(load) => format!("{:.2}", load),
            Err(e) => {
                debug!("Load average unavailable: {}", e);
                LOAD_AVERAGE_UNAVAILABLE.to_string()
            }
        };
        status.up_duration = format_duration(self.started.elapsed());
        status.current_time = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        status.num_threads = self
            .system
            .thread_count()
            .map(|n| n.to_string())
            .unwrap_or_default();
        status.runtime_flavor = match Handle::try_current().map(|h| h.runtime_flavor()) {
            Ok(RuntimeFlavor::CurrentThread) => "current_thread".to_string(),
            Ok(RuntimeFlavor::MultiThread) => "multi_thread".to_string(),
            Ok(_) => "other".to_string(),
            Err(_) => String::new(),
        };

        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FixedSystemInfo {
        load: Option<f64>,
    }

    impl SystemInfoProvider for FixedSystemInfo {
        fn uname(&self) -> io::Result<UnameInfo> {
            Ok(UnameInfo {
                sysname: "Linux".to_string(),
                nodename: "node-1".to_string(),
                release: "6.1.0".to_string(),
                version: "#1 SMP".to_string(),
                machine: "x86_64".to_string(),
            })
        }

        fn hostname(&self) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::Other, "no hostname"))
        }

        fn load_average(&self) -> io::Result<f64> {
            self.load
                .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "no loadavg"))
        }

        fn thread_count(&self) -> Option<usize> {
            Some(4)
        }
    }

    fn builder(load: Option<f64>) -> StatusSnapshotBuilder {
        let build_info = BuildInfo {
            version: "1.1".to_string(),
            built_by: "me".to_string(),
            ..BuildInfo::default()
        };
        StatusSnapshotBuilder::new(build_info, Arc::new(FixedSystemInfo { load }))
    }

    #[test]
    fn test_fixed_fields_captured_at_startup() {
        let status = builder(Some(0.5)).snapshot();
        assert_eq!(status.os_name, "Linux");
        assert_eq!(status.os_arch, "x86_64");
        assert_eq!(status.os_version, "6.1.0");
        assert_eq!(status.machine_name, "node-1");
        assert_eq!(status.num_threads, "4");
        assert_eq!(status.os_numprocessors, num_cpus::get().to_string());
    }

    #[test]
    fn test_load_average_formatting_and_fallback() {
        assert_eq!(builder(Some(1.2345)).snapshot().os_avgload, "1.23");
        assert_eq!(builder(None).snapshot().os_avgload, LOAD_AVERAGE_UNAVAILABLE);
    }

    #[test]
    fn test_partial_build_info_serializes_every_field() {
        let json = serde_json::to_value(builder(None).snapshot()).unwrap();
        assert_eq!(json["artifact_id"], "");
        assert_eq!(json["version"], "1.1");
        assert_eq!(json["built_by"], "me");
        assert!(json.get("build_info").is_none());
        assert!(json["up_duration"].is_string());
    }

    #[test]
    fn test_dynamic_fields_resampled() {
        let builder = builder(Some(0.1));
        let first = builder.snapshot();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = builder.snapshot();
        assert_eq!(first.up_since, second.up_since);
        assert_ne!(first.up_duration, second.up_duration);
    }

    #[tokio::test]
    async fn test_runtime_flavor_inside_runtime() {
        assert_eq!(builder(None).snapshot().runtime_flavor, "current_thread");
    }
}
