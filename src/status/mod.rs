// src/status/mod.rs
mod build_info;
mod snapshot;
mod system;

pub use build_info::BuildInfo;
pub use snapshot::{StatusRecord, StatusSnapshotBuilder, LOAD_AVERAGE_UNAVAILABLE};
pub use system::{default_provider, PortableSystemInfo, SystemInfoProvider, UnameInfo};

#[cfg(unix)]
pub use system::UnixSystemInfo;
