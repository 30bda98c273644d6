// src/status/system.rs
//
// OS metadata used by the status snapshot. The implementation is picked by
// build target; everything behind the trait is best effort.
use std::io;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnameInfo {
    pub sysname: String,
    pub nodename: String,
    pub release: String,
    pub version: String,
    pub machine: String,
}

pub trait SystemInfoProvider: Send + Sync {
    fn uname(&self) -> io::Result<UnameInfo>;

    fn hostname(&self) -> io::Result<String>;

    /// One minute load average.
    fn load_average(&self) -> io::Result<f64>;

    /// OS threads in this process, when the platform exposes it.
    fn thread_count(&self) -> Option<usize>;
}

pub fn default_provider() -> Arc<dyn SystemInfoProvider> {
    #[cfg(unix)]
    {
        Arc::new(UnixSystemInfo)
    }
    #[cfg(not(unix))]
    {
        Arc::new(PortableSystemInfo)
    }
}

#[cfg(unix)]
fn c_chars_to_string(raw: &[libc::c_char]) -> String {
    let bytes: Vec<u8> = raw
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).trim().to_string()
}

#[cfg(unix)]
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixSystemInfo;

#[cfg(unix)]
impl SystemInfoProvider for UnixSystemInfo {
    fn uname(&self) -> io::Result<UnameInfo> {
        // SAFETY: utsname is plain old data and uname only writes into it.
        let mut buf: libc::utsname = unsafe { std::mem::zeroed() };
        if unsafe { libc::uname(&mut buf) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(UnameInfo {
            sysname: c_chars_to_string(&buf.sysname),
            nodename: c_chars_to_string(&buf.nodename),
            release: c_chars_to_string(&buf.release),
            version: c_chars_to_string(&buf.version),
            machine: c_chars_to_string(&buf.machine),
        })
    }

    fn hostname(&self) -> io::Result<String> {
        let mut buf = [0 as libc::c_char; 256];
        // SAFETY: the length passed matches the buffer.
        if unsafe { libc::gethostname(buf.as_mut_ptr(), buf.len()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(c_chars_to_string(&buf))
    }

    #[cfg(target_os = "linux")]
    fn load_average(&self) -> io::Result<f64> {
        let content = std::fs::read_to_string("/proc/loadavg")?;
        parse_loadavg(&content)
    }

    #[cfg(not(target_os = "linux"))]
    fn load_average(&self) -> io::Result<f64> {
        let mut loads = [0f64; 3];
        // SAFETY: at most `nelem` entries are written.
        let filled = unsafe { libc::getloadavg(loads.as_mut_ptr(), 3) };
        if filled < 1 {
            return Err(io::Error::new(io::ErrorKind::Other, "getloadavg failed"));
        }
        Ok(loads[0])
    }

    #[cfg(target_os = "linux")]
    fn thread_count(&self) -> Option<usize> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        parse_thread_count(&status)
    }

    #[cfg(not(target_os = "linux"))]
    fn thread_count(&self) -> Option<usize> {
        None
    }
}

/// Fallback for targets without uname; uses what std knows about the build.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortableSystemInfo;

impl SystemInfoProvider for PortableSystemInfo {
    fn uname(&self) -> io::Result<UnameInfo> {
        Ok(UnameInfo {
            sysname: std::env::consts::OS.to_string(),
            nodename: self.hostname().unwrap_or_default(),
            release: String::new(),
            version: String::new(),
            machine: std::env::consts::ARCH.to_string(),
        })
    }

    fn hostname(&self) -> io::Result<String> {
        std::env::var("COMPUTERNAME")
            .or_else(|_| std::env::var("HOSTNAME"))
            .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))
    }

    fn load_average(&self) -> io::Result<f64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "load average is not available on this platform",
        ))
    }

    fn thread_count(&self) -> Option<usize> {
        None
    }
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_loadavg(content: &str) -> io::Result<f64> {
    content
        .split_whitespace()
        .next()
        .and_then(|first| first.parse().ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "malformed /proc/loadavg"))
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_thread_count(status: &str) -> Option<usize> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("Threads:"))
        .and_then(|value| value.trim().parse().ok())
}
