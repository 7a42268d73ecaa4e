//! Host operating system detection.

use once_cell::sync::Lazy;
use sysinfo::System;

/// Operating system types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OS {
    Windows,
    Macos,
    Linux,
    Unknown,
}

impl OS {
    /// Classify a sysinfo system name.
    pub fn from_system_name(name: &str) -> Self {
        match name {
            "Windows" => OS::Windows,
            "macOS" | "Darwin" => OS::Macos,
            name if name.starts_with("Linux") => OS::Linux,
            // sysinfo reports the distribution name on most Linux hosts
            _ if cfg!(target_os = "linux") => OS::Linux,
            _ => OS::Unknown,
        }
    }
}

static HOST_OS: Lazy<OS> = Lazy::new(|| {
    let os = match System::name().as_deref() {
        Some(name) => OS::from_system_name(name),
        None if cfg!(target_os = "windows") => OS::Windows,
        None => OS::Unknown,
    };
    tracing::debug!(?os, "detected host operating system");
    os
});

/// Detect current operating system.
pub fn detect() -> OS {
    *HOST_OS
}

/// Whether the process runs on the Windows side of a host/guest pair.
pub fn is_windows_host() -> bool {
    detect() == OS::Windows
}
