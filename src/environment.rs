//! Runtime environment detection
//!
//! Decides how Windows executables must be started: directly, or through
//! `cmd.exe` when running inside WSL.

use std::fmt;
use tracing::debug;

/// How the application process is spawned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStrategy {
    /// Spawn the executable directly
    Native,
    /// Route through `cmd.exe /c start` from a WSL distribution
    WslInterop,
}

impl fmt::Display for LaunchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchStrategy::Native => f.write_str("native"),
            LaunchStrategy::WslInterop => f.write_str("WSL interop"),
        }
    }
}

/// Whether a kernel release string belongs to a WSL kernel
pub fn is_compat_layer(kernel_release: &str) -> bool {
    kernel_release.to_lowercase().contains("microsoft")
}

/// Kernel release of the running system, when the platform exposes one
pub fn kernel_release() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/sys/kernel/osrelease")
            .ok()
            .map(|s| s.trim().to_string())
    }

    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Pick the launch strategy for a kernel release; unknown means native
pub fn strategy_for(kernel_release: Option<&str>) -> LaunchStrategy {
    match kernel_release {
        Some(release) if is_compat_layer(release) => LaunchStrategy::WslInterop,
        _ => LaunchStrategy::Native,
    }
}

/// Detect the launch strategy for the current process
pub fn detect() -> LaunchStrategy {
    let release = kernel_release();
    debug!("Kernel release: {:?}", release);
    strategy_for(release.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wsl_kernels_are_detected() {
        assert!(is_compat_layer("5.15.153.1-microsoft-standard-WSL2"));
        assert!(is_compat_layer("4.4.0-19041-Microsoft"));
        assert!(!is_compat_layer("6.8.0-45-generic"));
        assert!(!is_compat_layer(""));
    }

    #[test]
    fn test_strategy_defaults_to_native() {
        assert_eq!(strategy_for(None), LaunchStrategy::Native);
        assert_eq!(strategy_for(Some("6.8.0-45-generic")), LaunchStrategy::Native);
        assert_eq!(
            strategy_for(Some("5.15.153.1-microsoft-standard-WSL2")),
            LaunchStrategy::WslInterop
        );
    }
}
