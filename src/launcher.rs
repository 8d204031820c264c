//! Starting the Snelstart application
//!
//! `AppLauncher` validates the executable path and hands it to an injected
//! [`Spawner`]. It returns as soon as the process exists; waiting for the
//! application to become usable is the caller's job.

use crate::environment::LaunchStrategy;
use crate::error::{AutomationError, Result};
use std::path::Path;
use std::process::Command;
use tracing::{error, info};

/// Handle to a started application process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchHandle {
    pub pid: u32,
    pub strategy: String,
}

/// Something that can start an executable
pub trait Spawner {
    fn describe(&self) -> String;
    fn spawn(&self, executable: &Path) -> Result<LaunchHandle>;
}

impl LaunchStrategy {
    /// Command that starts `executable` under this strategy
    pub fn command(&self, executable: &Path) -> Command {
        match self {
            LaunchStrategy::Native => Command::new(executable),
            LaunchStrategy::WslInterop => {
                let mut cmd = Command::new("cmd.exe");
                cmd.args(["/c", "start", "\"\""]).arg(to_windows_path(executable));
                cmd
            }
        }
    }
}

impl Spawner for LaunchStrategy {
    fn describe(&self) -> String {
        self.to_string()
    }

    fn spawn(&self, executable: &Path) -> Result<LaunchHandle> {
        match self {
            LaunchStrategy::WslInterop => {
                info!("Detected WSL environment - using cmd.exe to launch")
            }
            LaunchStrategy::Native => info!("Launching executable directly"),
        }

        let child = self
            .command(executable)
            .spawn()
            .map_err(|e| AutomationError::LaunchFailed(e.to_string()))?;

        Ok(LaunchHandle {
            pid: child.id(),
            strategy: self.describe(),
        })
    }
}

/// Translate a WSL mount path (`/mnt/c/...`) into a Windows path (`C:\...`).
/// Other paths are returned unchanged.
pub fn to_windows_path(path: &Path) -> String {
    let text = path.to_string_lossy();

    if let Some(rest) = text.strip_prefix("/mnt/") {
        let mut parts = rest.splitn(2, '/');
        let drive = parts.next().unwrap_or_default();
        if drive.len() == 1 && drive.chars().all(|c| c.is_ascii_alphabetic()) {
            let tail = parts.next().unwrap_or_default().replace('/', "\\");
            return format!("{}:\\{}", drive.to_ascii_uppercase(), tail);
        }
    }

    text.into_owned()
}

/// Validates the executable path, then hands it to a [`Spawner`]
pub struct AppLauncher {
    spawner: Box<dyn Spawner>,
}

impl AppLauncher {
    /// Launcher using `spawner`, usually the detected `LaunchStrategy`
    pub fn new(spawner: Box<dyn Spawner>) -> Self {
        Self { spawner }
    }

    /// Validate `path` and start it. Nothing is spawned when validation fails.
    pub fn launch(&self, path: &Path) -> Result<LaunchHandle> {
        validate_executable(path)?;

        info!(
            "Launching Snelstart from: {} ({})",
            path.display(),
            self.spawner.describe()
        );

        let handle = self.spawner.spawn(path).map_err(|e| {
            error!("Failed to launch Snelstart: {}", e);
            e
        })?;

        info!("Snelstart launched (pid {})", handle.pid);
        Ok(handle)
    }
}

fn validate_executable(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        error!("Snelstart application path not configured");
        return Err(AutomationError::ConfigError(
            "snelstart.app_path is not configured".to_string(),
        ));
    }

    let metadata = match std::fs::metadata(path) {
        Ok(m) if m.is_file() => m,
        _ => {
            error!("Snelstart executable not found at: {}", path.display());
            return Err(AutomationError::PathNotFound(path.to_path_buf()));
        }
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            error!("Snelstart executable is not executable: {}", path.display());
            return Err(AutomationError::NotExecutable(path.to_path_buf()));
        }
    }
    #[cfg(not(unix))]
    let _ = metadata;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    struct RecordingSpawner {
        calls: Rc<RefCell<Vec<PathBuf>>>,
    }

    impl Spawner for RecordingSpawner {
        fn describe(&self) -> String {
            "recording".to_string()
        }

        fn spawn(&self, executable: &Path) -> Result<LaunchHandle> {
            self.calls.borrow_mut().push(executable.to_path_buf());
            Ok(LaunchHandle {
                pid: 4242,
                strategy: self.describe(),
            })
        }
    }

    fn recording_launcher() -> (AppLauncher, Rc<RefCell<Vec<PathBuf>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let launcher = AppLauncher::new(Box::new(RecordingSpawner {
            calls: Rc::clone(&calls),
        }));
        (launcher, calls)
    }

    fn executable_in(dir: &Path) -> PathBuf {
        let path = dir.join("SnelStart.exe");
        std::fs::write(&path, b"MZ").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        path
    }

    #[test]
    fn test_missing_path_spawns_nothing() {
        let (launcher, calls) = recording_launcher();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("SnelStart.exe");

        let err = launcher.launch(&missing).unwrap_err();
        assert!(matches!(err, AutomationError::PathNotFound(ref p) if *p == missing));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_directory_is_not_an_executable() {
        let (launcher, calls) = recording_launcher();
        let dir = tempfile::tempdir().unwrap();

        let err = launcher.launch(dir.path()).unwrap_err();
        assert!(matches!(err, AutomationError::PathNotFound(_)));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_empty_path_is_config_error() {
        let (launcher, calls) = recording_launcher();
        let err = launcher.launch(Path::new("")).unwrap_err();
        assert!(err.is_config_error());
        assert!(calls.borrow().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_without_execute_bit_is_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let (launcher, calls) = recording_launcher();
        let dir = tempfile::tempdir().unwrap();
        let path = executable_in(dir.path());
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let err = launcher.launch(&path).unwrap_err();
        assert!(matches!(err, AutomationError::NotExecutable(_)));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_valid_path_is_spawned_once() {
        let (launcher, calls) = recording_launcher();
        let dir = tempfile::tempdir().unwrap();
        let path = executable_in(dir.path());

        let handle = launcher.launch(&path).unwrap();
        assert_eq!(handle.pid, 4242);
        assert_eq!(*calls.borrow(), vec![path]);
    }

    #[test]
    fn test_wsl_command_goes_through_cmd_exe() {
        let cmd = LaunchStrategy::WslInterop
            .command(Path::new("/mnt/c/Program Files/SnelStart/SnelStart.exe"));
        assert_eq!(cmd.get_program(), "cmd.exe");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["/c", "start", "\"\"", "C:\\Program Files\\SnelStart\\SnelStart.exe"]
        );
    }

    #[test]
    fn test_native_command_runs_executable_directly() {
        let cmd = LaunchStrategy::Native.command(Path::new("/opt/snelstart/SnelStart.exe"));
        assert_eq!(cmd.get_program(), "/opt/snelstart/SnelStart.exe");
        assert_eq!(cmd.get_args().count(), 0);
    }

    #[test]
    fn test_windows_path_translation() {
        assert_eq!(
            to_windows_path(Path::new("/mnt/d/Apps/SnelStart.exe")),
            "D:\\Apps\\SnelStart.exe"
        );
        assert_eq!(
            to_windows_path(Path::new("C:\\SnelStart\\SnelStart.exe")),
            "C:\\SnelStart\\SnelStart.exe"
        );
        assert_eq!(to_windows_path(Path::new("/mnt/data/x.exe")), "/mnt/data/x.exe");
    }
}
