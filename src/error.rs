//! Error Types for Snelstart Automation
//!
//! One error enum shared by every stage of the workflow.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, AutomationError>;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AutomationError {
    // ===== Launch Errors =====
    /// The configured executable does not exist or is not a file
    #[error("Executable not found: {}", .0.display())]
    PathNotFound(PathBuf),

    /// The configured executable exists but cannot be executed
    #[error("File is not executable: {}", .0.display())]
    NotExecutable(PathBuf),

    /// Spawning the process failed
    #[error("Failed to launch application: {0}")]
    LaunchFailed(String),

    // ===== UI Automation Errors =====
    /// No login window appeared within the timeout
    #[error("Login window not found within {timeout_secs:.1}s")]
    WindowNotFound { timeout_secs: f64 },

    /// A required element could not be located
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Login was submitted but the success signal never showed up
    #[error("Login could not be verified: {0}")]
    LoginNotVerified(String),

    /// Every login attempt failed
    #[error("Login failed after {attempts} attempt(s): {last}")]
    LoginFailed {
        attempts: u32,
        last: Box<AutomationError>,
    },

    /// UI Automation initialization failed
    #[error("UI Automation initialization failed: {0}")]
    UiAutomationInitFailed(String),

    /// UI Automation is not available on this platform
    #[error("UI Automation is only supported on Windows")]
    UiAutomationUnavailable,

    /// A UI Automation call failed on an element
    #[error("UI Automation error: {0}")]
    UiAutomationError(String),

    // ===== Input Injection Errors =====
    /// Failed to inject keystrokes
    #[error("Failed to inject keystrokes: {0}")]
    InputInjectionFailed(String),

    // ===== Configuration Errors =====
    /// Malformed or missing settings
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ===== Invoice Errors =====
    /// Invoice directory does not exist
    #[error("Invoices directory not found: {}", .0.display())]
    InvoiceDirNotFound(PathBuf),

    /// Invoice directory contains no files
    #[error("No invoice files found in {}", .0.display())]
    NoInvoices(PathBuf),

    /// Invoice file disappeared before upload
    #[error("Invoice file not found: {}", .0.display())]
    InvoiceNotFound(PathBuf),

    // ===== I/O Errors =====
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AutomationError {
    /// Check if a login attempt that failed with this error may be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AutomationError::WindowNotFound { .. }
                | AutomationError::ElementNotFound(_)
                | AutomationError::LoginNotVerified(_)
                | AutomationError::UiAutomationError(_)
                | AutomationError::UiAutomationUnavailable
                | AutomationError::InputInjectionFailed(_)
        )
    }

    /// Check if this error comes from bad settings rather than the UI
    pub fn is_config_error(&self) -> bool {
        matches!(self, AutomationError::ConfigError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AutomationError::WindowNotFound { timeout_secs: 1.0 }.is_retryable());
        assert!(AutomationError::ElementNotFound("email field".into()).is_retryable());
        assert!(!AutomationError::ConfigError("bad".into()).is_retryable());
        assert!(!AutomationError::PathNotFound(PathBuf::from("x.exe")).is_retryable());
    }

    #[test]
    fn test_login_failed_message_includes_last_error() {
        let err = AutomationError::LoginFailed {
            attempts: 3,
            last: Box::new(AutomationError::WindowNotFound { timeout_secs: 30.0 }),
        };
        assert_eq!(
            err.to_string(),
            "Login failed after 3 attempt(s): Login window not found within 30.0s"
        );
    }
}
