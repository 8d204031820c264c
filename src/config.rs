//! Application configuration
//!
//! Settings are read from a YAML file, then selected keys are overridden by
//! environment variables. The resulting `AppConfig` is validated once and not
//! modified afterwards.

use crate::error::{AutomationError, Result};
use crate::ui::{ControlKind, ElementQuery};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Environment variables overriding `snelstart.login` keys
pub const ENV_EMAIL: &str = "SNELSTART_EMAIL";
pub const ENV_PASSWORD: &str = "SNELSTART_PASSWORD";
pub const ENV_LOGIN_TIMEOUT: &str = "SNELSTART_LOGIN_TIMEOUT";
pub const ENV_RETRY_ATTEMPTS: &str = "SNELSTART_RETRY_ATTEMPTS";

/// Upper bound for every duration setting (one day)
pub const MAX_SECONDS: f64 = 86_400.0;

/// Root of the YAML configuration; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub snelstart: SnelstartConfig,
    pub automation: AutomationConfig,
    pub paths: PathsConfig,
}

/// `snelstart:` section
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SnelstartConfig {
    /// Path to the Snelstart executable
    pub app_path: PathBuf,
    /// Seconds to let the application start before looking for windows
    pub startup_wait: f64,
    pub login: LoginConfig,
    pub ui_paths: UiPathsConfig,
}

impl Default for SnelstartConfig {
    fn default() -> Self {
        Self {
            app_path: PathBuf::new(),
            startup_wait: 5.0,
            login: LoginConfig::default(),
            ui_paths: UiPathsConfig::default(),
        }
    }
}

/// `snelstart.login:` section
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    pub email: String,
    #[serde(deserialize_with = "deserialize_secret")]
    pub password: Option<SecretString>,
    /// Seconds to wait for the login window per attempt
    pub timeout: f64,
    pub retry_attempts: u32,
    /// Seconds to wait for the post-login signal
    pub verify_timeout: f64,
    /// Window title fragments, in priority order
    pub window_titles: Vec<String>,
    /// Title fragment identifying a dedicated login window
    pub login_window_marker: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: None,
            timeout: 30.0,
            retry_attempts: 3,
            verify_timeout: 10.0,
            window_titles: vec!["Inloggen".to_string(), "SnelStart".to_string()],
            login_window_marker: "Inloggen".to_string(),
        }
    }
}

/// `snelstart.ui_paths:` section, element queries per screen
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UiPathsConfig {
    pub login: LoginUiPaths,
}

/// Element queries used by the login sequence, each list tried in order
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoginUiPaths {
    pub login_container: Vec<ElementQuery>,
    pub email_field: Vec<ElementQuery>,
    pub continue_button: Vec<ElementQuery>,
    /// Inputs of a follow-up login step; any match means login is not done
    pub password_field: Vec<ElementQuery>,
    /// Element that only exists after a successful login
    pub success_indicator: Option<ElementQuery>,
}

impl Default for LoginUiPaths {
    fn default() -> Self {
        use ControlKind::{Button, Document, Edit, Pane, Window};

        Self {
            login_container: vec![
                ElementQuery::by_automation_id("WebAuthentication").with_control(Window),
                ElementQuery::by_name("Inloggen SnelStart 12").with_control(Window),
            ],
            email_field: vec![
                ElementQuery::by_automation_id("email_input").with_control(Edit),
                ElementQuery::by_name("Email").with_control(Edit),
                ElementQuery::by_name("Gebruiker").with_control(Edit),
                ElementQuery::by_name("User").with_control(Edit),
                ElementQuery::by_class("TextBox"),
                ElementQuery::by_class("Edit").with_control(Edit),
                ElementQuery::by_control(Edit),
                ElementQuery::by_control(Document),
                ElementQuery::by_control(Pane),
            ],
            continue_button: vec![
                ElementQuery::by_name("Doorgaan").with_control(Button),
                ElementQuery::by_name("Continue").with_control(Button),
                ElementQuery::by_name("Login").with_control(Button),
                ElementQuery::by_name("Inloggen").with_control(Button),
                ElementQuery::by_automation_id("continue_btn").with_control(Button),
                ElementQuery::by_automation_id("login_btn").with_control(Button),
                ElementQuery::by_text("doorgaan"),
                ElementQuery::by_text("continue"),
                ElementQuery::by_control(Button),
            ],
            password_field: vec![
                ElementQuery::by_automation_id("password_input"),
                ElementQuery::by_name("Wachtwoord").with_control(Edit),
                ElementQuery::by_name("Password").with_control(Edit),
                ElementQuery::by_class("PasswordBox"),
            ],
            success_indicator: None,
        }
    }
}

/// `automation:` section, pacing of the UI steps
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Seconds to pause between attempts and after placeholder stages
    pub delay: f64,
    /// Seconds between polls while waiting for UI elements
    pub poll_interval: f64,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            delay: 2.0,
            poll_interval: 0.5,
        }
    }
}

/// `paths:` section
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub invoices: PathBuf,
    pub logs: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            invoices: PathBuf::from("./invoices"),
            logs: PathBuf::from("./logs"),
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(SecretString::from))
}

impl AppConfig {
    /// Load the file, apply process environment overrides and validate
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides_from(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file without overrides or validation
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AutomationError::ConfigError(format!(
                "Configuration file not found at {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            AutomationError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_yaml_str(&content)
    }

    /// Parse YAML text; an empty document gives the defaults
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content).map_err(|e| {
            AutomationError::ConfigError(format!("Error parsing configuration file: {}", e))
        })
    }

    /// Override settings from an environment lookup.
    ///
    /// A variable that is set always wins over the file value.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let login = &mut self.snelstart.login;

        if let Some(email) = lookup(ENV_EMAIL) {
            login.email = email;
        }

        if let Some(password) = lookup(ENV_PASSWORD) {
            login.password = Some(password)
                .filter(|p| !p.is_empty())
                .map(SecretString::from);
        }

        if let Some(timeout) = lookup(ENV_LOGIN_TIMEOUT) {
            login.timeout = timeout.trim().parse().map_err(|_| {
                AutomationError::ConfigError(format!(
                    "{} must be a number of seconds, got '{}'",
                    ENV_LOGIN_TIMEOUT, timeout
                ))
            })?;
        }

        if let Some(attempts) = lookup(ENV_RETRY_ATTEMPTS) {
            login.retry_attempts = attempts.trim().parse().map_err(|_| {
                AutomationError::ConfigError(format!(
                    "{} must be a whole number, got '{}'",
                    ENV_RETRY_ATTEMPTS, attempts
                ))
            })?;
        }

        Ok(())
    }

    /// Reject settings the automation cannot run with
    pub fn validate(&self) -> Result<()> {
        let login = &self.snelstart.login;

        if login.retry_attempts == 0 {
            return Err(AutomationError::ConfigError(
                "snelstart.login.retry_attempts must be at least 1".to_string(),
            ));
        }

        check_seconds("snelstart.startup_wait", self.snelstart.startup_wait)?;
        check_seconds("snelstart.login.timeout", login.timeout)?;
        check_seconds("snelstart.login.verify_timeout", login.verify_timeout)?;
        check_seconds("automation.delay", self.automation.delay)?;
        check_seconds("automation.poll_interval", self.automation.poll_interval)?;

        if login.timeout == 0.0 {
            return Err(AutomationError::ConfigError(
                "snelstart.login.timeout must be greater than zero".to_string(),
            ));
        }
        if self.automation.poll_interval == 0.0 {
            return Err(AutomationError::ConfigError(
                "automation.poll_interval must be greater than zero".to_string(),
            ));
        }

        if login.window_titles.iter().all(|t| t.trim().is_empty()) {
            return Err(AutomationError::ConfigError(
                "snelstart.login.window_titles must name at least one title".to_string(),
            ));
        }

        let paths = &self.snelstart.ui_paths.login;
        let queries = paths
            .login_container
            .iter()
            .chain(&paths.email_field)
            .chain(&paths.continue_button)
            .chain(&paths.password_field)
            .chain(paths.success_indicator.iter());
        for query in queries {
            if query.is_empty() {
                return Err(AutomationError::ConfigError(
                    "element queries under snelstart.ui_paths need at least one criterion"
                        .to_string(),
                ));
            }
        }

        if paths.email_field.is_empty() {
            return Err(AutomationError::ConfigError(
                "snelstart.ui_paths.login.email_field must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Pause after spawning the application
    pub fn startup_wait(&self) -> Duration {
        seconds(self.snelstart.startup_wait)
    }

    /// Pause between login attempts and after placeholder stages
    pub fn delay(&self) -> Duration {
        seconds(self.automation.delay)
    }
}

/// Convert a seconds setting, saturating values `validate` would reject
pub(crate) fn seconds(value: f64) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}

fn check_seconds(key: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AutomationError::ConfigError(format!(
            "{} must be a non-negative number of seconds, got {}",
            key, value
        )));
    }
    if value > MAX_SECONDS || Duration::try_from_secs_f64(value).is_err() {
        return Err(AutomationError::ConfigError(format!(
            "{} must be at most {} seconds, got {}",
            key, MAX_SECONDS, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.snelstart.login.timeout, 30.0);
        assert_eq!(config.snelstart.login.retry_attempts, 3);
        assert_eq!(config.automation.delay, 2.0);
        assert_eq!(config.paths.invoices, PathBuf::from("./invoices"));
        assert_eq!(config.paths.logs, PathBuf::from("./logs"));
        assert!(config.snelstart.login.password.is_none());
    }

    #[test]
    fn test_parse_nested_yaml() {
        let yaml = r#"
snelstart:
  app_path: 'C:\Program Files\SnelStart\SnelStart.exe'
  login:
    email: boekhouding@example.nl
    password: geheim
    timeout: 12.5
    retry_attempts: 5
  ui_paths:
    login:
      email_field:
        - automation_id: mail
          control_type: EditControl
automation:
  delay: 0.5
paths:
  invoices: /data/invoices
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        let login = &config.snelstart.login;
        assert_eq!(login.email, "boekhouding@example.nl");
        assert_eq!(login.password.as_ref().unwrap().expose_secret(), "geheim");
        assert_eq!(login.timeout, 12.5);
        assert_eq!(login.retry_attempts, 5);
        assert_eq!(config.automation.delay, 0.5);
        assert_eq!(config.paths.invoices, PathBuf::from("/data/invoices"));
        // Keys left out keep their defaults
        assert_eq!(config.paths.logs, PathBuf::from("./logs"));

        let email = &config.snelstart.ui_paths.login.email_field;
        assert_eq!(email.len(), 1);
        assert_eq!(email[0].automation_id.as_deref(), Some("mail"));
        assert_eq!(email[0].control_type, Some(ControlKind::Edit));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = AppConfig::from_yaml_str("  \n").unwrap();
        assert_eq!(config.snelstart.login.retry_attempts, 3);
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let err = AppConfig::from_yaml_str("snelstart: [unclosed").unwrap_err();
        assert!(err.is_config_error());

        let err = AppConfig::from_yaml_str("snelstart:\n  login:\n    retry_attempts: many\n")
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::from_file(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_from_file_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "automation:\n  delay: 1.5\n").unwrap();
        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.automation.delay, 1.5);
    }

    #[test]
    fn test_env_overrides_take_precedence() {
        let yaml = "snelstart:\n  login:\n    email: file@example.nl\n    timeout: 30\n    retry_attempts: 3\n";
        let mut config = AppConfig::from_yaml_str(yaml).unwrap();
        config
            .apply_overrides_from(env(&[
                (ENV_EMAIL, "env@example.nl"),
                (ENV_PASSWORD, "s3cret"),
                (ENV_LOGIN_TIMEOUT, "7.5"),
                (ENV_RETRY_ATTEMPTS, "4"),
            ]))
            .unwrap();

        let login = &config.snelstart.login;
        assert_eq!(login.email, "env@example.nl");
        assert_eq!(login.password.as_ref().unwrap().expose_secret(), "s3cret");
        assert_eq!(login.timeout, 7.5);
        assert_eq!(login.retry_attempts, 4);
    }

    #[test]
    fn test_set_but_empty_env_value_still_wins() {
        let mut config =
            AppConfig::from_yaml_str("snelstart:\n  login:\n    email: file@example.nl\n").unwrap();
        config.apply_overrides_from(env(&[(ENV_EMAIL, "")])).unwrap();
        assert_eq!(config.snelstart.login.email, "");
    }

    #[test]
    fn test_unset_env_keeps_file_values() {
        let mut config =
            AppConfig::from_yaml_str("snelstart:\n  login:\n    email: file@example.nl\n").unwrap();
        config.apply_overrides_from(env(&[])).unwrap();
        assert_eq!(config.snelstart.login.email, "file@example.nl");
    }

    #[test]
    fn test_unparsable_env_numbers_are_config_errors() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides_from(env(&[(ENV_RETRY_ATTEMPTS, "three")]))
            .unwrap_err();
        assert!(err.is_config_error());

        let err = config
            .apply_overrides_from(env(&[(ENV_LOGIN_TIMEOUT, "soon")]))
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.snelstart.login.retry_attempts = 0;
        assert!(config.validate().unwrap_err().is_config_error());

        let mut config = AppConfig::default();
        config.snelstart.login.timeout = -1.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.automation.poll_interval = 0.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.automation.delay = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config
            .snelstart
            .ui_paths
            .login
            .continue_button
            .push(ElementQuery::default());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unrepresentable_durations() {
        let mut config = AppConfig::default();
        config
            .apply_overrides_from(env(&[(ENV_LOGIN_TIMEOUT, "1e20")]))
            .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("snelstart.login.timeout"));

        for value in [1e20, MAX_SECONDS + 1.0] {
            let mut config = AppConfig::default();
            config.snelstart.startup_wait = value;
            assert!(config.validate().is_err());

            let mut config = AppConfig::default();
            config.snelstart.login.verify_timeout = value;
            assert!(config.validate().is_err());

            let mut config = AppConfig::default();
            config.automation.delay = value;
            assert!(config.validate().is_err());
        }

        let mut config = AppConfig::default();
        config.snelstart.login.timeout = MAX_SECONDS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_seconds_saturates_instead_of_panicking() {
        assert_eq!(seconds(1.5), Duration::from_millis(1500));
        assert_eq!(seconds(-3.0), Duration::ZERO);
        assert_eq!(seconds(f64::NAN), Duration::ZERO);
        assert_eq!(seconds(1e20), Duration::MAX);
        assert_eq!(seconds(f64::INFINITY), Duration::MAX);
    }

    #[test]
    fn test_empty_password_is_treated_as_unset() {
        let yaml = "snelstart:\n  login:\n    password: geheim\n";
        let mut config = AppConfig::from_yaml_str(yaml).unwrap();
        config.apply_overrides_from(env(&[(ENV_PASSWORD, "")])).unwrap();
        assert!(config.snelstart.login.password.is_none());

        let config = AppConfig::from_yaml_str("snelstart:\n  login:\n    password: ''\n").unwrap();
        assert!(config.snelstart.login.password.is_none());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let config = AppConfig::from_yaml_str(include_str!("../config/config.yaml")).unwrap();
        config.validate().unwrap();
        assert!(config.snelstart.login.password.is_none());
        let paths = &config.snelstart.ui_paths.login;
        assert_eq!(paths.continue_button.len(), 4);
        assert_eq!(paths.password_field.len(), 3);
        assert!(paths.success_indicator.is_some());
    }
}
