//! Login sequence
//!
//! Each attempt walks `AwaitingWindow → FieldFound → CredentialsEntered →
//! Submitted → Verified`. A failure anywhere restarts the attempt from
//! `AwaitingWindow` after `automation.delay`, up to
//! `snelstart.login.retry_attempts` attempts in total. When those are used up
//! the session ends in `Failed` and `LoginFailed` is returned.
//!
//! Login counts as verified when one of these holds within `verify_timeout`:
//! - a configured `success_indicator` element appears in the window
//! - otherwise, no window matches `window_titles` any more, or the matching
//!   window is not a dedicated login window and shows no login form: no login
//!   container, no password input and no usable email field

use crate::clock::Clock;
use crate::config::{seconds, AppConfig};
use crate::error::{AutomationError, Result};
use crate::ui::{find_first_match, Desktop};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Attempts made for a single click or keystroke sequence
const INTERACTION_ATTEMPTS: u32 = 3;

/// Pause between interaction attempts
const INTERACTION_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Where a login attempt currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    AwaitingWindow,
    FieldFound,
    CredentialsEntered,
    Submitted,
    Verified,
    Failed,
}

/// In-memory state of one login run
#[derive(Debug)]
pub struct LoginSession {
    pub state: LoginState,
    /// Attempts started so far
    pub attempts: u32,
    pub last_error: Option<AutomationError>,
    /// Title of the window the last attempt worked in
    pub window_title: Option<String>,
    /// Every state entered, in order
    pub transitions: Vec<LoginState>,
}

impl LoginSession {
    fn new() -> Self {
        Self {
            state: LoginState::AwaitingWindow,
            attempts: 0,
            last_error: None,
            window_title: None,
            transitions: Vec::new(),
        }
    }

    fn enter(&mut self, state: LoginState) {
        debug!("Login state: {:?} -> {:?}", self.state, state);
        self.state = state;
        self.transitions.push(state);
    }
}

/// Drives the login form of the Snelstart window found on `desktop`
pub struct LoginSequencer<'a, D: Desktop, C: Clock> {
    desktop: &'a D,
    clock: C,
    config: &'a AppConfig,
}

impl<'a, D: Desktop, C: Clock> LoginSequencer<'a, D, C> {
    /// Create a sequencer; nothing touches the desktop until [`run`](Self::run)
    pub fn new(desktop: &'a D, clock: C, config: &'a AppConfig) -> Self {
        Self {
            desktop,
            clock,
            config,
        }
    }

    fn timeout(&self) -> Duration {
        seconds(self.config.snelstart.login.timeout)
    }

    fn verify_timeout(&self) -> Duration {
        seconds(self.config.snelstart.login.verify_timeout)
    }

    fn poll_interval(&self) -> Duration {
        seconds(self.config.automation.poll_interval)
    }

    fn deadline(&self, timeout: Duration) -> Result<Instant> {
        self.clock.now().checked_add(timeout).ok_or_else(|| {
            AutomationError::ConfigError(format!(
                "timeout of {:.1}s is too large",
                timeout.as_secs_f64()
            ))
        })
    }

    /// Run the login sequence until it is verified or the attempts run out
    pub fn run(&self) -> Result<LoginSession> {
        let login = &self.config.snelstart.login;
        let max_attempts = login.retry_attempts;

        if login.email.trim().is_empty() {
            error!("Email not configured in snelstart.login.email or SNELSTART_EMAIL");
            return Err(AutomationError::ConfigError(
                "login email is not configured".to_string(),
            ));
        }
        if login.password.is_some() {
            debug!("Password is configured but password entry is not performed");
        }

        info!("Starting login process");
        let mut session = LoginSession::new();

        for attempt in 1..=max_attempts {
            session.attempts = attempt;
            info!("Login attempt {}/{}", attempt, max_attempts);

            match self.attempt(&mut session) {
                Ok(()) => {
                    session.enter(LoginState::Verified);
                    info!("Login completed successfully");
                    return Ok(session);
                }
                Err(e) if e.is_retryable() => {
                    warn!("Login attempt {} failed: {}", attempt, e);
                    session.last_error = Some(e);
                }
                Err(e) => {
                    error!("Login aborted: {}", e);
                    session.enter(LoginState::Failed);
                    return Err(e);
                }
            }

            if attempt < max_attempts {
                info!("Retrying login...");
                self.clock.sleep(self.config.delay());
            }
        }

        session.enter(LoginState::Failed);
        error!("All {} login attempts failed", max_attempts);

        let last = session
            .last_error
            .take()
            .unwrap_or_else(|| AutomationError::LoginNotVerified("no attempt was made".into()));
        Err(AutomationError::LoginFailed {
            attempts: max_attempts,
            last: Box::new(last),
        })
    }

    fn attempt(&self, session: &mut LoginSession) -> Result<()> {
        let paths = &self.config.snelstart.ui_paths.login;

        session.enter(LoginState::AwaitingWindow);
        let window = self.await_window()?;
        let title = self.desktop.describe(&window)?.name;
        info!("Using window for login: {}", title);
        session.window_title = Some(title.clone());

        let form = self.login_container(&window, &title)?;

        let email_field = find_first_match(self.desktop, &form, &paths.email_field)?
            .ok_or_else(|| AutomationError::ElementNotFound("email field".to_string()))?;
        session.enter(LoginState::FieldFound);

        info!("Entering email credentials...");
        let email = self.config.snelstart.login.email.as_str();
        self.interact(&email_field, "enter email", || {
            self.desktop.enter_text(&email_field, email, true)
        })?;
        session.enter(LoginState::CredentialsEntered);

        match find_first_match(self.desktop, &form, &paths.continue_button)? {
            Some(button) => {
                self.interact(&button, "click continue", || self.desktop.click(&button))?;
                info!("Continue button clicked successfully");
            }
            None => {
                warn!("Continue button not found, trying Enter key");
                self.interact(&email_field, "press Enter", || {
                    self.desktop.press_enter(&email_field)
                })?;
            }
        }
        session.enter(LoginState::Submitted);

        self.verify(&email_field)
    }

    /// Poll for a login window until one appears or `timeout` has elapsed
    fn await_window(&self) -> Result<D::Element> {
        let titles = &self.config.snelstart.login.window_titles;
        let timeout = self.timeout();
        let deadline = self.deadline(timeout)?;

        loop {
            if let Some(window) = self.desktop.find_window(titles)? {
                return Ok(window);
            }

            let now = self.clock.now();
            if now >= deadline {
                error!("Snelstart login window not found");
                return Err(AutomationError::WindowNotFound {
                    timeout_secs: timeout.as_secs_f64(),
                });
            }
            self.clock.sleep(self.poll_interval().min(deadline - now));
        }
    }

    /// The element holding the login form: the window itself when it is a
    /// dedicated login window, else an embedded container when one exists
    fn login_container(&self, window: &D::Element, title: &str) -> Result<D::Element> {
        let marker = &self.config.snelstart.login.login_window_marker;
        if !marker.is_empty() && title.contains(marker.as_str()) {
            debug!("Using login window directly: {}", title);
            return Ok(window.clone());
        }

        info!("Looking for embedded login container...");
        let paths = &self.config.snelstart.ui_paths.login;
        match find_first_match(self.desktop, window, &paths.login_container)? {
            Some(container) => {
                info!("Found login container, searching within it");
                Ok(container)
            }
            None => {
                info!("No login container found, searching in main window");
                Ok(window.clone())
            }
        }
    }

    /// Run `action` once `element` is ready, retrying a few times
    fn interact<F>(&self, element: &D::Element, what: &str, action: F) -> Result<()>
    where
        F: Fn() -> Result<()>,
    {
        let mut last_error = None;

        for attempt in 1..=INTERACTION_ATTEMPTS {
            if !self.desktop.is_ready(element) {
                warn!("Element validation failed on attempt {} ({})", attempt, what);
                last_error = Some(AutomationError::ElementNotFound(format!(
                    "element for '{}' is not ready",
                    what
                )));
            } else {
                match action() {
                    Ok(()) => return Ok(()),
                    Err(e) => {
                        warn!("{} attempt {} failed: {}", what, attempt, e);
                        last_error = Some(e);
                    }
                }
            }

            if attempt < INTERACTION_ATTEMPTS {
                self.clock.sleep(INTERACTION_RETRY_DELAY);
            }
        }

        error!("All {} attempts failed", what);
        Err(last_error.unwrap_or_else(|| AutomationError::ElementNotFound(what.to_string())))
    }

    fn verify(&self, email_field: &D::Element) -> Result<()> {
        info!("Verifying login success...");
        let deadline = self.deadline(self.verify_timeout())?;

        loop {
            if self.login_succeeded(email_field)? {
                return Ok(());
            }

            let now = self.clock.now();
            if now >= deadline {
                let reason = match self.config.snelstart.ui_paths.login.success_indicator {
                    Some(ref q) => format!("success indicator {} did not appear", q),
                    None => "login form is still present".to_string(),
                };
                return Err(AutomationError::LoginNotVerified(reason));
            }
            self.clock.sleep(self.poll_interval().min(deadline - now));
        }
    }

    fn login_succeeded(&self, email_field: &D::Element) -> Result<bool> {
        let login = &self.config.snelstart.login;
        let Some(window) = self.desktop.find_window(&login.window_titles)? else {
            return Ok(match self.config.snelstart.ui_paths.login.success_indicator {
                Some(_) => false,
                None => {
                    debug!("Login window closed");
                    true
                }
            });
        };

        if let Some(ref indicator) = self.config.snelstart.ui_paths.login.success_indicator {
            return Ok(self.desktop.find_element(&window, indicator)?.is_some());
        }

        let title = self.desktop.describe(&window)?.name;
        let marker = &login.login_window_marker;
        if !marker.is_empty() && title.contains(marker.as_str()) {
            debug!("Login window still open: {}", title);
            return Ok(false);
        }
        Ok(!self.login_form_present(&window, email_field)?)
    }

    /// Whether `window` still shows any part of a login form
    fn login_form_present(&self, window: &D::Element, email_field: &D::Element) -> Result<bool> {
        let paths = &self.config.snelstart.ui_paths.login;
        if self.desktop.is_ready(email_field) {
            debug!("Email field is still usable");
            return Ok(true);
        }
        if find_first_match(self.desktop, window, &paths.login_container)?.is_some() {
            debug!("Login container is still present");
            return Ok(true);
        }
        if find_first_match(self.desktop, window, &paths.password_field)?.is_some() {
            debug!("Login form moved on to a password step");
            return Ok(true);
        }
        Ok(false)
    }
}
