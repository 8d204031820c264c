//! Scripted desktop for tests
//!
//! Models a Snelstart login window whose contents and behaviour are set by a
//! [`FakeScript`]. Time-dependent behaviour reads the shared [`ManualClock`].

use crate::clock::ManualClock;
use crate::error::{AutomationError, Result};
use crate::ui::{ControlKind, Desktop, ElementInfo, ElementQuery};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeElement {
    Window,
    Container,
    EmailField,
    PasswordField,
    ContinueButton,
    SuccessIndicator,
}

#[derive(Debug, Clone)]
pub struct FakeScript {
    pub window_title: String,
    /// Virtual time at which the window shows up; `None` means never
    pub window_appears_at: Option<Duration>,
    /// Email field and button live inside an embedded login container
    pub embedded_container: bool,
    pub has_email_field: bool,
    pub email_field_ready: bool,
    pub has_button: bool,
    /// Clicking the button (or pressing Enter) logs in
    pub submit_logs_in: bool,
    /// Submitting the email swaps it for a password field in the same form
    pub submit_shows_password: bool,
    /// After login the window stays open with a dashboard element
    pub window_stays_after_login: bool,
    pub typing_fails: bool,
    /// Listing the children of the embedded container fails
    pub container_children_fail: bool,
}

impl Default for FakeScript {
    fn default() -> Self {
        Self {
            window_title: "Inloggen SnelStart 12".to_string(),
            window_appears_at: Some(Duration::ZERO),
            embedded_container: false,
            has_email_field: true,
            email_field_ready: true,
            has_button: true,
            submit_logs_in: true,
            submit_shows_password: false,
            window_stays_after_login: false,
            typing_fails: false,
            container_children_fail: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeLog {
    pub window_lookups: u32,
    pub typed: Vec<String>,
    pub clicks: u32,
    pub enters: u32,
    pub logged_in: bool,
    pub password_page: bool,
}

pub struct FakeDesktop {
    script: FakeScript,
    clock: Rc<ManualClock>,
    log: RefCell<FakeLog>,
}

impl FakeDesktop {
    pub fn new(script: FakeScript, clock: Rc<ManualClock>) -> Self {
        Self {
            script,
            clock,
            log: RefCell::new(FakeLog::default()),
        }
    }

    pub fn log(&self) -> std::cell::Ref<'_, FakeLog> {
        self.log.borrow()
    }

    fn window_visible(&self) -> bool {
        let appeared = match self.script.window_appears_at {
            Some(at) => self.clock.elapsed() >= at,
            None => false,
        };
        let logged_in = self.log.borrow().logged_in;
        appeared && (!logged_in || self.script.window_stays_after_login)
    }

    fn submit(&self) {
        if self.script.submit_shows_password {
            self.log.borrow_mut().password_page = true;
        } else if self.script.submit_logs_in {
            self.log.borrow_mut().logged_in = true;
        }
    }

    fn form_elements(&self) -> Vec<FakeElement> {
        if self.log.borrow().logged_in {
            return vec![FakeElement::SuccessIndicator];
        }
        if self.log.borrow().password_page {
            return vec![FakeElement::PasswordField, FakeElement::ContinueButton];
        }

        let mut elements = Vec::new();
        if self.script.has_email_field {
            elements.push(FakeElement::EmailField);
        }
        if self.script.has_button {
            elements.push(FakeElement::ContinueButton);
        }
        elements
    }

    fn child_elements(&self, parent: FakeElement) -> Vec<FakeElement> {
        match parent {
            FakeElement::Window if self.script.embedded_container => {
                if self.log.borrow().logged_in {
                    vec![FakeElement::SuccessIndicator]
                } else {
                    vec![FakeElement::Container]
                }
            }
            FakeElement::Window => self.form_elements(),
            FakeElement::Container => self.form_elements(),
            _ => Vec::new(),
        }
    }

    fn info(&self, element: FakeElement) -> ElementInfo {
        let (name, automation_id, class_name, kind) = match element {
            FakeElement::Window => (self.script.window_title.as_str(), "", "Window", ControlKind::Window),
            FakeElement::Container => ("Inloggen SnelStart 12", "WebAuthentication", "", ControlKind::Window),
            FakeElement::EmailField => ("Email", "email_input", "TextBox", ControlKind::Edit),
            FakeElement::PasswordField => ("Wachtwoord", "password_input", "PasswordBox", ControlKind::Edit),
            FakeElement::ContinueButton => ("Doorgaan", "continue_btn", "Button", ControlKind::Button),
            FakeElement::SuccessIndicator => ("Dashboard", "Dashboard", "", ControlKind::Pane),
        };
        ElementInfo {
            name: name.to_string(),
            automation_id: automation_id.to_string(),
            class_name: class_name.to_string(),
            control_type: Some(kind),
            control_type_name: kind.to_string(),
            enabled: true,
            offscreen: false,
        }
    }
}

impl Desktop for FakeDesktop {
    type Element = FakeElement;

    fn find_window(&self, title_fragments: &[String]) -> Result<Option<FakeElement>> {
        self.log.borrow_mut().window_lookups += 1;
        let matches_title = title_fragments
            .iter()
            .any(|f| self.script.window_title.contains(f.as_str()));
        Ok((matches_title && self.window_visible()).then_some(FakeElement::Window))
    }

    fn find_element(
        &self,
        parent: &FakeElement,
        query: &ElementQuery,
    ) -> Result<Option<FakeElement>> {
        let mut pending = self.child_elements(*parent);
        while !pending.is_empty() {
            let element = pending.remove(0);
            if query.matches(&self.info(element)) {
                return Ok(Some(element));
            }
            pending.extend(self.child_elements(element));
        }
        Ok(None)
    }

    fn children(&self, parent: &FakeElement) -> Result<Vec<FakeElement>> {
        if *parent == FakeElement::Container && self.script.container_children_fail {
            return Err(AutomationError::UiAutomationError("scripted".to_string()));
        }
        Ok(self.child_elements(*parent))
    }

    fn describe(&self, element: &FakeElement) -> Result<ElementInfo> {
        Ok(self.info(*element))
    }

    fn is_ready(&self, element: &FakeElement) -> bool {
        match element {
            FakeElement::EmailField => {
                let log = self.log.borrow();
                self.script.email_field_ready && !log.logged_in && !log.password_page
            }
            FakeElement::ContinueButton => !self.log.borrow().logged_in,
            _ => true,
        }
    }

    fn enter_text(&self, _element: &FakeElement, text: &str, _clear_first: bool) -> Result<()> {
        if self.script.typing_fails {
            return Err(AutomationError::InputInjectionFailed("scripted".to_string()));
        }
        self.log.borrow_mut().typed.push(text.to_string());
        Ok(())
    }

    fn click(&self, _element: &FakeElement) -> Result<()> {
        self.log.borrow_mut().clicks += 1;
        self.submit();
        Ok(())
    }

    fn press_enter(&self, _element: &FakeElement) -> Result<()> {
        self.log.borrow_mut().enters += 1;
        self.submit();
        Ok(())
    }
}
