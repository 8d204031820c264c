//! Windows UI Automation backend
//!
//! Uses Microsoft UI Automation to walk the desktop tree and locate elements,
//! and `SendInput` (see [`crate::input`]) to type into them.

#[cfg(windows)]
mod imp {
    use crate::error::{AutomationError, Result};
    use crate::input::InputInjector;
    use crate::ui::{ControlKind, Desktop, ElementInfo, ElementQuery};
    use std::thread;
    use std::time::Duration;
    use tracing::{debug, error, info};
    use uiautomation::controls::ControlType;
    use uiautomation::{UIAutomation, UIElement};

    /// How deep below a parent element queries search
    const SEARCH_DEPTH: u32 = 12;

    /// Per-query matcher timeout; callers poll on top of this
    const MATCH_TIMEOUT_MS: u64 = 500;

    /// Pause after focusing before keystrokes are sent
    const FOCUS_SETTLE: Duration = Duration::from_millis(200);

    /// UI Automation desktop for Windows
    pub struct UiaDesktop {
        automation: UIAutomation,
        injector: InputInjector,
    }

    impl UiaDesktop {
        /// Connect to the UI Automation COM server
        pub fn new() -> Result<Self> {
            let automation = UIAutomation::new()
                .map_err(|e| AutomationError::UiAutomationInitFailed(e.to_string()))?;

            info!("UI Automation initialized successfully");
            Ok(Self {
                automation,
                injector: InputInjector::new(),
            })
        }

        fn top_level_windows(&self) -> Result<Vec<UIElement>> {
            let root = self.automation.get_root_element().map_err(uia_error)?;
            self.children(&root)
        }
    }

    impl Desktop for UiaDesktop {
        type Element = UIElement;

        fn find_window(&self, title_fragments: &[String]) -> Result<Option<UIElement>> {
            let windows = self.top_level_windows()?;
            let titled: Vec<(String, UIElement)> = windows
                .into_iter()
                .filter_map(|w| w.get_name().ok().map(|name| (name, w)))
                .collect();

            for fragment in title_fragments.iter().filter(|f| !f.is_empty()) {
                if let Some((name, window)) = titled.iter().find(|(name, _)| name.contains(fragment.as_str())) {
                    debug!("Window '{}' matches title fragment '{}'", name, fragment);
                    return Ok(Some(window.clone()));
                }
            }

            Ok(None)
        }

        fn find_element(
            &self,
            parent: &UIElement,
            query: &ElementQuery,
        ) -> Result<Option<UIElement>> {
            if query.is_empty() {
                return Ok(None);
            }

            let wanted = query.clone();
            let matcher = self
                .automation
                .create_matcher()
                .from(parent.clone())
                .depth(SEARCH_DEPTH)
                .timeout(MATCH_TIMEOUT_MS)
                .filter_fn(Box::new(move |element: &UIElement| {
                    Ok(wanted.matches(&element_info(element)))
                }));

            // The matcher reports "not found" as an error
            match matcher.find_first() {
                Ok(element) => Ok(Some(element)),
                Err(e) => {
                    debug!("No element for {}: {}", query, e);
                    Ok(None)
                }
            }
        }

        fn children(&self, parent: &UIElement) -> Result<Vec<UIElement>> {
            let walker = self.automation.create_tree_walker().map_err(uia_error)?;
            let mut children = Vec::new();

            let mut next = walker.get_first_child(parent).ok();
            while let Some(child) = next {
                next = walker.get_next_sibling(&child).ok();
                children.push(child);
            }

            Ok(children)
        }

        fn describe(&self, element: &UIElement) -> Result<ElementInfo> {
            // A vanished element cannot report its name
            element.get_name().map_err(uia_error)?;
            Ok(element_info(element))
        }

        fn is_ready(&self, element: &UIElement) -> bool {
            if element.get_name().is_err() {
                debug!("Element no longer exists");
                return false;
            }
            let enabled = element.is_enabled().unwrap_or(false);
            let offscreen = element.is_offscreen().unwrap_or(true);
            enabled && !offscreen
        }

        fn enter_text(&self, element: &UIElement, text: &str, clear_first: bool) -> Result<()> {
            focus(element)?;
            thread::sleep(FOCUS_SETTLE);

            if clear_first {
                self.injector.select_all()?;
            }

            self.injector.type_string(text)
        }

        fn click(&self, element: &UIElement) -> Result<()> {
            element.click().map_err(|e| {
                error!("Failed to click element: {}", e);
                uia_error(e)
            })
        }

        fn press_enter(&self, element: &UIElement) -> Result<()> {
            focus(element)?;
            thread::sleep(FOCUS_SETTLE);
            self.injector.press_enter()
        }
    }

    fn focus(element: &UIElement) -> Result<()> {
        debug!("Setting focus to element");
        element.set_focus().map_err(|e| {
            error!("Failed to set focus: {}", e);
            AutomationError::UiAutomationError(format!("Failed to focus element: {}", e))
        })
    }

    fn uia_error(e: uiautomation::Error) -> AutomationError {
        AutomationError::UiAutomationError(e.to_string())
    }

    fn element_info(element: &UIElement) -> ElementInfo {
        ElementInfo {
            name: element.get_name().unwrap_or_default(),
            automation_id: element.get_automation_id().unwrap_or_default(),
            class_name: element.get_classname().unwrap_or_default(),
            control_type: element.get_control_type().ok().and_then(control_kind),
            control_type_name: element.get_localized_control_type().unwrap_or_default(),
            enabled: element.is_enabled().unwrap_or(false),
            offscreen: element.is_offscreen().unwrap_or(true),
        }
    }

    fn control_kind(control_type: ControlType) -> Option<ControlKind> {
        let kind = match control_type {
            ControlType::Window => ControlKind::Window,
            ControlType::Edit => ControlKind::Edit,
            ControlType::Button => ControlKind::Button,
            ControlType::Document => ControlKind::Document,
            ControlType::Pane => ControlKind::Pane,
            ControlType::Text => ControlKind::Text,
            ControlType::Group => ControlKind::Group,
            ControlType::Custom => ControlKind::Custom,
            ControlType::Hyperlink => ControlKind::Hyperlink,
            ControlType::CheckBox => ControlKind::CheckBox,
            ControlType::ComboBox => ControlKind::ComboBox,
            ControlType::List => ControlKind::List,
            ControlType::ListItem => ControlKind::ListItem,
            ControlType::MenuItem => ControlKind::MenuItem,
            ControlType::TabItem => ControlKind::TabItem,
            _ => return None,
        };
        Some(kind)
    }
}

#[cfg(not(windows))]
mod imp {
    use crate::error::{AutomationError, Result};
    use crate::ui::{Desktop, ElementInfo, ElementQuery};
    use tracing::warn;

    /// Placeholder desktop: UI Automation only exists on Windows
    pub struct UiaDesktop;

    impl UiaDesktop {
        /// Always succeeds; every later call fails with `UiAutomationUnavailable`
        pub fn new() -> Result<Self> {
            warn!("UI Automation is not available on this platform");
            Ok(Self)
        }
    }

    impl Desktop for UiaDesktop {
        type Element = ();

        fn find_window(&self, _title_fragments: &[String]) -> Result<Option<()>> {
            Err(AutomationError::UiAutomationUnavailable)
        }

        fn find_element(&self, _parent: &(), _query: &ElementQuery) -> Result<Option<()>> {
            Err(AutomationError::UiAutomationUnavailable)
        }

        fn children(&self, _parent: &()) -> Result<Vec<()>> {
            Err(AutomationError::UiAutomationUnavailable)
        }

        fn describe(&self, _element: &()) -> Result<ElementInfo> {
            Err(AutomationError::UiAutomationUnavailable)
        }

        fn is_ready(&self, _element: &()) -> bool {
            false
        }

        fn enter_text(&self, _element: &(), _text: &str, _clear_first: bool) -> Result<()> {
            Err(AutomationError::UiAutomationUnavailable)
        }

        fn click(&self, _element: &()) -> Result<()> {
            Err(AutomationError::UiAutomationUnavailable)
        }

        fn press_enter(&self, _element: &()) -> Result<()> {
            Err(AutomationError::UiAutomationUnavailable)
        }
    }

}

pub use imp::UiaDesktop;
