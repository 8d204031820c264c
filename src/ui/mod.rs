//! UI Automation abstraction
//!
//! The login sequence and the inspector talk to the desktop through the
//! [`Desktop`] trait. On Windows it is backed by Microsoft UI Automation
//! ([`UiaDesktop`]); elsewhere every call fails with
//! `UiAutomationUnavailable`.

mod uia;

#[cfg(test)]
pub mod fake;

pub use uia::UiaDesktop;

use crate::error::{AutomationError, Result};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Control types that element queries can filter on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ControlKind {
    #[serde(rename = "WindowControl", alias = "Window")]
    Window,
    #[serde(rename = "EditControl", alias = "Edit")]
    Edit,
    #[serde(rename = "ButtonControl", alias = "Button")]
    Button,
    #[serde(rename = "DocumentControl", alias = "Document")]
    Document,
    #[serde(rename = "PaneControl", alias = "Pane")]
    Pane,
    #[serde(rename = "TextControl", alias = "Text")]
    Text,
    #[serde(rename = "GroupControl", alias = "Group")]
    Group,
    #[serde(rename = "CustomControl", alias = "Custom")]
    Custom,
    #[serde(rename = "HyperlinkControl", alias = "Hyperlink")]
    Hyperlink,
    #[serde(rename = "CheckBoxControl", alias = "CheckBox")]
    CheckBox,
    #[serde(rename = "ComboBoxControl", alias = "ComboBox")]
    ComboBox,
    #[serde(rename = "ListControl", alias = "List")]
    List,
    #[serde(rename = "ListItemControl", alias = "ListItem")]
    ListItem,
    #[serde(rename = "MenuItemControl", alias = "MenuItem")]
    MenuItem,
    #[serde(rename = "TabItemControl", alias = "TabItem")]
    TabItem,
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControlKind::Window => "WindowControl",
            ControlKind::Edit => "EditControl",
            ControlKind::Button => "ButtonControl",
            ControlKind::Document => "DocumentControl",
            ControlKind::Pane => "PaneControl",
            ControlKind::Text => "TextControl",
            ControlKind::Group => "GroupControl",
            ControlKind::Custom => "CustomControl",
            ControlKind::Hyperlink => "HyperlinkControl",
            ControlKind::CheckBox => "CheckBoxControl",
            ControlKind::ComboBox => "ComboBoxControl",
            ControlKind::List => "ListControl",
            ControlKind::ListItem => "ListItemControl",
            ControlKind::MenuItem => "MenuItemControl",
            ControlKind::TabItem => "TabItemControl",
        };
        f.write_str(name)
    }
}

/// Identifying properties of one UI element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementInfo {
    pub name: String,
    pub automation_id: String,
    pub class_name: String,
    /// `None` for control types no query can name
    pub control_type: Option<ControlKind>,
    /// Localized control type as reported by UI Automation
    pub control_type_name: String,
    pub enabled: bool,
    pub offscreen: bool,
}

/// Criteria locating an element below a parent.
///
/// Every criterion that is set must hold. `search_text` is a
/// case-insensitive substring match on the element name; the others are
/// exact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElementQuery {
    pub automation_id: Option<String>,
    pub name: Option<String>,
    pub class_name: Option<String>,
    pub control_type: Option<ControlKind>,
    pub search_text: Option<String>,
}

impl ElementQuery {
    /// Match on the UI Automation `AutomationId`
    pub fn by_automation_id(id: &str) -> Self {
        Self {
            automation_id: Some(id.to_string()),
            ..Self::default()
        }
    }

    /// Match on the exact element name
    pub fn by_name(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn by_class(class_name: &str) -> Self {
        Self {
            class_name: Some(class_name.to_string()),
            ..Self::default()
        }
    }

    pub fn by_control(kind: ControlKind) -> Self {
        Self {
            control_type: Some(kind),
            ..Self::default()
        }
    }

    pub fn by_text(text: &str) -> Self {
        Self {
            search_text: Some(text.to_string()),
            ..Self::default()
        }
    }

    /// Additionally require the control type
    pub fn with_control(mut self, kind: ControlKind) -> Self {
        self.control_type = Some(kind);
        self
    }

    /// A query without criteria would match anything
    pub fn is_empty(&self) -> bool {
        self.automation_id.is_none()
            && self.name.is_none()
            && self.class_name.is_none()
            && self.control_type.is_none()
            && self.search_text.is_none()
    }

    /// Whether `info` satisfies every criterion; an empty query matches nothing
    pub fn matches(&self, info: &ElementInfo) -> bool {
        if self.is_empty() {
            return false;
        }

        if let Some(ref id) = self.automation_id {
            if info.automation_id != *id {
                return false;
            }
        }
        if let Some(ref name) = self.name {
            if info.name != *name {
                return false;
            }
        }
        if let Some(ref class_name) = self.class_name {
            if info.class_name != *class_name {
                return false;
            }
        }
        if let Some(kind) = self.control_type {
            if info.control_type != Some(kind) {
                return false;
            }
        }
        if let Some(ref text) = self.search_text {
            if !info.name.to_lowercase().contains(&text.to_lowercase()) {
                return false;
            }
        }

        true
    }
}

impl fmt::Display for ElementQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref id) = self.automation_id {
            parts.push(format!("automation_id={}", id));
        }
        if let Some(ref name) = self.name {
            parts.push(format!("name={}", name));
        }
        if let Some(ref class_name) = self.class_name {
            parts.push(format!("class_name={}", class_name));
        }
        if let Some(kind) = self.control_type {
            parts.push(format!("control_type={}", kind));
        }
        if let Some(ref text) = self.search_text {
            parts.push(format!("search_text={}", text));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Access to top-level windows and their element trees
pub trait Desktop {
    type Element: Clone;

    /// First top-level window whose title contains one of the fragments.
    /// Fragments are tried in order, so earlier ones take priority.
    fn find_window(&self, title_fragments: &[String]) -> Result<Option<Self::Element>>;

    /// First descendant of `parent` matching `query`
    fn find_element(
        &self,
        parent: &Self::Element,
        query: &ElementQuery,
    ) -> Result<Option<Self::Element>>;

    /// Direct children of an element
    fn children(&self, parent: &Self::Element) -> Result<Vec<Self::Element>>;

    fn describe(&self, element: &Self::Element) -> Result<ElementInfo>;

    /// Element still exists, is enabled and on screen
    fn is_ready(&self, element: &Self::Element) -> bool;

    /// Focus the element and type text into it
    fn enter_text(&self, element: &Self::Element, text: &str, clear_first: bool) -> Result<()>;

    fn click(&self, element: &Self::Element) -> Result<()>;

    /// Focus the element and press Enter
    fn press_enter(&self, element: &Self::Element) -> Result<()>;
}

/// Try each query in order and return the first element found.
///
/// Lookup errors on a single query are logged and the next query is tried;
/// only a missing UI Automation backend aborts the search.
pub fn find_first_match<D: Desktop>(
    desktop: &D,
    parent: &D::Element,
    queries: &[ElementQuery],
) -> Result<Option<D::Element>> {
    for (i, query) in queries.iter().enumerate() {
        debug!("Trying path {}/{}: {}", i + 1, queries.len(), query);
        match desktop.find_element(parent, query) {
            Ok(Some(element)) => {
                info!("Found element using path {}: {}", i + 1, query);
                return Ok(Some(element));
            }
            Ok(None) => {}
            Err(AutomationError::UiAutomationUnavailable) => {
                return Err(AutomationError::UiAutomationUnavailable)
            }
            Err(e) => warn!("Error finding element by path {}: {}", query, e),
        }
    }

    warn!("Element not found using any of {} paths", queries.len());
    Ok(None)
}
