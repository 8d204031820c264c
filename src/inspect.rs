//! UI element inspection
//!
//! Dumps the element tree of a Snelstart window so element queries for
//! `snelstart.ui_paths` can be written against what UI Automation actually
//! exposes.

use crate::error::{AutomationError, Result};
use crate::ui::{ControlKind, Desktop, ElementInfo, ElementQuery};
use std::fmt::Write;
use tracing::{info, warn};

/// One element of the dump; the window's direct children have depth 1
#[derive(Debug, Clone)]
pub struct InspectedElement {
    pub depth: usize,
    pub info: ElementInfo,
}

/// Elements below one window, in depth-first order
#[derive(Debug)]
pub struct InspectionReport {
    pub window_title: String,
    pub elements: Vec<InspectedElement>,
}

/// Walk the first window matching `title_fragments` down to `max_depth`.
///
/// Depth counts from the window: 0 lists nothing below it, 1 its direct
/// children. Elements that cannot be described or expanded are skipped.
pub fn inspect<D: Desktop>(
    desktop: &D,
    title_fragments: &[String],
    max_depth: usize,
) -> Result<InspectionReport> {
    let window = desktop.find_window(title_fragments)?.ok_or_else(|| {
        AutomationError::ElementNotFound(format!("no window titled like {:?}", title_fragments))
    })?;
    let window_title = desktop.describe(&window)?.name;
    info!("Inspecting window: {}", window_title);

    let mut elements = Vec::new();
    let mut stack: Vec<(D::Element, usize)> = Vec::new();
    if max_depth > 0 {
        push_children(desktop, &window, 1, &mut stack);
    }

    // Depth-first, children in on-screen order
    while let Some((element, depth)) = stack.pop() {
        let info = match desktop.describe(&element) {
            Ok(info) => info,
            Err(e) => {
                warn!("Skipping element that could not be described: {}", e);
                continue;
            }
        };
        elements.push(InspectedElement { depth, info });

        if depth < max_depth {
            push_children(desktop, &element, depth + 1, &mut stack);
        }
    }

    info!("Inspected {} elements", elements.len());
    Ok(InspectionReport {
        window_title,
        elements,
    })
}

fn push_children<D: Desktop>(
    desktop: &D,
    parent: &D::Element,
    depth: usize,
    stack: &mut Vec<(D::Element, usize)>,
) {
    match desktop.children(parent) {
        // Reversed so the first child is popped first
        Ok(children) => stack.extend(children.into_iter().rev().map(|c| (c, depth))),
        Err(e) => warn!("Skipping children that could not be listed: {}", e),
    }
}

impl InspectionReport {
    /// Queries for the edit and button controls found, most specific first
    pub fn suggested_queries(&self) -> Vec<ElementQuery> {
        self.elements
            .iter()
            .filter_map(|e| {
                let kind = e.info.control_type?;
                if !matches!(kind, ControlKind::Edit | ControlKind::Button) {
                    return None;
                }
                let query = if !e.info.automation_id.is_empty() {
                    ElementQuery::by_automation_id(&e.info.automation_id)
                } else if !e.info.name.is_empty() {
                    ElementQuery::by_name(&e.info.name)
                } else if !e.info.class_name.is_empty() {
                    ElementQuery::by_class(&e.info.class_name)
                } else {
                    return None;
                };
                Some(query.with_control(kind))
            })
            .collect()
    }

    /// Indented tree followed by YAML entries ready for `ui_paths`
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Window: {}", self.window_title);
        let _ = writeln!(out, "Elements ({}):", self.elements.len());

        for element in &self.elements {
            let info = &element.info;
            let kind = info
                .control_type
                .map(|k| k.to_string())
                .unwrap_or_else(|| info.control_type_name.clone());
            let mut flags = Vec::new();
            if !info.enabled {
                flags.push("disabled");
            }
            if info.offscreen {
                flags.push("offscreen");
            }
            let _ = write!(
                out,
                "{}[{}] name='{}' automation_id='{}' class='{}'",
                "  ".repeat(element.depth),
                kind,
                info.name,
                info.automation_id,
                info.class_name
            );
            if !flags.is_empty() {
                let _ = write!(out, " ({})", flags.join(", "));
            }
            out.push('\n');
        }

        let suggestions = self.suggested_queries();
        if !suggestions.is_empty() {
            out.push_str("\nSuggested ui_paths entries:\n");
            for query in suggestions {
                let _ = writeln!(out, "  - {}", yaml_entry(&query));
            }
        }

        out
    }
}

fn yaml_entry(query: &ElementQuery) -> String {
    let mut parts = Vec::new();
    if let Some(ref id) = query.automation_id {
        parts.push(format!("automation_id: '{}'", id.replace('\'', "''")));
    }
    if let Some(ref name) = query.name {
        parts.push(format!("name: '{}'", name.replace('\'', "''")));
    }
    if let Some(ref class_name) = query.class_name {
        parts.push(format!("class_name: '{}'", class_name.replace('\'', "''")));
    }
    if let Some(kind) = query.control_type {
        parts.push(format!("control_type: {}", kind));
    }
    format!("{{{}}}", parts.join(", "))
}
