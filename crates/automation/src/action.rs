//! UI actions exchanged with a page

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A single state-changing UI operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UiAction {
    /// Navigate to an absolute URL
    Navigate { url: String },

    /// Click an element
    Click { selector: String },

    /// Fill an input field, replacing its content
    Fill { selector: String, value: String },

    /// Check a checkbox
    Check { selector: String },

    /// Uncheck a checkbox
    Uncheck { selector: String },

    /// Select a dropdown option by value
    Select { selector: String, value: String },

    /// Select a dropdown option by its visible label
    SelectLabel { selector: String, label: String },

    /// Attach a local file to a file input
    SetInputFiles { selector: String, path: PathBuf },

    /// Go back in history
    GoBack,
}

impl UiAction {
    pub fn navigate(url: impl Into<String>) -> Self {
        UiAction::Navigate { url: url.into() }
    }

    pub fn click(selector: impl Into<String>) -> Self {
        UiAction::Click {
            selector: selector.into(),
        }
    }

    pub fn fill(selector: impl Into<String>, value: impl Into<String>) -> Self {
        UiAction::Fill {
            selector: selector.into(),
            value: value.into(),
        }
    }

    /// Check or uncheck depending on `on`
    pub fn toggle(selector: impl Into<String>, on: bool) -> Self {
        let selector = selector.into();
        if on {
            UiAction::Check { selector }
        } else {
            UiAction::Uncheck { selector }
        }
    }

    pub fn select(selector: impl Into<String>, value: impl Into<String>) -> Self {
        UiAction::Select {
            selector: selector.into(),
            value: value.into(),
        }
    }

    pub fn select_label(selector: impl Into<String>, label: impl Into<String>) -> Self {
        UiAction::SelectLabel {
            selector: selector.into(),
            label: label.into(),
        }
    }

    pub fn set_input_files(selector: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        UiAction::SetInputFiles {
            selector: selector.into(),
            path: path.into(),
        }
    }

    /// Target selector, if the action has one
    pub fn selector(&self) -> Option<&str> {
        match self {
            UiAction::Click { selector }
            | UiAction::Fill { selector, .. }
            | UiAction::Check { selector }
            | UiAction::Uncheck { selector }
            | UiAction::Select { selector, .. }
            | UiAction::SelectLabel { selector, .. }
            | UiAction::SetInputFiles { selector, .. } => Some(selector),
            UiAction::Navigate { .. } | UiAction::GoBack => None,
        }
    }
}

impl fmt::Display for UiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiAction::Navigate { url } => write!(f, "navigate:{}", url),
            UiAction::Click { selector } => write!(f, "click:{}", selector),
            UiAction::Fill { selector, .. } => write!(f, "fill:{}", selector),
            UiAction::Check { selector } => write!(f, "check:{}", selector),
            UiAction::Uncheck { selector } => write!(f, "uncheck:{}", selector),
            UiAction::Select { selector, value } => write!(f, "select:{}={}", selector, value),
            UiAction::SelectLabel { selector, label } => {
                write!(f, "select:{}~{}", selector, label)
            }
            UiAction::SetInputFiles { selector, path } => {
                write!(f, "attach:{}<-{}", selector, path.display())
            }
            UiAction::GoBack => write!(f, "go-back"),
        }
    }
}

/// How a confirmation dialog is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogPolicy {
    Accept,
    Dismiss,
}

impl DialogPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogPolicy::Accept => "accept",
            DialogPolicy::Dismiss => "dismiss",
        }
    }
}

/// What happened to the dialog expected around a triggering action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DialogOutcome {
    /// A dialog appeared and was answered with the policy
    Resolved { message: String },
    /// The action completed without raising a dialog
    NotRaised,
    /// The dialog was already answered when the handler ran
    AlreadyHandled,
}

/// One row of an HTML table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    /// Trimmed text of every cell
    pub cells: Vec<String>,

    /// `href` of the first link in each cell, aligned with `cells`
    #[serde(default)]
    pub links: Vec<Option<String>>,
}

impl TableRow {
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).map(String::as_str)
    }

    pub fn link(&self, index: usize) -> Option<&str> {
        self.links.get(index).and_then(|l| l.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_serialize_with_action_tag() {
        let json = serde_json::to_value(UiAction::fill("input[name=\"name\"]", "Regional")).unwrap();
        assert_eq!(json["action"], "fill");
        assert_eq!(json["value"], "Regional");

        let back: UiAction = serde_json::from_value(json).unwrap();
        assert_eq!(back, UiAction::fill("input[name=\"name\"]", "Regional"));
    }

    #[test]
    fn test_toggle() {
        assert!(matches!(UiAction::toggle("#a", true), UiAction::Check { .. }));
        assert!(matches!(UiAction::toggle("#a", false), UiAction::Uncheck { .. }));
        assert_eq!(UiAction::GoBack.selector(), None);
    }

    #[test]
    fn test_table_row_accessors() {
        let row = TableRow {
            cells: vec!["7".into(), "1".into(), "alice".into()],
            links: vec![Some("runedit.php?run=7".into()), None, None],
        };
        assert_eq!(row.cell(2), Some("alice"));
        assert_eq!(row.link(0), Some("runedit.php?run=7"));
        assert_eq!(row.link(1), None);
        assert_eq!(row.link(9), None);
    }
}
