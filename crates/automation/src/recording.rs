//! Recording page: dry runs and tests
//!
//! Records every request instead of driving a browser. Reads and downloads
//! are answered from scripted responses, so whole provisioning or harvesting
//! sequences can be replayed and asserted without a server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::action::{DialogOutcome, DialogPolicy, TableRow, UiAction};
use crate::error::{AutomationError, AutomationResult};
use crate::page::Page;

/// One recorded page request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PlannedStep {
    Action(UiAction),
    Confirm {
        policy: DialogPolicy,
        trigger: UiAction,
    },
    ReadValue {
        selector: String,
    },
    ReadRows {
        selector: String,
    },
    Download {
        trigger: UiAction,
        dir: PathBuf,
        file_name: Option<String>,
    },
}

impl PlannedStep {
    /// The state-changing action inside this step, if any
    pub fn action(&self) -> Option<&UiAction> {
        match self {
            PlannedStep::Action(action) => Some(action),
            PlannedStep::Confirm { trigger, .. } | PlannedStep::Download { trigger, .. } => {
                Some(trigger)
            }
            PlannedStep::ReadValue { .. } | PlannedStep::ReadRows { .. } => None,
        }
    }
}

impl fmt::Display for PlannedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedStep::Action(action) => write!(f, "{}", action),
            PlannedStep::Confirm { policy, trigger } => {
                write!(f, "{} [dialog: {}]", trigger, policy.as_str())
            }
            PlannedStep::ReadValue { selector } => write!(f, "read:{}", selector),
            PlannedStep::ReadRows { selector } => write!(f, "rows:{}", selector),
            PlannedStep::Download {
                trigger,
                dir,
                file_name,
            } => write!(
                f,
                "download:{} -> {}/{}",
                trigger,
                dir.display(),
                file_name.as_deref().unwrap_or("<suggested>")
            ),
        }
    }
}

/// A [`Page`] that records instead of driving a browser
#[derive(Debug)]
pub struct RecordingPage {
    steps: Vec<PlannedStep>,
    values: HashMap<String, VecDeque<String>>,
    rows: HashMap<String, Vec<TableRow>>,
    suggested_names: HashMap<String, String>,
    failing_selectors: HashSet<String>,
    dialog_outcome: DialogOutcome,
    write_downloads: bool,
}

impl Default for RecordingPage {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingPage {
    /// A page that only records; downloads are not written
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            values: HashMap::new(),
            rows: HashMap::new(),
            suggested_names: HashMap::new(),
            failing_selectors: HashSet::new(),
            dialog_outcome: DialogOutcome::Resolved {
                message: "Confirm?".to_string(),
            },
            write_downloads: false,
        }
    }

    /// Write a small placeholder file for every download
    pub fn writing_downloads(mut self) -> Self {
        self.write_downloads = true;
        self
    }

    /// Queue a value answered by the next `input_value(selector)`
    pub fn with_value(mut self, selector: impl Into<String>, value: impl Into<String>) -> Self {
        self.values
            .entry(selector.into())
            .or_default()
            .push_back(value.into());
        self
    }

    pub fn with_rows(mut self, selector: impl Into<String>, rows: Vec<TableRow>) -> Self {
        self.rows.insert(selector.into(), rows);
        self
    }

    /// Suggested file name for downloads triggered through `selector`
    pub fn with_download_name(
        mut self,
        selector: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.suggested_names.insert(selector.into(), name.into());
        self
    }

    /// Make every action targeting `selector` fail as if the element were missing
    pub fn failing_on(mut self, selector: impl Into<String>) -> Self {
        self.failing_selectors.insert(selector.into());
        self
    }

    pub fn with_dialog_outcome(mut self, outcome: DialogOutcome) -> Self {
        self.dialog_outcome = outcome;
        self
    }

    pub fn steps(&self) -> &[PlannedStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<PlannedStep> {
        self.steps
    }

    /// Every state-changing action, in order, with dialog and download wrappers removed
    pub fn actions(&self) -> Vec<&UiAction> {
        self.steps.iter().filter_map(PlannedStep::action).collect()
    }

    fn check(&self, action: &UiAction) -> AutomationResult<()> {
        match action.selector() {
            Some(selector) if self.failing_selectors.contains(selector) => {
                Err(AutomationError::ElementNotFound(selector.to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Page for RecordingPage {
    async fn perform(&mut self, action: &UiAction) -> AutomationResult<()> {
        debug!("Recording step: {}", action);
        self.check(action)?;
        self.steps.push(PlannedStep::Action(action.clone()));
        Ok(())
    }

    async fn confirm(
        &mut self,
        policy: DialogPolicy,
        trigger: &UiAction,
    ) -> AutomationResult<DialogOutcome> {
        debug!("Recording step: {} (dialog: {})", trigger, policy.as_str());
        self.check(trigger)?;
        self.steps.push(PlannedStep::Confirm {
            policy,
            trigger: trigger.clone(),
        });
        Ok(self.dialog_outcome.clone())
    }

    async fn input_value(&mut self, selector: &str) -> AutomationResult<String> {
        self.steps.push(PlannedStep::ReadValue {
            selector: selector.to_string(),
        });
        self.values
            .get_mut(selector)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| AutomationError::ElementNotFound(selector.to_string()))
    }

    async fn table_rows(&mut self, selector: &str) -> AutomationResult<Vec<TableRow>> {
        self.steps.push(PlannedStep::ReadRows {
            selector: selector.to_string(),
        });
        Ok(self.rows.get(selector).cloned().unwrap_or_default())
    }

    async fn download(
        &mut self,
        trigger: &UiAction,
        dir: &Path,
        file_name: Option<&str>,
    ) -> AutomationResult<PathBuf> {
        self.check(trigger)?;
        self.steps.push(PlannedStep::Download {
            trigger: trigger.clone(),
            dir: dir.to_path_buf(),
            file_name: file_name.map(str::to_string),
        });

        let name = file_name
            .map(str::to_string)
            .or_else(|| {
                trigger
                    .selector()
                    .and_then(|s| self.suggested_names.get(s).cloned())
            })
            .unwrap_or_else(|| "download.bin".to_string());
        let target = dir.join(name);

        if self.write_downloads {
            tokio::fs::write(&target, format!("downloaded via {}\n", trigger)).await?;
        }
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Locate;

    #[tokio::test]
    async fn test_records_actions_in_order() {
        let mut page = RecordingPage::new();
        page.locate("input[name=\"name\"]").fill("Regional").await.unwrap();
        page.locate("#active").set_checked(true).await.unwrap();
        page.confirm(DialogPolicy::Dismiss, &UiAction::click("#send"))
            .await
            .unwrap();

        assert_eq!(
            page.actions(),
            vec![
                &UiAction::fill("input[name=\"name\"]", "Regional"),
                &UiAction::toggle("#active", true),
                &UiAction::click("#send"),
            ]
        );
        assert!(matches!(
            page.steps()[2],
            PlannedStep::Confirm {
                policy: DialogPolicy::Dismiss,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_scripted_values_are_consumed() {
        let mut page = RecordingPage::new()
            .with_value("select[name=\"answer\"]", "1")
            .with_value("select[name=\"answer\"]", "0");

        assert_eq!(page.input_value("select[name=\"answer\"]").await.unwrap(), "1");
        assert_eq!(page.input_value("select[name=\"answer\"]").await.unwrap(), "0");
        assert!(page.input_value("select[name=\"answer\"]").await.is_err());
    }

    #[tokio::test]
    async fn test_failing_selector() {
        let mut page = RecordingPage::new().failing_on("#missing");
        let err = page.locate("#missing").click().await.unwrap_err();
        assert!(matches!(err, AutomationError::ElementNotFound(s) if s == "#missing"));
        assert!(page.steps().is_empty());
    }

    #[tokio::test]
    async fn test_downloads_use_suggested_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut page = RecordingPage::new()
            .writing_downloads()
            .with_download_name("a.code", "main.c");

        let code = page
            .download(&UiAction::click("a.code"), dir.path(), None)
            .await
            .unwrap();
        let stdout = page
            .download(&UiAction::click("a.out"), dir.path(), Some("stdout.txt"))
            .await
            .unwrap();

        assert_eq!(code, dir.path().join("main.c"));
        assert!(code.is_file());
        assert_eq!(stdout, dir.path().join("stdout.txt"));
        assert!(stdout.is_file());
    }
}
