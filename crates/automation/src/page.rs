//! The page abstraction every component drives
//!
//! Provisioning and harvesting only depend on this trait. Implementations
//! are the Playwright bridge ([`crate::playwright::PlaywrightPage`]) and the
//! recording page used for dry runs and tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::action::{DialogOutcome, DialogPolicy, TableRow, UiAction};
use crate::error::AutomationResult;

#[async_trait]
pub trait Page: Send {
    /// Perform one UI action, waiting for any navigation it causes
    async fn perform(&mut self, action: &UiAction) -> AutomationResult<()>;

    /// Perform `trigger` with a one-shot dialog expectation.
    ///
    /// The expectation is registered before `trigger` fires and resolved
    /// before this returns; at most one dialog is consumed.
    async fn confirm(
        &mut self,
        policy: DialogPolicy,
        trigger: &UiAction,
    ) -> AutomationResult<DialogOutcome>;

    /// Current value of an input or select
    async fn input_value(&mut self, selector: &str) -> AutomationResult<String>;

    /// Rows matching `selector`, each reduced to cell text and links
    async fn table_rows(&mut self, selector: &str) -> AutomationResult<Vec<TableRow>>;

    /// Perform `trigger`, wait for the download it starts and save it into
    /// `dir`, under `file_name` or else the suggested name. Returns the saved path.
    async fn download(
        &mut self,
        trigger: &UiAction,
        dir: &Path,
        file_name: Option<&str>,
    ) -> AutomationResult<PathBuf>;

    /// Release the browser. Further calls fail.
    async fn close(&mut self) -> AutomationResult<()> {
        Ok(())
    }
}

/// Selector-bound helper: `page.locate("input[name=x]").fill("1")`
pub struct Locator<'a, P: Page + ?Sized> {
    page: &'a mut P,
    selector: String,
}

impl<'a, P: Page + ?Sized> Locator<'a, P> {
    pub async fn fill(self, value: impl Into<String>) -> AutomationResult<()> {
        self.page
            .perform(&UiAction::fill(self.selector, value))
            .await
    }

    pub async fn click(self) -> AutomationResult<()> {
        self.page.perform(&UiAction::click(self.selector)).await
    }

    /// Check when `on`, uncheck otherwise
    pub async fn set_checked(self, on: bool) -> AutomationResult<()> {
        self.page.perform(&UiAction::toggle(self.selector, on)).await
    }

    pub async fn select_option(self, value: impl Into<String>) -> AutomationResult<()> {
        self.page
            .perform(&UiAction::select(self.selector, value))
            .await
    }

    pub async fn select_label(self, label: impl Into<String>) -> AutomationResult<()> {
        self.page
            .perform(&UiAction::select_label(self.selector, label))
            .await
    }

    pub async fn set_input_files(self, path: impl Into<PathBuf>) -> AutomationResult<()> {
        self.page
            .perform(&UiAction::set_input_files(self.selector, path))
            .await
    }

    pub async fn input_value(self) -> AutomationResult<String> {
        self.page.input_value(&self.selector).await
    }
}

/// Entry point for [`Locator`]
pub trait Locate: Page {
    fn locate(&mut self, selector: impl Into<String>) -> Locator<'_, Self> {
        Locator {
            page: self,
            selector: selector.into(),
        }
    }
}

impl<P: Page + ?Sized> Locate for P {}
