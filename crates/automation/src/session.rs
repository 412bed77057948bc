//! One logged-in browser session
//!
//! The runner owns the session and lends it to each component by `&mut`, so
//! the page, its cookies and the tool configuration travel together.

use tracing::{debug, info};

use bocactl_common::{BocactlConfig, LoginCredential};

use crate::action::UiAction;
use crate::error::AutomationResult;
use crate::page::{Locate, Page};
use crate::selectors::login;

pub struct Session<P: Page> {
    page: P,
    config: BocactlConfig,
    logged_in_as: Option<String>,
}

impl<P: Page> Session<P> {
    pub fn new(page: P, config: BocactlConfig) -> Self {
        Self {
            page,
            config,
            logged_in_as: None,
        }
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn config(&self) -> &BocactlConfig {
        &self.config
    }

    /// Absolute URL for a path relative to the configured base URL
    pub fn url(&self, path: &str) -> String {
        self.config.page_url(path)
    }

    /// Username of the current login, if any
    pub fn user(&self) -> Option<&str> {
        self.logged_in_as.as_deref()
    }

    pub async fn navigate(&mut self, path: &str) -> AutomationResult<()> {
        let url = self.url(path);
        debug!("Navigating to {}", url);
        self.page.perform(&UiAction::navigate(url)).await
    }

    /// Log in through the landing page form
    pub async fn login(&mut self, credential: &LoginCredential) -> AutomationResult<()> {
        let path = self.config.pages.login.clone();
        self.navigate(&path).await?;
        self.page
            .locate(login::USERNAME)
            .fill(credential.username.as_str())
            .await?;
        self.page
            .locate(login::PASSWORD)
            .fill(credential.password.as_str())
            .await?;
        self.page.locate(login::SUBMIT).click().await?;

        info!("Logged in as {}", credential.username);
        self.logged_in_as = Some(credential.username.clone());
        Ok(())
    }

    pub async fn logout(&mut self) -> AutomationResult<()> {
        if let Some(user) = self.logged_in_as.take() {
            let path = self.config.pages.logout.clone();
            self.navigate(&path).await?;
            debug!("Logged out {}", user);
        }
        Ok(())
    }

    /// Close the page and hand it back, e.g. to inspect a recording
    pub async fn close(mut self) -> AutomationResult<P> {
        self.page.close().await?;
        Ok(self.page)
    }

    pub fn into_page(self) -> P {
        self.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingPage;

    #[tokio::test]
    async fn test_login_fills_landing_form() {
        let mut session = Session::new(RecordingPage::new(), BocactlConfig::default());
        session
            .login(&LoginCredential {
                username: "system".into(),
                password: "boca".into(),
            })
            .await
            .unwrap();
        assert_eq!(session.user(), Some("system"));

        session.logout().await.unwrap();
        assert_eq!(session.user(), None);

        let page = session.into_page();
        assert_eq!(
            page.actions(),
            vec![
                &UiAction::navigate("http://localhost/boca/index.php"),
                &UiAction::fill(login::USERNAME, "system"),
                &UiAction::fill(login::PASSWORD, "boca"),
                &UiAction::click(login::SUBMIT),
                &UiAction::navigate("http://localhost/boca/index.php"),
            ]
        );
    }

    #[tokio::test]
    async fn test_logout_without_login_is_noop() {
        let mut session = Session::new(RecordingPage::new(), BocactlConfig::default());
        session.logout().await.unwrap();
        assert!(session.into_page().steps().is_empty());
    }
}
