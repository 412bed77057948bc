//! Tool configuration (`bocactl.toml`)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::error::{Error, Result};

/// bocactl configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BocactlConfig {
    /// Root URL of the contest server, e.g. `http://localhost/boca`
    pub base_url: String,

    /// Browser driving configuration
    pub browser: BrowserConfig,

    /// Page locations relative to `base_url`
    pub pages: PagePaths,

    /// Run list and run detail layout used by the harvester
    pub harvest: HarvestLayout,
}

impl Default for BocactlConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/boca".to_string(),
            browser: BrowserConfig::default(),
            pages: PagePaths::default(),
            harvest: HarvestLayout::default(),
        }
    }
}

/// Browser engine used by the Playwright bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(BrowserKind::Chromium),
            "firefox" => Ok(BrowserKind::Firefox),
            "webkit" | "safari" => Ok(BrowserKind::Webkit),
            other => Err(Error::InvalidConfig(format!("unknown browser '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub kind: BrowserKind,

    pub headless: bool,

    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Upper bound for any single page operation (navigation, click, download)
    pub operation_timeout_secs: u64,

    /// Node.js executable running the Playwright bridge
    pub node_binary: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            kind: BrowserKind::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            operation_timeout_secs: 30,
            node_binary: "node".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PagePaths {
    pub login: String,
    pub logout: String,
    pub contest: String,
    pub site: String,
    pub language: String,
    pub problem: String,
    pub user: String,
    pub runs: String,
}

impl Default for PagePaths {
    fn default() -> Self {
        Self {
            login: "index.php".to_string(),
            logout: "index.php".to_string(),
            contest: "system/contest.php".to_string(),
            site: "admin/site.php".to_string(),
            language: "admin/language.php".to_string(),
            problem: "admin/problem.php".to_string(),
            user: "admin/user.php".to_string(),
            runs: "admin/run.php".to_string(),
        }
    }
}

/// Where the harvester finds things on the run pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestLayout {
    /// Rows of the run list table
    pub row_selector: String,

    /// Zero-based cell holding the run number (and its link)
    pub run_column: usize,
    pub user_column: usize,
    pub problem_column: usize,

    /// Select whose value is the status index on the run detail page
    pub status_selector: String,

    pub code_link: String,
    pub stdout_link: String,
    pub stderr_link: String,
}

impl Default for HarvestLayout {
    fn default() -> Self {
        Self {
            row_selector: "table tr".to_string(),
            run_column: 0,
            user_column: 2,
            problem_column: 4,
            status_selector: "select[name=\"answer\"]".to_string(),
            code_link: "a[href*=\"filedownload\"]:not(:has-text(\"stdout\")):not(:has-text(\"stderr\"))"
                .to_string(),
            stdout_link: "a:has-text(\"stdout\")".to_string(),
            stderr_link: "a:has-text(\"stderr\")".to_string(),
        }
    }
}

impl BocactlConfig {
    /// Load configuration from file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.check()?;
            debug!("Loaded configuration from {}", path.display());
            Ok(config)
        } else {
            debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the browser bridge cannot work with
    pub fn check(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::InvalidConfig(format!(
                "base_url must be an http(s) URL, found '{}'",
                self.base_url
            )));
        }
        if self.browser.operation_timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "browser.operation_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Absolute URL of a page path
    pub fn page_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BocactlConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.browser.operation_timeout_secs, 30);
        assert_eq!(config.pages.runs, "admin/run.php");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bocactl.toml");
        std::fs::write(
            &path,
            "base_url = \"https://contest.example.org/boca/\"\n\n[browser]\nkind = \"firefox\"\nheadless = false\n",
        )
        .unwrap();

        let config = BocactlConfig::load(&path).unwrap();
        assert_eq!(config.browser.kind, BrowserKind::Firefox);
        assert!(!config.browser.headless);
        assert_eq!(config.harvest.user_column, 2);
        assert_eq!(
            config.page_url(&config.pages.contest),
            "https://contest.example.org/boca/system/contest.php"
        );
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bocactl.toml");
        let mut config = BocactlConfig::default();
        config.harvest.problem_column = 5;
        config.save(&path).unwrap();

        let loaded = BocactlConfig::load(&path).unwrap();
        assert_eq!(loaded.harvest.problem_column, 5);
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bocactl.toml");
        std::fs::write(&path, "base_url = \"localhost/boca\"\n").unwrap();
        assert!(matches!(
            BocactlConfig::load(&path),
            Err(Error::InvalidConfig(_))
        ));
    }
}
