//! CLI Commands

pub mod config;
pub mod plan;
pub mod run;
pub mod validate;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use bocactl_common::{BocactlConfig, BrowserKind, ProvisioningDocument};

use crate::output::OutputFormat;

/// Settings shared by every command
pub struct Context {
    pub config: BocactlConfig,
    pub config_path: PathBuf,
    pub format: OutputFormat,
}

/// Command-line values that take precedence over the configuration file
#[derive(Debug, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub browser: Option<BrowserKind>,
    pub headed: bool,
    pub timeout_secs: Option<u64>,
}

impl Overrides {
    pub fn apply(&self, config: &mut BocactlConfig) {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(kind) = self.browser {
            config.browser.kind = kind;
        }
        if self.headed {
            config.browser.headless = false;
        }
        if let Some(secs) = self.timeout_secs {
            config.browser.operation_timeout_secs = secs;
        }
    }
}

/// Load the configuration file (defaults when absent) and apply overrides
pub fn load_config(path: &Path, overrides: &Overrides) -> Result<BocactlConfig> {
    let mut config = BocactlConfig::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    overrides.apply(&mut config);
    config
        .check()
        .context("Invalid command-line override")?;
    Ok(config)
}

pub fn load_document(path: &Path) -> Result<ProvisioningDocument> {
    ProvisioningDocument::load(path)
        .with_context(|| format!("Failed to read provisioning document {}", path.display()))
}
