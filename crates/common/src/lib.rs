//! bocactl Common Library
//!
//! Provisioning document model, per-operation validation, contest time
//! arithmetic and tool configuration shared by the automation engine and the
//! CLI.

pub mod config;
pub mod document;
pub mod duration;
pub mod error;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::{BocactlConfig, BrowserKind, HarvestLayout, PagePaths};
pub use document::ProvisioningDocument;
pub use duration::{date_fields, minutes, DateFields};
pub use error::{Error, Result, ValidationError, Violation};
pub use types::*;
pub use validation::{validate, Contract, Operation};

/// bocactl version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "bocactl.toml";
