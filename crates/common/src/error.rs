//! Error types for bocactl

use serde::Serialize;
use std::fmt;

use thiserror::Error;

/// Result type alias using the bocactl common Error
pub type Result<T> = std::result::Result<T, Error>;

/// bocactl error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{operation}: missing required identifier '{field}'")]
    MissingIdentifier {
        operation: &'static str,
        field: &'static str,
    },

    #[error("Invalid timestamp '{value}': expected yyyy-MM-dd HH:mm")]
    InvalidTimestamp { value: String },

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A single field that failed its contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Dotted path into the configuration document, e.g. `contest.sites[1].name`
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every violated field of a document for one operation
#[derive(Error, Debug, Clone)]
pub struct ValidationError {
    pub operation: String,
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(operation: impl Into<String>, violations: Vec<Violation>) -> Self {
        Self {
            operation: operation.into(),
            violations,
        }
    }

    /// Shorthand for a failure with exactly one violated field
    pub fn single(
        operation: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(operation, vec![Violation::new(path, message)])
    }

    /// Whether any violation concerns the given path
    pub fn mentions(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "configuration is invalid for '{}' ({} problem{})",
            self.operation,
            self.violations.len(),
            if self.violations.len() == 1 { "" } else { "s" }
        )?;
        for violation in &self.violations {
            write!(f, "\n  - {}", violation)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_lists_every_violation() {
        let err = ValidationError::new(
            "create-contest",
            vec![
                Violation::new("contest.setup.name", "missing"),
                Violation::new("contest.problems[0].colorCode", "not a hex color"),
            ],
        );
        let text = err.to_string();
        assert!(text.contains("2 problems"));
        assert!(text.contains("contest.setup.name: missing"));
        assert!(text.contains("contest.problems[0].colorCode: not a hex color"));
    }

    #[test]
    fn test_missing_identifier_message() {
        let err = Error::MissingIdentifier {
            operation: "clear-contest",
            field: "contest.setup.id",
        };
        assert_eq!(
            err.to_string(),
            "clear-contest: missing required identifier 'contest.setup.id'"
        );
    }
}
