//! Error types for browser automation

use thiserror::Error;

use bocactl_common::ValidationError;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Node.js not found ({0}). Install Node.js and run: npm install playwright")]
    NodeNotFound(String),

    #[error("Playwright bridge error: {0}")]
    Bridge(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Download via '{0}' did not complete in time")]
    DownloadTimeout(String),

    #[error("Timeout after {seconds}s waiting for: {what}")]
    Timeout { what: String, seconds: u64 },

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Run {run}: status index '{value}' is outside the judgment table")]
    StatusOutOfRange { run: String, value: String },

    #[error("Run {run}: {field} '{value}' is not a plain directory name")]
    UnsafePathSegment {
        run: String,
        field: &'static str,
        value: String,
    },

    #[error("{operation} failed for {entity}: {source}")]
    OperationFailed {
        operation: String,
        entity: String,
        #[source]
        source: Box<AutomationError>,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Common(#[from] bocactl_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AutomationError {
    /// Attach the operation and entity being processed, for manual resumption
    pub fn context(self, operation: impl Into<String>, entity: impl Into<String>) -> Self {
        match self {
            // Already located, or raised before any UI work.
            e @ (AutomationError::OperationFailed { .. }
            | AutomationError::Validation(_)
            | AutomationError::Common(_)) => e,
            other => AutomationError::OperationFailed {
                operation: operation.into(),
                entity: entity.into(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, skipping operation context
    pub fn root(&self) -> &AutomationError {
        match self {
            AutomationError::OperationFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type AutomationResult<T> = Result<T, AutomationError>;

/// Extension for attaching operation context to results
pub trait ResultExt<T> {
    fn context(self, operation: &str, entity: impl Into<String>) -> AutomationResult<T>;
}

impl<T> ResultExt<T> for AutomationResult<T> {
    fn context(self, operation: &str, entity: impl Into<String>) -> AutomationResult<T> {
        self.map_err(|e| e.context(operation, entity))
    }
}
