// gtsetup-common/src/error.rs
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SetupError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Permission Denied: {0}")]
    PermissionDenied(String),

    #[error("Source Missing: expected local file '{0}' was not produced")]
    SourceMissing(String),

    #[error("DownloadError: Failed to download '{0}' from '{1}': {2}")]
    DownloadError(String, String, String),

    #[error("HttpError: {0}")]
    HttpError(String),

    #[error("Installation Error: {0}")]
    InstallError(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error("Failed to execute command: {0}")]
    CommandExecError(String),

    #[error("{step} failed: {source}")]
    StepFailed {
        step: String,
        source: Box<SetupError>,
    },
}

impl SetupError {
    /// Attributes this error to a named pipeline step.
    pub fn in_step(self, step: impl ToString) -> Self {
        SetupError::StepFailed {
            step: step.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through step attribution.
    pub fn root(&self) -> &SetupError {
        match self {
            SetupError::StepFailed { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<std::io::Error> for SetupError {
    fn from(err: std::io::Error) -> Self {
        SetupError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for SetupError {
    fn from(err: reqwest::Error) -> Self {
        SetupError::Http(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, SetupError>;
