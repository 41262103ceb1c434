//! Error handling for the resume tailor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TailorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("PDF extraction failed: {0}")]
    PdfExtraction(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Oracle request failed: {0}")]
    Oracle(String),

    #[error("Oracle API error (status {status}): {message}")]
    OracleApi { status: u16, message: String },

    #[error("Oracle response violates the {task} contract: {reason}")]
    OracleContract { task: String, reason: String },

    #[error("Identity leak: placeholder survived in {field}")]
    IdentityLeak { field: String },

    #[error("Rendering error: {0}")]
    Rendering(String),

    #[error("Session error: {0}")]
    Session(String),
}

pub type Result<T> = std::result::Result<T, TailorError>;

impl From<anyhow::Error> for TailorError {
    fn from(err: anyhow::Error) -> Self {
        TailorError::Session(err.to_string())
    }
}

impl From<reqwest::Error> for TailorError {
    fn from(err: reqwest::Error) -> Self {
        TailorError::Oracle(err.to_string())
    }
}

impl TailorError {
    /// Shorthand for a contract violation on a given oracle task.
    pub fn contract(task: impl Into<String>, reason: impl Into<String>) -> Self {
        TailorError::OracleContract {
            task: task.into(),
            reason: reason.into(),
        }
    }
}
