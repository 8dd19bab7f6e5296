//! Error handling for the ATS resume checker

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtsCheckerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Invalid ATS profile: {0}")]
    InvalidProfile(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding generation error: {0}")]
    Embedding(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),
}

impl AtsCheckerError {
    /// Whether the error ends the analysis run. A missing optional
    /// dependency only switches the pipeline into degraded mode.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AtsCheckerError::MissingDependency(_))
    }
}

pub type Result<T> = std::result::Result<T, AtsCheckerError>;

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for AtsCheckerError {
    fn from(err: anyhow::Error) -> Self {
        AtsCheckerError::AnalysisFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_missing_dependency_is_non_fatal() {
        assert!(!AtsCheckerError::MissingDependency("tesseract".to_string()).is_fatal());
        assert!(AtsCheckerError::UnsupportedFormat("png".to_string()).is_fatal());
        assert!(AtsCheckerError::ExtractionFailed("corrupt".to_string()).is_fatal());
        assert!(AtsCheckerError::InvalidProfile("nope".to_string()).is_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = AtsCheckerError::InvalidProfile("unknown-ats".to_string());
        assert_eq!(err.to_string(), "Invalid ATS profile: unknown-ats");
    }
}
