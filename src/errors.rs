//! Error types for permitbot
//!
//! Each error type has a corresponding error code for programmatic handling.
//! Business-rule denials from the lifecycle engine are not errors; they are
//! returned as [`crate::domain::TransitionDecision`] values.

use thiserror::Error;

/// Result type alias for permitbot operations
pub type Result<T> = std::result::Result<T, PermitError>;

/// Main error type for all permitbot operations
#[derive(Debug, Error)]
pub enum PermitError {
    /// Employee, permit or photo absent from the store
    #[error("Not found: {0}")]
    NotFound(String),

    /// Role or ownership check failed
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Permit is not in the status the operation needs
    #[error("Illegal transition: {0}")]
    IllegalTransition(String),

    /// The same transport file handle was already recorded
    #[error("Photo already uploaded: {0}")]
    DuplicateUpload(String),

    /// Upload batch cap reached for this cycle
    #[error("Photo limit exceeded ({limit})")]
    LimitExceeded { limit: usize },

    /// Classifier or image download failed for one photo
    #[error("Classification failed: {0}")]
    Classification(String),

    /// Annotated copy of a photo could not be drawn or written
    #[error("Annotation failed: {0}")]
    Annotation(String),

    /// Token or session is already part of another login
    #[error("Token or session is already bound to another login")]
    AuthConflict,

    /// Token does not have the employee identifier format
    #[error("Invalid token format: {0}")]
    InvalidToken(String),

    /// Malformed user input (bad phase name, empty batch)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Store unreachable or corrupted
    #[error("Store error: {0}")]
    Store(String),

    /// Invalid JSON format
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error with context
    #[error("{context}: {message}")]
    Wrapped { context: String, message: String },
}

impl PermitError {
    /// Get the error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            PermitError::NotFound(_) => "NOT_FOUND",
            PermitError::AccessDenied(_) => "ACCESS_DENIED",
            PermitError::IllegalTransition(_) => "ILLEGAL_TRANSITION",
            PermitError::DuplicateUpload(_) => "DUPLICATE_UPLOAD",
            PermitError::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            PermitError::Classification(_) => "CLASSIFICATION_ERROR",
            PermitError::Annotation(_) => "ANNOTATION_ERROR",
            PermitError::AuthConflict => "AUTH_CONFLICT",
            PermitError::InvalidToken(_) => "INVALID_TOKEN",
            PermitError::InvalidInput(_) => "INVALID_INPUT",
            PermitError::Store(_) => "STORE_ERROR",
            PermitError::InvalidJson(_) => "INVALID_JSON",
            PermitError::ConfigError(_) => "CONFIG_ERROR",
            PermitError::Io(_) => "IO_ERROR",
            PermitError::Wrapped { .. } => "WRAPPED_ERROR",
        }
    }

    /// Infrastructure faults the front end cannot act on except by retrying.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PermitError::Store(_)
                | PermitError::InvalidJson(_)
                | PermitError::ConfigError(_)
                | PermitError::Io(_)
                | PermitError::Wrapped { .. }
        )
    }

    /// Wrap an error with additional context
    pub fn wrap<E: std::fmt::Display>(error: E, context: impl Into<String>) -> Self {
        PermitError::Wrapped {
            context: context.into(),
            message: error.to_string(),
        }
    }
}

/// Convert an error to an appropriate exit code
pub fn to_exit_code(error: &PermitError) -> i32 {
    match error {
        PermitError::AccessDenied(_) | PermitError::AuthConflict => 3,
        e if e.is_fatal() => 1,
        _ => 2,
    }
}
