//! Error types for the tour wizard.

use std::time::Duration;

use crate::wizard::step::WizardStep;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flag storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors from the tour backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No bearer token available (missing or expired)")]
    Unauthenticated,

    #[error("No draft tour found on the backend")]
    NoDraft,

    #[error("Request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("Gave up on {endpoint} after {attempts} attempts ({elapsed:?}): {last}")]
    RetriesExhausted {
        endpoint: String,
        attempts: u32,
        elapsed: Duration,
        last: String,
    },
}

impl ApiError {
    /// Whether retrying the same request could succeed.
    ///
    /// Transport failures and 5xx/429 responses are transient; auth, 4xx and
    /// decoding failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Wizard flow errors.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Unknown wizard step: {0}")]
    UnknownStep(String),

    #[error("Step {step} is not available yet, continue at {redirect_to}")]
    StepLocked {
        step: WizardStep,
        redirect_to: WizardStep,
    },

    #[error("No draft tour loaded")]
    DraftNotLoaded,

    #[error("Destination index {index} out of range (have {len})")]
    DestinationOutOfRange { index: usize, len: usize },

    #[error("Validation failed for {step}: {} field error(s)", .errors.len())]
    Validation {
        step: WizardStep,
        errors: Vec<FieldError>,
    },

    #[error("Submitting {step} failed: {source}")]
    Submission {
        step: WizardStep,
        #[source]
        source: ApiError,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// A single inline validation message for a form field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FieldError {
    /// Field path, e.g. `entries[1].city`.
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
