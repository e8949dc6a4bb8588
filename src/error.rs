//! Error types for promptly.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use crate::template::TemplateError;
use thiserror::Error;

/// Main error type for promptly operations.
///
/// Every variant leaves the session controller in the state it had before the
/// failed operation; callers can simply retry.
#[derive(Error, Debug)]
pub enum PromptlyError {
    /// User provided invalid arguments or the system is in an invalid state.
    #[error("{0}")]
    UserError(String),

    /// Input was rejected before any collaborator was called.
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// The action needs a signed-in or onboarded user.
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    /// The identity/profile store reported an error.
    #[error("Identity store error: {0}")]
    IdentityError(String),

    /// The text generation service failed.
    #[error("Generation failed: {0}")]
    GenerationError(String),

    /// The free-tier prompt allowance is used up.
    #[error("Prompt limit reached ({used}/{limit}); upgrade to PRO for unlimited prompts")]
    QuotaExceeded { used: u32, limit: u32 },

    /// A prompt or record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Local state could not be read or written.
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl PromptlyError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            PromptlyError::UserError(_) | PromptlyError::NotFound(_) => exit_codes::USER_ERROR,
            PromptlyError::ValidationError(_) | PromptlyError::QuotaExceeded { .. } => {
                exit_codes::VALIDATION_FAILURE
            }
            PromptlyError::AuthRequired(_) | PromptlyError::IdentityError(_) => {
                exit_codes::AUTH_FAILURE
            }
            PromptlyError::GenerationError(_) => exit_codes::GENERATION_FAILURE,
            PromptlyError::StorageError(_) => exit_codes::STORAGE_FAILURE,
        }
    }
}

impl From<TemplateError> for PromptlyError {
    fn from(err: TemplateError) -> Self {
        PromptlyError::ValidationError(err.to_string())
    }
}

/// Result type alias for promptly operations.
pub type Result<T> = std::result::Result<T, PromptlyError>;
