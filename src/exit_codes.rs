//! Exit code constants for the promptly CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid state, unknown prompt)
//! - 2: Validation failure (missing variables, malformed credentials, bad config)
//! - 3: Authentication required or identity store failure
//! - 4: Generation service failure
//! - 5: Storage failure (device persistence, prompt library files)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid state, or missing prompt.
pub const USER_ERROR: i32 = 1;

/// Validation failure: required variable missing, credentials rejected locally.
pub const VALIDATION_FAILURE: i32 = 2;

/// Authentication required, or the identity store reported an error.
pub const AUTH_FAILURE: i32 = 3;

/// The text generation service failed and no fallback was used.
pub const GENERATION_FAILURE: i32 = 4;

/// Reading or writing local state failed.
pub const STORAGE_FAILURE: i32 = 5;
