//! Error types for the docferry library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`FerryError`] — **Fatal to the operation**: bad configuration, an HTTP
//!   client that cannot be built, a downloaded artifact that cannot be
//!   written. Returned as `Err(FerryError)` from setup and download paths.
//!
//! * [`AttemptError`] — **Recoverable**: a single conversion attempt was
//!   rejected (wrong file type, oversize file, service or connection
//!   failure). Stored in the session's error area so the user can pick
//!   another file or resubmit; never fatal to the session.
//!
//! Cleanup failures get their own [`CleanupError`]: the deferred cleanup
//! call is best-effort, so its errors are logged and never surfaced.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docferry library.
///
/// Per-attempt failures use [`AttemptError`] and live in
/// [`crate::session::SessionState`] rather than propagating here.
#[derive(Debug, Error)]
pub enum FerryError {
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The underlying HTTP client could not be constructed.
    #[error("failed to initialise HTTP client: {0}")]
    ClientInit(String),

    /// The converted artifact could not be fetched from the file server.
    #[error("failed to fetch converted file '{file_id}': {reason}")]
    ArtifactFetch { file_id: String, reason: String },

    /// The downloaded artifact could not be written to disk.
    #[error("failed to write downloaded file '{path}': {source}")]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A recoverable failure of a single conversion attempt.
///
/// Carries exactly one human-readable message, shown in the dedicated
/// error area. The variant records where in the attempt the failure
/// happened; the user's way out is the same for all three — choose a new
/// file or resubmit.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum AttemptError {
    /// Rejected locally, before any network call.
    #[error("{message}")]
    Validation { message: String },

    /// The conversion endpoint explicitly reported failure.
    #[error("{message}")]
    Service { message: String },

    /// Network failure or a response that could not be parsed.
    #[error("{message}")]
    Transport { message: String },
}

impl AttemptError {
    /// Size rejection, fixed message regardless of the configured limit.
    pub fn oversize() -> Self {
        AttemptError::Validation {
            message: "file must not exceed 16MB".to_string(),
        }
    }

    /// Type rejection with the active mode's message.
    pub fn wrong_type(message: impl Into<String>) -> Self {
        AttemptError::Validation {
            message: message.into(),
        }
    }

    /// Explicit service failure, with the generic fallback when the
    /// service sent no message of its own.
    pub fn conversion_failed(detail: Option<String>) -> Self {
        AttemptError::Service {
            message: detail.unwrap_or_else(|| "error converting the file".to_string()),
        }
    }

    /// Transport-level failure. Always the generic message — transport
    /// details go to the log, not the user.
    pub fn connection() -> Self {
        AttemptError::Transport {
            message: "connection error, please try again".to_string(),
        }
    }

    /// The single user-facing message for the error area.
    pub fn user_message(&self) -> &str {
        match self {
            AttemptError::Validation { message }
            | AttemptError::Service { message }
            | AttemptError::Transport { message } => message,
        }
    }
}

/// Failure of the best-effort cleanup call.
///
/// Observed only for diagnostic logging; never stored in session state and
/// never shown to the user.
#[derive(Debug, Error)]
#[error("cleanup request for '{file_id}' failed: {reason}")]
pub struct CleanupError {
    pub file_id: String,
    pub reason: String,
}
