//! Event-callback trait for UI-facing workflow outputs.
//!
//! Inject an [`Arc<dyn WorkflowEventCallback>`] via
//! [`crate::config::WorkflowConfigBuilder::event_callback`] to receive the
//! controller's user-facing outputs as they happen: the prompt to show, the
//! file name to display, the error-area message, the busy banner.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a terminal spinner, a GUI binding, or a log —
//! without the library knowing anything about how the host application
//! renders them. Each method corresponds to one named trigger of the
//! workflow; each trigger performs exactly one state transition, so there
//! is no implicit coupling between handlers.

use std::path::Path;
use std::sync::Arc;

/// Called by the transfer controller as the session moves through its
/// phases.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`; the
/// controller itself is single-threaded, but the callback is shared behind
/// an `Arc` in the configuration.
pub trait WorkflowEventCallback: Send + Sync {
    /// The user picked a conversion direction; `prompt` is the new
    /// waiting-for-file text. Fired after the implied session reset.
    fn on_mode_changed(&self, mode: crate::mode::ConversionMode, prompt: &str) {
        let _ = (mode, prompt);
    }

    /// A candidate passed validation and is ready to submit.
    fn on_file_accepted(&self, name: &str, size: u64) {
        let _ = (name, size);
    }

    /// A candidate was rejected; `message` is the error-area text.
    fn on_file_rejected(&self, message: &str) {
        let _ = message;
    }

    /// A submission went in flight; `status` is the busy-banner text.
    fn on_submit_started(&self, status: &str) {
        let _ = status;
    }

    /// The service converted the file; a download named `download_name`
    /// is now available.
    fn on_conversion_succeeded(&self, download_name: &str) {
        let _ = download_name;
    }

    /// The submission failed; `message` is the error-area text.
    /// Resubmission is re-enabled.
    fn on_conversion_failed(&self, message: &str) {
        let _ = message;
    }

    /// The artifact was fetched and written to `path`.
    fn on_download_finished(&self, path: &Path) {
        let _ = path;
    }

    /// The session returned to `Idle` (reset, mode change, or completed
    /// download).
    fn on_session_reset(&self) {}
}

/// A no-op implementation for callers that don't need workflow events.
///
/// This is the default when no callback is configured.
pub struct NoopEventCallback;

impl WorkflowEventCallback for NoopEventCallback {}

/// Convenience alias matching the type stored in
/// [`crate::config::WorkflowConfig`].
pub type EventCallback = Arc<dyn WorkflowEventCallback>;
