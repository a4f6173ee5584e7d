//! Session state for a single conversion attempt.
//!
//! [`SessionState`] is the single source of truth for the workflow: the
//! active [`ConversionMode`], the validated [`PendingFile`] (if any), the
//! last [`ConversionResult`] (if any), the in-flight flag, and the error
//! area. All transitions are pure methods on the owned state — no network,
//! no globals — so the state machine is independently testable. The
//! controller layers I/O on top.
//!
//! ## Phases
//!
//! The observable phase is derived from the state's contents, never stored:
//!
//! ```text
//! Idle ──acquire──▶ FileSelected ──submit──▶ Submitting ──▶ Succeeded ──download──▶ Idle
//!   ▲                                            │
//!   │                                            ▼
//!   └──────────reset / mode change────────── Failed ──submit (retry)──▶ Submitting
//! ```
//!
//! Exactly one submission may be in flight: `begin_submission` refuses
//! while the flag is set, so a response can never race a second submission
//! from the same session.

use crate::error::AttemptError;
use crate::mode::ConversionMode;

/// Fixed upload size limit: 16 MiB, matching the conversion service.
pub const MAX_FILE_BYTES: u64 = 16 * 1024 * 1024;

/// A file handed over by the picker or a drop event, not yet validated.
///
/// `size` is the *declared* byte size and `mime` the *declared* type, both
/// taken from the picker's metadata — validation trusts them the way a
/// browser trusts `File.size` and `File.type`, and never sniffs content.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub name: String,
    pub mime: String,
    pub size: u64,
    pub content: Vec<u8>,
}

impl FileCandidate {
    /// Candidate whose declared size is the content length.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, content: Vec<u8>) -> Self {
        let size = content.len() as u64;
        Self {
            name: name.into(),
            mime: mime.into(),
            size,
            content,
        }
    }
}

/// A validated file awaiting submission.
///
/// Owned exclusively by the session; discarded (not hidden) on reset or
/// mode change. Survives a failed submission so the user can resubmit
/// without reselecting; consumed by a successful one.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub name: String,
    pub mime: String,
    pub size: u64,
    pub content: Vec<u8>,
}

/// Successful conversion as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedArtifact {
    /// Server-side identifier of the converted file.
    pub server_file_id: String,
    /// Name the artifact should be presented under.
    pub download_name: String,
}

/// Outcome of a submission. Lives from response receipt until the next
/// reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionResult {
    Success {
        server_file_id: String,
        download_name: String,
    },
    Failure {
        message: String,
    },
}

/// Observable workflow phase, derived from the session contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No file selected.
    Idle,
    /// A valid pending file is ready to submit.
    FileSelected,
    /// A submission is in flight.
    Submitting,
    /// Conversion succeeded; a download is available.
    Succeeded,
    /// Conversion failed; resubmission is allowed.
    Failed,
}

/// The single source of truth for one conversion session.
#[derive(Debug, Default)]
pub struct SessionState {
    mode: ConversionMode,
    pending: Option<PendingFile>,
    result: Option<ConversionResult>,
    in_flight: bool,
    error: Option<AttemptError>,
}

impl SessionState {
    /// Fresh session: PdfToDocx mode, no file, no result.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ConversionMode {
        self.mode
    }

    pub fn pending(&self) -> Option<&PendingFile> {
        self.pending.as_ref()
    }

    pub fn result(&self) -> Option<&ConversionResult> {
        self.result.as_ref()
    }

    /// Content of the dedicated error area, if any.
    pub fn error(&self) -> Option<&AttemptError> {
        self.error.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if self.in_flight {
            return Phase::Submitting;
        }
        match &self.result {
            Some(ConversionResult::Success { .. }) => Phase::Succeeded,
            Some(ConversionResult::Failure { .. }) => Phase::Failed,
            None if self.pending.is_some() => Phase::FileSelected,
            None => Phase::Idle,
        }
    }

    /// Whether `begin_submission` would currently hand out a file.
    pub fn can_submit(&self) -> bool {
        self.pending.is_some() && !self.in_flight
    }

    /// Record the active mode and force a full reset.
    ///
    /// A pending file validated under the previous mode is not reusable,
    /// so the reset happens even when the same mode is re-selected.
    pub fn set_mode(&mut self, mode: ConversionMode) {
        self.mode = mode;
        self.reset();
    }

    /// Validate a candidate against the active mode and record it.
    ///
    /// Checks run in order: declared MIME type first, declared size second.
    /// On rejection the session returns to `Idle` — any previous pending
    /// file and result are discarded and the error area is set. On success
    /// the candidate becomes the pending file and the error area clears.
    pub fn accept_candidate(
        &mut self,
        candidate: FileCandidate,
        max_bytes: u64,
    ) -> Result<(), AttemptError> {
        if !self.mode.accepts(&candidate.mime) {
            return Err(self.reject(AttemptError::wrong_type(self.mode.rejection_message())));
        }
        if candidate.size > max_bytes {
            return Err(self.reject(AttemptError::oversize()));
        }

        self.result = None;
        self.error = None;
        self.pending = Some(PendingFile {
            name: candidate.name,
            mime: candidate.mime,
            size: candidate.size,
            content: candidate.content,
        });
        Ok(())
    }

    fn reject(&mut self, err: AttemptError) -> AttemptError {
        self.pending = None;
        self.result = None;
        self.error = Some(err.clone());
        err
    }

    /// Start a submission: flip the in-flight flag and hand out a copy of
    /// the pending file for upload.
    ///
    /// Returns `None` — a no-op — unless a file is present and nothing is
    /// in flight. Any previous result and error are cleared; a fresh
    /// attempt starts with a clean slate.
    pub fn begin_submission(&mut self) -> Option<PendingFile> {
        if self.in_flight {
            return None;
        }
        let file = self.pending.as_ref()?.clone();
        self.in_flight = true;
        self.result = None;
        self.error = None;
        Some(file)
    }

    /// Record the outcome of the in-flight submission.
    ///
    /// Success consumes the pending file and stores the artifact handle
    /// unaltered. Failure keeps the pending file (resubmission allowed)
    /// and mirrors the message into the error area.
    pub fn finish_submission(&mut self, outcome: Result<ConvertedArtifact, AttemptError>) {
        self.in_flight = false;
        match outcome {
            Ok(artifact) => {
                self.pending = None;
                self.error = None;
                self.result = Some(ConversionResult::Success {
                    server_file_id: artifact.server_file_id,
                    download_name: artifact.download_name,
                });
            }
            Err(err) => {
                self.result = Some(ConversionResult::Failure {
                    message: err.user_message().to_string(),
                });
                self.error = Some(err);
            }
        }
    }

    /// Take the download handle and clear the session back to `Idle`.
    ///
    /// Returns `None` unless the session is in `Succeeded`. The mode is
    /// preserved; everything else is discarded immediately — the caller
    /// performs the actual fetch and cleanup after the state is already
    /// clean.
    pub fn take_download(&mut self) -> Option<ConvertedArtifact> {
        match self.result.take() {
            Some(ConversionResult::Success {
                server_file_id,
                download_name,
            }) => {
                self.reset();
                Some(ConvertedArtifact {
                    server_file_id,
                    download_name,
                })
            }
            other => {
                self.result = other;
                None
            }
        }
    }

    /// Clear the pending file, result, and error area. Callable from any
    /// state; the mode is preserved.
    pub fn reset(&mut self) {
        self.pending = None;
        self.result = None;
        self.error = None;
    }
}
