//! The transfer controller: file acquisition through download and cleanup.
//!
//! [`TransferController`] owns the [`SessionState`] and drives it through
//! the workflow in response to discrete triggers — a selection or drop, a
//! submit, a download, a mode change. Each operation takes `&mut self`, so
//! there is exactly one active handler at a time and no locking anywhere:
//! the state is only ever mutated between suspension points.
//!
//! The two suspension points are the conversion call (no timeout — a hung
//! service leaves the session in `Submitting` until the transport gives
//! up) and the deferred cleanup timer. The cleanup task is spawned
//! detached: fire-and-forget, not cancellable, its outcome logged only.

use crate::config::WorkflowConfig;
use crate::error::{AttemptError, FerryError};
use crate::mode::ConversionMode;
use crate::service::{ConversionService, ConvertRequest};
use crate::session::{ConversionResult, FileCandidate, SessionState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Owns one conversion session end to end.
pub struct TransferController {
    state: SessionState,
    service: Arc<dyn ConversionService>,
    config: WorkflowConfig,
}

impl TransferController {
    /// New controller in the initial state: PdfToDocx mode, no file.
    pub fn new(service: Arc<dyn ConversionService>, config: WorkflowConfig) -> Self {
        Self {
            state: SessionState::new(),
            service,
            config,
        }
    }

    /// The session's current state, for rendering.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mode(&self) -> ConversionMode {
        self.state.mode()
    }

    /// Select the conversion direction.
    ///
    /// Forces a full reset of any pending file and result — a file
    /// validated under the previous mode is not reusable.
    pub fn set_mode(&mut self, mode: ConversionMode) {
        self.state.set_mode(mode);
        debug!(?mode, "conversion mode selected");
        if let Some(cb) = &self.config.event_callback {
            cb.on_mode_changed(mode, mode.prompt());
        }
    }

    /// Take a batch of candidates from the picker or a drop event.
    ///
    /// Both input sources funnel here; there is no behavioural difference
    /// between them. Only the first file is considered — extras are
    /// silently ignored. An empty batch is a no-op.
    pub fn acquire_files(&mut self, candidates: Vec<FileCandidate>) -> Result<(), AttemptError> {
        let mut candidates = candidates.into_iter();
        let Some(first) = candidates.next() else {
            debug!("empty candidate batch ignored");
            return Ok(());
        };
        let extra = candidates.count();
        if extra > 0 {
            debug!(extra, "ignoring extra files in multi-file selection");
        }

        let name = first.name.clone();
        let size = first.size;
        match self.state.accept_candidate(first, self.config.max_file_bytes) {
            Ok(()) => {
                info!(file = %name, size, "file accepted");
                if let Some(cb) = &self.config.event_callback {
                    cb.on_file_accepted(&name, size);
                }
                Ok(())
            }
            Err(err) => {
                info!(file = %name, size, reason = %err, "file rejected");
                if let Some(cb) = &self.config.event_callback {
                    cb.on_file_rejected(err.user_message());
                }
                Err(err)
            }
        }
    }

    /// Submit the pending file to the conversion endpoint.
    ///
    /// A no-op unless a valid pending file is present and nothing is in
    /// flight — that is, in `FileSelected` or in `Failed` (the allowed
    /// resubmission). Returns the stored outcome, or `None` when nothing
    /// was submitted.
    pub async fn submit(&mut self) -> Option<&ConversionResult> {
        let mode = self.state.mode();
        let Some(file) = self.state.begin_submission() else {
            debug!(phase = ?self.state.phase(), "submit ignored — nothing submittable");
            return None;
        };

        info!(
            file = %file.name,
            conversion_type = mode.conversion_type(),
            "submitting file for conversion"
        );
        if let Some(cb) = &self.config.event_callback {
            cb.on_submit_started(mode.busy_text());
        }

        let outcome = self
            .service
            .convert(ConvertRequest {
                conversion_type: mode.conversion_type(),
                file_name: file.name,
                mime: file.mime,
                content: file.content,
            })
            .await;

        match &outcome {
            Ok(artifact) => {
                info!(
                    file_id = %artifact.server_file_id,
                    download_name = %artifact.download_name,
                    "conversion succeeded"
                );
                if let Some(cb) = &self.config.event_callback {
                    cb.on_conversion_succeeded(&artifact.download_name);
                }
            }
            Err(err) => {
                warn!(reason = %err, "conversion failed");
                if let Some(cb) = &self.config.event_callback {
                    cb.on_conversion_failed(err.user_message());
                }
            }
        }

        self.state.finish_submission(outcome);
        self.state.result()
    }

    /// Download the converted artifact and finish the session.
    ///
    /// Valid only in `Succeeded`; otherwise a no-op returning `Ok(None)`.
    /// Scheduling of the deferred cleanup call and the reset to `Idle`
    /// happen *before* the artifact fetch, so they are unconditional —
    /// exactly one cleanup fires per download, whatever the fetch does.
    pub async fn download(&mut self) -> Result<Option<PathBuf>, FerryError> {
        let Some(artifact) = self.state.take_download() else {
            debug!(phase = ?self.state.phase(), "download ignored — no converted file");
            return Ok(None);
        };

        self.schedule_cleanup(artifact.server_file_id.clone());
        if let Some(cb) = &self.config.event_callback {
            cb.on_session_reset();
        }

        let bytes = self.service.fetch_artifact(&artifact.server_file_id).await?;
        let path = self.write_artifact(&artifact.download_name, &bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "artifact downloaded");
        if let Some(cb) = &self.config.event_callback {
            cb.on_download_finished(&path);
        }
        Ok(Some(path))
    }

    /// Clear the session back to `Idle`. Callable from any state; the
    /// mode is preserved.
    pub fn reset(&mut self) {
        self.state.reset();
        if let Some(cb) = &self.config.event_callback {
            cb.on_session_reset();
        }
    }

    /// Spawn the deferred, best-effort cleanup call.
    ///
    /// Detached on purpose: nothing awaits it and nothing can cancel it.
    /// If the user starts a new session before the delay elapses, cleanup
    /// for the previous file id still fires.
    fn schedule_cleanup(&self, file_id: String) {
        let service = Arc::clone(&self.service);
        let delay = Duration::from_millis(self.config.cleanup_delay_ms);
        debug!(file_id = %file_id, delay_ms = self.config.cleanup_delay_ms, "cleanup scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match service.cleanup(&file_id).await {
                Ok(true) => debug!(file_id = %file_id, "server copy removed"),
                Ok(false) => warn!(file_id = %file_id, "service declined to remove its copy"),
                Err(err) => warn!(error = %err, "cleanup request failed"),
            }
        });
    }

    /// Write the artifact under its download name, atomically.
    async fn write_artifact(&self, download_name: &str, bytes: &[u8]) -> Result<PathBuf, FerryError> {
        // The name comes from the service; keep only its final component.
        let safe_name = Path::new(download_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "converted".to_string());
        let path = self.config.output_dir.join(&safe_name);

        let wrap = |source: std::io::Error| FerryError::ArtifactWrite {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(wrap)?;

        // Write to a temp name, then rename, to never leave a partial file
        // under the final name.
        let tmp_path = path.with_file_name(format!("{safe_name}.part"));
        tokio::fs::write(&tmp_path, bytes).await.map_err(wrap)?;
        tokio::fs::rename(&tmp_path, &path).await.map_err(wrap)?;

        Ok(path)
    }
}
