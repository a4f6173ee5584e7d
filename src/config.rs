//! Configuration for the conversion workflow.
//!
//! All controller behaviour is tuned through [`WorkflowConfig`], built via
//! its [`WorkflowConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to map CLI flags onto it and to share one config between the
//! controller and the HTTP service layer.

use crate::error::FerryError;
use crate::events::EventCallback;
use crate::session::MAX_FILE_BYTES;
use std::fmt;
use std::path::PathBuf;

/// Fixed delay before the deferred cleanup call fires, in milliseconds.
pub const DEFAULT_CLEANUP_DELAY_MS: u64 = 3000;

/// Default address of the conversion service.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5000";

/// Configuration for a conversion workflow.
///
/// Built via [`WorkflowConfig::builder()`] or using
/// [`WorkflowConfig::default()`].
///
/// # Example
/// ```rust
/// use docferry::WorkflowConfig;
///
/// let config = WorkflowConfig::builder()
///     .service_base_url("http://converter.internal:5000")
///     .output_dir("downloads")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct WorkflowConfig {
    /// Base URL of the conversion service. Default: `http://localhost:5000`.
    pub service_base_url: String,

    /// Upload size limit in bytes. Default: 16 MiB.
    ///
    /// Matches the service's own request cap; raising it here only moves
    /// the rejection from the client to the service.
    pub max_file_bytes: u64,

    /// Delay before the post-download cleanup call, in milliseconds.
    /// Default: 3000.
    ///
    /// The cleanup task is fire-and-forget once scheduled: it cannot be
    /// cancelled, and starting a new session before it fires does not
    /// stop it.
    pub cleanup_delay_ms: u64,

    /// Timeout for fetching the converted artifact, in seconds.
    /// Default: 120.
    ///
    /// Only the artifact fetch is bounded. The conversion request itself
    /// deliberately has no timeout — a hung call leaves the session in
    /// `Submitting` until the transport errors out.
    pub download_timeout_secs: u64,

    /// Directory downloaded artifacts are written into. Default: `.`.
    pub output_dir: PathBuf,

    /// Receiver for UI-facing workflow events. Default: none.
    pub event_callback: Option<EventCallback>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            service_base_url: DEFAULT_SERVICE_URL.to_string(),
            max_file_bytes: MAX_FILE_BYTES,
            cleanup_delay_ms: DEFAULT_CLEANUP_DELAY_MS,
            download_timeout_secs: 120,
            output_dir: PathBuf::from("."),
            event_callback: None,
        }
    }
}

impl fmt::Debug for WorkflowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowConfig")
            .field("service_base_url", &self.service_base_url)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("cleanup_delay_ms", &self.cleanup_delay_ms)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("output_dir", &self.output_dir)
            .field(
                "event_callback",
                &self.event_callback.as_ref().map(|_| "<dyn WorkflowEventCallback>"),
            )
            .finish()
    }
}

impl WorkflowConfig {
    /// Create a new builder for `WorkflowConfig`.
    pub fn builder() -> WorkflowConfigBuilder {
        WorkflowConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`WorkflowConfig`].
#[derive(Debug)]
pub struct WorkflowConfigBuilder {
    config: WorkflowConfig,
}

impl WorkflowConfigBuilder {
    pub fn service_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.service_base_url = url.into();
        self
    }

    pub fn max_file_bytes(mut self, bytes: u64) -> Self {
        self.config.max_file_bytes = bytes;
        self
    }

    pub fn cleanup_delay_ms(mut self, ms: u64) -> Self {
        self.config.cleanup_delay_ms = ms;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn event_callback(mut self, cb: EventCallback) -> Self {
        self.config.event_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<WorkflowConfig, FerryError> {
        let c = &self.config;
        let url = c.service_base_url.trim();
        if url.is_empty() {
            return Err(FerryError::InvalidConfig(
                "service base URL must not be empty".into(),
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(FerryError::InvalidConfig(format!(
                "service base URL must be http(s), got '{url}'"
            )));
        }
        if c.max_file_bytes == 0 {
            return Err(FerryError::InvalidConfig(
                "max file size must be ≥ 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}
