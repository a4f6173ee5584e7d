//! # docferry
//!
//! Client-side workflow controller for a remote PDF ⇄ Word conversion
//! service.
//!
//! ## Why this crate?
//!
//! The conversion itself happens on a remote service; everything that can
//! go wrong on the way there — the wrong file type, an oversize upload, a
//! failed conversion, a dropped connection, a server copy left behind —
//! is the client's problem. This crate owns that problem: it validates a
//! single document against the selected conversion direction, submits it,
//! tracks the attempt through an explicit state machine, and manages
//! download and deferred cleanup of the result.
//!
//! ## Workflow Overview
//!
//! ```text
//! file (pick or drop)
//!  │
//!  ├─ 1. Mode      PDF→DOCX or DOCX→PDF selects the accepted types
//!  ├─ 2. Validate  declared MIME, then 16 MiB size cap (local, no network)
//!  ├─ 3. Submit    multipart upload to the conversion endpoint
//!  ├─ 4. Outcome   Succeeded (download available) or Failed (retry allowed)
//!  ├─ 5. Download  fetch artifact, write under its download name
//!  └─ 6. Cleanup   deferred fire-and-forget delete of the server copy
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docferry::{
//!     ConversionMode, FileCandidate, HttpConversionService, TransferController,
//!     WorkflowConfig,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WorkflowConfig::builder()
//!         .service_base_url("http://localhost:5000")
//!         .build()?;
//!     let service = Arc::new(HttpConversionService::from_config(&config)?);
//!     let mut controller = TransferController::new(service, config);
//!
//!     controller.set_mode(ConversionMode::PdfToDocx);
//!     let bytes = std::fs::read("report.pdf")?;
//!     controller.acquire_files(vec![FileCandidate::new(
//!         "report.pdf",
//!         "application/pdf",
//!         bytes,
//!     )])?;
//!     controller.submit().await;
//!     if let Some(path) = controller.download().await? {
//!         println!("saved to {}", path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docferry` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only
//! deps:
//! ```toml
//! docferry = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod mode;
pub mod service;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{WorkflowConfig, WorkflowConfigBuilder, DEFAULT_CLEANUP_DELAY_MS, DEFAULT_SERVICE_URL};
pub use controller::TransferController;
pub use error::{AttemptError, CleanupError, FerryError};
pub use events::{EventCallback, NoopEventCallback, WorkflowEventCallback};
pub use mode::{ConversionMode, DOCX_MIME, DOC_MIME, PDF_MIME};
pub use service::{ConversionService, ConvertRequest, HttpConversionService};
pub use session::{
    ConversionResult, ConvertedArtifact, FileCandidate, PendingFile, Phase, SessionState,
    MAX_FILE_BYTES,
};
