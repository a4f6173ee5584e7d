//! External collaborators: the conversion, download, and cleanup endpoints.
//!
//! The workflow controller never talks HTTP directly — it goes through the
//! [`ConversionService`] trait, one method per remote endpoint. Tests swap
//! in a recording mock; production uses [`HttpConversionService`].
//!
//! ## Wire contract
//!
//! * `POST {base}/convert` — multipart form with a `file` part (binary
//!   content, original file name, declared MIME) and a `conversion_type`
//!   text field. Replies JSON: `{success: true, filename, download_name}`
//!   or `{success: false, error?}`. The error body may arrive with a
//!   non-2xx status; it still carries the service's message.
//! * `GET {base}/download/{filename}` — the converted artifact's bytes.
//! * `POST {base}/cleanup` — JSON `{filename}`; replies `{success}`.
//!   Diagnostic only.

use crate::error::{AttemptError, CleanupError, FerryError};
use crate::session::ConvertedArtifact;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Upload payload for the conversion endpoint.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    /// Fixed identifier of the active mode (`pdf_to_docx` / `docx_to_pdf`).
    pub conversion_type: &'static str,
    pub file_name: String,
    pub mime: String,
    pub content: Vec<u8>,
}

/// Wire shape of the conversion endpoint's JSON reply.
///
/// Every field is optional on the wire: a failure body may carry only
/// `error`, and a misbehaving service may omit anything.
#[derive(Debug, Deserialize)]
struct ConvertReply {
    #[serde(default)]
    success: bool,
    filename: Option<String>,
    download_name: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct CleanupRequest<'a> {
    filename: &'a str,
}

#[derive(Debug, Deserialize)]
struct CleanupReply {
    #[serde(default)]
    success: bool,
}

/// The remote endpoints the workflow depends on.
#[async_trait]
pub trait ConversionService: Send + Sync {
    /// Submit a file for conversion.
    ///
    /// Implementations map every failure to an [`AttemptError`]: an
    /// explicit service rejection keeps the service's message, transport
    /// trouble gets the generic connection message.
    async fn convert(&self, request: ConvertRequest) -> Result<ConvertedArtifact, AttemptError>;

    /// Fetch the converted artifact's bytes by its server file id.
    async fn fetch_artifact(&self, server_file_id: &str) -> Result<Vec<u8>, FerryError>;

    /// Ask the service to delete its copy of the artifact.
    ///
    /// Returns the service's `success` flag. Callers use the outcome for
    /// logging only.
    async fn cleanup(&self, server_file_id: &str) -> Result<bool, CleanupError>;
}

/// reqwest-backed implementation of [`ConversionService`].
pub struct HttpConversionService {
    /// Client for `/convert` — built without a total timeout so a slow
    /// conversion is never aborted from this side.
    convert_client: reqwest::Client,
    /// Client for `/download` and `/cleanup`, with the configured timeout.
    transfer_client: reqwest::Client,
    base_url: String,
}

impl HttpConversionService {
    pub fn new(base_url: impl Into<String>, download_timeout_secs: u64) -> Result<Self, FerryError> {
        let convert_client = reqwest::Client::builder()
            .build()
            .map_err(|e| FerryError::ClientInit(e.to_string()))?;
        let transfer_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(download_timeout_secs))
            .build()
            .map_err(|e| FerryError::ClientInit(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            convert_client,
            transfer_client,
            base_url,
        })
    }

    /// Build a service from the shared workflow configuration.
    pub fn from_config(config: &crate::config::WorkflowConfig) -> Result<Self, FerryError> {
        Self::new(config.service_base_url.clone(), config.download_timeout_secs)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl ConversionService for HttpConversionService {
    async fn convert(&self, request: ConvertRequest) -> Result<ConvertedArtifact, AttemptError> {
        let part = reqwest::multipart::Part::bytes(request.content)
            .file_name(request.file_name.clone())
            .mime_str(&request.mime)
            .map_err(|e| {
                // The declared MIME already passed validation, so this is
                // unreachable with the fixed accepted set.
                warn!(mime = %request.mime, error = %e, "invalid MIME for multipart part");
                AttemptError::connection()
            })?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("conversion_type", request.conversion_type);

        debug!(
            file = %request.file_name,
            conversion_type = request.conversion_type,
            "posting multipart conversion request"
        );

        let response = self
            .convert_client
            .post(self.endpoint("convert"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "conversion request failed to send");
                AttemptError::connection()
            })?;

        let status = response.status();
        // The service reports failures in the JSON body, sometimes under a
        // non-2xx status. Parse the body first; only an unparseable body
        // counts as a transport failure.
        let reply: ConvertReply = response.json().await.map_err(|e| {
            warn!(%status, error = %e, "conversion response was not valid JSON");
            AttemptError::connection()
        })?;

        if reply.success {
            match (reply.filename, reply.download_name) {
                (Some(server_file_id), Some(download_name)) => Ok(ConvertedArtifact {
                    server_file_id,
                    download_name,
                }),
                _ => {
                    warn!(%status, "success reply missing filename or download_name");
                    Err(AttemptError::conversion_failed(reply.error))
                }
            }
        } else {
            debug!(%status, error = ?reply.error, "service reported conversion failure");
            Err(AttemptError::conversion_failed(reply.error))
        }
    }

    async fn fetch_artifact(&self, server_file_id: &str) -> Result<Vec<u8>, FerryError> {
        let url = self.endpoint(&format!("download/{server_file_id}"));
        let response = self
            .transfer_client
            .get(&url)
            .send()
            .await
            .map_err(|e| FerryError::ArtifactFetch {
                file_id: server_file_id.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(FerryError::ArtifactFetch {
                file_id: server_file_id.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FerryError::ArtifactFetch {
                file_id: server_file_id.to_string(),
                reason: e.to_string(),
            })?;
        debug!(file_id = %server_file_id, bytes = bytes.len(), "fetched artifact");
        Ok(bytes.to_vec())
    }

    async fn cleanup(&self, server_file_id: &str) -> Result<bool, CleanupError> {
        let response = self
            .transfer_client
            .post(self.endpoint("cleanup"))
            .json(&CleanupRequest {
                filename: server_file_id,
            })
            .send()
            .await
            .map_err(|e| CleanupError {
                file_id: server_file_id.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let reply: CleanupReply = response.json().await.map_err(|e| CleanupError {
            file_id: server_file_id.to_string(),
            reason: format!("HTTP {status}: {e}"),
        })?;
        Ok(reply.success)
    }
}
