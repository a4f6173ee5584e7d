//! End-to-end workflow tests for docferry.
//!
//! The controller is exercised against a recording mock service, so every
//! test runs offline and instantly. Deferred-cleanup timing uses tokio's
//! paused clock. A live test against a real conversion service is gated
//! behind `DOCFERRY_E2E` so it never runs in CI unless explicitly
//! requested.

use async_trait::async_trait;
use docferry::{
    AttemptError, CleanupError, ConversionMode, ConversionResult, ConversionService,
    ConvertRequest, ConvertedArtifact, FerryError, FileCandidate, Phase, TransferController,
    WorkflowConfig, WorkflowEventCallback, DOCX_MIME, PDF_MIME,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Recording mock service ───────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum CleanupBehaviour {
    Succeed,
    Decline,
    Fail,
}

struct MockService {
    outcomes: Mutex<VecDeque<Result<ConvertedArtifact, AttemptError>>>,
    artifact_bytes: Vec<u8>,
    cleanup_behaviour: CleanupBehaviour,
    convert_calls: AtomicUsize,
    cleanup_calls: AtomicUsize,
    cleanup_ids: Mutex<Vec<String>>,
    last_request: Mutex<Option<ConvertRequest>>,
}

impl MockService {
    fn with_outcomes(outcomes: Vec<Result<ConvertedArtifact, AttemptError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            artifact_bytes: b"converted bytes".to_vec(),
            cleanup_behaviour: CleanupBehaviour::Succeed,
            convert_calls: AtomicUsize::new(0),
            cleanup_calls: AtomicUsize::new(0),
            cleanup_ids: Mutex::new(Vec::new()),
            last_request: Mutex::new(None),
        })
    }

    fn succeeding(file_id: &str, download_name: &str) -> Arc<Self> {
        Self::with_outcomes(vec![Ok(ConvertedArtifact {
            server_file_id: file_id.into(),
            download_name: download_name.into(),
        })])
    }

    fn failing(err: AttemptError) -> Arc<Self> {
        Self::with_outcomes(vec![Err(err)])
    }

    fn with_cleanup_behaviour(self: Arc<Self>, behaviour: CleanupBehaviour) -> Arc<Self> {
        let mut svc = Arc::try_unwrap(self).unwrap_or_else(|_| panic!("mock not shared yet"));
        svc.cleanup_behaviour = behaviour;
        Arc::new(svc)
    }
}

#[async_trait]
impl ConversionService for MockService {
    async fn convert(&self, request: ConvertRequest) -> Result<ConvertedArtifact, AttemptError> {
        self.convert_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AttemptError::connection()))
    }

    async fn fetch_artifact(&self, _server_file_id: &str) -> Result<Vec<u8>, FerryError> {
        Ok(self.artifact_bytes.clone())
    }

    async fn cleanup(&self, server_file_id: &str) -> Result<bool, CleanupError> {
        self.cleanup_calls.fetch_add(1, Ordering::SeqCst);
        self.cleanup_ids
            .lock()
            .unwrap()
            .push(server_file_id.to_string());
        match self.cleanup_behaviour {
            CleanupBehaviour::Succeed => Ok(true),
            CleanupBehaviour::Decline => Ok(false),
            CleanupBehaviour::Fail => Err(CleanupError {
                file_id: server_file_id.to_string(),
                reason: "HTTP 500".into(),
            }),
        }
    }
}

// ── Test helpers ─────────────────────────────────────────────────────────────

fn controller(service: Arc<MockService>) -> TransferController {
    let config = WorkflowConfig::builder().build().expect("valid config");
    TransferController::new(service, config)
}

fn controller_saving_to(service: Arc<MockService>, output_dir: &std::path::Path) -> TransferController {
    let config = WorkflowConfig::builder()
        .output_dir(output_dir)
        .build()
        .expect("valid config");
    TransferController::new(service, config)
}

fn pdf_file(name: &str, size: u64) -> FileCandidate {
    FileCandidate {
        name: name.into(),
        mime: PDF_MIME.into(),
        size,
        content: b"%PDF-1.7 test".to_vec(),
    }
}

const MIB: u64 = 1024 * 1024;

// ── Validation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn wrong_mime_is_rejected_without_any_network_call() {
    let service = MockService::succeeding("abc123", "result.docx");
    let mut ctl = controller(Arc::clone(&service));

    let err = ctl
        .acquire_files(vec![FileCandidate::new("photo.png", "image/png", vec![0; 64])])
        .unwrap_err();

    assert_eq!(err.user_message(), "file must be a PDF");
    assert_eq!(ctl.state().phase(), Phase::Idle);
    assert!(ctl.state().pending().is_none());
    assert_eq!(service.convert_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn accepted_file_preserves_exact_name_and_size() {
    let mut ctl = controller(MockService::succeeding("abc123", "result.docx"));

    ctl.acquire_files(vec![pdf_file("quarterly report.pdf", MIB)])
        .expect("1 MiB PDF is valid");

    assert_eq!(ctl.state().phase(), Phase::FileSelected);
    let pending = ctl.state().pending().expect("pending file");
    assert_eq!(pending.name, "quarterly report.pdf");
    assert_eq!(pending.size, MIB);
}

#[tokio::test]
async fn oversize_file_is_rejected_with_the_size_message() {
    let mut ctl = controller(MockService::succeeding("abc123", "result.docx"));

    // Accepted type, 17 MiB — the size message wins over type validity.
    let err = ctl
        .acquire_files(vec![pdf_file("big.pdf", 17 * MIB)])
        .unwrap_err();

    assert_eq!(err.user_message(), "file must not exceed 16MB");
    assert_eq!(ctl.state().phase(), Phase::Idle);
}

#[tokio::test]
async fn docx_mode_rejects_png_with_word_message() {
    let mut ctl = controller(MockService::succeeding("x", "y"));
    ctl.set_mode(ConversionMode::DocxToPdf);

    let err = ctl
        .acquire_files(vec![FileCandidate::new(
            "chart.png",
            "image/png",
            vec![0; 10 * 1024],
        )])
        .unwrap_err();

    assert_eq!(
        err.user_message(),
        "file must be a Word document (.docx or .doc)"
    );
    assert_eq!(ctl.state().phase(), Phase::Idle);
}

#[tokio::test]
async fn mode_switch_clears_the_selection() {
    let mut ctl = controller(MockService::succeeding("x", "y"));
    ctl.acquire_files(vec![pdf_file("report.pdf", MIB)]).unwrap();
    assert_eq!(ctl.state().phase(), Phase::FileSelected);

    ctl.set_mode(ConversionMode::DocxToPdf);

    assert_eq!(ctl.state().phase(), Phase::Idle);
    assert!(ctl.state().pending().is_none());
    assert_eq!(ctl.mode(), ConversionMode::DocxToPdf);
}

#[tokio::test]
async fn only_the_first_file_of_a_batch_is_considered() {
    let mut ctl = controller(MockService::succeeding("x", "y"));

    // The second candidate would be rejected, but it is silently ignored.
    ctl.acquire_files(vec![
        pdf_file("first.pdf", MIB),
        FileCandidate::new("second.png", "image/png", vec![0]),
        pdf_file("third.pdf", MIB),
    ])
    .expect("first file is valid");

    assert_eq!(ctl.state().pending().unwrap().name, "first.pdf");
    assert!(ctl.state().error().is_none());
}

#[tokio::test]
async fn empty_batch_is_a_noop() {
    let mut ctl = controller(MockService::succeeding("x", "y"));
    ctl.acquire_files(Vec::new()).expect("empty batch is not an error");
    assert_eq!(ctl.state().phase(), Phase::Idle);
    assert!(ctl.state().error().is_none());
}

// ── Submission ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_is_a_noop_without_a_file() {
    let service = MockService::succeeding("abc123", "result.docx");
    let mut ctl = controller(Arc::clone(&service));

    assert!(ctl.submit().await.is_none());
    assert_eq!(service.convert_calls.load(Ordering::SeqCst), 0);
    assert_eq!(ctl.state().phase(), Phase::Idle);
}

#[tokio::test]
async fn submit_is_a_noop_after_success() {
    let service = MockService::succeeding("abc123", "result.docx");
    let mut ctl = controller(Arc::clone(&service));
    ctl.acquire_files(vec![pdf_file("report.pdf", MIB)]).unwrap();
    ctl.submit().await;
    assert_eq!(ctl.state().phase(), Phase::Succeeded);

    // The pending file was consumed; a second submit must not fire.
    assert!(ctl.submit().await.is_none());
    assert_eq!(service.convert_calls.load(Ordering::SeqCst), 1);
    assert_eq!(ctl.state().phase(), Phase::Succeeded);
}

#[tokio::test]
async fn successful_conversion_exposes_the_service_values_unaltered() {
    let service = MockService::succeeding("abc123", "result.docx");
    let mut ctl = controller(Arc::clone(&service));

    ctl.acquire_files(vec![pdf_file("report.pdf", MIB)]).unwrap();
    let result = ctl.submit().await.expect("a submission happened").clone();

    assert_eq!(
        result,
        ConversionResult::Success {
            server_file_id: "abc123".into(),
            download_name: "result.docx".into(),
        }
    );
    assert_eq!(ctl.state().phase(), Phase::Succeeded);

    // The upload carried the mode's identifier and the file's own name.
    let request = service.last_request.lock().unwrap().take().expect("request recorded");
    assert_eq!(request.conversion_type, "pdf_to_docx");
    assert_eq!(request.file_name, "report.pdf");
    assert_eq!(request.mime, PDF_MIME);
    assert_eq!(request.content, b"%PDF-1.7 test");
}

#[tokio::test]
async fn docx_submission_carries_the_docx_identifier() {
    let service = MockService::succeeding("f1", "letter.pdf");
    let mut ctl = controller(Arc::clone(&service));
    ctl.set_mode(ConversionMode::DocxToPdf);

    ctl.acquire_files(vec![FileCandidate::new(
        "letter.docx",
        DOCX_MIME,
        vec![0; 256],
    )])
    .unwrap();
    ctl.submit().await;

    let request = service.last_request.lock().unwrap().take().unwrap();
    assert_eq!(request.conversion_type, "docx_to_pdf");
}

#[tokio::test]
async fn service_failure_reenables_submission_and_keeps_the_file() {
    let service = MockService::with_outcomes(vec![
        Err(AttemptError::conversion_failed(Some("LibreOffice not found".into()))),
        Ok(ConvertedArtifact {
            server_file_id: "abc123".into(),
            download_name: "result.docx".into(),
        }),
    ]);
    let mut ctl = controller(Arc::clone(&service));
    ctl.acquire_files(vec![pdf_file("report.pdf", MIB)]).unwrap();

    let first = ctl.submit().await.expect("first attempt ran").clone();
    assert_eq!(
        first,
        ConversionResult::Failure {
            message: "LibreOffice not found".into()
        }
    );
    assert_eq!(ctl.state().phase(), Phase::Failed);
    assert!(ctl.state().pending().is_some(), "file kept for retry");

    // Retry with the same file succeeds and discards the old failure.
    let second = ctl.submit().await.expect("retry ran").clone();
    assert!(matches!(second, ConversionResult::Success { .. }));
    assert_eq!(service.convert_calls.load(Ordering::SeqCst), 2);
    assert_eq!(ctl.state().phase(), Phase::Succeeded);
}

#[tokio::test]
async fn transport_failure_surfaces_the_generic_message() {
    let mut ctl = controller(MockService::failing(AttemptError::connection()));
    ctl.acquire_files(vec![pdf_file("report.pdf", MIB)]).unwrap();

    let result = ctl.submit().await.expect("attempt ran").clone();
    assert_eq!(
        result,
        ConversionResult::Failure {
            message: "connection error, please try again".into()
        }
    );
    assert_eq!(
        ctl.state().error().map(|e| e.user_message()),
        Some("connection error, please try again")
    );
}

#[tokio::test]
async fn explicit_failure_without_detail_uses_the_fallback_message() {
    let mut ctl = controller(MockService::failing(AttemptError::conversion_failed(None)));
    ctl.acquire_files(vec![pdf_file("report.pdf", MIB)]).unwrap();

    let result = ctl.submit().await.expect("attempt ran").clone();
    assert_eq!(
        result,
        ConversionResult::Failure {
            message: "error converting the file".into()
        }
    );
}

// ── Download & deferred cleanup ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn download_schedules_exactly_one_cleanup_and_resets_immediately() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = MockService::succeeding("abc123", "result.docx");
    let mut ctl = controller_saving_to(Arc::clone(&service), dir.path());

    ctl.acquire_files(vec![pdf_file("report.pdf", MIB)]).unwrap();
    ctl.submit().await;
    let path = ctl
        .download()
        .await
        .expect("download succeeds")
        .expect("a download was available");

    // The session is back to Idle as soon as download() returns — the
    // deferred cleanup has no say in it.
    assert_eq!(ctl.state().phase(), Phase::Idle);
    assert!(ctl.state().result().is_none());

    // Past the 3000 ms delay the deferred call has fired, exactly once.
    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(service.cleanup_calls.load(Ordering::SeqCst), 1);
    assert_eq!(*service.cleanup_ids.lock().unwrap(), vec!["abc123".to_string()]);

    // The artifact landed under its download name, fully written.
    assert_eq!(path, dir.path().join("result.docx"));
    assert_eq!(std::fs::read(&path).unwrap(), b"converted bytes");
    assert!(!dir.path().join("result.docx.part").exists());
}

#[tokio::test(start_paused = true)]
async fn cleanup_failure_never_disturbs_the_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = MockService::succeeding("abc123", "result.docx")
        .with_cleanup_behaviour(CleanupBehaviour::Fail);
    let mut ctl = controller_saving_to(Arc::clone(&service), dir.path());

    ctl.acquire_files(vec![pdf_file("report.pdf", MIB)]).unwrap();
    ctl.submit().await;
    ctl.download().await.expect("download succeeds");

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(service.cleanup_calls.load(Ordering::SeqCst), 1);
    // The failure was logged only; the session is untouched.
    assert_eq!(ctl.state().phase(), Phase::Idle);
    assert!(ctl.state().error().is_none());
}

#[tokio::test(start_paused = true)]
async fn declined_cleanup_is_diagnostic_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = MockService::succeeding("abc123", "result.docx")
        .with_cleanup_behaviour(CleanupBehaviour::Decline);
    let mut ctl = controller_saving_to(Arc::clone(&service), dir.path());

    ctl.acquire_files(vec![pdf_file("report.pdf", MIB)]).unwrap();
    ctl.submit().await;
    ctl.download().await.expect("download succeeds");

    // `{success: false}` from the cleanup endpoint changes nothing.
    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(service.cleanup_calls.load(Ordering::SeqCst), 1);
    assert_eq!(ctl.state().phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn download_is_a_noop_outside_succeeded() {
    let service = MockService::succeeding("abc123", "result.docx");
    let mut ctl = controller(Arc::clone(&service));

    assert!(ctl.download().await.unwrap().is_none());

    ctl.acquire_files(vec![pdf_file("report.pdf", MIB)]).unwrap();
    assert!(ctl.download().await.unwrap().is_none());
    assert_eq!(ctl.state().phase(), Phase::FileSelected);

    // No cleanup may ever have been scheduled.
    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(service.cleanup_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn second_download_after_completion_is_a_noop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = MockService::succeeding("abc123", "result.docx");
    let mut ctl = controller_saving_to(Arc::clone(&service), dir.path());

    ctl.acquire_files(vec![pdf_file("report.pdf", MIB)]).unwrap();
    ctl.submit().await;
    assert!(ctl.download().await.unwrap().is_some());
    assert!(ctl.download().await.unwrap().is_none());

    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(service.cleanup_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn download_name_path_components_are_stripped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = MockService::succeeding("abc123", "../escape.docx");
    let mut ctl = controller_saving_to(Arc::clone(&service), dir.path());

    ctl.acquire_files(vec![pdf_file("report.pdf", MIB)]).unwrap();
    ctl.submit().await;
    let path = ctl.download().await.unwrap().unwrap();

    // Only the final component is honoured; the artifact stays inside
    // the output directory.
    assert_eq!(path, dir.path().join("escape.docx"));
    assert!(path.exists());
}

// ── Full scenario & events ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn full_pdf_to_docx_scenario() {
    let dir = tempfile::tempdir().expect("tempdir");
    let service = MockService::succeeding("abc123", "result.docx");
    let mut ctl = controller_saving_to(Arc::clone(&service), dir.path());

    // mode=PdfToDocx (default), 1 MiB application/pdf file.
    ctl.acquire_files(vec![pdf_file("paper.pdf", MIB)]).unwrap();
    assert_eq!(ctl.state().phase(), Phase::FileSelected);

    let result = ctl.submit().await.unwrap().clone();
    assert_eq!(
        result,
        ConversionResult::Success {
            server_file_id: "abc123".into(),
            download_name: "result.docx".into(),
        }
    );

    let path = ctl.download().await.unwrap().unwrap();
    assert!(path.ends_with("result.docx"));
    assert_eq!(ctl.state().phase(), Phase::Idle);
    assert_eq!(ctl.mode(), ConversionMode::PdfToDocx);
}

struct CountingEvents {
    accepted: AtomicUsize,
    rejected: AtomicUsize,
    submit_started: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    downloads: AtomicUsize,
    resets: AtomicUsize,
}

impl CountingEvents {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            accepted: AtomicUsize::new(0),
            rejected: AtomicUsize::new(0),
            submit_started: AtomicUsize::new(0),
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
            resets: AtomicUsize::new(0),
        })
    }
}

impl WorkflowEventCallback for CountingEvents {
    fn on_file_accepted(&self, _name: &str, _size: u64) {
        self.accepted.fetch_add(1, Ordering::SeqCst);
    }
    fn on_file_rejected(&self, _message: &str) {
        self.rejected.fetch_add(1, Ordering::SeqCst);
    }
    fn on_submit_started(&self, _status: &str) {
        self.submit_started.fetch_add(1, Ordering::SeqCst);
    }
    fn on_conversion_succeeded(&self, _download_name: &str) {
        self.succeeded.fetch_add(1, Ordering::SeqCst);
    }
    fn on_conversion_failed(&self, _message: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
    fn on_download_finished(&self, _path: &std::path::Path) {
        self.downloads.fetch_add(1, Ordering::SeqCst);
    }
    fn on_session_reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test(start_paused = true)]
async fn events_fire_once_per_trigger() {
    let dir = tempfile::tempdir().expect("tempdir");
    let events = CountingEvents::new();
    let service = MockService::succeeding("abc123", "result.docx");
    let config = WorkflowConfig::builder()
        .output_dir(dir.path())
        .event_callback(Arc::clone(&events) as Arc<dyn WorkflowEventCallback>)
        .build()
        .unwrap();
    let mut ctl = TransferController::new(service, config);

    ctl.acquire_files(vec![FileCandidate::new("photo.png", "image/png", vec![0])])
        .unwrap_err();
    ctl.acquire_files(vec![pdf_file("report.pdf", MIB)]).unwrap();
    ctl.submit().await;
    ctl.download().await.unwrap();

    assert_eq!(events.rejected.load(Ordering::SeqCst), 1);
    assert_eq!(events.accepted.load(Ordering::SeqCst), 1);
    assert_eq!(events.submit_started.load(Ordering::SeqCst), 1);
    assert_eq!(events.succeeded.load(Ordering::SeqCst), 1);
    assert_eq!(events.failed.load(Ordering::SeqCst), 0);
    assert_eq!(events.downloads.load(Ordering::SeqCst), 1);
    assert_eq!(events.resets.load(Ordering::SeqCst), 1);
}

// ── Gated live test ──────────────────────────────────────────────────────────

/// Run against a real conversion service.
///
/// Requires:
///   DOCFERRY_E2E=1
///   DOCFERRY_SERVICE_URL   (default http://localhost:5000)
///   DOCFERRY_E2E_PDF       path to a small local PDF
#[tokio::test]
async fn live_service_round_trip() {
    if std::env::var("DOCFERRY_E2E").is_err() {
        println!("SKIP — set DOCFERRY_E2E=1 to run live tests");
        return;
    }
    let Ok(pdf_path) = std::env::var("DOCFERRY_E2E_PDF") else {
        println!("SKIP — DOCFERRY_E2E_PDF not set");
        return;
    };

    let url = std::env::var("DOCFERRY_SERVICE_URL")
        .unwrap_or_else(|_| "http://localhost:5000".to_string());
    let dir = tempfile::tempdir().expect("tempdir");

    let config = WorkflowConfig::builder()
        .service_base_url(url)
        .output_dir(dir.path())
        .build()
        .expect("valid config");
    let service = Arc::new(
        docferry::HttpConversionService::from_config(&config).expect("HTTP client builds"),
    );
    let mut ctl = TransferController::new(service, config);

    let bytes = std::fs::read(&pdf_path).expect("read test PDF");
    ctl.acquire_files(vec![FileCandidate::new("test.pdf", PDF_MIME, bytes)])
        .expect("test PDF accepted");

    let result = ctl.submit().await.expect("submission ran").clone();
    let ConversionResult::Success { download_name, .. } = result else {
        panic!("live conversion failed: {result:?}");
    };

    let path = ctl.download().await.expect("download ok").expect("artifact");
    assert!(path.ends_with(&download_name));
    assert!(std::fs::metadata(&path).unwrap().len() > 0);

    // Let the deferred cleanup reach the live service before the runtime
    // shuts down.
    tokio::time::sleep(Duration::from_millis(3500)).await;
}
