//! Print submission queue and printer directory.
//!
//! Jobs reach the backend strictly in submission order, one at a time. A
//! single worker task drains the queue and does not pick up the next job
//! until the in-flight submission has resolved, so the one-in-flight
//! invariant needs no locking. A failed job resolves its own caller and
//! never blocks the jobs behind it.

use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::api::{ApiClient, ApiError};
use crate::config;

/// Sentinel printer name: the backend picks its configured printer
pub const DEFAULT_PRINTER: &str = "default";

const DEFAULT_PRINT_ERROR: &str = "Erro ao imprimir";

/// One print request as sent to the backend
#[derive(Debug, Clone, Serialize)]
pub struct PrintRequest {
    pub image_path: String,
    pub printer_name: String,
}

/// Success body of a print submission
#[derive(Debug, Clone, Deserialize)]
pub struct PrintOutcome {
    pub status: String,
    #[serde(default)]
    pub printer: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl PrintOutcome {
    /// Whether the backend accepted the job
    pub fn accepted(&self) -> bool {
        matches!(self.status.as_str(), "sent" | "success")
    }
}

/// Printers reported by the backend
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrinterDirectory {
    #[serde(default)]
    pub printers: Vec<String>,
    #[serde(default)]
    pub default_printer: String,
}

#[derive(Error, Debug)]
pub enum PrintError {
    /// The backend rejected the job; the message is the backend's own
    #[error("{0}")]
    Rejected(String),
    #[error("Print request failed: {0}")]
    Transport(String),
    #[error("Print request timed out")]
    Timeout,
    #[error("Print queue closed")]
    QueueClosed,
}

/// How the shell renders a print-status notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// A transient print-status notice
#[derive(Debug, Clone)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Callback type for print-status notices
pub type NoticeCallback = Arc<dyn Fn(Notice) + Send + Sync>;

/// Transport the queue uses to reach the backend
#[async_trait]
pub trait PrintBackend: Send + Sync {
    async fn list_printers(&self) -> Result<PrinterDirectory, ApiError>;
    async fn submit_print(&self, request: &PrintRequest) -> Result<PrintOutcome, ApiError>;
}

#[async_trait]
impl PrintBackend for ApiClient {
    async fn list_printers(&self) -> Result<PrinterDirectory, ApiError> {
        ApiClient::list_printers(self).await
    }

    async fn submit_print(&self, request: &PrintRequest) -> Result<PrintOutcome, ApiError> {
        ApiClient::submit_print(self, request).await
    }
}

/// A queued job: the request plus the channel resolving its caller
struct PrintJob {
    request: PrintRequest,
    done: oneshot::Sender<Result<PrintOutcome, PrintError>>,
}

/// FIFO print queue over the backend print endpoint.
///
/// Construction loads the printer directory in the background; a failed
/// load is logged and leaves the directory empty, which degrades to the
/// [`DEFAULT_PRINTER`] sentinel.
#[derive(Clone)]
pub struct PrinterService {
    job_tx: mpsc::UnboundedSender<PrintJob>,
    directory: Arc<RwLock<PrinterDirectory>>,
}

impl PrinterService {
    pub fn new(backend: Arc<dyn PrintBackend>, notices: NoticeCallback) -> Self {
        Self::with_submit_timeout(
            backend,
            notices,
            Duration::from_millis(config::PRINT_SUBMIT_TIMEOUT_MS),
        )
    }

    pub fn with_submit_timeout(
        backend: Arc<dyn PrintBackend>,
        notices: NoticeCallback,
        submit_timeout: Duration,
    ) -> Self {
        let (job_tx, job_rx) = mpsc::unbounded_channel();
        let directory = Arc::new(RwLock::new(PrinterDirectory::default()));

        spawn_directory_load(backend.clone(), directory.clone());
        spawn_worker(backend, job_rx, notices, submit_timeout);

        Self { job_tx, directory }
    }

    /// Queue one print job for the referenced image.
    ///
    /// The job enters the queue at call time; the returned future resolves
    /// when the backend has answered this specific job, not when the queue
    /// drains. The backend receives the final path segment of the
    /// reference, so display URLs and bare file names both work.
    pub fn print_image(
        &self,
        image_reference: &str,
        printer_name: Option<&str>,
    ) -> impl Future<Output = Result<PrintOutcome, PrintError>> {
        let request = PrintRequest {
            image_path: file_name(image_reference).to_string(),
            printer_name: printer_name.unwrap_or(DEFAULT_PRINTER).to_string(),
        };

        let (done, result_rx) = oneshot::channel();
        let enqueued = self.job_tx.send(PrintJob { request, done });

        async move {
            if enqueued.is_err() {
                return Err(PrintError::QueueClosed);
            }
            result_rx.await.map_err(|_| PrintError::QueueClosed)?
        }
    }

    /// Printer names reported by the backend, empty until the directory loads
    pub fn printers(&self) -> Vec<String> {
        self.read_directory().printers
    }

    /// The backend's default printer, or the sentinel while unknown
    pub fn default_printer(&self) -> String {
        let directory = self.read_directory();
        if directory.default_printer.is_empty() {
            DEFAULT_PRINTER.to_string()
        } else {
            directory.default_printer
        }
    }

    fn read_directory(&self) -> PrinterDirectory {
        match self.directory.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Extract the file name from a photo reference
fn file_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

fn spawn_directory_load(backend: Arc<dyn PrintBackend>, directory: Arc<RwLock<PrinterDirectory>>) {
    tokio::spawn(async move {
        let timeout = Duration::from_millis(config::DIRECTORY_LOAD_TIMEOUT_MS);
        match tokio::time::timeout(timeout, backend.list_printers()).await {
            Ok(Ok(loaded)) => {
                log::info!(
                    "Printers loaded: {:?} (default: {})",
                    loaded.printers,
                    loaded.default_printer
                );
                match directory.write() {
                    Ok(mut guard) => *guard = loaded,
                    Err(poisoned) => *poisoned.into_inner() = loaded,
                }
            }
            Ok(Err(e)) => log::error!("Failed to load printers: {}", e),
            Err(_) => log::error!("Printer directory load timed out"),
        }
    });
}

fn spawn_worker(
    backend: Arc<dyn PrintBackend>,
    mut job_rx: mpsc::UnboundedReceiver<PrintJob>,
    notices: NoticeCallback,
    submit_timeout: Duration,
) {
    tokio::spawn(async move {
        // Strict FIFO: recv() is not called again until the current
        // submission has resolved.
        while let Some(job) = job_rx.recv().await {
            let result = submit_job(backend.as_ref(), &job.request, &notices, submit_timeout).await;
            // The caller may have dropped its future; the queue moves on
            // either way.
            let _ = job.done.send(result);
        }
        log::debug!("Print queue shut down");
    });
}

async fn submit_job(
    backend: &dyn PrintBackend,
    request: &PrintRequest,
    notices: &NoticeCallback,
    submit_timeout: Duration,
) -> Result<PrintOutcome, PrintError> {
    log::info!("Printing {} on {}", request.image_path, request.printer_name);
    let notify = notices.as_ref();

    let outcome = match tokio::time::timeout(submit_timeout, backend.submit_print(request)).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(ApiError::Backend(message))) => {
            log::error!("Print rejected: {}", message);
            notify(Notice::error(message.as_str()));
            return Err(PrintError::Rejected(message));
        }
        Ok(Err(e)) => {
            log::error!("Print submission failed: {}", e);
            notify(Notice::error(DEFAULT_PRINT_ERROR));
            return Err(PrintError::Transport(e.to_string()));
        }
        Err(_) => {
            log::error!("Print submission for {} timed out", request.image_path);
            notify(Notice::error("Tempo limite de impressão excedido"));
            return Err(PrintError::Timeout);
        }
    };

    if outcome.accepted() {
        notify(Notice::success("Foto enviada para impressão!"));
    } else {
        log::warn!("Unexpected print status: {}", outcome.status);
        notify(Notice::error(DEFAULT_PRINT_ERROR));
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Backend double recording every submission. Latency and outcome are
    /// driven by the image file name: `slow_*` waits 30ms, `hang_*` never
    /// answers in time, `bad_*` is rejected, `odd_*` returns an unknown
    /// status. Everything else is accepted after 5ms.
    struct MockBackend {
        requests: Mutex<Vec<PrintRequest>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        directory: Option<PrinterDirectory>,
    }

    impl MockBackend {
        fn new(directory: Option<PrinterDirectory>) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                directory,
            })
        }

        fn submitted_paths(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.image_path.clone())
                .collect()
        }
    }

    #[async_trait]
    impl PrintBackend for MockBackend {
        async fn list_printers(&self) -> Result<PrinterDirectory, ApiError> {
            match &self.directory {
                Some(directory) => Ok(directory.clone()),
                None => Err(ApiError::Server("503: printers unavailable".into())),
            }
        }

        async fn submit_print(&self, request: &PrintRequest) -> Result<PrintOutcome, ApiError> {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            let delay = if request.image_path.starts_with("hang") {
                10_000
            } else if request.image_path.starts_with("slow") {
                30
            } else {
                5
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());

            if request.image_path.starts_with("bad") {
                return Err(ApiError::Backend("printer offline".into()));
            }

            let status = if request.image_path.starts_with("odd") {
                "queued"
            } else {
                "sent"
            };
            Ok(PrintOutcome {
                status: status.to_string(),
                printer: Some(request.printer_name.clone()),
                timestamp: None,
            })
        }
    }

    fn collecting_notices() -> (NoticeCallback, Arc<Mutex<Vec<Notice>>>) {
        let collected = Arc::new(Mutex::new(Vec::new()));
        let sink = collected.clone();
        let callback: NoticeCallback = Arc::new(move |notice| sink.lock().unwrap().push(notice));
        (callback, collected)
    }

    fn service(backend: Arc<MockBackend>) -> PrinterService {
        let (notices, _) = collecting_notices();
        PrinterService::with_submit_timeout(backend, notices, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn jobs_reach_backend_in_submission_order() {
        let backend = MockBackend::new(None);
        let svc = service(backend.clone());

        // The first job is the slowest; ordering must still hold.
        let first = svc.print_image("/imagens/slow_01_123.jpg", None);
        let second = svc.print_image("/imagens/foto_02_123.jpg", None);
        let third = svc.print_image("foto_03_123.jpg", Some("HP-Photo"));

        let (r1, r2, r3) = tokio::join!(first, second, third);
        assert!(r1.is_ok() && r2.is_ok() && r3.is_ok());

        assert_eq!(
            backend.submitted_paths(),
            vec!["slow_01_123.jpg", "foto_02_123.jpg", "foto_03_123.jpg"]
        );
    }

    #[tokio::test]
    async fn at_most_one_submission_in_flight() {
        let backend = MockBackend::new(None);
        let svc = service(backend.clone());

        let jobs = tokio::join!(
            svc.print_image("slow_a.jpg", None),
            svc.print_image("slow_b.jpg", None),
            svc.print_image("foto_c.jpg", None),
            svc.print_image("foto_d.jpg", None),
        );
        assert!(jobs.0.is_ok() && jobs.1.is_ok() && jobs.2.is_ok() && jobs.3.is_ok());

        assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_job_carries_backend_message_and_queue_drains() {
        let backend = MockBackend::new(None);
        let svc = service(backend.clone());

        let bad = svc.print_image("bad_01.jpg", None);
        let good = svc.print_image("foto_02.jpg", None);
        let (bad_result, good_result) = tokio::join!(bad, good);

        match bad_result {
            Err(PrintError::Rejected(message)) => assert_eq!(message, "printer offline"),
            other => panic!("expected rejection, got {:?}", other.map(|o| o.status)),
        }

        let outcome = good_result.expect("queued job after a failure must complete");
        assert!(outcome.accepted());
        assert_eq!(
            backend.submitted_paths(),
            vec!["bad_01.jpg", "foto_02.jpg"]
        );
    }

    #[tokio::test]
    async fn timed_out_job_fails_alone() {
        let backend = MockBackend::new(None);
        let (notices, _) = collecting_notices();
        let svc =
            PrinterService::with_submit_timeout(backend.clone(), notices, Duration::from_millis(50));

        let hung = svc.print_image("hang_01.jpg", None);
        let next = svc.print_image("foto_02.jpg", None);
        let (hung_result, next_result) = tokio::join!(hung, next);

        assert!(matches!(hung_result, Err(PrintError::Timeout)));
        assert!(next_result.is_ok());
    }

    #[tokio::test]
    async fn default_printer_is_sentinel_when_directory_load_fails() {
        let backend = MockBackend::new(None);
        let svc = service(backend);

        // Let the background load fail.
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(svc.printers().is_empty());
        assert_eq!(svc.default_printer(), DEFAULT_PRINTER);
    }

    #[tokio::test]
    async fn directory_loads_from_backend() {
        let backend = MockBackend::new(Some(PrinterDirectory {
            printers: vec!["HP-Photo".to_string(), "Epson-L3150".to_string()],
            default_printer: "HP-Photo".to_string(),
        }));
        let svc = service(backend);

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(svc.printers(), vec!["HP-Photo", "Epson-L3150"]);
        assert_eq!(svc.default_printer(), "HP-Photo");
    }

    #[tokio::test]
    async fn sentinel_printer_used_when_none_given() {
        let backend = MockBackend::new(None);
        let svc = service(backend.clone());

        svc.print_image("foto_01.jpg", None).await.unwrap();

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests[0].printer_name, DEFAULT_PRINTER);
    }

    #[tokio::test]
    async fn notices_follow_job_outcomes() {
        let backend = MockBackend::new(None);
        let (notices, collected) = collecting_notices();
        let svc = PrinterService::with_submit_timeout(backend, notices, Duration::from_secs(1));

        let _ = svc.print_image("foto_01.jpg", None).await;
        let _ = svc.print_image("bad_02.jpg", None).await;
        let _ = svc.print_image("odd_03.jpg", None).await;

        let collected = collected.lock().unwrap();
        assert_eq!(collected.len(), 3);
        assert_eq!(collected[0].severity, Severity::Success);
        assert_eq!(collected[1].severity, Severity::Error);
        assert_eq!(collected[1].message, "printer offline");
        // A 2xx with an unknown status still resolves the caller but
        // renders as a negative notice.
        assert_eq!(collected[2].severity, Severity::Error);
    }

    #[test]
    fn file_name_takes_last_path_segment() {
        assert_eq!(file_name("/imagens/foto_01_123.jpg"), "foto_01_123.jpg");
        assert_eq!(file_name("foto_01_123.jpg"), "foto_01_123.jpg");
        assert_eq!(file_name("http://host/imagens/x.jpg"), "x.jpg");
    }
}
