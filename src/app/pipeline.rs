//! Session workflows shared by the headless commands.
//!
//! Each function runs one user action end to end: the session transition,
//! the backend call, and applying the result. The TUI drives the same
//! transitions but spawns the backend call instead of awaiting it inline.

use std::path::Path;

use tracing::info;

use crate::browser::{BrowserFetch, TableTicket};
use crate::error::AppError;
use crate::gateway::Backend;
use crate::io::read_dataset_upload;
use crate::report::StatusMessage;
use crate::session::Session;

/// Read `path` and upload it. Only an unreadable or unsupported file is an
/// `Err`; backend failures come back as an error status.
pub async fn upload_dataset(
    session: &mut Session,
    backend: &dyn Backend,
    path: &Path,
) -> Result<StatusMessage, AppError> {
    let upload = read_dataset_upload(path)?;
    if let Err(busy) = session.begin_upload(&upload.file_name) {
        return Ok(busy);
    }

    let file_name = upload.file_name.clone();
    let result = backend.load_dataset(upload).await;
    let status = session.finish_upload(result);
    if !status.is_error() {
        info!(file = %file_name, rows = session.dataset().map(|d| d.sample_count()), "dataset loaded");
    }
    Ok(status)
}

/// Build and submit a fitting request. Precondition failures return before
/// the backend is called.
pub async fn run_fitting(session: &mut Session, backend: &dyn Backend) -> StatusMessage {
    let request = match session.begin_fit() {
        Ok(request) => request,
        Err(status) => return status,
    };

    info!(
        models = request.parameter_bounds.len(),
        method = %request.optimization_method,
        max_iterations = request.max_iterations,
        "submitting fitting run"
    );
    let result = backend.run_fitting(&request).await;
    session.finish_fit(result)
}

/// Load the table list on first use and show the first table.
pub async fn mount_browser(session: &mut Session, backend: &dyn Backend) -> Option<StatusMessage> {
    let fetch = session.browser_mut().mount()?;
    Some(perform(session, backend, fetch).await)
}

/// Reload the table list.
pub async fn reload_tables(session: &mut Session, backend: &dyn Backend) -> Option<StatusMessage> {
    let fetch = session.browser_mut().refresh_tables()?;
    Some(perform(session, backend, fetch).await)
}

pub async fn select_table(session: &mut Session, backend: &dyn Backend, table: &str) -> Option<StatusMessage> {
    let ticket = session.browser_mut().select(table)?;
    Some(perform(session, backend, BrowserFetch::Table(ticket)).await)
}

pub async fn refresh_table(session: &mut Session, backend: &dyn Backend) -> Option<StatusMessage> {
    let ticket = session.browser_mut().refresh()?;
    Some(perform(session, backend, BrowserFetch::Table(ticket)).await)
}

/// Run a browser fetch and any follow-up fetch it triggers.
async fn perform(session: &mut Session, backend: &dyn Backend, fetch: BrowserFetch) -> StatusMessage {
    let mut next = Some(fetch);
    while let Some(fetch) = next.take() {
        next = match fetch {
            BrowserFetch::Tables => {
                let result = backend.list_tables().await;
                session.browser_mut().apply_tables(result).map(BrowserFetch::Table)
            }
            BrowserFetch::Table(ticket) => {
                fetch_table(session, backend, &ticket).await;
                None
            }
        };
    }
    browser_status(session)
}

async fn fetch_table(session: &mut Session, backend: &dyn Backend, ticket: &TableTicket) {
    let result = backend.fetch_table(&ticket.table).await;
    session.browser_mut().apply_table(ticket, result);
}

/// Status line describing the browser's current state.
pub fn browser_status(session: &Session) -> StatusMessage {
    let browser = session.browser();
    if let Some(error) = browser.error() {
        return StatusMessage::error(error);
    }
    match browser.selected_table() {
        Some(_) => StatusMessage::info(format!(
            "{}: {} rows, {} columns",
            browser.display_name(),
            browser.row_count(),
            browser.column_count()
        )),
        None => StatusMessage::info("No tables available."),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::domain::{BrowserTable, Dataset, DatasetUpload, FitOutcome, FittingRequest, LoadedDataset, TableData};
    use crate::gateway::GatewayError;

    /// In-memory backend that counts calls and records fit requests.
    #[derive(Default)]
    struct CountingBackend {
        uploads: AtomicUsize,
        fits: AtomicUsize,
        listings: AtomicUsize,
        fetches: AtomicUsize,
        fail_upload: bool,
        requests: Mutex<Vec<FittingRequest>>,
    }

    impl CountingBackend {
        fn calls(&self) -> usize {
            self.uploads.load(Ordering::SeqCst)
                + self.fits.load(Ordering::SeqCst)
                + self.listings.load(Ordering::SeqCst)
                + self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Backend for CountingBackend {
        async fn load_dataset(&self, upload: DatasetUpload) -> Result<LoadedDataset, GatewayError> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            if self.fail_upload {
                return Err(GatewayError::Http {
                    status: 400,
                    message: "Unsupported file".into(),
                });
            }
            Ok(LoadedDataset {
                dataset: Dataset {
                    columns: vec!["raw".into()],
                    records: vec![json!({"raw": String::from_utf8_lossy(&upload.bytes)}).as_object().cloned().unwrap()],
                },
                message: "[INFO] Loaded 1 rows.".into(),
            })
        }

        async fn run_fitting(&self, request: &FittingRequest) -> Result<FitOutcome, GatewayError> {
            self.fits.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            Ok(FitOutcome {
                succeeded: true,
                message: "Fitting completed successfully.".into(),
                response: None,
            })
        }

        async fn list_tables(&self) -> Result<Vec<BrowserTable>, GatewayError> {
            self.listings.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                BrowserTable {
                    table_name: "ADSORPTION_DATA".into(),
                    display_name: "Uploaded Adsorption Data".into(),
                },
                BrowserTable {
                    table_name: "ADSORPTION_BEST_FIT".into(),
                    display_name: "Best Fit Results".into(),
                },
            ])
        }

        async fn fetch_table(&self, table_name: &str) -> Result<TableData, GatewayError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if table_name == "MISSING" {
                return Err(GatewayError::Http {
                    status: 404,
                    message: format!("Table '{table_name}' not found or not available for browsing."),
                });
            }
            Ok(TableData {
                table_name: table_name.into(),
                display_name: format!("{table_name} view"),
                columns: vec!["a".into()],
                rows: vec![json!({"a": 1}).as_object().cloned().unwrap()],
                row_count: 1,
                column_count: 1,
            })
        }
    }

    fn dataset_file(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("adsorfit-pipeline-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, b"experiment,pressure\nA,1\n").unwrap();
        path
    }

    #[tokio::test]
    async fn fit_without_dataset_never_calls_backend() {
        let backend = CountingBackend::default();
        let mut session = Session::new();

        let status = run_fitting(&mut session, &backend).await;
        assert_eq!(
            status.to_string(),
            "[ERROR] Please load a dataset before starting the fitting process."
        );
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn fit_without_models_never_calls_backend() {
        let backend = CountingBackend::default();
        let mut session = Session::new();
        upload_dataset(&mut session, &backend, &dataset_file("a.csv")).await.unwrap();
        for name in crate::models::model_names() {
            session.set_enabled(name, false).unwrap();
        }

        let status = run_fitting(&mut session, &backend).await;
        assert_eq!(
            status.to_string(),
            "[ERROR] Please select at least one model before starting the fitting process."
        );
        assert_eq!(backend.fits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn upload_then_fit_sends_loaded_dataset() {
        let backend = CountingBackend::default();
        let mut session = Session::new();

        let status = upload_dataset(&mut session, &backend, &dataset_file("b.csv")).await.unwrap();
        assert_eq!(status.to_string(), "[INFO] Loaded 1 rows.");
        session.set_enabled("Sips", false).unwrap();

        let status = run_fitting(&mut session, &backend).await;
        assert_eq!(status.to_string(), "[INFO] Fitting completed successfully.");
        assert!(!session.is_fitting());

        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].parameter_bounds.len(), 8);
        assert_eq!(requests[0].dataset.columns, vec!["raw".to_string()]);
    }

    #[tokio::test]
    async fn failed_upload_blocks_fitting() {
        let backend = CountingBackend {
            fail_upload: true,
            ..CountingBackend::default()
        };
        let mut session = Session::new();

        let status = upload_dataset(&mut session, &backend, &dataset_file("c.csv")).await.unwrap();
        assert_eq!(status.to_string(), "[ERROR] Unsupported file");
        assert!(session.dataset().is_none());

        run_fitting(&mut session, &backend).await;
        assert_eq!(backend.fits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unsupported_file_is_rejected_locally() {
        let backend = CountingBackend::default();
        let mut session = Session::new();
        let path = std::env::temp_dir().join("adsorfit-pipeline.json");
        std::fs::write(&path, b"{}").unwrap();

        let err = upload_dataset(&mut session, &backend, &path).await.unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn mount_lists_once_and_shows_first_table() {
        let backend = CountingBackend::default();
        let mut session = Session::new();

        let status = mount_browser(&mut session, &backend).await.unwrap();
        assert_eq!(status.to_string(), "[INFO] ADSORPTION_DATA view: 1 rows, 1 columns");
        assert_eq!(backend.listings.load(Ordering::SeqCst), 1);
        assert_eq!(backend.fetches.load(Ordering::SeqCst), 1);

        assert!(mount_browser(&mut session, &backend).await.is_none());
        assert_eq!(backend.listings.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn select_refresh_and_missing_table() {
        let backend = CountingBackend::default();
        let mut session = Session::new();
        mount_browser(&mut session, &backend).await;

        select_table(&mut session, &backend, "ADSORPTION_BEST_FIT").await.unwrap();
        assert_eq!(session.browser().display_name(), "ADSORPTION_BEST_FIT view");

        refresh_table(&mut session, &backend).await.unwrap();
        assert_eq!(backend.fetches.load(Ordering::SeqCst), 3);

        let status = select_table(&mut session, &backend, "MISSING").await.unwrap();
        assert!(status.is_error());
        assert!(session.browser().rows().is_empty());

        assert!(select_table(&mut session, &backend, "").await.is_none());
        assert_eq!(backend.fetches.load(Ordering::SeqCst), 4);
    }
}
