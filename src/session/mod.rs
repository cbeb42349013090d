//! Interactive session state.
//!
//! `Session` is the one owner of everything the console mutates: model
//! bounds and enabled flags, the expanded card, solver settings, the loaded
//! dataset, status lines, and the results browser. Front-ends borrow it and
//! change it only through the methods below.
//!
//! Backend calls are split into `begin_*` / `finish_*` pairs so the same
//! transitions work whether the call is awaited inline (CLI) or runs on a
//! background task (TUI).

use crate::browser::BrowserController;
use crate::domain::{
    BoundKind, Dataset, FitOutcome, FittingRequest, FittingResponse, LoadedDataset, OptimizationMethod,
    SolverSettings,
};
use crate::fit::build_request;
use crate::gateway::GatewayError;
use crate::report::{StatusLevel, StatusMessage, dataset_preview};

pub mod bounds;
pub mod selection;

pub use bounds::{BoundsError, ModelConfig, ModelSelectionState, ModelStates};
pub use selection::SelectionController;

pub const UPLOADING: &str = "Uploading dataset...";
pub const STARTING_FIT: &str = "Starting fitting process...";
pub const UPLOAD_IN_PROGRESS: &str = "A dataset upload is already in progress.";
pub const FIT_IN_PROGRESS: &str = "A fitting run is already in progress.";

#[derive(Debug, Clone, Default)]
pub struct Session {
    models: ModelStates,
    selection: SelectionController,
    settings: SolverSettings,
    dataset: Option<Dataset>,
    dataset_name: Option<String>,
    pending_upload: Option<String>,
    dataset_status: Option<StatusMessage>,
    fitting_status: Option<StatusMessage>,
    last_fit: Option<FittingResponse>,
    browser: BrowserController,
    uploading: bool,
    fitting: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn models(&self) -> &ModelStates {
        &self.models
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// File name of the loaded dataset.
    pub fn dataset_name(&self) -> Option<&str> {
        self.dataset_name.as_deref()
    }

    pub fn dataset_status(&self) -> Option<&StatusMessage> {
        self.dataset_status.as_ref()
    }

    /// Two-sentence preview of the dataset status text.
    pub fn dataset_preview(&self) -> String {
        let text = self
            .dataset_status
            .as_ref()
            .filter(|s| !s.is_error() && self.dataset.is_some())
            .map(|s| s.text.as_str())
            .unwrap_or("");
        dataset_preview(text)
    }

    pub fn fitting_status(&self) -> Option<&StatusMessage> {
        self.fitting_status.as_ref()
    }

    /// Response of the most recent fit that reached the backend.
    pub fn last_fit(&self) -> Option<&FittingResponse> {
        self.last_fit.as_ref()
    }

    pub fn browser(&self) -> &BrowserController {
        &self.browser
    }

    pub fn browser_mut(&mut self) -> &mut BrowserController {
        &mut self.browser
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn is_fitting(&self) -> bool {
        self.fitting
    }

    // Model edits.

    pub fn set_bound(&mut self, model: &str, parameter: &str, which: BoundKind, value: f64) -> Result<(), BoundsError> {
        self.models.set_bound(model, parameter, which, value)
    }

    pub fn reset_model(&mut self, model: &str) -> Result<(), BoundsError> {
        self.models.reset_model(model)
    }

    pub fn toggle_enabled(&mut self, model: &str) -> Result<bool, BoundsError> {
        self.selection.toggle_enabled(&mut self.models, model)
    }

    pub fn set_enabled(&mut self, model: &str, enabled: bool) -> Result<(), BoundsError> {
        self.selection.set_enabled(&mut self.models, model, enabled)
    }

    pub fn toggle_expanded(&mut self, model: &str) -> Result<bool, BoundsError> {
        self.selection.toggle_expanded(&self.models, model)
    }

    pub fn collapse(&mut self) {
        self.selection.collapse();
    }

    // Solver settings.

    pub fn set_max_iterations(&mut self, value: f64) {
        self.settings.max_iterations = value;
    }

    pub fn set_method(&mut self, method: OptimizationMethod) {
        self.settings.optimization_method = method;
    }

    pub fn set_save_best(&mut self, save_best: bool) {
        self.settings.save_best = save_best;
    }

    // Dataset upload.

    /// Mark an upload of `file_name` as started.
    pub fn begin_upload(&mut self, file_name: &str) -> Result<StatusMessage, StatusMessage> {
        if self.uploading {
            return Err(StatusMessage::error(UPLOAD_IN_PROGRESS));
        }
        self.uploading = true;
        self.pending_upload = Some(file_name.to_string());
        let status = StatusMessage::info(UPLOADING);
        self.dataset_status = Some(status.clone());
        Ok(status)
    }

    /// Apply the upload result. A failed upload clears any previously
    /// loaded dataset.
    pub fn finish_upload(&mut self, result: Result<LoadedDataset, GatewayError>) -> StatusMessage {
        self.uploading = false;
        let file_name = self.pending_upload.take();
        let status = match result {
            Ok(loaded) => {
                self.dataset = Some(loaded.dataset);
                self.dataset_name = file_name;
                StatusMessage::from_backend(StatusLevel::Info, &loaded.message)
            }
            Err(e) => {
                self.dataset = None;
                self.dataset_name = None;
                StatusMessage::from(e)
            }
        };
        self.dataset_status = Some(status.clone());
        status
    }

    // Fitting.

    /// Build the request for a new run and mark the run as started.
    ///
    /// On a precondition failure the error status is recorded and nothing
    /// should be sent.
    pub fn begin_fit(&mut self) -> Result<FittingRequest, StatusMessage> {
        if self.fitting {
            return Err(StatusMessage::error(FIT_IN_PROGRESS));
        }
        match build_request(&self.models, &self.settings, self.dataset.as_ref()) {
            Ok(request) => {
                self.fitting = true;
                self.fitting_status = Some(StatusMessage::info(STARTING_FIT));
                Ok(request)
            }
            Err(precondition) => {
                let status = StatusMessage::error(precondition.to_string());
                self.fitting_status = Some(status.clone());
                Err(status)
            }
        }
    }

    pub fn finish_fit(&mut self, result: Result<FitOutcome, GatewayError>) -> StatusMessage {
        self.fitting = false;
        let status = match result {
            Ok(outcome) => {
                self.last_fit = outcome.response;
                let level = if outcome.succeeded {
                    StatusLevel::Info
                } else {
                    StatusLevel::Error
                };
                StatusMessage::from_backend(level, &outcome.message)
            }
            Err(e) => StatusMessage::from(e),
        };
        self.fitting_status = Some(status.clone());
        status
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn loaded() -> LoadedDataset {
        LoadedDataset {
            dataset: Dataset {
                columns: vec!["pressure".into()],
                records: vec![json!({"pressure": 1.0}).as_object().cloned().unwrap()],
            },
            message: "Loaded 1 rows. Found 1 experiments. Extra detail.".into(),
        }
    }

    #[test]
    fn fresh_session_has_no_dataset() {
        let s = Session::new();
        assert!(s.dataset().is_none());
        assert_eq!(s.models().enabled_count(), 9);
        assert_eq!(s.dataset_preview(), "Load a dataset to see quick statistics.");
    }

    #[test]
    fn upload_round_trip_stores_dataset() {
        let mut s = Session::new();
        let started = s.begin_upload("iso.csv").unwrap();
        assert_eq!(started.to_string(), "[INFO] Uploading dataset...");
        assert!(s.is_uploading());

        let status = s.finish_upload(Ok(loaded()));
        assert!(!status.is_error());
        assert!(!s.is_uploading());
        assert_eq!(s.dataset_name(), Some("iso.csv"));
        assert_eq!(s.dataset().unwrap().sample_count(), 1);
        assert_eq!(s.dataset_preview(), "Loaded 1 rows. Found 1 experiments");
    }

    #[test]
    fn second_upload_while_busy_is_rejected() {
        let mut s = Session::new();
        s.begin_upload("a.csv").unwrap();
        let err = s.begin_upload("b.csv").unwrap_err();
        assert_eq!(err.to_string(), "[ERROR] A dataset upload is already in progress.");
    }

    #[test]
    fn failed_upload_clears_previous_dataset() {
        let mut s = Session::new();
        s.begin_upload("a.csv").unwrap();
        s.finish_upload(Ok(loaded()));

        s.begin_upload("b.csv").unwrap();
        let status = s.finish_upload(Err(GatewayError::Application("Empty file".into())));
        assert_eq!(status.to_string(), "[ERROR] Empty file");
        assert!(s.dataset().is_none());
        assert_eq!(s.dataset_name(), None);
        assert_eq!(s.dataset_status(), Some(&status));
    }

    #[test]
    fn begin_fit_without_dataset_records_error() {
        let mut s = Session::new();
        let err = s.begin_fit().unwrap_err();
        assert_eq!(
            err.to_string(),
            "[ERROR] Please load a dataset before starting the fitting process."
        );
        assert_eq!(s.fitting_status(), Some(&err));
        assert!(!s.is_fitting());
    }

    #[test]
    fn begin_fit_without_models_records_error() {
        let mut s = Session::new();
        s.begin_upload("a.csv").unwrap();
        s.finish_upload(Ok(loaded()));
        for name in crate::models::model_names() {
            s.set_enabled(name, false).unwrap();
        }
        let err = s.begin_fit().unwrap_err();
        assert_eq!(
            err.text,
            "Please select at least one model before starting the fitting process."
        );
    }

    #[test]
    fn fit_lifecycle() {
        let mut s = Session::new();
        s.begin_upload("a.csv").unwrap();
        s.finish_upload(Ok(loaded()));
        s.set_method(OptimizationMethod::Bfgs);
        s.set_max_iterations(0.2);

        let request = s.begin_fit().unwrap();
        assert_eq!(request.optimization_method, OptimizationMethod::Bfgs);
        assert_eq!(request.max_iterations, 1);
        assert!(s.is_fitting());
        assert_eq!(
            s.fitting_status().map(ToString::to_string).as_deref(),
            Some("[INFO] Starting fitting process...")
        );

        let busy = s.begin_fit().unwrap_err();
        assert_eq!(busy.to_string(), "[ERROR] A fitting run is already in progress.");

        let status = s.finish_fit(Ok(FitOutcome {
            succeeded: true,
            message: "All done.".into(),
            response: Some(FittingResponse::default()),
        }));
        assert_eq!(status.to_string(), "[INFO] All done.");
        assert!(!s.is_fitting());
        assert!(s.last_fit().is_some());
    }

    #[test]
    fn unsuccessful_fit_is_an_error_status() {
        let mut s = Session::new();
        let status = s.finish_fit(Ok(FitOutcome {
            succeeded: false,
            message: "Unknown error".into(),
            response: None,
        }));
        assert_eq!(status.to_string(), "[ERROR] Unknown error");

        let status = s.finish_fit(Err(GatewayError::Timeout(std::time::Duration::from_secs(120))));
        assert_eq!(
            status.to_string(),
            "[ERROR] Failed to reach backend: request timed out after 120s"
        );
    }

    #[test]
    fn disabling_expanded_model_through_session() {
        let mut s = Session::new();
        assert!(s.toggle_expanded("Langmuir").unwrap());
        assert!(!s.toggle_enabled("Langmuir").unwrap());
        assert_eq!(s.selection().expanded(), None);
    }
}
