//! TUI state and key handling.
//!
//! `App` holds the `Session` plus view-only state (tab, cursors, edit
//! buffer). Key presses never block: anything that needs the backend is
//! queued as a `Job`, and the event loop hands results back as a
//! `Completion`.

use chrono::{DateTime, Local};
use crossterm::event::KeyCode;
use tracing::debug;

use crate::browser::{BrowserFetch, TableTicket};
use crate::domain::{BoundKind, BrowserTable, DatasetUpload, FitOutcome, FittingRequest, LoadedDataset, TableData};
use crate::gateway::GatewayError;
use crate::io::read_dataset_upload;
use crate::report::StatusMessage;
use crate::session::Session;

/// Rows moved by PgUp/PgDn in the browser.
const PAGE: usize = 10;
/// Entries kept in the activity log.
const LOG_CAPACITY: usize = 200;

/// Backend work requested by a key press.
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Upload(DatasetUpload),
    Fit(FittingRequest),
    ListTables,
    FetchTable(TableTicket),
}

impl Job {
    pub fn kind(&self) -> &'static str {
        match self {
            Job::Upload(_) => "upload",
            Job::Fit(_) => "fit",
            Job::ListTables => "list_tables",
            Job::FetchTable(_) => "fetch_table",
        }
    }
}

/// Result of a `Job`, delivered back to the UI thread.
#[derive(Debug, Clone)]
pub enum Completion {
    DatasetLoaded(Result<LoadedDataset, GatewayError>),
    FitFinished(Result<FitOutcome, GatewayError>),
    TablesListed(Result<Vec<BrowserTable>, GatewayError>),
    TableFetched {
        ticket: TableTicket,
        result: Result<TableData, GatewayError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Models,
    Fitting,
    Browser,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Models, Tab::Fitting, Tab::Browser];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Models => "Models",
            Tab::Fitting => "Fitting",
            Tab::Browser => "Browser",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Models => 0,
            Tab::Fitting => 1,
            Tab::Browser => 2,
        }
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Rows of the Fitting tab, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FittingField {
    MaxIterations,
    Method,
    SaveBest,
    DatasetPath,
    Start,
}

impl FittingField {
    pub const ALL: [FittingField; 5] = [
        FittingField::MaxIterations,
        FittingField::Method,
        FittingField::SaveBest,
        FittingField::DatasetPath,
        FittingField::Start,
    ];
}

/// What the edit buffer will be written to on commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Bound {
        model: &'static str,
        parameter: &'static str,
        which: BoundKind,
    },
    MaxIterations,
    DatasetPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    pub target: EditTarget,
    pub text: String,
}

pub struct App {
    pub session: Session,
    pub api_base_url: String,
    pub tab: Tab,
    pub model_cursor: usize,
    pub bound_cursor: usize,
    pub fitting_cursor: usize,
    pub dataset_path: String,
    pub edit: Option<EditBuffer>,
    pub table_scroll: usize,
    pub status: Option<StatusMessage>,
    pub activity: Vec<(DateTime<Local>, StatusMessage)>,
    jobs: Vec<Job>,
}

impl App {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            session: Session::new(),
            api_base_url: api_base_url.into(),
            tab: Tab::Models,
            model_cursor: 0,
            bound_cursor: 0,
            fitting_cursor: 0,
            dataset_path: String::new(),
            edit: None,
            table_scroll: 0,
            status: None,
            activity: Vec::new(),
            jobs: Vec::new(),
        }
    }

    /// Jobs queued since the last call.
    pub fn take_jobs(&mut self) -> Vec<Job> {
        std::mem::take(&mut self.jobs)
    }

    pub fn fitting_field(&self) -> FittingField {
        FittingField::ALL[self.fitting_cursor.min(FittingField::ALL.len() - 1)]
    }

    /// Model under the cursor on the Models tab.
    pub fn cursor_model(&self) -> Option<&'static str> {
        self.session.models().at(self.model_cursor).map(|s| s.spec.name)
    }

    /// `(parameter, side)` pairs of the expanded card, in display order.
    pub fn bound_fields(&self) -> Vec<(&'static str, BoundKind)> {
        let Some(model) = self.session.selection().expanded() else {
            return Vec::new();
        };
        let Ok(config) = self.session.models().config(model) else {
            return Vec::new();
        };
        config
            .iter()
            .flat_map(|(name, _)| [(name, BoundKind::Min), (name, BoundKind::Max)])
            .collect()
    }

    /// Handle one key press. Returns `true` when the app should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.edit.is_some() {
            self.handle_edit_key(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => self.switch_tab(self.tab.next()),
            KeyCode::BackTab => self.switch_tab(self.tab.prev()),
            KeyCode::Char('1') => self.switch_tab(Tab::Models),
            KeyCode::Char('2') => self.switch_tab(Tab::Fitting),
            KeyCode::Char('3') => self.switch_tab(Tab::Browser),
            KeyCode::Char('f') => self.start_fit(),
            _ => match self.tab {
                Tab::Models => self.handle_models_key(code),
                Tab::Fitting => self.handle_fitting_key(code),
                Tab::Browser => self.handle_browser_key(code),
            },
        }
        false
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        if tab == Tab::Browser {
            if let Some(fetch) = self.session.browser_mut().mount() {
                self.queue_browser(fetch);
            }
        }
    }

    fn handle_models_key(&mut self, code: KeyCode) {
        let expanded = self.session.selection().expanded();
        match code {
            KeyCode::Up if expanded.is_some() => {
                self.bound_cursor = self.bound_cursor.saturating_sub(1);
            }
            KeyCode::Down if expanded.is_some() => {
                let last = self.bound_fields().len().saturating_sub(1);
                self.bound_cursor = (self.bound_cursor + 1).min(last);
            }
            KeyCode::Up => self.model_cursor = self.model_cursor.saturating_sub(1),
            KeyCode::Down => {
                let last = self.session.models().len().saturating_sub(1);
                self.model_cursor = (self.model_cursor + 1).min(last);
            }
            KeyCode::Enter if expanded.is_some() => self.begin_bound_edit(),
            KeyCode::Enter => {
                if let Some(model) = self.cursor_model() {
                    match self.session.toggle_expanded(model) {
                        Ok(true) => self.bound_cursor = 0,
                        Ok(false) => self.set_status(StatusMessage::info(format!(
                            "{model} is disabled; enable it to edit its bounds."
                        ))),
                        Err(e) => self.set_status(StatusMessage::error(e.to_string())),
                    }
                }
            }
            KeyCode::Esc => self.session.collapse(),
            KeyCode::Char(' ') => {
                if let Some(model) = self.cursor_model() {
                    match self.session.toggle_enabled(model) {
                        Ok(enabled) => {
                            let verb = if enabled { "enabled" } else { "disabled" };
                            self.set_status(StatusMessage::info(format!("{model} {verb}.")));
                        }
                        Err(e) => self.set_status(StatusMessage::error(e.to_string())),
                    }
                }
            }
            KeyCode::Char('d') => {
                if let Some(model) = self.cursor_model() {
                    match self.session.reset_model(model) {
                        Ok(()) => self.set_status(StatusMessage::info(format!("{model} bounds reset to defaults."))),
                        Err(e) => self.set_status(StatusMessage::error(e.to_string())),
                    }
                }
            }
            _ => {}
        }
    }

    fn begin_bound_edit(&mut self) {
        let Some(model) = self.session.selection().expanded() else {
            return;
        };
        let fields = self.bound_fields();
        let Some(&(parameter, which)) = fields.get(self.bound_cursor) else {
            return;
        };
        let current = self
            .session
            .models()
            .bound(model, parameter)
            .map(|b| b.get(which))
            .unwrap_or_default();
        self.edit = Some(EditBuffer {
            target: EditTarget::Bound {
                model,
                parameter,
                which,
            },
            text: current.to_string(),
        });
    }

    fn handle_fitting_key(&mut self, code: KeyCode) {
        let field = self.fitting_field();
        match code {
            KeyCode::Up => self.fitting_cursor = self.fitting_cursor.saturating_sub(1),
            KeyCode::Down => {
                self.fitting_cursor = (self.fitting_cursor + 1).min(FittingField::ALL.len() - 1);
            }
            KeyCode::Left if field == FittingField::Method => {
                let method = self.session.settings().optimization_method.prev();
                self.session.set_method(method);
            }
            KeyCode::Right if field == FittingField::Method => {
                let method = self.session.settings().optimization_method.next();
                self.session.set_method(method);
            }
            KeyCode::Char(' ') if field == FittingField::SaveBest => self.toggle_save_best(),
            KeyCode::Enter => match field {
                FittingField::MaxIterations => {
                    self.edit = Some(EditBuffer {
                        target: EditTarget::MaxIterations,
                        text: self.session.settings().max_iterations.to_string(),
                    });
                }
                FittingField::Method => {
                    let method = self.session.settings().optimization_method.next();
                    self.session.set_method(method);
                }
                FittingField::SaveBest => self.toggle_save_best(),
                FittingField::DatasetPath => {
                    self.edit = Some(EditBuffer {
                        target: EditTarget::DatasetPath,
                        text: self.dataset_path.clone(),
                    });
                }
                FittingField::Start => self.start_fit(),
            },
            _ => {}
        }
    }

    fn toggle_save_best(&mut self) {
        let save_best = !self.session.settings().save_best;
        self.session.set_save_best(save_best);
    }

    fn handle_browser_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.select_table_offset(-1),
            KeyCode::Down => self.select_table_offset(1),
            KeyCode::Char('r') => {
                if let Some(ticket) = self.session.browser_mut().refresh() {
                    self.jobs.push(Job::FetchTable(ticket));
                }
            }
            KeyCode::Char('R') => {
                if let Some(fetch) = self.session.browser_mut().refresh_tables() {
                    self.queue_browser(fetch);
                }
            }
            KeyCode::PageUp => self.table_scroll = self.table_scroll.saturating_sub(PAGE),
            KeyCode::PageDown => {
                let last = self.session.browser().rows().len().saturating_sub(1);
                self.table_scroll = (self.table_scroll + PAGE).min(last);
            }
            _ => {}
        }
    }

    fn select_table_offset(&mut self, delta: isize) {
        if let Some(ticket) = self.session.browser_mut().select_offset(delta) {
            self.table_scroll = 0;
            self.jobs.push(Job::FetchTable(ticket));
        }
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        let Some(edit) = self.edit.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => self.edit = None,
            KeyCode::Enter => {
                if let Some(edit) = self.edit.take() {
                    self.commit_edit(edit);
                }
            }
            KeyCode::Backspace => {
                edit.text.pop();
            }
            KeyCode::Char(c) => {
                let accepted = match edit.target {
                    EditTarget::DatasetPath => !c.is_control(),
                    _ => c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'),
                };
                if accepted {
                    edit.text.push(c);
                }
            }
            _ => {}
        }
    }

    fn commit_edit(&mut self, edit: EditBuffer) {
        match edit.target {
            EditTarget::DatasetPath => {
                self.dataset_path = edit.text.trim().to_string();
                self.start_upload();
            }
            EditTarget::MaxIterations => match parse_number(&edit.text) {
                Some(value) => self.session.set_max_iterations(value),
                None => self.reject_number(&edit.text),
            },
            EditTarget::Bound {
                model,
                parameter,
                which,
            } => match parse_number(&edit.text) {
                Some(value) => {
                    if let Err(e) = self.session.set_bound(model, parameter, which, value) {
                        self.set_status(StatusMessage::error(e.to_string()));
                    }
                }
                None => self.reject_number(&edit.text),
            },
        }
    }

    fn reject_number(&mut self, text: &str) {
        self.set_status(StatusMessage::error(format!("'{}' is not a number.", text.trim())));
    }

    /// Read the dataset file and queue the upload.
    pub fn start_upload(&mut self) {
        if self.dataset_path.is_empty() {
            self.set_status(StatusMessage::error("Enter a dataset path first."));
            return;
        }
        let upload = match read_dataset_upload(std::path::Path::new(&self.dataset_path)) {
            Ok(upload) => upload,
            Err(e) => {
                self.set_status(StatusMessage::error(e.message()));
                return;
            }
        };
        match self.session.begin_upload(&upload.file_name) {
            Ok(status) => {
                self.set_status(status);
                self.jobs.push(Job::Upload(upload));
            }
            Err(status) => self.set_status(status),
        }
    }

    /// Build the request and queue the run; precondition failures only
    /// update the status.
    pub fn start_fit(&mut self) {
        match self.session.begin_fit() {
            Ok(request) => {
                if let Some(status) = self.session.fitting_status().cloned() {
                    self.set_status(status);
                }
                self.jobs.push(Job::Fit(request));
            }
            Err(status) => self.set_status(status),
        }
    }

    /// Apply a finished backend call.
    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::DatasetLoaded(result) => {
                let status = self.session.finish_upload(result);
                self.set_status(status);
            }
            Completion::FitFinished(result) => {
                let status = self.session.finish_fit(result);
                self.set_status(status);
            }
            Completion::TablesListed(result) => {
                if let Some(ticket) = self.session.browser_mut().apply_tables(result) {
                    self.table_scroll = 0;
                    self.jobs.push(Job::FetchTable(ticket));
                }
                if let Some(error) = self.session.browser().error() {
                    let status = StatusMessage::error(error);
                    self.set_status(status);
                }
            }
            Completion::TableFetched { ticket, result } => {
                if !self.session.browser_mut().apply_table(&ticket, result) {
                    debug!(table = %ticket.table, "ignored superseded table result");
                    return;
                }
                let last = self.session.browser().rows().len().saturating_sub(1);
                self.table_scroll = self.table_scroll.min(last);
                if let Some(error) = self.session.browser().error() {
                    let status = StatusMessage::error(error);
                    self.set_status(status);
                }
            }
        }
    }

    fn queue_browser(&mut self, fetch: BrowserFetch) {
        match fetch {
            BrowserFetch::Tables => self.jobs.push(Job::ListTables),
            BrowserFetch::Table(ticket) => self.jobs.push(Job::FetchTable(ticket)),
        }
    }

    fn set_status(&mut self, status: StatusMessage) {
        self.activity.push((Local::now(), status.clone()));
        if self.activity.len() > LOG_CAPACITY {
            self.activity.remove(0);
        }
        self.status = Some(status);
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
