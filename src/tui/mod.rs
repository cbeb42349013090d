//! Ratatui-based terminal UI.
//!
//! Three tabs: *Models* (enable and bound the isotherm models), *Fitting*
//! (solver settings, dataset upload, run), and *Browser* (persisted result
//! tables). Backend calls run on the tokio runtime; their results come back
//! over a channel and are applied on the UI thread every tick.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::config::ClientSettings;
use crate::error::AppError;
use crate::gateway::{Backend, HttpGateway};

mod app;
mod view;

pub use app::{App, Completion, Job, Tab};

/// UI tick: how long to wait for input before checking for completions.
const TICK: Duration = Duration::from_millis(100);

/// Start the TUI.
pub fn run(settings: &ClientSettings, runtime: &Handle) -> Result<(), AppError> {
    let gateway = HttpGateway::from_settings(settings).map_err(|e| AppError::usage(e.to_string()))?;
    let backend: Arc<dyn Backend> = Arc::new(gateway);

    let _guard = TerminalGuard::new()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    info!(base_url = %settings.api_base_url, "console started");
    let mut app = App::new(settings.api_base_url.as_str());
    event_loop(&mut app, &mut terminal, runtime, backend)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

fn event_loop<B: ratatui::backend::Backend>(
    app: &mut App,
    terminal: &mut Terminal<B>,
    runtime: &Handle,
    backend: Arc<dyn Backend>,
) -> Result<(), AppError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut needs_redraw = true;

    loop {
        for job in app.take_jobs() {
            spawn_job(runtime, Arc::clone(&backend), tx.clone(), job);
        }
        if drain_completions(app, &mut rx) {
            needs_redraw = true;
            // Completions may queue follow-up jobs (e.g. first table fetch).
            continue;
        }

        if needs_redraw {
            terminal
                .draw(|f| view::draw(app, f))
                .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
            needs_redraw = false;
        }

        if !event::poll(TICK).map_err(|e| AppError::runtime(format!("Event poll error: {e}")))? {
            continue;
        }

        match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key.code) {
                    break;
                }
                needs_redraw = true;
            }
            Event::Resize(_, _) => {
                needs_redraw = true;
            }
            _ => {}
        }
    }
    Ok(())
}

/// Apply every completion that has arrived. Returns whether any did.
fn drain_completions(app: &mut App, rx: &mut UnboundedReceiver<Completion>) -> bool {
    let mut applied = false;
    while let Ok(completion) = rx.try_recv() {
        app.apply(completion);
        applied = true;
    }
    applied
}

fn spawn_job(runtime: &Handle, backend: Arc<dyn Backend>, tx: UnboundedSender<Completion>, job: Job) {
    debug!(job = job.kind(), "spawning backend job");
    runtime.spawn(async move {
        let completion = match job {
            Job::Upload(upload) => Completion::DatasetLoaded(backend.load_dataset(upload).await),
            Job::Fit(request) => Completion::FitFinished(backend.run_fitting(&request).await),
            Job::ListTables => Completion::TablesListed(backend.list_tables().await),
            Job::FetchTable(ticket) => {
                let result = backend.fetch_table(&ticket.table).await;
                Completion::TableFetched { ticket, result }
            }
        };
        // The receiver is gone once the UI has exited.
        let _ = tx.send(completion);
    });
}
