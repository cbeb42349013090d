//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and resolves settings
//! - sets up logging
//! - builds the tokio runtime
//! - dispatches to the TUI or a headless command

use clap::Parser;
use tokio::runtime::Runtime;
use tracing::info;

use crate::cli::{Cli, Command, FitArgs, TableArgs};
use crate::config::ClientSettings;
use crate::error::AppError;
use crate::gateway::{Backend, HttpGateway};
use crate::logging::{self, LogTarget};
use crate::report::{format_catalog, format_request_summary, format_table, format_table_list, StatusMessage};
use crate::session::Session;

pub mod pipeline;

/// Entry point for the `adsorfit` binary.
pub fn run() -> Result<(), AppError> {
    // `adsorfit` and `adsorfit --api-base-url ...` open the TUI.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    let settings = ClientSettings::resolve(&cli.global.overrides())?;
    let target = match cli.command {
        Command::Tui => LogTarget::FileOnly,
        _ => LogTarget::Stderr,
    };
    logging::init(target, cli.global.verbose, settings.log_file.as_deref())?;

    match cli.command {
        Command::Models => {
            print!("{}", format_catalog());
            Ok(())
        }
        Command::Tui => {
            let runtime = runtime()?;
            crate::tui::run(&settings, runtime.handle())
        }
        Command::Fit(args) => handle_fit(&settings, args),
        Command::Tables => handle_tables(&settings),
        Command::Table(args) => handle_table(&settings, args),
    }
}

fn runtime() -> Result<Runtime, AppError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::runtime(format!("Failed to start async runtime: {e}")))
}

fn gateway(settings: &ClientSettings) -> Result<HttpGateway, AppError> {
    HttpGateway::from_settings(settings).map_err(|e| AppError::usage(e.to_string()))
}

/// A status that ends a headless command: errors become exit code 3.
fn finish(status: StatusMessage) -> Result<(), AppError> {
    if status.is_error() {
        return Err(AppError::backend(status.to_string()));
    }
    println!("{status}");
    Ok(())
}

fn handle_fit(settings: &ClientSettings, args: FitArgs) -> Result<(), AppError> {
    let mut session = Session::new();
    configure_session(&mut session, &args)?;
    if session.models().enabled_count() == 0 {
        let status = StatusMessage::error(crate::fit::Precondition::NoModelSelected.to_string());
        return Err(AppError::usage(status.to_string()));
    }

    let gateway = gateway(settings)?;
    let runtime = runtime()?;
    runtime.block_on(async {
        let status = pipeline::upload_dataset(&mut session, &gateway, &args.dataset).await?;
        finish(status)?;

        if args.show_request {
            if let Ok(request) =
                crate::fit::build_request(session.models(), session.settings(), session.dataset())
            {
                print!("{}", format_request_summary(&request));
            }
        }

        println!("{}", StatusMessage::info(crate::session::STARTING_FIT));
        let status = pipeline::run_fitting(&mut session, &gateway).await;
        info!(failed = status.is_error(), "fitting run finished");
        finish(status)
    })
}

/// Apply `fit` flags to a fresh session.
pub fn configure_session(session: &mut Session, args: &FitArgs) -> Result<(), AppError> {
    let usage = |e: crate::session::BoundsError| AppError::usage(e.to_string());

    if !args.only.is_empty() {
        for name in &args.only {
            session.models().get(name).map_err(usage)?;
        }
        for name in crate::models::model_names() {
            let keep = args
                .only
                .iter()
                .any(|o| crate::models::find(o).is_some_and(|m| m.name == name));
            session.set_enabled(name, keep).map_err(usage)?;
        }
    }
    for name in &args.disable {
        session.set_enabled(name, false).map_err(usage)?;
    }
    for edit in &args.set {
        session
            .set_bound(&edit.model, &edit.parameter, edit.which, edit.value)
            .map_err(usage)?;
    }

    session.set_method(args.method);
    session.set_max_iterations(args.max_iterations);
    session.set_save_best(args.save_best);
    Ok(())
}

fn handle_tables(settings: &ClientSettings) -> Result<(), AppError> {
    let gateway = gateway(settings)?;
    let runtime = runtime()?;
    let tables = runtime
        .block_on(gateway.list_tables())
        .map_err(|e| AppError::backend(StatusMessage::from(e).to_string()))?;
    if tables.is_empty() {
        println!("{}", StatusMessage::info("No tables available."));
    } else {
        print!("{}", format_table_list(&tables));
    }
    Ok(())
}

fn handle_table(settings: &ClientSettings, args: TableArgs) -> Result<(), AppError> {
    let gateway = gateway(settings)?;
    let runtime = runtime()?;
    let mut session = Session::new();

    let status = runtime
        .block_on(pipeline::select_table(&mut session, &gateway, &args.name))
        .ok_or_else(|| AppError::usage("Table name must not be empty."))?;
    if status.is_error() {
        return Err(AppError::backend(status.to_string()));
    }

    let data = session.browser().data();
    match &args.export {
        Some(path) => {
            crate::io::write_table_csv(path, data)?;
            println!(
                "{}",
                StatusMessage::info(format!("Exported {} rows to {}", data.rows.len(), path.display()))
            );
        }
        None => print!("{}", format_table(data, args.limit)),
    }
    Ok(())
}

/// Rewrite argv so `adsorfit` defaults to `adsorfit tui`.
///
/// Rules:
/// - `adsorfit`                        -> `adsorfit tui`
/// - `adsorfit --timeout 5`            -> `adsorfit --timeout 5 tui`
/// - `adsorfit --help/--version/help`  -> unchanged
/// - any argv with a positional word   -> unchanged (clap resolves it)
///
/// Values of the global options are skipped, so `--log-file fit` does not
/// count as naming the `fit` command.
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    const VALUE_OPTIONS: [&str; 3] = ["--api-base-url", "--timeout", "--log-file"];

    let mut names_command = false;
    let mut args = argv.iter().skip(1);
    while let Some(arg) = args.next() {
        let arg = arg.as_str();
        if VALUE_OPTIONS.contains(&arg) {
            args.next();
        } else if matches!(arg, "-h" | "--help" | "-V" | "--version") || !arg.starts_with('-') {
            names_command = true;
            break;
        }
    }
    if !names_command {
        argv.push("tui".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(args(&["adsorfit"])), args(&["adsorfit", "tui"]));
        assert_eq!(
            rewrite_args(args(&["adsorfit", "--timeout", "5"])),
            args(&["adsorfit", "--timeout", "5", "tui"])
        );
    }

    #[test]
    fn explicit_commands_are_untouched() {
        let fit = args(&["adsorfit", "-v", "fit", "--dataset", "a.csv"]);
        assert_eq!(rewrite_args(fit.clone()), fit);
        let help = args(&["adsorfit", "--help"]);
        assert_eq!(rewrite_args(help.clone()), help);
    }

    #[test]
    fn option_values_do_not_name_commands() {
        assert_eq!(
            rewrite_args(args(&["adsorfit", "--log-file", "fit"])),
            args(&["adsorfit", "--log-file", "fit", "tui"])
        );
        assert_eq!(
            rewrite_args(args(&["adsorfit", "--log-file=tables", "-v"])),
            args(&["adsorfit", "--log-file=tables", "-v", "tui"])
        );
        let tables = args(&["adsorfit", "--timeout", "5", "tables"]);
        assert_eq!(rewrite_args(tables.clone()), tables);

        let argv = rewrite_args(args(&["adsorfit", "--log-file", "fit"]));
        let cli = Cli::parse_from(argv);
        assert!(matches!(cli.command, Command::Tui));
        assert_eq!(cli.global.log_file, Some(std::path::PathBuf::from("fit")));
    }

    #[test]
    fn fit_flags_configure_session() {
        let cli = Cli::parse_from([
            "adsorfit",
            "fit",
            "--dataset",
            "a.csv",
            "--only",
            "langmuir",
            "--only",
            "Sips",
            "--disable",
            "Sips",
            "--set",
            "Langmuir.qsat.max=250",
            "--max-iterations",
            "0",
            "--save-best",
        ]);
        let Command::Fit(fit) = cli.command else {
            panic!("expected fit");
        };
        let mut session = Session::new();
        configure_session(&mut session, &fit).unwrap();

        assert_eq!(session.models().enabled_names(), vec!["Langmuir"]);
        assert_eq!(session.models().bound("Langmuir", "qsat").unwrap().max, 250.0);
        assert_eq!(session.settings().max_iterations, 0.0);
        assert!(session.settings().save_best);
    }

    #[test]
    fn unknown_model_flag_is_usage_error() {
        let cli = Cli::parse_from(["adsorfit", "fit", "--dataset", "a.csv", "--only", "BET"]);
        let Command::Fit(fit) = cli.command else {
            panic!("expected fit");
        };
        let err = configure_session(&mut Session::new(), &fit).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
        assert_eq!(err.message(), "unknown model 'BET'");
    }
}
