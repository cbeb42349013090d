//! Command-line parsing for the ADSORFIT console.
//!
//! Parsing and validation of flag values live here; dispatch lives in
//! `crate::app`.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};

use crate::config::SettingsOverrides;
use crate::domain::{BoundKind, OptimizationMethod};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "adsorfit", version, about = "Adsorption isotherm fitting console")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Backend base URL (overrides ADSORFIT_API_BASE_URL).
    #[arg(long, global = true, value_name = "URL")]
    pub api_base_url: Option<String>,

    /// Per-request timeout in seconds (overrides ADSORFIT_HTTP_TIMEOUT).
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Append logs to this file (overrides ADSORFIT_LOG_FILE).
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log completed operations, not just failures.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            api_base_url: self.api_base_url.clone(),
            timeout_secs: self.timeout,
            log_file: self.log_file.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive console (default).
    Tui,
    /// Upload a dataset, run one fit, and print the statuses.
    Fit(FitArgs),
    /// Print the isotherm model catalog.
    Models,
    /// List browsable result tables.
    Tables,
    /// Print or export one result table.
    Table(TableArgs),
}

#[derive(Debug, Clone, Args)]
pub struct FitArgs {
    /// Dataset file to upload (.csv, .xls, .xlsx).
    #[arg(long, value_name = "PATH")]
    pub dataset: PathBuf,

    /// Optimization method.
    #[arg(long, value_enum, default_value_t = OptimizationMethod::Lss)]
    pub method: OptimizationMethod,

    /// Solver iteration budget (rounded, minimum 1).
    #[arg(long, default_value_t = crate::domain::DEFAULT_MAX_ITERATIONS, allow_negative_numbers = true)]
    pub max_iterations: f64,

    /// Ask the backend to save the best model's fitted data.
    #[arg(long)]
    pub save_best: bool,

    /// Fit only these models (repeatable).
    #[arg(long = "only", value_name = "MODEL")]
    pub only: Vec<String>,

    /// Leave these models out (repeatable).
    #[arg(long = "disable", value_name = "MODEL")]
    pub disable: Vec<String>,

    /// Override one bound, e.g. `--set Langmuir.k.max=5` (repeatable).
    #[arg(long = "set", value_name = "MODEL.PARAM.min|max=VALUE", allow_negative_numbers = true)]
    pub set: Vec<BoundOverride>,

    /// Print the request summary before sending it.
    #[arg(long)]
    pub show_request: bool,
}

#[derive(Debug, Clone, Args)]
pub struct TableArgs {
    /// Table name as listed by `adsorfit tables`.
    pub name: String,

    /// Maximum rows to print.
    #[arg(long, default_value_t = 50)]
    pub limit: usize,

    /// Write all rows to this CSV file instead of printing them.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

/// One `--set MODEL.PARAM.min|max=VALUE` edit.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundOverride {
    pub model: String,
    pub parameter: String,
    pub which: BoundKind,
    pub value: f64,
}

impl FromStr for BoundOverride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let usage = || format!("expected MODEL.PARAM.min|max=VALUE, got '{s}'");

        let (target, value) = s.split_once('=').ok_or_else(usage)?;
        let mut parts = target.rsplitn(3, '.');
        let which = parts.next().ok_or_else(usage)?;
        let parameter = parts.next().filter(|p| !p.is_empty()).ok_or_else(usage)?;
        let model = parts.next().filter(|m| !m.is_empty()).ok_or_else(usage)?;

        let which = which.parse::<BoundKind>()?;
        let value = value
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid bound value '{}' in '{s}'", value.trim()))?;

        Ok(Self {
            model: model.trim().to_string(),
            parameter: parameter.trim().to_string(),
            which,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_bound_override() {
        let o: BoundOverride = "Dual-Site Langmuir.k2.max=0.5".parse().unwrap();
        assert_eq!(o.model, "Dual-Site Langmuir");
        assert_eq!(o.parameter, "k2");
        assert_eq!(o.which, BoundKind::Max);
        assert_eq!(o.value, 0.5);

        let o: BoundOverride = "langmuir.k.MIN=-1e-3".parse().unwrap();
        assert_eq!(o.which, BoundKind::Min);
        assert_eq!(o.value, -1e-3);
    }

    #[test]
    fn rejects_malformed_override() {
        assert!("Langmuir.k=1".parse::<BoundOverride>().is_err());
        assert!("Langmuir.k.mid=1".parse::<BoundOverride>().is_err());
        assert!("Langmuir.k.min=abc".parse::<BoundOverride>().is_err());
        assert!("Langmuir.k.min".parse::<BoundOverride>().is_err());
    }

    #[test]
    fn fit_flags_parse() {
        let cli = Cli::parse_from([
            "adsorfit",
            "--timeout",
            "30",
            "fit",
            "--dataset",
            "iso.csv",
            "--method",
            "Nelder-Mead",
            "--only",
            "Langmuir",
            "--set",
            "Langmuir.k.max=5",
        ]);
        assert_eq!(cli.global.timeout, Some(30.0));
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.method, OptimizationMethod::NelderMead);
        assert_eq!(args.only, vec!["Langmuir".to_string()]);
        assert_eq!(args.set[0].value, 5.0);
        assert_eq!(args.max_iterations, 10_000.0);
    }

    #[test]
    fn unknown_method_is_rejected() {
        let parsed = Cli::try_parse_from(["adsorfit", "fit", "--dataset", "x.csv", "--method", "CG"]);
        assert!(parsed.is_err());
    }
}
