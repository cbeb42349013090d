//! Shared domain types.
//!
//! Everything that crosses the wire derives `Serialize`/`Deserialize` so the
//! gateway can encode requests and decode responses without extra glue, and so
//! headless commands can echo payloads as JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default solver iteration budget.
pub const DEFAULT_MAX_ITERATIONS: f64 = 10_000.0;

/// Admissible `[min, max]` search range for one model constant.
///
/// Edits are stored exactly as typed, so `min > max` is a legal transient
/// state. Ordering is repaired when a request is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterBound {
    pub min: f64,
    pub max: f64,
}

impl ParameterBound {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn get(&self, which: BoundKind) -> f64 {
        match which {
            BoundKind::Min => self.min,
            BoundKind::Max => self.max,
        }
    }

    pub fn set(&mut self, which: BoundKind, value: f64) {
        match which {
            BoundKind::Min => self.min = value,
            BoundKind::Max => self.max = value,
        }
    }
}

/// Which side of a bound an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundKind {
    Min,
    Max,
}

impl BoundKind {
    pub fn label(self) -> &'static str {
        match self {
            BoundKind::Min => "min",
            BoundKind::Max => "max",
        }
    }
}

impl FromStr for BoundKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min" => Ok(BoundKind::Min),
            "max" => Ok(BoundKind::Max),
            other => Err(format!("expected 'min' or 'max', got '{other}'")),
        }
    }
}

/// Optimization method understood by the fitting backend.
///
/// The serialized names are the backend's labels verbatim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum OptimizationMethod {
    #[default]
    #[serde(rename = "LSS")]
    #[value(name = "LSS")]
    Lss,
    #[serde(rename = "BFGS")]
    #[value(name = "BFGS")]
    Bfgs,
    #[serde(rename = "L-BFGS-B")]
    #[value(name = "L-BFGS-B")]
    LBfgsB,
    #[serde(rename = "Nelder-Mead")]
    #[value(name = "Nelder-Mead")]
    NelderMead,
    #[serde(rename = "Powell")]
    #[value(name = "Powell")]
    Powell,
}

impl OptimizationMethod {
    pub const ALL: [OptimizationMethod; 5] = [
        OptimizationMethod::Lss,
        OptimizationMethod::Bfgs,
        OptimizationMethod::LBfgsB,
        OptimizationMethod::NelderMead,
        OptimizationMethod::Powell,
    ];

    /// Label sent over the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            OptimizationMethod::Lss => "LSS",
            OptimizationMethod::Bfgs => "BFGS",
            OptimizationMethod::LBfgsB => "L-BFGS-B",
            OptimizationMethod::NelderMead => "Nelder-Mead",
            OptimizationMethod::Powell => "Powell",
        }
    }

    /// Human-readable label for terminal output.
    pub fn label(self) -> &'static str {
        match self {
            OptimizationMethod::Lss => "Least Squares (LSS)",
            OptimizationMethod::Bfgs => "BFGS",
            OptimizationMethod::LBfgsB => "L-BFGS-B",
            OptimizationMethod::NelderMead => "Nelder-Mead",
            OptimizationMethod::Powell => "Powell",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for OptimizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Parses a backend label. Matching ignores case and treats `_` like `-`;
/// anything outside the five known methods is rejected.
impl FromStr for OptimizationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "-").to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|m| m.wire_name().to_ascii_uppercase() == wanted)
            .ok_or_else(|| format!("unknown optimization method '{}'", s.trim()))
    }
}

/// Solver settings as edited by the user.
///
/// `max_iterations` keeps the raw numeric input; it is clamped to a positive
/// integer only when a request is built.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverSettings {
    pub max_iterations: f64,
    pub optimization_method: OptimizationMethod,
    /// Ask the backend to persist the best model's fitted data.
    pub save_best: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            optimization_method: OptimizationMethod::Lss,
            save_best: false,
        }
    }
}

/// One row of tabular data: column name to JSON value.
pub type Record = Map<String, Value>;

/// Tabular experimental data as returned by the backend after upload.
///
/// The client never interprets the records; they are forwarded verbatim in
/// every fitting request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn sample_count(&self) -> usize {
        self.records.len()
    }
}

/// A raw dataset file ready to be sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Normalized bounds for one model, grouped by bound type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelBounds {
    pub min: BTreeMap<String, f64>,
    pub max: BTreeMap<String, f64>,
    pub initial: BTreeMap<String, f64>,
}

/// Complete payload for one fitting run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittingRequest {
    pub max_iterations: u64,
    pub optimization_method: OptimizationMethod,
    pub save_best: bool,
    pub parameter_bounds: BTreeMap<String, ModelBounds>,
    pub dataset: Dataset,
}

/// Body returned by `POST fitting/run`. Every field is optional so that a
/// partial or failed response still decodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FittingResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub processed_rows: Option<f64>,
    #[serde(default)]
    pub best_model_saved: Option<bool>,
    #[serde(default)]
    pub models: Option<Vec<String>>,
}

/// A dataset accepted by the backend, with its status text.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub message: String,
}

/// Result of a fit submission that reached the backend.
///
/// `succeeded == false` means the backend answered with a non-success status;
/// `response` still carries whatever it reported.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub succeeded: bool,
    pub message: String,
    pub response: Option<FittingResponse>,
}

/// A browsable results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserTable {
    pub table_name: String,
    pub display_name: String,
}

/// One row of a browsed table.
pub type BrowserRow = Record;

/// Rows and metadata of one browsed table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableData {
    pub table_name: String,
    pub display_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<BrowserRow>,
    pub row_count: usize,
    pub column_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_serializes_with_backend_labels() {
        let json = serde_json::to_string(&OptimizationMethod::LBfgsB).unwrap();
        assert_eq!(json, "\"L-BFGS-B\"");
        let back: OptimizationMethod = serde_json::from_str("\"Nelder-Mead\"").unwrap();
        assert_eq!(back, OptimizationMethod::NelderMead);
    }

    #[test]
    fn method_parse_rejects_unknown_labels() {
        assert_eq!("l_bfgs_b".parse::<OptimizationMethod>(), Ok(OptimizationMethod::LBfgsB));
        assert_eq!(" powell ".parse::<OptimizationMethod>(), Ok(OptimizationMethod::Powell));
        assert!("CG".parse::<OptimizationMethod>().is_err());
    }

    #[test]
    fn method_cycle_wraps() {
        assert_eq!(OptimizationMethod::Powell.next(), OptimizationMethod::Lss);
        assert_eq!(OptimizationMethod::Lss.prev(), OptimizationMethod::Powell);
    }

    #[test]
    fn fitting_response_tolerates_missing_fields() {
        let resp: FittingResponse = serde_json::from_str(r#"{"models": ["Langmuir"]}"#).unwrap();
        assert_eq!(resp.status, None);
        assert_eq!(resp.models.as_deref(), Some(&["Langmuir".to_string()][..]));
    }

    #[test]
    fn default_settings() {
        let s = SolverSettings::default();
        assert_eq!(s.max_iterations, 10_000.0);
        assert_eq!(s.optimization_method, OptimizationMethod::Lss);
        assert!(!s.save_best);
    }
}
