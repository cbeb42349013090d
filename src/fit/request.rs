//! Build the fitting payload from session state.
//!
//! The builder never rejects bounds. For every constant of every enabled model:
//! 1. read `{min, max}` as entered
//! 2. swap them if `max < min`
//! 3. take the midpoint as the initial guess
//!
//! Disabled models are left out of `parameter_bounds` entirely.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::{Dataset, FittingRequest, ModelBounds, ParameterBound, SolverSettings};
use crate::session::bounds::ModelStates;

/// Local reasons a run cannot start. No request is sent in either case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("Please load a dataset before starting the fitting process.")]
    NoDataset,

    #[error("Please select at least one model before starting the fitting process.")]
    NoModelSelected,
}

/// A bound with its ordering repaired and the derived initial guess.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBound {
    pub min: f64,
    pub max: f64,
    pub initial: f64,
}

/// Repair ordering (`min <= max`) and compute the midpoint initial guess.
pub fn normalize_bound(bound: ParameterBound) -> NormalizedBound {
    let (min, max) = if bound.max < bound.min {
        (bound.max, bound.min)
    } else {
        (bound.min, bound.max)
    };
    NormalizedBound {
        min,
        max,
        initial: min + (max - min) / 2.0,
    }
}

/// `max(1, round(input))`.
///
/// Halves round away from zero. NaN and negative input give 1; `+inf`
/// saturates at `u64::MAX`.
pub fn clamp_iterations(input: f64) -> u64 {
    // `f64::max` ignores NaN, and the float-to-int cast saturates.
    input.round().max(1.0) as u64
}

/// Assemble the request for the current state.
///
/// The dataset check comes first, so an empty session reports the missing
/// dataset even when no model is selected either.
pub fn build_request(
    states: &ModelStates,
    settings: &SolverSettings,
    dataset: Option<&Dataset>,
) -> Result<FittingRequest, Precondition> {
    let dataset = dataset.ok_or(Precondition::NoDataset)?;

    let mut parameter_bounds = BTreeMap::new();
    for state in states.iter().filter(|s| s.enabled) {
        let mut bounds = ModelBounds::default();
        for (name, bound) in state.config.iter() {
            let n = normalize_bound(bound);
            bounds.min.insert(name.to_string(), n.min);
            bounds.max.insert(name.to_string(), n.max);
            bounds.initial.insert(name.to_string(), n.initial);
        }
        parameter_bounds.insert(state.spec.name.to_string(), bounds);
    }

    if parameter_bounds.is_empty() {
        return Err(Precondition::NoModelSelected);
    }

    Ok(FittingRequest {
        max_iterations: clamp_iterations(settings.max_iterations),
        optimization_method: settings.optimization_method,
        save_best: settings.save_best,
        parameter_bounds,
        dataset: dataset.clone(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::{BoundKind, OptimizationMethod};

    fn dataset() -> Dataset {
        let record = json!({"experiment": "A", "pressure [Pa]": 100.0, "uptake [mol/g]": 0.5});
        Dataset {
            columns: vec!["experiment".into(), "pressure [Pa]".into(), "uptake [mol/g]".into()],
            records: vec![record.as_object().cloned().unwrap()],
        }
    }

    fn only(states: &mut ModelStates, keep: &[&str]) {
        let names: Vec<&str> = states.iter().map(|s| s.spec.name).collect();
        for name in names {
            states.set_enabled(name, keep.contains(&name)).unwrap();
        }
    }

    #[test]
    fn swapped_bounds_are_repaired() {
        let mut states = ModelStates::from_catalog();
        only(&mut states, &["Langmuir"]);
        states.set_bound("Langmuir", "k", BoundKind::Min, 10.0).unwrap();
        states.set_bound("Langmuir", "k", BoundKind::Max, 2.0).unwrap();

        let req = build_request(&states, &SolverSettings::default(), Some(&dataset())).unwrap();
        let langmuir = &req.parameter_bounds["Langmuir"];
        assert_eq!(langmuir.min["k"], 2.0);
        assert_eq!(langmuir.max["k"], 10.0);
        assert_eq!(langmuir.initial["k"], 6.0);
    }

    #[test]
    fn normalized_output_is_ordered_with_midpoint() {
        let pairs = [
            (0.0, 0.0),
            (1e-6, 10.0),
            (10.0, 1e-6),
            (-5.0, 5.0),
            (5.0, -5.0),
            (3.25, 3.25),
            (100.0, 0.0),
        ];
        for (a, b) in pairs {
            let n = normalize_bound(ParameterBound::new(a, b));
            assert!(n.min <= n.max, "({a}, {b})");
            assert_eq!(n.min, a.min(b));
            assert_eq!(n.max, a.max(b));
            assert_eq!(n.initial, n.min + (n.max - n.min) / 2.0);
        }
    }

    #[test]
    fn iterations_are_clamped_and_rounded() {
        assert_eq!(clamp_iterations(0.4), 1);
        assert_eq!(clamp_iterations(0.0), 1);
        assert_eq!(clamp_iterations(-25.0), 1);
        assert_eq!(clamp_iterations(1.5), 2);
        assert_eq!(clamp_iterations(10_000.6), 10_001);
        assert_eq!(clamp_iterations(10_000.0), 10_000);
        assert_eq!(clamp_iterations(f64::NAN), 1);
        assert_eq!(clamp_iterations(f64::INFINITY), u64::MAX);
    }

    #[test]
    fn settings_flow_into_request() {
        let states = ModelStates::from_catalog();
        let settings = SolverSettings {
            max_iterations: 0.4,
            optimization_method: OptimizationMethod::NelderMead,
            save_best: true,
        };
        let req = build_request(&states, &settings, Some(&dataset())).unwrap();
        assert_eq!(req.max_iterations, 1);
        assert_eq!(req.optimization_method, OptimizationMethod::NelderMead);
        assert!(req.save_best);
        assert_eq!(req.parameter_bounds.len(), 9);
        assert_eq!(req.dataset, dataset());
    }

    #[test]
    fn disabled_models_are_excluded_and_restored() {
        let mut states = ModelStates::from_catalog();
        states.set_bound("Sips", "exponent", BoundKind::Max, 4.0).unwrap();
        states.set_enabled("Sips", false).unwrap();

        let req = build_request(&states, &SolverSettings::default(), Some(&dataset())).unwrap();
        assert!(!req.parameter_bounds.contains_key("Sips"));
        assert_eq!(req.parameter_bounds.len(), 8);

        states.set_enabled("Sips", true).unwrap();
        let req = build_request(&states, &SolverSettings::default(), Some(&dataset())).unwrap();
        assert_eq!(req.parameter_bounds["Sips"].max["exponent"], 4.0);
        assert_eq!(req.parameter_bounds["Sips"].min["exponent"], 0.1);
    }

    #[test]
    fn missing_dataset_is_reported_first() {
        let mut states = ModelStates::from_catalog();
        only(&mut states, &[]);
        let err = build_request(&states, &SolverSettings::default(), None).unwrap_err();
        assert_eq!(err, Precondition::NoDataset);
        assert_eq!(
            err.to_string(),
            "Please load a dataset before starting the fitting process."
        );
    }

    #[test]
    fn zero_enabled_models_is_rejected() {
        let mut states = ModelStates::from_catalog();
        only(&mut states, &[]);
        let err = build_request(&states, &SolverSettings::default(), Some(&dataset())).unwrap_err();
        assert_eq!(err, Precondition::NoModelSelected);
    }

    #[test]
    fn wire_shape_matches_backend_contract() {
        let mut states = ModelStates::from_catalog();
        only(&mut states, &["Langmuir"]);
        let req = build_request(&states, &SolverSettings::default(), Some(&dataset())).unwrap();
        let value = serde_json::to_value(&req).unwrap();

        assert_eq!(value["max_iterations"], json!(10000));
        assert_eq!(value["optimization_method"], json!("LSS"));
        assert_eq!(value["save_best"], json!(false));
        assert_eq!(value["parameter_bounds"]["Langmuir"]["max"]["qsat"], json!(100.0));
        assert_eq!(value["parameter_bounds"]["Langmuir"]["initial"]["qsat"], json!(50.0));
        assert_eq!(value["dataset"]["columns"][0], json!("experiment"));
    }
}
