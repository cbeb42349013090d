//! Per-model parameter bounds and enabled flags.
//!
//! Edits are stored verbatim. Nothing here reorders or clamps a bound, so the
//! console always shows exactly what was typed; ordering is repaired by the
//! request builder.

use thiserror::Error;

use crate::domain::{BoundKind, ParameterBound};
use crate::models::{self, ModelSpec};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoundsError {
    #[error("unknown model '{0}'")]
    UnknownModel(String),

    #[error("model '{model}' has no parameter '{parameter}'")]
    UnknownParameter { model: String, parameter: String },
}

/// Bounds for every constant of one model, in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    entries: Vec<(&'static str, ParameterBound)>,
}

impl ModelConfig {
    pub fn from_spec(spec: &ModelSpec) -> Self {
        let entries = spec
            .parameters
            .iter()
            .map(|p| (p.name, ParameterBound::new(p.default_min, p.default_max)))
            .collect();
        Self { entries }
    }

    pub fn get(&self, parameter: &str) -> Option<ParameterBound> {
        self.entries
            .iter()
            .find(|(name, _)| *name == parameter)
            .map(|(_, bound)| *bound)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, ParameterBound)> + '_ {
        self.entries.iter().map(|(name, bound)| (*name, *bound))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_mut(&mut self, parameter: &str) -> Option<&mut ParameterBound> {
        self.entries
            .iter_mut()
            .find(|(name, _)| *name == parameter)
            .map(|(_, bound)| bound)
    }
}

/// Selection flag plus bounds for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSelectionState {
    pub spec: &'static ModelSpec,
    pub enabled: bool,
    pub config: ModelConfig,
}

/// Bounds state for the whole catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelStates {
    models: Vec<ModelSelectionState>,
}

impl Default for ModelStates {
    fn default() -> Self {
        Self::from_catalog()
    }
}

impl ModelStates {
    /// Every model enabled, every bound at its catalog default.
    pub fn from_catalog() -> Self {
        let models = models::MODELS
            .iter()
            .map(|spec| ModelSelectionState {
                spec,
                enabled: true,
                config: ModelConfig::from_spec(spec),
            })
            .collect();
        Self { models }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelSelectionState> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Model at a catalog position.
    pub fn at(&self, index: usize) -> Option<&ModelSelectionState> {
        self.models.get(index)
    }

    /// Look up a model by name or id (see `models::find`).
    pub fn get(&self, model: &str) -> Result<&ModelSelectionState, BoundsError> {
        let spec = resolve(model)?;
        self.models
            .iter()
            .find(|m| m.spec.name == spec.name)
            .ok_or_else(|| BoundsError::UnknownModel(model.to_string()))
    }

    fn get_mut(&mut self, model: &str) -> Result<&mut ModelSelectionState, BoundsError> {
        let spec = resolve(model)?;
        self.models
            .iter_mut()
            .find(|m| m.spec.name == spec.name)
            .ok_or_else(|| BoundsError::UnknownModel(model.to_string()))
    }

    pub fn config(&self, model: &str) -> Result<&ModelConfig, BoundsError> {
        self.get(model).map(|m| &m.config)
    }

    pub fn bound(&self, model: &str, parameter: &str) -> Result<ParameterBound, BoundsError> {
        let state = self.get(model)?;
        state
            .config
            .get(parameter)
            .ok_or_else(|| BoundsError::UnknownParameter {
                model: state.spec.name.to_string(),
                parameter: parameter.to_string(),
            })
    }

    /// Replace one side of one bound. Every other bound and the enabled flag
    /// are left untouched; no ordering check is made.
    pub fn set_bound(
        &mut self,
        model: &str,
        parameter: &str,
        which: BoundKind,
        value: f64,
    ) -> Result<(), BoundsError> {
        let state = self.get_mut(model)?;
        let model_name = state.spec.name;
        let bound = state
            .config
            .get_mut(parameter)
            .ok_or_else(|| BoundsError::UnknownParameter {
                model: model_name.to_string(),
                parameter: parameter.to_string(),
            })?;
        bound.set(which, value);
        Ok(())
    }

    pub fn is_enabled(&self, model: &str) -> Result<bool, BoundsError> {
        self.get(model).map(|m| m.enabled)
    }

    pub fn set_enabled(&mut self, model: &str, enabled: bool) -> Result<(), BoundsError> {
        self.get_mut(model)?.enabled = enabled;
        Ok(())
    }

    /// Restore catalog defaults for one model. The enabled flag is kept.
    pub fn reset_model(&mut self, model: &str) -> Result<(), BoundsError> {
        let state = self.get_mut(model)?;
        state.config = ModelConfig::from_spec(state.spec);
        Ok(())
    }

    pub fn enabled_names(&self) -> Vec<&'static str> {
        self.models
            .iter()
            .filter(|m| m.enabled)
            .map(|m| m.spec.name)
            .collect()
    }

    pub fn enabled_count(&self) -> usize {
        self.models.iter().filter(|m| m.enabled).count()
    }
}

fn resolve(model: &str) -> Result<&'static ModelSpec, BoundsError> {
    models::find(model).ok_or_else(|| BoundsError::UnknownModel(model.to_string()))
}
