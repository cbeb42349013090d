//! Enabled toggles and single-expanded-card selection.
//!
//! At most one model is expanded (open for bound editing) at a time. The
//! enabled flags themselves live in `ModelStates` next to the bounds they gate;
//! this controller routes toggles through it so expansion stays consistent.

use crate::session::bounds::{BoundsError, ModelStates};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionController {
    expanded: Option<&'static str>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical name of the expanded model, if any.
    pub fn expanded(&self) -> Option<&'static str> {
        self.expanded
    }

    pub fn is_expanded(&self, model: &str) -> bool {
        match (self.expanded, crate::models::find(model)) {
            (Some(open), Some(spec)) => open == spec.name,
            _ => false,
        }
    }

    /// Expand `model`, or collapse it if it is already the expanded one.
    ///
    /// Disabled models cannot be expanded; the call is a no-op for them.
    /// Returns whether `model` is expanded afterwards.
    pub fn toggle_expanded(&mut self, states: &ModelStates, model: &str) -> Result<bool, BoundsError> {
        let state = states.get(model)?;
        let name = state.spec.name;

        if self.expanded == Some(name) {
            self.expanded = None;
            return Ok(false);
        }
        if !state.enabled {
            return Ok(false);
        }
        self.expanded = Some(name);
        Ok(true)
    }

    pub fn collapse(&mut self) {
        self.expanded = None;
    }

    /// Flip the enabled flag. Returns the new value.
    pub fn toggle_enabled(&mut self, states: &mut ModelStates, model: &str) -> Result<bool, BoundsError> {
        let enabled = !states.is_enabled(model)?;
        self.set_enabled(states, model, enabled)?;
        Ok(enabled)
    }

    /// Set the enabled flag. Bounds are kept either way; disabling the
    /// expanded model collapses it.
    pub fn set_enabled(&mut self, states: &mut ModelStates, model: &str, enabled: bool) -> Result<(), BoundsError> {
        states.set_enabled(model, enabled)?;
        if !enabled && self.is_expanded(model) {
            self.expanded = None;
        }
        Ok(())
    }
}
