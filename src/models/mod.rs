//! Adsorption isotherm model catalog.
//!
//! The console never evaluates the models; it only needs to know which models
//! exist, which constants each one has, and sensible default search ranges.

pub mod catalog;

pub use catalog::*;
