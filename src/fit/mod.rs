//! Fitting-request assembly.
//!
//! Responsibilities:
//!
//! - check the local preconditions for a run (dataset loaded, a model selected)
//! - repair bound ordering and derive the initial guess per constant
//! - clamp the iteration budget to a positive integer

pub mod request;

pub use request::*;
