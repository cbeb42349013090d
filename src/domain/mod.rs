//! Domain types used throughout the console.
//!
//! This module defines:
//!
//! - parameter bounds and solver settings (`ParameterBound`, `SolverSettings`)
//! - the wire payloads exchanged with the fitting backend (`FittingRequest`, `FittingResponse`)
//! - dataset and results-browser records (`Dataset`, `BrowserTable`, `TableData`)

pub mod types;

pub use types::*;
