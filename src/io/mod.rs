//! Input/output helpers.
//!
//! - reading a dataset file for upload (`upload`)
//! - CSV export of a browsed table (`export`)

pub mod export;
pub mod upload;

pub use export::*;
pub use upload::*;
