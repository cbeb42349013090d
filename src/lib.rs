//! `adsorfit-console` library crate.
//!
//! The binary (`adsorfit`) is a thin wrapper around this library so that:
//!
//! - session and request logic is testable without a terminal or a backend
//! - the TUI and the headless commands share one workflow
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod browser;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod fit;
pub mod gateway;
pub mod io;
pub mod logging;
pub mod models;
pub mod report;
pub mod session;
pub mod tui;
