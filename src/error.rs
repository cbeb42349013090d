//! Process-level error type.
//!
//! Backend and validation failures are recovered into status messages (see
//! `crate::report::StatusMessage`). `AppError` is reserved for failures that end
//! a command: bad configuration, unreadable input files, terminal setup, or a
//! headless command whose backend call failed.

/// Usage, configuration, or input-file problem.
pub const EXIT_USAGE: u8 = 2;
/// A headless command reached the backend but the operation failed.
pub const EXIT_BACKEND: u8 = 3;
/// Terminal or runtime failure.
pub const EXIT_RUNTIME: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, message)
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(EXIT_BACKEND, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(EXIT_RUNTIME, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
