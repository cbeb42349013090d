//! Status messages and formatted terminal output.

use std::fmt;

pub mod format;

pub use format::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

impl StatusLevel {
    pub fn tag(self) -> &'static str {
        match self {
            StatusLevel::Info => "[INFO]",
            StatusLevel::Error => "[ERROR]",
        }
    }
}

/// A user-visible outcome line (or block of lines).
///
/// Rendered with a leading `[INFO]` or `[ERROR]` tag so the outcome is obvious
/// at a glance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            text: text.into(),
        }
    }

    /// Wrap text supplied by the backend, dropping a tag it may already carry
    /// so it is not printed twice.
    pub fn from_backend(level: StatusLevel, text: &str) -> Self {
        let trimmed = text.trim_start();
        let text = [StatusLevel::Info.tag(), StatusLevel::Error.tag()]
            .iter()
            .find_map(|tag| trimmed.strip_prefix(tag))
            .map(str::trim_start)
            .unwrap_or(trimmed);
        Self {
            level,
            text: text.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == StatusLevel::Error
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.level.tag(), self.text)
    }
}
