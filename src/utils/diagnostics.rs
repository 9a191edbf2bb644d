//! Diagnostics accumulated across the front-end phases.
//!
//! Every phase is total: problems become `Diagnostic` records instead of
//! aborting the pipeline, so callers always receive a syntax tree plus the
//! list of what went wrong.
use super::span::SourcePosition;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub position: SourcePosition,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, position: SourcePosition) -> Self {
        Self {
            message: message.into(),
            position,
            severity: Severity::Error,
        }
    }

    pub fn warning(message: impl Into<String>, position: SourcePosition) -> Self {
        Self {
            message: message.into(),
            position,
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.severity, self.position, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_position_and_severity() {
        let diag = Diagnostic::error("unterminated string", SourcePosition::new(4, 4, 2, 3));
        assert_eq!(format!("{}", diag), "error at 2:3: unterminated string");
        assert!(diag.is_error());
    }

    #[test]
    fn test_warning_severity() {
        let diag = Diagnostic::warning("deprecated form", SourcePosition::start());
        assert!(!diag.is_error());
    }
}
