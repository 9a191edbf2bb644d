//! Syntax errors
//!
//! Every variant is recoverable: the parser records a diagnostic, drops an
//! error placeholder node into the tree, resynchronizes and keeps going.

use crate::logging::codes;
use crate::utils::SourcePosition;

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum SyntaxError {
    #[error("Unexpected {found}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        position: SourcePosition,
    },

    #[error("Missing {expected}")]
    MissingToken {
        expected: String,
        position: SourcePosition,
    },

    #[error("'{opener}' block is missing its '{closer}'")]
    UnmatchedBlockDelimiter {
        opener: String,
        closer: String,
        position: SourcePosition,
    },

    #[error("Nesting exceeds the maximum parse depth ({depth})")]
    MaxDepthExceeded {
        depth: usize,
        position: SourcePosition,
    },

    #[error("Expected an expression, found {found}")]
    InvalidExpression {
        found: String,
        position: SourcePosition,
    },
}

impl SyntaxError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            SyntaxError::UnexpectedToken { .. } => codes::syntax::UNEXPECTED_TOKEN,
            SyntaxError::MissingToken { .. } => codes::syntax::MISSING_TOKEN,
            SyntaxError::UnmatchedBlockDelimiter { .. } => {
                codes::syntax::UNMATCHED_BLOCK_DELIMITER
            }
            SyntaxError::MaxDepthExceeded { .. } => codes::syntax::MAX_RECURSION_DEPTH,
            SyntaxError::InvalidExpression { .. } => codes::syntax::INVALID_EXPRESSION,
        }
    }

    pub fn position(&self) -> SourcePosition {
        match self {
            SyntaxError::UnexpectedToken { position, .. }
            | SyntaxError::MissingToken { position, .. }
            | SyntaxError::UnmatchedBlockDelimiter { position, .. }
            | SyntaxError::MaxDepthExceeded { position, .. }
            | SyntaxError::InvalidExpression { position, .. } => *position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_tokens() {
        let error = SyntaxError::UnexpectedToken {
            found: "';'".to_string(),
            expected: "an expression".to_string(),
            position: SourcePosition::start(),
        };
        assert_eq!(error.to_string(), "Unexpected ';', expected an expression");
        assert_eq!(error.error_code().as_str(), "E201");
    }

    #[test]
    fn test_block_delimiter_message() {
        let error = SyntaxError::UnmatchedBlockDelimiter {
            opener: "If".to_string(),
            closer: "End-If".to_string(),
            position: SourcePosition::new(3, 3, 1, 4),
        };
        assert!(error.to_string().contains("End-If"));
        assert_eq!(error.position().index, 3);
    }
}
