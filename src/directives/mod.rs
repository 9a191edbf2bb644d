//! Conditional-compilation directives
//!
//! `#If <condition> #Then ... #Else ... #End-If` blocks are resolved against
//! a configured tool version before the parser runs. The sublanguage lives
//! here: the version value, the condition expression parser/evaluator, and
//! the preprocessor pass itself.

pub mod expression;
pub mod preprocessor;
pub mod version;

use crate::logging::codes;
use crate::utils::SourcePosition;

pub use expression::{parse_condition, DirectiveExpr, LogicalOp};
pub use preprocessor::{DirectivePreprocessor, PreprocessOutput};
pub use version::{ToolsVersion, ToolsVersionError};

/// Directive-structure and condition errors; all recoverable
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum DirectiveError {
    #[error("#Else without a matching #If")]
    UnmatchedElse { position: SourcePosition },

    #[error("Duplicate #Else in conditional block")]
    DuplicateElse { position: SourcePosition },

    #[error("#End-If without a matching #If")]
    UnmatchedEnd { position: SourcePosition },

    #[error("#If block not closed before end of file")]
    UnterminatedIf { position: SourcePosition },

    #[error("#If without a #Then marker")]
    MissingThen { position: SourcePosition },

    #[error("Invalid directive condition: {detail}")]
    InvalidCondition { detail: String },

    #[error("Parentheses are not allowed in directive conditions")]
    ParenthesizedCondition { position: SourcePosition },

    #[error("Directive token outside a conditional header")]
    StrayDirectiveToken { position: SourcePosition },

    #[error("Directive nesting too deep: {depth}")]
    NestingTooDeep { depth: usize },
}

impl DirectiveError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            DirectiveError::UnmatchedElse { .. }
            | DirectiveError::DuplicateElse { .. }
            | DirectiveError::UnmatchedEnd { .. }
            | DirectiveError::StrayDirectiveToken { .. } => codes::directive::UNMATCHED_DIRECTIVE,
            DirectiveError::UnterminatedIf { .. } => codes::directive::UNTERMINATED_DIRECTIVE,
            DirectiveError::MissingThen { .. } | DirectiveError::InvalidCondition { .. } => {
                codes::directive::INVALID_CONDITION
            }
            DirectiveError::ParenthesizedCondition { .. } => {
                codes::directive::PARENTHESIZED_CONDITION
            }
            DirectiveError::NestingTooDeep { .. } => codes::directive::NESTING_TOO_DEEP,
        }
    }
}
