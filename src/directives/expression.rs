//! Condition expressions for conditional-compilation directives
//!
//! A tiny grammar, separate from the main expression grammar:
//!
//! ```text
//! orExpr     -> andExpr ('||' andExpr)*
//! andExpr    -> comparison ('&&' comparison)*
//! comparison -> operand compareOp operand
//! operand    -> #ToolsRel | string literal
//! ```
//!
//! Parentheses are rejected outright. The tree is short-lived: it exists
//! only long enough for the preprocessor to read one boolean out of it.

use super::version::ToolsVersion;
use super::DirectiveError;
use crate::tokens::{Token, TokenKind};
use crate::utils::SourceSpan;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Evaluation tree for one directive condition
#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveExpr {
    ToolsRelOperand {
        span: SourceSpan,
    },
    LiteralOperand {
        value: String,
        span: SourceSpan,
    },
    Comparison {
        left: Box<DirectiveExpr>,
        op: TokenKind,
        right: Box<DirectiveExpr>,
        span: SourceSpan,
    },
    BinaryLogical {
        left: Box<DirectiveExpr>,
        op: LogicalOp,
        right: Box<DirectiveExpr>,
        span: SourceSpan,
    },
}

impl DirectiveExpr {
    pub fn span(&self) -> SourceSpan {
        match self {
            Self::ToolsRelOperand { span }
            | Self::LiteralOperand { span, .. }
            | Self::Comparison { span, .. }
            | Self::BinaryLogical { span, .. } => *span,
        }
    }

    fn is_pseudo(&self) -> bool {
        matches!(self, Self::ToolsRelOperand { .. })
    }

    /// Evaluate against the configured tool version, if any. Eager, left
    /// then right; no short-circuiting is needed at this scale.
    pub fn evaluate(&self, version: Option<&ToolsVersion>) -> bool {
        match self {
            Self::ToolsRelOperand { .. } | Self::LiteralOperand { .. } => false,
            Self::BinaryLogical {
                left, op, right, ..
            } => {
                let l = left.evaluate(version);
                let r = right.evaluate(version);
                match op {
                    LogicalOp::And => l && r,
                    LogicalOp::Or => l || r,
                }
            }
            Self::Comparison {
                left, op, right, ..
            } => match (left.as_ref(), right.as_ref()) {
                // Self-comparison is fixed by the operator alone
                (Self::ToolsRelOperand { .. }, Self::ToolsRelOperand { .. }) => matches!(
                    op,
                    TokenKind::Equal | TokenKind::LessEqual | TokenKind::GreaterEqual
                ),
                (Self::ToolsRelOperand { .. }, Self::LiteralOperand { value, .. }) => {
                    compare_pseudo_left(*op, value, version)
                }
                // Pseudo-variable on the right: invert before comparing
                (Self::LiteralOperand { value, .. }, Self::ToolsRelOperand { .. }) => {
                    compare_pseudo_left(invert_comparison(*op), value, version)
                }
                _ => false,
            },
        }
    }
}

/// Apply a comparison in pseudo-variable-left form. With no configured
/// version or an unparsable literal, the "prefer newer branch" policy makes
/// `<` and `<=` true and everything else false.
fn compare_pseudo_left(op: TokenKind, literal: &str, version: Option<&ToolsVersion>) -> bool {
    let target: Option<ToolsVersion> = literal.parse().ok();

    let (actual, target) = match (version, target) {
        (Some(actual), Some(target)) => (actual, target),
        _ => return matches!(op, TokenKind::Less | TokenKind::LessEqual),
    };

    let ordering = actual.relaxed_cmp(&target);
    match op {
        TokenKind::Equal => ordering == Ordering::Equal,
        TokenKind::NotEqual => ordering != Ordering::Equal,
        TokenKind::Less => ordering == Ordering::Less,
        TokenKind::LessEqual => ordering != Ordering::Greater,
        TokenKind::Greater => ordering == Ordering::Greater,
        TokenKind::GreaterEqual => ordering != Ordering::Less,
        _ => false,
    }
}

fn invert_comparison(op: TokenKind) -> TokenKind {
    match op {
        TokenKind::Less => TokenKind::Greater,
        TokenKind::LessEqual => TokenKind::GreaterEqual,
        TokenKind::Greater => TokenKind::Less,
        TokenKind::GreaterEqual => TokenKind::LessEqual,
        other => other,
    }
}

/// Parse a directive condition from the token run between #If and #Then.
/// Trivia in the run is ignored; any grouping symbol is an error.
pub fn parse_condition(tokens: &[Token]) -> Result<DirectiveExpr, DirectiveError> {
    let significant: Vec<&Token> = tokens.iter().filter(|t| !t.kind.is_trivia()).collect();

    if let Some(paren) = significant
        .iter()
        .find(|t| matches!(t.kind, TokenKind::LeftParen | TokenKind::RightParen))
    {
        return Err(DirectiveError::ParenthesizedCondition {
            position: paren.span.start(),
        });
    }

    let mut parser = ConditionParser {
        tokens: significant,
        cursor: 0,
    };
    let expr = parser.parse_or()?;
    if let Some(extra) = parser.current() {
        return Err(DirectiveError::InvalidCondition {
            detail: format!("unexpected {} after condition", extra.kind.describe()),
        });
    }
    Ok(expr)
}

struct ConditionParser<'t> {
    tokens: Vec<&'t Token>,
    cursor: usize,
}

impl<'t> ConditionParser<'t> {
    fn current(&self) -> Option<&'t Token> {
        self.tokens.get(self.cursor).copied()
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.current();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<DirectiveExpr, DirectiveError> {
        let mut left = self.parse_and()?;
        while self.current().map(|t| t.kind) == Some(TokenKind::PipePipe) {
            self.advance();
            let right = self.parse_and()?;
            let span = left.span().merge(right.span());
            left = DirectiveExpr::BinaryLogical {
                left: Box::new(left),
                op: LogicalOp::Or,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<DirectiveExpr, DirectiveError> {
        let mut left = self.parse_comparison()?;
        while self.current().map(|t| t.kind) == Some(TokenKind::AmpAmp) {
            self.advance();
            let right = self.parse_comparison()?;
            let span = left.span().merge(right.span());
            left = DirectiveExpr::BinaryLogical {
                left: Box::new(left),
                op: LogicalOp::And,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<DirectiveExpr, DirectiveError> {
        let left = self.parse_operand()?;

        let op_token = self.advance().ok_or_else(|| DirectiveError::InvalidCondition {
            detail: "condition ends before comparison operator".to_string(),
        })?;
        if !op_token.kind.is_comparison() {
            return Err(DirectiveError::InvalidCondition {
                detail: format!("expected comparison operator, found {}", op_token.kind.describe()),
            });
        }

        let right = self.parse_operand()?;

        // At least one side must be the pseudo-variable
        if !left.is_pseudo() && !right.is_pseudo() {
            return Err(DirectiveError::InvalidCondition {
                detail: "comparison must involve #ToolsRel".to_string(),
            });
        }

        let span = left.span().merge(right.span());
        Ok(DirectiveExpr::Comparison {
            left: Box::new(left),
            op: op_token.kind,
            right: Box::new(right),
            span,
        })
    }

    fn parse_operand(&mut self) -> Result<DirectiveExpr, DirectiveError> {
        let token = self.advance().ok_or_else(|| DirectiveError::InvalidCondition {
            detail: "condition ends before operand".to_string(),
        })?;

        match token.kind {
            TokenKind::DirectiveToolsRel => Ok(DirectiveExpr::ToolsRelOperand { span: token.span }),
            TokenKind::String => Ok(DirectiveExpr::LiteralOperand {
                value: token.value_text(),
                span: token.span,
            }),
            other => Err(DirectiveError::InvalidCondition {
                detail: format!("expected #ToolsRel or version literal, found {}", other.describe()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::LexicalAnalyzer;

    fn condition_tokens(source: &str) -> Vec<Token> {
        let mut tokens = LexicalAnalyzer::new(source).tokenize().tokens;
        tokens.retain(|t| t.kind != TokenKind::Eof);
        tokens
    }

    fn eval(source: &str, version: Option<&str>) -> bool {
        let parsed_version = version.map(|v| v.parse::<ToolsVersion>().unwrap());
        let expr = parse_condition(&condition_tokens(source)).unwrap();
        expr.evaluate(parsed_version.as_ref())
    }

    #[test]
    fn test_simple_comparisons() {
        assert!(eval("#ToolsRel >= \"8.54\"", Some("8.55.00")));
        assert!(!eval("#ToolsRel >= \"8.56\"", Some("8.55.00")));
        assert!(eval("#ToolsRel = \"8.54\"", Some("8.54.03")));
        assert!(!eval("#ToolsRel = \"8.54.01\"", Some("8.54.03")));
    }

    #[test]
    fn test_logical_connectives() {
        let range = "#ToolsRel >= \"8.54\" && #ToolsRel < \"8.56\"";
        assert!(eval(range, Some("8.55.00")));
        assert!(!eval(range, Some("8.57.00")));

        let either = "#ToolsRel < \"8.50\" || #ToolsRel >= \"8.56\"";
        assert!(eval(either, Some("8.57.00")));
        assert!(!eval(either, Some("8.55.00")));
    }

    #[test]
    fn test_self_comparison_fixed_by_operator() {
        for version in [Some("8.55.00"), None] {
            assert!(eval("#ToolsRel = #ToolsRel", version));
            assert!(eval("#ToolsRel <= #ToolsRel", version));
            assert!(eval("#ToolsRel >= #ToolsRel", version));
            assert!(!eval("#ToolsRel <> #ToolsRel", version));
            assert!(!eval("#ToolsRel < #ToolsRel", version));
            assert!(!eval("#ToolsRel > #ToolsRel", version));
        }
    }

    #[test]
    fn test_operand_order_symmetry() {
        assert_eq!(
            eval("\"8.55\" > #ToolsRel", Some("8.54.00")),
            eval("#ToolsRel < \"8.55\"", Some("8.54.00"))
        );
        assert!(eval("\"8.54\" <= #ToolsRel", Some("8.55.00")));
    }

    #[test]
    fn test_fallback_prefers_newer_branch() {
        // No configured version
        assert!(eval("#ToolsRel < \"8.54\"", None));
        assert!(eval("#ToolsRel <= \"8.54\"", None));
        assert!(!eval("#ToolsRel > \"8.54\"", None));
        assert!(!eval("#ToolsRel = \"8.54\"", None));
        // Unparsable literal behaves like an absent version
        assert!(eval("#ToolsRel < \"garbage\"", Some("8.55.00")));
        // Inverted form: "8.54" > #ToolsRel normalizes to #ToolsRel < "8.54"
        assert!(eval("\"8.54\" > #ToolsRel", None));
    }

    #[test]
    fn test_parentheses_rejected() {
        let result = parse_condition(&condition_tokens("(#ToolsRel >= \"8.54\")"));
        assert!(matches!(
            result,
            Err(DirectiveError::ParenthesizedCondition { .. })
        ));
    }

    #[test]
    fn test_literal_only_comparison_rejected() {
        let result = parse_condition(&condition_tokens("\"8.54\" = \"8.54\""));
        assert!(matches!(result, Err(DirectiveError::InvalidCondition { .. })));
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let result = parse_condition(&condition_tokens("#ToolsRel >= \"8.54\" \"8.55\""));
        assert!(matches!(result, Err(DirectiveError::InvalidCondition { .. })));
    }
}
