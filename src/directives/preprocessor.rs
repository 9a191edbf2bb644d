//! Directive preprocessor
//!
//! Single forward pass over the lexed token stream. Directive markers are
//! consumed structurally even inside inactive branches so nesting stays
//! balanced; an ordinary token is emitted only when every open conditional
//! on the stack is in its live branch. The losing branch of each resolved
//! conditional is reported as an excluded span for presentation layers.

use super::expression::parse_condition;
use super::version::ToolsVersion;
use super::DirectiveError;
use crate::config::constants::compile_time::directives::MAX_DIRECTIVE_DEPTH;
use crate::logging::codes;
use crate::tokens::{Token, TokenKind};
use crate::utils::{Diagnostic, SourcePosition, SourceSpan};
use crate::{log_debug, log_error, log_success};

/// One open conditional block
#[derive(Debug, Clone)]
struct DirectiveContext {
    condition_result: bool,
    has_else: bool,
    in_else_branch: bool,
    /// Start of the #If marker, for unterminated-block diagnostics
    if_position: SourcePosition,
    /// First position after the #Then marker
    if_block_start: SourcePosition,
    /// Fixed once #Else is seen
    if_block_span: Option<SourceSpan>,
    else_block_start: Option<SourcePosition>,
}

impl DirectiveContext {
    fn is_active(&self) -> bool {
        self.condition_result != self.in_else_branch
    }
}

/// Result of resolving directives over one token stream
#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    /// Surviving tokens, ending with `Eof`
    pub tokens: Vec<Token>,
    /// Losing branches in source order
    pub excluded_spans: Vec<SourceSpan>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct DirectivePreprocessor<'v> {
    version: Option<&'v ToolsVersion>,
    stack: Vec<DirectiveContext>,
    excluded_spans: Vec<SourceSpan>,
    diagnostics: Vec<Diagnostic>,
}

impl<'v> DirectivePreprocessor<'v> {
    pub fn new(version: Option<&'v ToolsVersion>) -> Self {
        Self {
            version,
            stack: Vec::new(),
            excluded_spans: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn preprocess(mut self, tokens: Vec<Token>) -> PreprocessOutput {
        log_debug!("Starting directive preprocessing",
            "tokens" => tokens.len(),
            "version" => self.version.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string())
        );

        let mut output = Vec::new();
        let mut cursor = 0;

        while cursor < tokens.len() {
            let token = &tokens[cursor];
            match token.kind {
                TokenKind::DirectiveIf => {
                    cursor = self.open_conditional(&tokens, cursor);
                }
                TokenKind::DirectiveElse => {
                    self.flip_to_else(token);
                    cursor += 1;
                }
                TokenKind::DirectiveEnd => {
                    self.close_conditional(token);
                    cursor += 1;
                }
                TokenKind::DirectiveThen
                | TokenKind::DirectiveToolsRel
                | TokenKind::DirectiveAtom => {
                    self.report(DirectiveError::StrayDirectiveToken {
                        position: token.span.start(),
                    });
                    cursor += 1;
                }
                TokenKind::Eof => {
                    output.push(token.clone());
                    cursor += 1;
                }
                _ => {
                    if self.stack.iter().all(DirectiveContext::is_active) {
                        output.push(token.clone());
                    }
                    cursor += 1;
                }
            }
        }

        // Blocks still open at end of file
        let end_position = output
            .last()
            .map(|t| t.span.end())
            .unwrap_or_else(SourcePosition::start);
        while let Some(context) = self.stack.pop() {
            self.report(DirectiveError::UnterminatedIf {
                position: context.if_position,
            });
            self.record_excluded(context, end_position);
        }

        self.excluded_spans
            .sort_by_key(|span| span.start().index);

        log_success!(codes::success::PREPROCESSING_COMPLETE, "Directive preprocessing completed",
            "surviving_tokens" => output.len(),
            "excluded_spans" => self.excluded_spans.len(),
            "diagnostics" => self.diagnostics.len()
        );

        PreprocessOutput {
            tokens: output,
            excluded_spans: self.excluded_spans,
            diagnostics: self.diagnostics,
        }
    }

    /// Consume `#If <condition> #Then`, evaluate, and push a context.
    /// Returns the cursor position after the header.
    fn open_conditional(&mut self, tokens: &[Token], if_index: usize) -> usize {
        let if_token = &tokens[if_index];
        let mut cursor = if_index + 1;
        let mut condition_run: Vec<Token> = Vec::new();

        // The condition is the literal run up to the #Then marker
        while cursor < tokens.len() {
            let token = &tokens[cursor];
            match token.kind {
                TokenKind::DirectiveThen => break,
                TokenKind::DirectiveIf
                | TokenKind::DirectiveElse
                | TokenKind::DirectiveEnd
                | TokenKind::Eof => break,
                _ => {
                    condition_run.push(token.clone());
                    cursor += 1;
                }
            }
        }

        let found_then = tokens
            .get(cursor)
            .map(|t| t.kind == TokenKind::DirectiveThen)
            .unwrap_or(false);
        if !found_then {
            self.report(DirectiveError::MissingThen {
                position: if_token.span.start(),
            });
        }

        // A condition that cannot be parsed keeps its #If branch visible
        let condition_result = match parse_condition(&condition_run) {
            Ok(expr) => expr.evaluate(self.version),
            Err(error) => {
                self.report(error);
                true
            }
        };

        if self.stack.len() >= MAX_DIRECTIVE_DEPTH {
            self.report(DirectiveError::NestingTooDeep {
                depth: self.stack.len() + 1,
            });
        }

        let block_start = if found_then {
            cursor += 1; // consume #Then
            tokens
                .get(cursor - 1)
                .map(|t| t.span.end())
                .unwrap_or_else(|| if_token.span.end())
        } else {
            if_token.span.end()
        };

        self.stack.push(DirectiveContext {
            condition_result,
            has_else: false,
            in_else_branch: false,
            if_position: if_token.span.start(),
            if_block_start: block_start,
            if_block_span: None,
            else_block_start: None,
        });

        cursor
    }

    fn flip_to_else(&mut self, else_token: &Token) {
        match self.stack.last_mut() {
            None => {
                self.report(DirectiveError::UnmatchedElse {
                    position: else_token.span.start(),
                });
            }
            Some(context) if context.has_else => {
                self.report(DirectiveError::DuplicateElse {
                    position: else_token.span.start(),
                });
            }
            Some(context) => {
                context.has_else = true;
                context.in_else_branch = true;
                context.if_block_span = Some(SourceSpan::new(
                    context.if_block_start,
                    else_token.span.start(),
                ));
                context.else_block_start = Some(else_token.span.end());
            }
        }
    }

    fn close_conditional(&mut self, end_token: &Token) {
        match self.stack.pop() {
            None => {
                self.report(DirectiveError::UnmatchedEnd {
                    position: end_token.span.start(),
                });
            }
            Some(context) => {
                self.record_excluded(context, end_token.span.start());
            }
        }
    }

    /// Record the losing branch of a resolved conditional
    fn record_excluded(&mut self, context: DirectiveContext, end: SourcePosition) {
        let if_block = context
            .if_block_span
            .unwrap_or_else(|| SourceSpan::new(context.if_block_start, end));
        let else_block = context
            .else_block_start
            .map(|start| SourceSpan::new(start, end));

        if context.condition_result {
            if let Some(else_block) = else_block {
                self.excluded_spans.push(else_block);
            }
        } else {
            self.excluded_spans.push(if_block);
        }
    }

    fn report(&mut self, error: DirectiveError) {
        let position = match &error {
            DirectiveError::UnmatchedElse { position }
            | DirectiveError::DuplicateElse { position }
            | DirectiveError::UnmatchedEnd { position }
            | DirectiveError::UnterminatedIf { position }
            | DirectiveError::MissingThen { position }
            | DirectiveError::ParenthesizedCondition { position }
            | DirectiveError::StrayDirectiveToken { position } => *position,
            _ => SourcePosition::start(),
        };
        log_error!(error.error_code(), "Directive error",
            span = SourceSpan::new(position, position),
            "detail" => error
        );
        self.diagnostics
            .push(Diagnostic::error(error.to_string(), position));
    }
}
