//! Parser-facing cursor over a lexed token sequence.
//!
//! The stream owns every token the lexer produced but navigation skips
//! trivia: `current`, `peek_ahead` and `advance` only ever land on
//! significant tokens. The final token is always `Eof`, so `current`
//! never runs off the end.
use super::token::{Token, TokenKind};
use crate::grammar::keywords::Keyword;
use crate::utils::SourceSpan;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenStream {
    tokens: Vec<Token>,
    /// Indices into `tokens` of non-trivia tokens
    significant: Vec<usize>,
    /// Cursor into `significant`
    position: usize,
}

impl TokenStream {
    /// Build a stream from lexer output. Lexer output always ends with
    /// `Eof`; a bare vector gets the sentinel added so `current` is total.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map_or(true, |t| !t.is_eof()) {
            tokens.push(Token::new(TokenKind::Eof, "", SourceSpan::dummy()));
        }
        let significant = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.kind.is_trivia())
            .map(|(i, _)| i)
            .collect();
        Self {
            tokens,
            significant,
            position: 0,
        }
    }

    /// The significant token under the cursor
    pub fn current(&self) -> &Token {
        let idx = self
            .significant
            .get(self.position)
            .or_else(|| self.significant.last())
            .copied()
            .unwrap_or(0);
        &self.tokens[idx]
    }

    /// Look `offset` significant tokens past the cursor; saturates at Eof
    pub fn peek_ahead(&self, offset: usize) -> &Token {
        let idx = self
            .significant
            .get(self.position + offset)
            .or_else(|| self.significant.last())
            .copied()
            .unwrap_or(0);
        &self.tokens[idx]
    }

    /// Move past the current significant token, returning it
    pub fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.position < self.significant.len() {
            self.position += 1;
        }
        token
    }

    pub fn is_at_end(&self) -> bool {
        self.current().is_eof()
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    pub fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current().is_keyword(keyword)
    }

    /// Consume the current token if it matches, reporting whether it did
    pub fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn match_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Cursor position for later rewind
    pub fn checkpoint(&self) -> usize {
        self.position
    }

    pub fn rewind(&mut self, checkpoint: usize) {
        self.position = checkpoint.min(self.significant.len());
    }

    /// True when the cursor has not moved since the checkpoint was taken.
    /// Recovery loops use this to guarantee forward progress.
    pub fn stalled_since(&self, checkpoint: usize) -> bool {
        self.position == checkpoint
    }

    /// Span of the current token, for diagnostics at the cursor
    pub fn current_span(&self) -> SourceSpan {
        self.current().span
    }

    /// The span of the most recently consumed significant token. Falls back
    /// to the current span at the start of the stream.
    pub fn previous_span(&self) -> SourceSpan {
        if self.position == 0 {
            return self.current_span();
        }
        let idx = self.significant[self.position - 1];
        self.tokens[idx].span
    }

    /// All tokens including trivia, in source order
    pub fn all_tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Count of significant tokens (including the Eof sentinel)
    pub fn significant_len(&self) -> usize {
        self.significant.len()
    }
}
