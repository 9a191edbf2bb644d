//! Core lexical analyzer
//!
//! Total tokenization with char and byte position tracking. Lexing never
//! fails: unrecognized characters become `Invalid` tokens and every problem
//! is reported as a diagnostic alongside the token stream. Trivia is
//! attached to the adjacent significant tokens so the exact source text can
//! be reconstructed from the output.

use crate::config::constants::compile_time::lexical::*;
use crate::grammar::keywords::Keyword;
use crate::logging::codes;
use crate::tokens::{classify_percent_name, CommentStyle, LiteralValue, Token, TokenKind};
use crate::utils::{Diagnostic, SourcePosition, SourceSpan};
use crate::{log_debug, log_error, log_success};

/// Lexical analysis errors with compile-time boundaries
#[derive(Debug, Clone, thiserror::Error)]
pub enum LexerError {
    #[error("Invalid character '{character}'")]
    InvalidCharacter { character: char },

    #[error("Unterminated string literal")]
    UnterminatedString,

    #[error("Unterminated comment")]
    UnterminatedComment,

    #[error("Invalid number format: '{text}'")]
    InvalidNumber { text: String },

    #[error("Identifier too long: {length} characters (max {MAX_IDENTIFIER_LENGTH})")]
    IdentifierTooLong { length: usize },

    #[error("String too large: {size} bytes (max {MAX_STRING_SIZE})")]
    StringTooLarge { size: usize },

    #[error("Comment too long: {length} characters (max {MAX_COMMENT_LENGTH})")]
    CommentTooLong { length: usize },

    #[error("Too many tokens: {count} (max {MAX_TOKEN_COUNT})")]
    TooManyTokens { count: usize },

    #[error("Variable sigil '{sigil}' with no following name")]
    EmptyIdentifier { sigil: char },
}

impl LexerError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            LexerError::InvalidCharacter { .. } => codes::lexical::INVALID_CHARACTER,
            LexerError::UnterminatedString => codes::lexical::UNTERMINATED_STRING,
            LexerError::UnterminatedComment => codes::lexical::UNTERMINATED_COMMENT,
            LexerError::InvalidNumber { .. } => codes::lexical::INVALID_NUMBER,
            LexerError::IdentifierTooLong { .. } => codes::lexical::IDENTIFIER_TOO_LONG,
            LexerError::StringTooLarge { .. } => codes::lexical::STRING_TOO_LARGE,
            LexerError::CommentTooLong { .. } => codes::lexical::COMMENT_TOO_LONG,
            LexerError::TooManyTokens { .. } => codes::lexical::TOO_MANY_TOKENS,
            LexerError::EmptyIdentifier { .. } => codes::lexical::EMPTY_IDENTIFIER,
        }
    }
}

/// Essential lexical metrics
#[derive(Debug, Default, Clone)]
pub struct LexicalMetrics {
    pub total_tokens: usize,
    pub keyword_tokens: usize,
    pub identifier_tokens: usize,
    pub operator_tokens: usize,
    pub comment_count: usize,
    pub invalid_chars: usize,
    pub max_string_length: usize,
    pub max_comment_length: usize,
}

impl LexicalMetrics {
    fn record_token(&mut self, token: &Token) {
        self.total_tokens += 1;

        if token.kind.is_keyword() {
            self.keyword_tokens += 1;
        } else if token.kind.is_identifier() {
            self.identifier_tokens += 1;
        } else if token.kind.is_operator() {
            self.operator_tokens += 1;
        } else if matches!(token.kind, TokenKind::Comment(_)) {
            self.comment_count += 1;
            self.max_comment_length = self.max_comment_length.max(token.text.chars().count());
        } else if token.kind == TokenKind::Invalid {
            self.invalid_chars += 1;
        }

        if token.kind == TokenKind::String {
            self.max_string_length = self.max_string_length.max(token.text.len());
        }
    }
}

/// Result of tokenizing one source unit
#[derive(Debug, Clone)]
pub struct LexOutput {
    /// Significant tokens with trivia attached, ending with `Eof`
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
    pub metrics: LexicalMetrics,
}

/// Core lexical analyzer over a single source unit
pub struct LexicalAnalyzer<'src> {
    source: &'src str,
    chars: Vec<char>,
    cursor: usize,
    position: SourcePosition,
    diagnostics: Vec<Diagnostic>,
    metrics: LexicalMetrics,
}

impl<'src> LexicalAnalyzer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            cursor: 0,
            position: SourcePosition::start(),
            diagnostics: Vec::new(),
            metrics: LexicalMetrics::default(),
        }
    }

    /// Tokenize the whole source unit. Always produces a token list ending
    /// with `Eof`; problems surface as diagnostics, never as failures.
    pub fn tokenize(mut self) -> LexOutput {
        log_debug!("Starting lexical analysis",
            "char_count" => self.chars.len(),
            "byte_count" => self.source.len()
        );

        let mut raw = Vec::new();

        while !self.is_at_end() {
            if raw.len() >= MAX_TOKEN_COUNT {
                let error = LexerError::TooManyTokens { count: raw.len() };
                self.report(error, self.position);
                break;
            }
            let token = self.next_token();
            raw.push(token);
        }

        raw.push(Token::new(
            TokenKind::Eof,
            "",
            SourceSpan::new(self.position, self.position),
        ));

        // Metrics see the raw stream; trivia attachment below folds
        // comments and whitespace out of token position
        for token in &raw {
            self.metrics.record_token(token);
        }

        let tokens = attach_trivia(raw);

        log_success!(codes::success::LEXING_COMPLETE, "Lexical analysis completed",
            "tokens" => tokens.len(),
            "diagnostics" => self.diagnostics.len()
        );

        LexOutput {
            tokens,
            diagnostics: self.diagnostics,
            metrics: self.metrics,
        }
    }

    // === CURSOR PRIMITIVES ===

    fn is_at_end(&self) -> bool {
        self.cursor >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.cursor).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.cursor + offset).copied()
    }

    fn bump(&mut self) -> char {
        let ch = self.chars[self.cursor];
        self.cursor += 1;
        self.position = self.position.advance(ch);
        ch
    }

    fn bump_while(&mut self, text: &mut String, predicate: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if !predicate(ch) {
                break;
            }
            text.push(self.bump());
        }
    }

    fn span_from(&self, start: SourcePosition) -> SourceSpan {
        SourceSpan::new(start, self.position)
    }

    fn report(&mut self, error: LexerError, position: SourcePosition) {
        log_error!(error.error_code(), "Lexical error",
            span = SourceSpan::new(position, position),
            "detail" => error
        );
        self.diagnostics
            .push(Diagnostic::error(error.to_string(), position));
    }

    // === TOKEN DISPATCH ===

    fn next_token(&mut self) -> Token {
        let start = self.position;
        let ch = match self.peek() {
            Some(ch) => ch,
            None => return Token::new(TokenKind::Eof, "", self.span_from(start)),
        };

        match ch {
            c if c.is_whitespace() => self.lex_whitespace(start),
            '"' => self.lex_string(start),
            c if c.is_ascii_digit() => self.lex_number(start),
            '&' => self.lex_user_variable(start),
            '%' => self.lex_system_name(start),
            '#' => self.lex_directive(start),
            '/' => match self.peek_at(1) {
                Some('*') => self.lex_delimited_comment(start, CommentStyle::Block, "*/"),
                Some('+') => self.lex_delimited_comment(start, CommentStyle::Api, "+/"),
                _ => self.lex_operator(start),
            },
            '<' if self.peek_at(1) == Some('*') => self.lex_nested_comment(start),
            c if c.is_alphabetic() || c == '_' => self.lex_word(start),
            _ => self.lex_operator(start),
        }
    }

    // === TRIVIA ===

    /// A whitespace run; a line break ends the token so trailing trivia can
    /// stop at the line boundary.
    fn lex_whitespace(&mut self, start: SourcePosition) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if !ch.is_whitespace() {
                break;
            }
            let ch = self.bump();
            text.push(ch);
            if ch == '\n' {
                break;
            }
        }
        Token::new(TokenKind::Whitespace, text, self.span_from(start))
    }

    /// `/* ... */` and `/+ ... +/` comments share a two-char terminator
    fn lex_delimited_comment(
        &mut self,
        start: SourcePosition,
        style: CommentStyle,
        terminator: &str,
    ) -> Token {
        let mut text = String::new();
        text.push(self.bump());
        text.push(self.bump());

        let mut term = terminator.chars();
        let (t0, t1) = match (term.next(), term.next()) {
            (Some(a), Some(b)) => (a, b),
            _ => ('*', '/'),
        };

        let mut closed = false;
        while let Some(ch) = self.peek() {
            if ch == t0 && self.peek_at(1) == Some(t1) {
                text.push(self.bump());
                text.push(self.bump());
                closed = true;
                break;
            }
            text.push(self.bump());
        }

        if !closed {
            self.report(LexerError::UnterminatedComment, start);
        }
        self.check_comment_length(&text, start);
        Token::new(TokenKind::Comment(style), text, self.span_from(start))
    }

    /// `<* ... *>` comments nest
    fn lex_nested_comment(&mut self, start: SourcePosition) -> Token {
        let mut text = String::new();
        text.push(self.bump());
        text.push(self.bump());
        let mut depth = 1usize;

        while let Some(ch) = self.peek() {
            if ch == '<' && self.peek_at(1) == Some('*') {
                text.push(self.bump());
                text.push(self.bump());
                depth += 1;
            } else if ch == '*' && self.peek_at(1) == Some('>') {
                text.push(self.bump());
                text.push(self.bump());
                depth -= 1;
                if depth == 0 {
                    break;
                }
            } else {
                text.push(self.bump());
            }
        }

        if depth > 0 {
            self.report(LexerError::UnterminatedComment, start);
        }
        self.check_comment_length(&text, start);
        Token::new(TokenKind::Comment(CommentStyle::Nested), text, self.span_from(start))
    }

    /// `rem ...;` comment, entered from the word lexer with `rem` consumed
    fn lex_rem_comment(&mut self, start: SourcePosition, mut text: String) -> Token {
        let mut closed = false;
        while let Some(ch) = self.peek() {
            text.push(self.bump());
            if ch == ';' {
                closed = true;
                break;
            }
        }
        if !closed {
            self.report(LexerError::UnterminatedComment, start);
        }
        self.check_comment_length(&text, start);
        Token::new(TokenKind::Comment(CommentStyle::Rem), text, self.span_from(start))
    }

    fn check_comment_length(&mut self, text: &str, start: SourcePosition) {
        let length = text.chars().count();
        if length > MAX_COMMENT_LENGTH {
            self.report(LexerError::CommentTooLong { length }, start);
        }
    }

    // === LITERALS ===

    /// Double-quoted string; `""` embeds a quote
    fn lex_string(&mut self, start: SourcePosition) -> Token {
        let mut text = String::new();
        let mut value = String::new();
        text.push(self.bump());

        let mut closed = false;
        while let Some(ch) = self.peek() {
            if ch == '"' {
                if self.peek_at(1) == Some('"') {
                    text.push(self.bump());
                    text.push(self.bump());
                    value.push('"');
                    continue;
                }
                text.push(self.bump());
                closed = true;
                break;
            }
            let ch = self.bump();
            text.push(ch);
            value.push(ch);
        }

        if !closed {
            self.report(LexerError::UnterminatedString, start);
        }
        if text.len() > MAX_STRING_SIZE {
            self.report(LexerError::StringTooLarge { size: text.len() }, start);
        }

        Token::new(TokenKind::String, text, self.span_from(start))
            .with_value(LiteralValue::String(value))
    }

    /// Decimal literal with optional fraction and exponent
    fn lex_number(&mut self, start: SourcePosition) -> Token {
        let mut text = String::new();
        self.bump_while(&mut text, |c| c.is_ascii_digit());

        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            text.push(self.bump());
            self.bump_while(&mut text, |c| c.is_ascii_digit());
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let exponent_digits = match self.peek_at(1) {
                Some('+') | Some('-') => self.peek_at(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent_digits {
                text.push(self.bump());
                if matches!(self.peek(), Some('+') | Some('-')) {
                    text.push(self.bump());
                }
                self.bump_while(&mut text, |c| c.is_ascii_digit());
            }
        }

        let token = Token::new(TokenKind::Number, text.clone(), self.span_from(start));
        match text.parse::<f64>() {
            Ok(number) => token.with_value(LiteralValue::Number(number)),
            Err(_) => {
                self.report(LexerError::InvalidNumber { text }, start);
                token
            }
        }
    }

    // === IDENTIFIERS AND KEYWORDS ===

    fn is_word_char(ch: char) -> bool {
        ch.is_alphanumeric() || ch == '_'
    }

    fn lex_user_variable(&mut self, start: SourcePosition) -> Token {
        let mut text = String::new();
        text.push(self.bump());

        // '&&' is the directive-condition conjunction, not a sigil
        if self.peek() == Some('&') {
            text.push(self.bump());
            return Token::new(TokenKind::AmpAmp, text, self.span_from(start));
        }

        if !self.peek().is_some_and(Self::is_word_char) {
            self.report(LexerError::EmptyIdentifier { sigil: '&' }, start);
            return Token::new(TokenKind::Invalid, text, self.span_from(start));
        }

        self.bump_while(&mut text, Self::is_word_char);
        self.check_identifier_length(&text, start);
        Token::new(TokenKind::UserVariable, text, self.span_from(start))
    }

    fn lex_system_name(&mut self, start: SourcePosition) -> Token {
        let mut text = String::new();
        text.push(self.bump());

        if !self.peek().is_some_and(Self::is_word_char) {
            self.report(LexerError::EmptyIdentifier { sigil: '%' }, start);
            return Token::new(TokenKind::Invalid, text, self.span_from(start));
        }

        self.bump_while(&mut text, Self::is_word_char);
        self.check_identifier_length(&text, start);
        let kind = classify_percent_name(&text[1..]);
        Token::new(kind, text, self.span_from(start))
    }

    /// Bare word: keyword, keyword literal, REM comment opener, or GenericId.
    /// Hyphenated keywords (`End-If`, `When-Other`, ...) are assembled here
    /// by probing past the hyphen before committing.
    fn lex_word(&mut self, start: SourcePosition) -> Token {
        let mut text = String::new();
        self.bump_while(&mut text, Self::is_word_char);
        self.check_identifier_length(&text, start);

        if text.eq_ignore_ascii_case("rem") {
            return self.lex_rem_comment(start, text);
        }

        if Keyword::hyphen_head(&text) && self.peek() == Some('-') {
            if let Some(tail) = self.peek_word_after_hyphen() {
                let candidate = format!("{}-{}", text, tail);
                if let Some(keyword) = Keyword::lookup(&candidate) {
                    // Consume the hyphen and the tail we probed
                    text.push(self.bump());
                    for _ in 0..tail.chars().count() {
                        text.push(self.bump());
                    }
                    return self.keyword_token(keyword, text, start);
                }
            }
        }

        match Keyword::lookup(&text) {
            Some(keyword) => self.keyword_token(keyword, text, start),
            None => Token::new(TokenKind::GenericId, text, self.span_from(start)),
        }
    }

    /// Word following the hyphen under the cursor, without consuming
    fn peek_word_after_hyphen(&self) -> Option<String> {
        let mut word = String::new();
        let mut offset = 1;
        while let Some(ch) = self.peek_at(offset) {
            if !Self::is_word_char(ch) {
                break;
            }
            word.push(ch);
            offset += 1;
        }
        if word.is_empty() {
            None
        } else {
            Some(word)
        }
    }

    fn keyword_token(&self, keyword: Keyword, text: String, start: SourcePosition) -> Token {
        let token = Token::new(TokenKind::Keyword(keyword), text, self.span_from(start));
        match keyword {
            Keyword::True => token.with_value(LiteralValue::Boolean(true)),
            Keyword::False => token.with_value(LiteralValue::Boolean(false)),
            Keyword::Null => token.with_value(LiteralValue::Null),
            _ => token,
        }
    }

    fn check_identifier_length(&mut self, text: &str, start: SourcePosition) {
        let length = text.chars().count();
        if length > MAX_IDENTIFIER_LENGTH {
            self.report(LexerError::IdentifierTooLong { length }, start);
        }
    }

    // === DIRECTIVES ===

    /// `#` plus a word; `#End-If` needs the same hyphen assembly as keywords
    fn lex_directive(&mut self, start: SourcePosition) -> Token {
        let mut text = String::new();
        text.push(self.bump());

        if !self.peek().is_some_and(|c| c.is_alphabetic()) {
            self.report(LexerError::InvalidCharacter { character: '#' }, start);
            return Token::new(TokenKind::Invalid, text, self.span_from(start));
        }

        self.bump_while(&mut text, Self::is_word_char);

        let word = &text[1..];
        if word.eq_ignore_ascii_case("end") && self.peek() == Some('-') {
            if let Some(tail) = self.peek_word_after_hyphen() {
                if tail.eq_ignore_ascii_case("if") {
                    text.push(self.bump());
                    for _ in 0..tail.chars().count() {
                        text.push(self.bump());
                    }
                    return Token::new(TokenKind::DirectiveEnd, text, self.span_from(start));
                }
            }
        }

        let kind = match text[1..].to_ascii_lowercase().as_str() {
            "if" => TokenKind::DirectiveIf,
            "then" => TokenKind::DirectiveThen,
            "else" => TokenKind::DirectiveElse,
            "toolsrel" => TokenKind::DirectiveToolsRel,
            _ => TokenKind::DirectiveAtom,
        };
        Token::new(kind, text, self.span_from(start))
    }

    // === OPERATORS ===

    fn lex_operator(&mut self, start: SourcePosition) -> Token {
        let ch = self.bump();
        let mut text = String::from(ch);

        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => {
                if self.peek() == Some('*') {
                    text.push(self.bump());
                    TokenKind::Exponent
                } else {
                    TokenKind::Star
                }
            }
            '/' => TokenKind::Slash,
            '|' => {
                if self.peek() == Some('|') {
                    text.push(self.bump());
                    TokenKind::PipePipe
                } else {
                    TokenKind::Pipe
                }
            }
            '=' => TokenKind::Equal,
            '<' => match self.peek() {
                Some('>') => {
                    text.push(self.bump());
                    TokenKind::NotEqual
                }
                Some('=') => {
                    text.push(self.bump());
                    TokenKind::LessEqual
                }
                _ => TokenKind::Less,
            },
            '>' => {
                if self.peek() == Some('=') {
                    text.push(self.bump());
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            '@' => TokenKind::At,
            _ => {
                self.report(LexerError::InvalidCharacter { character: ch }, start);
                TokenKind::Invalid
            }
        };

        Token::new(kind, text, self.span_from(start))
    }
}

/// Fold trivia tokens into the leading and trailing lists of the adjacent
/// significant tokens. Trivia up to and including the first line break after
/// a token trails it; everything after the break leads the next token.
fn attach_trivia(raw: Vec<Token>) -> Vec<Token> {
    let mut result: Vec<Token> = Vec::new();
    let mut pending: Vec<Token> = Vec::new();
    // True while the previous significant token's line is still open
    let mut owner_open = false;

    for token in raw {
        if token.kind.is_trivia() {
            let breaks_line = token.text.contains('\n');
            pending.push(token);
            if owner_open && breaks_line {
                if let Some(owner) = result.last_mut() {
                    owner.trailing_trivia.append(&mut pending);
                }
                owner_open = false;
            }
        } else {
            let mut token = token;
            if owner_open {
                // Same-line trivia between two tokens trails the first
                if let Some(owner) = result.last_mut() {
                    owner.trailing_trivia.append(&mut pending);
                }
            }
            token.leading_trivia = std::mem::take(&mut pending);
            result.push(token);
            owner_open = true;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> LexOutput {
        LexicalAnalyzer::new(source).tokenize()
    }

    fn kinds(output: &LexOutput) -> Vec<TokenKind> {
        output.tokens.iter().map(|t| t.kind).collect()
    }

    fn reconstruct(output: &LexOutput) -> String {
        let mut text = String::new();
        for token in &output.tokens {
            for trivia in &token.leading_trivia {
                text.push_str(&trivia.text);
            }
            text.push_str(&token.text);
            for trivia in &token.trailing_trivia {
                text.push_str(&trivia.text);
            }
        }
        text
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let output = lex("IF if If iF");
        let expected: Vec<TokenKind> = vec![
            TokenKind::Keyword(Keyword::If),
            TokenKind::Keyword(Keyword::If),
            TokenKind::Keyword(Keyword::If),
            TokenKind::Keyword(Keyword::If),
            TokenKind::Eof,
        ];
        assert_eq!(kinds(&output), expected);
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_hyphenated_keywords() {
        let output = lex("End-If end-while WHEN-OTHER");
        assert_eq!(
            kinds(&output),
            vec![
                TokenKind::Keyword(Keyword::EndIf),
                TokenKind::Keyword(Keyword::EndWhile),
                TokenKind::Keyword(Keyword::WhenOther),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_hyphen_without_keyword_tail_stays_minus() {
        let output = lex("end - 1");
        assert_eq!(
            kinds(&output),
            vec![
                TokenKind::GenericId,
                TokenKind::Minus,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_identifier_families() {
        let output = lex("&local %UserId %Delete MyRecord");
        assert_eq!(
            kinds(&output),
            vec![
                TokenKind::UserVariable,
                TokenKind::SystemVariable,
                TokenKind::SystemConstant,
                TokenKind::GenericId,
                TokenKind::Eof,
            ]
        );
        assert_eq!(output.tokens[0].text, "&local");
        assert_eq!(output.tokens[1].text, "%UserId");
    }

    #[test]
    fn test_string_with_doubled_quote_escape() {
        let output = lex(r#""say ""hi""""#);
        assert_eq!(output.tokens[0].kind, TokenKind::String);
        assert_eq!(
            output.tokens[0].value,
            Some(LiteralValue::String("say \"hi\"".to_string()))
        );
    }

    #[test]
    fn test_unterminated_string_reports_but_produces_token() {
        let output = lex("\"open");
        assert_eq!(output.tokens[0].kind, TokenKind::String);
        assert_eq!(output.diagnostics.len(), 1);
        assert!(output.diagnostics[0].message.contains("Unterminated string"));
    }

    #[test]
    fn test_numbers() {
        let output = lex("42 3.25 1e6 2.5E-3");
        let values: Vec<Option<LiteralValue>> = output
            .tokens
            .iter()
            .take(4)
            .map(|t| t.value.clone())
            .collect();
        assert_eq!(
            values,
            vec![
                Some(LiteralValue::Number(42.0)),
                Some(LiteralValue::Number(3.25)),
                Some(LiteralValue::Number(1e6)),
                Some(LiteralValue::Number(2.5e-3)),
            ]
        );
    }

    #[test]
    fn test_dot_after_number_is_member_access() {
        let output = lex("1.toString");
        assert_eq!(
            kinds(&output),
            vec![
                TokenKind::Number,
                TokenKind::Dot,
                TokenKind::GenericId,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comment_styles() {
        let output = lex("/* a */ <* b <* c *> d *> /+ e +/ rem f;");
        let comment_styles: Vec<CommentStyle> = output.tokens[0]
            .leading_trivia
            .iter()
            .chain(output.tokens[0].trailing_trivia.iter())
            .filter_map(|t| match t.kind {
                TokenKind::Comment(style) => Some(style),
                _ => None,
            })
            .collect();
        assert_eq!(
            comment_styles,
            vec![
                CommentStyle::Block,
                CommentStyle::Nested,
                CommentStyle::Api,
                CommentStyle::Rem,
            ]
        );
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_metrics_count_comments_before_trivia_folding() {
        let output = lex("/* note */ &x = 1; <* other *>");
        assert_eq!(output.metrics.comment_count, 2);
        assert_eq!(output.metrics.max_comment_length, "<* other *>".chars().count());
        assert_eq!(output.metrics.identifier_tokens, 1);
    }

    #[test]
    fn test_unterminated_nested_comment() {
        let output = lex("<* outer <* inner *>");
        assert_eq!(output.diagnostics.len(), 1);
        assert!(output.diagnostics[0].message.contains("Unterminated comment"));
    }

    #[test]
    fn test_operators() {
        let output = lex("a ** b <> c <= d >= e | f");
        let ops: Vec<TokenKind> = output
            .tokens
            .iter()
            .filter(|t| t.kind.is_operator())
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            ops,
            vec![
                TokenKind::Exponent,
                TokenKind::NotEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Pipe,
            ]
        );
    }

    #[test]
    fn test_directive_connectives() {
        let output = lex("#If #ToolsRel >= \"8.54\" && #ToolsRel < \"8.56\" || #ToolsRel = \"9.0\" #Then");
        let k = kinds(&output);
        assert!(k.contains(&TokenKind::AmpAmp));
        assert!(k.contains(&TokenKind::PipePipe));
        assert!(!k.contains(&TokenKind::Invalid));
    }

    #[test]
    fn test_directive_tokens() {
        let output = lex("#If #ToolsRel #Then #Else #End-If #Custom");
        assert_eq!(
            kinds(&output),
            vec![
                TokenKind::DirectiveIf,
                TokenKind::DirectiveToolsRel,
                TokenKind::DirectiveThen,
                TokenKind::DirectiveElse,
                TokenKind::DirectiveEnd,
                TokenKind::DirectiveAtom,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_invalid_character_is_total() {
        let output = lex("&x = 1 ~ 2;");
        assert!(kinds(&output).contains(&TokenKind::Invalid));
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(*kinds(&output).last().unwrap(), TokenKind::Eof);
    }

    #[test]
    fn test_multibyte_positions() {
        let output = lex("\"café\" &naïve");
        let string_span = output.tokens[0].span;
        assert_eq!(string_span.len(), 6);
        assert_eq!(string_span.byte_len(), 7);

        let var = &output.tokens[1];
        assert_eq!(var.kind, TokenKind::UserVariable);
        assert_eq!(var.span.start().byte_index, 8);
        assert_eq!(var.span.start().index, 7);
    }

    #[test]
    fn test_source_reconstruction_from_trivia() {
        let source = "Local number &n; /* note */\n   &n = &n + 1;\n<* tail *>";
        let output = lex(source);
        assert_eq!(reconstruct(&output), source);
    }

    #[test]
    fn test_trailing_trivia_stops_at_line_break() {
        let source = "&a = 1; /* same line */\n/* next line */ &b = 2;";
        let output = lex(source);

        let semi = output
            .tokens
            .iter()
            .find(|t| t.kind == TokenKind::Semicolon)
            .unwrap();
        assert!(semi
            .trailing_trivia
            .iter()
            .any(|t| t.text.contains("same line")));

        let b = output
            .tokens
            .iter()
            .find(|t| t.text == "&b")
            .unwrap();
        assert!(b
            .leading_trivia
            .iter()
            .any(|t| t.text.contains("next line")));
    }

    #[test]
    fn test_empty_source_yields_eof_only() {
        let output = lex("");
        assert_eq!(kinds(&output), vec![TokenKind::Eof]);
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_bare_sigil_is_invalid() {
        let output = lex("& %");
        assert_eq!(
            kinds(&output),
            vec![TokenKind::Invalid, TokenKind::Invalid, TokenKind::Eof]
        );
        assert_eq!(output.diagnostics.len(), 2);
    }
}
