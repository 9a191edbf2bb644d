//! Panic-mode recovery policy
//!
//! One synchronization-token table per grammar context, consulted by a
//! single shared skip routine. Keeping the sets declarative makes the
//! policy testable apart from the grammar rules that trigger it.

use crate::config::constants::compile_time::syntax::MAX_RECOVERY_SCAN_TOKENS;
use crate::grammar::keywords::Keyword;
use crate::tokens::{TokenKind, TokenStream};

/// The grammar context a failed rule was parsing in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncContext {
    /// Top-level declarations and statements
    TopLevel,
    /// Statement inside a block
    Statement,
    /// Member inside a class or interface body
    ClassMember,
    /// Expression position; stops at statement boundaries too
    Expression,
    /// Parameter list; stops at commas and the closing parenthesis
    ParameterList,
}

/// True when `kind` is a safe place for the given context to resume
pub fn is_sync_token(context: SyncContext, kind: TokenKind) -> bool {
    match context {
        SyncContext::TopLevel => match kind {
            TokenKind::Semicolon => true,
            TokenKind::Keyword(kw) => {
                kw.starts_statement()
                    || matches!(
                        kw,
                        Keyword::Import
                            | Keyword::Class
                            | Keyword::Interface
                            | Keyword::Function
                            | Keyword::Declare
                            | Keyword::Method
                            | Keyword::Get
                            | Keyword::Set
                    )
            }
            _ => false,
        },
        SyncContext::Statement => match kind {
            TokenKind::Semicolon => true,
            TokenKind::Keyword(kw) => kw.starts_statement() || kw.is_block_end(),
            _ => false,
        },
        SyncContext::ClassMember => match kind {
            TokenKind::Semicolon => true,
            TokenKind::Keyword(kw) => matches!(
                kw,
                Keyword::Method
                    | Keyword::Property
                    | Keyword::Instance
                    | Keyword::Constant
                    | Keyword::Private
                    | Keyword::Protected
                    | Keyword::EndClass
                    | Keyword::EndInterface
            ),
            _ => false,
        },
        SyncContext::Expression => match kind {
            TokenKind::Semicolon | TokenKind::RightParen | TokenKind::Comma => true,
            TokenKind::Keyword(kw) => kw.starts_statement() || kw.is_block_end(),
            _ => false,
        },
        SyncContext::ParameterList => matches!(
            kind,
            TokenKind::Comma | TokenKind::RightParen | TokenKind::Semicolon
        ),
    }
}

/// Skip tokens until one in the context's synchronization set (or Eof) is
/// under the cursor. Returns the number of tokens skipped. The scan is
/// capped; a pathological stream cannot stall recovery.
pub fn synchronize(stream: &mut TokenStream, context: SyncContext) -> usize {
    let mut skipped = 0;
    while !stream.is_at_end() && skipped < MAX_RECOVERY_SCAN_TOKENS {
        if is_sync_token(context, stream.current().kind) {
            break;
        }
        stream.advance();
        skipped += 1;
    }
    skipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::LexicalAnalyzer;

    fn stream(source: &str) -> TokenStream {
        TokenStream::new(LexicalAnalyzer::new(source).tokenize().tokens)
    }

    #[test]
    fn test_statement_recovery_stops_at_semicolon() {
        let mut s = stream("garbage tokens here ; If");
        let skipped = synchronize(&mut s, SyncContext::Statement);
        assert_eq!(skipped, 3);
        assert_eq!(s.current().kind, TokenKind::Semicolon);
    }

    #[test]
    fn test_statement_recovery_stops_at_statement_keyword() {
        let mut s = stream("x y z If &a = 1 Then");
        synchronize(&mut s, SyncContext::Statement);
        assert!(s.check_keyword(Keyword::If));
    }

    #[test]
    fn test_statement_recovery_stops_at_block_end() {
        let mut s = stream("junk junk End-If");
        synchronize(&mut s, SyncContext::Statement);
        assert!(s.check_keyword(Keyword::EndIf));
    }

    #[test]
    fn test_expression_recovery_stops_at_comma() {
        let mut s = stream("bad bad , next");
        synchronize(&mut s, SyncContext::Expression);
        assert_eq!(s.current().kind, TokenKind::Comma);
    }

    #[test]
    fn test_class_member_recovery() {
        let mut s = stream("junk junk property string &Name;");
        synchronize(&mut s, SyncContext::ClassMember);
        assert!(s.check_keyword(Keyword::Property));
    }

    #[test]
    fn test_recovery_reaches_eof_on_pure_garbage() {
        let mut s = stream("a b c d");
        synchronize(&mut s, SyncContext::Statement);
        assert!(s.is_at_end());
    }
}
