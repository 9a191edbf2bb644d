//! Recursive-descent parser
//!
//! Consumes the preprocessed token stream and always produces a program
//! node. Rule failures become diagnostics plus explicit error placeholder
//! nodes; panic-mode recovery then resynchronizes using the per-context
//! token sets in `recovery`, so one malformed construct never takes the
//! rest of the file with it.

use super::error::SyntaxError;
use super::recovery::{synchronize, SyncContext};
use crate::config::constants::compile_time::syntax::MAX_PARSE_DEPTH;
use crate::grammar::ast::{Ast, Attr, NodeId, NodeKind, VarScope, Visibility};
use crate::grammar::keywords::Keyword;
use crate::logging::codes;
use crate::tokens::{LiteralValue, Token, TokenKind, TokenStream};
use crate::utils::{Diagnostic, SourcePosition, SourceSpan};
use crate::{log_debug, log_error, log_success};

/// Result of parsing one token stream
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub ast: Ast,
    /// The root node; present for any input, including empty or garbage
    pub program: NodeId,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct Parser {
    stream: TokenStream,
    ast: Ast,
    diagnostics: Vec<Diagnostic>,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            stream: TokenStream::new(tokens),
            ast: Ast::new(),
            diagnostics: Vec::new(),
            depth: 0,
        }
    }

    pub fn parse_program(mut self) -> ParseResult {
        log_debug!("Starting parse", "tokens" => self.stream.significant_len());

        let start = self.stream.current_span().start();
        let program = self.ast.alloc(NodeKind::Program, SourceSpan::dummy());

        while !self.stream.is_at_end() {
            let checkpoint = self.stream.checkpoint();
            let node = self.parse_top_level();
            self.ast.attach(program, node);
            self.consume_semicolons();

            // A rule that consumed nothing would loop forever
            if self.stream.stalled_since(checkpoint) {
                self.stream.advance();
            }
        }

        let span = self.finish_span(start);
        self.ast.set_span(program, span);

        log_success!(codes::success::PARSING_COMPLETE, "Parse completed",
            "nodes" => self.ast.len(),
            "diagnostics" => self.diagnostics.len()
        );

        ParseResult {
            ast: self.ast,
            program,
            diagnostics: self.diagnostics,
        }
    }

    // === SHARED MACHINERY ===

    fn report(&mut self, error: SyntaxError) {
        let position = error.position();
        log_error!(error.error_code(), "Syntax error",
            span = SourceSpan::new(position, position),
            "detail" => error
        );
        self.diagnostics
            .push(Diagnostic::error(error.to_string(), position));
    }

    fn finish_span(&self, start: SourcePosition) -> SourceSpan {
        let end = self.stream.previous_span().end();
        if end.index < start.index {
            SourceSpan::new(start, start)
        } else {
            SourceSpan::new(start, end)
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> bool {
        if self.stream.match_keyword(keyword) {
            return true;
        }
        self.report(SyntaxError::MissingToken {
            expected: format!("'{}'", keyword),
            position: self.stream.current_span().start(),
        });
        false
    }

    fn expect_kind(&mut self, kind: TokenKind, expected: &str) -> bool {
        if self.stream.match_kind(kind) {
            return true;
        }
        self.report(SyntaxError::MissingToken {
            expected: expected.to_string(),
            position: self.stream.current_span().start(),
        });
        false
    }

    /// Close a block opened by `opener`: consume `closer` or report the
    /// unmatched delimiter where the block ended.
    fn expect_block_end(&mut self, opener: Keyword, closer: Keyword) {
        if !self.stream.match_keyword(closer) {
            self.report(SyntaxError::UnmatchedBlockDelimiter {
                opener: opener.to_string(),
                closer: closer.to_string(),
                position: self.stream.current_span().start(),
            });
        }
    }

    fn consume_semicolons(&mut self) {
        while self.stream.match_kind(TokenKind::Semicolon) {}
    }

    fn enter(&mut self) -> bool {
        self.depth += 1;
        self.depth <= MAX_PARSE_DEPTH
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Record `error`, resynchronize in `context`, and return a statement
    /// placeholder covering the skipped region.
    fn error_statement(&mut self, error: SyntaxError, context: SyncContext) -> NodeId {
        let start = error.position();
        let message = error.to_string();
        self.report(error);
        synchronize(&mut self.stream, context);
        let span = self.finish_span(start);
        self.ast
            .alloc(NodeKind::SyntaxErrorStatement { message }, span)
    }

    fn error_expression(&mut self, error: SyntaxError) -> NodeId {
        let start = error.position();
        let message = error.to_string();
        self.report(error);
        synchronize(&mut self.stream, SyncContext::Expression);
        let span = self.finish_span(start);
        self.ast
            .alloc(NodeKind::SyntaxErrorExpression { message }, span)
    }

    fn identifier_text(&mut self, expected: &str) -> Option<String> {
        if self.stream.current().kind == TokenKind::GenericId {
            return Some(self.stream.advance().text);
        }
        self.report(SyntaxError::MissingToken {
            expected: expected.to_string(),
            position: self.stream.current_span().start(),
        });
        None
    }

    // === TOP LEVEL ===

    fn parse_top_level(&mut self) -> NodeId {
        match self.stream.current().as_keyword() {
            Some(Keyword::Import) => self.parse_import(),
            Some(Keyword::Class) => self.parse_class_declaration(),
            Some(Keyword::Interface) => self.parse_interface_declaration(),
            Some(Keyword::Function) => self.parse_function_definition(),
            Some(Keyword::Declare) => self.parse_function_declaration(),
            Some(Keyword::Method) => self.parse_method_implementation(),
            Some(Keyword::Get) => self.parse_accessor_implementation(Keyword::Get),
            Some(Keyword::Set) => self.parse_accessor_implementation(Keyword::Set),
            _ => self.parse_statement(),
        }
    }

    /// `import PKG:SubPkg:ClassName;` or `import PKG:*;`
    fn parse_import(&mut self) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let mut path = String::new();
        match self.identifier_text("package name after 'Import'") {
            Some(name) => path.push_str(&name),
            None => {
                return self.error_statement(
                    SyntaxError::MissingToken {
                        expected: "package name after 'Import'".to_string(),
                        position: start,
                    },
                    SyncContext::TopLevel,
                )
            }
        }

        while self.stream.match_kind(TokenKind::Colon) {
            path.push(':');
            if self.stream.match_kind(TokenKind::Star) {
                path.push('*');
                break;
            }
            match self.identifier_text("name after ':'") {
                Some(part) => path.push_str(&part),
                None => break,
            }
        }

        let span = self.finish_span(start);
        self.ast.alloc(NodeKind::Import { path }, span)
    }

    /// `A:B:C` package-qualified type path, or a bare builtin type name;
    /// `array of T` nests.
    fn parse_type_name(&mut self) -> NodeId {
        let start = self.stream.current_span().start();
        let mut text = String::new();

        loop {
            match self.stream.current().kind {
                TokenKind::GenericId => {
                    let word = self.stream.advance().text;
                    let is_array = word.eq_ignore_ascii_case("array");
                    text.push_str(&word);
                    if is_array && self.stream.check_keyword(Keyword::Of) {
                        self.stream.advance();
                        text.push_str(" of ");
                        continue;
                    }
                }
                _ => {
                    self.report(SyntaxError::MissingToken {
                        expected: "type name".to_string(),
                        position: self.stream.current_span().start(),
                    });
                }
            }
            break;
        }

        while self.stream.match_kind(TokenKind::Colon) {
            text.push(':');
            if let Some(part) = self.identifier_text("name after ':'") {
                text.push_str(&part);
            } else {
                break;
            }
        }

        let span = self.finish_span(start);
        self.ast.alloc(NodeKind::TypeName { text }, span)
    }

    // === CLASSES AND INTERFACES ===

    fn parse_class_declaration(&mut self) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let name = self.identifier_text("class name").unwrap_or_default();
        let node = self
            .ast
            .alloc(NodeKind::ClassDeclaration { name }, SourceSpan::dummy());

        self.parse_heritage(node);
        self.consume_semicolons();
        self.parse_member_list(node, Keyword::EndClass);
        self.expect_block_end(Keyword::Class, Keyword::EndClass);

        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    fn parse_interface_declaration(&mut self) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let name = self.identifier_text("interface name").unwrap_or_default();
        let node = self.ast.alloc(
            NodeKind::InterfaceDeclaration { name },
            SourceSpan::dummy(),
        );

        self.parse_heritage(node);
        self.consume_semicolons();
        self.parse_member_list(node, Keyword::EndInterface);
        self.expect_block_end(Keyword::Interface, Keyword::EndInterface);

        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    fn parse_heritage(&mut self, node: NodeId) {
        if self.stream.match_keyword(Keyword::Extends) {
            let base = self.parse_type_name();
            self.ast.add_attr(base, Attr::Flag("extends".to_string()));
            self.ast.attach(node, base);
        }
        if self.stream.match_keyword(Keyword::Implements) {
            let base = self.parse_type_name();
            self.ast
                .add_attr(base, Attr::Flag("implements".to_string()));
            self.ast.attach(node, base);
        }
    }

    /// Members in visibility order: public (implicit), then the sections
    /// opened by `protected` / `private`.
    fn parse_member_list(&mut self, owner: NodeId, terminator: Keyword) {
        let mut visibility = Visibility::Public;

        while !self.stream.is_at_end() && !self.stream.check_keyword(terminator) {
            if self.stream.match_keyword(Keyword::Protected) {
                visibility = Visibility::Protected;
                continue;
            }
            if self.stream.match_keyword(Keyword::Private) {
                visibility = Visibility::Private;
                continue;
            }

            let checkpoint = self.stream.checkpoint();
            let member = self.parse_class_member(visibility);
            self.ast.attach(owner, member);
            self.consume_semicolons();
            if self.stream.stalled_since(checkpoint) {
                self.stream.advance();
            }
        }
    }

    fn parse_class_member(&mut self, visibility: Visibility) -> NodeId {
        match self.stream.current().as_keyword() {
            Some(Keyword::Method) => self.parse_method_header(visibility),
            Some(Keyword::Property) => self.parse_property(visibility),
            Some(Keyword::Instance) => self.parse_instance(),
            Some(Keyword::Constant) => self.parse_constant(),
            _ => {
                let found = self.stream.current().kind.describe();
                let position = self.stream.current_span().start();
                self.error_statement(
                    SyntaxError::UnexpectedToken {
                        found,
                        expected: "a class member".to_string(),
                        position,
                    },
                    SyncContext::ClassMember,
                )
            }
        }
    }

    /// `method Name(&p As Type, ...) [Returns Type] [abstract];`
    fn parse_method_header(&mut self, visibility: Visibility) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let name = self.identifier_text("method name").unwrap_or_default();
        let node = self.ast.alloc(
            NodeKind::MethodHeader { name, visibility },
            SourceSpan::dummy(),
        );

        if self.stream.match_kind(TokenKind::LeftParen) {
            self.parse_parameter_list(node);
        }
        if self.stream.match_keyword(Keyword::Returns) {
            let return_type = self.parse_type_name();
            self.ast
                .add_attr(return_type, Attr::Flag("returns".to_string()));
            self.ast.attach(node, return_type);
        }
        if self.stream.match_keyword(Keyword::Abstract) {
            self.ast.add_attr(node, Attr::Flag("abstract".to_string()));
        }

        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    /// Comma-separated `&param As Type [out]` list up to `)`
    fn parse_parameter_list(&mut self, owner: NodeId) {
        if self.stream.match_kind(TokenKind::RightParen) {
            return;
        }

        loop {
            let start = self.stream.current_span().start();
            if self.stream.current().kind != TokenKind::UserVariable {
                self.report(SyntaxError::MissingToken {
                    expected: "parameter variable".to_string(),
                    position: start,
                });
                synchronize(&mut self.stream, SyncContext::ParameterList);
            } else {
                let name = self.stream.advance().text;
                let parameter = self
                    .ast
                    .alloc(NodeKind::Parameter { name }, SourceSpan::dummy());
                if self.stream.match_keyword(Keyword::As) {
                    let type_name = self.parse_type_name();
                    self.ast.attach(parameter, type_name);
                }
                if self.stream.match_keyword(Keyword::Out) {
                    self.ast
                        .add_attr(parameter, Attr::Flag("out".to_string()));
                } else if self.stream.match_keyword(Keyword::Ref) {
                    self.ast
                        .add_attr(parameter, Attr::Flag("ref".to_string()));
                }
                let span = self.finish_span(start);
                self.ast.set_span(parameter, span);
                self.ast.attach(owner, parameter);
            }

            if self.stream.match_kind(TokenKind::Comma) {
                continue;
            }
            self.expect_kind(TokenKind::RightParen, "')' after parameters");
            break;
        }
    }

    /// `property Type Name [get][set][readonly][abstract];`
    fn parse_property(&mut self, visibility: Visibility) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let type_name = self.parse_type_name();
        let name = self.identifier_text("property name").unwrap_or_default();
        let node = self.ast.alloc(
            NodeKind::PropertyDeclaration { name, visibility },
            SourceSpan::dummy(),
        );
        self.ast.attach(node, type_name);

        loop {
            if self.stream.match_keyword(Keyword::Get) {
                self.ast.add_attr(node, Attr::Flag("get".to_string()));
            } else if self.stream.match_keyword(Keyword::Set) {
                self.ast.add_attr(node, Attr::Flag("set".to_string()));
            } else if self.stream.match_keyword(Keyword::ReadOnly) {
                self.ast.add_attr(node, Attr::Flag("readonly".to_string()));
            } else if self.stream.match_keyword(Keyword::Abstract) {
                self.ast.add_attr(node, Attr::Flag("abstract".to_string()));
            } else {
                break;
            }
        }

        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    /// `instance Type &var [, &var ...];`
    fn parse_instance(&mut self) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let node = self
            .ast
            .alloc(NodeKind::InstanceDeclaration, SourceSpan::dummy());
        let type_name = self.parse_type_name();
        self.ast.attach(node, type_name);

        loop {
            if self.stream.current().kind == TokenKind::UserVariable {
                let token = self.stream.advance();
                let variable = self.ast.alloc(
                    NodeKind::IdentifierExpression { name: token.text },
                    token.span,
                );
                self.ast.attach(node, variable);
            } else {
                self.report(SyntaxError::MissingToken {
                    expected: "instance variable".to_string(),
                    position: self.stream.current_span().start(),
                });
                break;
            }
            if !self.stream.match_kind(TokenKind::Comma) {
                break;
            }
        }

        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    /// `constant &Name = literal;`
    fn parse_constant(&mut self) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let name = if self.stream.current().kind == TokenKind::UserVariable {
            self.stream.advance().text
        } else {
            self.report(SyntaxError::MissingToken {
                expected: "constant name".to_string(),
                position: self.stream.current_span().start(),
            });
            String::new()
        };

        let node = self
            .ast
            .alloc(NodeKind::ConstantDeclaration { name }, SourceSpan::dummy());

        if self.expect_kind(TokenKind::Equal, "'=' in constant declaration") {
            let value = self.parse_expression();
            self.ast.attach(node, value);
        }

        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    // === IMPLEMENTATION BLOCKS ===

    /// `method Name ... end-method;` — headers and implementations are
    /// parsed independently; correlating them by name is a consumer's job.
    fn parse_method_implementation(&mut self) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let name = self.identifier_text("method name").unwrap_or_default();
        let node = self.ast.alloc(
            NodeKind::MethodImplementation { name },
            SourceSpan::dummy(),
        );
        self.consume_semicolons();

        let body = self.parse_block(&[Keyword::EndMethod]);
        self.ast.attach(node, body);
        self.expect_block_end(Keyword::Method, Keyword::EndMethod);

        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    /// `get Name ... end-get;` / `set Name ... end-set;`
    fn parse_accessor_implementation(&mut self, opener: Keyword) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let name = self.identifier_text("property name").unwrap_or_default();
        let (kind, closer) = match opener {
            Keyword::Get => (NodeKind::GetterImplementation { name }, Keyword::EndGet),
            _ => (NodeKind::SetterImplementation { name }, Keyword::EndSet),
        };
        let node = self.ast.alloc(kind, SourceSpan::dummy());

        if self.stream.match_keyword(Keyword::Returns) {
            let return_type = self.parse_type_name();
            self.ast.attach(node, return_type);
        }
        self.consume_semicolons();

        let body = self.parse_block(&[closer]);
        self.ast.attach(node, body);
        self.expect_block_end(opener, closer);

        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    /// `Function Name(params) [Returns Type]; ... End-Function;`
    fn parse_function_definition(&mut self) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let name = self.identifier_text("function name").unwrap_or_default();
        let node = self
            .ast
            .alloc(NodeKind::FunctionDefinition { name }, SourceSpan::dummy());

        if self.stream.match_kind(TokenKind::LeftParen) {
            self.parse_parameter_list(node);
        }
        if self.stream.match_keyword(Keyword::Returns) {
            let return_type = self.parse_type_name();
            self.ast.attach(node, return_type);
        }
        self.consume_semicolons();

        let body = self.parse_block(&[Keyword::EndFunction]);
        self.ast.attach(node, body);
        self.expect_block_end(Keyword::Function, Keyword::EndFunction);

        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    /// `Declare Function Name PeopleCode RECORD.FIELD Event;`
    fn parse_function_declaration(&mut self) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        if !self.expect_keyword(Keyword::Function) {
            return self.error_statement(
                SyntaxError::MissingToken {
                    expected: "'Function' after 'Declare'".to_string(),
                    position: start,
                },
                SyncContext::TopLevel,
            );
        }

        let name = self.identifier_text("function name").unwrap_or_default();
        let node = self
            .ast
            .alloc(NodeKind::FunctionDeclaration { name }, SourceSpan::dummy());

        if self.expect_keyword(Keyword::PeopleCode) {
            // RECORD.FIELD reference plus the event name
            let reference = self.parse_postfix();
            self.ast.attach(node, reference);
            if self.stream.current().kind == TokenKind::GenericId {
                let event = self.stream.advance();
                let event_node = self.ast.alloc(
                    NodeKind::IdentifierExpression { name: event.text },
                    event.span,
                );
                self.ast.attach(node, event_node);
            }
        }

        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    // === STATEMENTS ===

    /// Statements in sequence until one of `terminators` (or Eof)
    fn parse_block(&mut self, terminators: &[Keyword]) -> NodeId {
        let start = self.stream.current_span().start();
        let block = self.ast.alloc(NodeKind::Block, SourceSpan::dummy());

        loop {
            if self.stream.is_at_end() {
                break;
            }
            if let Some(kw) = self.stream.current().as_keyword() {
                if terminators.contains(&kw) {
                    break;
                }
            }

            let checkpoint = self.stream.checkpoint();
            let statement = self.parse_statement();
            self.ast.attach(block, statement);
            self.consume_semicolons();
            if self.stream.stalled_since(checkpoint) {
                self.stream.advance();
            }
        }

        let span = self.finish_span(start);
        self.ast.set_span(block, span);
        block
    }

    fn parse_statement(&mut self) -> NodeId {
        if !self.enter() {
            let placeholder = self.error_statement(
                SyntaxError::MaxDepthExceeded {
                    depth: self.depth,
                    position: self.stream.current_span().start(),
                },
                SyncContext::Statement,
            );
            self.leave();
            return placeholder;
        }
        let node = self.parse_statement_inner();
        self.leave();
        node
    }

    fn parse_statement_inner(&mut self) -> NodeId {
        match self.stream.current().as_keyword() {
            Some(Keyword::If) => self.parse_if(),
            Some(Keyword::Evaluate) => self.parse_evaluate(),
            Some(Keyword::For) => self.parse_for(),
            Some(Keyword::While) => self.parse_while(),
            Some(Keyword::Repeat) => self.parse_repeat(),
            Some(Keyword::Try) => self.parse_try(),
            Some(Keyword::Break) => self.parse_simple(NodeKind::BreakStatement),
            Some(Keyword::Continue) => self.parse_simple(NodeKind::ContinueStatement),
            Some(Keyword::Exit) => self.parse_optional_value(NodeKind::ExitStatement),
            Some(Keyword::Return) => self.parse_optional_value(NodeKind::ReturnStatement),
            Some(Keyword::Error) => self.parse_value_statement(NodeKind::ErrorStatement),
            Some(Keyword::Warning) => self.parse_value_statement(NodeKind::WarningStatement),
            Some(Keyword::Throw) => self.parse_value_statement(NodeKind::ThrowStatement),
            Some(Keyword::Local) => self.parse_variable_declaration(VarScope::Local),
            Some(Keyword::Global) => self.parse_variable_declaration(VarScope::Global),
            Some(Keyword::Component) => self.parse_variable_declaration(VarScope::Component),
            Some(Keyword::Constant) => self.parse_constant(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_simple(&mut self, kind: NodeKind) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();
        let span = self.finish_span(start);
        self.ast.alloc(kind, span)
    }

    /// `Return;` / `Return expr;` / `Exit;` / `Exit expr;`
    fn parse_optional_value(&mut self, kind: NodeKind) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let node = self.ast.alloc(kind, SourceSpan::dummy());
        if self.starts_expression() {
            let value = self.parse_expression();
            self.ast.attach(node, value);
        }

        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    /// `Error expr;` / `Warning expr;` / `throw expr;`
    fn parse_value_statement(&mut self, kind: NodeKind) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let node = self.ast.alloc(kind, SourceSpan::dummy());
        let value = self.parse_expression();
        self.ast.attach(node, value);

        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    fn starts_expression(&self) -> bool {
        let token = self.stream.current();
        match token.kind {
            TokenKind::Number
            | TokenKind::String
            | TokenKind::GenericId
            | TokenKind::UserVariable
            | TokenKind::SystemVariable
            | TokenKind::SystemConstant
            | TokenKind::LeftParen
            | TokenKind::Minus
            | TokenKind::At => true,
            TokenKind::Keyword(kw) => {
                kw.is_literal() || matches!(kw, Keyword::Not | Keyword::Create)
            }
            _ => false,
        }
    }

    /// `If cond Then ... [Else ...] End-If;`
    fn parse_if(&mut self) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let node = self.ast.alloc(NodeKind::IfStatement, SourceSpan::dummy());
        let condition = self.parse_expression();
        self.ast.attach(node, condition);
        self.expect_keyword(Keyword::Then);
        self.consume_semicolons();

        let then_block = self.parse_block(&[Keyword::Else, Keyword::EndIf]);
        self.ast.attach(node, then_block);

        if self.stream.match_keyword(Keyword::Else) {
            let else_start = self.stream.previous_span().start();
            let else_node = self.ast.alloc(NodeKind::ElseBlock, SourceSpan::dummy());
            self.consume_semicolons();
            let else_block = self.parse_block(&[Keyword::EndIf]);
            self.ast.attach(else_node, else_block);
            let else_span = self.finish_span(else_start);
            self.ast.set_span(else_node, else_span);
            self.ast.attach(node, else_node);
        }

        self.expect_block_end(Keyword::If, Keyword::EndIf);
        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    /// `Evaluate expr When ... When-Other ... End-Evaluate;`
    fn parse_evaluate(&mut self) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let node = self
            .ast
            .alloc(NodeKind::EvaluateStatement, SourceSpan::dummy());
        let subject = self.parse_expression();
        self.ast.attach(node, subject);
        self.consume_semicolons();

        while !self.stream.is_at_end() {
            if self.stream.match_keyword(Keyword::When) {
                let clause_start = self.stream.previous_span().start();
                let clause = self.ast.alloc(NodeKind::WhenClause, SourceSpan::dummy());

                // `When = expr` carries an explicit comparison operator
                if self.stream.current().kind.is_comparison() {
                    let op = self.stream.advance().text;
                    let operand = self.parse_expression();
                    let span = self.ast.span(operand);
                    let wrapped = self.ast.alloc(NodeKind::UnaryExpression { op }, span);
                    self.ast.attach(wrapped, operand);
                    self.ast.attach(clause, wrapped);
                } else {
                    let operand = self.parse_expression();
                    self.ast.attach(clause, operand);
                }
                self.consume_semicolons();

                let body = self.parse_block(&[
                    Keyword::When,
                    Keyword::WhenOther,
                    Keyword::EndEvaluate,
                ]);
                self.ast.attach(clause, body);
                let clause_span = self.finish_span(clause_start);
                self.ast.set_span(clause, clause_span);
                self.ast.attach(node, clause);
            } else if self.stream.match_keyword(Keyword::WhenOther) {
                let clause_start = self.stream.previous_span().start();
                let clause = self
                    .ast
                    .alloc(NodeKind::WhenOtherClause, SourceSpan::dummy());
                self.consume_semicolons();
                let body = self.parse_block(&[Keyword::When, Keyword::EndEvaluate]);
                self.ast.attach(clause, body);
                let clause_span = self.finish_span(clause_start);
                self.ast.set_span(clause, clause_span);
                self.ast.attach(node, clause);
            } else {
                break;
            }
        }

        self.expect_block_end(Keyword::Evaluate, Keyword::EndEvaluate);
        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    /// `For &i = from To to [Step step]; ... End-For;`
    fn parse_for(&mut self) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let variable = if self.stream.current().kind == TokenKind::UserVariable {
            self.stream.advance().text
        } else {
            self.report(SyntaxError::MissingToken {
                expected: "loop variable after 'For'".to_string(),
                position: self.stream.current_span().start(),
            });
            String::new()
        };

        let node = self
            .ast
            .alloc(NodeKind::ForStatement { variable }, SourceSpan::dummy());

        self.expect_kind(TokenKind::Equal, "'=' in For statement");
        let from = self.parse_expression();
        self.ast.attach(node, from);

        self.expect_keyword(Keyword::To);
        let to = self.parse_expression();
        self.ast.attach(node, to);

        if self.stream.match_keyword(Keyword::Step) {
            let step = self.parse_expression();
            self.ast.attach(node, step);
        }
        self.consume_semicolons();

        let body = self.parse_block(&[Keyword::EndFor]);
        self.ast.attach(node, body);
        self.expect_block_end(Keyword::For, Keyword::EndFor);

        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    fn parse_while(&mut self) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let node = self
            .ast
            .alloc(NodeKind::WhileStatement, SourceSpan::dummy());
        let condition = self.parse_expression();
        self.ast.attach(node, condition);
        self.consume_semicolons();

        let body = self.parse_block(&[Keyword::EndWhile]);
        self.ast.attach(node, body);
        self.expect_block_end(Keyword::While, Keyword::EndWhile);

        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    /// `Repeat ... Until cond;`
    fn parse_repeat(&mut self) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();
        self.consume_semicolons();

        let node = self
            .ast
            .alloc(NodeKind::RepeatStatement, SourceSpan::dummy());
        let body = self.parse_block(&[Keyword::Until]);
        self.ast.attach(node, body);

        if self.stream.match_keyword(Keyword::Until) {
            let condition = self.parse_expression();
            self.ast.attach(node, condition);
        } else {
            self.report(SyntaxError::UnmatchedBlockDelimiter {
                opener: Keyword::Repeat.to_string(),
                closer: Keyword::Until.to_string(),
                position: self.stream.current_span().start(),
            });
        }

        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    /// `try ... catch Exception &e ... end-try;`
    fn parse_try(&mut self) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();
        self.consume_semicolons();

        let node = self.ast.alloc(NodeKind::TryStatement, SourceSpan::dummy());
        let body = self.parse_block(&[Keyword::Catch, Keyword::EndTry]);
        self.ast.attach(node, body);

        while self.stream.match_keyword(Keyword::Catch) {
            let clause_start = self.stream.previous_span().start();
            let clause = self.ast.alloc(NodeKind::CatchClause, SourceSpan::dummy());

            let exception_type = self.parse_type_name();
            self.ast.attach(clause, exception_type);
            if self.stream.current().kind == TokenKind::UserVariable {
                let token = self.stream.advance();
                let variable = self.ast.alloc(
                    NodeKind::IdentifierExpression { name: token.text },
                    token.span,
                );
                self.ast.attach(clause, variable);
            }
            self.consume_semicolons();

            let handler = self.parse_block(&[Keyword::Catch, Keyword::EndTry]);
            self.ast.attach(clause, handler);
            let clause_span = self.finish_span(clause_start);
            self.ast.set_span(clause, clause_span);
            self.ast.attach(node, clause);
        }

        self.expect_block_end(Keyword::Try, Keyword::EndTry);
        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    /// `Local Type &a [, &b] [= expr];`
    fn parse_variable_declaration(&mut self, scope: VarScope) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let node = self.ast.alloc(
            NodeKind::VariableDeclaration { scope },
            SourceSpan::dummy(),
        );
        let type_name = self.parse_type_name();
        self.ast.attach(node, type_name);

        loop {
            if self.stream.current().kind == TokenKind::UserVariable {
                let token = self.stream.advance();
                let variable = self.ast.alloc(
                    NodeKind::IdentifierExpression { name: token.text },
                    token.span,
                );
                self.ast.attach(node, variable);
            } else {
                self.report(SyntaxError::MissingToken {
                    expected: "variable name".to_string(),
                    position: self.stream.current_span().start(),
                });
                break;
            }
            if !self.stream.match_kind(TokenKind::Comma) {
                break;
            }
        }

        if self.stream.match_kind(TokenKind::Equal) {
            let initializer = self.parse_expression();
            self.ast.attach(node, initializer);
        }

        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

    /// Assignment or expression statement. The target is parsed above
    /// comparison precedence so `=` reads as assignment here.
    fn parse_expression_statement(&mut self) -> NodeId {
        if !self.starts_expression() {
            let found = self.stream.current().kind.describe();
            let position = self.stream.current_span().start();
            return self.error_statement(
                SyntaxError::UnexpectedToken {
                    found,
                    expected: "a statement".to_string(),
                    position,
                },
                SyncContext::Statement,
            );
        }

        let start = self.stream.current_span().start();
        let target = self.parse_binary(5);

        if self.stream.match_kind(TokenKind::Equal) {
            let node = self
                .ast
                .alloc(NodeKind::AssignmentStatement, SourceSpan::dummy());
            self.ast.attach(node, target);
            let value = self.parse_expression();
            self.ast.attach(node, value);
            let span = self.finish_span(start);
            self.ast.set_span(node, span);
            node
        } else {
            let span = self.finish_span(start);
            let node = self.ast.alloc(NodeKind::ExpressionStatement, span);
            self.ast.attach(node, target);
            node
        }
    }

    // === EXPRESSIONS ===

    fn parse_expression(&mut self) -> NodeId {
        self.parse_binary(1)
    }

    /// Precedence climbing over the token-kind precedence table.
    /// Exponentiation is the single right-associative level.
    fn parse_binary(&mut self, min_precedence: u8) -> NodeId {
        if !self.enter() {
            let placeholder = self.error_expression(SyntaxError::MaxDepthExceeded {
                depth: self.depth,
                position: self.stream.current_span().start(),
            });
            self.leave();
            return placeholder;
        }

        let mut left = self.parse_prefix();

        while let Some((precedence, assoc)) = self.stream.current().kind.binary_precedence() {
            if precedence < min_precedence {
                break;
            }
            let op = self.stream.advance().text;
            let next_min = match assoc {
                crate::tokens::Assoc::Left => precedence + 1,
                crate::tokens::Assoc::Right => precedence,
            };
            let right = self.parse_binary(next_min);
            let span = self.ast.span(left).merge(self.ast.span(right));
            let node = self.ast.alloc(NodeKind::BinaryExpression { op }, span);
            self.ast.attach(node, left);
            self.ast.attach(node, right);
            left = node;
        }

        self.leave();
        left
    }

    /// Prefix chains recurse, so they carry the same depth guard as
    /// statements and binary expressions.
    fn parse_prefix(&mut self) -> NodeId {
        if !self.enter() {
            let placeholder = self.error_expression(SyntaxError::MaxDepthExceeded {
                depth: self.depth,
                position: self.stream.current_span().start(),
            });
            self.leave();
            return placeholder;
        }
        let node = self.parse_prefix_inner();
        self.leave();
        node
    }

    fn parse_prefix_inner(&mut self) -> NodeId {
        let token = self.stream.current();
        match token.kind {
            // Not binds between And and the comparisons
            TokenKind::Keyword(Keyword::Not) => {
                let start = self.stream.current_span().start();
                let op = self.stream.advance().text;
                let operand = self.parse_binary(4);
                let span = self.finish_span(start);
                let node = self.ast.alloc(NodeKind::UnaryExpression { op }, span);
                self.ast.attach(node, operand);
                node
            }
            TokenKind::Minus => {
                let start = self.stream.current_span().start();
                let op = self.stream.advance().text;
                let operand = self.parse_prefix();
                let span = self.finish_span(start);
                let node = self.ast.alloc(NodeKind::UnaryExpression { op }, span);
                self.ast.attach(node, operand);
                node
            }
            TokenKind::At => {
                let start = self.stream.current_span().start();
                self.stream.advance();
                let operand = self.parse_prefix();
                let span = self.finish_span(start);
                let node = self.ast.alloc(NodeKind::AtExpression, span);
                self.ast.attach(node, operand);
                node
            }
            _ => self.parse_postfix(),
        }
    }

    /// Primary expression plus call, index, member access, and cast chains
    fn parse_postfix(&mut self) -> NodeId {
        let start = self.stream.current_span().start();
        let mut node = self.parse_primary();

        loop {
            match self.stream.current().kind {
                TokenKind::LeftParen => {
                    self.stream.advance();
                    let call = self.ast.alloc(NodeKind::CallExpression, SourceSpan::dummy());
                    self.ast.attach(call, node);
                    if !self.stream.match_kind(TokenKind::RightParen) {
                        loop {
                            let argument = self.parse_expression();
                            self.ast.attach(call, argument);
                            if !self.stream.match_kind(TokenKind::Comma) {
                                break;
                            }
                        }
                        self.expect_kind(TokenKind::RightParen, "')' after arguments");
                    }
                    let span = self.finish_span(start);
                    self.ast.set_span(call, span);
                    node = call;
                }
                TokenKind::LeftBracket => {
                    self.stream.advance();
                    let index = self.ast.alloc(NodeKind::IndexExpression, SourceSpan::dummy());
                    self.ast.attach(index, node);
                    loop {
                        let subscript = self.parse_expression();
                        self.ast.attach(index, subscript);
                        if !self.stream.match_kind(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect_kind(TokenKind::RightBracket, "']' after subscript");
                    let span = self.finish_span(start);
                    self.ast.set_span(index, span);
                    node = index;
                }
                TokenKind::Dot => {
                    self.stream.advance();
                    let member = self.member_name();
                    let access = self.ast.alloc(
                        NodeKind::MemberAccessExpression { member },
                        SourceSpan::dummy(),
                    );
                    self.ast.attach(access, node);
                    let span = self.finish_span(start);
                    self.ast.set_span(access, span);
                    node = access;
                }
                TokenKind::Keyword(Keyword::As) => {
                    self.stream.advance();
                    let cast = self.ast.alloc(NodeKind::CastExpression, SourceSpan::dummy());
                    self.ast.attach(cast, node);
                    let type_name = self.parse_type_name();
                    self.ast.attach(cast, type_name);
                    let span = self.finish_span(start);
                    self.ast.set_span(cast, span);
                    node = cast;
                }
                _ => break,
            }
        }

        node
    }

    /// Member names admit keywords: `rowset.Value`, `record.Name`
    fn member_name(&mut self) -> String {
        let token = self.stream.current();
        match token.kind {
            TokenKind::GenericId | TokenKind::Keyword(_) => self.stream.advance().text,
            _ => {
                self.report(SyntaxError::MissingToken {
                    expected: "member name after '.'".to_string(),
                    position: self.stream.current_span().start(),
                });
                String::new()
            }
        }
    }

    fn parse_primary(&mut self) -> NodeId {
        let token = self.stream.current().clone();
        match token.kind {
            TokenKind::Number | TokenKind::String => {
                let token = self.stream.advance();
                let value = token
                    .value
                    .clone()
                    .unwrap_or(LiteralValue::String(token.text));
                self.ast
                    .alloc(NodeKind::LiteralExpression { value }, token.span)
            }
            TokenKind::Keyword(kw) if kw.is_literal() => {
                let token = self.stream.advance();
                let value = token.value.clone().unwrap_or(LiteralValue::Null);
                self.ast
                    .alloc(NodeKind::LiteralExpression { value }, token.span)
            }
            TokenKind::GenericId
            | TokenKind::UserVariable
            | TokenKind::SystemVariable
            | TokenKind::SystemConstant => {
                let token = self.stream.advance();
                self.ast.alloc(
                    NodeKind::IdentifierExpression { name: token.text },
                    token.span,
                )
            }
            TokenKind::Keyword(Keyword::Create) => self.parse_create(),
            TokenKind::LeftParen => {
                self.stream.advance();
                let inner = self.parse_expression();
                self.expect_kind(TokenKind::RightParen, "')'");
                inner
            }
            other => self.error_expression(SyntaxError::InvalidExpression {
                found: other.describe(),
                position: token.span.start(),
            }),
        }
    }

    /// `create PKG:Class(args)`; the argument list is optional
    fn parse_create(&mut self) -> NodeId {
        let start = self.stream.current_span().start();
        self.stream.advance();

        let mut class_name = String::new();
        if self.stream.current().kind == TokenKind::GenericId {
            class_name.push_str(&self.stream.advance().text);
            while self.stream.match_kind(TokenKind::Colon) {
                class_name.push(':');
                match self.identifier_text("name after ':'") {
                    Some(part) => class_name.push_str(&part),
                    None => break,
                }
            }
        } else {
            self.report(SyntaxError::MissingToken {
                expected: "class name after 'create'".to_string(),
                position: self.stream.current_span().start(),
            });
        }

        let node = self.ast.alloc(
            NodeKind::CreateExpression { class_name },
            SourceSpan::dummy(),
        );

        if self.stream.match_kind(TokenKind::LeftParen) {
            if !self.stream.match_kind(TokenKind::RightParen) {
                loop {
                    let argument = self.parse_expression();
                    self.ast.attach(node, argument);
                    if !self.stream.match_kind(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect_kind(TokenKind::RightParen, "')' after arguments");
            }
        }

        let span = self.finish_span(start);
        self.ast.set_span(node, span);
        node
    }

}

/// Parse a preprocessed token stream into a syntax tree
pub fn parse(tokens: Vec<Token>) -> ParseResult {
    Parser::new(tokens).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::LexicalAnalyzer;
    use assert_matches::assert_matches;

    fn parse_source(source: &str) -> ParseResult {
        parse(LexicalAnalyzer::new(source).tokenize().tokens)
    }

    fn kinds_of_children(result: &ParseResult, node: NodeId) -> Vec<NodeKind> {
        result
            .ast
            .children(node)
            .iter()
            .map(|&c| result.ast.kind(c).clone())
            .collect()
    }

    #[test]
    fn test_empty_source_yields_program() {
        let result = parse_source("");
        assert_matches!(result.ast.kind(result.program), NodeKind::Program);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_garbage_yields_program_with_placeholders() {
        let result = parse_source(")))) ];; then");
        assert!(matches!(result.ast.kind(result.program), NodeKind::Program));
        assert!(!result.diagnostics.is_empty());
        let placeholders = result
            .ast
            .descendants_matching(result.program, |n| n.kind.is_error_placeholder());
        assert!(!placeholders.is_empty());
    }

    #[test]
    fn test_assignment_statement() {
        let result = parse_source("&total = &price * 3 + 1;");
        assert!(result.diagnostics.is_empty());
        let children = kinds_of_children(&result, result.program);
        assert_eq!(children, vec![NodeKind::AssignmentStatement]);

        let assignment = result.ast.children(result.program)[0];
        let parts = kinds_of_children(&result, assignment);
        assert!(matches!(parts[0], NodeKind::IdentifierExpression { .. }));
        // Top of the value tree is the +, * bound tighter below it
        assert!(matches!(&parts[1], NodeKind::BinaryExpression { op } if op == "+"));
    }

    #[test]
    fn test_exponent_is_right_associative() {
        let result = parse_source("&x = 2 ** 3 ** 2;");
        let assignment = result.ast.children(result.program)[0];
        let value = result.ast.children(assignment)[1];
        // Right-assoc: 2 ** (3 ** 2), so the right child is itself a **
        let right = result.ast.children(value)[1];
        assert!(matches!(
            result.ast.kind(right),
            NodeKind::BinaryExpression { op } if op == "**"
        ));
    }

    #[test]
    fn test_not_binds_over_comparison() {
        let result = parse_source("If Not &a = 1 Then Break; End-If;");
        assert!(result.diagnostics.is_empty());
        let if_node = result.ast.children(result.program)[0];
        let condition = result.ast.children(if_node)[0];
        // Not (a = 1)
        assert!(matches!(
            result.ast.kind(condition),
            NodeKind::UnaryExpression { op } if op == "Not"
        ));
        let inner = result.ast.children(condition)[0];
        assert!(matches!(
            result.ast.kind(inner),
            NodeKind::BinaryExpression { op } if op == "="
        ));
    }

    #[test]
    fn test_if_else_structure() {
        let result = parse_source(
            "If &a > 1 Then &b = 1; Else &b = 2; End-If;",
        );
        assert!(result.diagnostics.is_empty());
        let if_node = result.ast.children(result.program)[0];
        let children = kinds_of_children(&result, if_node);
        assert!(matches!(children[0], NodeKind::BinaryExpression { .. }));
        assert_eq!(children[1], NodeKind::Block);
        assert_eq!(children[2], NodeKind::ElseBlock);
    }

    #[test]
    fn test_method_call_chain() {
        let result = parse_source("&rs.GetRow(1).GetRecord(Record.PO_HDR).SetDefault();");
        assert!(result.diagnostics.is_empty());
        let stmt = result.ast.children(result.program)[0];
        assert_eq!(*result.ast.kind(stmt), NodeKind::ExpressionStatement);
        let call = result.ast.children(stmt)[0];
        assert_eq!(*result.ast.kind(call), NodeKind::CallExpression);
    }

    #[test]
    fn test_class_declaration() {
        let source = "\
class Fruit extends BaseObject
   method Fruit(&name As string);
   property number Count get set;
private
   instance string &name;
   constant &MAX = 10;
end-class;";
        let result = parse_source(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

        let class = result.ast.children(result.program)[0];
        assert_matches!(
            result.ast.kind(class),
            NodeKind::ClassDeclaration { name } if name == "Fruit"
        );

        let members = kinds_of_children(&result, class);
        assert!(matches!(members[0], NodeKind::TypeName { .. }));
        assert!(matches!(
            members[1],
            NodeKind::MethodHeader { visibility: Visibility::Public, .. }
        ));
        assert!(matches!(members[2], NodeKind::PropertyDeclaration { .. }));
        assert!(matches!(members[3], NodeKind::InstanceDeclaration));
        assert!(matches!(members[4], NodeKind::ConstantDeclaration { .. }));

        // Instance landed in the private section; check via the header
        if let NodeKind::MethodHeader { name, .. } = &members[1] {
            assert_eq!(name, "Fruit");
        }
    }

    #[test]
    fn test_method_implementation_block() {
        let source = "\
method Fruit
   %This.Count = 0;
end-method;";
        let result = parse_source(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let method = result.ast.children(result.program)[0];
        assert_matches!(
            result.ast.kind(method),
            NodeKind::MethodImplementation { name } if name == "Fruit"
        );
    }

    #[test]
    fn test_evaluate_statement() {
        let source = "\
Evaluate &status
When = \"O\"
   &label = \"Open\";
When = \"C\"
   &label = \"Closed\";
When-Other
   &label = \"Unknown\";
End-Evaluate;";
        let result = parse_source(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let evaluate = result.ast.children(result.program)[0];
        let children = kinds_of_children(&result, evaluate);
        assert_eq!(
            children
                .iter()
                .filter(|k| matches!(k, NodeKind::WhenClause))
                .count(),
            2
        );
        assert_eq!(
            children
                .iter()
                .filter(|k| matches!(k, NodeKind::WhenOtherClause))
                .count(),
            1
        );
    }

    #[test]
    fn test_loops() {
        let source = "\
For &i = 1 To 10 Step 2
   &sum = &sum + &i;
End-For;
While &sum > 0
   &sum = &sum - 1;
End-While;
Repeat
   &n = &n + 1;
Until &n >= 5;";
        let result = parse_source(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let kinds = kinds_of_children(&result, result.program);
        assert!(matches!(kinds[0], NodeKind::ForStatement { ref variable } if variable == "&i"));
        assert_eq!(kinds[1], NodeKind::WhileStatement);
        assert_eq!(kinds[2], NodeKind::RepeatStatement);
    }

    #[test]
    fn test_try_catch() {
        let source = "\
try
   &result = DoWork();
catch Exception &ex
   Warning &ex.ToString();
end-try;";
        let result = parse_source(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let try_node = result.ast.children(result.program)[0];
        let children = kinds_of_children(&result, try_node);
        assert_eq!(children[0], NodeKind::Block);
        assert_eq!(children[1], NodeKind::CatchClause);
    }

    #[test]
    fn test_variable_declarations() {
        let source = "Local array of string &names;\nGlobal number &counter = 0;";
        let result = parse_source(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let kinds = kinds_of_children(&result, result.program);
        assert!(matches!(
            kinds[0],
            NodeKind::VariableDeclaration { scope: VarScope::Local }
        ));
        assert!(matches!(
            kinds[1],
            NodeKind::VariableDeclaration { scope: VarScope::Global }
        ));

        let local = result.ast.children(result.program)[0];
        let type_name = result.ast.children(local)[0];
        assert!(matches!(
            result.ast.kind(type_name),
            NodeKind::TypeName { text } if text == "array of string"
        ));
    }

    #[test]
    fn test_function_definition_and_declare() {
        let source = "\
Declare Function get_total PeopleCode PO_LINE.MERCHANDISE_AMT FieldFormula;
Function update_total(&amount As number) Returns number
   Return &amount * 2;
End-Function;";
        let result = parse_source(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let kinds = kinds_of_children(&result, result.program);
        assert!(matches!(kinds[0], NodeKind::FunctionDeclaration { .. }));
        assert!(matches!(kinds[1], NodeKind::FunctionDefinition { .. }));
    }

    #[test]
    fn test_import_paths() {
        let result = parse_source("import PKG:Utils:Formatter;\nimport PKG:*;");
        assert!(result.diagnostics.is_empty());
        let kinds = kinds_of_children(&result, result.program);
        assert!(matches!(&kinds[0], NodeKind::Import { path } if path == "PKG:Utils:Formatter"));
        assert!(matches!(&kinds[1], NodeKind::Import { path } if path == "PKG:*"));
    }

    #[test]
    fn test_error_recovery_contains_damage() {
        let source = "\
&before = 1;
&bad = * / ;
&after = 2;";
        let result = parse_source(source);
        assert!(!result.diagnostics.is_empty());

        let children = result.ast.children(result.program);
        assert_eq!(children.len(), 3);
        assert_eq!(
            *result.ast.kind(children[0]),
            NodeKind::AssignmentStatement
        );
        assert_eq!(
            *result.ast.kind(children[2]),
            NodeKind::AssignmentStatement
        );
        // Exactly one subtree carries the damage
        let placeholders = result
            .ast
            .descendants_matching(result.program, |n| n.kind.is_error_placeholder());
        assert_eq!(placeholders.len(), 1);
    }

    #[test]
    fn test_missing_end_if_reports_delimiter() {
        let result = parse_source("If &a Then &b = 1;");
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("End-If")));
        // Partial structure still present
        let if_nodes = result
            .ast
            .descendants_matching(result.program, |n| {
                matches!(n.kind, NodeKind::IfStatement)
            });
        assert_eq!(if_nodes.len(), 1);
    }

    #[test]
    fn test_node_spans_cover_consumed_tokens() {
        let source = "&x = 1 + 2;";
        let result = parse_source(source);
        let assignment = result.ast.children(result.program)[0];
        let span = result.ast.span(assignment);
        assert_eq!(span.start().index, 0);
        // The terminating semicolon belongs to the statement list, not the node
        assert_eq!(&source[span.start().byte_index..span.end().byte_index], "&x = 1 + 2");
    }

    #[test]
    fn test_create_expression() {
        let result = parse_source("&obj = create PKG:Fruit(\"kiwi\", 2);");
        assert!(result.diagnostics.is_empty());
        let assignment = result.ast.children(result.program)[0];
        let value = result.ast.children(assignment)[1];
        assert!(matches!(
            result.ast.kind(value),
            NodeKind::CreateExpression { class_name } if class_name == "PKG:Fruit"
        ));
        assert_eq!(result.ast.children(value).len(), 2);
    }

    #[test]
    fn test_deep_nesting_degrades_gracefully() {
        let mut source = String::from("&x = ");
        for _ in 0..300 {
            source.push('(');
        }
        source.push('1');
        for _ in 0..300 {
            source.push(')');
        }
        source.push(';');

        let result = parse_source(&source);
        assert!(matches!(result.ast.kind(result.program), NodeKind::Program));
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("maximum parse depth")));
    }

    #[test]
    fn test_long_prefix_chain_degrades_gracefully() {
        let mut source = String::from("&x = ");
        source.push_str(&"-".repeat(200_000));
        source.push_str("1;");

        let result = parse_source(&source);
        assert!(matches!(result.ast.kind(result.program), NodeKind::Program));
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.message.contains("maximum parse depth")));
        assert_eq!(
            *result.ast.kind(result.ast.children(result.program)[0]),
            NodeKind::AssignmentStatement
        );
    }
}
