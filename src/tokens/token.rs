//! Token model for the PeopleCode front end
//!
//! A token owns its raw text, an optional parsed literal value, its span and
//! two side lists of attached trivia. Trivia never enters the grammar but
//! stays reachable from the adjacent real tokens so layout-sensitive
//! consumers can reconstruct the source without re-lexing.
use crate::grammar::keywords::Keyword;
use crate::utils::SourceSpan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four comment styles of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommentStyle {
    /// `/* ... */`
    Block,
    /// `<* ... *>`, nests
    Nested,
    /// `/+ ... +/`, API documentation
    Api,
    /// `rem ...;`
    Rem,
}

/// Token classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Reserved word (includes the literal keywords True/False/Null)
    Keyword(Keyword),

    // === OPERATORS ===
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Exponent,     // **
    Pipe,         // | (string concatenation)
    Equal,        // = (comparison and assignment)
    NotEqual,     // <>
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=
    At,           // @ (dynamic reference)
    AmpAmp,       // && (directive conditions only)
    PipePipe,     // || (directive conditions only)

    // === PUNCTUATION ===
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Dot,
    Colon,

    // === LITERALS ===
    Number,
    String,

    // === IDENTIFIERS ===
    /// Bare name: record fields, functions, classes
    GenericId,
    /// `&name` user variable
    UserVariable,
    /// `%name` system variable
    SystemVariable,
    /// `%name` system constant (known constant set)
    SystemConstant,

    // === TRIVIA ===
    Comment(CommentStyle),
    Whitespace,

    // === COMPILER DIRECTIVES ===
    DirectiveIf,       // #If
    DirectiveThen,     // #Then
    DirectiveElse,     // #Else
    DirectiveEnd,      // #End-If
    DirectiveToolsRel, // #ToolsRel
    /// Any other `#word`
    DirectiveAtom,

    /// Unrecognized character; never fatal, the parser recovers around it
    Invalid,
    /// End-of-file sentinel
    Eof,
}

/// Associativity of a binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Assoc {
    Left,
    Right,
}

impl TokenKind {
    pub fn is_keyword(&self) -> bool {
        matches!(self, Self::Keyword(_))
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            Self::Plus
                | Self::Minus
                | Self::Star
                | Self::Slash
                | Self::Exponent
                | Self::Pipe
                | Self::Equal
                | Self::NotEqual
                | Self::Less
                | Self::LessEqual
                | Self::Greater
                | Self::GreaterEqual
                | Self::At
                | Self::AmpAmp
                | Self::PipePipe
        ) || matches!(
            self,
            Self::Keyword(Keyword::And) | Self::Keyword(Keyword::Or) | Self::Keyword(Keyword::Not)
        )
    }

    /// Literal tokens: numbers, strings, and the keyword literals
    pub fn is_literal(&self) -> bool {
        match self {
            Self::Number | Self::String => true,
            Self::Keyword(kw) => kw.is_literal(),
            _ => false,
        }
    }

    /// Any of the four identifier families
    pub fn is_identifier(&self) -> bool {
        matches!(
            self,
            Self::GenericId | Self::UserVariable | Self::SystemVariable | Self::SystemConstant
        )
    }

    /// Whitespace and comments
    pub fn is_trivia(&self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment(_))
    }

    pub fn is_directive(&self) -> bool {
        matches!(
            self,
            Self::DirectiveIf
                | Self::DirectiveThen
                | Self::DirectiveElse
                | Self::DirectiveEnd
                | Self::DirectiveToolsRel
                | Self::DirectiveAtom
        )
    }

    /// Comparison operators shared with the directive sublanguage
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::Less
                | Self::LessEqual
                | Self::Greater
                | Self::GreaterEqual
        )
    }

    /// Binding power and associativity for binary operators.
    ///
    /// Higher binds tighter. Exponentiation is the grammar's single
    /// right-associative operator; everything else associates left.
    pub fn binary_precedence(&self) -> Option<(u8, Assoc)> {
        match self {
            Self::Keyword(Keyword::Or) => Some((1, Assoc::Left)),
            Self::Keyword(Keyword::And) => Some((2, Assoc::Left)),
            Self::Equal
            | Self::NotEqual
            | Self::Less
            | Self::LessEqual
            | Self::Greater
            | Self::GreaterEqual => Some((4, Assoc::Left)),
            Self::Pipe => Some((5, Assoc::Left)),
            Self::Plus | Self::Minus => Some((6, Assoc::Left)),
            Self::Star | Self::Slash => Some((7, Assoc::Left)),
            Self::Exponent => Some((8, Assoc::Right)),
            _ => None,
        }
    }

    /// Human-readable description for diagnostics
    pub fn describe(&self) -> String {
        match self {
            Self::Keyword(kw) => format!("'{}'", kw.as_str()),
            Self::Plus => "'+'".to_string(),
            Self::Minus => "'-'".to_string(),
            Self::Star => "'*'".to_string(),
            Self::Slash => "'/'".to_string(),
            Self::Exponent => "'**'".to_string(),
            Self::Pipe => "'|'".to_string(),
            Self::Equal => "'='".to_string(),
            Self::NotEqual => "'<>'".to_string(),
            Self::Less => "'<'".to_string(),
            Self::LessEqual => "'<='".to_string(),
            Self::Greater => "'>'".to_string(),
            Self::GreaterEqual => "'>='".to_string(),
            Self::At => "'@'".to_string(),
            Self::AmpAmp => "'&&'".to_string(),
            Self::PipePipe => "'||'".to_string(),
            Self::LeftParen => "'('".to_string(),
            Self::RightParen => "')'".to_string(),
            Self::LeftBracket => "'['".to_string(),
            Self::RightBracket => "']'".to_string(),
            Self::Comma => "','".to_string(),
            Self::Semicolon => "';'".to_string(),
            Self::Dot => "'.'".to_string(),
            Self::Colon => "':'".to_string(),
            Self::Number => "number literal".to_string(),
            Self::String => "string literal".to_string(),
            Self::GenericId => "identifier".to_string(),
            Self::UserVariable => "user variable".to_string(),
            Self::SystemVariable => "system variable".to_string(),
            Self::SystemConstant => "system constant".to_string(),
            Self::Comment(_) => "comment".to_string(),
            Self::Whitespace => "whitespace".to_string(),
            Self::DirectiveIf => "'#If'".to_string(),
            Self::DirectiveThen => "'#Then'".to_string(),
            Self::DirectiveElse => "'#Else'".to_string(),
            Self::DirectiveEnd => "'#End-If'".to_string(),
            Self::DirectiveToolsRel => "'#ToolsRel'".to_string(),
            Self::DirectiveAtom => "directive".to_string(),
            Self::Invalid => "invalid character".to_string(),
            Self::Eof => "end of file".to_string(),
        }
    }
}

/// Parsed value of a literal token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiteralValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{}", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Null => write!(f, "Null"),
        }
    }
}

/// A lexed token with its raw text, optional parsed value, span and trivia
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Parsed value for literals; `None` for everything else
    pub value: Option<LiteralValue>,
    pub span: SourceSpan,
    /// Trivia preceding this token (after the previous token's trailing run)
    pub leading_trivia: Vec<Token>,
    /// Trivia following this token up to and including the next line break
    pub trailing_trivia: Vec<Token>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            kind,
            text: text.into(),
            value: None,
            span,
            leading_trivia: Vec::new(),
            trailing_trivia: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: LiteralValue) -> Self {
        self.value = Some(value);
        self
    }

    /// The token's value as text: the parsed literal when present,
    /// otherwise the raw text.
    pub fn value_text(&self) -> String {
        match &self.value {
            Some(value) => value.to_string(),
            None => self.text.clone(),
        }
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    pub fn as_keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(kw) => Some(kw),
            _ => None,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// System variables recognized structurally after the `%` sigil.
/// Unknown `%` names also classify as system variables; only names in the
/// constant set below become system constants.
pub const SYSTEM_VARIABLES: &[&str] = &[
    "this",
    "super",
    "session",
    "request",
    "response",
    "userid",
    "operatorid",
    "employeeid",
    "date",
    "time",
    "datetime",
    "currentdatein",
    "currenttimein",
    "currentdatetimein",
    "language",
    "market",
    "component",
    "page",
    "menu",
    "mode",
    "panel",
    "portal",
    "node",
    "dbname",
    "dbtype",
    "sqlrows",
    "resultdocument",
];

/// System constants recognized structurally after the `%` sigil
pub const SYSTEM_CONSTANTS: &[&str] = &[
    "charset_utf8",
    "delete",
    "insert",
    "update",
    "selectall",
    "selectnew",
    "sqltypes_char",
    "sqltypes_long",
    "sqltypes_number",
    "sqltypes_date",
    "sqltypes_time",
    "sqltypes_datetime",
    "filepath_absolute",
    "filepath_relative",
    "maxinterlinksize",
    "psoftobjectid",
];

/// Classify a `%`-prefixed name into one of the two system families
pub fn classify_percent_name(name: &str) -> TokenKind {
    let lowered = name.to_ascii_lowercase();
    if SYSTEM_CONSTANTS.contains(&lowered.as_str()) {
        TokenKind::SystemConstant
    } else {
        TokenKind::SystemVariable
    }
}
