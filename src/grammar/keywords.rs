//! PeopleCode keyword catalog
//!
//! Keywords are matched case-insensitively: `IF`, `if` and `If` are the same
//! token. Hyphenated keywords (`End-If`, `When-Other`, ...) are assembled by
//! the lexer from their word parts before lookup here.
use serde::{Deserialize, Serialize};

/// Reserved words of the PeopleCode grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    // === CONTROL FLOW ===
    If,
    Then,
    Else,
    EndIf,
    Evaluate,
    When,
    WhenOther,
    EndEvaluate,
    For,
    To,
    Step,
    EndFor,
    While,
    EndWhile,
    Repeat,
    Until,
    Break,
    Continue,
    Exit,
    Return,
    Error,
    Warning,
    Throw,
    Try,
    Catch,
    EndTry,

    // === DECLARATIONS ===
    Local,
    Global,
    Component,
    Constant,
    Instance,
    Declare,
    Function,
    EndFunction,
    PeopleCode,
    Returns,
    Ref,
    Out,
    Doc,
    Library,
    Alias,
    Import,

    // === OBJECT MODEL ===
    Class,
    EndClass,
    Interface,
    EndInterface,
    Extends,
    Implements,
    Method,
    EndMethod,
    Property,
    Get,
    EndGet,
    Set,
    EndSet,
    ReadOnly,
    Abstract,
    Private,
    Protected,
    Create,

    // === WORD OPERATORS ===
    And,
    Or,
    Not,

    // === MISC ===
    As,
    Value,
    Of,

    // === KEYWORD LITERALS ===
    True,
    False,
    Null,
}

impl Keyword {
    /// Canonical source spelling
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::If => "If",
            Self::Then => "Then",
            Self::Else => "Else",
            Self::EndIf => "End-If",
            Self::Evaluate => "Evaluate",
            Self::When => "When",
            Self::WhenOther => "When-Other",
            Self::EndEvaluate => "End-Evaluate",
            Self::For => "For",
            Self::To => "To",
            Self::Step => "Step",
            Self::EndFor => "End-For",
            Self::While => "While",
            Self::EndWhile => "End-While",
            Self::Repeat => "Repeat",
            Self::Until => "Until",
            Self::Break => "Break",
            Self::Continue => "Continue",
            Self::Exit => "Exit",
            Self::Return => "Return",
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Throw => "Throw",
            Self::Try => "Try",
            Self::Catch => "Catch",
            Self::EndTry => "End-Try",
            Self::Local => "Local",
            Self::Global => "Global",
            Self::Component => "Component",
            Self::Constant => "Constant",
            Self::Instance => "Instance",
            Self::Declare => "Declare",
            Self::Function => "Function",
            Self::EndFunction => "End-Function",
            Self::PeopleCode => "PeopleCode",
            Self::Returns => "Returns",
            Self::Ref => "Ref",
            Self::Out => "Out",
            Self::Doc => "Doc",
            Self::Library => "Library",
            Self::Alias => "Alias",
            Self::Import => "Import",
            Self::Class => "Class",
            Self::EndClass => "End-Class",
            Self::Interface => "Interface",
            Self::EndInterface => "End-Interface",
            Self::Extends => "Extends",
            Self::Implements => "Implements",
            Self::Method => "Method",
            Self::EndMethod => "End-Method",
            Self::Property => "Property",
            Self::Get => "Get",
            Self::EndGet => "End-Get",
            Self::Set => "Set",
            Self::EndSet => "End-Set",
            Self::ReadOnly => "ReadOnly",
            Self::Abstract => "Abstract",
            Self::Private => "Private",
            Self::Protected => "Protected",
            Self::Create => "Create",
            Self::And => "And",
            Self::Or => "Or",
            Self::Not => "Not",
            Self::As => "As",
            Self::Value => "Value",
            Self::Of => "Of",
            Self::True => "True",
            Self::False => "False",
            Self::Null => "Null",
        }
    }

    /// Case-insensitive keyword lookup
    pub fn lookup(word: &str) -> Option<Self> {
        let lowered = word.to_ascii_lowercase();
        match lowered.as_str() {
            "if" => Some(Self::If),
            "then" => Some(Self::Then),
            "else" => Some(Self::Else),
            "end-if" => Some(Self::EndIf),
            "evaluate" => Some(Self::Evaluate),
            "when" => Some(Self::When),
            "when-other" => Some(Self::WhenOther),
            "end-evaluate" => Some(Self::EndEvaluate),
            "for" => Some(Self::For),
            "to" => Some(Self::To),
            "step" => Some(Self::Step),
            "end-for" => Some(Self::EndFor),
            "while" => Some(Self::While),
            "end-while" => Some(Self::EndWhile),
            "repeat" => Some(Self::Repeat),
            "until" => Some(Self::Until),
            "break" => Some(Self::Break),
            "continue" => Some(Self::Continue),
            "exit" => Some(Self::Exit),
            "return" => Some(Self::Return),
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            "throw" => Some(Self::Throw),
            "try" => Some(Self::Try),
            "catch" => Some(Self::Catch),
            "end-try" => Some(Self::EndTry),
            "local" => Some(Self::Local),
            "global" => Some(Self::Global),
            "component" => Some(Self::Component),
            "constant" => Some(Self::Constant),
            "instance" => Some(Self::Instance),
            "declare" => Some(Self::Declare),
            "function" => Some(Self::Function),
            "end-function" => Some(Self::EndFunction),
            "peoplecode" => Some(Self::PeopleCode),
            "returns" => Some(Self::Returns),
            "ref" => Some(Self::Ref),
            "out" => Some(Self::Out),
            "doc" => Some(Self::Doc),
            "library" => Some(Self::Library),
            "alias" => Some(Self::Alias),
            "import" => Some(Self::Import),
            "class" => Some(Self::Class),
            "end-class" => Some(Self::EndClass),
            "interface" => Some(Self::Interface),
            "end-interface" => Some(Self::EndInterface),
            "extends" => Some(Self::Extends),
            "implements" => Some(Self::Implements),
            "method" => Some(Self::Method),
            "end-method" => Some(Self::EndMethod),
            "property" => Some(Self::Property),
            "get" => Some(Self::Get),
            "end-get" => Some(Self::EndGet),
            "set" => Some(Self::Set),
            "end-set" => Some(Self::EndSet),
            "readonly" => Some(Self::ReadOnly),
            "abstract" => Some(Self::Abstract),
            "private" => Some(Self::Private),
            "protected" => Some(Self::Protected),
            "create" => Some(Self::Create),
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "not" => Some(Self::Not),
            "as" => Some(Self::As),
            "value" => Some(Self::Value),
            "of" => Some(Self::Of),
            "true" => Some(Self::True),
            "false" => Some(Self::False),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    /// Keywords whose first word may continue across a hyphen
    /// (`End-If`, `When-Other`, ...). The lexer probes these before
    /// falling back to single-word lookup.
    pub fn hyphen_head(word: &str) -> bool {
        let lowered = word.to_ascii_lowercase();
        matches!(lowered.as_str(), "end" | "when")
    }

    /// True/False/Null read as literal values, not structural keywords
    pub const fn is_literal(self) -> bool {
        matches!(self, Self::True | Self::False | Self::Null)
    }

    /// Keywords that open a block with a matching End-* terminator
    pub const fn is_block_start(self) -> bool {
        matches!(
            self,
            Self::If
                | Self::Evaluate
                | Self::For
                | Self::While
                | Self::Repeat
                | Self::Try
                | Self::Function
                | Self::Class
                | Self::Interface
                | Self::Method
                | Self::Get
                | Self::Set
        )
    }

    /// Keywords that close a block
    pub const fn is_block_end(self) -> bool {
        matches!(
            self,
            Self::EndIf
                | Self::EndEvaluate
                | Self::EndFor
                | Self::EndWhile
                | Self::Until
                | Self::EndTry
                | Self::EndFunction
                | Self::EndClass
                | Self::EndInterface
                | Self::EndMethod
                | Self::EndGet
                | Self::EndSet
        )
    }

    /// Keywords that begin a statement and are safe resynchronization points
    pub const fn starts_statement(self) -> bool {
        matches!(
            self,
            Self::If
                | Self::Evaluate
                | Self::For
                | Self::While
                | Self::Repeat
                | Self::Break
                | Self::Continue
                | Self::Exit
                | Self::Return
                | Self::Error
                | Self::Warning
                | Self::Throw
                | Self::Try
                | Self::Local
                | Self::Global
                | Self::Component
                | Self::Constant
                | Self::Instance
                | Self::Declare
                | Self::Function
                | Self::Import
                | Self::Class
                | Self::Interface
                | Self::Method
                | Self::Get
                | Self::Set
        )
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
