//! Consolidated diagnostic codes and classification metadata
//!
//! Single source of truth for every code the front end emits. Lexical codes
//! live in E0xx, directive codes in E1xx, syntax codes in E2xx, success
//! codes in I0xx.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Universal wrapper for error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Code severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a diagnostic code
#[derive(Debug, Clone)]
pub struct CodeMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub description: &'static str,
}

/// Lexical analysis codes
pub mod lexical {
    use super::Code;

    pub const INVALID_CHARACTER: Code = Code::new("E001");
    pub const UNTERMINATED_STRING: Code = Code::new("E002");
    pub const UNTERMINATED_COMMENT: Code = Code::new("E003");
    pub const INVALID_NUMBER: Code = Code::new("E004");
    pub const IDENTIFIER_TOO_LONG: Code = Code::new("E005");
    pub const STRING_TOO_LARGE: Code = Code::new("E006");
    pub const COMMENT_TOO_LONG: Code = Code::new("E007");
    pub const TOO_MANY_TOKENS: Code = Code::new("E008");
    pub const EMPTY_IDENTIFIER: Code = Code::new("E009");
}

/// Directive preprocessing codes
pub mod directive {
    use super::Code;

    pub const UNMATCHED_DIRECTIVE: Code = Code::new("E101");
    pub const UNTERMINATED_DIRECTIVE: Code = Code::new("E102");
    pub const INVALID_CONDITION: Code = Code::new("E103");
    pub const PARENTHESIZED_CONDITION: Code = Code::new("E104");
    pub const NESTING_TOO_DEEP: Code = Code::new("E105");
    pub const INVALID_TOOLS_VERSION: Code = Code::new("E106");
}

/// Syntax analysis codes
pub mod syntax {
    use super::Code;

    pub const UNEXPECTED_TOKEN: Code = Code::new("E201");
    pub const MISSING_TOKEN: Code = Code::new("E202");
    pub const UNMATCHED_BLOCK_DELIMITER: Code = Code::new("E203");
    pub const MAX_RECURSION_DEPTH: Code = Code::new("E204");
    pub const INVALID_EXPRESSION: Code = Code::new("E205");
    pub const INTERNAL_PARSER_ERROR: Code = Code::new("E206");
}

/// Success codes
pub mod success {
    use super::Code;

    pub const LEXING_COMPLETE: Code = Code::new("I001");
    pub const PREPROCESSING_COMPLETE: Code = Code::new("I002");
    pub const PARSING_COMPLETE: Code = Code::new("I003");
    pub const PIPELINE_COMPLETE: Code = Code::new("I004");
}

fn metadata_registry() -> &'static HashMap<&'static str, CodeMetadata> {
    static REGISTRY: OnceLock<HashMap<&'static str, CodeMetadata>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let entries = [
            CodeMetadata {
                code: "E001",
                category: "Lexical",
                severity: Severity::Medium,
                recoverable: true,
                description: "Character not recognized by the language",
            },
            CodeMetadata {
                code: "E002",
                category: "Lexical",
                severity: Severity::Medium,
                recoverable: true,
                description: "String literal not closed before end of file",
            },
            CodeMetadata {
                code: "E003",
                category: "Lexical",
                severity: Severity::Medium,
                recoverable: true,
                description: "Comment not closed before end of file",
            },
            CodeMetadata {
                code: "E004",
                category: "Lexical",
                severity: Severity::Medium,
                recoverable: true,
                description: "Malformed numeric literal",
            },
            CodeMetadata {
                code: "E005",
                category: "Lexical",
                severity: Severity::Low,
                recoverable: true,
                description: "Identifier exceeds the maximum length",
            },
            CodeMetadata {
                code: "E006",
                category: "Lexical",
                severity: Severity::High,
                recoverable: true,
                description: "String literal exceeds the maximum size",
            },
            CodeMetadata {
                code: "E007",
                category: "Lexical",
                severity: Severity::Low,
                recoverable: true,
                description: "Comment exceeds the maximum length",
            },
            CodeMetadata {
                code: "E008",
                category: "Lexical",
                severity: Severity::High,
                recoverable: false,
                description: "Token count exceeds the per-unit limit",
            },
            CodeMetadata {
                code: "E009",
                category: "Lexical",
                severity: Severity::Medium,
                recoverable: true,
                description: "Variable sigil with no following name",
            },
            CodeMetadata {
                code: "E101",
                category: "Directive",
                severity: Severity::Medium,
                recoverable: true,
                description: "#Else or #End-If without a matching #If",
            },
            CodeMetadata {
                code: "E102",
                category: "Directive",
                severity: Severity::Medium,
                recoverable: true,
                description: "#If block not closed before end of file",
            },
            CodeMetadata {
                code: "E103",
                category: "Directive",
                severity: Severity::Medium,
                recoverable: true,
                description: "Directive condition could not be parsed",
            },
            CodeMetadata {
                code: "E104",
                category: "Directive",
                severity: Severity::Medium,
                recoverable: true,
                description: "Parentheses are not allowed in directive conditions",
            },
            CodeMetadata {
                code: "E105",
                category: "Directive",
                severity: Severity::High,
                recoverable: false,
                description: "#If nesting exceeds the maximum depth",
            },
            CodeMetadata {
                code: "E106",
                category: "Directive",
                severity: Severity::Low,
                recoverable: true,
                description: "Tools release literal is not of the form N.N or N.N.N",
            },
            CodeMetadata {
                code: "E201",
                category: "Syntax",
                severity: Severity::Medium,
                recoverable: true,
                description: "Token not valid at this point in the grammar",
            },
            CodeMetadata {
                code: "E202",
                category: "Syntax",
                severity: Severity::Medium,
                recoverable: true,
                description: "Required token absent",
            },
            CodeMetadata {
                code: "E203",
                category: "Syntax",
                severity: Severity::Medium,
                recoverable: true,
                description: "Block opener without its matching end keyword",
            },
            CodeMetadata {
                code: "E204",
                category: "Syntax",
                severity: Severity::High,
                recoverable: true,
                description: "Nesting exceeds the maximum parse depth",
            },
            CodeMetadata {
                code: "E205",
                category: "Syntax",
                severity: Severity::Medium,
                recoverable: true,
                description: "Expression could not be parsed",
            },
            CodeMetadata {
                code: "E206",
                category: "Syntax",
                severity: Severity::Critical,
                recoverable: false,
                description: "Parser invariant violated",
            },
            CodeMetadata {
                code: "I001",
                category: "Success",
                severity: Severity::Low,
                recoverable: true,
                description: "Lexical analysis completed",
            },
            CodeMetadata {
                code: "I002",
                category: "Success",
                severity: Severity::Low,
                recoverable: true,
                description: "Directive preprocessing completed",
            },
            CodeMetadata {
                code: "I003",
                category: "Success",
                severity: Severity::Low,
                recoverable: true,
                description: "Parsing completed",
            },
            CodeMetadata {
                code: "I004",
                category: "Success",
                severity: Severity::Low,
                recoverable: true,
                description: "Front-end pipeline completed",
            },
        ];

        entries.into_iter().map(|m| (m.code, m)).collect()
    })
}

pub fn get_metadata(code: &str) -> Option<&'static CodeMetadata> {
    metadata_registry().get(code)
}

pub fn get_severity(code: &str) -> Severity {
    get_metadata(code).map(|m| m.severity).unwrap_or(Severity::Medium)
}

pub fn get_category(code: &str) -> &'static str {
    get_metadata(code).map(|m| m.category).unwrap_or("Unknown")
}

pub fn get_description(code: &str) -> &'static str {
    get_metadata(code)
        .map(|m| m.description)
        .unwrap_or("Unknown code")
}

pub fn is_recoverable(code: &str) -> bool {
    get_metadata(code).map(|m| m.recoverable).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_constants_have_metadata() {
        let all = [
            lexical::INVALID_CHARACTER,
            lexical::UNTERMINATED_STRING,
            lexical::UNTERMINATED_COMMENT,
            lexical::INVALID_NUMBER,
            lexical::IDENTIFIER_TOO_LONG,
            lexical::STRING_TOO_LARGE,
            lexical::COMMENT_TOO_LONG,
            lexical::TOO_MANY_TOKENS,
            lexical::EMPTY_IDENTIFIER,
            directive::UNMATCHED_DIRECTIVE,
            directive::UNTERMINATED_DIRECTIVE,
            directive::INVALID_CONDITION,
            directive::PARENTHESIZED_CONDITION,
            directive::NESTING_TOO_DEEP,
            directive::INVALID_TOOLS_VERSION,
            syntax::UNEXPECTED_TOKEN,
            syntax::MISSING_TOKEN,
            syntax::UNMATCHED_BLOCK_DELIMITER,
            syntax::MAX_RECURSION_DEPTH,
            syntax::INVALID_EXPRESSION,
            syntax::INTERNAL_PARSER_ERROR,
            success::LEXING_COMPLETE,
            success::PREPROCESSING_COMPLETE,
            success::PARSING_COMPLETE,
            success::PIPELINE_COMPLETE,
        ];
        for code in all {
            assert!(
                get_metadata(code.as_str()).is_some(),
                "missing metadata for {}",
                code
            );
        }
    }

    #[test]
    fn test_category_reflects_code_range() {
        assert_eq!(get_category("E001"), "Lexical");
        assert_eq!(get_category("E104"), "Directive");
        assert_eq!(get_category("E201"), "Syntax");
        assert_eq!(get_category("I003"), "Success");
        assert_eq!(get_category("E999"), "Unknown");
    }

    #[test]
    fn test_unknown_code_defaults() {
        assert_eq!(get_severity("E999"), Severity::Medium);
        assert!(is_recoverable("E999"));
        assert_eq!(get_description("E999"), "Unknown code");
    }
}
