//! End-to-end compilation pipeline
//!
//! Runs the three front-end phases in order: lexical analysis, directive
//! preprocessing, then parsing. Each phase is total, so the pipeline always
//! yields a program node; everything that went wrong along the way is
//! collected into one diagnostic list in phase order.

use crate::directives::{DirectivePreprocessor, ToolsVersion};
use crate::grammar::ast::{Ast, NodeId};
use crate::lexical::LexicalAnalyzer;
use crate::logging::codes;
use crate::syntax;
use crate::utils::{Diagnostic, SourcePosition, SourceSpan};
use crate::{log_error, log_success};

/// Combined output of the full front end
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub ast: Ast,
    pub program: NodeId,
    /// Lexical, directive and syntax diagnostics, in phase order
    pub diagnostics: Vec<Diagnostic>,
    /// Source regions suppressed by losing directive branches
    pub excluded_spans: Vec<SourceSpan>,
}

impl ParseOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Compile `source` down to a syntax tree.
///
/// `tools_version` selects the active branches of `#If` directives; pass
/// `None` to apply the prefer-newer fallback throughout. A version string
/// that does not parse is itself a diagnostic, never a failure.
pub fn parse_source(source: &str, tools_version: Option<&str>) -> ParseOutput {
    let mut diagnostics = Vec::new();

    let version = tools_version.and_then(|text| match text.parse::<ToolsVersion>() {
        Ok(version) => Some(version),
        Err(error) => {
            log_error!(error.error_code(), "Invalid tools version", "input" => text);
            diagnostics.push(Diagnostic::warning(
                error.to_string(),
                SourcePosition::start(),
            ));
            None
        }
    });

    let lexed = LexicalAnalyzer::new(source).tokenize();
    diagnostics.extend(lexed.diagnostics);

    let preprocessed = DirectivePreprocessor::new(version.as_ref()).preprocess(lexed.tokens);
    diagnostics.extend(preprocessed.diagnostics);

    let parsed = syntax::parse(preprocessed.tokens);
    diagnostics.extend(parsed.diagnostics);

    log_success!(codes::success::PIPELINE_COMPLETE, "Front end completed",
        "diagnostics" => diagnostics.len(),
        "excluded_spans" => preprocessed.excluded_spans.len()
    );

    ParseOutput {
        ast: parsed.ast,
        program: parsed.program,
        diagnostics,
        excluded_spans: preprocessed.excluded_spans,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ast::NodeKind;
    use assert_matches::assert_matches;

    #[test]
    fn test_always_yields_program() {
        for source in ["", "   \n\t", ")(* garbage *)(", "#If #ToolsRel >= \"8.54\" #Then #End-If"] {
            let output = parse_source(source, Some("8.55.00"));
            assert_matches!(output.ast.kind(output.program), NodeKind::Program);
        }
    }

    #[test]
    fn test_directive_selects_branch() {
        let source = "#If #ToolsRel >= \"8.54\" && #ToolsRel < \"8.56\" #Then\n&x = 1;\n#Else\n&x = 2;\n#End-If";

        let newer = parse_source(source, Some("8.55.00"));
        assert!(!newer.has_errors());
        assert_eq!(newer.ast.children(newer.program).len(), 1);
        assert_eq!(newer.excluded_spans.len(), 1);

        let newest = parse_source(source, Some("8.57.00"));
        assert!(!newest.has_errors());
        assert_eq!(newest.ast.children(newest.program).len(), 1);
        assert_eq!(newest.excluded_spans.len(), 1);

        // The two configurations exclude different regions
        assert_ne!(
            newer.excluded_spans[0].start(),
            newest.excluded_spans[0].start()
        );
    }

    #[test]
    fn test_invalid_tools_version_is_diagnosed_not_fatal() {
        let output = parse_source("&x = 1;", Some("8.x"));
        assert_matches!(output.ast.kind(output.program), NodeKind::Program);
        assert_eq!(output.ast.children(output.program).len(), 1);
        assert!(output
            .diagnostics
            .iter()
            .any(|d| d.message.contains("8.x")));
        assert!(!output.has_errors());
    }

    #[test]
    fn test_diagnostics_arrive_in_phase_order() {
        // Lexical error (bad char), directive error (stray #Else),
        // syntax error (unclosed If), in that source
        let source = "&a = 1 ` 2;\n#Else\nIf &a Then &b = 1;";
        let output = parse_source(source, None);
        assert!(output.diagnostics.len() >= 3);

        let bad_char = output
            .diagnostics
            .iter()
            .position(|d| d.message.contains('`'));
        let stray_else = output
            .diagnostics
            .iter()
            .position(|d| d.message.contains("#Else"));
        let unclosed = output
            .diagnostics
            .iter()
            .position(|d| d.message.contains("End-If"));
        assert!(bad_char.is_some() && stray_else.is_some() && unclosed.is_some());
        assert!(bad_char < stray_else);
        assert!(stray_else < unclosed);
    }

    #[test]
    fn test_multibyte_source_end_to_end() {
        let source = "&name = \"café 🌟 naïve\";";
        let output = parse_source(source, None);
        assert!(!output.has_errors());
        let assignment = output.ast.children(output.program)[0];
        let span = output.ast.span(assignment);
        // Byte offsets slice the original source cleanly
        let text = &source[span.start().byte_index..span.end().byte_index];
        assert!(text.starts_with("&name"));
        assert!(text.contains("🌟"));
    }
}
