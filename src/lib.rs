// Internal modules
pub mod config;
pub mod directives;
pub mod grammar;
pub mod lexical;
#[macro_use]
pub mod logging;
pub mod pipeline;
pub mod syntax;
pub mod tokens;
pub mod utils;

// Re-export key types for library consumers
pub use grammar::ast::{Ast, NodeId, NodeKind};
pub use pipeline::{parse_source, ParseOutput};
pub use utils::{Diagnostic, SourcePosition, SourceSpan};
