pub mod analyzer;

pub use analyzer::{LexOutput, LexerError, LexicalAnalyzer, LexicalMetrics};
