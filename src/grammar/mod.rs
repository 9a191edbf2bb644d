pub mod ast;
pub mod keywords;

pub use keywords::Keyword;
