pub mod token;
pub mod token_stream;

pub use token::{classify_percent_name, Assoc, CommentStyle, LiteralValue, Token, TokenKind};
pub use token_stream::TokenStream;
