pub mod error;
pub mod parser;
pub mod recovery;

pub use error::SyntaxError;
pub use parser::{parse, ParseResult, Parser};
pub use recovery::{is_sync_token, synchronize, SyncContext};
