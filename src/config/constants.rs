pub mod compile_time {
    pub mod lexical {
        /// Maximum string literal size (1MB)
        pub const MAX_STRING_SIZE: usize = 1_048_576;

        /// Maximum identifier length, sigil included
        pub const MAX_IDENTIFIER_LENGTH: usize = 255;

        /// Maximum comment length before truncation is reported
        pub const MAX_COMMENT_LENGTH: usize = 100_000;

        /// Maximum number of tokens per source unit
        pub const MAX_TOKEN_COUNT: usize = 1_000_000;
    }

    pub mod directives {
        /// Maximum nesting depth of #If blocks
        pub const MAX_DIRECTIVE_DEPTH: usize = 32;
    }

    pub mod syntax {
        /// Maximum parser recursion depth before degrading to an error node
        pub const MAX_PARSE_DEPTH: usize = 100;

        /// Maximum tokens to skip during a single recovery scan
        pub const MAX_RECOVERY_SCAN_TOKENS: usize = 1000;
    }

    pub mod logging {
        /// Maximum log message length in chars; longer messages are clipped
        pub const MAX_LOG_MESSAGE_LENGTH: usize = 10_000;
    }
}
