//! Compile-time limits for the front end

pub mod constants;
