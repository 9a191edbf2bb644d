//! Global logging for the front end
//!
//! Thread-safe global service behind a OnceLock, configured from the
//! environment, with a clean macro interface. Logging is optional: every
//! entry point works with the logger uninitialized.

pub mod codes;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use events::{LogEvent, LogLevel};
pub use service::{ConsoleLogger, Logger, LoggingService, MemoryLogger, StructuredLogger};

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

/// Initialize global logging from the environment configuration
pub fn init_global_logging() -> Result<(), String> {
    let logging_service = Arc::new(LoggingService::with_config());

    GLOBAL_LOGGER
        .set(logging_service.clone())
        .map_err(|_| "Global logger already initialized".to_string())?;

    logging_service.log_event(events::LogEvent::success(
        codes::success::PIPELINE_COMPLETE,
        "Global logging initialized",
    ));

    Ok(())
}

/// Initialize with a custom service, primarily for testing
pub fn init_global_logging_with_service(service: Arc<LoggingService>) -> Result<(), String> {
    GLOBAL_LOGGER
        .set(service)
        .map_err(|_| "Global logger already initialized".to_string())
}

pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

/// Safe access to the global logger
pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

/// Support function for the log_error! macro
pub fn log_error_with_context(
    code: Code,
    message: &str,
    span: Option<crate::utils::SourceSpan>,
    context: Vec<(&str, &str)>,
) {
    let mut event = LogEvent::error(code, message);

    if let Some(s) = span {
        event = event.with_span(s);
    }

    for (key, value) in context {
        event = event.with_context(key, value);
    }

    if let Some(logger) = try_get_global_logger() {
        logger.log_event(event);
    }
}

/// Support function for the log_success! macro
pub fn log_success_with_context(code: Code, message: &str, context: Vec<(&str, &str)>) {
    let mut event = LogEvent::success(code, message);

    for (key, value) in context {
        event = event.with_context(key, value);
    }

    if let Some(logger) = try_get_global_logger() {
        logger.log_event(event);
    }
}

/// Support function for the log_info! macro
pub fn log_info_with_context(message: &str, context: Vec<(&str, &str)>) {
    let mut event = LogEvent::info(message);

    for (key, value) in context {
        event = event.with_context(key, value);
    }

    if let Some(logger) = try_get_global_logger() {
        logger.log_event(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_is_optional_before_init() {
        // Must not panic with the global logger unset
        log_error_with_context(codes::lexical::INVALID_CHARACTER, "test", None, vec![]);
        log_info_with_context("test", vec![]);
    }

    #[test]
    fn test_try_get_never_panics() {
        let _ = try_get_global_logger();
    }
}
