//! Environment-driven logging configuration
//!
//! `PCODE_LOG_LEVEL` selects the minimum level (error, warn, info, debug);
//! `PCODE_LOG_FORMAT=json` switches to structured output. Values are read
//! once and cached for the life of the process.

use super::events::LogLevel;
use std::sync::OnceLock;

const LOG_LEVEL_VAR: &str = "PCODE_LOG_LEVEL";
const LOG_FORMAT_VAR: &str = "PCODE_LOG_FORMAT";

fn parse_level(value: &str) -> Option<LogLevel> {
    match value.to_ascii_lowercase().as_str() {
        "error" => Some(LogLevel::Error),
        "warn" | "warning" => Some(LogLevel::Warning),
        "info" => Some(LogLevel::Info),
        "debug" => Some(LogLevel::Debug),
        _ => None,
    }
}

/// Minimum level for the process; defaults to Warning
pub fn get_min_log_level() -> LogLevel {
    static LEVEL: OnceLock<LogLevel> = OnceLock::new();
    *LEVEL.get_or_init(|| {
        std::env::var(LOG_LEVEL_VAR)
            .ok()
            .and_then(|v| parse_level(&v))
            .unwrap_or(LogLevel::Warning)
    })
}

/// True when structured JSON output was requested
pub fn use_structured_logging() -> bool {
    static STRUCTURED: OnceLock<bool> = OnceLock::new();
    *STRUCTURED.get_or_init(|| {
        std::env::var(LOG_FORMAT_VAR)
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    })
}

pub fn get_config_summary() -> String {
    format!(
        "log level: {}, structured: {}",
        get_min_log_level().as_str(),
        use_structured_logging()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_accepts_aliases() {
        assert_eq!(parse_level("warn"), Some(LogLevel::Warning));
        assert_eq!(parse_level("WARNING"), Some(LogLevel::Warning));
        assert_eq!(parse_level("Debug"), Some(LogLevel::Debug));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn test_summary_mentions_level() {
        let summary = get_config_summary();
        assert!(summary.contains("log level:"));
    }
}
