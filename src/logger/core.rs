/// Filtering rules shared by every level function
use super::config::{get_logger_config, LoggerConfig};
use super::levels::LogLevel;
use super::tags::LogTag;

pub fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    passes_filter(&get_logger_config(), tag, level)
}

/// 1. Errors always pass.
/// 2. Quiet mode drops everything below Warning.
/// 3. Debug requires the tag to be enabled (or a global Debug threshold).
/// 4. Verbose requires the global Verbose threshold.
/// 5. Info/Warning respect `enabled_tags` when it is non-empty.
fn passes_filter(config: &LoggerConfig, tag: &LogTag, level: LogLevel) -> bool {
    if level == LogLevel::Error {
        return true;
    }

    if config.quiet && level > LogLevel::Warning {
        return false;
    }

    match level {
        LogLevel::Debug => {
            config.min_level >= LogLevel::Debug
                || config.debug_tags.contains(&tag.to_debug_key())
        }
        LogLevel::Verbose => config.min_level == LogLevel::Verbose,
        _ => {
            if level > config.min_level {
                return false;
            }
            config.enabled_tags.is_empty() || config.enabled_tags.contains(&tag.to_debug_key())
        }
    }
}

pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }
    super::format::format_and_log(&tag, level, message);
}
