//! Tag-based structured logging
//!
//! ```rust,ignore
//! use pbws_swap::logger::{self, LogTag};
//!
//! logger::info(LogTag::Quote, "1 WMATIC -> 0.98 USDC");
//! logger::debug(LogTag::Api, "GET /prices ..."); // only with --debug api
//! logger::verbose(LogTag::Wallet, "raw receipt ..."); // only with --verbose
//! ```
//!
//! Binaries call [`init_with`] once. Library code only calls the level
//! functions; before initialization they log at Info to the console.

mod config;
mod core;
mod file;
mod format;
mod levels;
mod tags;

pub use config::{get_logger_config, set_logger_config, update_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Install the logger configuration and open the log file if one is set.
///
/// A log file that cannot be opened is reported and logging continues on the
/// console.
pub fn init_with(config: LoggerConfig) {
    let file_path = config.file_path.clone();
    config::set_logger_config(config);

    if let Some(path) = file_path {
        if let Err(e) = file::open_log_file(&path) {
            error(
                LogTag::System,
                &format!("Cannot open log file {}: {}", path.display(), e),
            );
        }
    }
}

/// Always shown
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Shown only when debug is enabled for `tag`
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Shown only with `--verbose`
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Check a level/tag pair before building an expensive message
pub fn is_enabled(tag: &LogTag, level: LogLevel) -> bool {
    core::should_log(tag, level)
}

/// Flush pending file writes; call before exit
pub fn flush() {
    file::flush_file_logging();
}
