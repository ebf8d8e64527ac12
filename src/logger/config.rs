/// Runtime logger configuration
///
/// Binaries build a `LoggerConfig` from CLI flags and the `[logging]` config
/// section and install it once. Until then the defaults apply: Info level,
/// console only.
use super::levels::LogLevel;
use super::tags::LogTag;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct LoggerConfig {
    /// Messages above this level are dropped (Error is always shown)
    pub min_level: LogLevel,
    /// Debug keys of tags with debug output enabled
    pub debug_tags: HashSet<String>,
    /// Restrict Info/Warning output to these tags (empty = all)
    pub enabled_tags: HashSet<String>,
    /// Suppress console output below Warning
    pub quiet: bool,
    /// Plain-text log file; console only when absent
    pub file_path: Option<PathBuf>,
}

impl LoggerConfig {
    pub fn with_debug_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.debug_tags.extend(
            tags.into_iter()
                .map(|tag| LogTag::from_debug_key(tag.as_ref()).to_debug_key()),
        );
        self
    }

    /// Build from the `[logging]` section values and command-line flags.
    ///
    /// `--verbose` overrides the configured level; an unparsable level falls
    /// back to Info.
    pub fn from_settings(min_level: &str, file_path: &str, verbose: bool, quiet: bool) -> Self {
        let min_level = if verbose {
            LogLevel::Verbose
        } else {
            min_level.parse().unwrap_or_default()
        };
        let file_path = Some(file_path.trim())
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Self {
            min_level,
            quiet,
            file_path,
            ..Self::default()
        }
    }
}

static LOGGER_CONFIG: Lazy<RwLock<LoggerConfig>> =
    Lazy::new(|| RwLock::new(LoggerConfig::default()));

pub fn get_logger_config() -> LoggerConfig {
    LOGGER_CONFIG.read().clone()
}

pub fn set_logger_config(config: LoggerConfig) {
    *LOGGER_CONFIG.write() = config;
}

pub fn update_logger_config<F: FnOnce(&mut LoggerConfig)>(f: F) {
    f(&mut LOGGER_CONFIG.write());
}
