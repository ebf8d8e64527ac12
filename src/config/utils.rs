/// Loading, access and persistence of the global configuration
use super::schemas::Config;
use crate::logger::{self, LogTag};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::path::Path;

/// Global configuration instance. Falls back to defaults when nothing was
/// loaded, so library code and tests never observe an uninitialized config.
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

pub const CONFIG_FILE_PATH: &str = "data/config.toml";

/// Read and validate a config file without touching the global instance.
///
/// A missing file yields the defaults.
pub fn read_config_file(path: &str) -> Result<Config, String> {
    let config = if Path::new(path).exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;
        toml::from_str::<Config>(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path, e))?
    } else {
        Config::default()
    };

    config
        .validate()
        .map_err(|e| format!("Invalid config '{}': {}", path, e))?;
    Ok(config)
}

pub fn load_config() -> Result<(), String> {
    load_config_from_path(CONFIG_FILE_PATH)
}

/// Load `path` and install it as the global configuration.
///
/// Loading twice replaces the previous values.
pub fn load_config_from_path(path: &str) -> Result<(), String> {
    if !Path::new(path).exists() {
        logger::warning(
            LogTag::Config,
            &format!("Config file '{}' not found, using default values", path),
        );
    }
    let config = read_config_file(path)?;

    match CONFIG.get() {
        Some(lock) => *lock.write() = config,
        None => {
            if let Err(cell) = CONFIG.set(RwLock::new(config)) {
                // Lost an init race; apply ours on top
                *global().write() = cell.into_inner();
            }
        }
    }

    logger::debug(LogTag::Config, &format!("Loaded configuration from '{}'", path));
    Ok(())
}

fn global() -> &'static RwLock<Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default()))
}

/// Read access to the configuration
///
/// ```rust,ignore
/// let slippage = with_config(|cfg| cfg.swap.slippage_bps);
/// ```
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    f(&global().read())
}

/// Clone of the whole configuration, for use across await points
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

pub fn is_config_initialized() -> bool {
    CONFIG.get().is_some()
}

/// Apply an in-memory update, rejecting it if the result does not validate
pub fn update_config_section<F>(update_fn: F) -> Result<(), String>
where
    F: FnOnce(&mut Config),
{
    let mut config = global().write();
    let mut updated = config.clone();
    update_fn(&mut updated);
    updated.validate()?;
    *config = updated;
    Ok(())
}

/// Write the current configuration as TOML
pub fn save_config(path: Option<&str>) -> Result<(), String> {
    let path = path.unwrap_or(CONFIG_FILE_PATH);

    let config_str = with_config(|cfg| {
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))
    })?;

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
        }
    }

    std::fs::write(path, config_str)
        .map_err(|e| format!("Failed to write config file '{}': {}", path, e))
}
