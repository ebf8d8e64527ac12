//! Configuration: TOML file -> typed sections with embedded defaults
//!
//! ```rust,ignore
//! use pbws_swap::config::{load_config_from_path, with_config};
//!
//! load_config_from_path("data/config.toml")?;
//! let chain_id = with_config(|cfg| cfg.network.chain_id);
//! ```

mod macros;
mod schemas;
mod utils;

pub use schemas::{
    AggregatorConfig, Config, LoggingConfig, NetworkConfig, SwapConfig, TokensConfig,
    WalletConfig, NATIVE_TOKEN_SENTINEL, POLYGON_CHAIN_ID,
};
pub use utils::{
    get_config_clone, is_config_initialized, load_config, load_config_from_path,
    read_config_file, save_config, update_config_section, with_config, CONFIG_FILE_PATH,
};
