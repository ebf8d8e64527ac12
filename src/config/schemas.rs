/// Configuration sections, each declared once with its defaults
use crate::config_struct;

/// ParaSwap's sentinel address for the chain's native asset
pub const NATIVE_TOKEN_SENTINEL: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

pub const POLYGON_CHAIN_ID: u64 = 137;

// ============================================================================
// NETWORK
// ============================================================================

config_struct! {
    pub struct NetworkConfig {
        chain_id: u64 = POLYGON_CHAIN_ID,
        /// Address that stands for the native asset; needs no authorization
        native_token_address: String = NATIVE_TOKEN_SENTINEL.to_string(),
    }
}

// ============================================================================
// AGGREGATOR
// ============================================================================

config_struct! {
    pub struct AggregatorConfig {
        api_base: String = "https://apiv5.paraswap.io".to_string(),
        /// Partner tag sent with price and build requests
        partner: String = "pbws".to_string(),
        timeout_secs: u64 = 30,
        /// Ask the build endpoint to skip its balance/allowance checks
        ignore_checks: bool = false,
    }
}

// ============================================================================
// SWAP
// ============================================================================

config_struct! {
    pub struct SwapConfig {
        /// Buffer subtracted from the quoted output, in basis points.
        /// 0 passes the quoted output through unchanged.
        slippage_bps: u16 = 0,
        rate_display_decimals: u32 = 5,
        /// Read the current allowance before sending an approval
        check_allowance: bool = true,
        /// Wait for the swap receipt and report Confirmed
        wait_for_confirmation: bool = false,
    }
}

// ============================================================================
// WALLET
// ============================================================================

config_struct! {
    pub struct WalletConfig {
        rpc_url: String = "http://127.0.0.1:8545".to_string(),
        /// Preferred account; the node's first account is used when empty
        account: String = String::new(),
        confirmation_timeout_secs: u64 = 120,
        poll_interval_ms: u64 = 1500,
    }
}

// ============================================================================
// TOKENS
// ============================================================================

config_struct! {
    pub struct TokensConfig {
        registry_path: String = "data/tokens.json".to_string(),
    }
}

// ============================================================================
// LOGGING
// ============================================================================

config_struct! {
    pub struct LoggingConfig {
        /// Plain-text log file; console only when empty
        file_path: String = String::new(),
        min_level: String = "info".to_string(),
    }
}

// ============================================================================
// ROOT
// ============================================================================

config_struct! {
    pub struct Config {
        network: NetworkConfig = NetworkConfig::default(),
        aggregator: AggregatorConfig = AggregatorConfig::default(),
        swap: SwapConfig = SwapConfig::default(),
        wallet: WalletConfig = WalletConfig::default(),
        tokens: TokensConfig = TokensConfig::default(),
        logging: LoggingConfig = LoggingConfig::default(),
    }
}

impl Config {
    /// Reject values that would make the swap workflow misbehave
    pub fn validate(&self) -> Result<(), String> {
        if self.network.chain_id == 0 {
            return Err("network.chain_id must be non-zero".to_string());
        }
        if self.network.native_token_address.trim().is_empty() {
            return Err("network.native_token_address must be set".to_string());
        }
        if self.aggregator.api_base.trim().is_empty() {
            return Err("aggregator.api_base must be set".to_string());
        }
        if self.aggregator.timeout_secs == 0 {
            return Err("aggregator.timeout_secs must be greater than 0".to_string());
        }
        if self.swap.slippage_bps > 10_000 {
            return Err(format!(
                "swap.slippage_bps must be at most 10000, got {}",
                self.swap.slippage_bps
            ));
        }
        if self.swap.rate_display_decimals > 18 {
            return Err(format!(
                "swap.rate_display_decimals must be at most 18, got {}",
                self.swap.rate_display_decimals
            ));
        }
        if self.wallet.poll_interval_ms == 0 {
            return Err("wallet.poll_interval_ms must be greater than 0".to_string());
        }
        if self.logging.min_level.parse::<crate::logger::LogLevel>().is_err() {
            return Err(format!(
                "logging.min_level '{}' is not a log level",
                self.logging.min_level
            ));
        }
        Ok(())
    }
}
