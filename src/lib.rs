pub mod config;
pub mod errors;
pub mod logger;
pub mod swaps;
pub mod tokens;
pub mod units;
pub mod wallet;
