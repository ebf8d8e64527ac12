/// Dump the raw ParaSwap price route for one pair
///
/// Uses the configured aggregator settings and token registry, so the request
/// matches what the swap workflow sends.
use anyhow::{anyhow, Result};
use clap::Parser;
use colored::Colorize;
use pbws_swap::config::{self, CONFIG_FILE_PATH};
use pbws_swap::logger::{self, LogTag, LoggerConfig};
use pbws_swap::swaps::router::{AggregatorApi, RateRequest};
use pbws_swap::swaps::ParaSwapRouter;
use pbws_swap::tokens::TokenRegistry;
use pbws_swap::units::to_base_units;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "debug_quote")]
#[command(about = "Print the raw price route returned by ParaSwap")]
struct Args {
    /// Source token symbol or address
    #[arg(long)]
    from: String,

    /// Destination token symbol or address
    #[arg(long)]
    to: String,

    /// Amount of the source token, in human units
    #[arg(long, default_value = "1")]
    amount: String,

    /// Also fetch the token-transfer proxy from the contracts endpoint
    #[arg(long)]
    spender: bool,

    #[arg(long, default_value = CONFIG_FILE_PATH)]
    config: String,

    /// Log every request and response body
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    config::load_config_from_path(&args.config).map_err(|e| anyhow!(e))?;
    let config = config::get_config_clone();
    logger::init_with(
        LoggerConfig::from_settings(&config.logging.min_level, "", args.verbose, false)
            .with_debug_tags(["api", "quote"]),
    );

    let registry = TokenRegistry::load(&config.tokens.registry_path)?;
    let source = registry.resolve(&args.from)?;
    let destination = registry.resolve(&args.to)?;
    let amount = to_base_units(&args.amount, source.decimals)?;

    let router = ParaSwapRouter::from_config()?;
    println!(
        "{} {} {} ({}) -> {} on chain {}",
        "GET /prices".bold(),
        args.amount,
        source.symbol,
        amount,
        destination.symbol,
        config.network.chain_id
    );

    let started = Instant::now();
    let request = RateRequest {
        source,
        destination,
        amount,
    };
    match router.get_rate(&request).await {
        Ok(route) => {
            println!(
                "{} in {:.0?}: srcAmount={} destAmount={} tokenTransferProxy={}",
                "OK".green().bold(),
                started.elapsed(),
                route.source_amount,
                route.destination_amount,
                route.token_transfer_proxy.as_deref().unwrap_or("-")
            );
            println!("{}", serde_json::to_string_pretty(&route.raw)?);
        }
        Err(e) => {
            println!("{} in {:.0?}: {}", "FAILED".red().bold(), started.elapsed(), e);
        }
    }

    if args.spender {
        match router.get_spender().await {
            Ok(spender) => println!("TokenTransferProxy: {}", spender.cyan()),
            Err(e) => logger::warning(LogTag::Api, &format!("Spender lookup failed: {}", e)),
        }
    }

    logger::flush();
    Ok(())
}
