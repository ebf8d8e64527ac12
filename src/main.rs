/// pbws-swap command line
///
/// Commands:
/// - tokens: list the token registry
/// - quote: price one swap and show the minimum return
/// - swap: run a full attempt through a JSON-RPC signer
/// - interactive: line-driven session over stdin
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use pbws_swap::config::{self, Config, CONFIG_FILE_PATH};
use pbws_swap::errors::SwapError;
use pbws_swap::logger::{self, LogTag, LoggerConfig};
use pbws_swap::swaps::{
    effective_rate, AggregatorApi, ParaSwapRouter, QuoteClient, SwapAttemptState, SwapController,
    SwapEvent, SwapExecutor, SwapNotification, SwapPlanner, SwapRequest, SwapSession, SwapView,
};
use pbws_swap::tokens::{Token, TokenRegistry};
use pbws_swap::units::{from_base_units, DecimalAmount};
use pbws_swap::wallet::{JsonRpcSigner, TransactionSigner};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "pbws-swap", version, about = "Swap tokens on Polygon through ParaSwap")]
struct Cli {
    /// Config file (missing file = defaults)
    #[arg(long, default_value = CONFIG_FILE_PATH)]
    config: String,

    /// Show verbose output for every tag
    #[arg(short, long)]
    verbose: bool,

    /// Only warnings and errors on the console
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug output for a tag (quote, approval, tx, submit, session, wallet, api, ...)
    #[arg(long = "debug", value_name = "TAG")]
    debug_tags: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the token registry
    Tokens,
    /// Price a swap without sending anything
    Quote(PairArgs),
    /// Quote, authorize if needed, build and submit a swap
    Swap {
        #[command(flatten)]
        pair: PairArgs,
        /// Account to send from (defaults to wallet.account, then the node's first account)
        #[arg(long)]
        account: Option<String>,
    },
    /// Edit the swap form line by line: amount X | from T | to T | swap | quit
    Interactive {
        #[arg(long, default_value = "MATIC")]
        from: String,
        #[arg(long, default_value = "DG")]
        to: String,
        #[arg(long, default_value = "1")]
        amount: String,
    },
}

#[derive(Args, Debug)]
struct PairArgs {
    /// Source token symbol or address
    #[arg(long)]
    from: String,
    /// Destination token symbol or address
    #[arg(long)]
    to: String,
    /// Amount of the source token, in human units
    #[arg(long)]
    amount: String,
}

fn main() {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(run(cli));
    if let Err(e) = result {
        logger::error(LogTag::System, &format!("{:#}", e));
        logger::flush();
        std::process::exit(1);
    }
    logger::flush();
}

async fn run(cli: Cli) -> Result<()> {
    config::load_config_from_path(&cli.config).map_err(|e| anyhow!(e))?;
    let config = config::get_config_clone();

    logger::init_with(
        LoggerConfig::from_settings(
            &config.logging.min_level,
            &config.logging.file_path,
            cli.verbose,
            cli.quiet,
        )
        .with_debug_tags(&cli.debug_tags),
    );
    logger::debug(
        LogTag::System,
        &format!("Using config '{}' on chain {}", cli.config, config.network.chain_id),
    );

    let registry = TokenRegistry::load(&config.tokens.registry_path)?;

    match cli.command {
        Command::Tokens => {
            list_tokens(&registry);
            Ok(())
        }
        Command::Quote(pair) => quote(&config, &registry, &pair).await,
        Command::Swap { pair, account } => swap(&registry, &pair, account).await,
        Command::Interactive { from, to, amount } => {
            interactive(&config, &registry, &from, &to, &amount).await
        }
    }
}

fn list_tokens(registry: &TokenRegistry) {
    println!(
        "{:<8} {:>8}  {:<42}  {}",
        "SYMBOL".bold(),
        "DECIMALS".bold(),
        "ADDRESS".bold(),
        "NAME".bold()
    );
    for token in registry.tokens() {
        println!(
            "{:<8} {:>8}  {:<42}  {}",
            token.symbol.cyan(),
            token.decimals,
            token.address,
            token.name
        );
    }
}

fn router(config: &Config) -> Result<Arc<dyn AggregatorApi>> {
    let router = ParaSwapRouter::new(&config.aggregator, config.network.chain_id)?;
    Ok(Arc::new(router))
}

fn resolve_pair(registry: &TokenRegistry, pair: &PairArgs) -> Result<(Token, Token, DecimalAmount)> {
    let source = registry.resolve(&pair.from)?;
    let destination = registry.resolve(&pair.to)?;
    let amount = DecimalAmount::parse(&pair.amount)?;
    if amount.is_zero() {
        return Err(SwapError::invalid_amount(&pair.amount, "amount must be greater than zero").into());
    }
    Ok((source, destination, amount))
}

async fn quote(config: &Config, registry: &TokenRegistry, pair: &PairArgs) -> Result<()> {
    let (source, destination, amount) = resolve_pair(registry, pair)?;
    let planner = SwapPlanner::from_config(&config.swap, &config.network)?;
    let client = QuoteClient::new(router(config)?);

    let quote = client
        .get_quote(&source, &destination, &amount.to_base_units(source.decimals))
        .await?;
    let rate = effective_rate(&quote, config.swap.rate_display_decimals)?;
    let minimum = planner
        .plan_minimum_return(Some(&amount), Some(&rate))
        .map(|min| min.to_string())
        .unwrap_or_default();

    println!(
        "{} {} -> {} {}",
        amount,
        source.symbol.cyan(),
        from_base_units(&quote.destination_amount, destination.decimals),
        destination.symbol.cyan()
    );
    println!("  rate            1 {} = {} {}", source.symbol, rate, destination.symbol);
    println!(
        "  minimum return  {} {} ({} bps slippage)",
        minimum.green(),
        destination.symbol,
        planner.slippage_bps()
    );
    if planner.needs_authorization(&source.address) {
        println!(
            "  spender         {}",
            quote.spender.as_deref().unwrap_or("(resolved at swap time)")
        );
    }
    Ok(())
}

async fn swap(registry: &TokenRegistry, pair: &PairArgs, account: Option<String>) -> Result<()> {
    if let Some(account) = account {
        config::update_config_section(|cfg| cfg.wallet.account = account)
            .map_err(|e| anyhow!(e))?;
    }
    let config = config::get_config_clone();

    let (source, destination, amount_input) = resolve_pair(registry, pair)?;
    let signer = JsonRpcSigner::connect_from_config()
        .await
        .context("connecting signer")?;
    let account = signer.account().ok_or(SwapError::NoSignerAvailable)?;
    let executor = SwapExecutor::from_config(&config, router(&config)?)?;

    let request = SwapRequest {
        amount: amount_input.to_base_units(source.decimals),
        source,
        destination,
        amount_input,
        account,
    };

    let mut on_state = |state: &SwapAttemptState| println!("  {} {}", "->".dimmed(), state);
    let outcome = executor.execute(request, &signer, &mut on_state).await?;

    if let Some(approval) = &outcome.approval_tx {
        println!("Approval: {}", approval);
    }
    let label = if outcome.confirmed { "Confirmed:" } else { "Submitted:" };
    println!(
        "{} {} (rate {}, minimum return {})",
        label.green().bold(),
        outcome.swap_tx,
        outcome.rate,
        outcome.minimum_return
    );
    Ok(())
}

// =============================================================================
// INTERACTIVE SESSION
// =============================================================================

enum Line {
    Amount(Option<String>),
    From(String),
    To(String),
    Swap,
    Show,
    Help,
    Quit,
}

fn parse_line(line: &str) -> Option<Line> {
    let mut parts = line.split_whitespace();
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(str::to_string);
    match command.as_str() {
        "amount" => Some(Line::Amount(argument)),
        "from" => argument.map(Line::From),
        "to" => argument.map(Line::To),
        "swap" => Some(Line::Swap),
        "show" => Some(Line::Show),
        "help" | "?" => Some(Line::Help),
        "quit" | "exit" => Some(Line::Quit),
        _ => None,
    }
}

fn print_help() {
    println!("commands: amount <X> | from <token> | to <token> | swap | show | quit");
}

fn print_view(view: &SwapView) {
    let amount = view.source_amount.as_deref().unwrap_or("-");
    let rate = view.rate.as_deref().unwrap_or("-");
    let minimum = view.minimum_return.as_deref().unwrap_or("-");
    println!(
        "[{} -> {}] amount {} | rate {} | min {} | {} | {}",
        view.source_token.symbol.cyan(),
        view.destination_token.symbol.cyan(),
        amount,
        rate,
        minimum.green(),
        view.state,
        if view.swap_enabled {
            "swap enabled".green()
        } else {
            "swap disabled".dimmed()
        }
    );
    if let Some(error) = &view.input_error {
        println!("  {}", error.yellow());
    }
}

fn print_notification(notification: &SwapNotification) {
    match notification {
        SwapNotification::Success { transaction_id } => {
            println!("{} {}", "Swap submitted:".green().bold(), transaction_id)
        }
        SwapNotification::Failure { message } => {
            println!("{} {}", "Swap failed:".red().bold(), message)
        }
    }
}

async fn interactive(
    config: &Config,
    registry: &TokenRegistry,
    from: &str,
    to: &str,
    amount: &str,
) -> Result<()> {
    let signer = JsonRpcSigner::connect(&config.wallet, config.network.chain_id)
        .await
        .context("connecting signer")?;
    let executor = Arc::new(SwapExecutor::from_config(config, router(config)?)?);

    let mut controller = SwapController::new(
        registry.resolve(from)?,
        registry.resolve(to)?,
        executor.planner().clone(),
        executor.rate_decimals(),
    );
    // The session quotes the initial inputs when it starts
    let _ = controller.set_amount(Some(amount.to_string()));

    let handle = SwapSession::spawn(executor, Arc::new(signer), controller);
    let mut views = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_printed: Option<SwapView> = None;

    print_help();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let event = match parse_line(&line) {
                    Some(Line::Amount(amount)) => SwapEvent::AmountChanged(amount),
                    Some(Line::From(token)) => match registry.resolve(&token) {
                        Ok(token) => SwapEvent::SourceTokenChanged(token),
                        Err(e) => {
                            println!("{}", e.to_string().yellow());
                            continue;
                        }
                    },
                    Some(Line::To(token)) => match registry.resolve(&token) {
                        Ok(token) => SwapEvent::DestinationTokenChanged(token),
                        Err(e) => {
                            println!("{}", e.to_string().yellow());
                            continue;
                        }
                    },
                    Some(Line::Swap) => SwapEvent::SwapRequested,
                    Some(Line::Show) => {
                        print_view(&handle.current_view());
                        continue;
                    }
                    Some(Line::Help) => {
                        print_help();
                        continue;
                    }
                    Some(Line::Quit) => break,
                    None => {
                        if !line.trim().is_empty() {
                            print_help();
                        }
                        continue;
                    }
                };
                handle.send(event)?;
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                if last_printed.as_ref() == Some(&view) {
                    continue;
                }
                let announce = view.notification.is_some()
                    && last_printed.as_ref().map(|last| &last.notification) != Some(&view.notification);
                print_view(&view);
                if announce {
                    if let Some(notification) = &view.notification {
                        print_notification(notification);
                    }
                }
                last_printed = Some(view);
            }
        }
    }

    handle.shutdown().await;
    logger::info(LogTag::System, "Session closed");
    Ok(())
}
