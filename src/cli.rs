//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::adapters::clock::SystemClock;
use crate::adapters::csv_adapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::fixed_price_oracle::{FixedPriceOracle, UnknownSymbolPolicy};
use crate::domain::config_validation::{
    UNKNOWN_SYMBOL_DEFAULT, parse_number, validate_config,
};
use crate::domain::desk::{AccountView, Desk};
use crate::domain::error::TradeLedgerError;
use crate::domain::instruction::parse_script;
use crate::ports::clock_port::Clock;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PriceOracle;

pub const DEFAULT_ACCOUNT_ID: &str = "user1";

#[derive(Parser, Debug)]
#[command(name = "tradeledger", about = "Trading-simulation account ledger")]
pub struct Cli {
    /// Log ledger activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply an instruction script to a freshly opened account
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Script file; read from stdin when omitted
        #[arg(short, long)]
        script: Option<PathBuf>,
        /// Write the transaction history to this CSV file
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Print the configured price of each symbol
    Quote {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Run {
            config,
            script,
            history,
        } => run_session(&config, script.as_ref(), history.as_ref()),
        Command::Quote { config, symbols } => run_quote(&config, &symbols),
        Command::Validate { config } => run_validate(&config),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence.
pub fn init_tracing(verbose: bool) {
    let level = if verbose { "tradeledger=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TradeLedgerError> {
    FileConfigAdapter::from_file(path).map_err(|e| TradeLedgerError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Build the price oracle described by `[oracle]` and `[prices]`.
///
/// Layering, later wins: the reference table when `reference = true`, then
/// `prices_file` (resolved against `base_dir` when relative), then `[prices]`.
pub fn build_oracle(
    config: &dyn ConfigPort,
    base_dir: Option<&Path>,
) -> Result<FixedPriceOracle, TradeLedgerError> {
    let mut oracle = if config.get_bool("oracle", "reference", false) {
        FixedPriceOracle::reference()
    } else {
        FixedPriceOracle::default()
    };

    if let Some(policy) = config.get_string("oracle", "unknown_symbol") {
        let unknown = if policy.trim().eq_ignore_ascii_case(UNKNOWN_SYMBOL_DEFAULT) {
            let price = parse_number(config, "oracle", "default_price")?.ok_or_else(|| {
                TradeLedgerError::ConfigMissing {
                    section: "oracle".into(),
                    key: "default_price".into(),
                }
            })?;
            UnknownSymbolPolicy::Fallback(price)
        } else {
            UnknownSymbolPolicy::Reject
        };
        oracle.set_unknown_policy(unknown);
    }

    if let Some(file) = config.get_string("oracle", "prices_file") {
        let path = match base_dir {
            Some(dir) if Path::new(&file).is_relative() => dir.join(&file),
            _ => PathBuf::from(&file),
        };
        for (symbol, price) in csv_adapter::load_prices(&path)? {
            oracle.set_price(&symbol, price);
        }
    }

    for key in config.keys("prices") {
        if let Some(price) = parse_number(config, "prices", &key)? {
            oracle.set_price(&key, price);
        }
    }

    Ok(oracle)
}

pub fn build_desk<C: Clock + Clone>(
    config: &dyn ConfigPort,
    base_dir: Option<&Path>,
    clock: C,
) -> Result<Desk<FixedPriceOracle, C>, TradeLedgerError> {
    validate_config(config)?;
    let oracle = build_oracle(config, base_dir)?;
    let account_id = config
        .get_string("account", "id")
        .map(|id| id.trim().to_string())
        .unwrap_or_else(|| DEFAULT_ACCOUNT_ID.to_string());
    let opening_balance = parse_number(config, "account", "opening_balance")?.unwrap_or(0.0);
    Ok(Desk::new(account_id, opening_balance, oracle, clock)?)
}

/// Parse the whole script, then apply it instruction by instruction.
///
/// Nothing is applied when any line fails to parse. One status line per
/// instruction is written to `out`.
pub fn run_script<O: PriceOracle, C: Clock + Clone>(
    desk: &mut Desk<O, C>,
    script: &str,
    out: &mut dyn Write,
) -> Result<Vec<AccountView>, TradeLedgerError> {
    let instructions = parse_script(script).map_err(|(line, source)| {
        let text = script.lines().nth(line - 1).unwrap_or_default();
        eprintln!("{}", source.display_with_context(text));
        TradeLedgerError::InstructionParse { line, source }
    })?;

    let mut views = Vec::with_capacity(instructions.len());
    for (line, instruction) in &instructions {
        let view = desk.apply(instruction);
        let status = if view.rejected { "rejected" } else { "ok" };
        writeln!(out, "{line:>4}  {status:<8}  {instruction}: {}", view.message)?;
        views.push(view);
    }
    Ok(views)
}

fn run_session(
    config_path: &Path,
    script_path: Option<&PathBuf>,
    history_path: Option<&PathBuf>,
) -> Result<ExitCode, TradeLedgerError> {
    eprintln!("Loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    let mut desk = build_desk(&config, config_path.parent(), SystemClock)?;
    info!(account = %desk.ledger().id(), "desk opened");

    let script = match script_path {
        Some(path) => {
            eprintln!("Reading instructions from {}", path.display());
            fs::read_to_string(path)?
        }
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let stdout = io::stdout();
    let views = run_script(&mut desk, &script, &mut stdout.lock())?;
    let rejected = views.iter().filter(|v| v.rejected).count();

    let summary = desk.show();
    eprintln!("\n=== Account Summary ===");
    eprintln!("Account:          {}", desk.ledger().id());
    eprintln!("Initial Deposit:  {:.2}", desk.ledger().initial_deposit());
    eprintln!("Balance:          {:.2}", summary.balance);
    eprintln!("Portfolio Value:  {}", format_amount(summary.portfolio_value));
    eprintln!("Profit/Loss:      {}", format_amount(summary.profit_loss));
    eprintln!("Holdings:         {}", summary.holdings.len());
    for (symbol, quantity) in &summary.holdings {
        eprintln!("  {symbol}: {quantity}");
    }
    eprintln!("Transactions:     {}", summary.transactions.len());
    eprintln!("Rejected:         {} of {}", rejected, views.len());

    if let Some(path) = history_path {
        csv_adapter::export_history(path, &summary.transactions)?;
        eprintln!("\nHistory written to: {}", path.display());
    }

    Ok(ExitCode::SUCCESS)
}

fn format_amount(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "unavailable".to_string(),
    }
}

fn run_quote(config_path: &Path, symbols: &[String]) -> Result<ExitCode, TradeLedgerError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;
    let oracle = build_oracle(&config, config_path.parent())?;

    let mut missing = 0;
    for symbol in symbols {
        let symbol = symbol.to_ascii_uppercase();
        match oracle.price(&symbol) {
            Ok(price) => println!("{symbol}\t{price:.2}"),
            Err(e) => {
                eprintln!("{symbol}: {e}");
                missing += 1;
            }
        }
    }

    if missing > 0 {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn run_validate(config_path: &Path) -> Result<ExitCode, TradeLedgerError> {
    eprintln!("Validating config: {}", config_path.display());
    let config = load_config(config_path)?;
    validate_config(&config)?;
    let oracle = build_oracle(&config, config_path.parent())?;

    let symbols = oracle.symbols();
    eprintln!("\nPrice table: {} symbols", symbols.len());
    for symbol in &symbols {
        if let Ok(price) = oracle.price(symbol) {
            eprintln!("  {symbol}: {price:.2}");
        }
    }
    match oracle.unknown_policy() {
        UnknownSymbolPolicy::Reject => eprintln!("Unknown symbols: rejected"),
        UnknownSymbolPolicy::Fallback(price) => {
            eprintln!("Unknown symbols: priced at {price:.2}")
        }
    }

    eprintln!("\nConfiguration is valid.");
    Ok(ExitCode::SUCCESS)
}
