//! Rust Trading Ledger CLI
//!
//! Command-line front end for the simulated trading ledger.
//!
//! # Usage
//!
//! ```bash
//! export LEDGER_SESSION_SECRET=change-me
//! cargo run -- signup alice hunter22 --accept-agreement
//! cargo run -- signin alice hunter22
//! cargo run -- dashboard
//! cargo run -- buy btc 650 0.1
//! cargo run -- history eth --range quarter > eth.csv
//! cargo run -- signout
//! ```
//!
//! The session is kept as a signed token in a session file (`--session`,
//! default `.ledger-session`) between invocations. Logs go to stderr and are
//! filtered with `RUST_LOG`.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Fatal error (bad configuration, account store unavailable, etc.)
//! - 2: The request was rejected (validation failure, not signed in, etc.)

use anyhow::Context;
use rust_trading_ledger::cli::{self, CliArgs, Command};
use rust_trading_ledger::config::AppConfig;
use rust_trading_ledger::core::{SystemClock, TransactionEngine};
use rust_trading_ledger::io::{
    write_price_history_csv, HttpPriceOracle, JsonFileStore, SessionCodec,
};
use rust_trading_ledger::service::display::{format_coin, format_usd};
use rust_trading_ledger::service::{Outcome, TradingService};
use rust_trading_ledger::types::{Coin, Currency, Session};
use std::fs;
use std::path::Path;
use std::process;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

type Service = TradingService<JsonFileStore, HttpPriceOracle>;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rust_trading_ledger=debug"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    match run(args).await {
        Ok(true) => {}
        Ok(false) => process::exit(2),
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "request aborted");
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// Execute one command; `Ok(false)` means the request was rejected
async fn run(args: CliArgs) -> anyhow::Result<bool> {
    let config = AppConfig::load(args.profile, args.config.as_deref())?;
    tracing::debug!(
        profile = %config.profile,
        store = %config.store_path.display(),
        "configuration resolved"
    );

    let store = JsonFileStore::open_or_create(&config.store_path)?;
    let oracle = HttpPriceOracle::new(&config.price_api_base_url, config.price_fetch_timeout())?;
    let engine = TransactionEngine::new(
        store,
        oracle,
        config.engine_settings(),
        Arc::new(SystemClock),
    );
    let service = TradingService::new(engine);

    let codec = SessionCodec::new(&config.session_secret);
    let mut session = read_session(&codec, &args.session_file);

    let success = execute(&service, &mut session, args.command).await?;

    write_session(&codec, &args.session_file, &session)?;
    Ok(success)
}

async fn execute(
    service: &Service,
    session: &mut Session,
    command: Command,
) -> anyhow::Result<bool> {
    let success = match command {
        Command::Signup {
            username,
            password,
            accept_agreement,
        } => report(&service.create_account(&username, &password, accept_agreement)?),

        Command::Signin { username, password } => {
            report(&service.authenticate(session, &username, &password)?)
        }

        Command::Signout => report(&service.end_session(session)),

        Command::Dashboard => {
            let outcome = service.view_dashboard(session)?;
            if let Some(view) = &outcome.value {
                let prices = service.current_prices().await;
                let dashboard = &view.dashboard;

                println!("Signed in as {}", dashboard.username);
                for currency in Currency::ALL {
                    let balance = dashboard
                        .balances
                        .get(&currency)
                        .copied()
                        .unwrap_or_default();
                    let shown = match currency {
                        Currency::Usd => format_usd(balance),
                        _ => format_coin(balance),
                    };
                    println!("  {:<4}{}", currency.symbol(), shown);
                }
                println!("Prices");
                for coin in Coin::ALL {
                    println!("  {:<4}{}", coin.symbol(), format_usd(prices.for_coin(coin)));
                }
                println!("Transactions ({})", dashboard.transactions.len());
                for record in &dashboard.transactions {
                    println!(
                        "  {}  {} {} for {} at {}",
                        record.executed_at.format("%Y-%m-%d %H:%M:%S"),
                        format_coin(record.coin_amount),
                        record.coin,
                        format_usd(record.usd_amount),
                        format_usd(record.price_usd)
                    );
                }
            }
            report(&outcome)
        }

        Command::Buy {
            coin,
            usd_amount,
            coin_amount,
        } => report(
            &service
                .purchase(session, &coin, &usd_amount, &coin_amount)
                .await?,
        ),

        Command::Prices => {
            let prices = service.current_prices().await;
            for coin in Coin::ALL {
                println!("{:<4}{}", coin.symbol(), format_usd(prices.for_coin(coin)));
            }
            true
        }

        Command::History { coin, range } => {
            let outcome = service.price_history(&coin, range).await?;
            if let Some(points) = &outcome.value {
                let coin: Coin = coin.parse()?;
                let mut output = std::io::stdout();
                write_price_history_csv(coin, points, &mut output).map_err(anyhow::Error::msg)?;
            }
            report(&outcome)
        }
    };

    Ok(success)
}

/// Print an outcome's messages: stdout on success, stderr on rejection
fn report<T>(outcome: &Outcome<T>) -> bool {
    for message in &outcome.messages {
        if outcome.success {
            println!("{}", message);
        } else {
            eprintln!("{}", message);
        }
    }
    outcome.success
}

fn read_session(codec: &SessionCodec, path: &Path) -> Session {
    match fs::read_to_string(path) {
        Ok(token) => codec.decode(&token),
        Err(_) => Session::SignedOut,
    }
}

fn write_session(codec: &SessionCodec, path: &Path, session: &Session) -> anyhow::Result<()> {
    if !session.is_signed_in() {
        if path.exists() {
            fs::remove_file(path)
                .with_context(|| format!("cannot remove session file {}", path.display()))?;
        }
        return Ok(());
    }

    let token = codec.encode(session)?;
    fs::write(path, token)
        .with_context(|| format!("cannot write session file {}", path.display()))?;
    Ok(())
}
