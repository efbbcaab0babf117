use crate::config::Profile;
use crate::types::HistoryRange;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Simulated crypto trading ledger
#[derive(Parser, Debug)]
#[command(name = "rust-trading-ledger")]
#[command(about = "Sign up, sign in and buy BTC or ETH against live prices", long_about = None)]
pub struct CliArgs {
    /// TOML configuration file
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Profile supplying default timeouts and paths
    #[arg(
        long = "profile",
        value_name = "PROFILE",
        default_value = "production",
        global = true,
        help = "Settings profile: 'test' for short timeouts or 'production'"
    )]
    pub profile: Profile,

    /// File holding the signed session token between invocations
    #[arg(
        long = "session",
        value_name = "FILE",
        default_value = ".ledger-session",
        global = true
    )]
    pub session_file: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Create an account funded with a signup bonus
    Signup {
        username: String,
        password: String,
        /// Accept the user agreement
        #[arg(long = "accept-agreement")]
        accept_agreement: bool,
    },

    /// Start a session
    Signin { username: String, password: String },

    /// End the current session
    Signout,

    /// Show balances and trade history
    Dashboard,

    /// Buy a coin at the current price
    Buy {
        /// BTC or ETH
        coin: String,
        /// USD to spend
        #[arg(allow_hyphen_values = true)]
        usd_amount: String,
        /// Coin to receive
        #[arg(allow_hyphen_values = true)]
        coin_amount: String,
    },

    /// Show current prices
    Prices,

    /// Write daily closes as CSV to stdout
    History {
        coin: String,
        /// week, month, quarter or year
        #[arg(long = "range", value_name = "RANGE", default_value = "month")]
        range: HistoryRange,
    },
}
