//! VoluGuard CLI - Terminal front end for the trading backend
//!
//! One-shot subcommands log in with the given token, render one view
//! and exit. `shell` keeps a session open and reads commands line by
//! line, with the same grammar minus the global flags.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;
use crate::domain::{Mood, OrderMode, PriceType, ProductType, TradeFilter, TransactionType, Validity};
use crate::usecases::order_ticket::{DEFAULT_QUANTITY, PLACEHOLDER_TOKEN};
use crate::usecases::CommonParams;

pub mod charts;
pub mod commands;
pub mod feed;
pub mod output;
pub mod shell;
pub mod views;

pub use commands::App;
pub use output::OutputFormat;

/// VoluGuard terminal
#[derive(Debug, Parser)]
#[command(name = "voluguard")]
#[command(about = "VoluGuard - option seller's terminal for the VoluGuard backend", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "VOLUGUARD_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Backend access token
    #[arg(short, long, env = "VOLUGUARD_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate the access token against the backend
    Login,

    /// Stream the live market feed for a while, then print the buffer
    Feed {
        /// How long to listen
        #[arg(short, long, default_value_t = 30)]
        seconds: u64,
    },

    /// Interactive session
    Shell,

    #[command(flatten)]
    View(ViewCommand),
}

/// Views and actions shared by one-shot mode and the shell
#[derive(Debug, Clone, Subcommand)]
pub enum ViewCommand {
    /// Market snapshot and strategy suggestion
    Dashboard {
        /// Use the live dashboard endpoint
        #[arg(long)]
        live: bool,
        /// Ignore the cached snapshot
        #[arg(long)]
        refresh: bool,
    },

    /// Volatility forecast
    Volatility,

    /// Volatility regime
    Regime,

    /// Strategy suggestions
    Strategies {
        /// Fetch details for every suggested strategy
        #[arg(long)]
        details: bool,
        /// Lots used for the details
        #[arg(long, default_value_t = 1)]
        lots: u32,
    },

    /// Place a suggested strategy with its proposed legs
    PlaceStrategy {
        /// Strategy name as suggested
        #[arg(short, long)]
        strategy: String,
        #[arg(long, default_value_t = 1)]
        lots: u32,
    },

    /// Full option chain with IV skew
    Chain {
        /// Ignore the cached chain
        #[arg(long)]
        refresh: bool,
    },

    /// Portfolio risk evaluation
    Risk {
        /// JSON file with the active trades (default: backend open trades)
        #[arg(long)]
        trades_file: Option<PathBuf>,
    },

    /// Trade log
    Trades {
        /// all, open or closed
        #[arg(short, long, default_value = "all")]
        status: TradeFilter,
    },

    /// Log a trade manually
    LogTrade(LogTradeArgs),

    /// Trading journal
    Journal {
        #[command(subcommand)]
        command: JournalCommand,
    },

    /// Place orders
    Order {
        #[command(subcommand)]
        command: OrderCommand,
    },

    /// Client-side request and feed metrics (Prometheus text format)
    Metrics,
}

impl ViewCommand {
    /// Metrics are local to the process; everything else talks to the backend.
    pub const fn requires_login(&self) -> bool {
        !matches!(self, Self::Metrics)
    }
}

#[derive(Debug, Clone, Args)]
pub struct LogTradeArgs {
    #[arg(long)]
    pub strategy: String,
    #[arg(long)]
    pub instrument: String,
    #[arg(long)]
    pub entry_price: f64,
    #[arg(long)]
    pub quantity: f64,
    #[arg(long, default_value_t = 0.0)]
    pub realized_pnl: f64,
    #[arg(long, default_value_t = 0.0)]
    pub unrealized_pnl: f64,
    #[arg(long, default_value_t = 0.0)]
    pub capital_used: f64,
    #[arg(long, default_value_t = 0.0)]
    pub potential_loss: f64,
    #[arg(long, default_value_t = 0.0)]
    pub vega: f64,
    /// Stop loss was hit
    #[arg(long)]
    pub sl_hit: bool,
    /// Log the trade as closed
    #[arg(long)]
    pub closed: bool,
}

/// Journal subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum JournalCommand {
    /// List journal entries
    List {
        /// Fetch again even after a failed load
        #[arg(long)]
        refresh: bool,
    },

    /// Add a journal entry
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        /// positive, neutral or negative
        #[arg(long, default_value = "neutral")]
        mood: Mood,
        /// Comma-separated tags
        #[arg(long, default_value = "")]
        tags: String,
    },
}

/// Fields shared by every order form
#[derive(Debug, Clone, Args)]
pub struct CommonOrderArgs {
    /// Instrument token (single-leg orders)
    #[arg(short, long)]
    pub instrument: Option<String>,
    /// BUY or SELL
    #[arg(long, default_value = "BUY")]
    pub side: TransactionType,
    #[arg(short, long, default_value_t = DEFAULT_QUANTITY)]
    pub quantity: u32,
    /// D (delivery), I (intraday), C (cover) or B (bracket)
    #[arg(long, default_value = "D")]
    pub product: ProductType,
    /// REGULAR or AMO
    #[arg(long, default_value = "REGULAR")]
    pub mode: OrderMode,
    /// DAY, IOC, GTD or GTC
    #[arg(long, default_value = "DAY")]
    pub validity: Validity,
}

impl CommonOrderArgs {
    pub fn to_params(&self) -> CommonParams {
        CommonParams {
            instrument_token: self
                .instrument
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_TOKEN.to_string()),
            transaction_type: self.side,
            quantity: self.quantity,
            product_type: self.product,
            order_mode: self.mode,
            validity: self.validity,
        }
    }
}

/// Order subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum OrderCommand {
    /// Single-leg order
    Single {
        #[command(flatten)]
        common: CommonOrderArgs,
        /// LIMIT or MARKET
        #[arg(long, default_value = "LIMIT")]
        price_type: PriceType,
        #[arg(long, default_value_t = 0.0)]
        price: f64,
        #[arg(long, default_value_t = 0.0)]
        trigger_price: f64,
    },

    /// Multi-leg order from `--leg` specs (or the shell's leg book)
    Multi {
        #[command(flatten)]
        common: CommonOrderArgs,
        /// TOKEN:SIDE:QTY[:PRICE_TYPE[:PRICE]]
        #[arg(long = "leg")]
        legs: Vec<String>,
    },

    /// Single-leg GTT order (LIMIT)
    Gtt {
        #[command(flatten)]
        common: CommonOrderArgs,
        #[arg(long, default_value_t = 0.0)]
        price: f64,
        #[arg(long)]
        trigger_price: f64,
        /// YYYY-MM-DD, at least tomorrow (default: a week from today)
        #[arg(long)]
        expiry: Option<NaiveDate>,
    },

    /// Multi-leg GTT order with a common trigger and expiry
    MultiGtt {
        #[command(flatten)]
        common: CommonOrderArgs,
        /// TOKEN:SIDE:QTY[:PRICE_TYPE[:PRICE]]
        #[arg(long = "leg")]
        legs: Vec<String>,
        #[arg(long)]
        trigger_price: f64,
        /// YYYY-MM-DD, at least tomorrow (default: a week from today)
        #[arg(long)]
        expiry: Option<NaiveDate>,
    },
}
