//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::rss_news_adapter::RssNewsAdapter;
use crate::adapters::yahoo_quote_adapter::YahooQuoteAdapter;
use crate::domain::error::VaultexError;
use crate::domain::indicator::{RsiZone, rsi, sma};
use crate::domain::quote::{MarketSnapshot, Timeframe};
use crate::ports::news_port::NewsPort;
use crate::ports::quote_port::QuotePort;

#[derive(Parser, Debug)]
#[command(name = "vaultex", about = "Simulated trading terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web terminal
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print a market snapshot and indicators for a symbol
    Quote {
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value = "1d")]
        timeframe: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print latest news headlines for a symbol
    News {
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Output an argon2 hash for a password
    HashPassword,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::Quote {
            symbol,
            timeframe,
            config,
        } => run_quote(&symbol, &timeframe, config.as_ref()),
        Command::News { symbol, config } => run_news(&symbol, config.as_ref()),
        Command::HashPassword => run_hash_password(),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = VaultexError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn build_quote_adapter(config_path: Option<&PathBuf>) -> Result<YahooQuoteAdapter, ExitCode> {
    let adapter = match config_path {
        Some(path) => YahooQuoteAdapter::from_config(&load_config(path)?),
        None => YahooQuoteAdapter::new(),
    };
    adapter.map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn run_quote(symbol: &str, timeframe: &str, config_path: Option<&PathBuf>) -> ExitCode {
    let timeframe: Timeframe = match timeframe.parse() {
        Ok(tf) => tf,
        Err(reason) => {
            eprintln!("error: {reason} (expected one of 15m 1h 1d 5d 1mo 3mo 6mo 1y 5y)");
            return ExitCode::from(2);
        }
    };

    let adapter = match build_quote_adapter(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let symbol = symbol.trim().to_uppercase();
    eprintln!("Fetching {symbol} ({timeframe})...");

    let bars = match adapter.fetch_history(&symbol, timeframe) {
        Ok(bars) => bars,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let Some(snapshot) = MarketSnapshot::from_bars(&bars) else {
        let err = VaultexError::NoData { symbol };
        eprintln!("error: {err}");
        return (&err).into();
    };

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let rsi_value = rsi(&closes, 14);

    println!("=== {symbol} ({timeframe}) ===");
    println!("Last Price:    {:.2}", snapshot.last_price);
    println!(
        "Change:        {:+.2} ({:+.2}%)",
        snapshot.change, snapshot.change_pct
    );
    println!(
        "Sentiment:     {}",
        if snapshot.bullish { "BULLISH" } else { "BEARISH" }
    );
    println!("Range High:    {:.2}", snapshot.range_high);
    println!("Range Low:     {:.2}", snapshot.range_low);
    println!("Avg Volume:    {:.0}", snapshot.avg_volume);
    println!("Period Return: {:+.2}%", snapshot.period_return_pct);
    println!("Volatility:    {:.2}%", snapshot.volatility_pct);

    println!("\n=== Indicators ===");
    match sma(&closes, 20) {
        Some(v) => println!("SMA(20):       {v:.2}"),
        None => println!("SMA(20):       N/A"),
    }
    match sma(&closes, 50) {
        Some(v) => println!("SMA(50):       {v:.2}"),
        None => println!("SMA(50):       N/A"),
    }
    println!("RSI(14):       {:.2} ({})", rsi_value, RsiZone::of(rsi_value));

    eprintln!("\n{} bars fetched", bars.len());
    ExitCode::SUCCESS
}

fn run_news(symbol: &str, config_path: Option<&PathBuf>) -> ExitCode {
    let adapter = match config_path {
        Some(path) => match load_config(path) {
            Ok(config) => RssNewsAdapter::from_config(&config),
            Err(code) => return code,
        },
        None => RssNewsAdapter::new(),
    };
    let adapter = match adapter {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let symbol = symbol.trim().to_uppercase();
    let items = match adapter.fetch_feed(&symbol) {
        Ok(items) => items,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if items.is_empty() {
        eprintln!("No recent news available for {symbol}");
        return ExitCode::SUCCESS;
    }

    for item in &items {
        match &item.published {
            Some(published) => println!("{}  [{}]", item.title, published),
            None => println!("{}", item.title),
        }
        println!("  {}", item.link);
    }
    eprintln!("\n{} headlines", items.len());
    ExitCode::SUCCESS
}

fn run_serve(config_path: &PathBuf) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router, new_ledger_store};
        use crate::ports::config_port::ConfigPort;
        use std::net::SocketAddr;
        use std::sync::Arc;

        eprintln!("Loading config from {}", config_path.display());
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(code) => return code,
        };

        let quote_port = match YahooQuoteAdapter::from_config(&config) {
            Ok(a) => Arc::new(a) as Arc<dyn QuotePort + Send + Sync>,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        let news_port = match RssNewsAdapter::from_config(&config) {
            Ok(a) => Arc::new(a) as Arc<dyn NewsPort + Send + Sync>,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };

        let addr: SocketAddr = config
            .get_string("web", "listen")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string())
            .parse()
            .unwrap_or_else(|_| "127.0.0.1:3000".parse().unwrap());

        eprintln!("Starting web terminal on {addr}");

        let state = AppState {
            quote_port,
            news_port,
            config: Arc::new(config),
            ledgers: new_ledger_store(),
        };

        tokio::runtime::Runtime::new().unwrap().block_on(async {
            let router = build_router(state).await;
            let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
            axum::serve(listener, router).await.unwrap();
        });

        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}

fn run_hash_password() -> ExitCode {
    #[cfg(feature = "web")]
    {
        use argon2::{
            Algorithm, Argon2, Params, PasswordHasher, Version, password_hash::SaltString,
        };
        use rand::rngs::OsRng;
        use std::io::{self, BufRead};

        eprintln!("Enter password to hash:");
        let stdin = io::stdin();
        let password = stdin
            .lock()
            .lines()
            .next()
            .unwrap_or(Ok(String::new()))
            .unwrap_or_default();

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());
        match argon2.hash_password(password.as_bytes(), &salt) {
            Ok(hash) => {
                println!("{hash}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: failed to hash password: {e}");
                ExitCode::from(1)
            }
        }
    }

    #[cfg(not(feature = "web"))]
    {
        eprintln!("error: web feature is required for hash-password");
        ExitCode::from(1)
    }
}
