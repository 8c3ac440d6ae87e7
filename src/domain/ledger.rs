//! Simulated trading ledger: cash, holdings and the trade log.
//!
//! Pure state-transition logic. Every operation validates before it mutates,
//! so a rejected order leaves cash, holdings and the log untouched. Prices
//! always arrive from the caller; the ledger performs no I/O.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

use super::error::VaultexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// One executed order. Append-only: entries are never edited or removed
/// except by [`Ledger::reset`].
#[derive(Debug, Clone, PartialEq)]
pub struct TradeLogEntry {
    pub timestamp: DateTime<Utc>,
    pub side: Side,
    pub symbol: String,
    pub quantity: i64,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerSettings {
    pub starting_balance: f64,
    pub funding_min: f64,
    pub funding_max: f64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            starting_balance: 25_000.0,
            funding_min: 100.0,
            funding_max: 1_000_000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ledger {
    cash: f64,
    settings: LedgerSettings,
    holdings: HashMap<String, i64>,
    log: Vec<TradeLogEntry>,
}

impl Ledger {
    pub fn new(settings: LedgerSettings) -> Self {
        Ledger {
            cash: settings.starting_balance,
            settings,
            holdings: HashMap::new(),
            log: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn starting_balance(&self) -> f64 {
        self.settings.starting_balance
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// Symbol -> quantity for every open position. Quantities are always > 0;
    /// a position sold down to zero is removed from the map.
    pub fn holdings(&self) -> &HashMap<String, i64> {
        &self.holdings
    }

    pub fn position(&self, symbol: &str) -> i64 {
        self.holdings.get(symbol).copied().unwrap_or(0)
    }

    pub fn log(&self) -> &[TradeLogEntry] {
        &self.log
    }

    /// Execute an order at `price`. Market and limit orders both settle
    /// immediately at the given price; the distinction is the caller's
    /// (a market order passes the last fetched quote, which may already be
    /// stale by confirmation time: accepted slippage, not an error).
    pub fn place_order(
        &mut self,
        side: Side,
        symbol: &str,
        quantity: i64,
        price: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<TradeLogEntry, VaultexError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(VaultexError::InvalidOrder {
                reason: "symbol must not be empty".into(),
            });
        }
        if quantity <= 0 {
            return Err(VaultexError::InvalidOrder {
                reason: format!("quantity must be positive, got {quantity}"),
            });
        }
        if !(price.is_finite() && price > 0.0) {
            return Err(VaultexError::InvalidOrder {
                reason: format!("price must be positive, got {price}"),
            });
        }

        let total = quantity as f64 * price;

        match side {
            Side::Buy => {
                if total > self.cash {
                    return Err(VaultexError::InsufficientFunds {
                        required: total,
                        available: self.cash,
                    });
                }
                self.cash -= total;
                *self.holdings.entry(symbol.clone()).or_insert(0) += quantity;
            }
            Side::Sell => {
                let held = self.position(&symbol);
                if held < quantity {
                    return Err(VaultexError::InsufficientPosition {
                        symbol,
                        held,
                        requested: quantity,
                    });
                }
                self.cash += total;
                let remaining = held - quantity;
                if remaining == 0 {
                    self.holdings.remove(&symbol);
                } else {
                    self.holdings.insert(symbol.clone(), remaining);
                }
            }
        }

        let entry = TradeLogEntry {
            timestamp,
            side,
            symbol,
            quantity,
            price,
        };
        self.log.push(entry.clone());
        Ok(entry)
    }

    /// Credit the wallet. The amount must fall inside the configured
    /// [funding_min, funding_max] range, bounds inclusive.
    pub fn add_funds(&mut self, amount: f64) -> Result<(), VaultexError> {
        if !amount.is_finite() || amount < self.settings.funding_min || amount > self.settings.funding_max {
            return Err(VaultexError::FundingOutOfRange {
                amount,
                min: self.settings.funding_min,
                max: self.settings.funding_max,
            });
        }
        self.cash += amount;
        Ok(())
    }

    /// Restore the starting balance and clear holdings and the trade log.
    pub fn reset(&mut self) {
        self.cash = self.settings.starting_balance;
        self.holdings.clear();
        self.log.clear();
    }

    /// Cash plus mark-to-market value of all holdings. A symbol missing from
    /// `prices` (quote failure) contributes zero rather than failing the
    /// whole valuation.
    pub fn net_worth(&self, prices: &HashMap<String, f64>) -> f64 {
        let position_value: f64 = self
            .holdings
            .iter()
            .filter_map(|(symbol, &quantity)| {
                prices.get(symbol).map(|&price| quantity as f64 * price)
            })
            .sum();
        self.cash + position_value
    }

    /// Absolute and percentage profit/loss against the starting balance.
    pub fn profit_loss(&self, net_worth: f64) -> (f64, f64) {
        let absolute = net_worth - self.settings.starting_balance;
        let percent = if self.settings.starting_balance > 0.0 {
            absolute / self.settings.starting_balance * 100.0
        } else {
            0.0
        };
        (absolute, percent)
    }
}
