//! Technical indicators over an ordered close-price sequence.
//!
//! Stateless pure functions: the dashboard recomputes them on demand from
//! whatever history the quote source returned.

pub mod rsi;
pub mod sma;

pub use rsi::{rsi, RsiZone};
pub use sma::sma;
