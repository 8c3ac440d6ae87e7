//! Quote source port trait.

use crate::domain::error::VaultexError;
use crate::domain::quote::{OhlcvBar, Timeframe};

/// Price history provider. Missing data is `Ok` and empty, not an error;
/// transport failures surface as [`VaultexError::QuoteFetch`] and callers
/// at the valuation boundary degrade the affected symbol to zero.
pub trait QuotePort {
    fn fetch_history(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<OhlcvBar>, VaultexError>;

    fn last_price(&self, symbol: &str) -> Result<Option<f64>, VaultexError> {
        Ok(self
            .fetch_history(symbol, Timeframe::D1)?
            .last()
            .map(|bar| bar.close))
    }
}
