//! Domain error types.

/// Top-level error type for vaultex.
///
/// Everything here is recoverable by user retry; nothing is fatal to the
/// process. The engine never logs or renders; the CLI and web boundaries
/// map these to messaging.
#[derive(Debug, thiserror::Error)]
pub enum VaultexError {
    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },

    #[error("insufficient funds: order costs {required:.2}, wallet holds {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("insufficient position: holding {held} {symbol}, tried to sell {requested}")]
    InsufficientPosition {
        symbol: String,
        held: i64,
        requested: i64,
    },

    #[error("funding amount {amount:.2} outside allowed range {min:.2}..{max:.2}")]
    FundingOutOfRange { amount: f64, min: f64, max: f64 },

    #[error("quote fetch failed for {symbol}: {reason}")]
    QuoteFetch { symbol: String, reason: String },

    #[error("news fetch failed for {symbol}: {reason}")]
    NewsFetch { symbol: String, reason: String },

    #[error("no market data for {symbol}")]
    NoData { symbol: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("failed to build HTTP client: {reason}")]
    HttpClient { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&VaultexError> for std::process::ExitCode {
    fn from(err: &VaultexError) -> Self {
        let code: u8 = match err {
            VaultexError::Io(_) | VaultexError::HttpClient { .. } => 1,
            VaultexError::ConfigParse { .. }
            | VaultexError::ConfigMissing { .. }
            | VaultexError::ConfigInvalid { .. } => 2,
            VaultexError::QuoteFetch { .. }
            | VaultexError::NewsFetch { .. }
            | VaultexError::NoData { .. } => 3,
            VaultexError::InvalidOrder { .. }
            | VaultexError::InsufficientFunds { .. }
            | VaultexError::InsufficientPosition { .. }
            | VaultexError::FundingOutOfRange { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
