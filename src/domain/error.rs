//! Domain error types.

/// Top-level error type for fvgtrader.
#[derive(Debug, thiserror::Error)]
pub enum FvgError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

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

    #[error("no data for {symbol} on {exchange}")]
    NoData { symbol: String, exchange: String },

    #[error("candle at {timestamp} does not follow previous candle at {previous}")]
    OutOfOrderCandle { previous: i64, timestamp: i64 },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&FvgError> for std::process::ExitCode {
    fn from(err: &FvgError) -> Self {
        let code: u8 = match err {
            FvgError::Io(_) | FvgError::Serialization(_) => 1,
            FvgError::ConfigParse { .. }
            | FvgError::ConfigMissing { .. }
            | FvgError::ConfigInvalid { .. } => 2,
            FvgError::Database { .. } | FvgError::DatabaseQuery { .. } => 3,
            FvgError::NoData { .. } => 5,
            FvgError::OutOfOrderCandle { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
