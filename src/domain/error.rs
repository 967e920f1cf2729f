//! Domain error types.

/// Top-level error type for adaptrader.
///
/// The analysis core itself only produces `DataInsufficient` and
/// `InvalidParameter`; the remaining variants belong to the configuration
/// and data adapters that feed it.
#[derive(Debug, thiserror::Error)]
pub enum AdaptraderError {
    #[error("insufficient data: have {bars} bars, need {minimum}")]
    DataInsufficient { bars: usize, minimum: usize },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("price data error: {reason}")]
    PriceData { reason: String },

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

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&AdaptraderError> for std::process::ExitCode {
    fn from(err: &AdaptraderError) -> Self {
        let code: u8 = match err {
            AdaptraderError::Io(_) => 1,
            AdaptraderError::ConfigParse { .. }
            | AdaptraderError::ConfigMissing { .. }
            | AdaptraderError::ConfigInvalid { .. } => 2,
            AdaptraderError::InvalidParameter { .. } => 3,
            AdaptraderError::PriceData { .. } => 4,
            AdaptraderError::DataInsufficient { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
