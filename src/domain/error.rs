//! Domain error types.

use crate::domain::ledger::LedgerError;
use crate::domain::portfolio::TreeError;
use crate::domain::series::SeriesError;

/// Top-level error type for papertrader.
#[derive(Debug, thiserror::Error)]
pub enum PapertraderError {
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

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&PapertraderError> for std::process::ExitCode {
    fn from(err: &PapertraderError) -> Self {
        let code: u8 = match err {
            PapertraderError::Io(_) => 1,
            PapertraderError::ConfigParse { .. }
            | PapertraderError::ConfigMissing { .. }
            | PapertraderError::ConfigInvalid { .. }
            | PapertraderError::UnknownStrategy { .. } => 2,
            PapertraderError::Data { .. } | PapertraderError::Series(_) => 3,
            PapertraderError::Tree(_) => 4,
            PapertraderError::Ledger(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
