//! Domain error types.

use crate::ports::price_port::PriceError;

/// A parse error with position information for instruction scripts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Rejections raised by ledger operations.
///
/// A ledger that returns any of these is left exactly as it was before the
/// call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid amount {amount}: {reason}")]
    InvalidAmount { amount: f64, reason: &'static str },

    #[error("invalid quantity {quantity}: must be positive")]
    InvalidQuantity { quantity: i64 },

    #[error("invalid symbol: must not be empty")]
    InvalidSymbol,

    #[error("insufficient funds: need {required:.2}, have {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("insufficient shares of {symbol}: requested {requested}, held {held}")]
    InsufficientShares {
        symbol: String,
        requested: i64,
        held: i64,
    },

    #[error("price unavailable for {symbol}: {source}")]
    PriceUnavailable { symbol: String, source: PriceError },
}

/// Top-level error type for tradeledger.
#[derive(Debug, thiserror::Error)]
pub enum TradeLedgerError {
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

    #[error("price table error in {file}: {reason}")]
    PriceTable { file: String, reason: String },

    #[error("line {line}: {source}")]
    InstructionParse { line: usize, source: ParseError },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradeLedgerError {
    /// Process exit status for this error category.
    pub fn exit_status(&self) -> u8 {
        match self {
            TradeLedgerError::Io(_) | TradeLedgerError::PriceTable { .. } => 1,
            TradeLedgerError::ConfigParse { .. }
            | TradeLedgerError::ConfigMissing { .. }
            | TradeLedgerError::ConfigInvalid { .. } => 2,
            TradeLedgerError::InstructionParse { .. } => 4,
            TradeLedgerError::Ledger(_) => 5,
        }
    }
}

impl From<&TradeLedgerError> for std::process::ExitCode {
    fn from(err: &TradeLedgerError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
