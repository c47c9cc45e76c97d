//! Price oracle port.
//!
//! The ledger asks an oracle for the current price of a symbol during buy,
//! sell and valuation. Oracles are supplied by the caller on every call and
//! are never cached by the ledger.

use std::collections::HashMap;

/// Why an oracle could not produce a price.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PriceError {
    #[error("unknown symbol {symbol}")]
    UnknownSymbol { symbol: String },

    #[error("invalid price {price} for {symbol}")]
    InvalidPrice { symbol: String, price: f64 },

    #[error("price source unavailable for {symbol}: {reason}")]
    Unavailable { symbol: String, reason: String },
}

pub trait PriceOracle {
    /// Current price of one share of `symbol`.
    ///
    /// Implementations that talk to a slow source must bound the wait and
    /// report a timeout as [`PriceError::Unavailable`].
    fn price(&self, symbol: &str) -> Result<f64, PriceError>;
}

impl<F> PriceOracle for F
where
    F: Fn(&str) -> Result<f64, PriceError>,
{
    fn price(&self, symbol: &str) -> Result<f64, PriceError> {
        self(symbol)
    }
}

/// A plain price map is an oracle that knows nothing beyond its entries.
impl PriceOracle for HashMap<String, f64> {
    fn price(&self, symbol: &str) -> Result<f64, PriceError> {
        self.get(symbol)
            .copied()
            .ok_or_else(|| PriceError::UnknownSymbol {
                symbol: symbol.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_is_an_oracle() {
        let oracle = |symbol: &str| -> Result<f64, PriceError> {
            if symbol == "AAPL" {
                Ok(150.0)
            } else {
                Err(PriceError::UnknownSymbol {
                    symbol: symbol.to_string(),
                })
            }
        };
        assert_eq!(oracle.price("AAPL"), Ok(150.0));
        assert!(matches!(
            oracle.price("MSFT"),
            Err(PriceError::UnknownSymbol { symbol }) if symbol == "MSFT"
        ));
    }

    #[test]
    fn price_map_is_an_oracle() {
        let mut prices = HashMap::new();
        prices.insert("BHP".to_string(), 45.5);
        assert_eq!(prices.price("BHP"), Ok(45.5));
        assert!(prices.price("CBA").is_err());
    }

    #[test]
    fn dyn_oracle_through_reference() {
        let mut prices = HashMap::new();
        prices.insert("TSLA".to_string(), 700.0);
        let oracle: &dyn PriceOracle = &prices;
        assert_eq!(oracle.price("TSLA"), Ok(700.0));
    }

    #[test]
    fn error_messages() {
        let err = PriceError::Unavailable {
            symbol: "AAPL".into(),
            reason: "timed out after 2s".into(),
        };
        assert_eq!(
            err.to_string(),
            "price source unavailable for AAPL: timed out after 2s"
        );
    }
}
