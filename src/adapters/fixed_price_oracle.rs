//! Table-driven price oracle.

use std::collections::HashMap;

use crate::ports::price_port::{PriceError, PriceOracle};

/// What to quote for a symbol missing from the table.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum UnknownSymbolPolicy {
    #[default]
    Reject,
    Fallback(f64),
}

/// Prices looked up in a fixed symbol table.
#[derive(Debug, Clone, Default)]
pub struct FixedPriceOracle {
    prices: HashMap<String, f64>,
    unknown: UnknownSymbolPolicy,
}

pub const REFERENCE_PRICES: [(&str, f64); 3] =
    [("AAPL", 150.0), ("TSLA", 700.0), ("GOOGL", 2500.0)];
pub const REFERENCE_DEFAULT_PRICE: f64 = 100.0;

impl FixedPriceOracle {
    pub fn new(prices: HashMap<String, f64>, unknown: UnknownSymbolPolicy) -> Self {
        FixedPriceOracle { prices, unknown }
    }

    /// The test oracle: AAPL 150, TSLA 700, GOOGL 2500, anything else 100.
    pub fn reference() -> Self {
        let prices = REFERENCE_PRICES
            .iter()
            .map(|&(symbol, price)| (symbol.to_string(), price))
            .collect();
        FixedPriceOracle {
            prices,
            unknown: UnknownSymbolPolicy::Fallback(REFERENCE_DEFAULT_PRICE),
        }
    }

    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.set_price(symbol, price);
        self
    }

    /// Symbols are stored upper-cased.
    pub fn set_price(&mut self, symbol: &str, price: f64) {
        self.prices.insert(symbol.to_ascii_uppercase(), price);
    }

    pub fn set_unknown_policy(&mut self, unknown: UnknownSymbolPolicy) {
        self.unknown = unknown;
    }

    pub fn unknown_policy(&self) -> UnknownSymbolPolicy {
        self.unknown
    }

    /// Known symbols, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.prices.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

impl PriceOracle for FixedPriceOracle {
    fn price(&self, symbol: &str) -> Result<f64, PriceError> {
        if let Some(&price) = self.prices.get(symbol) {
            return Ok(price);
        }
        match self.unknown {
            UnknownSymbolPolicy::Fallback(price) => Ok(price),
            UnknownSymbolPolicy::Reject => Err(PriceError::UnknownSymbol {
                symbol: symbol.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_prices() {
        let oracle = FixedPriceOracle::reference();
        assert_eq!(oracle.price("AAPL"), Ok(150.0));
        assert_eq!(oracle.price("TSLA"), Ok(700.0));
        assert_eq!(oracle.price("GOOGL"), Ok(2500.0));
    }

    #[test]
    fn reference_falls_back_for_unknown() {
        let oracle = FixedPriceOracle::reference();
        assert_eq!(oracle.price("MSFT"), Ok(100.0));
    }

    #[test]
    fn default_policy_rejects_unknown() {
        let oracle = FixedPriceOracle::default().with_price("BHP", 45.0);
        assert_eq!(oracle.unknown_policy(), UnknownSymbolPolicy::Reject);
        assert_eq!(oracle.price("BHP"), Ok(45.0));
        assert_eq!(
            oracle.price("CBA"),
            Err(PriceError::UnknownSymbol {
                symbol: "CBA".into()
            })
        );
    }

    #[test]
    fn set_price_upper_cases_and_overrides() {
        let mut oracle = FixedPriceOracle::reference();
        oracle.set_price("aapl", 155.5);
        assert_eq!(oracle.price("AAPL"), Ok(155.5));
        assert_eq!(oracle.symbols(), vec!["AAPL", "GOOGL", "TSLA"]);
    }

    #[test]
    fn switch_policy() {
        let mut oracle = FixedPriceOracle::reference();
        oracle.set_unknown_policy(UnknownSymbolPolicy::Reject);
        assert!(oracle.price("MSFT").is_err());
    }
}
