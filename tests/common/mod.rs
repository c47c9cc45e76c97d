#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use tradeledger::adapters::clock::SteppingClock;
use tradeledger::adapters::fixed_price_oracle::FixedPriceOracle;
use tradeledger::domain::ledger::Ledger;
use tradeledger::ports::price_port::PriceError;

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
}

pub fn clock() -> SteppingClock {
    SteppingClock::new(start(), Duration::seconds(1))
}

pub fn ledger(opening: f64) -> Ledger<SteppingClock> {
    Ledger::new("user1", opening, clock()).unwrap()
}

pub fn reference_oracle() -> FixedPriceOracle {
    FixedPriceOracle::reference()
}

pub fn price_map(entries: &[(&str, f64)]) -> HashMap<String, f64> {
    entries
        .iter()
        .map(|&(symbol, price)| (symbol.to_string(), price))
        .collect()
}

pub fn offline(symbol: &str) -> Result<f64, PriceError> {
    Err(PriceError::Unavailable {
        symbol: symbol.to_string(),
        reason: "feed offline".to_string(),
    })
}
