//! CSV adapters: price tables in, transaction history out.
//!
//! Price tables have a header row and `symbol,price` records. History exports
//! use the header `timestamp,kind,symbol,quantity,price,value`.

use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use chrono::SecondsFormat;

use crate::domain::error::TradeLedgerError;
use crate::domain::transaction::Transaction;

/// Read a `symbol,price` table. `source` names the input in error messages.
pub fn read_prices<R: Read>(reader: R, source: &str) -> Result<HashMap<String, f64>, TradeLedgerError> {
    let table_error = |reason: String| TradeLedgerError::PriceTable {
        file: source.to_string(),
        reason,
    };

    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut prices = HashMap::new();

    for (idx, result) in rdr.records().enumerate() {
        let row = idx + 2;
        let record = result.map_err(|e| table_error(format!("CSV parse error: {}", e)))?;

        let symbol = record
            .get(0)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| table_error(format!("row {}: missing symbol", row)))?
            .to_ascii_uppercase();

        let price: f64 = record
            .get(1)
            .ok_or_else(|| table_error(format!("row {}: missing price", row)))?
            .parse()
            .map_err(|e| table_error(format!("row {}: invalid price: {}", row, e)))?;

        if !price.is_finite() || price <= 0.0 {
            return Err(table_error(format!(
                "row {}: price for {} must be positive",
                row, symbol
            )));
        }

        prices.insert(symbol, price);
    }

    Ok(prices)
}

pub fn load_prices<P: AsRef<Path>>(path: P) -> Result<HashMap<String, f64>, TradeLedgerError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| TradeLedgerError::PriceTable {
        file: path.display().to_string(),
        reason: format!("failed to read: {}", e),
    })?;
    read_prices(content.as_bytes(), &path.display().to_string())
}

pub fn write_history<W: Write>(writer: W, transactions: &[Transaction]) -> Result<(), TradeLedgerError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["timestamp", "kind", "symbol", "quantity", "price", "value"])
        .map_err(std::io::Error::other)?;

    for tx in transactions {
        wtr.write_record([
            tx.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            tx.kind.to_string(),
            tx.symbol.clone().unwrap_or_default(),
            tx.quantity.to_string(),
            tx.price.to_string(),
            tx.value().to_string(),
        ])
        .map_err(std::io::Error::other)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_history<P: AsRef<Path>>(path: P, transactions: &[Transaction]) -> Result<(), TradeLedgerError> {
    let file = fs::File::create(path)?;
    write_history(file, transactions)
}
