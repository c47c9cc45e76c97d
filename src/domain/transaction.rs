//! Immutable transaction records posted by the ledger.

use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    Buy,
    Sell,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdraw => "withdraw",
            TransactionKind::Buy => "buy",
            TransactionKind::Sell => "sell",
        }
    }

    /// Cash movements carry no symbol and no quantity.
    pub fn is_cash(self) -> bool {
        matches!(self, TransactionKind::Deposit | TransactionKind::Withdraw)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One posted operation.
///
/// For deposits and withdrawals `symbol` is `None`, `quantity` is 0 and
/// `price` holds the amount moved. For buys and sells `price` is the
/// per-share price the oracle quoted at posting time.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub timestamp: DateTime<Utc>,
    pub symbol: Option<String>,
    pub quantity: i64,
    pub price: f64,
}

impl Transaction {
    pub fn cash(kind: TransactionKind, timestamp: DateTime<Utc>, amount: f64) -> Self {
        Transaction {
            kind,
            timestamp,
            symbol: None,
            quantity: 0,
            price: amount,
        }
    }

    pub fn trade(
        kind: TransactionKind,
        timestamp: DateTime<Utc>,
        symbol: &str,
        quantity: i64,
        price: f64,
    ) -> Self {
        Transaction {
            kind,
            timestamp,
            symbol: Some(symbol.to_string()),
            quantity,
            price,
        }
    }

    /// Cash moved by this record.
    pub fn value(&self) -> f64 {
        if self.kind.is_cash() {
            self.price
        } else {
            self.quantity as f64 * self.price
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = self.timestamp.format("%Y-%m-%d %H:%M:%S");
        match &self.symbol {
            Some(symbol) => write!(
                f,
                "{ts}  {:<8} {} x{} @ {:.2}",
                self.kind, symbol, self.quantity, self.price
            ),
            None => write!(f, "{ts}  {:<8} {:.2}", self.kind, self.price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn cash_record_has_no_symbol() {
        let tx = Transaction::cash(TransactionKind::Deposit, ts(), 250.0);
        assert_eq!(tx.symbol, None);
        assert_eq!(tx.quantity, 0);
        assert!((tx.value() - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn trade_value_is_price_times_quantity() {
        let tx = Transaction::trade(TransactionKind::Buy, ts(), "AAPL", 3, 150.0);
        assert_eq!(tx.symbol.as_deref(), Some("AAPL"));
        assert!((tx.value() - 450.0).abs() < f64::EPSILON);
    }

    #[test]
    fn kind_classification() {
        assert!(TransactionKind::Deposit.is_cash());
        assert!(TransactionKind::Withdraw.is_cash());
        assert!(!TransactionKind::Buy.is_cash());
        assert!(!TransactionKind::Sell.is_cash());
    }

    #[test]
    fn display_formats() {
        let buy = Transaction::trade(TransactionKind::Buy, ts(), "TSLA", 2, 700.0);
        assert_eq!(buy.to_string(), "2024-01-15 09:30:00  buy      TSLA x2 @ 700.00");

        let withdraw = Transaction::cash(TransactionKind::Withdraw, ts(), 12.5);
        assert_eq!(withdraw.to_string(), "2024-01-15 09:30:00  withdraw 12.50");
    }
}
