//! Account ledger: cash balance, share holdings and transaction history.
//!
//! Every mutating operation validates its inputs, consults the price oracle
//! where needed, and only then touches state. A rejected operation leaves
//! balance, holdings and history exactly as they were.

use std::collections::BTreeMap;

use tracing::debug;

use super::error::LedgerError;
use super::transaction::{Transaction, TransactionKind};
use crate::ports::clock_port::Clock;
use crate::ports::price_port::{PriceError, PriceOracle};

#[derive(Debug, Clone)]
pub struct Ledger<C> {
    id: String,
    balance: f64,
    initial_deposit: f64,
    holdings: BTreeMap<String, i64>,
    transactions: Vec<Transaction>,
    clock: C,
}

impl<C: Clock> Ledger<C> {
    /// Open a ledger with a non-negative opening balance.
    ///
    /// The opening balance becomes the profit/loss baseline. Opening does not
    /// post a transaction.
    pub fn new(id: impl Into<String>, opening_balance: f64, clock: C) -> Result<Self, LedgerError> {
        if !opening_balance.is_finite() || opening_balance < 0.0 {
            return Err(LedgerError::InvalidAmount {
                amount: opening_balance,
                reason: "opening balance must be non-negative",
            });
        }
        let id = id.into();
        debug!(account = %id, opening_balance, "ledger opened");
        Ok(Ledger {
            id,
            balance: opening_balance,
            initial_deposit: opening_balance,
            holdings: BTreeMap::new(),
            transactions: Vec::new(),
            clock,
        })
    }

    pub fn deposit(&mut self, amount: f64) -> Result<&Transaction, LedgerError> {
        if let Err(e) = check_positive(amount, "deposit amount must be positive") {
            return Err(self.reject(TransactionKind::Deposit, e));
        }
        let balance = self.balance + amount;
        if !balance.is_finite() {
            let e = LedgerError::InvalidAmount {
                amount,
                reason: "deposit would overflow the balance",
            };
            return Err(self.reject(TransactionKind::Deposit, e));
        }
        self.balance = balance;
        debug!(account = %self.id, amount, balance = self.balance, "deposit posted");
        Ok(self.post_cash(TransactionKind::Deposit, amount))
    }

    /// Withdraw cash. Never performs a partial withdrawal.
    pub fn withdraw(&mut self, amount: f64) -> Result<&Transaction, LedgerError> {
        if let Err(e) = check_positive(amount, "withdrawal amount must be positive") {
            return Err(self.reject(TransactionKind::Withdraw, e));
        }
        if self.balance < amount {
            let e = LedgerError::InsufficientFunds {
                required: amount,
                available: self.balance,
            };
            return Err(self.reject(TransactionKind::Withdraw, e));
        }
        self.balance -= amount;
        debug!(account = %self.id, amount, balance = self.balance, "withdraw posted");
        Ok(self.post_cash(TransactionKind::Withdraw, amount))
    }

    /// Buy `quantity` shares of `symbol` at the oracle's current price.
    pub fn buy(
        &mut self,
        symbol: &str,
        quantity: i64,
        oracle: &dyn PriceOracle,
    ) -> Result<&Transaction, LedgerError> {
        let price = match self.check_buy(symbol, quantity, oracle) {
            Ok(price) => price,
            Err(e) => return Err(self.reject(TransactionKind::Buy, e)),
        };

        self.balance -= price * quantity as f64;
        *self.holdings.entry(symbol.to_string()).or_insert(0) += quantity;
        debug!(
            account = %self.id,
            symbol,
            quantity,
            price,
            balance = self.balance,
            "buy posted"
        );
        Ok(self.post_trade(TransactionKind::Buy, symbol, quantity, price))
    }

    fn check_buy(
        &self,
        symbol: &str,
        quantity: i64,
        oracle: &dyn PriceOracle,
    ) -> Result<f64, LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity { quantity });
        }
        if symbol.trim().is_empty() {
            return Err(LedgerError::InvalidSymbol);
        }
        let held = self.quantity_of(symbol);
        if held.checked_add(quantity).is_none() {
            return Err(LedgerError::InvalidQuantity { quantity });
        }

        let price = quote(oracle, symbol)?;
        let cost = price * quantity as f64;
        if !cost.is_finite() || self.balance < cost {
            return Err(LedgerError::InsufficientFunds {
                required: cost,
                available: self.balance,
            });
        }
        Ok(price)
    }

    /// Sell `quantity` held shares of `symbol` at the oracle's current price.
    ///
    /// Share availability is checked before the oracle is consulted. A holding
    /// that reaches zero is removed.
    pub fn sell(
        &mut self,
        symbol: &str,
        quantity: i64,
        oracle: &dyn PriceOracle,
    ) -> Result<&Transaction, LedgerError> {
        let price = match self.check_sell(symbol, quantity, oracle) {
            Ok(price) => price,
            Err(e) => return Err(self.reject(TransactionKind::Sell, e)),
        };

        self.balance += price * quantity as f64;
        let remaining = self.quantity_of(symbol) - quantity;
        if remaining == 0 {
            self.holdings.remove(symbol);
        } else {
            self.holdings.insert(symbol.to_string(), remaining);
        }
        debug!(
            account = %self.id,
            symbol,
            quantity,
            price,
            balance = self.balance,
            "sell posted"
        );
        Ok(self.post_trade(TransactionKind::Sell, symbol, quantity, price))
    }

    fn check_sell(
        &self,
        symbol: &str,
        quantity: i64,
        oracle: &dyn PriceOracle,
    ) -> Result<f64, LedgerError> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity { quantity });
        }
        let held = self.quantity_of(symbol);
        if held < quantity {
            return Err(LedgerError::InsufficientShares {
                symbol: symbol.to_string(),
                requested: quantity,
                held,
            });
        }

        let price = quote(oracle, symbol)?;
        if !(self.balance + price * quantity as f64).is_finite() {
            return Err(LedgerError::PriceUnavailable {
                symbol: symbol.to_string(),
                source: PriceError::InvalidPrice {
                    symbol: symbol.to_string(),
                    price,
                },
            });
        }
        Ok(price)
    }

    fn reject(&self, kind: TransactionKind, err: LedgerError) -> LedgerError {
        debug!(account = %self.id, operation = %kind, error = %err, "operation rejected");
        err
    }

    fn post_cash(&mut self, kind: TransactionKind, amount: f64) -> &Transaction {
        let timestamp = self.next_timestamp();
        self.push(Transaction::cash(kind, timestamp, amount))
    }

    fn post_trade(
        &mut self,
        kind: TransactionKind,
        symbol: &str,
        quantity: i64,
        price: f64,
    ) -> &Transaction {
        let timestamp = self.next_timestamp();
        self.push(Transaction::trade(kind, timestamp, symbol, quantity, price))
    }

    fn push(&mut self, tx: Transaction) -> &Transaction {
        self.transactions.push(tx);
        &self.transactions[self.transactions.len() - 1]
    }

    /// Clock time, held back to the previous posting if the clock stepped
    /// backwards.
    fn next_timestamp(&self) -> chrono::DateTime<chrono::Utc> {
        let now = self.clock.now();
        match self.transactions.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        }
    }
}

impl<C> Ledger<C> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn initial_deposit(&self) -> f64 {
        self.initial_deposit
    }

    /// Shares held of `symbol`, 0 when absent.
    pub fn quantity_of(&self, symbol: &str) -> i64 {
        self.holdings.get(symbol).copied().unwrap_or(0)
    }

    /// Cash plus the market value of every holding.
    ///
    /// Fails as a whole if any held symbol cannot be priced.
    pub fn portfolio_value(&self, oracle: &dyn PriceOracle) -> Result<f64, LedgerError> {
        self.holdings
            .iter()
            .try_fold(self.balance, |total, (symbol, &quantity)| {
                quote(oracle, symbol).map(|price| total + price * quantity as f64)
            })
    }

    pub fn profit_loss(&self, oracle: &dyn PriceOracle) -> Result<f64, LedgerError> {
        Ok(self.portfolio_value(oracle)? - self.initial_deposit)
    }

    pub fn holdings_snapshot(&self) -> BTreeMap<String, i64> {
        self.holdings.clone()
    }

    pub fn transaction_history(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }
}

fn check_positive(amount: f64, reason: &'static str) -> Result<(), LedgerError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount { amount, reason })
    }
}

/// Ask the oracle once and insist on a positive, finite price.
fn quote(oracle: &dyn PriceOracle, symbol: &str) -> Result<f64, LedgerError> {
    let price = oracle
        .price(symbol)
        .map_err(|source| LedgerError::PriceUnavailable {
            symbol: symbol.to_string(),
            source,
        })?;
    if !price.is_finite() || price <= 0.0 {
        return Err(LedgerError::PriceUnavailable {
            symbol: symbol.to_string(),
            source: PriceError::InvalidPrice {
                symbol: symbol.to_string(),
                price,
            },
        });
    }
    Ok(price)
}
