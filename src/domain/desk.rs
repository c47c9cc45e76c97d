//! Trading desk: the caller-facing surface over a single ledger.
//!
//! A desk owns one ledger together with the oracle that prices it, applies
//! operations, and renders an [`AccountView`] after each one so a front-end
//! can show the status message, balance, valuation, holdings and history in
//! one go. Rejections become the view's message; the desk itself never fails
//! on a rejected operation.

use std::collections::BTreeMap;
use std::fmt;

use tracing::info;

use super::error::LedgerError;
use super::instruction::Instruction;
use super::ledger::Ledger;
use super::transaction::Transaction;
use crate::ports::clock_port::Clock;
use crate::ports::price_port::PriceOracle;

#[derive(Debug, Clone, PartialEq)]
pub struct AccountView {
    pub message: String,
    /// True when the operation behind this view was rejected.
    pub rejected: bool,
    pub balance: f64,
    /// `None` when a held symbol could not be priced.
    pub portfolio_value: Option<f64>,
    pub profit_loss: Option<f64>,
    pub holdings: BTreeMap<String, i64>,
    pub transactions: Vec<Transaction>,
}

impl fmt::Display for AccountView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message)?;
        writeln!(f, "  Balance:          {:.2}", self.balance)?;
        match self.portfolio_value {
            Some(v) => writeln!(f, "  Portfolio Value:  {v:.2}")?,
            None => writeln!(f, "  Portfolio Value:  unavailable")?,
        }
        match self.profit_loss {
            Some(pl) => {
                let sign = if pl >= 0.0 { "+" } else { "" };
                writeln!(f, "  Profit/Loss:      {sign}{pl:.2}")?
            }
            None => writeln!(f, "  Profit/Loss:      unavailable")?,
        }
        if self.holdings.is_empty() {
            write!(f, "  Holdings:         none")
        } else {
            let holdings: Vec<String> = self
                .holdings
                .iter()
                .map(|(symbol, quantity)| format!("{symbol} x{quantity}"))
                .collect();
            write!(f, "  Holdings:         {}", holdings.join(", "))
        }
    }
}

#[derive(Debug)]
pub struct Desk<O, C> {
    ledger: Ledger<C>,
    oracle: O,
    clock: C,
}

impl<O: PriceOracle, C: Clock + Clone> Desk<O, C> {
    pub fn new(
        account_id: impl Into<String>,
        opening_balance: f64,
        oracle: O,
        clock: C,
    ) -> Result<Self, LedgerError> {
        let ledger = Ledger::new(account_id, opening_balance, clock.clone())?;
        Ok(Desk {
            ledger,
            oracle,
            clock,
        })
    }

    pub fn ledger(&self) -> &Ledger<C> {
        &self.ledger
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Replace the ledger with a fresh one under the same account id.
    ///
    /// A rejected opening balance keeps the current ledger.
    pub fn create_account(&mut self, opening_balance: f64) -> AccountView {
        let id = self.ledger.id().to_string();
        match Ledger::new(id, opening_balance, self.clock.clone()) {
            Ok(ledger) => {
                info!(account = %ledger.id(), opening_balance, "account reopened");
                self.ledger = ledger;
                self.view(format!(
                    "Account created with initial deposit: {opening_balance:?}"
                ))
            }
            Err(e) => self.rejected(e),
        }
    }

    pub fn deposit(&mut self, amount: f64) -> AccountView {
        match self.ledger.deposit(amount) {
            Ok(_) => self.view(format!("Deposited: {amount:?}")),
            Err(e) => self.rejected(e),
        }
    }

    pub fn withdraw(&mut self, amount: f64) -> AccountView {
        match self.ledger.withdraw(amount) {
            Ok(_) => self.view(format!("Withdrew: {amount:?}")),
            Err(e) => self.rejected(e),
        }
    }

    pub fn buy(&mut self, symbol: &str, quantity: i64) -> AccountView {
        match self.ledger.buy(symbol, quantity, &self.oracle) {
            Ok(_) => self.view(format!("Bought {quantity} shares of {symbol}")),
            Err(e) => self.rejected(e),
        }
    }

    pub fn sell(&mut self, symbol: &str, quantity: i64) -> AccountView {
        match self.ledger.sell(symbol, quantity, &self.oracle) {
            Ok(_) => self.view(format!("Sold {quantity} shares of {symbol}")),
            Err(e) => self.rejected(e),
        }
    }

    pub fn show(&self) -> AccountView {
        self.view("Account information updated".to_string())
    }

    pub fn apply(&mut self, instruction: &Instruction) -> AccountView {
        match instruction {
            Instruction::Create { opening_balance } => self.create_account(*opening_balance),
            Instruction::Deposit { amount } => self.deposit(*amount),
            Instruction::Withdraw { amount } => self.withdraw(*amount),
            Instruction::Buy { symbol, quantity } => self.buy(symbol, *quantity),
            Instruction::Sell { symbol, quantity } => self.sell(symbol, *quantity),
            Instruction::Show => self.show(),
        }
    }

    fn rejected(&self, err: LedgerError) -> AccountView {
        let mut view = self.view(err.to_string());
        view.rejected = true;
        view
    }

    /// Values the account once so P/L and portfolio value agree.
    fn view(&self, message: String) -> AccountView {
        let portfolio_value = self.ledger.portfolio_value(&self.oracle).ok();
        AccountView {
            message,
            rejected: false,
            balance: self.ledger.balance(),
            portfolio_value,
            profit_loss: portfolio_value.map(|v| v - self.ledger.initial_deposit()),
            holdings: self.ledger.holdings_snapshot(),
            transactions: self.ledger.transaction_history(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::price_port::PriceError;
    use chrono::{DateTime, TimeZone, Utc};
    use std::cell::Cell;
    use std::collections::HashMap;

    #[derive(Debug, Clone)]
    struct StillClock;

    impl Clock for StillClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
        }
    }

    fn desk(opening: f64) -> Desk<HashMap<String, f64>, StillClock> {
        let mut prices = HashMap::new();
        prices.insert("AAPL".to_string(), 150.0);
        prices.insert("GOOGL".to_string(), 2500.0);
        Desk::new("user1", opening, prices, StillClock).unwrap()
    }

    #[test]
    fn new_desk_rejects_negative_opening() {
        let result = Desk::new("user1", -10.0, HashMap::<String, f64>::new(), StillClock);
        assert!(matches!(result, Err(LedgerError::InvalidAmount { .. })));
    }

    #[test]
    fn deposit_view() {
        let mut desk = desk(100.0);
        let view = desk.deposit(50.0);
        assert_eq!(view.message, "Deposited: 50.0");
        assert!(!view.rejected);
        assert!((view.balance - 150.0).abs() < f64::EPSILON);
        assert_eq!(view.portfolio_value, Some(150.0));
        assert_eq!(view.profit_loss, Some(50.0));
        assert_eq!(view.transactions.len(), 1);
    }

    #[test]
    fn rejected_withdraw_view() {
        let mut desk = desk(100.0);
        let view = desk.withdraw(500.0);
        assert!(view.rejected);
        assert!(view.message.starts_with("insufficient funds"));
        assert!((view.balance - 100.0).abs() < f64::EPSILON);
        assert!(view.transactions.is_empty());
    }

    #[test]
    fn buy_and_sell_views() {
        let mut desk = desk(1000.0);
        let view = desk.buy("AAPL", 2);
        assert_eq!(view.message, "Bought 2 shares of AAPL");
        assert_eq!(view.holdings.get("AAPL"), Some(&2));
        assert_eq!(view.portfolio_value, Some(1000.0));

        let view = desk.sell("AAPL", 2);
        assert_eq!(view.message, "Sold 2 shares of AAPL");
        assert!(view.holdings.is_empty());
        assert_eq!(view.transactions.len(), 2);
    }

    #[test]
    fn create_account_replaces_ledger() {
        let mut desk = desk(1000.0);
        desk.buy("AAPL", 1);
        let view = desk.create_account(500.0);
        assert_eq!(view.message, "Account created with initial deposit: 500.0");
        assert!(view.holdings.is_empty());
        assert!(view.transactions.is_empty());
        assert_eq!(desk.ledger().id(), "user1");
        assert!((desk.ledger().initial_deposit() - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn create_account_rejects_negative_and_keeps_ledger() {
        let mut desk = desk(1000.0);
        desk.buy("AAPL", 1);
        let view = desk.create_account(-1.0);
        assert!(view.rejected);
        assert_eq!(view.holdings.get("AAPL"), Some(&1));
        assert!((desk.ledger().initial_deposit() - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn apply_dispatches_instructions() {
        let mut desk = desk(1000.0);
        let view = desk.apply(&Instruction::Buy {
            symbol: "AAPL".into(),
            quantity: 0,
        });
        assert!(view.rejected);
        assert_eq!(
            desk.apply(&Instruction::Show).message,
            "Account information updated"
        );
    }

    #[test]
    fn unpriceable_holding_renders_unavailable() {
        let online = Cell::new(true);
        let oracle = |symbol: &str| -> Result<f64, PriceError> {
            if online.get() {
                Ok(150.0)
            } else {
                Err(PriceError::Unavailable {
                    symbol: symbol.to_string(),
                    reason: "feed down".into(),
                })
            }
        };
        let mut desk = Desk::new("user1", 1000.0, oracle, StillClock).unwrap();
        desk.buy("AAPL", 1);

        online.set(false);
        let view = desk.show();
        assert!(!view.rejected);
        assert!((view.balance - 850.0).abs() < f64::EPSILON);
        assert_eq!(view.portfolio_value, None);
        assert_eq!(view.profit_loss, None);
        assert!(view.to_string().contains("Portfolio Value:  unavailable"));
    }

    #[test]
    fn view_values_account_once_per_render() {
        let quote = Cell::new(90.0);
        let oracle = |_: &str| -> Result<f64, PriceError> {
            quote.set(quote.get() + 10.0);
            Ok(quote.get())
        };
        let mut desk = Desk::new("user1", 1000.0, oracle, StillClock).unwrap();
        let view = desk.buy("A", 1);

        assert!(!view.rejected);
        let value = view.portfolio_value.unwrap();
        let pl = view.profit_loss.unwrap();
        assert!((pl - (value - 1000.0)).abs() < f64::EPSILON);
        assert!((value - 1010.0).abs() < f64::EPSILON);
    }

    #[test]
    fn view_display() {
        let mut desk = desk(1000.0);
        let view = desk.buy("AAPL", 2);
        let rendered = view.to_string();
        assert!(rendered.starts_with("Bought 2 shares of AAPL\n"));
        assert!(rendered.contains("Balance:          700.00"));
        assert!(rendered.contains("Profit/Loss:      +0.00"));
        assert!(rendered.contains("Holdings:         AAPL x2"));
    }
}
