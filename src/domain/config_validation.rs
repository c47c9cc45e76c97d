//! Configuration validation.
//!
//! Validates the `[account]`, `[oracle]` and `[prices]` sections before a
//! desk is built from them.

use crate::domain::error::TradeLedgerError;
use crate::ports::config_port::ConfigPort;

pub const UNKNOWN_SYMBOL_REJECT: &str = "reject";
pub const UNKNOWN_SYMBOL_DEFAULT: &str = "default";

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TradeLedgerError> {
    validate_account_config(config)?;
    validate_oracle_config(config)?;
    Ok(())
}

pub fn validate_account_config(config: &dyn ConfigPort) -> Result<(), TradeLedgerError> {
    validate_account_id(config)?;
    validate_opening_balance(config)?;
    Ok(())
}

pub fn validate_oracle_config(config: &dyn ConfigPort) -> Result<(), TradeLedgerError> {
    validate_unknown_symbol_policy(config)?;
    validate_price_table(config)?;
    Ok(())
}

fn validate_account_id(config: &dyn ConfigPort) -> Result<(), TradeLedgerError> {
    match config.get_string("account", "id") {
        Some(id) if id.trim().is_empty() => Err(TradeLedgerError::ConfigInvalid {
            section: "account".to_string(),
            key: "id".to_string(),
            reason: "id must not be empty".to_string(),
        }),
        _ => Ok(()),
    }
}

fn validate_opening_balance(config: &dyn ConfigPort) -> Result<(), TradeLedgerError> {
    if let Some(value) = parse_number(config, "account", "opening_balance")? {
        if value < 0.0 {
            return Err(TradeLedgerError::ConfigInvalid {
                section: "account".to_string(),
                key: "opening_balance".to_string(),
                reason: "opening_balance must be non-negative".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_unknown_symbol_policy(config: &dyn ConfigPort) -> Result<(), TradeLedgerError> {
    let policy = config
        .get_string("oracle", "unknown_symbol")
        .map(|p| p.trim().to_lowercase())
        .unwrap_or_else(|| UNKNOWN_SYMBOL_REJECT.to_string());

    match policy.as_str() {
        UNKNOWN_SYMBOL_REJECT => Ok(()),
        UNKNOWN_SYMBOL_DEFAULT => match parse_number(config, "oracle", "default_price")? {
            None => Err(TradeLedgerError::ConfigMissing {
                section: "oracle".to_string(),
                key: "default_price".to_string(),
            }),
            Some(price) if price <= 0.0 => Err(TradeLedgerError::ConfigInvalid {
                section: "oracle".to_string(),
                key: "default_price".to_string(),
                reason: "default_price must be positive".to_string(),
            }),
            Some(_) => Ok(()),
        },
        other => Err(TradeLedgerError::ConfigInvalid {
            section: "oracle".to_string(),
            key: "unknown_symbol".to_string(),
            reason: format!("expected 'reject' or 'default', found '{}'", other),
        }),
    }
}

fn validate_price_table(config: &dyn ConfigPort) -> Result<(), TradeLedgerError> {
    for key in config.keys("prices") {
        match parse_number(config, "prices", &key)? {
            Some(price) if price > 0.0 => {}
            _ => {
                return Err(TradeLedgerError::ConfigInvalid {
                    section: "prices".to_string(),
                    key: key.to_uppercase(),
                    reason: "price must be positive".to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Read a numeric value, distinguishing "absent" from "not a number".
pub fn parse_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, TradeLedgerError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(value)),
            _ => Err(TradeLedgerError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("expected a number, found '{}'", raw),
            }),
        },
    }
}
