//! Core domain types and logic.

pub mod ledger;
pub mod transaction;
pub mod desk;
pub mod instruction;
pub mod config_validation;
pub mod error;
