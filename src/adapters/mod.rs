//! Concrete adapter implementations for ports.

pub mod clock;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod fixed_price_oracle;
