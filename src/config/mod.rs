//! Configuration loading and management for the payroll engine.
//!
//! This module loads the payroll policy (overtime rate, tax rule, overtime
//! limits, pagination) from YAML files, and the server's process settings
//! from the environment.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/payroll").unwrap();
//! println!("Tax threshold: {}", config.config().payroll.tax.threshold);
//! ```

mod loader;
mod types;

pub use loader::{ConfigLoader, ServerSettings};
pub use types::{
    EngineConfig, OvertimePolicy, PaginationPolicy, PayrollPolicy, RegularHours, TaxPolicy,
};
