//! Quantfolio Core - Date-indexed portfolio valuation and rebalancing library.
//!
//! This crate turns target allocations into concrete positions and keeps them
//! consistent under rebalancing:
//!
//! - **Quantification**: Target weights + initial investment -> quantities
//! - **Portfolio**: Per-date totals, weights and range projections
//! - **Rebalancing**: Amount-denominated buy/sell on a dated holding
//! - **Loading**: Weights and prices tables (CSV) -> holding records
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use quantfolio_core::{to_quantified_portfolio, Holding};
//!
//! let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
//! let holdings = vec![
//!     Holding::new("ASSET1", 0.4, 100.0, day),
//!     Holding::new("ASSET2", 0.6, 100.0, day),
//! ];
//!
//! let mut portfolio = to_quantified_portfolio(holdings, 1000.0).unwrap();
//! portfolio.sell("ASSET2", day, 200.0).unwrap();
//! portfolio.buy("ASSET1", day, 200.0).unwrap();
//!
//! assert_eq!(portfolio.total(day), 1000.0);
//! assert_eq!(portfolio.weight("ASSET1", day).unwrap(), 0.6);
//! ```

pub mod config;
pub mod loader;
pub mod portfolio;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use types::{ApiResponse, DailyPosition, Holding, QuantifiedHolding};

// Re-export main functionality
pub use loader::{holdings_from_files, load_holdings, parse_date, PriceTable};
pub use portfolio::{
    allocation_warnings, to_quantified_portfolio, AllocationWarning, DailyTotal, Portfolio,
    SharedPortfolio,
};

use chrono::NaiveDate;

/// Error types for quantfolio-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No holding with id '{id}' on {day} to {action}")]
    NotFound {
        id: String,
        day: NaiveDate,
        action: &'static str,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Cannot sell more than the available quantity (requested {requested}, available {available})")]
    InsufficientQuantity { requested: f64, available: f64 },

    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Not a date: '{value}'")]
    DateParse { value: String },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Blank asset id on {day}")]
    BlankAssetId { day: NaiveDate },

    #[error("No price for '{id}' on {day}")]
    MissingPrice { id: String, day: NaiveDate },

    #[error("Invalid number in column '{column}': '{value}'")]
    InvalidNumber { column: String, value: String },
}

/// Result type for quantfolio-core operations.
pub type Result<T> = std::result::Result<T, Error>;
