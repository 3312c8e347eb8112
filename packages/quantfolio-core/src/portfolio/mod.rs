//! Portfolio module.
//!
//! Provides the date-indexed portfolio, the weights-to-quantities service
//! and a lock-serialized handle for shared use.

mod quantified;
mod service;
mod shared;

pub use quantified::Portfolio;
pub use service::{allocation_warnings, to_quantified_portfolio, AllocationWarning};
pub use shared::{DailyTotal, SharedPortfolio};
