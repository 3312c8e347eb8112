//! Lock-serialized portfolio handle for callers on several threads.

use super::Portfolio;
use crate::types::QuantifiedHolding;
use crate::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Owned valuation of one day, detached from the lock.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total_amount: f64,
    pub assets: Vec<QuantifiedHolding>,
}

/// A cloneable handle to one portfolio.
///
/// Every read and every mutation goes through a single mutex, so a reader
/// never sees a half-applied buy or sell. Results are owned copies taken
/// while the lock is held.
#[derive(Debug, Clone, Default)]
pub struct SharedPortfolio {
    inner: Arc<Mutex<Portfolio>>,
}

impl SharedPortfolio {
    /// Wrap a portfolio for shared use.
    pub fn new(portfolio: Portfolio) -> Self {
        Self {
            inner: Arc::new(Mutex::new(portfolio)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Portfolio> {
        // Operations validate before mutating, so a poisoned portfolio is
        // still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Portfolio mutex was poisoned, recovering inner data");
            poisoned.into_inner()
        })
    }

    /// Run `f` with exclusive access to the portfolio.
    pub fn with<R>(&self, f: impl FnOnce(&Portfolio) -> R) -> R {
        f(&self.lock())
    }

    /// See [`Portfolio::buy`].
    pub fn buy(&self, id: &str, day: NaiveDate, amount: f64) -> Result<()> {
        self.lock().buy(id, day, amount)
    }

    /// See [`Portfolio::sell`].
    pub fn sell(&self, id: &str, day: NaiveDate, amount: f64) -> Result<()> {
        self.lock().sell(id, day, amount)
    }

    /// See [`Portfolio::total`].
    pub fn total(&self, day: NaiveDate) -> f64 {
        self.lock().total(day)
    }

    /// See [`Portfolio::weight`].
    pub fn weight(&self, id: &str, day: NaiveDate) -> Result<f64> {
        self.lock().weight(id, day)
    }

    /// Owned copies of the holdings on `day`.
    pub fn snapshot(&self, day: NaiveDate) -> Vec<QuantifiedHolding> {
        self.lock().assets_on(day).into_iter().cloned().collect()
    }

    /// Owned version of [`Portfolio::daily_positions`], ascending by date.
    pub fn daily_totals(&self, start: NaiveDate, end: NaiveDate) -> Vec<DailyTotal> {
        self.lock()
            .daily_positions(start, end)
            .into_iter()
            .map(|(date, position)| DailyTotal {
                date,
                total_amount: position.total_amount,
                assets: position.assets.into_iter().cloned().collect(),
            })
            .collect()
    }

    /// Take the portfolio back if this is the last handle.
    pub fn try_unwrap(self) -> std::result::Result<Portfolio, Self> {
        Arc::try_unwrap(self.inner)
            .map(|mutex| mutex.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner()))
            .map_err(|inner| Self { inner })
    }
}

impl From<Portfolio> for SharedPortfolio {
    fn from(portfolio: Portfolio) -> Self {
        Self::new(portfolio)
    }
}
