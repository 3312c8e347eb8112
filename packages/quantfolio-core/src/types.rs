//! Core data types for the quantfolio portfolio model.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A target allocation for one asset on one day, before any quantity is known.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holding {
    /// Asset identifier
    pub id: String,
    /// Target fraction of portfolio value, intended in (0, 1]
    pub weight: f64,
    /// Price per unit as of `date`
    pub price: f64,
    /// Calendar day of the allocation
    pub date: NaiveDate,
}

impl Holding {
    /// Create a new holding record.
    pub fn new(id: impl Into<String>, weight: f64, price: f64, date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            weight,
            price,
            date,
        }
    }

    /// Convert this allocation into a concrete position for `initial_amount`.
    ///
    /// `quantity = weight * initial_amount / price`. A non-positive price is
    /// rejected with [`Error::DivisionByZero`]; a non-positive
    /// `initial_amount` is accepted and yields a degenerate quantity.
    pub fn quantify(&self, initial_amount: f64) -> Result<QuantifiedHolding> {
        ensure_positive_price(&self.id, self.price)?;

        let quantity = (self.weight * initial_amount) / self.price;
        Ok(QuantifiedHolding {
            id: self.id.clone(),
            quantity,
            price: self.price,
            date: self.date,
        })
    }
}

/// A concrete position: units of an asset held on a given day.
///
/// Once placed in a [`Portfolio`](crate::Portfolio) only `quantity` changes,
/// and only through the portfolio's `buy`/`sell`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuantifiedHolding {
    /// Asset identifier
    pub id: String,
    /// Units held
    pub quantity: f64,
    /// Price per unit as of `date`
    pub price: f64,
    /// Calendar day of the position
    pub date: NaiveDate,
}

impl QuantifiedHolding {
    /// Create a new quantified holding.
    pub fn new(id: impl Into<String>, quantity: f64, price: f64, date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            quantity,
            price,
            date,
        }
    }

    /// Current monetary value (`price * quantity`).
    pub fn amount(&self) -> f64 {
        self.price * self.quantity
    }

    /// Units corresponding to a monetary `amount` at this holding's price.
    pub(crate) fn units_for(&self, amount: f64) -> Result<f64> {
        ensure_positive_price(&self.id, self.price)?;
        Ok(amount / self.price)
    }
}

fn ensure_positive_price(id: &str, price: f64) -> Result<()> {
    if price > 0.0 && price.is_finite() {
        Ok(())
    } else {
        Err(Error::DivisionByZero(format!(
            "price of '{}' must be positive, got {}",
            id, price
        )))
    }
}

/// Valuation snapshot for one calendar day.
///
/// Borrows the holdings from the portfolio it was projected from, so it
/// always reflects the quantities at the time of the query.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyPosition<'a> {
    /// Sum of `amount()` over the day's holdings
    pub total_amount: f64,
    /// Holdings dated that day, in insertion order
    pub assets: Vec<&'a QuantifiedHolding>,
}

/// JSON envelope printed by the CLI: `{"ok": true, "data": ...}` on success,
/// `{"ok": false, "error": "..."}` on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Wrap a command's payload.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Wrap a failure message.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl<T> From<Result<T>> for ApiResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.to_string()),
        }
    }
}
