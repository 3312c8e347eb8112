//! Date-indexed portfolio of quantified holdings.

use crate::types::{DailyPosition, QuantifiedHolding};
use crate::{Error, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Rounding window, in ulps of the held quantity, within which a sell of the
/// whole position still counts as exact.
const SELL_ULPS: f64 = 4.0;

/// A portfolio of quantified holdings, indexed by date.
///
/// The portfolio exclusively owns its holdings. Queries hand out shared
/// references; `buy` and `sell` update `quantity` in place, so any query made
/// after a mutation observes it. Holdings cannot be added, removed or
/// re-dated after construction, which keeps the date index valid.
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    /// Holdings in insertion order
    holdings: Vec<QuantifiedHolding>,
    /// Date -> positions into `holdings`, in insertion order
    by_date: BTreeMap<NaiveDate, Vec<usize>>,
}

impl Portfolio {
    /// Create a portfolio from holdings, building the date index.
    ///
    /// Duplicate `(id, date)` pairs are kept; lookups use the first one.
    pub fn new(holdings: Vec<QuantifiedHolding>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
        for (idx, holding) in holdings.iter().enumerate() {
            by_date.entry(holding.date).or_default().push(idx);
        }

        tracing::debug!(
            holdings = holdings.len(),
            days = by_date.len(),
            "Portfolio constructed"
        );

        Self { holdings, by_date }
    }

    /// All holdings, in insertion order.
    pub fn holdings(&self) -> &[QuantifiedHolding] {
        &self.holdings
    }

    /// Number of holdings across all dates.
    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    /// Returns true if the portfolio holds nothing.
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Days with at least one holding, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.by_date.keys().copied()
    }

    /// Holdings dated `day`, in insertion order. Empty if there are none.
    pub fn assets_on(&self, day: NaiveDate) -> Vec<&QuantifiedHolding> {
        self.by_date
            .get(&day)
            .map(|indices| indices.iter().map(|&idx| &self.holdings[idx]).collect())
            .unwrap_or_default()
    }

    /// First holding on `day` with the given id.
    pub fn holding(&self, id: &str, day: NaiveDate) -> Option<&QuantifiedHolding> {
        self.position_of(id, day).map(|idx| &self.holdings[idx])
    }

    fn position_of(&self, id: &str, day: NaiveDate) -> Option<usize> {
        self.by_date
            .get(&day)?
            .iter()
            .copied()
            .find(|&idx| self.holdings[idx].id == id)
    }

    /// Total value of the holdings on `day`; 0 when there are none.
    pub fn total(&self, day: NaiveDate) -> f64 {
        self.assets_on(day).iter().map(|h| h.amount()).sum()
    }

    /// Fraction of the day's total held in `id`.
    pub fn weight(&self, id: &str, day: NaiveDate) -> Result<f64> {
        let holding = self.holding(id, day).ok_or_else(|| Error::NotFound {
            id: id.to_string(),
            day,
            action: "weigh",
        })?;

        let total = self.total(day);
        if total == 0.0 {
            return Err(Error::DivisionByZero(format!("total value on {} is zero", day)));
        }

        Ok(holding.amount() / total)
    }

    /// Weights of every holding on `day`, in insertion order.
    pub fn weights(&self, day: NaiveDate) -> Result<Vec<(&str, f64)>> {
        let total = self.total(day);
        if total == 0.0 {
            return Err(Error::DivisionByZero(format!("total value on {} is zero", day)));
        }

        Ok(self
            .assets_on(day)
            .into_iter()
            .map(|h| (h.id.as_str(), h.amount() / total))
            .collect())
    }

    /// Sell `amount` worth of `id` on `day`.
    ///
    /// Everything is validated before the quantity changes, so a failed sell
    /// leaves the portfolio untouched.
    pub fn sell(&mut self, id: &str, day: NaiveDate, amount: f64) -> Result<()> {
        let idx = self.position_of(id, day).ok_or_else(|| Error::NotFound {
            id: id.to_string(),
            day,
            action: "sell",
        })?;
        ensure_valid_amount(amount, "sell")?;

        let target = &mut self.holdings[idx];
        let quantity_to_sell = target.units_for(amount)?;

        let excess = quantity_to_sell - target.quantity;
        if excess > SELL_ULPS * f64::EPSILON * target.quantity.abs() {
            return Err(Error::InsufficientQuantity {
                requested: quantity_to_sell,
                available: target.quantity,
            });
        }

        target.quantity = if excess > 0.0 {
            0.0
        } else {
            target.quantity - quantity_to_sell
        };
        tracing::debug!(
            id,
            %day,
            amount,
            quantity = target.quantity,
            "Sold"
        );
        Ok(())
    }

    /// Buy `amount` worth of `id` on `day`.
    ///
    /// Only adds to an existing dated holding; it never opens a new position.
    pub fn buy(&mut self, id: &str, day: NaiveDate, amount: f64) -> Result<()> {
        let idx = self.position_of(id, day).ok_or_else(|| Error::NotFound {
            id: id.to_string(),
            day,
            action: "buy",
        })?;
        ensure_valid_amount(amount, "buy")?;

        let target = &mut self.holdings[idx];
        let quantity_to_buy = target.units_for(amount)?;

        target.quantity += quantity_to_buy;
        tracing::debug!(
            id,
            %day,
            amount,
            quantity = target.quantity,
            "Bought"
        );
        Ok(())
    }

    /// Valuation snapshot for every day in `[start, end]` that has holdings.
    ///
    /// Days without holdings are omitted. `end < start` yields an empty map.
    pub fn daily_positions(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BTreeMap<NaiveDate, DailyPosition<'_>> {
        if end < start {
            return BTreeMap::new();
        }

        self.by_date
            .range(start..=end)
            .map(|(&day, _)| {
                (
                    day,
                    DailyPosition {
                        total_amount: self.total(day),
                        assets: self.assets_on(day),
                    },
                )
            })
            .collect()
    }
}

impl FromIterator<QuantifiedHolding> for Portfolio {
    fn from_iter<I: IntoIterator<Item = QuantifiedHolding>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn ensure_valid_amount(amount: f64, action: &str) -> Result<()> {
    if amount < 0.0 || !amount.is_finite() {
        return Err(Error::InvalidArgument(format!(
            "Amount to {} must be non-negative, got {}",
            action, amount
        )));
    }
    Ok(())
}
