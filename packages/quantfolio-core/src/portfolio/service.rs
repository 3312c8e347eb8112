//! Weights-to-quantities conversion.

use super::Portfolio;
use crate::types::{Holding, QuantifiedHolding};
use crate::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Tolerance when checking that a day's weights sum to one.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Something unusual about a set of holding records.
///
/// None of these stop quantification; they are reported so a caller can
/// decide whether to reject the input.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllocationWarning {
    /// No holding records at all
    Empty,
    /// Records span more than one date
    MixedDates { dates: Vec<NaiveDate> },
    /// A day's weights do not add up to one
    WeightSum { date: NaiveDate, sum: f64 },
    /// The same id appears twice on one day
    Duplicate { id: String, date: NaiveDate },
    /// The investment is zero or negative
    NonPositiveAmount { amount: f64 },
}

impl fmt::Display for AllocationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "no holdings to quantify"),
            Self::MixedDates { dates } => write!(f, "holdings span {} dates", dates.len()),
            Self::WeightSum { date, sum } => write!(f, "weights on {} sum to {}", date, sum),
            Self::Duplicate { id, date } => write!(f, "'{}' appears more than once on {}", id, date),
            Self::NonPositiveAmount { amount } => {
                write!(f, "initial amount {} is not positive", amount)
            }
        }
    }
}

/// Inspect holding records for unusual allocations.
pub fn allocation_warnings(holdings: &[Holding], initial_amount: f64) -> Vec<AllocationWarning> {
    let mut warnings = Vec::new();

    if holdings.is_empty() {
        warnings.push(AllocationWarning::Empty);
    }

    if initial_amount <= 0.0 {
        warnings.push(AllocationWarning::NonPositiveAmount {
            amount: initial_amount,
        });
    }

    let mut dates: Vec<NaiveDate> = holdings.iter().map(|h| h.date).collect();
    dates.sort();
    dates.dedup();
    if dates.len() > 1 {
        warnings.push(AllocationWarning::MixedDates {
            dates: dates.clone(),
        });
    }

    for &date in &dates {
        let sum: f64 = holdings
            .iter()
            .filter(|h| h.date == date)
            .map(|h| h.weight)
            .sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            warnings.push(AllocationWarning::WeightSum { date, sum });
        }
    }

    let mut seen = HashSet::new();
    for holding in holdings {
        if !seen.insert((holding.id.as_str(), holding.date)) {
            warnings.push(AllocationWarning::Duplicate {
                id: holding.id.clone(),
                date: holding.date,
            });
        }
    }

    warnings
}

/// Quantify every holding against `initial_amount` and collect them, in
/// input order, into a portfolio.
///
/// Unusual allocations are logged but accepted. Fails only if a holding has
/// a non-positive price.
pub fn to_quantified_portfolio<I>(holdings: I, initial_amount: f64) -> Result<Portfolio>
where
    I: IntoIterator<Item = Holding>,
{
    let holdings: Vec<Holding> = holdings.into_iter().collect();

    for warning in allocation_warnings(&holdings, initial_amount) {
        tracing::warn!("Quantifying unusual allocation: {}", warning);
    }

    let quantified = holdings
        .iter()
        .map(|holding| holding.quantify(initial_amount))
        .collect::<Result<Vec<QuantifiedHolding>>>()?;

    Ok(Portfolio::new(quantified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_to_quantified_portfolio_calculates_quantities() {
        let day = date(2025, 1, 1);
        let holdings = vec![
            Holding::new("ASSET1", 0.4, 100.0, day),
            Holding::new("ASSET2", 0.6, 100.0, day),
        ];

        let portfolio = to_quantified_portfolio(holdings, 1000.0).unwrap();

        assert_eq!(portfolio.len(), 2);
        assert_eq!(portfolio.holding("ASSET1", day).unwrap().quantity, 4.0);
        assert_eq!(portfolio.holding("ASSET2", day).unwrap().quantity, 6.0);
    }

    #[test]
    fn test_to_quantified_portfolio_keeps_input_order() {
        let holdings = vec![
            Holding::new("B", 0.5, 10.0, date(2025, 1, 2)),
            Holding::new("A", 0.5, 10.0, date(2025, 1, 1)),
        ];

        let portfolio = to_quantified_portfolio(holdings, 100.0).unwrap();

        let ids: Vec<_> = portfolio.holdings().iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[test]
    fn test_to_quantified_portfolio_empty() {
        let portfolio = to_quantified_portfolio(Vec::new(), 1000.0).unwrap();
        assert!(portfolio.is_empty());
    }

    #[test]
    fn test_to_quantified_portfolio_rejects_zero_price() {
        let day = date(2025, 1, 1);
        let holdings = vec![
            Holding::new("ASSET1", 0.5, 100.0, day),
            Holding::new("ASSET2", 0.5, 0.0, day),
        ];

        let result = to_quantified_portfolio(holdings, 1000.0);
        assert!(matches!(result, Err(Error::DivisionByZero(_))));
    }

    #[test]
    fn test_allocation_warnings_clean() {
        let day = date(2025, 1, 1);
        let holdings = vec![
            Holding::new("ASSET1", 0.4, 100.0, day),
            Holding::new("ASSET2", 0.6, 100.0, day),
        ];

        assert!(allocation_warnings(&holdings, 1000.0).is_empty());
    }

    #[test]
    fn test_allocation_warnings_empty() {
        let warnings = allocation_warnings(&[], 0.0);
        assert!(warnings.contains(&AllocationWarning::Empty));
        assert!(warnings.contains(&AllocationWarning::NonPositiveAmount { amount: 0.0 }));
    }

    #[test]
    fn test_allocation_warnings_weight_sum_and_duplicates() {
        let day = date(2025, 1, 1);
        let holdings = vec![
            Holding::new("ASSET1", 0.4, 100.0, day),
            Holding::new("ASSET1", 0.4, 100.0, day),
        ];

        let warnings = allocation_warnings(&holdings, 1000.0);

        assert_eq!(warnings.len(), 2);
        assert!(matches!(warnings[0], AllocationWarning::WeightSum { .. }));
        assert_eq!(
            warnings[1],
            AllocationWarning::Duplicate {
                id: "ASSET1".to_string(),
                date: day
            }
        );
    }

    #[test]
    fn test_allocation_warnings_mixed_dates() {
        let holdings = vec![
            Holding::new("ASSET1", 1.0, 100.0, date(2025, 1, 2)),
            Holding::new("ASSET1", 1.0, 100.0, date(2025, 1, 1)),
        ];

        let warnings = allocation_warnings(&holdings, 1000.0);

        assert_eq!(
            warnings,
            vec![AllocationWarning::MixedDates {
                dates: vec![date(2025, 1, 1), date(2025, 1, 2)]
            }]
        );
    }
}
