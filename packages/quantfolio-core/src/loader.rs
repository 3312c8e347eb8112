//! Holding records from weights and prices tables.
//!
//! Two CSV tables feed the model:
//!
//! - **weights**: `date, asset_id, <weight column>...`, one row per asset per day
//! - **prices**: `date, <asset id>...`, one row per day, one price column per asset
//!
//! Each weights row is joined with the price of its asset on its day.

use crate::types::Holding;
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io;
use std::path::Path;

/// Date-time layouts accepted besides plain dates and RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a date or timestamp into a calendar date, dropping the time of day.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|datetime| datetime.date())
        .ok_or_else(|| Error::DateParse {
            value: value.to_string(),
        })
}

fn parse_number(column: &str, value: &str) -> Result<f64> {
    value.trim().parse().map_err(|_| Error::InvalidNumber {
        column: column.to_string(),
        value: value.to_string(),
    })
}

fn csv_reader<R: io::Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Per-day asset prices.
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    prices: BTreeMap<NaiveDate, HashMap<String, f64>>,
}

impl PriceTable {
    /// Read a prices table: first column is the date, every other column
    /// header is an asset id. Blank cells mean no price that day.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut reader = csv_reader(reader);
        let headers = reader.headers()?.clone();

        let mut prices = BTreeMap::new();
        for record in reader.records() {
            let record = record?;
            let Some(date_cell) = record.get(0) else {
                continue;
            };
            let day = parse_date(date_cell)?;

            let row: &mut HashMap<String, f64> = prices.entry(day).or_default();
            for (id, cell) in headers.iter().zip(record.iter()).skip(1) {
                if cell.is_empty() {
                    continue;
                }
                row.insert(id.to_string(), parse_number(id, cell)?);
            }
        }

        Ok(Self { prices })
    }

    /// Read a prices table from a file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let table = Self::from_reader(File::open(path)?)?;
        tracing::info!(path = %path.display(), days = table.len(), "Loaded prices");
        Ok(table)
    }

    /// Price of `id` on `day`, if quoted.
    pub fn price(&self, day: NaiveDate, id: &str) -> Option<f64> {
        self.prices.get(&day)?.get(id).copied()
    }

    /// Number of days in the table.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Read a weights table and join each row with its price.
///
/// Column 0 is the date, column 1 the asset id; the weight comes from the
/// column named `weight_column`. Rows keep file order.
pub fn load_holdings<R: io::Read>(
    weights: R,
    prices: &PriceTable,
    weight_column: &str,
) -> Result<Vec<Holding>> {
    let mut reader = csv_reader(weights);
    let headers = reader.headers()?.clone();

    if headers.len() < 2 {
        return Err(Error::MissingColumn("asset id".to_string()));
    }
    let weight_idx = headers
        .iter()
        .position(|h| h == weight_column)
        .ok_or_else(|| Error::MissingColumn(weight_column.to_string()))?;

    let mut holdings = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cell = |idx: usize| record.get(idx).unwrap_or_default();

        let day = parse_date(cell(0))?;
        let id = cell(1).to_string();
        if id.is_empty() {
            return Err(Error::BlankAssetId { day });
        }
        let weight = parse_number(weight_column, cell(weight_idx))?;
        let price = prices
            .price(day, &id)
            .ok_or_else(|| Error::MissingPrice { id: id.clone(), day })?;

        holdings.push(Holding::new(id, weight, price, day));
    }

    Ok(holdings)
}

/// Load holding records from a weights file and a prices file.
pub fn holdings_from_files(
    weights_path: impl AsRef<Path>,
    prices_path: impl AsRef<Path>,
    weight_column: &str,
) -> Result<Vec<Holding>> {
    let prices = PriceTable::from_path(prices_path)?;
    let weights_path = weights_path.as_ref();
    let holdings = load_holdings(File::open(weights_path)?, &prices, weight_column)?;

    tracing::info!(
        path = %weights_path.display(),
        column = weight_column,
        holdings = holdings.len(),
        "Loaded holdings"
    );
    Ok(holdings)
}
