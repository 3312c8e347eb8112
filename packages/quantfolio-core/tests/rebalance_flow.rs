//! End-to-end: tables on disk -> holdings -> portfolio -> rebalancing.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use quantfolio_core::{
    holdings_from_files, to_quantified_portfolio, Config, Error, SharedPortfolio,
};
use std::fs;
use tempfile::tempdir;

const WEIGHTS: &str = "\
fecha,activo,portafolio 1,portafolio 2
2025-01-01,AAA,0.4,0.25
2025-01-01,BBB,0.6,0.75
2025-01-02,AAA,0.5,0.5
2025-01-02,BBB,0.5,0.5
";

const PRICES: &str = "\
fecha,AAA,BBB
2025-01-01 00:00:00,100,50
2025-01-02 00:00:00,125,40
";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write_tables() -> (tempfile::TempDir, Config) {
    let dir = tempdir().unwrap();
    let weights_path = dir.path().join("weights.csv");
    let prices_path = dir.path().join("prices.csv");
    fs::write(&weights_path, WEIGHTS).unwrap();
    fs::write(&prices_path, PRICES).unwrap();

    let config = Config {
        weights_path,
        prices_path,
        initial_amount: 1000.0,
        ..Config::default()
    };
    (dir, config)
}

#[test]
fn test_load_quantify_and_project() {
    let (_dir, config) = write_tables();

    let holdings = holdings_from_files(
        &config.weights_path,
        &config.prices_path,
        &config.weight_column,
    )
    .unwrap();
    assert_eq!(holdings.len(), 4);
    assert_eq!(holdings[2].price, 125.0);

    let portfolio = to_quantified_portfolio(holdings, config.initial_amount).unwrap();

    let jan1 = date(2025, 1, 1);
    let jan2 = date(2025, 1, 2);
    assert_relative_eq!(portfolio.holding("AAA", jan1).unwrap().quantity, 4.0);
    assert_relative_eq!(portfolio.holding("BBB", jan1).unwrap().quantity, 12.0);
    assert_relative_eq!(portfolio.holding("AAA", jan2).unwrap().quantity, 4.0);
    assert_relative_eq!(portfolio.holding("BBB", jan2).unwrap().quantity, 12.5);

    let positions = portfolio.daily_positions(jan1, date(2025, 1, 31));
    assert_eq!(positions.keys().copied().collect::<Vec<_>>(), vec![jan1, jan2]);
    for position in positions.values() {
        assert_relative_eq!(position.total_amount, 1000.0);
        assert_eq!(position.assets.len(), 2);
    }
}

#[test]
fn test_rebalance_towards_new_weights() {
    let (_dir, config) = write_tables();
    let holdings = holdings_from_files(&config.weights_path, &config.prices_path, "portafolio 2")
        .unwrap();
    let mut portfolio = to_quantified_portfolio(holdings, 1000.0).unwrap();
    let day = date(2025, 1, 1);

    // Move from 25/75 to 40/60 without changing the total
    portfolio.sell("BBB", day, 150.0).unwrap();
    portfolio.buy("AAA", day, 150.0).unwrap();

    assert_relative_eq!(portfolio.total(day), 1000.0);
    assert_relative_eq!(portfolio.weight("AAA", day).unwrap(), 0.4);
    assert_relative_eq!(portfolio.weight("BBB", day).unwrap(), 0.6);

    // The other day is untouched
    assert_relative_eq!(portfolio.weight("AAA", date(2025, 1, 2)).unwrap(), 0.5);
}

#[test]
fn test_failed_orders_leave_state_unchanged() {
    let (_dir, config) = write_tables();
    let holdings = holdings_from_files(
        &config.weights_path,
        &config.prices_path,
        &config.weight_column,
    )
    .unwrap();
    let mut portfolio = to_quantified_portfolio(holdings, 1000.0).unwrap();
    let day = date(2025, 1, 1);
    let before: Vec<_> = portfolio.holdings().to_vec();

    assert!(matches!(
        portfolio.sell("AAA", day, 400.01),
        Err(Error::InsufficientQuantity { .. })
    ));
    assert!(matches!(
        portfolio.buy("AAA", day, -1.0),
        Err(Error::InvalidArgument(_))
    ));
    assert!(matches!(
        portfolio.buy("CCC", day, 10.0),
        Err(Error::NotFound { .. })
    ));
    assert!(matches!(
        portfolio.sell("AAA", date(2025, 1, 3), 10.0),
        Err(Error::NotFound { .. })
    ));

    assert_eq!(portfolio.holdings(), before.as_slice());
}

#[test]
fn test_shared_portfolio_roundtrip() {
    let (_dir, config) = write_tables();
    let holdings = holdings_from_files(
        &config.weights_path,
        &config.prices_path,
        &config.weight_column,
    )
    .unwrap();
    let shared = SharedPortfolio::new(to_quantified_portfolio(holdings, 1000.0).unwrap());
    let day = date(2025, 1, 2);

    shared.sell("AAA", day, 500.0).unwrap();

    let totals = shared.daily_totals(day, day);
    assert_relative_eq!(totals[0].total_amount, 500.0);
    let portfolio = shared.try_unwrap().unwrap();
    assert_relative_eq!(portfolio.holding("AAA", day).unwrap().quantity, 0.0);
}

#[test]
fn test_missing_files() {
    let dir = tempdir().unwrap();
    let result = holdings_from_files(
        dir.path().join("nope.csv"),
        dir.path().join("nada.csv"),
        "portafolio 1",
    );
    assert!(matches!(result, Err(Error::Io(_))));
}
