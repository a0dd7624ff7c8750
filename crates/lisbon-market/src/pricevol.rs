//! Derived daily price/volume columns.
//!
//! Research-side derivations over the raw daily frame: split-adjusted close,
//! trailing compounded return over a fixed window, and the same figure
//! shifted to be the forward-looking window return. All windowing is
//! per-security.

use lisbon_core::column::{DATE, PRICE, PRICE_ADJ_FACTOR, SECURITY_ID, TOTAL_RETURN};
use lisbon_core::error::Result;
use lisbon_temporal::transform::{rolling_sum, sort_for_transforms};
use polars::prelude::*;

/// Split/dividend adjusted close column.
pub const ADJUSTED_CLOSE: &str = "adjusted_close";
/// Trailing compounded return column.
pub const TRAILING_RETURN: &str = "trailing_return";
/// Forward compounded return column.
pub const FORWARD_RETURN: &str = "forward_return";

/// Trading days in a year, the default compounding window.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Adds `adjusted_close`, `trailing_return` and `forward_return` columns.
///
/// The trailing return compounds `window` daily total returns
/// (`prod(1 + r) - 1`, null until a full window exists); the forward return
/// is the trailing return `window` rows ahead, so each row sees the return
/// realized over the *next* window. Computed per security, never across.
pub fn derive_price_columns(daily: &DataFrame, window: usize) -> Result<DataFrame> {
    // Compound through log space: rolling products are not a primitive, and
    // sum-of-logs matches prod(1 + r) for the same null propagation.
    let log_return = (lit(1.0) + col(TOTAL_RETURN)).log(std::f64::consts::E);

    let out = sort_for_transforms(daily.clone().lazy(), SECURITY_ID, DATE)
        .with_columns([
            (col(PRICE) / col(PRICE_ADJ_FACTOR)).alias(ADJUSTED_CLOSE),
            log_return.alias("__log_return"),
        ])
        .with_columns([
            (rolling_sum("__log_return", window, window, SECURITY_ID).exp() - lit(1.0))
                .alias(TRAILING_RETURN),
        ])
        .with_columns([col(TRAILING_RETURN)
            .shift(lit(-(window as i64)))
            .over([col(SECURITY_ID)])
            .alias(FORWARD_RETURN)])
        .collect()?;

    Ok(out.drop_many(["__log_return"]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use lisbon_core::frame::date_series;

    fn daily() -> DataFrame {
        let dates: Vec<NaiveDate> = (1..=4)
            .map(|day| NaiveDate::from_ymd_opt(2021, 3, day).unwrap())
            .collect();
        DataFrame::new(vec![
            Series::new(SECURITY_ID.into(), vec![1i64; 4]).into(),
            date_series(DATE, &dates).unwrap().into(),
            Series::new(PRICE.into(), vec![100.0, 110.0, 121.0, 133.1]).into(),
            Series::new(TOTAL_RETURN.into(), vec![0.1, 0.1, 0.1, 0.1]).into(),
            Series::new(PRICE_ADJ_FACTOR.into(), vec![2.0, 2.0, 2.0, 2.0]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn adjusted_close_divides_by_factor() {
        let out = derive_price_columns(&daily(), 2).unwrap();
        let adj: Vec<Option<f64>> = out
            .column(ADJUSTED_CLOSE)
            .unwrap()
            .f64()
            .unwrap()
            .to_vec();
        assert_eq!(adj[0], Some(50.0));
        assert_eq!(adj[3], Some(66.55));
    }

    #[test]
    fn trailing_return_compounds_over_window() {
        let out = derive_price_columns(&daily(), 2).unwrap();
        let trailing: Vec<Option<f64>> = out
            .column(TRAILING_RETURN)
            .unwrap()
            .f64()
            .unwrap()
            .to_vec();

        assert_eq!(trailing[0], None);
        assert_relative_eq!(trailing[1].unwrap(), 0.21, epsilon = 1e-10);
        assert_relative_eq!(trailing[3].unwrap(), 0.21, epsilon = 1e-10);
    }

    #[test]
    fn forward_return_is_the_next_window() {
        let out = derive_price_columns(&daily(), 2).unwrap();
        let forward: Vec<Option<f64>> = out
            .column(FORWARD_RETURN)
            .unwrap()
            .f64()
            .unwrap()
            .to_vec();

        // Row 1's forward return is the trailing return realized at row 3.
        assert_relative_eq!(forward[1].unwrap(), 0.21, epsilon = 1e-10);
        assert_eq!(forward[3], None);
    }
}
