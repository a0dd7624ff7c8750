//! Small frame helpers for working with date-typed columns.

use crate::error::Result;
use chrono::NaiveDate;
use polars::prelude::*;

const EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1970, 1, 1) {
    Some(d) => d,
    None => panic!("invalid epoch"),
};

/// Days since the Unix epoch, the physical representation of a `Date` value.
#[must_use]
pub fn days_since_epoch(date: NaiveDate) -> i32 {
    (date - EPOCH).num_days() as i32
}

/// Converts a physical `Date` value back to a calendar date.
#[must_use]
pub fn date_from_days(days: i32) -> NaiveDate {
    EPOCH + chrono::Duration::days(i64::from(days))
}

/// Builds a `Date`-typed series from calendar dates.
pub fn date_series(name: &str, dates: &[NaiveDate]) -> Result<Series> {
    let days: Vec<i32> = dates.iter().copied().map(days_since_epoch).collect();
    Ok(Series::new(name.into(), days).cast(&DataType::Date)?)
}

/// Builds a `Date`-typed series where some entries are missing.
pub fn optional_date_series(name: &str, dates: &[Option<NaiveDate>]) -> Result<Series> {
    let days: Vec<Option<i32>> = dates.iter().map(|d| d.map(days_since_epoch)).collect();
    Ok(Series::new(name.into(), days).cast(&DataType::Date)?)
}

/// Date literal expression for filter predicates.
#[must_use]
pub fn date_lit(date: NaiveDate) -> Expr {
    lit(days_since_epoch(date)).cast(DataType::Date)
}

/// Rounds float columns to a fixed number of decimal places, in place.
///
/// Columns that are absent or not `Float64` are left untouched, so callers
/// can pass a column list without worrying about key columns mixed in.
pub fn round_columns(df: &mut DataFrame, columns: &[&str], decimals: u32) -> Result<()> {
    let factor = 10f64.powi(decimals as i32);
    for &name in columns {
        let Ok(column) = df.column(name) else {
            continue;
        };
        if column.dtype() != &DataType::Float64 {
            continue;
        }
        let rounded = column
            .as_materialized_series()
            .f64()?
            .apply_values(|v| (v * factor).round() / factor)
            .into_series();
        df.replace(name, rounded)?;
    }
    Ok(())
}
