//! Prepared inputs handed to factor formulas, and the small expression
//! vocabulary the formulas are written in.
//!
//! By the time a formula runs, the engine has fetched the declared fields,
//! attached annual records to the quarterly spine, deduplicated to one row
//! per `(company, period end)`, sorted for the transforms and applied the
//! declared fill policies. Formulas only combine columns.

use lisbon_core::column::{COMPANY_ID, DATE, PERIOD_END, REPORT_DATE};
use lisbon_core::error::{Error, Result};
use lisbon_core::field::Field;
use lisbon_temporal::transform::{lag, rolling_sum};
use polars::prelude::*;

/// Quarters in a trailing-twelve-month window.
pub const LTM_WINDOW: usize = 4;
/// Quarterly rows in one year, the standard comparison lag.
pub const YEAR_LAG: i64 = 4;

/// Inputs for one factor computation.
#[derive(Debug)]
pub struct FactorInputs<'a> {
    /// Output column name (`f_<short name>`).
    pub column: String,
    /// Prepared fundamentals frame.
    pub fundamentals: DataFrame,
    /// Shared market-cap series, present when the factor declared it.
    pub market_caps: Option<&'a DataFrame>,
}

impl FactorInputs<'_> {
    /// The market-cap series, or a schema error if the factor definition
    /// did not declare it.
    pub fn require_market_caps(&self) -> Result<&DataFrame> {
        self.market_caps.ok_or_else(|| Error::Schema {
            factor: self.column.clone(),
            reason: "formula uses market caps but the definition does not declare them"
                .to_string(),
        })
    }
}

/// Column expression for a raw field.
#[must_use]
pub fn item(field: Field) -> Expr {
    col(field.column())
}

/// Trailing-twelve-month sum of a quarterly field.
#[must_use]
pub fn ltm(field: Field, alias: &str) -> Expr {
    ltm_of(field.column(), alias)
}

/// Trailing-twelve-month sum of a derived column.
#[must_use]
pub fn ltm_of(column: &str, alias: &str) -> Expr {
    rolling_sum(column, LTM_WINDOW, LTM_WINDOW, COMPANY_ID).alias(alias)
}

/// Column value `quarters` rows back, per company.
#[must_use]
pub fn lag_quarters(column: &str, quarters: i64, alias: &str) -> Expr {
    lag(column, quarters, COMPANY_ID).alias(alias)
}

/// Year-ago value of a column (four quarterly rows back).
#[must_use]
pub fn year_ago(column: &str, alias: &str) -> Expr {
    lag_quarters(column, YEAR_LAG, alias)
}

/// Collects a fundamentals-keyed factor table:
/// `(company_id, period_end, report_date, <factor>)`.
pub fn fundamental_output(lf: LazyFrame, column: &str) -> Result<DataFrame> {
    Ok(lf
        .select([
            col(COMPANY_ID),
            col(PERIOD_END),
            col(REPORT_DATE),
            col(column),
        ])
        .collect()?)
}

/// Collects a market-keyed factor table:
/// `(company_id, date, report_date, <factor>)`.
pub fn market_output(lf: LazyFrame, column: &str) -> Result<DataFrame> {
    Ok(lf
        .select([col(COMPANY_ID), col(DATE), col(REPORT_DATE), col(column)])
        .collect()?)
}
