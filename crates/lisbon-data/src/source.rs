//! Source contracts for raw fundamental and market data.
//!
//! The actual database, with its connection handling, SQL dialect and
//! query templates, lives outside this workspace. The factor engine only depends
//! on these traits, which return plain tabular rows with a documented shape.
//! Fetches are the only blocking I/O in a run; no timeout or retry policy is
//! imposed here, callers own that.

use lisbon_core::column::COMPANY_ID;
use lisbon_core::error::Result;
use lisbon_core::field::Field;
use lisbon_core::types::CompanyId;
use chrono::NaiveDate;
use polars::prelude::*;

/// Which companies a fetch or factor computation covers.
///
/// Scoped (sample) runs are for research and debugging: they bypass cache
/// reads and never persist, so a partial universe can never masquerade as
/// the canonical artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityScope {
    /// The full universe the source knows about.
    All,
    /// A restricted set of companies.
    Companies(Vec<CompanyId>),
}

impl EntityScope {
    /// True for the full-universe scope.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// The scoped company keys as a series, `None` for the full universe.
    #[must_use]
    pub fn to_series(&self) -> Option<Series> {
        match self {
            Self::All => None,
            Self::Companies(ids) => {
                let keys: Vec<&str> = ids.iter().map(CompanyId::as_str).collect();
                Some(Series::new(COMPANY_ID.into(), keys))
            }
        }
    }
}

/// Restricts a frame to the companies in scope; a no-op for [`EntityScope::All`].
#[must_use]
pub fn scope_filter(lf: LazyFrame, scope: &EntityScope) -> LazyFrame {
    match scope.to_series() {
        None => lf,
        Some(keys) => lf.filter(col(COMPANY_ID).is_in(lit(keys))),
    }
}

/// Source of point-in-time financial statement data.
///
/// Both endpoints return one row per `(company, fiscal period)` with the
/// requested field columns appended to the key columns, field values
/// normalized to two decimal places, and date columns as calendar dates.
pub trait FundamentalsSource {
    /// Quarterly records: `company_id`, `period_end`, `fiscal_year`,
    /// `fiscal_quarter`, `report_date`, then one column per requested field.
    /// Rows are sorted by `report_date` ascending; rows with a null
    /// `report_date` or `period_end` are not returned (a record nobody could
    /// date is unusable for point-in-time work).
    fn quarterly(
        &self,
        fields: &[Field],
        scope: &EntityScope,
        start_year: i32,
    ) -> Result<DataFrame>;

    /// Annual records: `company_id`, `period_end`, `fiscal_year`, then one
    /// column per requested field. Sorted by `period_end` ascending. Annual
    /// records carry no report date of their own; they acquire one by being
    /// attached to the quarterly spine.
    fn annual(&self, fields: &[Field], scope: &EntityScope, start_year: i32) -> Result<DataFrame>;
}

/// Source of daily security-level market data.
pub trait MarketDataSource {
    /// Daily rows: `security_id`, `date`, `price`, `total_return`, `volume`,
    /// `shares_outstanding` (raw shares), `price_adj_factor`,
    /// `share_adj_factor`. Sorted by `(security_id, date)`.
    fn daily(&self, start: NaiveDate) -> Result<DataFrame>;

    /// The identifier link table: `security_id`, `company_id`, `valid_from`,
    /// `valid_to` (null meaning open-ended). Fetched once per run and held
    /// read-only.
    fn links(&self) -> Result<DataFrame>;
}
