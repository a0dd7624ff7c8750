//! Identifier link resolution over validity intervals.
//!
//! The external link table maps security keys to company keys with a
//! validity window per row. At any instant a security belongs to at most one
//! company; when the input data violates that (two links valid for the same
//! security and date), every candidate row is dropped rather than one being
//! picked arbitrarily, and the drop is logged. Silent arbitrary resolution
//! corrupts every factor downstream; a missing row is visible.

use lisbon_core::column::{COMPANY_ID, SECURITY_ID, VALID_FROM, VALID_TO};
use lisbon_core::error::{Error, Result};
use lisbon_core::frame::{date_lit, days_since_epoch};
use lisbon_core::types::{CompanyId, SecurityId, FAR_FUTURE};
use chrono::NaiveDate;
use polars::prelude::*;
use tracing::warn;

const CANDIDATES: &str = "__candidates";

/// Normalized identifier link table, built once per run and held read-only.
#[derive(Debug, Clone)]
pub struct LinkTable {
    frame: DataFrame,
}

impl LinkTable {
    /// Normalizes a raw link table.
    ///
    /// Open-ended intervals (null `valid_to`) are materialized to
    /// [`FAR_FUTURE`] so plain range comparisons work; rows missing a key or
    /// a start date are unusable and removed; exact duplicate rows collapse
    /// to one.
    pub fn new(frame: DataFrame) -> Result<Self> {
        for column in [SECURITY_ID, COMPANY_ID, VALID_FROM, VALID_TO] {
            if frame.column(column).is_err() {
                return Err(Error::MissingColumn(column.to_string()));
            }
        }

        let frame = frame
            .lazy()
            .filter(
                col(SECURITY_ID)
                    .is_not_null()
                    .and(col(COMPANY_ID).is_not_null())
                    .and(col(VALID_FROM).is_not_null()),
            )
            .with_columns([col(VALID_TO).fill_null(date_lit(FAR_FUTURE))])
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?;

        Ok(Self { frame })
    }

    /// The normalized link rows.
    #[must_use]
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Company a security belongs to on a date, `None` when unmapped or
    /// ambiguous. The validity test is strictly inside the interval:
    /// `valid_from < date < valid_to`.
    pub fn resolve(&self, security: SecurityId, date: NaiveDate) -> Result<Option<CompanyId>> {
        let securities = self.frame.column(SECURITY_ID)?.i64()?;
        let companies = self.frame.column(COMPANY_ID)?.str()?;
        let from = self.frame.column(VALID_FROM)?.as_materialized_series().date()?.clone();
        let to = self.frame.column(VALID_TO)?.as_materialized_series().date()?.clone();
        let day = days_since_epoch(date);

        let mut found: Option<&str> = None;
        for row in 0..self.frame.height() {
            if securities.get(row) != Some(security.value()) {
                continue;
            }
            let inside = from.get(row).is_some_and(|f| f < day)
                && to.get(row).is_some_and(|t| day < t);
            if !inside {
                continue;
            }
            match (found, companies.get(row)) {
                (None, Some(company)) => found = Some(company),
                (Some(prev), Some(company)) if prev != company => {
                    warn!(security = security.value(), %date, "ambiguous identifier link");
                    return Ok(None);
                }
                _ => {}
            }
        }
        Ok(found.map(CompanyId::new))
    }

    /// Bulk variant: attaches `company_id` to every row of a
    /// security-keyed frame whose date falls inside a validity interval.
    ///
    /// Rows whose security resolves to nothing are excluded. Rows where more
    /// than one candidate survives for the same `(security, date)` are all
    /// dropped, never narrowed to one, and the count is logged.
    pub fn attach_companies(&self, frame: &DataFrame, date_column: &str) -> Result<DataFrame> {
        let joined = frame
            .clone()
            .lazy()
            .join(
                self.frame.clone().lazy(),
                [col(SECURITY_ID)],
                [col(SECURITY_ID)],
                JoinArgs::new(JoinType::Inner),
            )
            .filter(
                col(date_column)
                    .gt(col(VALID_FROM))
                    .and(col(date_column).lt(col(VALID_TO))),
            )
            .with_columns([col(COMPANY_ID)
                .count()
                .over([col(SECURITY_ID), col(date_column)])
                .alias(CANDIDATES)])
            .collect()?;

        let matched = joined.height();
        let resolved = joined
            .lazy()
            .filter(col(CANDIDATES).eq(lit(1)))
            .collect()?
            .drop_many([CANDIDATES, VALID_FROM, VALID_TO]);

        let dropped = matched - resolved.height();
        if dropped > 0 {
            warn!(dropped, "dropped rows with ambiguous identifier links");
        }
        Ok(resolved)
    }
}
