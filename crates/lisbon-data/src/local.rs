//! Directory-backed source implementation.
//!
//! Reads raw tables from parquet files in a single directory, the layout a
//! download job leaves behind. Used by the CLI and integration tests; a live
//! database client implements the same traits elsewhere.
//!
//! Expected files:
//!
//! - `fundamentals_q.parquet`: quarterly fundamentals, all known fields
//! - `fundamentals_a.parquet`: annual fundamentals
//! - `daily.parquet`: daily security-level market data
//! - `links.parquet`: identifier link validity table

use crate::source::{EntityScope, FundamentalsSource, MarketDataSource, scope_filter};
use chrono::NaiveDate;
use lisbon_core::column::{
    COMPANY_ID, DATE, FISCAL_QUARTER, FISCAL_YEAR, PERIOD_END, REPORT_DATE, SECURITY_ID,
};
use lisbon_core::error::{Error, Result};
use lisbon_core::field::{Field, Frequency};
use lisbon_core::frame::{date_lit, round_columns};
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// Quarterly fundamentals file name.
pub const QUARTERLY_FILE: &str = "fundamentals_q.parquet";
/// Annual fundamentals file name.
pub const ANNUAL_FILE: &str = "fundamentals_a.parquet";
/// Daily market data file name.
pub const DAILY_FILE: &str = "daily.parquet";
/// Identifier link table file name.
pub const LINKS_FILE: &str = "links.parquet";

/// Source reading raw tables from a parquet directory.
#[derive(Debug, Clone)]
pub struct LocalSource {
    dir: PathBuf,
}

impl LocalSource {
    /// Creates a source over a directory of raw parquet tables.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory this source reads from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn scan(&self, file: &str) -> Result<LazyFrame> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Err(Error::Source(format!(
                "raw table not found: {}",
                path.display()
            )));
        }
        LazyFrame::scan_parquet(&path, ScanArgsParquet::default())
            .map_err(|e| Error::Source(format!("cannot scan {}: {e}", path.display())))
    }

    fn check_frequency(fields: &[Field], expected: Frequency) -> Result<()> {
        for field in fields {
            if field.frequency() != expected {
                return Err(Error::Source(format!(
                    "field {field} is not reported at the requested frequency"
                )));
            }
        }
        Ok(())
    }
}

impl FundamentalsSource for LocalSource {
    fn quarterly(
        &self,
        fields: &[Field],
        scope: &EntityScope,
        start_year: i32,
    ) -> Result<DataFrame> {
        Self::check_frequency(fields, Frequency::Quarterly)?;

        let mut columns = vec![
            col(COMPANY_ID),
            col(PERIOD_END),
            col(FISCAL_YEAR),
            col(FISCAL_QUARTER),
            col(REPORT_DATE),
        ];
        columns.extend(fields.iter().map(|f| col(f.column())));

        let lf = self
            .scan(QUARTERLY_FILE)?
            .select(columns)
            .filter(col(FISCAL_YEAR).gt_eq(lit(start_year)))
            .filter(col(REPORT_DATE).is_not_null())
            .filter(col(PERIOD_END).is_not_null())
            .sort([REPORT_DATE], Default::default());

        let mut df = scope_filter(lf, scope).collect()?;
        let names: Vec<&str> = fields.iter().map(|f| f.column()).collect();
        round_columns(&mut df, &names, 2)?;
        Ok(df)
    }

    fn annual(&self, fields: &[Field], scope: &EntityScope, start_year: i32) -> Result<DataFrame> {
        Self::check_frequency(fields, Frequency::Annual)?;

        let mut columns = vec![col(COMPANY_ID), col(PERIOD_END), col(FISCAL_YEAR)];
        columns.extend(fields.iter().map(|f| col(f.column())));

        let lf = self
            .scan(ANNUAL_FILE)?
            .select(columns)
            .filter(col(FISCAL_YEAR).gt_eq(lit(start_year)))
            .filter(col(PERIOD_END).is_not_null())
            .sort([PERIOD_END], Default::default());

        let mut df = scope_filter(lf, scope).collect()?;
        let names: Vec<&str> = fields.iter().map(|f| f.column()).collect();
        round_columns(&mut df, &names, 2)?;
        Ok(df)
    }
}

impl MarketDataSource for LocalSource {
    fn daily(&self, start: NaiveDate) -> Result<DataFrame> {
        Ok(self
            .scan(DAILY_FILE)?
            .filter(col(DATE).gt_eq(date_lit(start)))
            .sort([SECURITY_ID, DATE], Default::default())
            .collect()?)
    }

    fn links(&self) -> Result<DataFrame> {
        Ok(self.scan(LINKS_FILE)?.collect()?)
    }
}
