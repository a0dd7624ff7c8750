//! Entity-level market capitalization.
//!
//! Security-level price × shares outstanding, resolved to companies through
//! the link table and summed across share classes. The result is the
//! denominator series for every valuation factor, so its unit is fixed and
//! documented: whole currency units, truncated to an integer.

use crate::link::LinkTable;
use lisbon_core::column::{COMPANY_ID, DATE, MARKET_CAP, PRICE, SECURITY_ID, SHARES_OUTSTANDING};
use lisbon_core::error::Result;
use polars::prelude::*;

const SECURITY_MARKET_CAP: &str = "security_market_cap";

/// Builds the per-company daily market capitalization series.
///
/// Per daily row, `price * shares_outstanding`; each row is resolved to the
/// company owning the security on that date; all share classes of a company
/// are summed per date. A security with no valid (or an ambiguous) link on a
/// date contributes nothing: exclusion, not zero. The total is truncated to
/// whole currency units.
///
/// Deterministic: identical inputs produce a bit-identical frame, sorted by
/// `(company_id, date)`. Built once per run and shared read-only afterwards.
pub fn build_market_caps(daily: &DataFrame, links: &LinkTable) -> Result<DataFrame> {
    let security_caps = daily
        .clone()
        .lazy()
        .select([
            col(SECURITY_ID),
            col(DATE),
            (col(PRICE) * col(SHARES_OUTSTANDING)).alias(SECURITY_MARKET_CAP),
        ])
        .filter(col(SECURITY_MARKET_CAP).is_not_null())
        .collect()?;

    let resolved = links.attach_companies(&security_caps, DATE)?;

    Ok(resolved
        .lazy()
        .group_by([col(COMPANY_ID), col(DATE)])
        .agg([col(SECURITY_MARKET_CAP).sum().alias(MARKET_CAP)])
        .with_columns([col(MARKET_CAP).cast(DataType::Int64)])
        .sort([COMPANY_ID, DATE], Default::default())
        .collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lisbon_core::column::{VALID_FROM, VALID_TO};
    use lisbon_core::frame::{date_series, optional_date_series};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn links() -> LinkTable {
        // Securities 1 and 2 are two share classes of E1; 3 belongs to E2;
        // 4 is unmapped.
        LinkTable::new(
            DataFrame::new(vec![
                Series::new(SECURITY_ID.into(), vec![1i64, 2, 3]).into(),
                Series::new(COMPANY_ID.into(), vec!["E1", "E1", "E2"]).into(),
                date_series(VALID_FROM, &[d(2000, 1, 1); 3]).unwrap().into(),
                optional_date_series(VALID_TO, &[None, None, None])
                    .unwrap()
                    .into(),
            ])
            .unwrap(),
        )
        .unwrap()
    }

    fn daily() -> DataFrame {
        DataFrame::new(vec![
            Series::new(SECURITY_ID.into(), vec![1i64, 2, 3, 4]).into(),
            date_series(DATE, &[d(2021, 3, 15); 4]).unwrap().into(),
            Series::new(PRICE.into(), vec![50.0, 25.0, 10.0, 7.0]).into(),
            Series::new(
                SHARES_OUTSTANDING.into(),
                vec![1_000_000.0, 2_000_000.0, 500_000.0, 100_000.0],
            )
            .into(),
        ])
        .unwrap()
    }

    #[test]
    fn share_classes_sum_per_company() {
        let caps = build_market_caps(&daily(), &links()).unwrap();

        assert_eq!(caps.height(), 2);
        let companies: Vec<Option<&str>> = caps
            .column(COMPANY_ID)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        let values: Vec<Option<i64>> = caps.column(MARKET_CAP).unwrap().i64().unwrap().to_vec();
        // 50 * 1,000,000 + 25 * 2,000,000 for E1; the unmapped security 4
        // contributes nowhere.
        assert_eq!(companies, vec![Some("E1"), Some("E2")]);
        assert_eq!(values, vec![Some(100_000_000), Some(5_000_000)]);
    }

    #[test]
    fn truncates_to_whole_units() {
        let daily = DataFrame::new(vec![
            Series::new(SECURITY_ID.into(), vec![1i64]).into(),
            date_series(DATE, &[d(2021, 3, 15)]).unwrap().into(),
            Series::new(PRICE.into(), vec![10.507]).into(),
            Series::new(SHARES_OUTSTANDING.into(), vec![100.0]).into(),
        ])
        .unwrap();

        let caps = build_market_caps(&daily, &links()).unwrap();
        let values: Vec<Option<i64>> = caps.column(MARKET_CAP).unwrap().i64().unwrap().to_vec();
        assert_eq!(values, vec![Some(1050)]);
    }

    #[test]
    fn null_prices_are_excluded_not_zeroed() {
        let daily = DataFrame::new(vec![
            Series::new(SECURITY_ID.into(), vec![1i64, 2]).into(),
            date_series(DATE, &[d(2021, 3, 15); 2]).unwrap().into(),
            Series::new(PRICE.into(), vec![None, Some(25.0)]).into(),
            Series::new(SHARES_OUTSTANDING.into(), vec![1_000_000.0, 2_000_000.0]).into(),
        ])
        .unwrap();

        let caps = build_market_caps(&daily, &links()).unwrap();
        let values: Vec<Option<i64>> = caps.column(MARKET_CAP).unwrap().i64().unwrap().to_vec();
        assert_eq!(values, vec![Some(50_000_000)]);
    }

    #[test]
    fn rebuild_is_bit_identical() {
        let first = build_market_caps(&daily(), &links()).unwrap();
        let second = build_market_caps(&daily(), &links()).unwrap();
        assert_eq!(first, second);
    }
}
