//! Point-in-time (as-of) joins between entity-keyed time series.
//!
//! The left side carries observation dates (trading dates, typically); the
//! right side carries a "known as of" date per record. Backward joins attach
//! the most recent right record whose known date does not exceed the left
//! date; forward joins attach the earliest record at or after it. Either
//! direction can be bounded by a tolerance window.
//!
//! The joiner is written out explicitly over per-entity sorted indices
//! rather than delegated to an engine join: the tie-break, tolerance,
//! null-known-date and cardinality rules here are what keeps look-ahead out
//! of every derived factor, and they are pinned down by the tests below.
//!
//! Guarantees:
//!
//! - output has exactly the left frame's rows, in the left frame's order;
//! - right rows with a null date are excluded before matching;
//! - no match within tolerance yields nulls, never an error;
//! - in backward mode an attached record always satisfies
//!   `known date <= left date`.

use chrono::Duration;
use lisbon_core::column::{COMPANY_ID, DATE, FISCAL_YEAR, PERIOD_END, REPORT_DATE};
use lisbon_core::error::{Error, Result};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};

/// Match direction for an as-of join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsofDirection {
    /// Most recent right record with date `<=` the left date; ties broken by
    /// preferring the latest such record.
    Backward,
    /// Earliest right record with date `>=` the left date.
    Forward,
}

/// Arguments for [`asof_join`].
#[derive(Debug, Clone)]
pub struct AsofArgs {
    /// Date column on the left frame.
    pub left_on: String,
    /// Date column on the right frame (the "known as of" date).
    pub right_on: String,
    /// Entity column present on both sides; matching never crosses it.
    pub by: String,
    /// Match direction.
    pub direction: AsofDirection,
    /// Maximum distance between left and right dates; unbounded when `None`.
    pub tolerance: Option<Duration>,
}

impl AsofArgs {
    /// Backward as-of join arguments.
    #[must_use]
    pub fn backward(left_on: &str, right_on: &str, by: &str) -> Self {
        Self {
            left_on: left_on.to_string(),
            right_on: right_on.to_string(),
            by: by.to_string(),
            direction: AsofDirection::Backward,
            tolerance: None,
        }
    }

    /// Forward as-of join arguments.
    #[must_use]
    pub fn forward(left_on: &str, right_on: &str, by: &str) -> Self {
        Self {
            direction: AsofDirection::Forward,
            ..Self::backward(left_on, right_on, by)
        }
    }

    /// Bounds the match distance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
}

/// Entity key of a single row; link keys are strings for companies and
/// integers for securities, so both dtypes are supported.
#[derive(PartialEq, Eq, Hash, Clone, Copy)]
enum Key<'a> {
    Str(&'a str),
    Int(i64),
}

enum KeyColumn<'a> {
    Str(&'a StringChunked),
    Int(&'a Int64Chunked),
}

impl<'a> KeyColumn<'a> {
    fn new(column: &'a Column, name: &str) -> Result<Self> {
        match column.dtype() {
            DataType::String => Ok(Self::Str(column.str()?)),
            DataType::Int64 => Ok(Self::Int(column.i64()?)),
            other => Err(Error::Source(format!(
                "unsupported entity key dtype {other} in column {name}"
            ))),
        }
    }

    fn get(&self, idx: usize) -> Option<Key<'a>> {
        match self {
            Self::Str(ca) => ca.get(idx).map(Key::Str),
            Self::Int(ca) => ca.get(idx).map(Key::Int),
        }
    }
}

fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| Error::MissingColumn(name.to_string()))
}

fn date_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a DateChunked> {
    let column = require_column(df, name)?;
    column
        .as_materialized_series()
        .date()
        .map_err(|_| Error::Source(format!("column {name} must have dtype Date")))
}

/// As-of joins `right` onto `left` per entity.
///
/// All right columns except the entity column are appended to the left
/// frame; a right column whose name collides with a left column is suffixed
/// `_right`. Unmatched left rows receive nulls in every appended column.
pub fn asof_join(left: &DataFrame, right: &DataFrame, args: &AsofArgs) -> Result<DataFrame> {
    let left_dates = date_column(left, &args.left_on)?;
    let right_dates = date_column(right, &args.right_on)?;
    let left_keys = KeyColumn::new(require_column(left, &args.by)?, &args.by)?;
    let right_keys = KeyColumn::new(require_column(right, &args.by)?, &args.by)?;

    // Per-entity (date, row) index over the right side. Rows with a null
    // known date can never legitimately be "as of" anything and are dropped
    // from the match universe here.
    let mut index: HashMap<Key<'_>, Vec<(i32, IdxSize)>> = HashMap::new();
    for row in 0..right.height() {
        if let (Some(key), Some(days)) = (right_keys.get(row), right_dates.get(row)) {
            index.entry(key).or_default().push((days, row as IdxSize));
        }
    }
    for entries in index.values_mut() {
        entries.sort_unstable();
    }

    let tolerance_days = args.tolerance.map(|d| d.num_days());

    let picked: Vec<Option<IdxSize>> = (0..left.height())
        .map(|row| {
            let (Some(key), Some(days)) = (left_keys.get(row), left_dates.get(row)) else {
                return None;
            };
            let entries = index.get(&key)?;
            match args.direction {
                AsofDirection::Backward => {
                    let pos = entries.partition_point(|(d, _)| *d <= days);
                    let (matched, idx) = *entries.get(pos.checked_sub(1)?)?;
                    within_tolerance(i64::from(days - matched), tolerance_days).then_some(idx)
                }
                AsofDirection::Forward => {
                    let pos = entries.partition_point(|(d, _)| *d < days);
                    let (matched, idx) = *entries.get(pos)?;
                    within_tolerance(i64::from(matched - days), tolerance_days).then_some(idx)
                }
            }
        })
        .collect();

    let indices: IdxCa = picked.into_iter().collect();

    let value_columns: Vec<String> = right
        .get_columns()
        .iter()
        .map(|c| c.name().to_string())
        .filter(|name| name != &args.by)
        .collect();
    let mut attached = right
        .select(value_columns.iter().map(String::as_str))?
        .take(&indices)?;

    let left_names: HashSet<&str> = left.get_columns().iter().map(|c| c.name().as_str()).collect();
    for name in &value_columns {
        if left_names.contains(name.as_str()) {
            attached.rename(name, format!("{name}_right").into())?;
        }
    }

    let mut out = left.clone();
    out.hstack_mut(attached.get_columns())?;
    Ok(out)
}

const fn within_tolerance(distance: i64, tolerance: Option<i64>) -> bool {
    match tolerance {
        Some(t) => distance <= t,
        None => true,
    }
}

/// Attaches annual records to a quarterly spine.
///
/// Each quarterly row receives the most recent annual record whose period
/// end is on or before the quarterly period end, per company. Annual items
/// thereby inherit the quarterly report dates for downstream point-in-time
/// joins. The annual side's own period-end and fiscal-year columns are
/// dropped after matching.
pub fn attach_annual(quarterly: &DataFrame, annual: &DataFrame) -> Result<DataFrame> {
    let joined = asof_join(
        quarterly,
        annual,
        &AsofArgs::backward(PERIOD_END, PERIOD_END, COMPANY_ID),
    )?;
    Ok(joined.drop_many([
        format!("{PERIOD_END}_right"),
        format!("{FISCAL_YEAR}_right"),
    ]))
}

/// Aligns quarterly fundamentals to daily market-cap rows.
///
/// Left side: `(company_id, date, market_cap)` rows. Right side: fundamental
/// records keyed by report date. Each market-cap row receives the latest
/// record that was public on its date. Output cardinality equals the
/// market-cap frame's.
pub fn join_market_caps(market_caps: &DataFrame, fundamentals: &DataFrame) -> Result<DataFrame> {
    asof_join(
        market_caps,
        fundamentals,
        &AsofArgs::backward(DATE, REPORT_DATE, COMPANY_ID),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lisbon_core::column::MARKET_CAP;
    use lisbon_core::frame::{date_series, optional_date_series};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn left_frame(dates: &[NaiveDate]) -> DataFrame {
        let companies: Vec<&str> = vec!["E1"; dates.len()];
        DataFrame::new(vec![
            Series::new(COMPANY_ID.into(), companies).into(),
            date_series(DATE, dates).unwrap().into(),
        ])
        .unwrap()
    }

    fn right_frame(dates: &[NaiveDate], values: &[f64]) -> DataFrame {
        let companies: Vec<&str> = vec!["E1"; dates.len()];
        DataFrame::new(vec![
            Series::new(COMPANY_ID.into(), companies).into(),
            date_series(REPORT_DATE, dates).unwrap().into(),
            Series::new("value".into(), values.to_vec()).into(),
        ])
        .unwrap()
    }

    #[test]
    fn backward_selects_latest_known_record() {
        let left = left_frame(&[d(2021, 3, 15)]);
        let right = right_frame(&[d(2021, 1, 20), d(2021, 4, 22)], [460.0, 500.0].as_ref());

        let out = asof_join(
            &left,
            &right,
            &AsofArgs::backward(DATE, REPORT_DATE, COMPANY_ID),
        )
        .unwrap();

        let vals: Vec<Option<f64>> = out.column("value").unwrap().f64().unwrap().to_vec();
        assert_eq!(vals, vec![Some(460.0)]);
    }

    #[test]
    fn backward_never_looks_ahead() {
        // The only right record is known after the left date: no match.
        let left = left_frame(&[d(2021, 3, 15)]);
        let right = right_frame(&[d(2021, 3, 16)], [999.0].as_ref());

        let out = asof_join(
            &left,
            &right,
            &AsofArgs::backward(DATE, REPORT_DATE, COMPANY_ID),
        )
        .unwrap();

        assert_eq!(out.column("value").unwrap().null_count(), 1);
    }

    #[test]
    fn same_day_report_is_visible() {
        let left = left_frame(&[d(2021, 3, 15)]);
        let right = right_frame(&[d(2021, 3, 15)], [7.0].as_ref());

        let out = asof_join(
            &left,
            &right,
            &AsofArgs::backward(DATE, REPORT_DATE, COMPANY_ID),
        )
        .unwrap();

        let vals: Vec<Option<f64>> = out.column("value").unwrap().f64().unwrap().to_vec();
        assert_eq!(vals, vec![Some(7.0)]);
    }

    #[test]
    fn null_known_dates_are_excluded() {
        let left = left_frame(&[d(2021, 3, 15)]);
        let companies = vec!["E1", "E1"];
        let right = DataFrame::new(vec![
            Series::new(COMPANY_ID.into(), companies).into(),
            optional_date_series(REPORT_DATE, &[None, Some(d(2021, 1, 20))])
                .unwrap()
                .into(),
            Series::new("value".into(), vec![111.0, 460.0]).into(),
        ])
        .unwrap();

        let out = asof_join(
            &left,
            &right,
            &AsofArgs::backward(DATE, REPORT_DATE, COMPANY_ID),
        )
        .unwrap();

        let vals: Vec<Option<f64>> = out.column("value").unwrap().f64().unwrap().to_vec();
        assert_eq!(vals, vec![Some(460.0)]);
    }

    #[test]
    fn cardinality_matches_left_and_entities_stay_separate() {
        let left = DataFrame::new(vec![
            Series::new(COMPANY_ID.into(), vec!["E1", "E2", "E3"]).into(),
            date_series(DATE, &[d(2021, 3, 15), d(2021, 3, 15), d(2021, 3, 15)])
                .unwrap()
                .into(),
        ])
        .unwrap();
        let right = DataFrame::new(vec![
            Series::new(COMPANY_ID.into(), vec!["E1", "E2"]).into(),
            date_series(REPORT_DATE, &[d(2021, 1, 20), d(2021, 2, 10)])
                .unwrap()
                .into(),
            Series::new("value".into(), vec![1.0, 2.0]).into(),
        ])
        .unwrap();

        let out = asof_join(
            &left,
            &right,
            &AsofArgs::backward(DATE, REPORT_DATE, COMPANY_ID),
        )
        .unwrap();

        assert_eq!(out.height(), 3);
        let vals: Vec<Option<f64>> = out.column("value").unwrap().f64().unwrap().to_vec();
        // E1 gets E1's record, E2 gets E2's, E3 has no history at all.
        assert_eq!(vals, vec![Some(1.0), Some(2.0), None]);
    }

    #[test]
    fn forward_respects_tolerance() {
        let left = left_frame(&[d(2021, 3, 15), d(2021, 3, 15)]);
        let right = right_frame(&[d(2021, 4, 22)], [5.0].as_ref());

        let within = asof_join(
            &left,
            &right,
            &AsofArgs::forward(DATE, REPORT_DATE, COMPANY_ID)
                .with_tolerance(Duration::days(60)),
        )
        .unwrap();
        let vals: Vec<Option<f64>> = within.column("value").unwrap().f64().unwrap().to_vec();
        assert_eq!(vals, vec![Some(5.0), Some(5.0)]);

        let outside = asof_join(
            &left,
            &right,
            &AsofArgs::forward(DATE, REPORT_DATE, COMPANY_ID)
                .with_tolerance(Duration::days(30)),
        )
        .unwrap();
        assert_eq!(outside.column("value").unwrap().null_count(), 2);
    }

    #[test]
    fn backward_tolerance_bounds_staleness() {
        let left = left_frame(&[d(2021, 3, 15)]);
        let right = right_frame(&[d(2020, 1, 20)], [3.0].as_ref());

        let out = asof_join(
            &left,
            &right,
            &AsofArgs::backward(DATE, REPORT_DATE, COMPANY_ID)
                .with_tolerance(Duration::days(180)),
        )
        .unwrap();
        assert_eq!(out.column("value").unwrap().null_count(), 1);
    }

    #[test]
    fn colliding_right_columns_get_suffixed() {
        let mut left = left_frame(&[d(2021, 3, 15)]);
        left.with_column(Series::new("value".into(), vec![1.0]))
            .unwrap();
        let right = right_frame(&[d(2021, 1, 20)], [2.0].as_ref());

        let out = asof_join(
            &left,
            &right,
            &AsofArgs::backward(DATE, REPORT_DATE, COMPANY_ID),
        )
        .unwrap();

        let original: Vec<Option<f64>> = out.column("value").unwrap().f64().unwrap().to_vec();
        let attached: Vec<Option<f64>> = out.column("value_right").unwrap().f64().unwrap().to_vec();
        assert_eq!(original, vec![Some(1.0)]);
        assert_eq!(attached, vec![Some(2.0)]);
    }

    #[test]
    fn attach_annual_gives_annual_items_a_quarterly_spine() {
        let quarterly = DataFrame::new(vec![
            Series::new(COMPANY_ID.into(), vec!["E1", "E1", "E1"]).into(),
            date_series(
                PERIOD_END,
                &[d(2020, 9, 30), d(2020, 12, 31), d(2021, 3, 31)],
            )
            .unwrap()
            .into(),
            Series::new(FISCAL_YEAR.into(), vec![2020i32, 2020, 2021]).into(),
        ])
        .unwrap();
        let annual = DataFrame::new(vec![
            Series::new(COMPANY_ID.into(), vec!["E1"]).into(),
            date_series(PERIOD_END, &[d(2020, 12, 31)]).unwrap().into(),
            Series::new(FISCAL_YEAR.into(), vec![2020i32]).into(),
            Series::new("capital_expenditure".into(), vec![42.0]).into(),
        ])
        .unwrap();

        let out = attach_annual(&quarterly, &annual).unwrap();

        assert_eq!(out.height(), 3);
        assert!(out.column("period_end_right").is_err());
        let capex: Vec<Option<f64>> = out
            .column("capital_expenditure")
            .unwrap()
            .f64()
            .unwrap()
            .to_vec();
        // Annual figure only becomes available from its period end onward.
        assert_eq!(capex, vec![None, Some(42.0), Some(42.0)]);
    }

    #[test]
    fn market_cap_alignment_uses_report_dates() {
        let market_caps = DataFrame::new(vec![
            Series::new(COMPANY_ID.into(), vec!["E1", "E1"]).into(),
            date_series(DATE, &[d(2021, 1, 19), d(2021, 3, 15)])
                .unwrap()
                .into(),
            Series::new(MARKET_CAP.into(), vec![1_000_000i64, 1_100_000]).into(),
        ])
        .unwrap();
        let fundamentals = right_frame(&[d(2021, 1, 20), d(2021, 4, 22)], [460.0, 500.0].as_ref());

        let out = join_market_caps(&market_caps, &fundamentals).unwrap();

        assert_eq!(out.height(), 2);
        let vals: Vec<Option<f64>> = out.column("value").unwrap().f64().unwrap().to_vec();
        // The day before the first report there is nothing public yet.
        assert_eq!(vals, vec![None, Some(460.0)]);
    }
}
