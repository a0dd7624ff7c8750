//! Entity-partitioned transforms over time series frames.
//!
//! Every transform is a window expression partitioned on an entity column,
//! so values never cross from one entity's history into another's even when
//! series for many entities live concatenated in a single frame. Callers
//! must order rows per entity (ascending by the series date) before
//! applying any of these; [`sort_for_transforms`] does exactly that.

use polars::prelude::*;

/// Sorts a frame by `(entity, order)` ascending, the layout the transforms
/// in this module require.
pub fn sort_for_transforms(lf: LazyFrame, entity: &str, order: &str) -> LazyFrame {
    lf.sort([entity, order], Default::default())
}

/// Trailing-window sum within each entity partition.
///
/// Produces null while fewer than `min_periods` observations exist: at the
/// start of an entity's history, and whenever an observation inside the
/// window is itself missing. With `window = min_periods = 4` over quarterly
/// rows this turns flow items into trailing-twelve-month figures.
#[must_use]
pub fn rolling_sum(column: &str, window: usize, min_periods: usize, entity: &str) -> Expr {
    col(column)
        .rolling_sum(RollingOptionsFixedWindow {
            window_size: window,
            min_periods,
            ..Default::default()
        })
        .over([col(entity)])
}

/// Propagates the last non-null value forward within each entity partition,
/// for at most `limit` consecutive missing observations.
///
/// Beyond the bound the value stays missing: quarterly balance-sheet levels
/// may be carried into unreported quarters, but stale data past the limit
/// must not be fabricated.
#[must_use]
pub fn forward_fill(column: &str, limit: u32, entity: &str) -> Expr {
    col(column).forward_fill(Some(limit)).over([col(entity)])
}

/// Value `periods` rows back within the entity partition; the first
/// `periods` rows per entity are null.
///
/// Over quarterly rows, `lag(_, 4, _)` is the year-ago observation.
#[must_use]
pub fn lag(column: &str, periods: i64, entity: &str) -> Expr {
    col(column).shift(lit(periods)).over([col(entity)])
}

/// Replaces missing values with a constant (typically zero, for flow items
/// where an absent report means no activity).
#[must_use]
pub fn fill_missing(column: &str, constant: f64) -> Expr {
    col(column).fill_null(lit(constant))
}
