//! Canonical column names shared by every frame in the workspace.
//!
//! `period_end` is the fiscal date a figure describes; `report_date` is the
//! date it became public. Market data carries a single `date` because the
//! two coincide there. Every join against market data aligns on
//! `report_date`, never `period_end`, to keep look-ahead out of the
//! derived tables.

/// Company key column.
pub const COMPANY_ID: &str = "company_id";
/// Security key column.
pub const SECURITY_ID: &str = "security_id";

/// Trading/reference date column of market-level frames.
pub const DATE: &str = "date";
/// Fiscal period-end date of a fundamental record.
pub const PERIOD_END: &str = "period_end";
/// Date a fundamental record became public.
pub const REPORT_DATE: &str = "report_date";
/// Fiscal year of a fundamental record.
pub const FISCAL_YEAR: &str = "fiscal_year";
/// Fiscal quarter (1-4) of a quarterly record.
pub const FISCAL_QUARTER: &str = "fiscal_quarter";

/// Unadjusted close price.
pub const PRICE: &str = "price";
/// Daily total return (dividends included).
pub const TOTAL_RETURN: &str = "total_return";
/// Daily share volume.
pub const VOLUME: &str = "volume";
/// Shares outstanding, in raw shares.
pub const SHARES_OUTSTANDING: &str = "shares_outstanding";
/// Cumulative price adjustment factor (splits/dividends).
pub const PRICE_ADJ_FACTOR: &str = "price_adj_factor";
/// Cumulative share adjustment factor.
pub const SHARE_ADJ_FACTOR: &str = "share_adj_factor";

/// Start of a link validity interval.
pub const VALID_FROM: &str = "valid_from";
/// End of a link validity interval (sentinel-filled, never null).
pub const VALID_TO: &str = "valid_to";

/// Entity-level market capitalization, whole currency units.
pub const MARKET_CAP: &str = "market_cap";

/// Prefix shared by every factor output column.
pub const FACTOR_PREFIX: &str = "f_";

/// Builds the output column name for a factor short name.
///
/// Passing a name that already carries the prefix returns it unchanged, so
/// registry names (`f_btm`) and bare short names (`btm`) both work.
#[must_use]
pub fn factor_column(name: &str) -> String {
    if name.starts_with(FACTOR_PREFIX) {
        name.to_string()
    } else {
        format!("{FACTOR_PREFIX}{name}")
    }
}

/// Returns true for columns produced by the factor engine.
#[must_use]
pub fn is_factor_column(name: &str) -> bool {
    name.starts_with(FACTOR_PREFIX)
}
