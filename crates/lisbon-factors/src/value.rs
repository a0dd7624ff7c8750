//! Value factors: fundamental quantities scaled by market capitalization.
//!
//! Every factor here joins its fundamentals to the daily market-cap series
//! point-in-time on the report date, so a ratio on a trading date only ever
//! uses figures that were public by then.

use crate::inputs::{FactorInputs, item, ltm, ltm_of, market_output};
use crate::registry::{FactorCategory, FactorDef};
use lisbon_core::column::MARKET_CAP;
use lisbon_core::error::Result;
use lisbon_core::field::Field;
use lisbon_core::policy::FillPolicy;
use lisbon_temporal::asof::join_market_caps;
use polars::prelude::*;

/// Value factor definitions.
pub(crate) fn defs() -> Vec<FactorDef> {
    vec![
        FactorDef {
            name: "f_sp",
            category: FactorCategory::Value,
            description: "Trailing-twelve-month sales to market capitalization",
            quarterly: vec![(Field::Sales, FillPolicy::AsReported)],
            annual: vec![],
            needs_market_caps: true,
            formula: sales_to_price,
        },
        FactorDef {
            name: "f_btm",
            category: FactorCategory::Value,
            description: "Book equity to market capitalization",
            quarterly: vec![
                (Field::StockholdersEquity, FillPolicy::forward()),
                (Field::DeferredTaxesItc, FillPolicy::forward()),
                (Field::PreferredStock, FillPolicy::forward()),
            ],
            annual: vec![],
            needs_market_caps: true,
            formula: book_to_market,
        },
        FactorDef {
            name: "f_dtm",
            category: FactorCategory::Value,
            description: "Total debt to market capitalization",
            quarterly: vec![
                (Field::LongTermDebt, FillPolicy::forward()),
                (Field::ShortTermDebt, FillPolicy::forward()),
            ],
            annual: vec![],
            needs_market_caps: true,
            formula: debt_to_market,
        },
        FactorDef {
            name: "f_ep",
            category: FactorCategory::Value,
            description: "Trailing-twelve-month earnings to market capitalization",
            quarterly: vec![(Field::IncomeBeforeExtra, FillPolicy::AsReported)],
            annual: vec![],
            needs_market_caps: true,
            formula: earnings_to_price,
        },
        FactorDef {
            name: "f_cfp",
            category: FactorCategory::Value,
            description: "Trailing-twelve-month cash flow to market capitalization",
            quarterly: vec![
                (Field::IncomeBeforeExtra, FillPolicy::AsReported),
                (Field::DepreciationAmortization, FillPolicy::Zero),
            ],
            annual: vec![],
            needs_market_caps: true,
            formula: cashflow_to_price,
        },
        FactorDef {
            name: "f_py",
            category: FactorCategory::Value,
            description: "Dividends plus repurchases to market capitalization",
            quarterly: vec![
                (Field::DividendsPerShare, FillPolicy::Zero),
                (Field::CommonSharesOutstanding, FillPolicy::Zero),
                (Field::SharesRepurchased, FillPolicy::Zero),
                (Field::RepurchasePrice, FillPolicy::Zero),
            ],
            annual: vec![],
            needs_market_caps: true,
            formula: payout_yield,
        },
        FactorDef {
            name: "f_evm",
            category: FactorCategory::Value,
            description: "Enterprise value to trailing-twelve-month EBITDA",
            quarterly: vec![
                (Field::LongTermDebt, FillPolicy::forward()),
                (Field::ShortTermDebt, FillPolicy::forward()),
                (Field::NoncontrollingInterestTotal, FillPolicy::forward()),
                (Field::CashAndEquivalents, FillPolicy::forward()),
                (Field::PreferredStock, FillPolicy::forward()),
                (Field::Ebitda, FillPolicy::AsReported),
            ],
            annual: vec![],
            needs_market_caps: true,
            formula: ev_multiple,
        },
        FactorDef {
            name: "f_adp",
            category: FactorCategory::Value,
            description: "Annual advertising expense to market capitalization",
            quarterly: vec![],
            annual: vec![(Field::AdvertisingExpense, FillPolicy::Zero)],
            needs_market_caps: true,
            formula: advertising_to_market,
        },
        FactorDef {
            name: "f_rdp",
            category: FactorCategory::Value,
            description: "Trailing-twelve-month R&D expense to market capitalization",
            quarterly: vec![(Field::RndExpense, FillPolicy::Zero)],
            annual: vec![],
            needs_market_caps: true,
            formula: rd_to_market,
        },
    ]
}

fn sales_to_price(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    let fundamentals = inputs
        .fundamentals
        .clone()
        .lazy()
        .with_columns([ltm(Field::Sales, "sales_ltm")])
        .collect()?;

    let joined = join_market_caps(inputs.require_market_caps()?, &fundamentals)?;
    market_output(
        joined
            .lazy()
            .with_columns([(col("sales_ltm") / col(MARKET_CAP)).alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

/// Book equity per Rosenberg et al. (1985): common equity plus deferred
/// taxes and investment tax credit, less preferred stock.
fn book_to_market(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    let fundamentals = inputs
        .fundamentals
        .clone()
        .lazy()
        .with_columns([(item(Field::StockholdersEquity) + item(Field::DeferredTaxesItc)
            - item(Field::PreferredStock))
        .alias("book_equity")])
        .collect()?;

    let joined = join_market_caps(inputs.require_market_caps()?, &fundamentals)?;
    market_output(
        joined
            .lazy()
            .with_columns([(col("book_equity") / col(MARKET_CAP)).alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

fn debt_to_market(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    let fundamentals = inputs
        .fundamentals
        .clone()
        .lazy()
        .with_columns([
            (item(Field::LongTermDebt) + item(Field::ShortTermDebt)).alias("total_debt"),
        ])
        .collect()?;

    let joined = join_market_caps(inputs.require_market_caps()?, &fundamentals)?;
    market_output(
        joined
            .lazy()
            .with_columns([(col("total_debt") / col(MARKET_CAP)).alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

fn earnings_to_price(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    let fundamentals = inputs
        .fundamentals
        .clone()
        .lazy()
        .with_columns([ltm(Field::IncomeBeforeExtra, "income_ltm")])
        .collect()?;

    let joined = join_market_caps(inputs.require_market_caps()?, &fundamentals)?;
    market_output(
        joined
            .lazy()
            .with_columns([(col("income_ltm") / col(MARKET_CAP)).alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

/// Cash flow per Lakonishok et al. (1994): income before extraordinary
/// items plus depreciation and amortization.
fn cashflow_to_price(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    let fundamentals = inputs
        .fundamentals
        .clone()
        .lazy()
        .with_columns([(item(Field::IncomeBeforeExtra)
            + item(Field::DepreciationAmortization))
        .alias("cashflow")])
        .with_columns([ltm_of("cashflow", "cashflow_ltm")])
        .collect()?;

    let joined = join_market_caps(inputs.require_market_caps()?, &fundamentals)?;
    market_output(
        joined
            .lazy()
            .with_columns([(col("cashflow_ltm") / col(MARKET_CAP)).alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

/// Payout per Boudoukh et al. (2007): cash dividends plus gross repurchases,
/// not netted against issuance.
fn payout_yield(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    let fundamentals = inputs
        .fundamentals
        .clone()
        .lazy()
        .with_columns([
            (item(Field::DividendsPerShare) * item(Field::CommonSharesOutstanding))
                .alias("dividends"),
            (item(Field::SharesRepurchased) * item(Field::RepurchasePrice)).alias("repurchases"),
        ])
        .with_columns([(col("dividends") + col("repurchases")).alias("payout")])
        .with_columns([ltm_of("payout", "payout_ltm")])
        .collect()?;

    let joined = join_market_caps(inputs.require_market_caps()?, &fundamentals)?;
    market_output(
        joined
            .lazy()
            .with_columns([(col("payout_ltm") / col(MARKET_CAP)).alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

fn ev_multiple(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    let fundamentals = inputs
        .fundamentals
        .clone()
        .lazy()
        .with_columns([ltm(Field::Ebitda, "ebitda_ltm")])
        .collect()?;

    let joined = join_market_caps(inputs.require_market_caps()?, &fundamentals)?;
    market_output(
        joined
            .lazy()
            .with_columns([(col(MARKET_CAP)
                + item(Field::LongTermDebt)
                + item(Field::ShortTermDebt)
                + item(Field::NoncontrollingInterestTotal)
                - item(Field::CashAndEquivalents)
                + item(Field::PreferredStock))
            .alias("enterprise_value")])
            .with_columns([
                (col("enterprise_value") / col("ebitda_ltm")).alias(inputs.column.as_str()),
            ]),
        &inputs.column,
    )
}

// Advertising is only reported annually, and sparsely at that; the series
// carries reported zeros for some filers, so coverage is thinner than the
// other value factors.
fn advertising_to_market(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    let joined = join_market_caps(inputs.require_market_caps()?, &inputs.fundamentals)?;
    market_output(
        joined
            .lazy()
            .with_columns([(item(Field::AdvertisingExpense) / col(MARKET_CAP))
                .alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

fn rd_to_market(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    let fundamentals = inputs
        .fundamentals
        .clone()
        .lazy()
        .with_columns([ltm(Field::RndExpense, "rd_ltm")])
        .collect()?;

    let joined = join_market_caps(inputs.require_market_caps()?, &fundamentals)?;
    market_output(
        joined
            .lazy()
            .with_columns([(col("rd_ltm") / col(MARKET_CAP)).alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lisbon_core::column::{COMPANY_ID, DATE, FISCAL_YEAR, PERIOD_END, REPORT_DATE};
    use lisbon_core::frame::date_series;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn quarterly_sales() -> DataFrame {
        let period_ends = [
            d(2020, 3, 31),
            d(2020, 6, 30),
            d(2020, 9, 30),
            d(2020, 12, 31),
            d(2021, 3, 31),
        ];
        let report_dates = [
            d(2020, 5, 1),
            d(2020, 8, 1),
            d(2020, 11, 1),
            d(2021, 2, 1),
            d(2021, 5, 1),
        ];
        DataFrame::new(vec![
            Series::new(COMPANY_ID.into(), vec!["E1"; 5]).into(),
            date_series(PERIOD_END, &period_ends).unwrap().into(),
            Series::new(FISCAL_YEAR.into(), vec![2020i32, 2020, 2020, 2020, 2021]).into(),
            date_series(REPORT_DATE, &report_dates).unwrap().into(),
            Series::new("sales".into(), vec![100.0, 110.0, 120.0, 130.0, 140.0]).into(),
        ])
        .unwrap()
    }

    fn market_caps() -> DataFrame {
        DataFrame::new(vec![
            Series::new(COMPANY_ID.into(), vec!["E1", "E1"]).into(),
            date_series(DATE, &[d(2021, 3, 15), d(2021, 6, 15)])
                .unwrap()
                .into(),
            Series::new(lisbon_core::column::MARKET_CAP.into(), vec![2300i64, 2500]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn sales_to_price_uses_public_figures_only() {
        let caps = market_caps();
        let inputs = FactorInputs {
            column: "f_sp".to_string(),
            fundamentals: quarterly_sales(),
            market_caps: Some(&caps),
        };

        let out = sales_to_price(&inputs).unwrap();

        assert_eq!(out.height(), 2);
        let values: Vec<Option<f64>> = out.column("f_sp").unwrap().f64().unwrap().to_vec();
        // 2021-03-15: the LTM through 2020-12-31 (460) is public, the one
        // through 2021-03-31 (500) is not yet. 2021-06-15 sees 500.
        assert_eq!(values, vec![Some(460.0 / 2300.0), Some(500.0 / 2500.0)]);
    }

    #[test]
    fn missing_market_caps_is_a_schema_error() {
        let inputs = FactorInputs {
            column: "f_sp".to_string(),
            fundamentals: quarterly_sales(),
            market_caps: None,
        };
        assert!(sales_to_price(&inputs).is_err());
    }
}
