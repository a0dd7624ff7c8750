//! Accrual and external-financing factors.
//!
//! All three compare balance-sheet positions against their year-ago values
//! and scale by average total assets, so the declared policies forward-fill
//! the stock items before any difference is taken.

use crate::inputs::{FactorInputs, fundamental_output, item, ltm_of, year_ago};
use crate::registry::{FactorCategory, FactorDef};
use lisbon_core::error::Result;
use lisbon_core::field::Field;
use lisbon_core::policy::FillPolicy;
use polars::prelude::*;

/// Accrual factor definitions.
pub(crate) fn defs() -> Vec<FactorDef> {
    vec![
        FactorDef {
            name: "f_oa",
            category: FactorCategory::Accruals,
            description: "Operating accruals, Sloan (1996)",
            quarterly: vec![
                (Field::CurrentAssets, FillPolicy::forward()),
                (Field::TotalAssets, FillPolicy::forward()),
                (Field::CashAndEquivalents, FillPolicy::forward()),
                (Field::CurrentLiabilities, FillPolicy::forward()),
                (Field::ShortTermDebt, FillPolicy::forward()),
                (Field::IncomeTaxesPayable, FillPolicy::forward()),
                (Field::DepreciationAmortization, FillPolicy::forward()),
            ],
            annual: vec![],
            needs_market_caps: false,
            formula: operating_accruals,
        },
        FactorDef {
            name: "f_ta",
            category: FactorCategory::Accruals,
            description: "Total accruals, Richardson et al. (2005)",
            quarterly: vec![
                (Field::CurrentAssets, FillPolicy::forward()),
                (Field::TotalAssets, FillPolicy::forward()),
                (Field::CashAndEquivalents, FillPolicy::forward()),
                (Field::CurrentLiabilities, FillPolicy::forward()),
                (Field::ShortTermDebt, FillPolicy::forward()),
                (Field::TotalLiabilities, FillPolicy::forward()),
                (Field::LongTermDebt, FillPolicy::forward()),
                (Field::ShortTermInvestments, FillPolicy::forward()),
                (Field::PreferredStock, FillPolicy::forward()),
            ],
            annual: vec![(Field::InvestmentsAdvancesOther, FillPolicy::forward())],
            needs_market_caps: false,
            formula: total_accruals,
        },
        FactorDef {
            name: "f_nef",
            category: FactorCategory::Accruals,
            description: "Net external finance: change in equity and debt financing",
            quarterly: vec![
                (Field::TotalAssets, FillPolicy::AsReported),
                (Field::DividendsPerShare, FillPolicy::Zero),
                (Field::CommonSharesOutstanding, FillPolicy::forward()),
            ],
            annual: vec![
                (Field::PurchaseOfStock, FillPolicy::Zero),
                (Field::SaleOfStock, FillPolicy::Zero),
                (Field::LongTermDebtIssuance, FillPolicy::Zero),
                (Field::LongTermDebtReduction, FillPolicy::Zero),
                (Field::CurrentDebtChange, FillPolicy::Zero),
            ],
            needs_market_caps: false,
            formula: net_external_finance,
        },
    ]
}

fn average_assets() -> Expr {
    lit(0.5) * (item(Field::TotalAssets) + col("assets_lag"))
}

/// Non-cash earnings from changes in working capital, net of depreciation.
/// Financing transactions and income taxes payable are excluded from the
/// liability delta.
fn operating_accruals(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    let delta = |field: Field, lag_alias: &str| item(field) - col(lag_alias);

    fundamental_output(
        inputs
            .fundamentals
            .clone()
            .lazy()
            .with_columns([
                year_ago(Field::CurrentAssets.column(), "current_assets_lag"),
                year_ago(Field::CashAndEquivalents.column(), "cash_lag"),
                year_ago(Field::CurrentLiabilities.column(), "current_liabilities_lag"),
                year_ago(Field::ShortTermDebt.column(), "short_term_debt_lag"),
                year_ago(Field::IncomeTaxesPayable.column(), "taxes_payable_lag"),
                year_ago(Field::TotalAssets.column(), "assets_lag"),
            ])
            .with_columns([(((delta(Field::CurrentAssets, "current_assets_lag")
                - delta(Field::CashAndEquivalents, "cash_lag"))
                - (delta(Field::CurrentLiabilities, "current_liabilities_lag")
                    - delta(Field::ShortTermDebt, "short_term_debt_lag")
                    - delta(Field::IncomeTaxesPayable, "taxes_payable_lag"))
                - item(Field::DepreciationAmortization))
                / average_assets())
            .alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

/// Change in working capital, non-current operating assets and financial
/// assets, scaled by average total assets.
fn total_accruals(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    let lags = [
        (Field::CurrentAssets, "current_assets_lag"),
        (Field::TotalAssets, "assets_lag"),
        (Field::CashAndEquivalents, "cash_lag"),
        (Field::CurrentLiabilities, "current_liabilities_lag"),
        (Field::ShortTermDebt, "short_term_debt_lag"),
        (Field::TotalLiabilities, "liabilities_lag"),
        (Field::LongTermDebt, "long_term_debt_lag"),
        (Field::ShortTermInvestments, "short_term_investments_lag"),
        (Field::PreferredStock, "preferred_lag"),
        (Field::InvestmentsAdvancesOther, "other_investments_lag"),
    ];
    let lag_exprs: Vec<Expr> = lags
        .iter()
        .map(|(field, alias)| year_ago(field.column(), alias))
        .collect();

    let working_capital_assets = (item(Field::CurrentAssets) - item(Field::CashAndEquivalents))
        - (col("current_assets_lag") - col("cash_lag"));
    let working_capital_liabilities = (item(Field::CurrentLiabilities)
        - item(Field::ShortTermDebt))
        - (col("current_liabilities_lag") - col("short_term_debt_lag"));
    let non_current_assets = (item(Field::TotalAssets)
        - item(Field::CurrentAssets)
        - item(Field::InvestmentsAdvancesOther))
        - (col("assets_lag") - col("current_assets_lag") - col("other_investments_lag"));
    let non_current_liabilities = (item(Field::TotalLiabilities)
        - item(Field::CurrentLiabilities)
        - item(Field::LongTermDebt))
        - (col("liabilities_lag") - col("current_liabilities_lag") - col("long_term_debt_lag"));
    let financial_assets = (item(Field::ShortTermInvestments)
        + item(Field::InvestmentsAdvancesOther))
        - (col("short_term_investments_lag") + col("other_investments_lag"));
    let financial_liabilities = (item(Field::LongTermDebt)
        + item(Field::ShortTermDebt)
        + item(Field::PreferredStock))
        - (col("long_term_debt_lag") + col("short_term_debt_lag") + col("preferred_lag"));

    fundamental_output(
        inputs
            .fundamentals
            .clone()
            .lazy()
            .with_columns(lag_exprs)
            .with_columns([(((working_capital_assets - working_capital_liabilities)
                + (non_current_assets - non_current_liabilities)
                + (financial_assets - financial_liabilities))
                / average_assets())
            .alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

/// Change in net equity and debt financing over the prior year, scaled by
/// average assets. Dividends enter through the trailing sum of per-share
/// payouts times shares outstanding; the annual cash-flow items are already
/// yearly figures and are lagged without summing.
fn net_external_finance(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    let annual_lags = [
        (Field::TotalAssets, "assets_lag"),
        (Field::PurchaseOfStock, "purchases_lag"),
        (Field::SaleOfStock, "sales_of_stock_lag"),
        (Field::LongTermDebtIssuance, "debt_issuance_lag"),
        (Field::LongTermDebtReduction, "debt_reduction_lag"),
        (Field::CurrentDebtChange, "current_debt_change_lag"),
    ];
    let lag_exprs: Vec<Expr> = annual_lags
        .iter()
        .map(|(field, alias)| year_ago(field.column(), alias))
        .collect();

    let equity_now =
        item(Field::SaleOfStock) - item(Field::PurchaseOfStock) - col("dividends_ltm");
    let equity_then =
        col("sales_of_stock_lag") - col("purchases_lag") - col("dividends_ltm_lag");
    let debt_now = item(Field::LongTermDebtIssuance)
        - item(Field::LongTermDebtReduction)
        - item(Field::CurrentDebtChange);
    let debt_then =
        col("debt_issuance_lag") - col("debt_reduction_lag") - col("current_debt_change_lag");

    fundamental_output(
        inputs
            .fundamentals
            .clone()
            .lazy()
            .with_columns([(item(Field::DividendsPerShare)
                * item(Field::CommonSharesOutstanding))
            .alias("dividends")])
            .with_columns([ltm_of("dividends", "dividends_ltm")])
            .with_columns([year_ago("dividends_ltm", "dividends_ltm_lag")])
            .with_columns(lag_exprs)
            .with_columns([
                (((equity_now - equity_then) + (debt_now - debt_then)) / average_assets())
                    .alias(inputs.column.as_str()),
            ]),
        &inputs.column,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lisbon_core::column::{COMPANY_ID, PERIOD_END, REPORT_DATE};
    use lisbon_core::frame::date_series;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn operating_accruals_year_over_year() {
        let period_ends: Vec<NaiveDate> = vec![
            d(2020, 3, 31),
            d(2020, 6, 30),
            d(2020, 9, 30),
            d(2020, 12, 31),
            d(2021, 3, 31),
        ];
        let n = period_ends.len();
        let fundamentals = DataFrame::new(vec![
            Series::new(COMPANY_ID.into(), vec!["E1"; n]).into(),
            date_series(PERIOD_END, &period_ends).unwrap().into(),
            date_series(REPORT_DATE, &period_ends).unwrap().into(),
            Series::new(
                "current_assets".into(),
                vec![200.0, 205.0, 210.0, 215.0, 230.0],
            )
            .into(),
            Series::new("total_assets".into(), vec![1000.0; n]).into(),
            Series::new("cash_and_equivalents".into(), vec![50.0; n]).into(),
            Series::new("current_liabilities".into(), vec![100.0; n]).into(),
            Series::new("short_term_debt".into(), vec![20.0; n]).into(),
            Series::new("income_taxes_payable".into(), vec![5.0; n]).into(),
            Series::new("depreciation_amortization".into(), vec![10.0; n]).into(),
        ])
        .unwrap();

        let inputs = FactorInputs {
            column: "f_oa".to_string(),
            fundamentals,
            market_caps: None,
        };
        let out = operating_accruals(&inputs).unwrap();

        let values: Vec<Option<f64>> = out.column("f_oa").unwrap().f64().unwrap().to_vec();
        assert_eq!(values[..4], [None, None, None, None]);
        // Only current assets moved: delta 30, less depreciation 10, over
        // average assets 1000.
        assert_eq!(values[4], Some((30.0 - 10.0) / 1000.0));
    }
}
