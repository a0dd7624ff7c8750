//! Profitability factors: profit generation relative to assets, sales and
//! equity. All are fundamentals-keyed; none needs the market-cap series.

use crate::inputs::{FactorInputs, fundamental_output, item, ltm, year_ago};
use crate::registry::{FactorCategory, FactorDef};
use lisbon_core::error::Result;
use lisbon_core::field::Field;
use lisbon_core::policy::FillPolicy;
use polars::prelude::*;

/// Profitability factor definitions.
pub(crate) fn defs() -> Vec<FactorDef> {
    vec![
        FactorDef {
            name: "f_gpta",
            category: FactorCategory::Profitability,
            description: "Gross profit (revenue less cost of goods sold) to total assets",
            quarterly: vec![
                (Field::TotalRevenue, FillPolicy::AsReported),
                (Field::Cogs, FillPolicy::AsReported),
                (Field::TotalAssets, FillPolicy::forward()),
            ],
            annual: vec![],
            needs_market_caps: false,
            formula: gross_profit_to_assets,
        },
        FactorDef {
            name: "f_ol",
            category: FactorCategory::Profitability,
            description: "Operating costs (COGS plus SG&A) to total assets, Novy-Marx (2011)",
            quarterly: vec![
                (Field::SgaExpense, FillPolicy::Zero),
                (Field::Cogs, FillPolicy::Zero),
                (Field::TotalAssets, FillPolicy::AsReported),
            ],
            annual: vec![],
            needs_market_caps: false,
            formula: operating_leverage,
        },
        FactorDef {
            name: "f_roa",
            category: FactorCategory::Profitability,
            description: "Trailing-twelve-month income before extraordinary items to total assets",
            quarterly: vec![
                (Field::IncomeBeforeExtra, FillPolicy::AsReported),
                (Field::TotalAssets, FillPolicy::forward()),
            ],
            annual: vec![],
            needs_market_caps: false,
            formula: return_on_assets,
        },
        FactorDef {
            name: "f_pm",
            category: FactorCategory::Profitability,
            description: "Operating income to sales, Soliman (2008)",
            quarterly: vec![
                (Field::OperatingIncome, FillPolicy::AsReported),
                (Field::Sales, FillPolicy::AsReported),
            ],
            annual: vec![],
            needs_market_caps: false,
            formula: profit_margin,
        },
        FactorDef {
            name: "f_rnoa",
            category: FactorCategory::Profitability,
            description: "Operating income to average net operating assets, Soliman (2008)",
            quarterly: net_operating_assets_fields(vec![(
                Field::OperatingIncome,
                FillPolicy::AsReported,
            )]),
            annual: vec![],
            needs_market_caps: false,
            formula: return_on_net_operating_assets,
        },
        FactorDef {
            name: "f_at",
            category: FactorCategory::Profitability,
            description: "Sales to average net operating assets, Soliman (2008)",
            quarterly: net_operating_assets_fields(vec![(Field::Sales, FillPolicy::AsReported)]),
            annual: vec![],
            needs_market_caps: false,
            formula: asset_turnover,
        },
        FactorDef {
            name: "f_opte",
            category: FactorCategory::Profitability,
            description: "Operating profits to lagged book equity",
            quarterly: vec![
                (Field::Sales, FillPolicy::Zero),
                (Field::Cogs, FillPolicy::Zero),
                (Field::SgaExpense, FillPolicy::Zero),
                (Field::InterestExpense, FillPolicy::Zero),
                (Field::StockholdersEquity, FillPolicy::forward()),
                (Field::DeferredTaxesItc, FillPolicy::forward()),
                (Field::PreferredStock, FillPolicy::forward()),
            ],
            annual: vec![],
            needs_market_caps: false,
            formula: operating_profits_to_equity,
        },
        FactorDef {
            name: "f_bl",
            category: FactorCategory::Profitability,
            description: "Total assets to book equity",
            quarterly: vec![
                (Field::TotalAssets, FillPolicy::AsReported),
                (Field::StockholdersEquity, FillPolicy::AsReported),
                (Field::DeferredTaxesItc, FillPolicy::forward()),
                (Field::PreferredStock, FillPolicy::forward()),
            ],
            annual: vec![],
            needs_market_caps: false,
            formula: book_leverage,
        },
    ]
}

fn net_operating_assets_fields(
    mut extra: Vec<(Field, FillPolicy)>,
) -> Vec<(Field, FillPolicy)> {
    extra.extend([
        (Field::TotalAssets, FillPolicy::forward()),
        (Field::CashAndEquivalents, FillPolicy::forward()),
        (Field::LongTermDebt, FillPolicy::forward()),
        (Field::ShortTermDebt, FillPolicy::forward()),
        (Field::CommonEquity, FillPolicy::forward()),
        (Field::PreferredStock, FillPolicy::forward()),
        (Field::MinorityInterest, FillPolicy::forward()),
    ]);
    extra
}

/// Net operating assets: operating assets (total assets less cash) minus
/// operating liabilities (total assets less debt, common and preferred
/// equity, and minority interest).
fn net_operating_assets() -> Expr {
    let operating_assets = item(Field::TotalAssets) - item(Field::CashAndEquivalents);
    let operating_liabilities = item(Field::TotalAssets)
        - item(Field::LongTermDebt)
        - item(Field::ShortTermDebt)
        - item(Field::CommonEquity)
        - item(Field::PreferredStock)
        - item(Field::MinorityInterest);
    operating_assets - operating_liabilities
}

fn gross_profit_to_assets(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    fundamental_output(
        inputs
            .fundamentals
            .clone()
            .lazy()
            .with_columns([
                ltm(Field::TotalRevenue, "revenue_ltm"),
                ltm(Field::Cogs, "cogs_ltm"),
            ])
            .with_columns([((col("revenue_ltm") - col("cogs_ltm")) / item(Field::TotalAssets))
                .alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

fn operating_leverage(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    fundamental_output(
        inputs
            .fundamentals
            .clone()
            .lazy()
            .with_columns([
                ltm(Field::SgaExpense, "sga_ltm"),
                ltm(Field::Cogs, "cogs_ltm"),
            ])
            .with_columns([((col("sga_ltm") + col("cogs_ltm")) / item(Field::TotalAssets))
                .alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

fn return_on_assets(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    fundamental_output(
        inputs
            .fundamentals
            .clone()
            .lazy()
            .with_columns([ltm(Field::IncomeBeforeExtra, "income_ltm")])
            .with_columns([
                (col("income_ltm") / item(Field::TotalAssets)).alias(inputs.column.as_str()),
            ]),
        &inputs.column,
    )
}

fn profit_margin(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    fundamental_output(
        inputs
            .fundamentals
            .clone()
            .lazy()
            .with_columns([
                ltm(Field::OperatingIncome, "operating_income_ltm"),
                ltm(Field::Sales, "sales_ltm"),
            ])
            .with_columns([
                (col("operating_income_ltm") / col("sales_ltm")).alias(inputs.column.as_str()),
            ]),
        &inputs.column,
    )
}

fn return_on_net_operating_assets(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    fundamental_output(
        inputs
            .fundamentals
            .clone()
            .lazy()
            .with_columns([
                ltm(Field::OperatingIncome, "operating_income_ltm"),
                net_operating_assets().alias("noa"),
            ])
            .with_columns([year_ago("noa", "noa_lag")])
            .with_columns([(col("operating_income_ltm")
                / (lit(0.5) * col("noa") + lit(0.5) * col("noa_lag")))
            .alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

fn asset_turnover(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    fundamental_output(
        inputs
            .fundamentals
            .clone()
            .lazy()
            .with_columns([
                ltm(Field::Sales, "sales_ltm"),
                net_operating_assets().alias("noa"),
            ])
            .with_columns([year_ago("noa", "noa_lag")])
            .with_columns([
                (col("sales_ltm") / (lit(0.5) * col("noa") + lit(0.5) * col("noa_lag")))
                    .alias(inputs.column.as_str()),
            ]),
        &inputs.column,
    )
}

fn operating_profits_to_equity(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    fundamental_output(
        inputs
            .fundamentals
            .clone()
            .lazy()
            .with_columns([
                ltm(Field::Sales, "sales_ltm"),
                ltm(Field::Cogs, "cogs_ltm"),
                ltm(Field::SgaExpense, "sga_ltm"),
                ltm(Field::InterestExpense, "interest_ltm"),
                year_ago(Field::StockholdersEquity.column(), "equity_lag"),
                year_ago(Field::DeferredTaxesItc.column(), "deferred_lag"),
                year_ago(Field::PreferredStock.column(), "preferred_lag"),
            ])
            .with_columns([((col("sales_ltm")
                - col("cogs_ltm")
                - col("sga_ltm")
                - col("interest_ltm"))
                / (col("equity_lag") + col("deferred_lag") - col("preferred_lag")))
            .alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

fn book_leverage(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    fundamental_output(
        inputs
            .fundamentals
            .clone()
            .lazy()
            .with_columns([(item(Field::TotalAssets)
                / (item(Field::StockholdersEquity) + item(Field::DeferredTaxesItc)
                    - item(Field::PreferredStock)))
            .alias(inputs.column.as_str())]),
        &inputs.column,
    )
}
