//! Asset-liquidity and financing-constraint factors.

use crate::inputs::{FactorInputs, fundamental_output, item, ltm, ltm_of, market_output, year_ago};
use crate::registry::{FactorCategory, FactorDef};
use lisbon_core::column::MARKET_CAP;
use lisbon_core::error::Result;
use lisbon_core::field::Field;
use lisbon_core::policy::FillPolicy;
use lisbon_temporal::asof::join_market_caps;
use polars::prelude::*;

/// Liquidity factor definitions.
pub(crate) fn defs() -> Vec<FactorDef> {
    vec![
        FactorDef {
            name: "f_fc",
            category: FactorCategory::Liquidity,
            description: "Kaplan-Zingales financing-constraint index, Lamont et al. (2001)",
            quarterly: vec![
                (Field::IncomeBeforeExtra, FillPolicy::AsReported),
                (Field::DepreciationAmortization, FillPolicy::AsReported),
                (Field::PpeNet, FillPolicy::forward()),
                (Field::TotalAssets, FillPolicy::forward()),
                (Field::StockholdersEquity, FillPolicy::forward()),
                (Field::DeferredTaxes, FillPolicy::forward()),
                (Field::LongTermDebt, FillPolicy::forward()),
                (Field::ShortTermDebt, FillPolicy::forward()),
                (Field::CommonEquity, FillPolicy::forward()),
                (Field::DividendsPerShare, FillPolicy::Zero),
                (Field::CommonSharesOutstanding, FillPolicy::Zero),
                (Field::PreferredDividends, FillPolicy::AsReported),
                (Field::CashAndEquivalents, FillPolicy::forward()),
            ],
            annual: vec![],
            needs_market_caps: true,
            formula: financial_constraints,
        },
        FactorDef {
            name: "f_bsal",
            category: FactorCategory::Liquidity,
            description: "Book-scaled asset liquidity, Ortiz-Molina & Phillips (2014)",
            quarterly: vec![
                (Field::CashAndEquivalents, FillPolicy::forward()),
                (Field::TotalAssets, FillPolicy::forward()),
                (Field::CurrentAssets, FillPolicy::forward()),
                (Field::PpeNet, FillPolicy::forward()),
            ],
            annual: vec![],
            needs_market_caps: false,
            formula: book_scaled_asset_liquidity,
        },
        FactorDef {
            name: "f_msal",
            category: FactorCategory::Liquidity,
            description: "Market-scaled asset liquidity, Ortiz-Molina & Phillips (2014)",
            quarterly: vec![
                (Field::CashAndEquivalents, FillPolicy::forward()),
                (Field::TotalAssets, FillPolicy::forward()),
                (Field::CurrentAssets, FillPolicy::forward()),
                (Field::PpeNet, FillPolicy::forward()),
                (Field::StockholdersEquity, FillPolicy::forward()),
                (Field::DeferredTaxesItc, FillPolicy::forward()),
                (Field::PreferredStock, FillPolicy::forward()),
            ],
            annual: vec![],
            needs_market_caps: true,
            formula: market_scaled_asset_liquidity,
        },
    ]
}

/// Weighted sum of asset classes by their liquidity, negated so that less
/// liquid balance sheets score higher.
fn asset_liquidity(denominator: Expr) -> Expr {
    -(item(Field::CashAndEquivalents) / denominator.clone()
        + lit(0.75) * (item(Field::CurrentAssets) - item(Field::CashAndEquivalents))
            / denominator.clone()
        + lit(0.5) * item(Field::PpeNet) / denominator)
}

/// Kaplan-Zingales index with the Lamont et al. (2001) coefficients: cash
/// flow to capital, Tobin's q, leverage, dividends to capital and cash to
/// capital, each entering with its published weight.
fn financial_constraints(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    let fundamentals = inputs
        .fundamentals
        .clone()
        .lazy()
        .with_columns([(item(Field::DividendsPerShare)
            * item(Field::CommonSharesOutstanding))
        .alias("dividends")])
        .with_columns([
            ltm(Field::IncomeBeforeExtra, "income_ltm"),
            ltm(Field::DepreciationAmortization, "depreciation_ltm"),
            ltm_of("dividends", "dividends_ltm"),
            ltm(Field::PreferredDividends, "preferred_dividends_ltm"),
            year_ago(Field::PpeNet.column(), "capital_lag"),
        ])
        .collect()?;

    let joined = join_market_caps(inputs.require_market_caps()?, &fundamentals)?;

    let cash_flow_to_capital = (col("income_ltm") + col("depreciation_ltm")) / col("capital_lag");
    let tobins_q = (item(Field::TotalAssets) + col(MARKET_CAP)
        - item(Field::CommonEquity)
        - item(Field::DeferredTaxes))
        / item(Field::TotalAssets);
    let leverage = (item(Field::LongTermDebt) + item(Field::ShortTermDebt))
        / (item(Field::LongTermDebt) + item(Field::ShortTermDebt) + item(Field::CommonEquity));
    let dividends_to_capital =
        (col("dividends_ltm") + col("preferred_dividends_ltm")) / col("capital_lag");
    let cash_to_capital = item(Field::CashAndEquivalents) / col("capital_lag");

    market_output(
        joined
            .lazy()
            .with_columns([(lit(-1.001909) * cash_flow_to_capital
                + lit(0.2826389) * tobins_q
                + lit(3.139193) * leverage
                - lit(39.3678) * dividends_to_capital
                - lit(1.314759) * cash_to_capital)
            .alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

fn book_scaled_asset_liquidity(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    fundamental_output(
        inputs
            .fundamentals
            .clone()
            .lazy()
            .with_columns([asset_liquidity(item(Field::TotalAssets))
                .alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

/// Same weighting as the book-scaled variant, but over market assets:
/// total assets with book equity replaced by market capitalization.
fn market_scaled_asset_liquidity(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    let joined = join_market_caps(inputs.require_market_caps()?, &inputs.fundamentals)?;

    let book_equity = item(Field::StockholdersEquity) + item(Field::DeferredTaxesItc)
        - item(Field::PreferredStock);
    let market_assets = item(Field::TotalAssets) - book_equity + col(MARKET_CAP);

    market_output(
        joined
            .lazy()
            .with_columns([market_assets.alias("market_assets")])
            .with_columns([asset_liquidity(col("market_assets")).alias(inputs.column.as_str())]),
        &inputs.column,
    )
}
