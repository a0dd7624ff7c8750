//! Investment factors: growth of assets, inventory and capital expenditure.

use crate::inputs::{
    FactorInputs, fundamental_output, item, lag_quarters, ltm, market_output, year_ago,
};
use crate::registry::{FactorCategory, FactorDef};
use lisbon_core::column::DATE;
use lisbon_core::error::Result;
use lisbon_core::field::Field;
use lisbon_core::policy::FillPolicy;
use lisbon_temporal::asof::join_market_caps;
use polars::prelude::*;

/// Investment factor definitions.
pub(crate) fn defs() -> Vec<FactorDef> {
    vec![
        FactorDef {
            name: "f_sgr",
            category: FactorCategory::Investment,
            description: "Five-year sales CAGR, cross-sectional decile rank per date",
            quarterly: vec![(Field::Sales, FillPolicy::AsReported)],
            annual: vec![],
            needs_market_caps: true,
            formula: sales_growth_rank,
        },
        FactorDef {
            name: "f_aci",
            category: FactorCategory::Investment,
            description: "Capital investment relative to its own three-year history, \
                          Titman et al. (2004)",
            quarterly: vec![(Field::Sales, FillPolicy::AsReported)],
            annual: vec![(Field::CapitalExpenditure, FillPolicy::Zero)],
            needs_market_caps: false,
            formula: abnormal_capital_investment,
        },
        FactorDef {
            name: "f_ita",
            category: FactorCategory::Investment,
            description: "Year-over-year growth of total assets, Cooper et al. (2008)",
            quarterly: vec![(Field::TotalAssets, FillPolicy::forward())],
            annual: vec![],
            needs_market_caps: false,
            formula: investment_to_assets,
        },
        FactorDef {
            name: "f_ppe",
            category: FactorCategory::Investment,
            description: "Change in PPE and inventory scaled by lagged assets, \
                          Lyandres et al. (2008)",
            quarterly: vec![
                (Field::Inventories, FillPolicy::forward()),
                (Field::TotalAssets, FillPolicy::AsReported),
                (Field::PpeGross, FillPolicy::forward()),
            ],
            annual: vec![],
            needs_market_caps: false,
            formula: changes_in_ppe,
        },
        FactorDef {
            name: "f_ig",
            category: FactorCategory::Investment,
            description: "Year-over-year growth of capital expenditure, Xing (2008)",
            quarterly: vec![],
            annual: vec![(Field::CapitalExpenditure, FillPolicy::AsReported)],
            needs_market_caps: false,
            formula: investment_growth,
        },
        FactorDef {
            name: "f_ic",
            category: FactorCategory::Investment,
            description: "Change in inventory scaled by average assets, Thomas & Zhang (2002)",
            quarterly: vec![
                (Field::Inventories, FillPolicy::forward()),
                (Field::TotalAssets, FillPolicy::forward()),
            ],
            annual: vec![],
            needs_market_caps: false,
            formula: inventory_changes,
        },
    ]
}

/// Five-year CAGR of trailing sales, ranked cross-sectionally into deciles
/// (1 slowest growth, 10 fastest) per trading date.
fn sales_growth_rank(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    let fundamentals = inputs
        .fundamentals
        .clone()
        .lazy()
        .with_columns([ltm(Field::Sales, "sales_ltm")])
        .with_columns([lag_quarters("sales_ltm", 20, "sales_ltm_lag")])
        .with_columns([(((col("sales_ltm") / col("sales_ltm_lag"))
            .log(std::f64::consts::E)
            * lit(0.2))
        .exp()
            - lit(1.0))
        .alias("sales_cagr")])
        .filter(col("sales_cagr").is_not_null())
        .collect()?;

    let joined = join_market_caps(inputs.require_market_caps()?, &fundamentals)?;
    let column = inputs.column.as_str();
    market_output(
        joined
            .lazy()
            .with_columns([
                col("sales_cagr")
                    .rank(
                        RankOptions {
                            method: RankMethod::Ordinal,
                            descending: false,
                        },
                        None,
                    )
                    .over([col(DATE)])
                    .alias("__rank"),
                col("sales_cagr").count().over([col(DATE)]).alias("__n"),
            ])
            .with_columns([(((col("__rank").cast(DataType::Float64) - lit(1.0)) * lit(10.0)
                / col("__n").cast(DataType::Float64))
            .cast(DataType::Int64)
                + lit(1))
            .alias(column)]),
        column,
    )
}

fn abnormal_capital_investment(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    let capex = Field::CapitalExpenditure.column();
    let mut lags = Vec::new();
    for quarters in [4i64, 8, 12] {
        lags.push(lag_quarters(capex, quarters, &format!("capex_lag_{quarters}")));
        lags.push(lag_quarters(
            "sales_ltm",
            quarters,
            &format!("sales_ltm_lag_{quarters}"),
        ));
    }

    fundamental_output(
        inputs
            .fundamentals
            .clone()
            .lazy()
            .with_columns([ltm(Field::Sales, "sales_ltm")])
            .with_columns(lags)
            .with_columns([((col("capex_lag_4") / col("sales_ltm_lag_4")
                + col("capex_lag_8") / col("sales_ltm_lag_8")
                + col("capex_lag_12") / col("sales_ltm_lag_12"))
                / lit(3.0))
            .alias("avg_capex_to_sales")])
            .with_columns([((item(Field::CapitalExpenditure) / col("sales_ltm"))
                / col("avg_capex_to_sales")
                - lit(1.0))
            .alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

fn investment_to_assets(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    fundamental_output(
        inputs
            .fundamentals
            .clone()
            .lazy()
            .with_columns([year_ago(Field::TotalAssets.column(), "assets_lag")])
            .with_columns([((item(Field::TotalAssets) - col("assets_lag")) / col("assets_lag"))
                .alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

fn changes_in_ppe(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    fundamental_output(
        inputs
            .fundamentals
            .clone()
            .lazy()
            .with_columns([
                year_ago(Field::PpeGross.column(), "ppe_lag"),
                year_ago(Field::Inventories.column(), "inventories_lag"),
                year_ago(Field::TotalAssets.column(), "assets_lag"),
            ])
            .with_columns([(((item(Field::PpeGross) - col("ppe_lag"))
                + (item(Field::Inventories) - col("inventories_lag")))
                / col("assets_lag"))
            .alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

// Capital expenditure repeats across the four quarterly rows of its fiscal
// year after the annual attach, so a four-row lag is the prior year's figure.
fn investment_growth(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    fundamental_output(
        inputs
            .fundamentals
            .clone()
            .lazy()
            .with_columns([year_ago(Field::CapitalExpenditure.column(), "capex_lag")])
            .with_columns([((item(Field::CapitalExpenditure) - col("capex_lag"))
                / col("capex_lag"))
            .alias(inputs.column.as_str())]),
        &inputs.column,
    )
}

fn inventory_changes(inputs: &FactorInputs<'_>) -> Result<DataFrame> {
    fundamental_output(
        inputs
            .fundamentals
            .clone()
            .lazy()
            .with_columns([
                year_ago(Field::Inventories.column(), "inventories_lag"),
                year_ago(Field::TotalAssets.column(), "assets_lag"),
            ])
            .with_columns([((item(Field::Inventories) - col("inventories_lag"))
                / (lit(0.5) * (item(Field::TotalAssets) + col("assets_lag"))))
            .alias(inputs.column.as_str())]),
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
    fn asset_growth_compares_year_over_year() {
        let period_ends: Vec<NaiveDate> = [
            d(2020, 3, 31),
            d(2020, 6, 30),
            d(2020, 9, 30),
            d(2020, 12, 31),
            d(2021, 3, 31),
        ]
        .to_vec();
        let fundamentals = DataFrame::new(vec![
            Series::new(COMPANY_ID.into(), vec!["E1"; 5]).into(),
            date_series(PERIOD_END, &period_ends).unwrap().into(),
            date_series(REPORT_DATE, &period_ends).unwrap().into(),
            Series::new(
                "total_assets".into(),
                vec![1000.0, 1020.0, 1040.0, 1060.0, 1100.0],
            )
            .into(),
        ])
        .unwrap();

        let inputs = FactorInputs {
            column: "f_ita".to_string(),
            fundamentals,
            market_caps: None,
        };
        let out = investment_to_assets(&inputs).unwrap();

        let values: Vec<Option<f64>> = out.column("f_ita").unwrap().f64().unwrap().to_vec();
        assert_eq!(values[..4], [None, None, None, None]);
        assert_eq!(values[4], Some((1100.0 - 1000.0) / 1000.0));
    }
}
