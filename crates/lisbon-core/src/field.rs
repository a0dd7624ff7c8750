//! Raw fundamental field catalogue.
//!
//! Factor definitions declare their inputs as [`Field`] values rather than
//! bare strings, so a misspelled item is a compile error instead of an empty
//! column at runtime. Every field maps to a stable snake_case column name in
//! the frames returned by the fundamentals source.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reporting frequency of a fundamental field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    /// Reported each fiscal quarter.
    Quarterly,
    /// Reported once per fiscal year.
    Annual,
}

/// A raw financial-statement item retrievable from the fundamentals source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)] // variant names are the documentation
pub enum Field {
    // Income statement (quarterly)
    TotalRevenue,
    Sales,
    Cogs,
    SgaExpense,
    InterestExpense,
    IncomeBeforeExtra,
    DepreciationAmortization,
    OperatingIncome,
    Ebitda,
    RndExpense,

    // Balance sheet (quarterly)
    TotalAssets,
    CurrentAssets,
    CashAndEquivalents,
    ShortTermInvestments,
    Inventories,
    PpeGross,
    PpeNet,
    TotalLiabilities,
    CurrentLiabilities,
    ShortTermDebt,
    LongTermDebt,
    IncomeTaxesPayable,
    DeferredTaxes,
    DeferredTaxesItc,
    StockholdersEquity,
    CommonEquity,
    PreferredStock,
    MinorityInterest,
    NoncontrollingInterestTotal,

    // Per-share and payout items (quarterly)
    DividendsPerShare,
    PreferredDividends,
    CommonSharesOutstanding,
    SharesRepurchased,
    RepurchasePrice,

    // Annual-only items
    AdvertisingExpense,
    CapitalExpenditure,
    InvestmentsAdvancesOther,
    PurchaseOfStock,
    SaleOfStock,
    LongTermDebtIssuance,
    LongTermDebtReduction,
    CurrentDebtChange,
}

impl Field {
    /// Column name this field occupies in source frames.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::TotalRevenue => "total_revenue",
            Self::Sales => "sales",
            Self::Cogs => "cogs",
            Self::SgaExpense => "sga_expense",
            Self::InterestExpense => "interest_expense",
            Self::IncomeBeforeExtra => "income_before_extra",
            Self::DepreciationAmortization => "depreciation_amortization",
            Self::OperatingIncome => "operating_income",
            Self::Ebitda => "ebitda",
            Self::RndExpense => "rnd_expense",
            Self::TotalAssets => "total_assets",
            Self::CurrentAssets => "current_assets",
            Self::CashAndEquivalents => "cash_and_equivalents",
            Self::ShortTermInvestments => "short_term_investments",
            Self::Inventories => "inventories",
            Self::PpeGross => "ppe_gross",
            Self::PpeNet => "ppe_net",
            Self::TotalLiabilities => "total_liabilities",
            Self::CurrentLiabilities => "current_liabilities",
            Self::ShortTermDebt => "short_term_debt",
            Self::LongTermDebt => "long_term_debt",
            Self::IncomeTaxesPayable => "income_taxes_payable",
            Self::DeferredTaxes => "deferred_taxes",
            Self::DeferredTaxesItc => "deferred_taxes_itc",
            Self::StockholdersEquity => "stockholders_equity",
            Self::CommonEquity => "common_equity",
            Self::PreferredStock => "preferred_stock",
            Self::MinorityInterest => "minority_interest",
            Self::NoncontrollingInterestTotal => "noncontrolling_interest_total",
            Self::DividendsPerShare => "dividends_per_share",
            Self::PreferredDividends => "preferred_dividends",
            Self::CommonSharesOutstanding => "common_shares_outstanding",
            Self::SharesRepurchased => "shares_repurchased",
            Self::RepurchasePrice => "repurchase_price",
            Self::AdvertisingExpense => "advertising_expense",
            Self::CapitalExpenditure => "capital_expenditure",
            Self::InvestmentsAdvancesOther => "investments_advances_other",
            Self::PurchaseOfStock => "purchase_of_stock",
            Self::SaleOfStock => "sale_of_stock",
            Self::LongTermDebtIssuance => "long_term_debt_issuance",
            Self::LongTermDebtReduction => "long_term_debt_reduction",
            Self::CurrentDebtChange => "current_debt_change",
        }
    }

    /// Reporting frequency of this field.
    #[must_use]
    pub const fn frequency(&self) -> Frequency {
        match self {
            Self::AdvertisingExpense
            | Self::CapitalExpenditure
            | Self::InvestmentsAdvancesOther
            | Self::PurchaseOfStock
            | Self::SaleOfStock
            | Self::LongTermDebtIssuance
            | Self::LongTermDebtReduction
            | Self::CurrentDebtChange => Frequency::Annual,
            _ => Frequency::Quarterly,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}
