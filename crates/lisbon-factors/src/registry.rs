//! Factor registry.
//!
//! Every factor the engine can derive is declared here as data: its name,
//! category, the raw fields it consumes with their null policies, whether it
//! needs the market-cap series, and the formula function. The engine drives
//! computations entirely from these definitions.

use crate::inputs::FactorInputs;
use crate::{accruals, investment, liquidity, profitability, value};
use lisbon_core::error::Result;
use lisbon_core::field::Field;
use lisbon_core::policy::FillPolicy;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Factor formula function: prepared inputs in, entity-date-keyed table out.
pub type FormulaFn = fn(&FactorInputs<'_>) -> Result<DataFrame>;

/// Factor categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactorCategory {
    /// Fundamentals scaled by market capitalization.
    Value,
    /// Margins, returns on capital, leverage.
    Profitability,
    /// Asset and capital-expenditure growth.
    Investment,
    /// Accrual and external-financing measures.
    Accruals,
    /// Asset liquidity and financing constraints.
    Liquidity,
}

impl FactorCategory {
    /// Human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &str {
        match self {
            Self::Value => "Fundamental quantities relative to market capitalization",
            Self::Profitability => "Profit generation relative to assets, sales and equity",
            Self::Investment => "Growth of assets, inventory and capital expenditure",
            Self::Accruals => "Non-cash earnings components and external financing",
            Self::Liquidity => "Asset liquidity and financing-constraint composites",
        }
    }
}

/// Declaration of a single factor.
#[derive(Debug, Clone)]
pub struct FactorDef {
    /// Unique output name, `f_` prefixed.
    pub name: &'static str,
    /// Category.
    pub category: FactorCategory,
    /// What the factor measures.
    pub description: &'static str,
    /// Quarterly fields with their declared null policies.
    pub quarterly: Vec<(Field, FillPolicy)>,
    /// Annual fields with their declared null policies.
    pub annual: Vec<(Field, FillPolicy)>,
    /// Whether the engine must supply the market-cap series.
    pub needs_market_caps: bool,
    /// The formula.
    pub formula: FormulaFn,
}

/// All factor definitions.
#[must_use]
pub fn all_factors() -> Vec<FactorDef> {
    let mut defs = Vec::new();
    defs.extend(value::defs());
    defs.extend(profitability::defs());
    defs.extend(investment::defs());
    defs.extend(accruals::defs());
    defs.extend(liquidity::defs());
    defs
}

/// Looks up a factor definition by name.
#[must_use]
pub fn find_factor(name: &str) -> Option<FactorDef> {
    all_factors().into_iter().find(|def| def.name == name)
}

/// Definitions in one category.
#[must_use]
pub fn factors_by_category(category: FactorCategory) -> Vec<FactorDef> {
    all_factors()
        .into_iter()
        .filter(|def| def.category == category)
        .collect()
}

/// All factor names, in registry order.
#[must_use]
pub fn factor_names() -> Vec<&'static str> {
    all_factors().into_iter().map(|def| def.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lisbon_core::field::Frequency;

    #[test]
    fn registry_size() {
        assert_eq!(all_factors().len(), 29);
    }

    #[test]
    fn counts_by_category() {
        assert_eq!(factors_by_category(FactorCategory::Value).len(), 9);
        assert_eq!(factors_by_category(FactorCategory::Profitability).len(), 8);
        assert_eq!(factors_by_category(FactorCategory::Investment).len(), 6);
        assert_eq!(factors_by_category(FactorCategory::Accruals).len(), 3);
        assert_eq!(factors_by_category(FactorCategory::Liquidity).len(), 3);
    }

    #[test]
    fn names_are_unique_and_prefixed() {
        let mut names = factor_names();
        assert!(names.iter().all(|n| n.starts_with("f_")));
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(names.len(), before);
    }

    #[test]
    fn find_factor_hits_and_misses() {
        let def = find_factor("f_btm").unwrap();
        assert_eq!(def.category, FactorCategory::Value);
        assert!(def.needs_market_caps);

        assert!(find_factor("f_nonexistent").is_none());
    }

    #[test]
    fn declared_fields_match_their_frequency() {
        for def in all_factors() {
            for (field, _) in &def.quarterly {
                assert_eq!(
                    field.frequency(),
                    Frequency::Quarterly,
                    "{} declares {} as quarterly",
                    def.name,
                    field
                );
            }
            for (field, _) in &def.annual {
                assert_eq!(
                    field.frequency(),
                    Frequency::Annual,
                    "{} declares {} as annual",
                    def.name,
                    field
                );
            }
        }
    }

    #[test]
    fn every_factor_declares_some_input() {
        for def in all_factors() {
            assert!(
                !def.quarterly.is_empty() || !def.annual.is_empty(),
                "{} declares no raw fields",
                def.name
            );
        }
    }
}
