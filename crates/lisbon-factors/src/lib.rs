#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/lisbon/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod accruals;
pub mod engine;
pub mod inputs;
pub mod investment;
pub mod liquidity;
pub mod profitability;
pub mod registry;
pub mod value;

pub use engine::{EngineConfig, FactorEngine, FactorOutcome};
pub use inputs::FactorInputs;
pub use registry::{
    FactorCategory, FactorDef, all_factors, factor_names, factors_by_category, find_factor,
};
