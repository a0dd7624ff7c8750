#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/lisbon/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use lisbon_core;
pub use lisbon_data;
pub use lisbon_factors;
pub use lisbon_market;
pub use lisbon_temporal;

pub use lisbon_core::{CompanyId, Error, Field, FillPolicy, Result, SecurityId};
pub use lisbon_data::{EntityScope, FactorStore, LocalSource, MemoryStore, NoopStore, ParquetStore};
pub use lisbon_factors::{EngineConfig, FactorEngine, FactorOutcome, all_factors, find_factor};
pub use lisbon_market::{LinkTable, build_market_caps};
pub use lisbon_temporal::{asof_join, attach_annual, join_market_caps};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
