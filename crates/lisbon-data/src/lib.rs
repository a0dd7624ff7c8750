#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/lisbon/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod local;
pub mod source;
pub mod store;

pub use local::LocalSource;
pub use source::{EntityScope, FundamentalsSource, MarketDataSource, scope_filter};
pub use store::{FactorStore, MemoryStore, NoopStore, ParquetStore};
