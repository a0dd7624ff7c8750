#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/lisbon/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod link;
pub mod marketcap;
pub mod pricevol;

pub use link::LinkTable;
pub use marketcap::build_market_caps;
pub use pricevol::derive_price_columns;
