#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/lisbon/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod asof;
pub mod transform;

pub use asof::{AsofArgs, AsofDirection, asof_join, attach_annual, join_market_caps};
pub use transform::{fill_missing, forward_fill, lag, rolling_sum, sort_for_transforms};
