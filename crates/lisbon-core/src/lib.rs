#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/lisbon/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod column;
pub mod error;
pub mod field;
pub mod frame;
pub mod policy;
pub mod types;

pub use column::{factor_column, is_factor_column};
pub use error::{Error, Result};
pub use field::{Field, Frequency};
pub use policy::FillPolicy;
pub use types::{CompanyId, SecurityId, FAR_FUTURE};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
