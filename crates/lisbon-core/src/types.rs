//! Key newtypes for companies and securities.
//!
//! One company (the durable research entity) may list several securities
//! (share classes); a security may remap to a different company over time
//! through corporate actions. The identifier link layer owns that mapping;
//! these types only make the two key spaces impossible to mix up.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sentinel date used to materialize open-ended link validity intervals.
///
/// An interval with no recorded end is treated as valid until this date so
/// that plain `<` / `>` range comparisons behave, instead of special-casing
/// nulls at every call site.
pub const FAR_FUTURE: NaiveDate = match NaiveDate::from_ymd_opt(2059, 12, 31) {
    Some(d) => d,
    None => panic!("invalid sentinel date"),
};

/// Durable company key, the entity axis of every factor table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompanyId(String);

impl CompanyId {
    /// Creates a new company key.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CompanyId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for CompanyId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CompanyId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Security (share class) key used by daily market data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SecurityId(i64);

impl SecurityId {
    /// Creates a new security key.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw integer key.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SecurityId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}
