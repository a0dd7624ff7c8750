//! Declared null-handling policies for raw fields.
//!
//! Each factor declares, per input field, how missing observations are
//! treated before its formula runs. Keeping the choice in data instead of
//! inline in each formula makes the policy inspectable and testable on its
//! own, and keeps a formula change from silently changing null semantics.

use serde::{Deserialize, Serialize};

/// Default staleness bound, in quarters, for forward-filled stock items.
pub const DEFAULT_FILL_LIMIT: u32 = 4;

/// How missing values of a raw field are treated before a formula runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FillPolicy {
    /// Carry the last reported value forward for at most `limit` consecutive
    /// missing quarters. Balance-sheet stock items: a quarter with no report
    /// keeps the prior level, but data older than the bound stays missing
    /// rather than being fabricated.
    ForwardFill {
        /// Maximum consecutive missing observations to fill.
        limit: u32,
    },
    /// Replace missing with zero. Flow items where "not reported" means no
    /// activity (dividends, repurchases, R&D). Never correct for stock items.
    Zero,
    /// Leave missing as missing; an absent value means the quantity is
    /// undefined and must propagate into the factor as null.
    AsReported,
}

impl FillPolicy {
    /// Forward fill with the default four-quarter staleness bound.
    #[must_use]
    pub const fn forward() -> Self {
        Self::ForwardFill {
            limit: DEFAULT_FILL_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_forward_limit() {
        assert_eq!(
            FillPolicy::forward(),
            FillPolicy::ForwardFill { limit: 4 }
        );
    }
}
