//! Error type for the lisbon workspace.
//!
//! Only structural failures become errors: an unreachable source, a factor
//! function returning a malformed table, a broken store. Data-quality
//! conditions (ambiguous identity links, insufficient history for a rolling
//! window, values past their staleness bound) degrade to dropped rows or
//! nulls in the output and are never raised, because factor tables are
//! expected to be sparse at their boundaries.

use thiserror::Error;

/// Result type for lisbon operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while deriving factors.
#[derive(Debug, Error)]
pub enum Error {
    /// The external data source could not be reached or returned malformed
    /// rows. Fatal for the current factor; nothing is written.
    #[error("data source error: {0}")]
    Source(String),

    /// A factor function produced something other than an entity-date-keyed
    /// table. This is a programming error, surfaced immediately.
    #[error("factor {factor} produced a malformed table: {reason}")]
    Schema {
        /// Factor whose output failed validation.
        factor: String,
        /// What was wrong with the output.
        reason: String,
    },

    /// Requested factor name is not in the registry.
    #[error("unknown factor: {0}")]
    UnknownFactor(String),

    /// An input frame is missing a required column.
    #[error("missing required column: {0}")]
    MissingColumn(String),

    /// The persistence collaborator failed.
    #[error("store error: {0}")]
    Store(String),

    /// Polars error.
    #[error("polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
