//! Error types for Transit.
//!
//! Errors cover API misuse only. A failed negotiation (no contract match,
//! no graph edge, no route) is an expected outcome and is modelled as
//! `Option`/empty collections throughout the crate, never as an error.

use thiserror::Error;

/// Result type alias using Transit's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Transit operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A negotiator was built without a transformation function.
    #[error("negotiator '{negotiator}' has no executable")]
    MissingExecutable {
        /// Name of the offending negotiator.
        negotiator: String,
    },

    /// A negotiator was built with no contracts in either role.
    #[error("negotiator '{negotiator}' declares no source or output contracts")]
    NoContracts {
        /// Name of the offending negotiator.
        negotiator: String,
    },

    /// A negotiator was used in a role it does not support.
    #[error("negotiator '{negotiator}' cannot act as {expected} (no {expected} contracts)")]
    RoleMismatch {
        /// Name of the offending negotiator.
        negotiator: String,
        /// The role that was required ("source" or "output").
        expected: &'static str,
    },
}
