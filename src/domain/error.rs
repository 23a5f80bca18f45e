//! Domain validation errors.
//!
//! Returned when a domain invariant would be violated: unparseable chain or
//! route identifiers, quota underflow, malformed ranges.

use thiserror::Error;

use super::route::Route;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Chain name is not one of the supported chains.
    #[error("unknown chain: {name}")]
    UnknownChain {
        /// The name that failed to parse.
        name: String,
    },

    /// Route identifier is malformed or not servable by its provider.
    #[error("invalid route '{route}': {reason}")]
    InvalidRoute {
        /// The offending identifier.
        route: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Decrementing the route's quota would take it below zero.
    #[error("quota for {route} is already exhausted")]
    QuotaUnderflow {
        /// The route whose quota is zero.
        route: Route,
    },

    /// Route is not part of the account's quota table.
    #[error("route {route} is not tracked for this account")]
    UntrackedRoute {
        /// The route that was looked up.
        route: Route,
    },

    /// Lower bound of a range exceeds its upper bound.
    #[error("range [{low}, {high}] is inverted")]
    InvertedRange {
        /// Lower bound as written.
        low: String,
        /// Upper bound as written.
        high: String,
    },
}
