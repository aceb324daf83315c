//! Error taxonomy shared by every routing strategy.

use thiserror::Error;

/// Why a safe route could not be produced.
///
/// Components below the route planner report failure as `None`; only the
/// planner turns those into one of these variants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    /// The offline road graph is missing or could not be parsed.
    #[error("road graph asset unavailable: {0}")]
    AssetUnavailable(String),
    /// Every strategy was exhausted without a verified safe route.
    #[error("no safe route found")]
    NoPathFound,
    /// A network call failed, timed out or returned an error status.
    #[error("routing service unavailable: {0}")]
    ServiceUnavailable(String),
    /// The request can never be satisfied, e.g. the start lies inside a zone.
    #[error("invalid route request: {0}")]
    InputInvalid(String),
}

impl RouteError {
    /// True for errors the caller should present as "no safe route".
    pub fn is_no_route(&self) -> bool {
        matches!(self, RouteError::NoPathFound)
    }
}
