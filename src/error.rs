//! Unified error handling for the route-analytics library.
//!
//! Only structurally impossible inputs are errors. Missing-but-expected data
//! (no timestamps, too few samples, routes that cannot be aligned) is reported
//! as `None` or an empty collection by the analytics functions instead.

use thiserror::Error;

/// Unified error type for route-analytics operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteAnalyticsError {
    /// The parsed route contained no points at all
    #[error("Route '{route_id}' contains no points")]
    EmptyRoute { route_id: String },

    /// Every point was rejected by validation
    #[error("Route '{route_id}' has no usable points ({skipped} skipped)")]
    NoUsablePoints { route_id: String, skipped: usize },

    /// Input could not be decoded (corrupt JSON handed over by the parser)
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl From<serde_json::Error> for RouteAnalyticsError {
    fn from(err: serde_json::Error) -> Self {
        RouteAnalyticsError::Parse {
            message: err.to_string(),
        }
    }
}

/// Result type alias for route-analytics operations.
pub type Result<T> = std::result::Result<T, RouteAnalyticsError>;
