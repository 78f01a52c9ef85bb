//! Errors raised when constructing scoring tables.
#![forbid(unsafe_code)]

use thiserror::Error;

/// Errors raised when an explicitly constructed table is unusable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TableError {
    /// A table entry had an empty or whitespace-only category key.
    #[error("category keys must not be empty")]
    EmptyCategory,
    /// The fallback geofence radius was zero.
    #[error("default geofence radius must be positive")]
    ZeroDefaultRadius,
    /// The fallback category weight falls outside the point range.
    #[error("default category weight {points} is outside {min}..={max}")]
    DefaultPointsOutOfRange {
        /// Rejected weight.
        points: u32,
        /// Lowest permitted point value.
        min: u32,
        /// Highest permitted point value.
        max: u32,
    },
}
