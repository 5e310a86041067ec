//! # Validation Errors
//!
//! Construction-time failures for the core newtypes. Domain crates define
//! their own error enums and wrap this one where a constructor can fail.

use thiserror::Error;

/// A value was rejected by a validated constructor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An identifier was empty or whitespace only.
    #[error("{kind} must not be empty")]
    Empty {
        /// The kind of identifier (e.g. "company name").
        kind: &'static str,
    },

    /// An identifier exceeded its maximum encoded length.
    #[error("{kind} {value:?} is {len} bytes, maximum is {max}")]
    TooLong {
        /// The kind of identifier.
        kind: &'static str,
        /// The rejected value.
        value: String,
        /// Its length in bytes.
        len: usize,
        /// The maximum permitted length in bytes.
        max: usize,
    },

    /// Granularity must be at least one unit.
    #[error("granularity must be greater than zero")]
    ZeroGranularity,
}
