//! # AQL Error Handling
//!
//! Error types for the queue submission stack.
//!
//! Native runtime failures are never retried at this layer. They surface as
//! [`Error::Hsa`] carrying the reported [`Status`]. Caller mistakes
//! (too many barrier dependencies, oversized batches) get their own
//! variants and fail before anything is written to the ring.

use core::fmt;

use crate::status::Status;

// =============================================================================
// RESULT TYPE
// =============================================================================

/// AQL Result type alias
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// ERROR ENUM
// =============================================================================

/// AQL unified error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Native Runtime Errors
    // =========================================================================
    /// The native runtime returned a non-success status
    Hsa(Status),

    // =========================================================================
    // Contract Violations
    // =========================================================================
    /// Invalid parameter provided
    InvalidParameter(&'static str),
    /// Barrier packets carry at most five dependency signals
    TooManyDependencies {
        /// Number of signals the caller supplied
        count: usize,
    },
    /// PM4 block does not fit in the vendor packet payload
    CommandBlockTooLarge {
        /// Number of command words supplied
        words: usize,
    },
    /// Request needs more slots than the ring holds
    RingOverflow {
        /// Slots requested
        requested: u64,
        /// Total ring capacity in slots
        capacity: u64,
    },
    /// Raw packet buffer shorter than the declared packet count
    BufferTooSmall {
        /// Bytes needed for the declared packet count
        needed: usize,
        /// Bytes actually supplied
        actual: usize,
    },

    // =========================================================================
    // Queue Lifecycle Errors
    // =========================================================================
    /// Operation not valid in the queue's current state
    InvalidState,
    /// Device reported a queue size the ring cannot use
    InvalidQueueSize(u32),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hsa(status) => write!(f, "HSA Error {:#x}: {}", status.code(), status.description()),
            Self::InvalidParameter(what) => write!(f, "invalid parameter: {what}"),
            Self::TooManyDependencies { count } => {
                write!(f, "barrier supports at most 5 dependency signals, got {count}")
            },
            Self::CommandBlockTooLarge { words } => {
                write!(f, "PM4 block of {words} words exceeds the vendor packet payload")
            },
            Self::RingOverflow { requested, capacity } => {
                write!(f, "requested {requested} slots from a ring of {capacity}")
            },
            Self::BufferTooSmall { needed, actual } => {
                write!(f, "packet buffer too small: need {needed} bytes, have {actual}")
            },
            Self::InvalidState => write!(f, "operation not valid in current queue state"),
            Self::InvalidQueueSize(size) => write!(f, "invalid queue size {size}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

// =============================================================================
// ERROR CONVERSION
// =============================================================================

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        Error::Hsa(status)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::string::ToString;

    use super::*;

    #[test]
    fn test_hsa_error_carries_code_and_description() {
        let err = Error::from(Status::ERROR_OUT_OF_RESOURCES);
        assert_eq!(
            err.to_string(),
            "HSA Error 0x1008: The runtime failed to allocate the necessary resources."
        );
    }

    #[test]
    fn test_contract_violation_messages() {
        let err = Error::TooManyDependencies { count: 6 };
        assert!(err.to_string().contains("got 6"));

        let err = Error::RingOverflow {
            requested: 9,
            capacity: 8,
        };
        assert_eq!(err.to_string(), "requested 9 slots from a ring of 8");
    }
}
