//! # Native Status Codes
//!
//! Every call into the native runtime returns a status code. [`Status::check`]
//! turns anything other than success into an [`Error::Hsa`] at the call site.

use core::fmt;

use crate::error::{Error, Result};

/// Status code returned by the native runtime (`hsa_status_t`)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Status(u32);

impl Status {
    /// The function has been executed successfully
    pub const SUCCESS: Self = Self(0x0);
    /// A traversal over a list of elements has been interrupted
    pub const INFO_BREAK: Self = Self(0x1);
    /// Generic error
    pub const ERROR: Self = Self(0x1000);
    /// One of the actual arguments does not meet a precondition
    pub const ERROR_INVALID_ARGUMENT: Self = Self(0x1001);
    /// The requested queue creation is not valid
    pub const ERROR_INVALID_QUEUE_CREATION: Self = Self(0x1002);
    /// The requested allocation is not valid
    pub const ERROR_INVALID_ALLOCATION: Self = Self(0x1003);
    /// The agent is invalid
    pub const ERROR_INVALID_AGENT: Self = Self(0x1004);
    /// The memory region is invalid
    pub const ERROR_INVALID_REGION: Self = Self(0x1005);
    /// The signal is invalid
    pub const ERROR_INVALID_SIGNAL: Self = Self(0x1006);
    /// The queue is invalid
    pub const ERROR_INVALID_QUEUE: Self = Self(0x1007);
    /// The runtime failed to allocate resources
    pub const ERROR_OUT_OF_RESOURCES: Self = Self(0x1008);
    /// The AQL packet is malformed
    pub const ERROR_INVALID_PACKET_FORMAT: Self = Self(0x1009);
    /// An error has been detected while releasing a resource
    pub const ERROR_RESOURCE_FREE: Self = Self(0x100A);
    /// The runtime is not initialized
    pub const ERROR_NOT_INITIALIZED: Self = Self(0x100B);
    /// Reference count overflow
    pub const ERROR_REFCOUNT_OVERFLOW: Self = Self(0x100C);
    /// The arguments are not compatible with each other
    pub const ERROR_INCOMPATIBLE_ARGUMENTS: Self = Self(0x100D);
    /// The index is invalid
    pub const ERROR_INVALID_INDEX: Self = Self(0x100E);
    /// A hardware exception was raised on the queue
    pub const ERROR_EXCEPTION: Self = Self(0x1016);

    /// Wrap a raw status code
    #[inline]
    pub const fn from_raw(code: u32) -> Self {
        Self(code)
    }

    /// Raw status code
    #[inline]
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Whether the status reports success
    ///
    /// Only `SUCCESS` counts; `INFO_BREAK` is not expected from any queue
    /// call and is treated as a failure.
    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }

    /// Convert into a `Result`, failing on any error status
    pub fn check(self) -> Result<()> {
        if self.is_success() {
            Ok(())
        } else {
            log::debug!("native call failed with status {:#x}", self.0);
            Err(Error::Hsa(self))
        }
    }

    /// Human-readable description of the status code
    pub const fn description(self) -> &'static str {
        match self.0 {
            0x0 => "The function has been executed successfully.",
            0x1 => "A traversal over a list of elements has been interrupted.",
            0x1000 => "A generic error has occurred.",
            0x1001 => "One of the actual arguments does not meet a precondition.",
            0x1002 => "The requested queue creation is not valid.",
            0x1003 => "The requested allocation is not valid.",
            0x1004 => "The agent is invalid.",
            0x1005 => "The memory region is invalid.",
            0x1006 => "The signal is invalid.",
            0x1007 => "The queue is invalid.",
            0x1008 => "The runtime failed to allocate the necessary resources.",
            0x1009 => "The AQL packet is malformed.",
            0x100A => "An error has been detected while releasing a resource.",
            0x100B => "An API other than initialization has been invoked while the runtime is not initialized.",
            0x100C => "The maximum reference count for the object has been reached.",
            0x100D => "The arguments passed to a function are not compatible.",
            0x100E => "The index is invalid.",
            0x1016 => "An exception was raised on the queue.",
            _ => "Unknown HSA status code.",
        }
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Status({:#x})", self.0)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}: {}", self.0, self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_passes_check() {
        assert_eq!(Status::SUCCESS.check(), Ok(()));
    }

    #[test]
    fn test_info_break_is_not_success() {
        assert!(!Status::INFO_BREAK.is_success());
        assert_eq!(Status::INFO_BREAK.check(), Err(Error::Hsa(Status::INFO_BREAK)));
    }

    #[test]
    fn test_failure_is_fatal() {
        let err = Status::ERROR_INVALID_QUEUE.check().unwrap_err();
        assert_eq!(err, Error::Hsa(Status::ERROR_INVALID_QUEUE));
    }

    #[test]
    fn test_unknown_code_still_described() {
        let status = Status::from_raw(0xdead);
        assert_eq!(status.code(), 0xdead);
        assert_eq!(status.description(), "Unknown HSA status code.");
        assert!(status.check().is_err());
    }
}
