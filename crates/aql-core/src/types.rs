//! # AQL Core Types
//!
//! Strongly typed handles and addresses used across the queue stack.
//!
//! These types provide:
//! - Distinct types for device addresses and opaque runtime handles
//! - The empty-signal sentinel used by every packet kind
//! - Fixed 64-bit widths matching the packet ABI

use core::fmt;
use core::ops::Add;

use static_assertions::const_assert_eq;

/// Size of one AQL packet, and the stride of every ring slot
pub const AQL_PACKET_SIZE: usize = 64;

// =============================================================================
// GPU ADDRESS
// =============================================================================

/// Device-visible address
///
/// Queue base addresses, kernarg buffers and indirect buffers are all
/// expressed in the agent's address space. Not dereferenceable from Rust.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct GpuAddr(u64);

impl GpuAddr {
    /// Create a new GPU address
    #[inline]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Create a null GPU address
    #[inline]
    pub const fn null() -> Self {
        Self(0)
    }

    /// Get the raw u64 value
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Low 32 bits
    #[inline]
    pub const fn lo(self) -> u32 {
        self.0 as u32
    }

    /// High 32 bits
    #[inline]
    pub const fn hi(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl Add<u64> for GpuAddr {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0.wrapping_add(rhs))
    }
}

impl fmt::Debug for GpuAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GpuAddr(0x{:016x})", self.0)
    }
}

// =============================================================================
// SIGNAL
// =============================================================================

/// Opaque handle to a hardware completion signal (`hsa_signal_t`)
///
/// The core never looks inside a signal. It only copies the handle into
/// packets and hands it back to the [`SignalProvider`](crate::SignalProvider)
/// for waiting.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Signal(u64);

impl Signal {
    /// The "no signal" sentinel
    pub const EMPTY: Self = Self(0);

    /// Wrap a raw handle
    #[inline]
    pub const fn from_handle(handle: u64) -> Self {
        Self(handle)
    }

    /// Raw handle value
    #[inline]
    pub const fn handle(self) -> u64 {
        self.0
    }

    /// Check for the empty sentinel
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "Signal(EMPTY)")
        } else {
            write!(f, "Signal(0x{:x})", self.0)
        }
    }
}

// =============================================================================
// AGENT AND KERNEL HANDLES
// =============================================================================

/// Opaque agent handle (`hsa_agent_t`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct AgentHandle(pub u64);

/// Kernel code object handle placed in dispatch packets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct KernelObject(pub u64);

// =============================================================================
// DISPATCH GEOMETRY
// =============================================================================

/// Three-dimensional launch extent
///
/// Used for both the workgroup (local) size and the number of workgroups
/// (global size). The grid written to the packet is their product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dim3 {
    /// X extent
    pub x: u32,
    /// Y extent
    pub y: u32,
    /// Z extent
    pub z: u32,
}

impl Dim3 {
    /// Create a new extent
    #[inline]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Extent as an array, x first
    #[inline]
    pub const fn to_array(self) -> [u32; 3] {
        [self.x, self.y, self.z]
    }
}

const_assert_eq!(core::mem::size_of::<GpuAddr>(), 8);
const_assert_eq!(core::mem::size_of::<Signal>(), 8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_addr_split() {
        let addr = GpuAddr::new(0x1234_5678_9abc_def0);
        assert_eq!(addr.lo(), 0x9abc_def0);
        assert_eq!(addr.hi(), 0x1234_5678);
        assert_eq!((addr + 0x10).raw(), 0x1234_5678_9abc_df00);
        assert_eq!(GpuAddr::null().raw(), 0);
    }

    #[test]
    fn test_empty_signal_is_zero_handle() {
        assert!(Signal::EMPTY.is_empty());
        assert_eq!(Signal::default(), Signal::EMPTY);
        assert!(!Signal::from_handle(7).is_empty());
    }
}
