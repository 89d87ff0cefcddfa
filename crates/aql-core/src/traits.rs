//! # AQL Core Traits
//!
//! Interfaces to the collaborators the queue core depends on but does not
//! own.
//!
//! ## Trait Hierarchy
//!
//! ```text
//! Device (aql-hal)
//!    │
//!    ├── HwQueue (aql-hal)
//!    │
//!    └── SignalProvider
//!
//! Program
//! ```

use crate::error::Result;
use crate::sync::{SignalCondition, WaitState};
use crate::types::*;

// =============================================================================
// PROGRAM TRAIT
// =============================================================================

/// A loaded kernel ready for dispatch
pub trait Program {
    /// Kernel code object handle
    fn kernel_object(&self) -> KernelObject;

    /// Per-work-item private segment size in bytes
    fn private_segment_size(&self) -> u32;

    /// Per-workgroup group (LDS) segment size in bytes
    fn group_segment_size(&self) -> u32;
}

impl<P: Program + ?Sized> Program for &P {
    fn kernel_object(&self) -> KernelObject {
        (**self).kernel_object()
    }

    fn private_segment_size(&self) -> u32 {
        (**self).private_segment_size()
    }

    fn group_segment_size(&self) -> u32 {
        (**self).group_segment_size()
    }
}

// =============================================================================
// SIGNAL PROVIDER TRAIT
// =============================================================================

/// Source of completion signals
///
/// Reusable signals are recycled by the provider once the hardware has
/// consumed them; the queue never releases signals itself.
pub trait SignalProvider {
    /// Allocate a completion signal
    fn alloc_signal(&self, reusable: bool) -> Result<Signal>;

    /// Block until `condition` holds for the signal value, with acquire
    /// semantics on return
    ///
    /// Returns the observed signal value. `timeout_hint` is in the runtime's
    /// timestamp units; `u64::MAX` means wait forever.
    fn wait_signal(
        &self,
        signal: Signal,
        condition: SignalCondition,
        compare: i64,
        timeout_hint: u64,
        wait_state: WaitState,
    ) -> i64;
}

impl<S: SignalProvider + ?Sized> SignalProvider for &S {
    fn alloc_signal(&self, reusable: bool) -> Result<Signal> {
        (**self).alloc_signal(reusable)
    }

    fn wait_signal(
        &self,
        signal: Signal,
        condition: SignalCondition,
        compare: i64,
        timeout_hint: u64,
        wait_state: WaitState,
    ) -> i64 {
        (**self).wait_signal(signal, condition, compare, timeout_hint, wait_state)
    }
}
