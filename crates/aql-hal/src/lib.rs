//! # AQL Hardware Abstraction Layer
//!
//! The register-level surface of an HSA user-mode queue: the ring memory the
//! packet processor reads, the read and write index registers, and the
//! doorbell signal.
//!
//! ## Publish Ordering
//!
//! ```text
//!   packet payload ──▶ packet header ──▶ write index ──▶ doorbell
//!          (release fence)    (release store)  (release store)
//! ```
//!
//! Implementations of [`HwQueue`] must give the index and doorbell stores
//! release semantics and the read index load acquire semantics.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod device;
pub mod fence;
pub mod queue;
#[cfg(any(feature = "soft", test))]
pub mod soft;

// Re-exports
pub use device::Device;
pub use queue::{HwQueue, QueueCreateInfo, QueuePriority, QueueType};
