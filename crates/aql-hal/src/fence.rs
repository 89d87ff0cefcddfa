//! # Memory Fence Operations
//!
//! Barriers separating ring memory writes from the stores that publish them.

use core::sync::atomic::{fence, Ordering};

/// Order all prior ring writes before any subsequent store
///
/// Issued between a packet's payload and its header, and between a batch
/// copy and the write index update.
#[inline(always)]
pub fn packet_release() {
    fence(Ordering::Release);
}
