//! # Hardware Queue
//!
//! Register and memory access for a single user-mode AQL queue.

use aql_core::{GpuAddr, Status};

// =============================================================================
// QUEUE CREATION
// =============================================================================

/// Producer model requested at queue creation (`hsa_queue_type_t`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum QueueType {
    /// Multiple producers may submit concurrently
    Multiple    = 0,
    /// Exactly one producer submits
    Single      = 1,
    /// Cooperative dispatch queue
    Cooperative = 2,
}

/// Hardware scheduling priority (`hsa_amd_queue_priority_t`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum QueuePriority {
    /// Low priority
    Low    = 0,
    /// Normal priority
    Normal = 1,
    /// High priority
    #[default]
    High   = 2,
}

/// Parameters passed to the native queue constructor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueCreateInfo {
    /// Ring size in packets; must be a power of two
    pub size: u32,
    /// Producer model
    pub queue_type: QueueType,
    /// Private segment size hint (`u32::MAX` lets the runtime decide)
    pub private_segment_size: u32,
    /// Group segment size hint (`u32::MAX` lets the runtime decide)
    pub group_segment_size: u32,
}

impl QueueCreateInfo {
    /// Single-producer queue with runtime-chosen segment sizes
    pub const fn single(size: u32) -> Self {
        Self {
            size,
            queue_type: QueueType::Single,
            private_segment_size: u32::MAX,
            group_segment_size: u32::MAX,
        }
    }
}

// =============================================================================
// HARDWARE QUEUE TRAIT
// =============================================================================

/// A native AQL queue object
///
/// The queue core owns exactly one `HwQueue` per ring and is its only
/// producer. The packet processor consumes concurrently, advancing the read
/// index.
pub trait HwQueue {
    /// Ring size in packets as reported by the runtime
    fn size(&self) -> u32;

    /// Device-visible address of slot 0
    fn base_address(&self) -> GpuAddr;

    /// Ring memory, `size() * 64` bytes
    fn ring(&self) -> &[u8];

    /// Mutable ring memory, `size() * 64` bytes
    fn ring_mut(&mut self) -> &mut [u8];

    /// Load the packet processor's read index (acquire)
    fn load_read_index(&self) -> u64;

    /// Store the write index (release)
    fn store_write_index(&self, index: u64);

    /// Store a value to the doorbell signal (release)
    fn store_doorbell(&self, value: u64);

    /// Set the hardware scheduling priority
    fn set_priority(&mut self, priority: QueuePriority) -> Status;

    /// Enable or disable dispatch timestamp collection
    fn set_profiler_enabled(&mut self, enabled: bool) -> Status;

    /// Destroy the native queue object
    ///
    /// Called exactly once, at teardown.
    fn destroy(&mut self) -> Status;
}
