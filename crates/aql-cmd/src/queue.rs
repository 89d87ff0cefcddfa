//! # AQL Queue
//!
//! A single user-mode hardware queue and everything submitted to it.
//!
//! ## Lifecycle
//!
//! ```text
//! Created ──▶ Active ◀──▶ Draining
//!                │            │
//!                └─────┬──────┘
//!                      ▼
//!                  Destroyed
//! ```
//!
//! Submissions are only accepted in `Active`. The native queue is destroyed
//! exactly once, by [`AqlQueue::destroy`] or on drop.

use core::fmt;

use aql_core::{AgentHandle, Dim3, Error, GpuAddr, Program, Result, Signal, Status};
use aql_hal::{Device, HwQueue, QueueCreateInfo, QueuePriority};

use crate::packet::{BarrierAnd, KernelDispatch, Packet, VendorIndirectBuffer};
use crate::pm4::Pm4Block;
use crate::ring::{self, RingBuffer, RingStats};

// =============================================================================
// QUEUE CONFIGURATION
// =============================================================================

/// Queue configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Requested size in packets; `None` uses the device maximum
    pub size: Option<u32>,
    /// Hardware scheduling priority
    pub priority: QueuePriority,
    /// Collect dispatch timestamps
    pub profiling: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            size: None,
            priority: QueuePriority::High,
            profiling: true,
        }
    }
}

impl QueueConfig {
    /// Default configuration with a requested size
    pub fn with_size(size: u32) -> Self {
        Self {
            size: Some(size),
            ..Self::default()
        }
    }

    /// Size to request from a device supporting at most `max` packets
    pub fn resolve_size(&self, max: u32) -> u32 {
        self.size.map_or(max, |size| size.min(max))
    }
}

// =============================================================================
// QUEUE STATE
// =============================================================================

/// Queue state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Native queue exists, not yet configured
    Created,
    /// Accepting submissions
    Active,
    /// Waiting for the packet processor to catch up
    Draining,
    /// Native queue destroyed
    Destroyed,
}

// =============================================================================
// COMPLETION
// =============================================================================

/// Completion signal requested for a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Completion {
    /// No signal; the packet carries the empty handle
    #[default]
    None,
    /// Allocate a fresh reusable signal
    Allocate,
    /// Use a signal the caller already owns
    Signal(Signal),
}

// =============================================================================
// AQL QUEUE
// =============================================================================

/// A hardware AQL queue
///
/// Single producer: every submission takes `&mut self`, callers sharing a
/// queue across threads serialize access themselves.
pub struct AqlQueue<D: Device> {
    /// Owning agent and signal source
    pub(crate) device: D,
    /// Ring and native queue
    pub(crate) ring: RingBuffer<D::Queue>,
    /// Lifecycle state
    pub(crate) state: QueueState,
}

impl<D: Device> AqlQueue<D> {
    /// Create and configure a queue on `device`
    pub fn new(device: D, config: QueueConfig) -> Result<Self> {
        let max = device.max_queue_size()?;
        let size = config.resolve_size(max);
        let mut hw = device.create_queue(QueueCreateInfo::single(size))?;

        if let Err(err) = ring::validate_layout(&hw) {
            let status = hw.destroy();
            if !status.is_success() {
                log::error!("failed to destroy rejected queue: {}", Error::Hsa(status));
            }
            return Err(err);
        }

        let mut queue = Self {
            device,
            ring: RingBuffer::new(hw)?,
            state: QueueState::Created,
        };

        // Dropping a half-configured queue still destroys it.
        let hw = queue.ring.hw_mut();
        hw.set_priority(config.priority).check()?;
        hw.set_profiler_enabled(config.profiling).check()?;
        queue.state = QueueState::Active;

        log::debug!(
            "created AQL queue: {} packets at {:?}..={:?} on {:?}, priority {:?}, profiling {}",
            queue.capacity(),
            queue.base_address(),
            queue.end_address(),
            queue.device.agent(),
            config.priority,
            config.profiling
        );
        Ok(queue)
    }

    pub(crate) fn ensure_active(&self) -> Result<()> {
        if self.state != QueueState::Active {
            return Err(Error::InvalidState);
        }
        Ok(())
    }

    fn completion_signal(&self, completion: Completion) -> Result<Signal> {
        match completion {
            Completion::None => Ok(Signal::EMPTY),
            Completion::Allocate => self.device.alloc_signal(true),
            Completion::Signal(signal) => Ok(signal),
        }
    }

    /// Reserve, attach the completion signal, write and publish one packet
    fn enqueue(&mut self, mut packet: Packet, completion: Completion) -> Result<Signal> {
        self.ring.reserve(1)?;
        let signal = self.completion_signal(completion)?;
        packet.set_completion_signal(signal);
        self.ring.write_slot(&packet.encode());
        self.ring.publish();
        Ok(signal)
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Dispatch `program` over `global` workgroups of `local` work-items
    ///
    /// Returns the completion signal, or the empty signal when none was
    /// requested.
    pub fn submit_kernel(
        &mut self,
        program: &impl Program,
        global: Dim3,
        local: Dim3,
        kernarg_address: GpuAddr,
        completion: Completion,
    ) -> Result<Signal> {
        self.ensure_active()?;
        let packet = KernelDispatch::new(program, global, local, kernarg_address)?;
        self.enqueue(packet.into(), completion)
    }

    /// Barrier that waits for up to five signals to reach zero
    pub fn submit_barrier(&mut self, wait_signals: &[Signal], completion: Completion) -> Result<Signal> {
        self.ensure_active()?;
        let packet = BarrierAnd::new(wait_signals)?;
        self.enqueue(packet.into(), completion)
    }

    /// Execute `size_bytes` of PM4 commands at `address`
    ///
    /// Sizes beyond [`INDIRECT_BUFFER_MAX_BYTES`](crate::pm4::INDIRECT_BUFFER_MAX_BYTES)
    /// are rejected before anything is written.
    pub fn submit_vendor_command(
        &mut self,
        address: GpuAddr,
        size_bytes: u32,
        completion: Completion,
    ) -> Result<Signal> {
        self.ensure_active()?;
        let commands = Pm4Block::indirect_buffer(address, size_bytes)?;
        self.submit_vendor_block(commands, completion)
    }

    /// Execute a PM4 block embedded directly in the packet
    pub fn submit_vendor_block(&mut self, commands: Pm4Block, completion: Completion) -> Result<Signal> {
        self.ensure_active()?;
        self.enqueue(VendorIndirectBuffer::new(commands).into(), completion)
    }

    /// Submit a prepared packet as is, keeping its completion signal
    pub fn submit_packet(&mut self, packet: impl Into<Packet>) -> Result<Signal> {
        self.ensure_active()?;
        let packet = packet.into();
        let signal = packet.completion_signal();
        self.enqueue(packet, Completion::Signal(signal))
    }

    /// Copy `count` pre-encoded packets from `packets` and publish them
    pub fn submit_raw_packets(&mut self, packets: &[u8], count: u64) -> Result<()> {
        self.ensure_active()?;
        self.ring.blit(packets, count)
    }

    /// Block until everything submitted so far has completed
    pub fn wait(&mut self) -> Result<()> {
        self.drain_and_reset()
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    fn teardown(&mut self) -> Status {
        if self.state == QueueState::Destroyed {
            return Status::SUCCESS;
        }
        self.state = QueueState::Destroyed;
        let status = self.ring.hw_mut().destroy();
        log::debug!(
            "destroyed AQL queue at {:?} after {} packets: {:?}",
            self.ring.base_address(),
            self.ring.doorbell_index(),
            status
        );
        status
    }

    /// Destroy the native queue, reporting failure
    pub fn destroy(mut self) -> Result<()> {
        self.teardown().check()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Queue state
    pub fn state(&self) -> QueueState {
        self.state
    }

    /// Ring capacity in packets
    pub fn capacity(&self) -> u64 {
        self.ring.capacity()
    }

    /// Cached free slot count
    pub fn available_slots(&self) -> u64 {
        self.ring.available_slots()
    }

    /// Packets ever enqueued
    pub fn doorbell_index(&self) -> u64 {
        self.ring.doorbell_index()
    }

    /// Address of slot 0
    pub fn base_address(&self) -> GpuAddr {
        self.ring.base_address()
    }

    /// Address of the last byte of the ring
    pub fn end_address(&self) -> GpuAddr {
        self.ring.end_address()
    }

    /// Address the next packet will be written to
    pub fn write_address(&self) -> GpuAddr {
        self.ring.write_address()
    }

    /// Ring statistics
    pub fn stats(&self) -> &RingStats {
        self.ring.stats()
    }

    /// Agent the queue runs on
    pub fn agent(&self) -> AgentHandle {
        self.device.agent()
    }

    /// Owning device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Ring buffer
    pub fn ring(&self) -> &RingBuffer<D::Queue> {
        &self.ring
    }
}

impl<D: Device> fmt::Debug for AqlQueue<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AqlQueue")
            .field("agent", &self.device.agent())
            .field("state", &self.state)
            .field("base", &self.ring.base_address())
            .field("capacity", &self.ring.capacity())
            .field("doorbell_index", &self.ring.doorbell_index())
            .field("available", &self.ring.available_slots())
            .finish()
    }
}

impl<D: Device> Drop for AqlQueue<D> {
    fn drop(&mut self) {
        let status = self.teardown();
        if !status.is_success() {
            log::error!("failed to destroy AQL queue: {}", Error::Hsa(status));
        }
    }
}
