//! # Flow Control
//!
//! Deciding when the producer has to wait for the packet processor.
//!
//! ## Policy
//!
//! ```text
//! reserve(n) ── available >= n ──▶ write
//!     │
//!     └── available < n ──▶ spin on read index ──▶ write
//!
//! wait() ──▶ barrier + signal ──▶ block until signal < 1 ──▶ available = capacity
//! ```
//!
//! Neither path has a timeout. The packet processor always makes progress
//! on a healthy device; a hung device hangs the caller.

use core::hint;

use aql_core::{Error, Result, SignalCondition, SignalProvider, WaitState};
use aql_hal::{Device, HwQueue};

use crate::packet::BarrierAnd;
use crate::queue::{AqlQueue, QueueState};
use crate::ring::RingBuffer;

/// Timeout hint meaning "wait forever"
pub const WAIT_FOREVER: u64 = u64::MAX;

impl<Q: HwQueue> RingBuffer<Q> {
    /// Spin on the hardware read index until `n` slots are free
    ///
    /// More slots than the ring holds can never become free and are
    /// rejected up front.
    pub fn poll_until_available(&mut self, n: u64) -> Result<()> {
        if n > self.capacity() {
            return Err(Error::RingOverflow {
                requested: n,
                capacity: self.capacity(),
            });
        }
        if self.available >= n {
            return Ok(());
        }

        self.stats.stalls += 1;
        log::trace!(
            "ring full: need {} slot(s), {} available at doorbell index {}",
            n,
            self.available,
            self.doorbell_index()
        );

        loop {
            self.refresh_available();
            if self.available >= n {
                return Ok(());
            }
            hint::spin_loop();
        }
    }

    /// Recompute the free slot count from the read index
    pub fn refresh_available(&mut self) -> u64 {
        let read_index = self.hw().load_read_index();
        let in_flight = self.doorbell_index().saturating_sub(read_index);
        self.available = self.capacity().saturating_sub(in_flight);
        self.available
    }

    /// Mark every slot free
    ///
    /// Only valid once the packet processor has consumed everything
    /// enqueued so far.
    pub fn reset_available(&mut self) {
        self.available = self.capacity();
    }
}

impl<D: Device> AqlQueue<D> {
    /// Block until every packet submitted so far has completed
    ///
    /// Submits a barrier with a fresh reusable signal, waits for the signal
    /// to drop below 1 and then treats the whole ring as free.
    pub fn drain_and_reset(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.state = QueueState::Draining;

        let result = self.drain();

        // Failures happen before the barrier is written.
        self.state = QueueState::Active;
        result
    }

    fn drain(&mut self) -> Result<()> {
        self.ring.reserve(1)?;
        let signal = self.device.alloc_signal(true)?;
        let image = BarrierAnd::new(&[])?.with_completion_signal(signal).encode();
        self.ring.write_slot(&image);
        self.ring.publish();

        let value = self.device.wait_signal(
            signal,
            SignalCondition::Lt,
            1,
            WAIT_FOREVER,
            WaitState::Active,
        );
        log::trace!("drain barrier {:?} completed with value {}", signal, value);

        self.ring.reset_available();
        self.ring.stats.drains += 1;
        log::debug!(
            "queue drained at doorbell index {}",
            self.ring.doorbell_index()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use aql_core::GpuAddr;
    use aql_hal::soft::{SoftDevice, SoftQueue};

    use super::*;
    use crate::packet::PacketImage;
    use crate::queue::QueueConfig;

    fn fill(ring: &mut RingBuffer<SoftQueue>, n: u64) {
        let image: PacketImage = BarrierAnd::new(&[]).unwrap().encode();
        for _ in 0..n {
            ring.reserve(1).unwrap();
            ring.write_slot(&image);
        }
        ring.publish();
    }

    #[test]
    fn test_refresh_tracks_read_index() {
        let mut ring = RingBuffer::new(SoftQueue::new(8, GpuAddr::new(0x1000))).unwrap();
        let regs = ring.hw().registers();

        fill(&mut ring, 5);
        assert_eq!(ring.available_slots(), 3);
        assert_eq!(ring.refresh_available(), 3);

        regs.advance_read_index(2);
        assert_eq!(ring.refresh_available(), 5);
    }

    #[test]
    fn test_poll_returns_when_space_exists() {
        let mut ring = RingBuffer::new(SoftQueue::new(4, GpuAddr::new(0x1000))).unwrap();
        let regs = ring.hw().registers();

        fill(&mut ring, 4);
        assert_eq!(ring.available_slots(), 0);

        regs.advance_read_index(3);
        ring.poll_until_available(2).unwrap();
        assert_eq!(ring.available_slots(), 3);
        assert_eq!(ring.stats().stalls, 1);

        ring.poll_until_available(1).unwrap();
        assert_eq!(ring.stats().stalls, 1);
    }

    #[test]
    fn test_poll_rejects_more_than_capacity() {
        let mut ring = RingBuffer::new(SoftQueue::new(4, GpuAddr::new(0x1000))).unwrap();
        fill(&mut ring, 4);

        assert_eq!(
            ring.poll_until_available(5),
            Err(Error::RingOverflow {
                requested: 5,
                capacity: 4
            })
        );
        assert_eq!(ring.stats().stalls, 0);
        assert_eq!(ring.available_slots(), 0);
    }

    #[test]
    fn test_drain_resets_available() {
        let device = SoftDevice::new(64);
        let mut queue = AqlQueue::new(&device, QueueConfig::with_size(8)).unwrap();

        for _ in 0..5 {
            queue.submit_barrier(&[], crate::queue::Completion::None).unwrap();
        }
        assert_eq!(queue.available_slots(), 3);

        queue.drain_and_reset().unwrap();
        assert_eq!(queue.available_slots(), queue.capacity());
        assert_eq!(queue.state(), QueueState::Active);
        assert_eq!(queue.stats().drains, 1);
        assert_eq!(queue.doorbell_index(), 6);

        let signals = device.allocated_signals();
        assert_eq!(signals.len(), 1);
        assert!(signals[0].reusable);
        assert_eq!(device.wait_count(), 1);
    }

    #[test]
    fn test_drain_on_full_ring_waits_for_slot() {
        let device = SoftDevice::new(64);
        let mut queue = AqlQueue::new(&device, QueueConfig::with_size(4)).unwrap();
        let regs = device.queue_registers(0).unwrap();

        for _ in 0..4 {
            queue.submit_barrier(&[], crate::queue::Completion::None).unwrap();
        }
        regs.advance_read_index(1);

        queue.drain_and_reset().unwrap();
        assert_eq!(queue.available_slots(), 4);
        assert_eq!(regs.write_index(), 5);
        assert_eq!(regs.read_index(), 5);
    }
}
