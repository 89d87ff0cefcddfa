//! # Packet Ring
//!
//! Producer side of an AQL ring: write cursor, doorbell index and the cached
//! count of free slots.
//!
//! The doorbell index counts every packet ever enqueued and never wraps in
//! practice; the slot a packet lands in is `doorbell_index % capacity`.

use core::ops::Range;

use aql_core::{Error, GpuAddr, Result, AQL_PACKET_SIZE};
use aql_hal::{fence, HwQueue};

use crate::packet::PacketImage;

// =============================================================================
// RING STATISTICS
// =============================================================================

/// Ring statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RingStats {
    /// Packets written, single and batched
    pub packets: u64,
    /// Batched submissions
    pub batches: u64,
    /// Times the write cursor wrapped to the base address
    pub ring_wraps: u64,
    /// Times a reservation had to poll the read index
    pub stalls: u64,
    /// Completed full drains
    pub drains: u64,
}

// =============================================================================
// RING BUFFER
// =============================================================================

/// AQL ring producer
#[derive(Debug)]
pub struct RingBuffer<Q: HwQueue> {
    /// Native queue; owns the ring memory and registers
    hw: Q,
    /// Ring capacity in packets
    capacity: u64,
    /// Slot index of the write cursor
    write_slot: u64,
    /// Packets ever enqueued
    doorbell_index: u64,
    /// Free slots as of the last read index observation
    pub(crate) available: u64,
    /// Statistics
    pub(crate) stats: RingStats,
}

/// Check that a native queue's memory matches its reported size
pub fn validate_layout(hw: &impl HwQueue) -> Result<()> {
    let size = hw.size();
    if size == 0 || hw.ring().len() != size as usize * AQL_PACKET_SIZE {
        return Err(Error::InvalidQueueSize(size));
    }
    Ok(())
}

impl<Q: HwQueue> RingBuffer<Q> {
    /// Take over a freshly created native queue
    pub fn new(hw: Q) -> Result<Self> {
        validate_layout(&hw)?;
        let capacity = hw.size() as u64;
        Ok(Self {
            hw,
            capacity,
            write_slot: 0,
            doorbell_index: 0,
            available: capacity,
            stats: RingStats::default(),
        })
    }

    /// Ring capacity in packets
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Cached free slot count
    pub fn available_slots(&self) -> u64 {
        self.available
    }

    /// Packets ever enqueued
    pub fn doorbell_index(&self) -> u64 {
        self.doorbell_index
    }

    /// Address of slot 0
    pub fn base_address(&self) -> GpuAddr {
        self.hw.base_address()
    }

    /// Address of the last byte of the ring
    pub fn end_address(&self) -> GpuAddr {
        self.base_address() + (self.capacity * AQL_PACKET_SIZE as u64 - 1)
    }

    /// Address the next packet will be written to
    pub fn write_address(&self) -> GpuAddr {
        self.slot_address(self.write_slot)
    }

    /// Address of slot `index`
    pub fn slot_address(&self, index: u64) -> GpuAddr {
        self.base_address() + (index % self.capacity) * AQL_PACKET_SIZE as u64
    }

    /// Bytes of slot `index`
    pub fn slot(&self, index: u64) -> &[u8] {
        let offset = self.slot_offset(index % self.capacity);
        &self.hw.ring()[offset..offset + AQL_PACKET_SIZE]
    }

    /// Ring statistics
    pub fn stats(&self) -> &RingStats {
        &self.stats
    }

    /// Native queue
    pub fn hw(&self) -> &Q {
        &self.hw
    }

    /// Mutable native queue
    pub fn hw_mut(&mut self) -> &mut Q {
        &mut self.hw
    }

    #[inline]
    fn slot_offset(&self, slot: u64) -> usize {
        slot as usize * AQL_PACKET_SIZE
    }

    /// Make sure `n` slots are free, polling the hardware if needed
    ///
    /// `n` is raised to at least 1. Asking for more slots than the ring has
    /// can never succeed and is rejected.
    pub fn reserve(&mut self, n: u64) -> Result<()> {
        self.poll_until_available(n.max(1))
    }

    /// Copy one packet into the slot under the write cursor
    ///
    /// The header (bytes 0..2) is stored after the rest of the packet, behind
    /// a release fence, so the packet processor never sees a valid header on
    /// a partially written slot. The caller must have reserved the slot.
    pub fn write_slot(&mut self, image: &PacketImage) {
        debug_assert!(self.available > 0, "write_slot without reservation");

        let offset = self.slot_offset(self.write_slot);
        let slot = &mut self.hw.ring_mut()[offset..offset + AQL_PACKET_SIZE];
        slot[2..].copy_from_slice(&image[2..]);
        fence::packet_release();
        slot[..2].copy_from_slice(&image[..2]);

        self.advance(1);
        self.stats.packets += 1;
    }

    /// Announce every written packet to the hardware
    ///
    /// Stores the doorbell index to the write index register, then rings the
    /// doorbell with the index of the last enqueued packet.
    pub fn publish(&mut self) {
        if self.doorbell_index == 0 {
            return;
        }
        fence::packet_release();
        self.hw.store_write_index(self.doorbell_index);
        self.hw.store_doorbell(self.doorbell_index - 1);
    }

    /// Copy `count` pre-encoded packets into the ring and publish them
    ///
    /// Batches that cross the end of the ring are split: the tail part fills
    /// the slots up to the end, the head part continues from the base. As in
    /// [`write_slot`](Self::write_slot), every header is stored after all
    /// packet bodies, behind a release fence.
    pub fn blit(&mut self, packets: &[u8], count: u64) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        if count > self.capacity {
            return Err(Error::RingOverflow {
                requested: count,
                capacity: self.capacity,
            });
        }
        let needed = count as usize * AQL_PACKET_SIZE;
        if packets.len() < needed {
            return Err(Error::BufferTooSmall {
                needed,
                actual: packets.len(),
            });
        }

        self.reserve(count)?;

        let tail_count = (self.capacity - self.write_slot).min(count);
        let (tail, head) = packets[..needed].split_at(tail_count as usize * AQL_PACKET_SIZE);
        let parts = [(self.slot_offset(self.write_slot), tail), (0, head)];

        let ring = self.hw.ring_mut();
        for &(start, part) in &parts {
            copy_packets(&mut ring[start..start + part.len()], part, 2..AQL_PACKET_SIZE);
        }
        fence::packet_release();
        for &(start, part) in &parts {
            copy_packets(&mut ring[start..start + part.len()], part, 0..2);
        }

        self.advance(count);
        self.stats.packets += count;
        self.stats.batches += 1;
        self.publish();
        Ok(())
    }

    fn advance(&mut self, n: u64) {
        let next = self.write_slot + n;
        if next >= self.capacity {
            self.stats.ring_wraps += 1;
        }
        self.write_slot = next % self.capacity;
        self.doorbell_index += n;
        self.available -= n;
    }
}

/// Copy the `bytes` range of every packet in `src` to the matching slot in `dst`
fn copy_packets(dst: &mut [u8], src: &[u8], bytes: Range<usize>) {
    let slots = dst.chunks_exact_mut(AQL_PACKET_SIZE);
    for (slot, image) in slots.zip(src.chunks_exact(AQL_PACKET_SIZE)) {
        slot[bytes.clone()].copy_from_slice(&image[bytes.clone()]);
    }
}

#[cfg(test)]
mod tests {
    use aql_core::Signal;
    use aql_hal::soft::SoftQueue;

    use super::*;
    use crate::packet::{image_completion_signal, image_header, BarrierAnd, BARRIER_HEADER};

    const BASE: u64 = 0x10_0000;

    fn ring(size: u32) -> RingBuffer<SoftQueue> {
        RingBuffer::new(SoftQueue::new(size, GpuAddr::new(BASE))).unwrap()
    }

    fn barrier(tag: u64) -> PacketImage {
        BarrierAnd::new(&[])
            .unwrap()
            .with_completion_signal(Signal::from_handle(tag))
            .encode()
    }

    fn submit(ring: &mut RingBuffer<SoftQueue>, image: &PacketImage) {
        ring.reserve(1).unwrap();
        ring.write_slot(image);
        ring.publish();
    }

    #[test]
    fn test_addresses() {
        let ring = ring(8);
        assert_eq!(ring.capacity(), 8);
        assert_eq!(ring.base_address(), GpuAddr::new(BASE));
        assert_eq!(ring.end_address(), GpuAddr::new(BASE + 8 * 64 - 1));
        assert_eq!(ring.write_address(), GpuAddr::new(BASE));
        assert_eq!(ring.available_slots(), 8);
    }

    #[test]
    fn test_rejects_mismatched_memory() {
        #[derive(Debug)]
        struct Broken(SoftQueue);

        impl HwQueue for Broken {
            fn size(&self) -> u32 {
                self.0.size() * 2
            }
            fn base_address(&self) -> GpuAddr {
                self.0.base_address()
            }
            fn ring(&self) -> &[u8] {
                self.0.ring()
            }
            fn ring_mut(&mut self) -> &mut [u8] {
                self.0.ring_mut()
            }
            fn load_read_index(&self) -> u64 {
                self.0.load_read_index()
            }
            fn store_write_index(&self, index: u64) {
                self.0.store_write_index(index)
            }
            fn store_doorbell(&self, value: u64) {
                self.0.store_doorbell(value)
            }
            fn set_priority(&mut self, priority: aql_hal::QueuePriority) -> aql_core::Status {
                self.0.set_priority(priority)
            }
            fn set_profiler_enabled(&mut self, enabled: bool) -> aql_core::Status {
                self.0.set_profiler_enabled(enabled)
            }
            fn destroy(&mut self) -> aql_core::Status {
                self.0.destroy()
            }
        }

        let err = RingBuffer::new(Broken(SoftQueue::new(4, GpuAddr::new(BASE)))).unwrap_err();
        assert_eq!(err, Error::InvalidQueueSize(8));
    }

    #[test]
    fn test_write_slot_and_publish() {
        let mut ring = ring(4);
        let regs = ring.hw().registers();

        submit(&mut ring, &barrier(0xa));

        assert_eq!(ring.doorbell_index(), 1);
        assert_eq!(ring.available_slots(), 3);
        assert_eq!(ring.write_address(), GpuAddr::new(BASE + 64));
        assert_eq!(regs.write_index(), 1);
        assert_eq!(regs.doorbell(), 0);
        assert_eq!(image_header(ring.slot(0)), BARRIER_HEADER);
        assert_eq!(image_completion_signal(ring.slot(0)), Signal::from_handle(0xa));
    }

    #[test]
    fn test_cursor_wraps_modulo_capacity() {
        let mut ring = ring(4);
        let regs = ring.hw().registers();

        for k in 0..11u64 {
            assert_eq!(ring.write_address(), GpuAddr::new(BASE + (k % 4) * 64));
            submit(&mut ring, &barrier(k + 1));
            regs.advance_read_index(1);
        }

        assert_eq!(ring.doorbell_index(), 11);
        assert_eq!(ring.write_address(), GpuAddr::new(BASE + 3 * 64));
        assert_eq!(ring.stats().ring_wraps, 2);
        assert_eq!(image_completion_signal(ring.slot(10)), Signal::from_handle(11));
    }

    #[test]
    fn test_reserve_bounds() {
        let mut ring = ring(4);
        assert_eq!(
            ring.reserve(5),
            Err(Error::RingOverflow {
                requested: 5,
                capacity: 4
            })
        );
        assert_eq!(ring.reserve(0), Ok(()));
        assert_eq!(ring.available_slots(), 4);
    }

    #[test]
    fn test_blit_without_wrap() {
        let mut ring = ring(8);
        let regs = ring.hw().registers();

        let mut batch = [0u8; 3 * AQL_PACKET_SIZE];
        for i in 0..3 {
            batch[i * 64..(i + 1) * 64].copy_from_slice(&barrier(i as u64 + 1));
        }
        ring.blit(&batch, 3).unwrap();

        assert_eq!(ring.doorbell_index(), 3);
        assert_eq!(ring.available_slots(), 5);
        assert_eq!(ring.write_address(), GpuAddr::new(BASE + 3 * 64));
        assert_eq!(regs.write_index(), 3);
        assert_eq!(regs.doorbell(), 2);
        assert_eq!(regs.doorbell_rings(), 1);
        assert_eq!(ring.stats().batches, 1);
    }

    #[test]
    fn test_blit_across_end_boundary() {
        let mut ring = ring(8);
        let regs = ring.hw().registers();

        for k in 0..6 {
            submit(&mut ring, &barrier(100 + k));
        }
        regs.advance_read_index(6);

        let count = 5u64;
        let mut batch = [0u8; 5 * AQL_PACKET_SIZE];
        for i in 0..5 {
            batch[i * 64..(i + 1) * 64].copy_from_slice(&barrier(i as u64 + 1));
        }
        ring.blit(&batch, count).unwrap();

        // Two packets fill slots 6 and 7, three continue from the base.
        let tail_count = 2u64;
        assert_eq!(image_completion_signal(ring.slot(6)), Signal::from_handle(1));
        assert_eq!(image_completion_signal(ring.slot(7)), Signal::from_handle(2));
        assert_eq!(image_completion_signal(ring.slot(0)), Signal::from_handle(3));
        assert_eq!(image_completion_signal(ring.slot(1)), Signal::from_handle(4));
        assert_eq!(image_completion_signal(ring.slot(2)), Signal::from_handle(5));
        assert_eq!(
            ring.write_address(),
            GpuAddr::new(BASE + (count - tail_count) * 64)
        );
        assert_eq!(ring.doorbell_index(), 11);
        assert_eq!(regs.write_index(), 11);
        assert_eq!(regs.doorbell(), 10);
        assert_eq!(ring.stats().ring_wraps, 1);
    }

    #[test]
    fn test_blit_ending_on_last_slot_wraps_cursor() {
        let mut ring = ring(8);
        let regs = ring.hw().registers();

        for k in 0..5 {
            submit(&mut ring, &barrier(100 + k));
        }
        regs.advance_read_index(5);

        let mut batch = [0u8; 3 * AQL_PACKET_SIZE];
        for (i, chunk) in batch.chunks_exact_mut(AQL_PACKET_SIZE).enumerate() {
            chunk.copy_from_slice(&barrier(i as u64 + 1));
        }
        ring.blit(&batch, 3).unwrap();

        for (slot, tag) in [(5u64, 1u64), (6, 2), (7, 3)] {
            assert_eq!(image_header(ring.slot(slot)), BARRIER_HEADER);
            assert_eq!(image_completion_signal(ring.slot(slot)), Signal::from_handle(tag));
        }
        // Slot 0 still holds the first single submission.
        assert_eq!(image_completion_signal(ring.slot(0)), Signal::from_handle(100));
        assert_eq!(ring.write_address(), ring.base_address());
        assert_eq!(ring.doorbell_index(), 8);
        assert_eq!(ring.stats().ring_wraps, 1);
        assert_eq!(regs.write_index(), 8);
        assert_eq!(regs.doorbell(), 7);
    }

    #[test]
    fn test_blit_validates_input() {
        let mut ring = ring(4);
        let batch = [0u8; 2 * AQL_PACKET_SIZE];

        assert_eq!(
            ring.blit(&batch, 3),
            Err(Error::BufferTooSmall {
                needed: 192,
                actual: 128
            })
        );
        assert_eq!(
            ring.blit(&[0u8; 5 * AQL_PACKET_SIZE], 5),
            Err(Error::RingOverflow {
                requested: 5,
                capacity: 4
            })
        );
        assert_eq!(ring.blit(&[], 0), Ok(()));
        assert_eq!(ring.doorbell_index(), 0);
        assert_eq!(ring.hw().registers().doorbell_rings(), 0);
    }
}
