//! # AQL Packet Encoder
//!
//! Builds the 64-byte packet images the packet processor consumes. Every
//! image is produced into an owned `[u8; 64]` at the fixed little-endian
//! offsets of the HSA packet ABI; nothing is overlaid on ring memory.
//!
//! ```text
//!  byte  0      2      4                                     56        64
//!        ┌──────┬──────┬─────────────────────────────────────┬─────────┐
//!        │header│ setup│ dispatch / dependency / PM4 payload │ signal  │
//!        └──────┴──────┴─────────────────────────────────────┴─────────┘
//! ```
//!
//! The header sits in the first two bytes so the ring can store it after the
//! rest of the slot; see [`RingBuffer::write_slot`](crate::ring::RingBuffer::write_slot).

use aql_core::{Dim3, Error, GpuAddr, KernelObject, Program, Result, Signal};
use static_assertions::const_assert_eq;

use crate::pm4::Pm4Block;

pub use aql_core::AQL_PACKET_SIZE;

/// One encoded packet
pub type PacketImage = [u8; AQL_PACKET_SIZE];

/// Dependency slots in a barrier-AND packet
pub const MAX_BARRIER_DEPS: usize = 5;

/// Vendor packet format tag for a PM4 indirect buffer (`AMD_AQL_FORMAT_PM4_IB`)
pub const AMD_AQL_FORMAT_PM4_IB: u16 = 0x1;

/// PM4 words carried by a vendor packet
pub const PM4_PAYLOAD_DWORDS: usize = 13;

/// Base for the remaining-dword count trailing a PM4 block
///
/// The firmware expects `14 - block_len` in the word after the block.
pub const PM4_REMAIN_BASE: u32 = 14;

// =============================================================================
// HEADER
// =============================================================================

/// Packet type field (`hsa_packet_type_t`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// Vendor-specific packet
    VendorSpecific = 0,
    /// Slot not yet ready for the packet processor
    Invalid        = 1,
    /// Kernel dispatch
    KernelDispatch = 2,
    /// Barrier waiting on all dependencies
    BarrierAnd     = 3,
    /// Agent dispatch
    AgentDispatch  = 4,
    /// Barrier waiting on any dependency
    BarrierOr      = 5,
}

impl PacketType {
    /// Parse the type field
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::VendorSpecific),
            1 => Some(Self::Invalid),
            2 => Some(Self::KernelDispatch),
            3 => Some(Self::BarrierAnd),
            4 => Some(Self::AgentDispatch),
            5 => Some(Self::BarrierOr),
            _ => None,
        }
    }
}

/// Memory fence scope (`hsa_fence_scope_t`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FenceScope {
    /// No fence
    None   = 0,
    /// Agent scope
    Agent  = 1,
    /// System scope
    System = 2,
}

impl FenceScope {
    const fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Self::None),
            1 => Some(Self::Agent),
            2 => Some(Self::System),
            _ => None,
        }
    }
}

/// Bit offsets inside the 16-bit packet header (`hsa_packet_header_t`)
pub mod header_bits {
    /// Packet type, 8 bits
    pub const TYPE: u16 = 0;
    /// Barrier bit
    pub const BARRIER: u16 = 8;
    /// Acquire fence scope, 2 bits
    pub const SCACQUIRE_FENCE_SCOPE: u16 = 9;
    /// Release fence scope, 2 bits
    pub const SCRELEASE_FENCE_SCOPE: u16 = 11;
}

/// Decoded packet header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Packet type
    pub packet_type: PacketType,
    /// Wait for preceding packets to complete before launch
    pub barrier: bool,
    /// Acquire fence scope
    pub acquire: FenceScope,
    /// Release fence scope
    pub release: FenceScope,
}

impl PacketHeader {
    /// Pack into the 16-bit header word
    pub const fn to_bits(self) -> u16 {
        ((self.packet_type as u16) << header_bits::TYPE)
            | ((self.barrier as u16) << header_bits::BARRIER)
            | ((self.acquire as u16) << header_bits::SCACQUIRE_FENCE_SCOPE)
            | ((self.release as u16) << header_bits::SCRELEASE_FENCE_SCOPE)
    }

    /// Unpack a header word
    pub const fn from_bits(bits: u16) -> Option<Self> {
        let Some(packet_type) = PacketType::from_raw((bits >> header_bits::TYPE) as u8) else {
            return None;
        };
        let Some(acquire) = FenceScope::from_raw((bits >> header_bits::SCACQUIRE_FENCE_SCOPE) & 0x3)
        else {
            return None;
        };
        let Some(release) = FenceScope::from_raw((bits >> header_bits::SCRELEASE_FENCE_SCOPE) & 0x3)
        else {
            return None;
        };
        Some(Self {
            packet_type,
            barrier: (bits >> header_bits::BARRIER) & 1 != 0,
            acquire,
            release,
        })
    }
}

/// Header shared by every kernel dispatch
pub const DISPATCH_KERNEL_HEADER: u16 = PacketHeader {
    packet_type: PacketType::KernelDispatch,
    barrier: true,
    acquire: FenceScope::System,
    release: FenceScope::System,
}
.to_bits();

/// Header shared by every barrier-AND
pub const BARRIER_HEADER: u16 = PacketHeader {
    packet_type: PacketType::BarrierAnd,
    barrier: true,
    acquire: FenceScope::System,
    release: FenceScope::System,
}
.to_bits();

/// Header of a vendor-specific PM4 packet
pub const VENDOR_HEADER: u16 = (PacketType::VendorSpecific as u16) << header_bits::TYPE;

/// Shift of the dimension count inside the dispatch `setup` field
pub const SETUP_DIMENSIONS: u16 = 0;

/// Setup word: all dispatches are three-dimensional
pub const DISPATCH_KERNEL_SETUP: u16 = 3 << SETUP_DIMENSIONS;

// =============================================================================
// LAYOUT
// =============================================================================

/// Byte offsets of packet fields
pub mod layout {
    /// Header, every packet kind
    pub const HEADER: usize = 0;
    /// Completion signal, every packet kind
    pub const COMPLETION_SIGNAL: usize = 56;

    /// `hsa_kernel_dispatch_packet_t`
    pub mod dispatch {
        /// Setup word
        pub const SETUP: usize = 2;
        /// Workgroup size x (y and z follow at +2, +4)
        pub const WORKGROUP_SIZE_X: usize = 4;
        /// 16-bit reserved
        pub const RESERVED0: usize = 10;
        /// Grid size x (y and z follow at +4, +8)
        pub const GRID_SIZE_X: usize = 12;
        /// Private segment size
        pub const PRIVATE_SEGMENT_SIZE: usize = 24;
        /// Group segment size
        pub const GROUP_SEGMENT_SIZE: usize = 28;
        /// Kernel object handle
        pub const KERNEL_OBJECT: usize = 32;
        /// Kernarg address
        pub const KERNARG_ADDRESS: usize = 40;
        /// 64-bit reserved
        pub const RESERVED2: usize = 48;
    }

    /// `hsa_barrier_and_packet_t`
    pub mod barrier {
        /// 16-bit reserved
        pub const RESERVED0: usize = 2;
        /// 32-bit reserved
        pub const RESERVED1: usize = 4;
        /// First dependency signal; five consecutive 8-byte handles
        pub const DEP_SIGNAL: usize = 8;
        /// 64-bit reserved
        pub const RESERVED2: usize = 48;
    }

    /// `amd_aql_pm4_packet_t`
    pub mod vendor {
        /// Format tag
        pub const FORMAT: usize = 2;
        /// First PM4 word; thirteen consecutive dwords
        pub const PM4_CMDS: usize = 4;
    }
}

const_assert_eq!(layout::barrier::DEP_SIGNAL + 8 * MAX_BARRIER_DEPS, layout::barrier::RESERVED2);
const_assert_eq!(layout::vendor::PM4_CMDS + 4 * PM4_PAYLOAD_DWORDS, layout::COMPLETION_SIGNAL);
const_assert_eq!(layout::COMPLETION_SIGNAL + 8, AQL_PACKET_SIZE);

#[inline]
fn put_u16(image: &mut PacketImage, offset: usize, value: u16) {
    image[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn put_u32(image: &mut PacketImage, offset: usize, value: u32) {
    image[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn put_u64(image: &mut PacketImage, offset: usize, value: u64) {
    image[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

/// Read the header word of an encoded packet
#[inline]
pub fn image_header(image: &[u8]) -> u16 {
    u16::from_le_bytes([image[0], image[1]])
}

/// Read the completion signal of an encoded packet
#[inline]
pub fn image_completion_signal(image: &[u8]) -> Signal {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&image[layout::COMPLETION_SIGNAL..layout::COMPLETION_SIGNAL + 8]);
    Signal::from_handle(u64::from_le_bytes(raw))
}

// =============================================================================
// KERNEL DISPATCH
// =============================================================================

/// Kernel dispatch packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelDispatch {
    /// Workgroup size per dimension
    pub workgroup_size: [u16; 3],
    /// Grid size in work-items per dimension
    pub grid_size: [u32; 3],
    /// Private segment size in bytes
    pub private_segment_size: u32,
    /// Group segment size in bytes
    pub group_segment_size: u32,
    /// Kernel code object
    pub kernel_object: KernelObject,
    /// Kernel argument buffer
    pub kernarg_address: GpuAddr,
    /// Signal decremented on completion
    pub completion_signal: Signal,
}

impl KernelDispatch {
    /// Describe a launch of `global` workgroups of `local` work-items each
    ///
    /// The grid written to the packet is `global * local` per dimension.
    pub fn new(
        program: &impl Program,
        global: Dim3,
        local: Dim3,
        kernarg_address: GpuAddr,
    ) -> Result<Self> {
        let global = global.to_array();
        let local = local.to_array();

        let mut workgroup_size = [0u16; 3];
        let mut grid_size = [0u32; 3];
        for i in 0..3 {
            workgroup_size[i] = u16::try_from(local[i])
                .map_err(|_| Error::InvalidParameter("workgroup size exceeds 16 bits"))?;
            grid_size[i] = global[i]
                .checked_mul(local[i])
                .ok_or(Error::InvalidParameter("grid size exceeds 32 bits"))?;
        }

        Ok(Self {
            workgroup_size,
            grid_size,
            private_segment_size: program.private_segment_size(),
            group_segment_size: program.group_segment_size(),
            kernel_object: program.kernel_object(),
            kernarg_address,
            completion_signal: Signal::EMPTY,
        })
    }

    /// Attach a completion signal
    pub fn with_completion_signal(mut self, signal: Signal) -> Self {
        self.completion_signal = signal;
        self
    }

    /// Encode into a packet image
    pub fn encode(&self) -> PacketImage {
        use layout::dispatch::*;

        let mut image = [0u8; AQL_PACKET_SIZE];
        for (i, size) in self.workgroup_size.iter().enumerate() {
            put_u16(&mut image, WORKGROUP_SIZE_X + 2 * i, *size);
        }
        put_u16(&mut image, RESERVED0, 0);
        for (i, size) in self.grid_size.iter().enumerate() {
            put_u32(&mut image, GRID_SIZE_X + 4 * i, *size);
        }
        put_u32(&mut image, PRIVATE_SEGMENT_SIZE, self.private_segment_size);
        put_u32(&mut image, GROUP_SEGMENT_SIZE, self.group_segment_size);
        put_u64(&mut image, KERNEL_OBJECT, self.kernel_object.0);
        put_u64(&mut image, KERNARG_ADDRESS, self.kernarg_address.raw());
        put_u64(&mut image, RESERVED2, 0);
        put_u64(&mut image, layout::COMPLETION_SIGNAL, self.completion_signal.handle());
        put_u16(&mut image, SETUP, DISPATCH_KERNEL_SETUP);
        put_u16(&mut image, layout::HEADER, DISPATCH_KERNEL_HEADER);
        image
    }
}

// =============================================================================
// BARRIER-AND
// =============================================================================

/// Barrier that waits for all of its dependency signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierAnd {
    /// Dependencies; unused slots hold [`Signal::EMPTY`]
    pub dep_signals: [Signal; MAX_BARRIER_DEPS],
    /// Signal decremented once every dependency is satisfied
    pub completion_signal: Signal,
}

impl BarrierAnd {
    /// Barrier over up to five dependencies
    pub fn new(wait_signals: &[Signal]) -> Result<Self> {
        if wait_signals.len() > MAX_BARRIER_DEPS {
            return Err(Error::TooManyDependencies {
                count: wait_signals.len(),
            });
        }

        let mut dep_signals = [Signal::EMPTY; MAX_BARRIER_DEPS];
        dep_signals[..wait_signals.len()].copy_from_slice(wait_signals);
        Ok(Self {
            dep_signals,
            completion_signal: Signal::EMPTY,
        })
    }

    /// Attach a completion signal
    pub fn with_completion_signal(mut self, signal: Signal) -> Self {
        self.completion_signal = signal;
        self
    }

    /// Encode into a packet image
    pub fn encode(&self) -> PacketImage {
        use layout::barrier::*;

        let mut image = [0u8; AQL_PACKET_SIZE];
        put_u16(&mut image, RESERVED0, 0);
        put_u32(&mut image, RESERVED1, 0);
        for (i, signal) in self.dep_signals.iter().enumerate() {
            put_u64(&mut image, DEP_SIGNAL + 8 * i, signal.handle());
        }
        put_u64(&mut image, RESERVED2, 0);
        put_u64(&mut image, layout::COMPLETION_SIGNAL, self.completion_signal.handle());
        put_u16(&mut image, layout::HEADER, BARRIER_HEADER);
        image
    }
}

// =============================================================================
// VENDOR PM4 INDIRECT BUFFER
// =============================================================================

/// Vendor-specific packet carrying PM4 command words
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorIndirectBuffer {
    /// Embedded PM4 block
    pub commands: Pm4Block,
    /// Signal decremented on completion
    pub completion_signal: Signal,
}

impl VendorIndirectBuffer {
    /// Wrap a PM4 block
    pub fn new(commands: Pm4Block) -> Self {
        Self {
            commands,
            completion_signal: Signal::EMPTY,
        }
    }

    /// Attach a completion signal
    pub fn with_completion_signal(mut self, signal: Signal) -> Self {
        self.completion_signal = signal;
        self
    }

    /// Encode into a packet image
    ///
    /// The image starts zeroed, so trailing payload words read as zero.
    pub fn encode(&self) -> PacketImage {
        use layout::vendor::*;

        let mut image = [0u8; AQL_PACKET_SIZE];
        put_u16(&mut image, FORMAT, AMD_AQL_FORMAT_PM4_IB);

        let words = self.commands.as_slice();
        for (i, word) in words.iter().enumerate() {
            put_u32(&mut image, PM4_CMDS + 4 * i, *word);
        }
        if words.len() < PM4_PAYLOAD_DWORDS {
            let remain = PM4_REMAIN_BASE - words.len() as u32;
            put_u32(&mut image, PM4_CMDS + 4 * words.len(), remain);
        }

        put_u64(&mut image, layout::COMPLETION_SIGNAL, self.completion_signal.handle());
        put_u16(&mut image, layout::HEADER, VENDOR_HEADER);
        image
    }
}

// =============================================================================
// PACKET
// =============================================================================

/// Any packet the queue can submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Kernel dispatch
    KernelDispatch(KernelDispatch),
    /// Barrier-AND
    BarrierAnd(BarrierAnd),
    /// Vendor PM4 packet
    VendorIndirectBuffer(VendorIndirectBuffer),
}

impl Packet {
    /// Encode into a packet image
    pub fn encode(&self) -> PacketImage {
        match self {
            Self::KernelDispatch(p) => p.encode(),
            Self::BarrierAnd(p) => p.encode(),
            Self::VendorIndirectBuffer(p) => p.encode(),
        }
    }

    /// Signal the packet decrements on completion
    pub fn completion_signal(&self) -> Signal {
        match self {
            Self::KernelDispatch(p) => p.completion_signal,
            Self::BarrierAnd(p) => p.completion_signal,
            Self::VendorIndirectBuffer(p) => p.completion_signal,
        }
    }

    /// Replace the completion signal
    pub fn set_completion_signal(&mut self, signal: Signal) {
        match self {
            Self::KernelDispatch(p) => p.completion_signal = signal,
            Self::BarrierAnd(p) => p.completion_signal = signal,
            Self::VendorIndirectBuffer(p) => p.completion_signal = signal,
        }
    }
}

impl From<KernelDispatch> for Packet {
    fn from(p: KernelDispatch) -> Self {
        Self::KernelDispatch(p)
    }
}

impl From<BarrierAnd> for Packet {
    fn from(p: BarrierAnd) -> Self {
        Self::BarrierAnd(p)
    }
}

impl From<VendorIndirectBuffer> for Packet {
    fn from(p: VendorIndirectBuffer) -> Self {
        Self::VendorIndirectBuffer(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pm4;

    struct TestProgram;

    impl Program for TestProgram {
        fn kernel_object(&self) -> KernelObject {
            KernelObject(0xdead_beef_0000_1000)
        }

        fn private_segment_size(&self) -> u32 {
            256
        }

        fn group_segment_size(&self) -> u32 {
            4096
        }
    }

    fn u16_at(image: &[u8], off: usize) -> u16 {
        u16::from_le_bytes([image[off], image[off + 1]])
    }

    fn u32_at(image: &[u8], off: usize) -> u32 {
        u32::from_le_bytes(image[off..off + 4].try_into().unwrap())
    }

    fn u64_at(image: &[u8], off: usize) -> u64 {
        u64::from_le_bytes(image[off..off + 8].try_into().unwrap())
    }

    #[test]
    fn test_header_constants() {
        assert_eq!(DISPATCH_KERNEL_HEADER, 0x1502);
        assert_eq!(BARRIER_HEADER, 0x1503);
        assert_eq!(VENDOR_HEADER, 0x0000);
        assert_eq!(DISPATCH_KERNEL_SETUP, 3);

        let decoded = PacketHeader::from_bits(DISPATCH_KERNEL_HEADER).unwrap();
        assert_eq!(decoded.packet_type, PacketType::KernelDispatch);
        assert!(decoded.barrier);
        assert_eq!(decoded.acquire, FenceScope::System);
        assert_eq!(decoded.release, FenceScope::System);
    }

    #[test]
    fn test_header_rejects_unknown_type() {
        assert_eq!(PacketHeader::from_bits(0x00ff), None);
        assert_eq!(PacketHeader::from_bits(0x0602), None);
    }

    #[test]
    fn test_kernel_dispatch_layout() {
        let packet = KernelDispatch::new(
            &TestProgram,
            Dim3::new(4, 2, 1),
            Dim3::new(64, 8, 1),
            GpuAddr::new(0x7000_1000),
        )
        .unwrap()
        .with_completion_signal(Signal::from_handle(0x55));
        let image = packet.encode();

        assert_eq!(image.len(), AQL_PACKET_SIZE);
        assert_eq!(u16_at(&image, 0), DISPATCH_KERNEL_HEADER);
        assert_eq!(u16_at(&image, 2), 3);
        assert_eq!(u16_at(&image, 4), 64);
        assert_eq!(u16_at(&image, 6), 8);
        assert_eq!(u16_at(&image, 8), 1);
        assert_eq!(u16_at(&image, 10), 0);
        assert_eq!(u32_at(&image, 12), 256);
        assert_eq!(u32_at(&image, 16), 16);
        assert_eq!(u32_at(&image, 20), 1);
        assert_eq!(u32_at(&image, 24), 256);
        assert_eq!(u32_at(&image, 28), 4096);
        assert_eq!(u64_at(&image, 32), 0xdead_beef_0000_1000);
        assert_eq!(u64_at(&image, 40), 0x7000_1000);
        assert_eq!(u64_at(&image, 48), 0);
        assert_eq!(image_completion_signal(&image), Signal::from_handle(0x55));
    }

    #[test]
    fn test_dispatch_header_independent_of_payload() {
        let a = KernelDispatch::new(&TestProgram, Dim3::new(1, 1, 1), Dim3::new(1, 1, 1), GpuAddr::null())
            .unwrap()
            .encode();
        let b = KernelDispatch::new(
            &TestProgram,
            Dim3::new(100, 7, 3),
            Dim3::new(256, 1, 1),
            GpuAddr::new(u64::MAX),
        )
        .unwrap()
        .with_completion_signal(Signal::from_handle(9))
        .encode();

        assert_eq!(image_header(&a), image_header(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_dispatch_rejects_overflow() {
        let err = KernelDispatch::new(
            &TestProgram,
            Dim3::new(1 << 20, 1, 1),
            Dim3::new(1 << 13, 1, 1),
            GpuAddr::null(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));

        let err = KernelDispatch::new(&TestProgram, Dim3::new(1, 1, 1), Dim3::new(70_000, 1, 1), GpuAddr::null())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_barrier_fills_unused_dependencies() {
        let s1 = Signal::from_handle(0x1111);
        let s2 = Signal::from_handle(0x2222);
        let image = BarrierAnd::new(&[s1, s2]).unwrap().encode();

        assert_eq!(u16_at(&image, 0), BARRIER_HEADER);
        assert_eq!(u16_at(&image, 2), 0);
        assert_eq!(u32_at(&image, 4), 0);
        assert_eq!(u64_at(&image, 8), 0x1111);
        assert_eq!(u64_at(&image, 16), 0x2222);
        for slot in 2..MAX_BARRIER_DEPS {
            assert_eq!(u64_at(&image, 8 + 8 * slot), Signal::EMPTY.handle());
        }
        assert_eq!(u64_at(&image, 48), 0);
        assert_eq!(image_completion_signal(&image), Signal::EMPTY);
    }

    #[test]
    fn test_barrier_rejects_six_dependencies() {
        let deps = [Signal::from_handle(1); 6];
        assert_eq!(
            BarrierAnd::new(&deps).unwrap_err(),
            Error::TooManyDependencies { count: 6 }
        );
        assert!(BarrierAnd::new(&deps[..5]).is_ok());
    }

    #[test]
    fn test_vendor_packet_layout() {
        let block = Pm4Block::indirect_buffer(GpuAddr::new(0x1_2345_6000), 0x400).unwrap();
        let image = VendorIndirectBuffer::new(block)
            .with_completion_signal(Signal::from_handle(0x77))
            .encode();

        assert_eq!(u16_at(&image, 0), VENDOR_HEADER);
        assert_eq!(u16_at(&image, 2), AMD_AQL_FORMAT_PM4_IB);

        let words = pm4::build_indirect_buffer(GpuAddr::new(0x1_2345_6000), 0x400).unwrap();
        for (i, word) in words.iter().enumerate() {
            assert_eq!(u32_at(&image, 4 + 4 * i), *word);
        }
        assert_eq!(u32_at(&image, 4 + 4 * 4), 10);
        for i in 5..PM4_PAYLOAD_DWORDS {
            assert_eq!(u32_at(&image, 4 + 4 * i), 0);
        }
        assert_eq!(image_completion_signal(&image), Signal::from_handle(0x77));
    }

    #[test]
    fn test_full_pm4_block_has_no_remain_word() {
        let block = Pm4Block::from_words(&[0xabcd_0000; PM4_PAYLOAD_DWORDS]).unwrap();
        let image = VendorIndirectBuffer::new(block).encode();
        assert_eq!(u32_at(&image, 4 + 4 * 12), 0xabcd_0000);
        assert_eq!(image_completion_signal(&image), Signal::EMPTY);
    }

    #[test]
    fn test_packet_enum_dispatches_encoding() {
        let barrier = BarrierAnd::new(&[]).unwrap().with_completion_signal(Signal::from_handle(3));
        let packet = Packet::from(barrier);
        assert_eq!(packet.encode(), barrier.encode());
        assert_eq!(packet.completion_signal(), Signal::from_handle(3));
    }
}
