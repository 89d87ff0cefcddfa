//! # PM4 Command Encoder
//!
//! Type-3 PM4 packets embedded in vendor-specific AQL packets. The command
//! processor executes these words directly, so layouts are bit-exact.
//!
//! ```text
//!  31 30 29          16 15      8 7       0
//! ┌─────┬──────────────┬─────────┬─────────┐
//! │  3  │  count - 2   │ opcode  │    0    │
//! └─────┴──────────────┴─────────┴─────────┘
//! ```

use arrayvec::ArrayVec;
use aql_core::{Error, GpuAddr, Result};
use bitflags::bitflags;

use crate::packet::PM4_PAYLOAD_DWORDS;

/// Packet type tag of a type-3 PM4 header
pub const PM4_TYPE_3: u32 = 3;

/// INDIRECT_BUFFER opcode
pub const IT_OPCODE_INDIRECT_BUFFER: u8 = 0x3f;

/// ACQUIRE_MEM opcode
pub const IT_OPCODE_ACQUIRE_MEM: u8 = 0x58;

/// Valid bit of the INDIRECT_BUFFER size word
pub const INDIRECT_BUFFER_VALID: u32 = 1 << 23;

/// Mask of the dword count field of the INDIRECT_BUFFER size word
pub const INDIRECT_BUFFER_SIZE_MASK: u32 = 0x000f_ffff;

/// Words in an INDIRECT_BUFFER command
pub const INDIRECT_BUFFER_DWORDS: usize = 4;

/// Words in an ACQUIRE_MEM command
pub const ACQUIRE_MEM_DWORDS: usize = 8;

/// Range covered by a default cache invalidate
pub const DEFAULT_INVALIDATE_SIZE: u64 = 0xff_ffff_ffff;

bitflags! {
    /// Cache levels invalidated by ACQUIRE_MEM (`GCR_CNTL`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GcrCntl: u32 {
        /// Instruction cache
        const GLI_INV = 1 << 0;
        /// Scalar cache
        const GLK_INV = 1 << 7;
        /// Vector L0 cache
        const GLV_INV = 1 << 8;
        /// L1 cache
        const GL1_INV = 1 << 9;
        /// L2 cache
        const GL2_INV = 1 << 14;
    }
}

impl Default for GcrCntl {
    fn default() -> Self {
        Self::all()
    }
}

/// Build a type-3 header for a command of `dwords` words
#[inline]
pub const fn pm4_header(opcode: u8, dwords: usize) -> u32 {
    (PM4_TYPE_3 << 30) | (((dwords as u32).wrapping_sub(2) & 0x3fff) << 16) | ((opcode as u32) << 8)
}

/// Decoded type-3 header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pm4Header {
    /// Packet type tag
    pub packet_type: u32,
    /// Total command length in words, header included
    pub dwords: usize,
    /// Opcode
    pub opcode: u8,
}

/// Split a header word into its fields
pub const fn decode_header(word: u32) -> Pm4Header {
    Pm4Header {
        packet_type: word >> 30,
        dwords: ((word >> 16) & 0x3fff) as usize + 2,
        opcode: (word >> 8) as u8,
    }
}

/// Largest indirect buffer an INDIRECT_BUFFER command can describe
pub const INDIRECT_BUFFER_MAX_BYTES: u32 = INDIRECT_BUFFER_SIZE_MASK * 4;

/// INDIRECT_BUFFER: jump to `size_bytes` of commands at `address`
///
/// The size is encoded in dwords; any sub-dword remainder is dropped. Sizes
/// whose dword count does not fit the 20-bit field are rejected.
pub fn build_indirect_buffer(address: GpuAddr, size_bytes: u32) -> Result<[u32; INDIRECT_BUFFER_DWORDS]> {
    let dwords = size_bytes / 4;
    if dwords > INDIRECT_BUFFER_SIZE_MASK {
        return Err(Error::InvalidParameter("indirect buffer exceeds 20-bit dword count"));
    }
    Ok([
        pm4_header(IT_OPCODE_INDIRECT_BUFFER, INDIRECT_BUFFER_DWORDS),
        address.lo(),
        address.hi(),
        dwords | INDIRECT_BUFFER_VALID,
    ])
}

/// Recover `(address, size_bytes)` from an INDIRECT_BUFFER command
pub fn decode_indirect_buffer(words: &[u32]) -> Option<(GpuAddr, u32)> {
    let &[header, lo, hi, size, ..] = words else {
        return None;
    };
    let fields = decode_header(header);
    if fields.packet_type != PM4_TYPE_3
        || fields.opcode != IT_OPCODE_INDIRECT_BUFFER
        || fields.dwords != INDIRECT_BUFFER_DWORDS
        || size & INDIRECT_BUFFER_VALID == 0
    {
        return None;
    }
    let address = GpuAddr::new(((hi as u64) << 32) | lo as u64);
    Some((address, (size & INDIRECT_BUFFER_SIZE_MASK) * 4))
}

/// ACQUIRE_MEM: invalidate the selected caches over `size` bytes at `address`
pub fn build_cache_invalidate(address: GpuAddr, size: u64, caches: GcrCntl) -> [u32; ACQUIRE_MEM_DWORDS] {
    [
        pm4_header(IT_OPCODE_ACQUIRE_MEM, ACQUIRE_MEM_DWORDS),
        0,
        size as u32,
        (size >> 32) as u32,
        address.lo(),
        address.hi(),
        0,
        caches.bits(),
    ]
}

/// ACQUIRE_MEM over the whole address range, every cache level
pub fn build_cache_invalidate_all() -> [u32; ACQUIRE_MEM_DWORDS] {
    build_cache_invalidate(GpuAddr::null(), DEFAULT_INVALIDATE_SIZE, GcrCntl::all())
}

// =============================================================================
// PM4 BLOCK
// =============================================================================

/// PM4 words destined for one vendor packet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pm4Block {
    words: ArrayVec<u32, PM4_PAYLOAD_DWORDS>,
}

impl Pm4Block {
    /// Empty block
    pub fn new() -> Self {
        Self::default()
    }

    /// Block from raw words
    pub fn from_words(words: &[u32]) -> Result<Self> {
        let mut block = Self::new();
        block.extend(words)?;
        Ok(block)
    }

    /// Block holding a single INDIRECT_BUFFER command
    pub fn indirect_buffer(address: GpuAddr, size_bytes: u32) -> Result<Self> {
        Self::from_words(&build_indirect_buffer(address, size_bytes)?)
    }

    /// Append words
    pub fn extend(&mut self, words: &[u32]) -> Result<()> {
        let total = self.words.len() + words.len();
        self.words
            .try_extend_from_slice(words)
            .map_err(|_| Error::CommandBlockTooLarge { words: total })
    }

    /// Words in the block
    pub fn as_slice(&self) -> &[u32] {
        &self.words
    }

    /// Number of words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the block is empty
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
