//! # AQL Command Submission
//!
//! Packet encoding, ring management and submission for HSA AQL queues.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                    Packet Submission Pipeline                     │
//! │                                                                   │
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────────┐     │
//! │  │   Packet     │    │    Ring      │    │   Packet         │     │
//! │  │   Encoder    │───▶│   Buffer     │───▶│   Processor      │     │
//! │  │ (AQL + PM4)  │    │ (64B slots)  │    │   (hardware)     │     │
//! │  └──────────────┘    └──────┬───────┘    └────────┬─────────┘     │
//! │                             │                     │               │
//! │                      ┌──────▼───────┐      read index / signals   │
//! │                      │     Flow     │◀────────────┘               │
//! │                      │  Controller  │                             │
//! │                      └──────────────┘                             │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Submission Flow
//!
//! 1. A packet is encoded into a 64-byte image
//! 2. The ring reserves a slot, spinning on the read index if full
//! 3. The payload is written, then the header behind a release fence
//! 4. The write index and doorbell announce the packet
//! 5. The completion signal, if any, drops when the packet retires

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod flow;
pub mod packet;
pub mod pm4;
pub mod queue;
pub mod ring;

// Re-exports
pub use packet::{BarrierAnd, KernelDispatch, Packet, PacketImage, VendorIndirectBuffer};
pub use pm4::{GcrCntl, Pm4Block};
pub use queue::{AqlQueue, Completion, QueueConfig, QueueState};
pub use ring::{RingBuffer, RingStats};
