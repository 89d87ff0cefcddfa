//! # AQL Core
//!
//! Foundational types and traits shared by the AQL queue crates.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        aql-core                             │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │   Traits    │  │   Types     │  │     Error           │  │
//! │  │ (Program,   │  │ (GpuAddr,   │  │   Handling          │  │
//! │  │  Signals)   │  │  Signal)    │  │   (Status)          │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing in this crate touches hardware. Native runtime calls reach the
//! core only through the traits in [`traits`] and the status codes in
//! [`status`].

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "std")]
extern crate std;

// =============================================================================
// MODULE EXPORTS
// =============================================================================

pub mod error;
pub mod status;
pub mod sync;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use error::{Error, Result};
pub use status::Status;
pub use sync::{SignalCondition, WaitState};
pub use traits::*;
pub use types::*;
