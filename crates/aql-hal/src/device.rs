//! # Device
//!
//! The agent a queue is attached to.

use aql_core::{AgentHandle, Result, SignalProvider};

use crate::queue::{HwQueue, QueueCreateInfo};

/// A GPU agent capable of hosting AQL queues
///
/// Agent discovery, memory pools and capability queries live outside the
/// queue core; this trait exposes only what queue construction needs.
pub trait Device: SignalProvider {
    /// Native queue type created by this device
    type Queue: HwQueue;

    /// Agent handle
    fn agent(&self) -> AgentHandle;

    /// Largest queue size (in packets) the agent supports
    fn max_queue_size(&self) -> Result<u32>;

    /// Create a native queue
    fn create_queue(&self, info: QueueCreateInfo) -> Result<Self::Queue>;
}

impl<D: Device + ?Sized> Device for &D {
    type Queue = D::Queue;

    fn agent(&self) -> AgentHandle {
        (**self).agent()
    }

    fn max_queue_size(&self) -> Result<u32> {
        (**self).max_queue_size()
    }

    fn create_queue(&self, info: QueueCreateInfo) -> Result<Self::Queue> {
        (**self).create_queue(info)
    }
}
