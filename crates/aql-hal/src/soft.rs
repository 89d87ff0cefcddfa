//! # Software Queue Backend
//!
//! In-memory stand-ins for a native queue and its agent. The ring lives in a
//! boxed byte slice and the index registers are plain atomics, so a test
//! thread can play the packet processor by advancing the read index.
//!
//! Signal waits complete immediately: [`SoftDevice::wait_signal`] marks every
//! queue it created as fully consumed and reports the signal as decremented
//! to zero, which is what a healthy device does for a drain barrier.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use aql_core::{
    AgentHandle, Error, GpuAddr, Result, Signal, SignalCondition, SignalProvider, Status,
    WaitState, AQL_PACKET_SIZE,
};
use spin::Mutex;

use crate::device::Device;
use crate::queue::{HwQueue, QueueCreateInfo, QueuePriority};

/// Base address handed to the first software queue
pub const SOFT_QUEUE_BASE: u64 = 0x7f00_0000_0000;

// =============================================================================
// REGISTERS
// =============================================================================

/// Index and doorbell registers shared between producer and simulated
/// consumer
#[derive(Debug, Default)]
pub struct SoftRegisters {
    read_index: AtomicU64,
    write_index: AtomicU64,
    doorbell: AtomicU64,
    doorbell_rings: AtomicU64,
    destroyed: AtomicBool,
}

impl SoftRegisters {
    /// Current read index
    pub fn read_index(&self) -> u64 {
        self.read_index.load(Ordering::Acquire)
    }

    /// Last stored write index
    pub fn write_index(&self) -> u64 {
        self.write_index.load(Ordering::Acquire)
    }

    /// Last value written to the doorbell
    pub fn doorbell(&self) -> u64 {
        self.doorbell.load(Ordering::Acquire)
    }

    /// Number of doorbell stores observed
    pub fn doorbell_rings(&self) -> u64 {
        self.doorbell_rings.load(Ordering::Acquire)
    }

    /// Whether the owning queue has been destroyed
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Consume up to `n` published packets
    ///
    /// The read index never passes the write index.
    pub fn advance_read_index(&self, n: u64) -> u64 {
        let write = self.write_index();
        let mut current = self.read_index.load(Ordering::Relaxed);
        loop {
            let next = current.saturating_add(n).min(write).max(current);
            match self.read_index.compare_exchange_weak(
                current,
                next,
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }

    /// Consume every published packet
    pub fn consume_all(&self) {
        let write = self.write_index();
        self.read_index.fetch_max(write, Ordering::Release);
    }
}

// =============================================================================
// SOFT QUEUE
// =============================================================================

/// Native queue backed by host memory
#[derive(Debug)]
pub struct SoftQueue {
    size: u32,
    base: GpuAddr,
    memory: Box<[u8]>,
    regs: Arc<SoftRegisters>,
    priority: QueuePriority,
    profiling: bool,
}

impl SoftQueue {
    /// Create a standalone queue of `size` packets at `base`
    pub fn new(size: u32, base: GpuAddr) -> Self {
        Self {
            size,
            base,
            memory: vec![0u8; size as usize * AQL_PACKET_SIZE].into_boxed_slice(),
            regs: Arc::new(SoftRegisters::default()),
            priority: QueuePriority::Normal,
            profiling: false,
        }
    }

    /// Shared register block, for playing the consumer side
    pub fn registers(&self) -> Arc<SoftRegisters> {
        Arc::clone(&self.regs)
    }

    /// Priority most recently configured
    pub fn priority(&self) -> QueuePriority {
        self.priority
    }

    /// Whether profiling was enabled
    pub fn profiling(&self) -> bool {
        self.profiling
    }
}

impl HwQueue for SoftQueue {
    fn size(&self) -> u32 {
        self.size
    }

    fn base_address(&self) -> GpuAddr {
        self.base
    }

    fn ring(&self) -> &[u8] {
        &self.memory
    }

    fn ring_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    fn load_read_index(&self) -> u64 {
        self.regs.read_index.load(Ordering::Acquire)
    }

    fn store_write_index(&self, index: u64) {
        self.regs.write_index.store(index, Ordering::Release);
    }

    fn store_doorbell(&self, value: u64) {
        self.regs.doorbell.store(value, Ordering::Release);
        self.regs.doorbell_rings.fetch_add(1, Ordering::AcqRel);
    }

    fn set_priority(&mut self, priority: QueuePriority) -> Status {
        self.priority = priority;
        Status::SUCCESS
    }

    fn set_profiler_enabled(&mut self, enabled: bool) -> Status {
        self.profiling = enabled;
        Status::SUCCESS
    }

    fn destroy(&mut self) -> Status {
        if self.regs.destroyed.swap(true, Ordering::AcqRel) {
            Status::ERROR_INVALID_QUEUE
        } else {
            Status::SUCCESS
        }
    }
}

// =============================================================================
// SOFT DEVICE
// =============================================================================

/// A signal handed out by [`SoftDevice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalRecord {
    /// Handle returned to the caller
    pub signal: Signal,
    /// Whether the caller asked for a reusable signal
    pub reusable: bool,
}

/// Agent backed by [`SoftQueue`]s
#[derive(Debug)]
pub struct SoftDevice {
    agent: AgentHandle,
    max_queue_size: u32,
    create_status: Status,
    next_base: AtomicU64,
    next_signal: AtomicU64,
    queues: Mutex<Vec<Arc<SoftRegisters>>>,
    signals: Mutex<Vec<SignalRecord>>,
    waits: AtomicU64,
}

impl SoftDevice {
    /// Create a device supporting queues of up to `max_queue_size` packets
    pub fn new(max_queue_size: u32) -> Self {
        Self {
            agent: AgentHandle(1),
            max_queue_size,
            create_status: Status::SUCCESS,
            next_base: AtomicU64::new(SOFT_QUEUE_BASE),
            next_signal: AtomicU64::new(1),
            queues: Mutex::new(Vec::new()),
            signals: Mutex::new(Vec::new()),
            waits: AtomicU64::new(0),
        }
    }

    /// Make every subsequent queue creation fail with `status`
    pub fn fail_queue_creation(mut self, status: Status) -> Self {
        self.create_status = status;
        self
    }

    /// Registers of the `index`-th queue created on this device
    pub fn queue_registers(&self, index: usize) -> Option<Arc<SoftRegisters>> {
        self.queues.lock().get(index).cloned()
    }

    /// Every signal allocated so far, in allocation order
    pub fn allocated_signals(&self) -> Vec<SignalRecord> {
        self.signals.lock().clone()
    }

    /// Number of completed signal waits
    pub fn wait_count(&self) -> u64 {
        self.waits.load(Ordering::Acquire)
    }
}

impl SignalProvider for SoftDevice {
    fn alloc_signal(&self, reusable: bool) -> Result<Signal> {
        let signal = Signal::from_handle(self.next_signal.fetch_add(1, Ordering::AcqRel));
        self.signals.lock().push(SignalRecord { signal, reusable });
        Ok(signal)
    }

    fn wait_signal(
        &self,
        signal: Signal,
        condition: SignalCondition,
        compare: i64,
        _timeout_hint: u64,
        _wait_state: WaitState,
    ) -> i64 {
        for regs in self.queues.lock().iter() {
            regs.consume_all();
        }
        self.waits.fetch_add(1, Ordering::AcqRel);

        let value = 0;
        log::trace!(
            "soft wait on {:?}: {:?} {} satisfied={}",
            signal,
            condition,
            compare,
            condition.holds(value, compare)
        );
        value
    }
}

impl Device for SoftDevice {
    type Queue = SoftQueue;

    fn agent(&self) -> AgentHandle {
        self.agent
    }

    fn max_queue_size(&self) -> Result<u32> {
        Ok(self.max_queue_size)
    }

    fn create_queue(&self, info: QueueCreateInfo) -> Result<SoftQueue> {
        self.create_status.check()?;
        if info.size == 0 || !info.size.is_power_of_two() || info.size > self.max_queue_size {
            return Err(Error::Hsa(Status::ERROR_INVALID_QUEUE_CREATION));
        }

        let span = info.size as u64 * AQL_PACKET_SIZE as u64;
        let base = GpuAddr::new(self.next_base.fetch_add(span, Ordering::AcqRel));
        let queue = SoftQueue::new(info.size, base);
        self.queues.lock().push(queue.registers());
        Ok(queue)
    }
}
