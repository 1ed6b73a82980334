//! wgpu synchronization objects
//!
//! wgpu exposes a single in-order queue, so cross-buffer ordering recorded
//! through events and semaphores already holds by submission order. The
//! objects still carry their counters: signals advance when a submission's
//! completion callback fires, which keeps the strictly-increasing contract
//! observable and debuggable.

use crate::event::{GpuEvent, GpuSemaphore};
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct WgpuEvent {
    signaled: AtomicU64,
}

impl WgpuEvent {
    pub(crate) fn new() -> Self {
        Self {
            signaled: AtomicU64::new(0),
        }
    }

    pub(crate) fn advance(&self) {
        self.signaled.fetch_add(1, Ordering::AcqRel);
    }

    /// Number of signal operations that have completed.
    pub fn signaled_value(&self) -> u64 {
        self.signaled.load(Ordering::Acquire)
    }
}

impl GpuEvent for WgpuEvent {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct WgpuSemaphore {
    signaled: AtomicU64,
}

impl WgpuSemaphore {
    pub(crate) fn new() -> Self {
        Self {
            signaled: AtomicU64::new(0),
        }
    }

    pub(crate) fn advance_to(&self, value: u64) {
        self.signaled.fetch_max(value, Ordering::AcqRel);
    }

    /// Highest value signaled so far.
    pub fn signaled_value(&self) -> u64 {
        self.signaled.load(Ordering::Acquire)
    }
}

impl GpuSemaphore for WgpuSemaphore {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
