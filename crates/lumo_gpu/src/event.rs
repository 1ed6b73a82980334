//! GPU synchronization primitives

use std::any::Any;

/// A binary GPU event with strictly increasing wait/signal counters.
///
/// Ordering between command buffers is expressed by recording wait/signal
/// operations into the command stream; no CPU blocking is involved.
pub trait GpuEvent: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// A value-indexed GPU semaphore (timeline semaphore).
pub trait GpuSemaphore: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}
