//! wgpu command buffers
//!
//! State machine: `Ready --make_*_encoder--> Encoding --end_encoding-->
//! Ready --commit--> Committed --completion--> Ready`. Commit replays every
//! queued encoding against a fresh native command encoder and submits; the
//! completion callback flips the buffer back to `Ready`, runs the registered
//! handlers and advances the counters of signaled events/semaphores.

use super::compute_encoder::{replay_compute, ComputeEncoding, WgpuComputeCommandEncoder};
use super::copy_encoder::{replay_copy, CopyEncoding, WgpuCopyCommandEncoder};
use super::event::{WgpuEvent, WgpuSemaphore};
use super::render_encoder::{replay_render, RenderEncoding, WgpuRenderCommandEncoder};
use super::WgpuCommandQueue;
use crate::command_buffer::{CommandBuffer, CommandBufferHandler, CommandBufferStatus};
use crate::encoder::{ComputeCommandEncoder, CopyCommandEncoder, RenderCommandEncoder};
use crate::event::{GpuEvent, GpuSemaphore};
use crate::queue::CommandQueue;
use crate::render_pass::RenderPassDescriptor;
use std::sync::{Arc, Mutex, Weak};

#[derive(Clone)]
pub(crate) enum SyncOp {
    Event(Arc<dyn GpuEvent>),
    Semaphore(Arc<dyn GpuSemaphore>, u64),
}

/// Wait/signal operations recorded alongside one encoder block.
#[derive(Clone, Default)]
pub(crate) struct SyncLists {
    pub waits: Vec<SyncOp>,
    pub signals: Vec<SyncOp>,
}

impl SyncLists {
    fn merge_semaphore(list: &mut Vec<SyncOp>, op: SyncOp) {
        let SyncOp::Semaphore(semaphore, value) = &op else {
            list.push(op);
            return;
        };
        // One entry per semaphore; the largest value wins.
        for existing in list.iter_mut() {
            if let SyncOp::Semaphore(s, v) = existing {
                if Arc::ptr_eq(s, semaphore) {
                    *v = (*v).max(*value);
                    return;
                }
            }
        }
        list.push(op);
    }

    pub fn wait_semaphore(&mut self, op: SyncOp) {
        Self::merge_semaphore(&mut self.waits, op);
    }

    pub fn signal_semaphore(&mut self, op: SyncOp) {
        Self::merge_semaphore(&mut self.signals, op);
    }
}

pub(crate) enum Encoding {
    Render(RenderEncoding),
    Compute(ComputeEncoding),
    Copy(CopyEncoding),
}

impl Encoding {
    fn sync(&self) -> &SyncLists {
        match self {
            Encoding::Render(e) => &e.sync,
            Encoding::Compute(e) => &e.sync,
            Encoding::Copy(e) => &e.sync,
        }
    }
}

struct Inner {
    status: CommandBufferStatus,
    encodings: Vec<Encoding>,
    handlers: Vec<CommandBufferHandler>,
}

pub struct WgpuCommandBuffer {
    weak_self: Weak<WgpuCommandBuffer>,
    queue: Arc<WgpuCommandQueue>,
    inner: Mutex<Inner>,
}

impl WgpuCommandBuffer {
    pub(crate) fn new(queue: Arc<WgpuCommandQueue>) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            queue,
            inner: Mutex::new(Inner {
                status: CommandBufferStatus::Ready,
                encodings: Vec::new(),
                handlers: Vec::new(),
            }),
        })
    }

    /// Transitions to `Encoding` if no other encoder is open.
    fn begin_encoder(&self, kind: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.status != CommandBufferStatus::Ready {
            tracing::error!(
                "cannot open {kind} encoder: command buffer is {:?}",
                inner.status
            );
            return false;
        }
        inner.status = CommandBufferStatus::Encoding;
        true
    }

    pub(crate) fn end_encoder(&self, encoding: Encoding) {
        let mut inner = self.inner.lock().unwrap();
        debug_assert_eq!(inner.status, CommandBufferStatus::Encoding);
        inner.encodings.push(encoding);
        inner.status = CommandBufferStatus::Ready;
    }

    /// Called when an encoder is dropped without `end_encoding`; the block
    /// is discarded and the buffer becomes usable again.
    pub(crate) fn abort_encoder(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.status == CommandBufferStatus::Encoding {
            inner.status = CommandBufferStatus::Ready;
        }
    }

    fn arc_self(&self) -> Arc<WgpuCommandBuffer> {
        self.weak_self.upgrade().expect("command buffer is alive")
    }
}

impl CommandBuffer for WgpuCommandBuffer {
    fn status(&self) -> CommandBufferStatus {
        self.inner.lock().unwrap().status
    }

    fn make_render_command_encoder(
        &self,
        descriptor: &RenderPassDescriptor,
    ) -> Option<Box<dyn RenderCommandEncoder>> {
        if !self.begin_encoder("render") {
            return None;
        }
        Some(Box::new(WgpuRenderCommandEncoder::new(
            self.arc_self(),
            descriptor,
        )))
    }

    fn make_compute_command_encoder(&self) -> Option<Box<dyn ComputeCommandEncoder>> {
        if !self.begin_encoder("compute") {
            return None;
        }
        Some(Box::new(WgpuComputeCommandEncoder::new(self.arc_self())))
    }

    fn make_copy_command_encoder(&self) -> Option<Box<dyn CopyCommandEncoder>> {
        if !self.begin_encoder("copy") {
            return None;
        }
        Some(Box::new(WgpuCopyCommandEncoder::new(self.arc_self())))
    }

    fn add_completed_handler(&self, handler: CommandBufferHandler) {
        self.inner.lock().unwrap().handlers.push(handler);
    }

    fn commit(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.status != CommandBufferStatus::Ready {
            tracing::error!("commit failed: command buffer is {:?}", inner.status);
            return false;
        }

        let shared = &self.queue.shared;
        let mut encoder = shared
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());

        // Encode everything first; a failure leaves the queued encodings and
        // the status untouched.
        for encoding in &inner.encodings {
            let ok = match encoding {
                Encoding::Render(e) => replay_render(shared, &mut encoder, e),
                Encoding::Compute(e) => replay_compute(shared, &mut encoder, e),
                Encoding::Copy(e) => replay_copy(&mut encoder, e),
            };
            if !ok {
                tracing::error!("commit failed: encoder block failed to encode");
                return false;
            }
        }

        let encodings = std::mem::take(&mut inner.encodings);
        inner.status = CommandBufferStatus::Committed;
        drop(inner);

        // The queue executes submissions in order; recorded waits hold by
        // construction. Signals advance once the submission completes.
        let signals: Vec<SyncOp> = encodings
            .iter()
            .flat_map(|e| e.sync().signals.iter().cloned())
            .collect();

        shared.queue.submit(std::iter::once(encoder.finish()));

        let this = self.arc_self();
        shared.queue.on_submitted_work_done(move || {
            for op in &signals {
                match op {
                    SyncOp::Event(event) => {
                        if let Some(event) = event.as_any().downcast_ref::<WgpuEvent>() {
                            event.advance();
                        }
                    }
                    SyncOp::Semaphore(semaphore, value) => {
                        if let Some(semaphore) =
                            semaphore.as_any().downcast_ref::<WgpuSemaphore>()
                        {
                            semaphore.advance_to(*value);
                        }
                    }
                }
            }
            let handlers = {
                let mut inner = this.inner.lock().unwrap();
                inner.status = CommandBufferStatus::Ready;
                std::mem::take(&mut inner.handlers)
            };
            for handler in handlers {
                handler();
            }
        });

        true
    }

    fn queue(&self) -> Arc<dyn CommandQueue> {
        self.queue.clone()
    }
}
