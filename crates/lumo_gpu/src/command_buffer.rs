//! Command buffers

use crate::encoder::{ComputeCommandEncoder, CopyCommandEncoder, RenderCommandEncoder};
use crate::queue::CommandQueue;
use crate::render_pass::RenderPassDescriptor;
use std::sync::Arc;

/// Lifecycle of a command buffer.
///
/// `Ready --make_*_encoder--> Encoding --end_encoding--> Ready
/// --commit--> Committed --(async completion)--> Ready`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CommandBufferStatus {
    #[default]
    Ready,
    Encoding,
    Committed,
}

/// Invoked when the GPU finishes executing a committed buffer. Runs on a
/// backend-determined thread.
pub type CommandBufferHandler = Box<dyn FnOnce() + Send + 'static>;

/// A transient, single-use list of encoder blocks submitted atomically.
///
/// Recording is single-threaded: exactly one encoder may be open at a time,
/// and opening a second one fails (returns `None`, logs an error). `commit`
/// fails unless the buffer is `Ready`; on success the queued encodings are
/// replayed against a fresh native command buffer and submitted
/// asynchronously, and the buffer returns to `Ready` once the registered
/// completion handlers have been invoked.
pub trait CommandBuffer: Send + Sync {
    fn status(&self) -> CommandBufferStatus;

    fn make_render_command_encoder(
        &self,
        descriptor: &RenderPassDescriptor,
    ) -> Option<Box<dyn RenderCommandEncoder>>;
    fn make_compute_command_encoder(&self) -> Option<Box<dyn ComputeCommandEncoder>>;
    fn make_copy_command_encoder(&self) -> Option<Box<dyn CopyCommandEncoder>>;

    fn add_completed_handler(&self, handler: CommandBufferHandler);

    /// Returns false without mutating queued encodings when the buffer is
    /// not `Ready` or when any encoder block fails to encode.
    fn commit(&self) -> bool;

    fn queue(&self) -> Arc<dyn CommandQueue>;
}
