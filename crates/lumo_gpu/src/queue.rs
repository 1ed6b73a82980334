//! Command queues

use crate::command_buffer::CommandBuffer;
use crate::device::GraphicsDevice;
use std::sync::Arc;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CommandQueueFlags: u32 {
        const RENDER  = 1 << 0;
        const COMPUTE = 1 << 1;
        const COPY    = 1 << 2;
    }
}

/// Serializes submission of command buffers to the GPU.
pub trait CommandQueue: Send + Sync {
    fn flags(&self) -> CommandQueueFlags;
    fn device(&self) -> Arc<dyn GraphicsDevice>;
    fn make_command_buffer(&self) -> Option<Arc<dyn CommandBuffer>>;
}
