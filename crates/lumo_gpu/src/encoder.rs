//! Command encoders
//!
//! Encoders accumulate tagged commands plus the events/semaphores to wait on
//! or signal; nothing reaches the backend until the owning command buffer is
//! committed. `end_encoding` hands the recorded block back to the command
//! buffer and invalidates the encoder.

use crate::binding::ShaderBindingSet;
use crate::buffer::GpuBuffer;
use crate::depth_stencil::DepthStencilState;
use crate::event::{GpuEvent, GpuSemaphore};
use crate::render_pipeline::{ComputePipelineState, RenderPipelineState};
use crate::shader::ShaderStageFlags;
use crate::texture::Texture;
use crate::types::{
    BufferImageOrigin, CullMode, IndexType, ScissorRect, TextureOrigin, TextureSize, Viewport,
    Winding,
};
use std::sync::Arc;

/// Operations common to every encoder kind.
pub trait CommandEncoder {
    /// Hands the recorded block to the command buffer. The encoder is
    /// invalid afterwards; further recording is a contract violation.
    fn end_encoding(&mut self);

    fn is_ended(&self) -> bool;

    fn wait_event(&mut self, event: &Arc<dyn GpuEvent>);
    fn signal_event(&mut self, event: &Arc<dyn GpuEvent>);
    fn wait_semaphore_value(&mut self, semaphore: &Arc<dyn GpuSemaphore>, value: u64);
    fn signal_semaphore_value(&mut self, semaphore: &Arc<dyn GpuSemaphore>, value: u64);
}

/// Records draw commands for one render pass.
pub trait RenderCommandEncoder: CommandEncoder {
    fn set_render_pipeline_state(&mut self, pipeline: &Arc<dyn RenderPipelineState>);
    fn set_depth_stencil_state(&mut self, state: Option<&Arc<dyn DepthStencilState>>);
    fn set_viewport(&mut self, viewport: Viewport);
    fn set_scissor_rect(&mut self, rect: ScissorRect);
    fn set_resource(&mut self, index: u32, binding_set: &Arc<dyn ShaderBindingSet>);
    fn set_vertex_buffer(&mut self, buffer: &Arc<dyn GpuBuffer>, offset: u64, index: u32);
    fn set_cull_mode(&mut self, mode: CullMode);
    fn set_front_facing(&mut self, winding: Winding);
    fn set_blend_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32);
    fn set_stencil_reference_value(&mut self, value: u32);

    /// Uploads part of the push-constant block. The backend grows its
    /// scratch copy to `offset + data.len()`, copies the bytes, then
    /// zero-pads to the full declared block size before upload, so callers
    /// may fill a block incrementally across several calls.
    fn push_constant(&mut self, stages: ShaderStageFlags, offset: u32, data: &[u8]);

    fn draw(&mut self, vertex_start: u32, vertex_count: u32, instance_count: u32, base_instance: u32);

    #[allow(clippy::too_many_arguments)]
    fn draw_indexed(
        &mut self,
        index_count: u32,
        index_type: IndexType,
        index_buffer: &Arc<dyn GpuBuffer>,
        index_buffer_offset: u64,
        instance_count: u32,
        base_vertex: i32,
        base_instance: u32,
    );
}

/// Records compute dispatches.
pub trait ComputeCommandEncoder: CommandEncoder {
    fn set_compute_pipeline_state(&mut self, pipeline: &Arc<dyn ComputePipelineState>);
    fn set_resource(&mut self, index: u32, binding_set: &Arc<dyn ShaderBindingSet>);
    fn push_constant(&mut self, stages: ShaderStageFlags, offset: u32, data: &[u8]);
    fn dispatch(&mut self, workgroups_x: u32, workgroups_y: u32, workgroups_z: u32);
}

/// Records buffer/texture transfer commands.
pub trait CopyCommandEncoder: CommandEncoder {
    fn copy_buffer(
        &mut self,
        source: &Arc<dyn GpuBuffer>,
        source_offset: u64,
        destination: &Arc<dyn GpuBuffer>,
        destination_offset: u64,
        size: u64,
    );

    fn copy_buffer_to_texture(
        &mut self,
        source: &Arc<dyn GpuBuffer>,
        source_offset: BufferImageOrigin,
        destination: &Arc<dyn Texture>,
        destination_offset: TextureOrigin,
        size: TextureSize,
    );

    fn copy_texture_to_buffer(
        &mut self,
        source: &Arc<dyn Texture>,
        source_offset: TextureOrigin,
        destination: &Arc<dyn GpuBuffer>,
        destination_offset: BufferImageOrigin,
        size: TextureSize,
    );

    #[allow(clippy::too_many_arguments)]
    fn copy_texture(
        &mut self,
        source: &Arc<dyn Texture>,
        source_offset: TextureOrigin,
        destination: &Arc<dyn Texture>,
        destination_offset: TextureOrigin,
        size: TextureSize,
    );
}
