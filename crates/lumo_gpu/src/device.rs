//! The graphics device factory interface

use crate::binding::{ShaderBindingSet, ShaderBindingSetLayout};
use crate::buffer::GpuBuffer;
use crate::depth_stencil::{DepthStencilDescriptor, DepthStencilState};
use crate::event::{GpuEvent, GpuSemaphore};
use crate::pixel_format::PixelFormat;
use crate::queue::{CommandQueue, CommandQueueFlags};
use crate::reflection::PipelineReflection;
use crate::render_pipeline::{
    ComputePipelineDescriptor, ComputePipelineState, RenderPipelineDescriptor, RenderPipelineState,
};
use crate::sampler::{SamplerDescriptor, SamplerState};
use crate::shader::{Shader, ShaderModule};
use crate::texture::{Texture, TextureDescriptor, TextureType};
use crate::types::{CpuCacheMode, StorageMode};
use std::sync::Arc;

/// Errors from device construction.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("no suitable GPU adapter found")]
    AdapterNotFound,
    #[error("failed to request GPU device: {0}")]
    RequestDevice(String),
}

/// Owns creation of every GPU resource. One per logical adapter; lives for
/// the application lifetime.
///
/// Every factory is non-throwing: a failure returns `None` after logging,
/// and the caller aborts only the operation that needed the resource.
pub trait GraphicsDevice: Send + Sync {
    fn name(&self) -> &str;

    fn make_command_queue(&self, flags: CommandQueueFlags) -> Option<Arc<dyn CommandQueue>>;

    /// Compiles a portable shader into a native module, remapping every
    /// declared resource binding to backend-native slots. Fails if the
    /// module declares more than one push-constant block, has no entry
    /// point, or does not compile.
    fn make_shader_module(&self, shader: &Shader) -> Option<Arc<dyn ShaderModule>>;

    fn make_shader_binding_set(
        &self,
        layout: &ShaderBindingSetLayout,
    ) -> Option<Arc<dyn ShaderBindingSet>>;

    /// Fails if the descriptor has no vertex function. When `reflection` is
    /// provided it receives the remapped resource bindings and push-constant
    /// layout.
    fn make_render_pipeline_state(
        &self,
        descriptor: &RenderPipelineDescriptor,
        reflection: Option<&mut PipelineReflection>,
    ) -> Option<Arc<dyn RenderPipelineState>>;

    fn make_compute_pipeline_state(
        &self,
        descriptor: &ComputePipelineDescriptor,
        reflection: Option<&mut PipelineReflection>,
    ) -> Option<Arc<dyn ComputePipelineState>>;

    fn make_depth_stencil_state(
        &self,
        descriptor: &DepthStencilDescriptor,
    ) -> Option<Arc<dyn DepthStencilState>>;

    fn make_buffer(
        &self,
        length: u64,
        storage_mode: StorageMode,
        cpu_cache_mode: CpuCacheMode,
    ) -> Option<Arc<dyn GpuBuffer>>;

    /// Fails on an invalid pixel format, a zero array length, or
    /// non-positive dimensions.
    fn make_texture(&self, descriptor: &TextureDescriptor) -> Option<Arc<dyn Texture>>;

    /// A render target that never needs to be stored; used for transient
    /// stencil attachments.
    fn make_transient_render_target(
        &self,
        texture_type: TextureType,
        pixel_format: PixelFormat,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Option<Arc<dyn Texture>>;

    fn make_sampler_state(&self, descriptor: &SamplerDescriptor) -> Option<Arc<dyn SamplerState>>;

    fn make_event(&self) -> Option<Arc<dyn GpuEvent>>;
    fn make_semaphore(&self) -> Option<Arc<dyn GpuSemaphore>>;
}
