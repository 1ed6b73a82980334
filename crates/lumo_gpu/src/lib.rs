//! Lumo graphics device abstraction
//!
//! A Metal-style command-buffer API over the native GPU backend:
//!
//! - [`GraphicsDevice`] creates buffers, textures, samplers, shader modules,
//!   pipeline states, binding sets, events and semaphores
//! - [`CommandBuffer`] records render/compute/copy encoder blocks as deferred
//!   command lists and submits them atomically to a [`CommandQueue`]
//! - Encoders record tagged commands that are interpreted at commit time, so
//!   no backend call happens before [`CommandBuffer::commit`]
//!
//! One backend lives in [`wgpu`] and is the default way to obtain a device.

pub mod binding;
pub mod blend_state;
pub mod buffer;
pub mod command_buffer;
pub mod depth_stencil;
pub mod device;
pub mod encoder;
pub mod event;
pub mod pixel_format;
pub mod queue;
pub mod reflection;
pub mod render_pass;
pub mod render_pipeline;
pub mod sampler;
pub mod shader;
pub mod texture;
pub mod types;

pub mod wgpu;

pub use binding::{ShaderBinding, ShaderBindingSet, ShaderBindingSetLayout};
pub use blend_state::{BlendFactor, BlendOperation, BlendState, ColorWriteMask};
pub use buffer::GpuBuffer;
pub use command_buffer::{CommandBuffer, CommandBufferHandler, CommandBufferStatus};
pub use depth_stencil::{
    CompareFunction, DepthStencilDescriptor, DepthStencilState, StencilDescriptor,
    StencilOperation,
};
pub use device::{DeviceError, GraphicsDevice};
pub use encoder::{
    CommandEncoder, ComputeCommandEncoder, CopyCommandEncoder, RenderCommandEncoder,
};
pub use event::{GpuEvent, GpuSemaphore};
pub use pixel_format::PixelFormat;
pub use queue::{CommandQueue, CommandQueueFlags};
pub use reflection::{
    PipelineReflection, ShaderPushConstantLayout, ShaderResource, ShaderResourceType,
};
pub use render_pass::{
    LoadAction, RenderPassColorAttachmentDescriptor, RenderPassDepthStencilAttachmentDescriptor,
    RenderPassDescriptor, StoreAction,
};
pub use render_pipeline::{
    ComputePipelineDescriptor, ComputePipelineState, PrimitiveTopology,
    RenderPipelineColorAttachmentDescriptor, RenderPipelineDescriptor, RenderPipelineState,
    TriangleFillMode, VertexAttributeDescriptor, VertexBufferLayoutDescriptor, VertexDescriptor,
    VertexFormat, VertexStepFunction,
};
pub use sampler::{SamplerAddressMode, SamplerDescriptor, SamplerFilter, SamplerMipFilter, SamplerState};
pub use shader::{Shader, ShaderError, ShaderFunction, ShaderModule, ShaderStage, ShaderStageFlags};
pub use texture::{Texture, TextureDescriptor, TextureType, TextureUsage};
pub use types::{
    BufferImageOrigin, CpuCacheMode, CullMode, IndexType, ScissorRect, StorageMode, TextureOrigin,
    TextureSize, Viewport, Winding,
};
