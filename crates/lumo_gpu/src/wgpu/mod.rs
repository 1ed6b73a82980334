//! The wgpu backend
//!
//! Implements the portable device abstraction on top of wgpu. Encoders
//! record tagged commands, and all wgpu calls happen at commit time when the
//! command lists are interpreted (see [`render_encoder`]).

mod binding;
mod buffer;
mod command_buffer;
mod compute_encoder;
mod convert;
mod copy_encoder;
mod event;
mod pipeline;
mod render_encoder;
mod sampler;
mod shader;
mod texture;

pub use binding::WgpuShaderBindingSet;
pub use buffer::WgpuBuffer;
pub use command_buffer::WgpuCommandBuffer;
pub use compute_encoder::WgpuComputeCommandEncoder;
pub use copy_encoder::WgpuCopyCommandEncoder;
pub use event::{WgpuEvent, WgpuSemaphore};
pub use pipeline::{WgpuComputePipelineState, WgpuDepthStencilState, WgpuRenderPipelineState};
pub use render_encoder::WgpuRenderCommandEncoder;
pub use sampler::WgpuSamplerState;
pub use shader::{WgpuShaderFunction, WgpuShaderModule};
pub use texture::WgpuTexture;

use crate::binding::{ShaderBindingSet, ShaderBindingSetLayout};
use crate::buffer::GpuBuffer;
use crate::command_buffer::CommandBuffer;
use crate::depth_stencil::{DepthStencilDescriptor, DepthStencilState};
use crate::device::{DeviceError, GraphicsDevice};
use crate::event::{GpuEvent, GpuSemaphore};
use crate::pixel_format::PixelFormat;
use crate::queue::{CommandQueue, CommandQueueFlags};
use crate::reflection::PipelineReflection;
use crate::render_pipeline::{
    ComputePipelineDescriptor, ComputePipelineState, RenderPipelineDescriptor, RenderPipelineState,
};
use crate::sampler::{SamplerDescriptor, SamplerState};
use crate::shader::{Shader, ShaderModule};
use crate::texture::{Texture, TextureDescriptor, TextureType, TextureUsage};
use crate::types::{CpuCacheMode, StorageMode};
use std::sync::{Arc, Weak};

/// The native device and queue shared by every resource of one adapter.
pub(crate) struct DeviceShared {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub name: String,
}

pub struct WgpuGraphicsDevice {
    weak_self: Weak<WgpuGraphicsDevice>,
    shared: Arc<DeviceShared>,
}

impl WgpuGraphicsDevice {
    /// Picks a high-performance adapter and requests a device with push
    /// constants enabled.
    pub async fn new() -> Result<Arc<Self>, DeviceError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .ok_or(DeviceError::AdapterNotFound)?;

        if !adapter.features().contains(wgpu::Features::PUSH_CONSTANTS) {
            return Err(DeviceError::RequestDevice(
                "adapter does not support push constants".into(),
            ));
        }

        let mut limits = wgpu::Limits::default();
        limits.max_push_constant_size = adapter.limits().max_push_constant_size.min(128);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("lumo device"),
                    required_features: wgpu::Features::PUSH_CONSTANTS,
                    required_limits: limits,
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(|e| DeviceError::RequestDevice(e.to_string()))?;

        let name = adapter.get_info().name;
        tracing::info!("graphics device created: {name}");

        Ok(Arc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            shared: Arc::new(DeviceShared {
                device,
                queue,
                name,
            }),
        }))
    }

    pub fn new_blocking() -> Result<Arc<Self>, DeviceError> {
        pollster::block_on(Self::new())
    }

    /// Blocks until all submitted GPU work has completed and pending
    /// completion handlers have run.
    pub fn wait_for_completion(&self) {
        let _ = self.shared.device.poll(wgpu::Maintain::Wait);
    }
}

impl GraphicsDevice for WgpuGraphicsDevice {
    fn name(&self) -> &str {
        &self.shared.name
    }

    fn make_command_queue(&self, flags: CommandQueueFlags) -> Option<Arc<dyn CommandQueue>> {
        let device = self.weak_self.upgrade()?;
        let shared = self.shared.clone();
        let queue: Arc<WgpuCommandQueue> = Arc::new_cyclic(|weak_self| WgpuCommandQueue {
            weak_self: weak_self.clone(),
            device,
            shared,
            flags,
        });
        Some(queue)
    }

    fn make_shader_module(&self, shader: &Shader) -> Option<Arc<dyn ShaderModule>> {
        WgpuShaderModule::new(&self.shared, shader).map(|m| Arc::new(m) as _)
    }

    fn make_shader_binding_set(
        &self,
        layout: &ShaderBindingSetLayout,
    ) -> Option<Arc<dyn ShaderBindingSet>> {
        Some(Arc::new(WgpuShaderBindingSet::new(layout)))
    }

    fn make_render_pipeline_state(
        &self,
        descriptor: &RenderPipelineDescriptor,
        reflection: Option<&mut PipelineReflection>,
    ) -> Option<Arc<dyn RenderPipelineState>> {
        WgpuRenderPipelineState::new(self.shared.clone(), descriptor, reflection)
            .map(|p| Arc::new(p) as _)
    }

    fn make_compute_pipeline_state(
        &self,
        descriptor: &ComputePipelineDescriptor,
        reflection: Option<&mut PipelineReflection>,
    ) -> Option<Arc<dyn ComputePipelineState>> {
        WgpuComputePipelineState::new(&self.shared, descriptor, reflection)
            .map(|p| Arc::new(p) as _)
    }

    fn make_depth_stencil_state(
        &self,
        descriptor: &DepthStencilDescriptor,
    ) -> Option<Arc<dyn DepthStencilState>> {
        Some(Arc::new(WgpuDepthStencilState::new(descriptor)))
    }

    fn make_buffer(
        &self,
        length: u64,
        storage_mode: StorageMode,
        cpu_cache_mode: CpuCacheMode,
    ) -> Option<Arc<dyn GpuBuffer>> {
        WgpuBuffer::new(self.shared.clone(), length, storage_mode, cpu_cache_mode)
            .map(|b| Arc::new(b) as _)
    }

    fn make_texture(&self, descriptor: &TextureDescriptor) -> Option<Arc<dyn Texture>> {
        WgpuTexture::new(&self.shared, descriptor).map(|t| Arc::new(t) as _)
    }

    fn make_transient_render_target(
        &self,
        texture_type: TextureType,
        pixel_format: PixelFormat,
        width: u32,
        height: u32,
        depth: u32,
    ) -> Option<Arc<dyn Texture>> {
        let descriptor = TextureDescriptor {
            texture_type,
            pixel_format,
            width,
            height,
            depth,
            mipmap_levels: 1,
            sample_count: 1,
            array_length: 1,
            usage: TextureUsage::RENDER_TARGET,
        };
        WgpuTexture::new(&self.shared, &descriptor).map(|t| Arc::new(t) as _)
    }

    fn make_sampler_state(&self, descriptor: &SamplerDescriptor) -> Option<Arc<dyn SamplerState>> {
        Some(Arc::new(WgpuSamplerState::new(&self.shared, descriptor)))
    }

    fn make_event(&self) -> Option<Arc<dyn GpuEvent>> {
        Some(Arc::new(WgpuEvent::new()))
    }

    fn make_semaphore(&self) -> Option<Arc<dyn GpuSemaphore>> {
        Some(Arc::new(WgpuSemaphore::new()))
    }
}

pub struct WgpuCommandQueue {
    weak_self: Weak<WgpuCommandQueue>,
    device: Arc<WgpuGraphicsDevice>,
    pub(crate) shared: Arc<DeviceShared>,
    flags: CommandQueueFlags,
}

impl CommandQueue for WgpuCommandQueue {
    fn flags(&self) -> CommandQueueFlags {
        self.flags
    }

    fn device(&self) -> Arc<dyn GraphicsDevice> {
        self.device.clone()
    }

    fn make_command_buffer(&self) -> Option<Arc<dyn CommandBuffer>> {
        Some(WgpuCommandBuffer::new(self.weak_self.upgrade()?) as _)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_buffer::CommandBufferStatus;
    use crate::encoder::{CommandEncoder, CopyCommandEncoder};
    use crate::render_pass::{RenderPassColorAttachmentDescriptor, RenderPassDescriptor};
    use lumo_core::Color;

    fn test_device() -> Option<Arc<WgpuGraphicsDevice>> {
        WgpuGraphicsDevice::new_blocking().ok()
    }

    #[test]
    fn texture_creation_validates_descriptor() {
        let Some(device) = test_device() else { return };

        let bad = TextureDescriptor {
            array_length: 0,
            ..TextureDescriptor::new_2d(PixelFormat::Rgba8Unorm, 4, 4, TextureUsage::SAMPLED)
        };
        assert!(device.make_texture(&bad).is_none());

        let bad = TextureDescriptor::new_2d(PixelFormat::Invalid, 4, 4, TextureUsage::SAMPLED);
        assert!(device.make_texture(&bad).is_none());

        let bad = TextureDescriptor::new_2d(PixelFormat::Rgba8Unorm, 0, 4, TextureUsage::SAMPLED);
        assert!(device.make_texture(&bad).is_none());

        let good = TextureDescriptor::new_2d(PixelFormat::Rgba8Unorm, 4, 4, TextureUsage::SAMPLED);
        let texture = device.make_texture(&good).unwrap();
        assert_eq!(texture.dimensions(), (4, 4, 1));
    }

    #[test]
    fn second_open_encoder_fails() {
        let Some(device) = test_device() else { return };
        let queue = device.make_command_queue(CommandQueueFlags::RENDER).unwrap();
        let buffer = queue.make_command_buffer().unwrap();

        let target = device
            .make_texture(&TextureDescriptor::new_2d(
                PixelFormat::Rgba8Unorm,
                4,
                4,
                TextureUsage::RENDER_TARGET,
            ))
            .unwrap();
        let pass = RenderPassDescriptor::with_color_attachments([
            RenderPassColorAttachmentDescriptor::clearing(target, Color::CLEAR),
        ]);

        let mut first = buffer.make_render_command_encoder(&pass).unwrap();
        assert_eq!(buffer.status(), CommandBufferStatus::Encoding);
        assert!(buffer.make_render_command_encoder(&pass).is_none());
        assert!(buffer.make_copy_command_encoder().is_none());

        first.end_encoding();
        assert_eq!(buffer.status(), CommandBufferStatus::Ready);
    }

    #[test]
    fn commit_requires_ready_state() {
        let Some(device) = test_device() else { return };
        let queue = device.make_command_queue(CommandQueueFlags::RENDER).unwrap();
        let buffer = queue.make_command_buffer().unwrap();

        let target = device
            .make_texture(&TextureDescriptor::new_2d(
                PixelFormat::Rgba8Unorm,
                4,
                4,
                TextureUsage::RENDER_TARGET,
            ))
            .unwrap();
        let pass = RenderPassDescriptor::with_color_attachments([
            RenderPassColorAttachmentDescriptor::clearing(target, Color::CLEAR),
        ]);

        // Open encoder blocks commit.
        let mut encoder = buffer.make_render_command_encoder(&pass).unwrap();
        assert!(!buffer.commit());
        encoder.end_encoding();

        assert!(buffer.commit());
        device.wait_for_completion();
        assert_eq!(buffer.status(), CommandBufferStatus::Ready);
    }

    #[test]
    fn completion_handler_runs_and_event_signals() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let Some(device) = test_device() else { return };
        let queue = device.make_command_queue(CommandQueueFlags::COPY).unwrap();
        let buffer = queue.make_command_buffer().unwrap();
        let event = device.make_event().unwrap();

        let a = device
            .make_buffer(64, StorageMode::Shared, CpuCacheMode::WriteCombined)
            .unwrap();
        let b = device
            .make_buffer(64, StorageMode::Shared, CpuCacheMode::WriteCombined)
            .unwrap();
        assert!(a.write(0, &[7u8; 64]));

        let mut encoder = buffer.make_copy_command_encoder().unwrap();
        encoder.copy_buffer(&a, 0, &b, 0, 64);
        encoder.signal_event(&event);
        encoder.end_encoding();

        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();
        buffer.add_completed_handler(Box::new(move || {
            flag.store(true, Ordering::Release);
        }));

        assert!(buffer.commit());
        device.wait_for_completion();

        assert!(done.load(Ordering::Acquire));
        let event = event.as_any().downcast_ref::<WgpuEvent>().unwrap();
        assert_eq!(event.signaled_value(), 1);
    }
}
