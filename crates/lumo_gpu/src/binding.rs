//! Shader binding sets

use crate::buffer::GpuBuffer;
use crate::reflection::ShaderResourceType;
use crate::sampler::SamplerState;
use crate::texture::Texture;
use std::any::Any;
use std::sync::Arc;

/// One binding declaration within a binding-set layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShaderBinding {
    pub binding: u32,
    pub ty: ShaderResourceType,
    pub array_length: u32,
}

impl ShaderBinding {
    pub const fn texture_sampler(binding: u32) -> Self {
        Self {
            binding,
            ty: ShaderResourceType::TextureSampler,
            array_length: 1,
        }
    }
}

/// Layout of a binding set: a grouped declaration of shader-visible
/// resources bound together at one set index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderBindingSetLayout {
    pub bindings: Vec<ShaderBinding>,
}

/// A mutable collection of resources matching a [`ShaderBindingSetLayout`].
///
/// Encoders snapshot the bound resources when `set_resource` is recorded, so
/// a binding set may be rebound with different resources between draws.
pub trait ShaderBindingSet: Send + Sync {
    fn set_texture(&self, binding: u32, texture: Arc<dyn Texture>);
    fn set_sampler_state(&self, binding: u32, sampler: Arc<dyn SamplerState>);
    fn set_buffer(&self, binding: u32, buffer: Arc<dyn GpuBuffer>, offset: u64, length: u64);

    fn as_any(&self) -> &dyn Any;
}
