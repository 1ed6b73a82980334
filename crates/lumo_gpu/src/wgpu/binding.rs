//! wgpu shader binding sets

use crate::binding::{ShaderBindingSet, ShaderBindingSetLayout};
use crate::buffer::GpuBuffer;
use crate::sampler::SamplerState;
use crate::texture::Texture;
use std::any::Any;
use std::sync::{Arc, Mutex};

/// The resources bound at one point in time; encoders capture one of these
/// when `set_resource` is recorded.
#[derive(Clone, Default)]
pub(crate) struct BindingSnapshot {
    pub textures: Vec<(u32, Arc<dyn Texture>)>,
    pub samplers: Vec<(u32, Arc<dyn SamplerState>)>,
    pub buffers: Vec<(u32, Arc<dyn GpuBuffer>, u64, u64)>,
}

pub struct WgpuShaderBindingSet {
    layout: ShaderBindingSetLayout,
    slots: Mutex<BindingSnapshot>,
}

impl WgpuShaderBindingSet {
    pub(crate) fn new(layout: &ShaderBindingSetLayout) -> Self {
        Self {
            layout: layout.clone(),
            slots: Mutex::new(BindingSnapshot::default()),
        }
    }

    pub(crate) fn snapshot(&self) -> BindingSnapshot {
        self.slots.lock().unwrap().clone()
    }

    fn declared(&self, binding: u32) -> bool {
        let known = self.layout.bindings.iter().any(|b| b.binding == binding);
        if !known {
            tracing::error!("binding {binding} is not declared in the binding-set layout");
        }
        known
    }
}

impl ShaderBindingSet for WgpuShaderBindingSet {
    fn set_texture(&self, binding: u32, texture: Arc<dyn Texture>) {
        if !self.declared(binding) {
            return;
        }
        let mut slots = self.slots.lock().unwrap();
        slots.textures.retain(|(b, _)| *b != binding);
        slots.textures.push((binding, texture));
    }

    fn set_sampler_state(&self, binding: u32, sampler: Arc<dyn SamplerState>) {
        if !self.declared(binding) {
            return;
        }
        let mut slots = self.slots.lock().unwrap();
        slots.samplers.retain(|(b, _)| *b != binding);
        slots.samplers.push((binding, sampler));
    }

    fn set_buffer(&self, binding: u32, buffer: Arc<dyn GpuBuffer>, offset: u64, length: u64) {
        if !self.declared(binding) {
            return;
        }
        let mut slots = self.slots.lock().unwrap();
        slots.buffers.retain(|(b, ..)| *b != binding);
        slots.buffers.push((binding, buffer, offset, length));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
