//! wgpu shader modules and reflection
//!
//! `make_shader_module` consumes a validated portable shader, derives the
//! resource bindings and push-constant layout from the naga IR, and remaps
//! each declared (set, binding) to the backend-native slot convention:
//! a texture+sampler pair at logical binding `b` occupies native bindings
//! `2*b` (texture) and `2*b + 1` (sampler); buffers occupy `2*b`.

use super::DeviceShared;
use crate::reflection::{ShaderPushConstantLayout, ShaderResource, ShaderResourceType};
use crate::shader::{Shader, ShaderFunction, ShaderModule, ShaderStage, ShaderStageFlags};
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct WgpuShaderModule {
    pub(crate) module: Arc<wgpu::ShaderModule>,
    entry_points: Vec<(String, ShaderStage)>,
    resources: Vec<ShaderResource>,
    push_constant: Option<ShaderPushConstantLayout>,
}

impl WgpuShaderModule {
    pub(crate) fn new(shared: &Arc<DeviceShared>, shader: &Shader) -> Option<Self> {
        let entry_points: Vec<(String, ShaderStage)> = shader
            .entry_points()
            .map(|(name, stage)| (name.to_string(), stage))
            .collect();
        if entry_points.is_empty() {
            tracing::error!("make_shader_module failed: no entry point in '{}'", shader.name());
            return None;
        }

        let (resources, push_constant) = reflect(shader)?;

        shared.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = shared
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(shader.name()),
                source: wgpu::ShaderSource::Wgsl(shader.source().into()),
            });
        if let Some(error) = pollster::block_on(shared.device.pop_error_scope()) {
            tracing::error!("make_shader_module failed: '{}': {error}", shader.name());
            return None;
        }

        Some(Self {
            module: Arc::new(module),
            entry_points,
            resources,
            push_constant,
        })
    }
}

impl ShaderModule for WgpuShaderModule {
    fn function_names(&self) -> Vec<String> {
        self.entry_points.iter().map(|(name, _)| name.clone()).collect()
    }

    fn make_function(&self, name: &str) -> Option<Arc<dyn ShaderFunction>> {
        let (name, stage) = self
            .entry_points
            .iter()
            .find(|(n, _)| n == name)
            .cloned()?;
        Some(Arc::new(WgpuShaderFunction {
            module: self.module.clone(),
            name,
            stage,
            resources: self.resources.clone(),
            push_constant: self.push_constant.clone(),
        }))
    }
}

/// One entry point, carrying its module's remapped reflection data.
pub struct WgpuShaderFunction {
    pub(crate) module: Arc<wgpu::ShaderModule>,
    name: String,
    stage: ShaderStage,
    pub(crate) resources: Vec<ShaderResource>,
    pub(crate) push_constant: Option<ShaderPushConstantLayout>,
}

impl ShaderFunction for WgpuShaderFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Stage usage of a global variable, unioned over every entry point that
/// references it.
fn global_stages(shader: &Shader, handle: naga::Handle<naga::GlobalVariable>) -> ShaderStageFlags {
    let mut stages = ShaderStageFlags::empty();
    for (index, entry_point) in shader.module.entry_points.iter().enumerate() {
        let info = shader.info.get_entry_point(index);
        if !info[handle].is_empty() {
            stages |= ShaderStage::from(entry_point.stage).into();
        }
    }
    stages
}

fn reflect(shader: &Shader) -> Option<(Vec<ShaderResource>, Option<ShaderPushConstantLayout>)> {
    struct Slot {
        name: String,
        has_texture: bool,
        has_sampler: bool,
        is_buffer: bool,
        stages: ShaderStageFlags,
    }
    let mut slots: BTreeMap<(u32, u32), Slot> = BTreeMap::new();
    let mut push_constant: Option<ShaderPushConstantLayout> = None;

    for (handle, var) in shader.module.global_variables.iter() {
        let stages = global_stages(shader, handle);
        let name = var.name.clone().unwrap_or_default();

        match var.space {
            naga::AddressSpace::Handle => {
                let Some(ref rb) = var.binding else { continue };
                let inner = &shader.module.types[var.ty].inner;
                let is_sampler = matches!(inner, naga::TypeInner::Sampler { .. });
                // Native slot 2b / 2b+1 back to the logical binding b.
                let logical = if is_sampler {
                    (rb.binding.max(1) - 1) / 2
                } else {
                    rb.binding / 2
                };
                let slot = slots.entry((rb.group, logical)).or_insert(Slot {
                    name: String::new(),
                    has_texture: false,
                    has_sampler: false,
                    is_buffer: false,
                    stages: ShaderStageFlags::empty(),
                });
                if is_sampler {
                    slot.has_sampler = true;
                } else {
                    slot.has_texture = true;
                    slot.name = name;
                }
                slot.stages |= stages;
            }
            naga::AddressSpace::Uniform | naga::AddressSpace::Storage { .. } => {
                let Some(ref rb) = var.binding else { continue };
                slots.insert(
                    (rb.group, rb.binding / 2),
                    Slot {
                        name,
                        has_texture: false,
                        has_sampler: false,
                        is_buffer: true,
                        stages,
                    },
                );
            }
            naga::AddressSpace::PushConstant => {
                if push_constant.is_some() {
                    tracing::error!(
                        "make_shader_module failed: multiple push-constant blocks in '{}'",
                        shader.name()
                    );
                    return None;
                }
                let size = shader.module.types[var.ty]
                    .inner
                    .size(shader.module.to_ctx());
                push_constant = Some(ShaderPushConstantLayout {
                    name,
                    offset: 0,
                    size,
                    stages,
                });
            }
            _ => {}
        }
    }

    let resources = slots
        .into_iter()
        .map(|((set, binding), slot)| {
            let ty = match (slot.is_buffer, slot.has_texture, slot.has_sampler) {
                (true, _, _) => ShaderResourceType::Buffer,
                (_, true, true) => ShaderResourceType::TextureSampler,
                (_, true, false) => ShaderResourceType::Texture,
                _ => ShaderResourceType::Sampler,
            };
            ShaderResource {
                set,
                binding,
                name: slot.name,
                ty,
                stages: slot.stages,
            }
        })
        .collect();

    Some((resources, push_constant))
}
