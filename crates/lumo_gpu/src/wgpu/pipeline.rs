//! wgpu pipeline states
//!
//! wgpu bakes depth/stencil, cull mode and winding into the pipeline object,
//! while the portable API treats them as encoder state. A
//! `WgpuRenderPipelineState` therefore holds the pipeline ingredients and
//! lazily builds one concrete `wgpu::RenderPipeline` per
//! (depth-stencil, cull, winding) combination the replay actually uses.

use super::convert;
use super::shader::WgpuShaderFunction;
use super::DeviceShared;
use crate::depth_stencil::{DepthStencilDescriptor, DepthStencilState};
use crate::reflection::{
    PipelineReflection, ShaderPushConstantLayout, ShaderResource, ShaderResourceType,
};
use crate::render_pipeline::{
    ComputePipelineDescriptor, ComputePipelineState, RenderPipelineDescriptor, RenderPipelineState,
};
use crate::shader::{ShaderFunction, ShaderStage, ShaderStageFlags};
use crate::types::{CullMode, Winding};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub(crate) struct PipelineVariant {
    pub depth_stencil: Option<DepthStencilDescriptor>,
    pub cull_mode: CullMode,
    pub winding: Winding,
}

pub struct WgpuRenderPipelineState {
    shared: Arc<DeviceShared>,
    vertex_module: Arc<wgpu::ShaderModule>,
    vertex_entry: String,
    fragment: Option<(Arc<wgpu::ShaderModule>, String)>,
    vertex_buffers: Vec<(u64, wgpu::VertexStepMode, Vec<wgpu::VertexAttribute>)>,
    color_targets: Vec<Option<wgpu::ColorTargetState>>,
    depth_stencil_format: Option<wgpu::TextureFormat>,
    topology: wgpu::PrimitiveTopology,
    polygon_mode: wgpu::PolygonMode,
    pipeline_layout: wgpu::PipelineLayout,
    pub(crate) bind_group_layouts: Vec<wgpu::BindGroupLayout>,
    pub(crate) push_constant_size: u32,
    pub(crate) push_constant_stages: wgpu::ShaderStages,
    variants: Mutex<HashMap<PipelineVariant, Arc<wgpu::RenderPipeline>>>,
}

/// Merges per-function reflection into one pipeline-wide view.
fn merge_reflection(functions: &[&WgpuShaderFunction]) -> PipelineReflection {
    let mut resources: Vec<ShaderResource> = Vec::new();
    let mut push_constants: Vec<ShaderPushConstantLayout> = Vec::new();

    for function in functions {
        for resource in &function.resources {
            if let Some(existing) = resources
                .iter_mut()
                .find(|r| r.set == resource.set && r.binding == resource.binding)
            {
                existing.stages |= resource.stages;
                if existing.ty != resource.ty {
                    existing.ty = ShaderResourceType::TextureSampler;
                }
            } else {
                resources.push(resource.clone());
            }
        }
        if let Some(pc) = &function.push_constant {
            if let Some(existing) = push_constants.first_mut() {
                existing.size = existing.size.max(pc.size);
                existing.stages |= pc.stages;
            } else {
                push_constants.push(pc.clone());
            }
        }
    }

    resources.sort_by_key(|r| (r.set, r.binding));
    PipelineReflection {
        resources,
        push_constants,
    }
}

fn make_bind_group_layouts(
    shared: &DeviceShared,
    reflection: &PipelineReflection,
) -> Vec<wgpu::BindGroupLayout> {
    let set_count = reflection
        .resources
        .iter()
        .map(|r| r.set + 1)
        .max()
        .unwrap_or(0);

    (0..set_count)
        .map(|set| {
            let mut entries: Vec<wgpu::BindGroupLayoutEntry> = Vec::new();
            for resource in reflection.resources.iter().filter(|r| r.set == set) {
                let visibility = convert::shader_stages(resource.stages);
                let native = resource.binding * 2;
                match resource.ty {
                    ShaderResourceType::Buffer => {
                        entries.push(wgpu::BindGroupLayoutEntry {
                            binding: native,
                            visibility,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        });
                    }
                    ShaderResourceType::Texture | ShaderResourceType::TextureSampler => {
                        entries.push(wgpu::BindGroupLayoutEntry {
                            binding: native,
                            visibility,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        });
                        if resource.ty == ShaderResourceType::TextureSampler {
                            entries.push(wgpu::BindGroupLayoutEntry {
                                binding: native + 1,
                                visibility,
                                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                                count: None,
                            });
                        }
                    }
                    ShaderResourceType::Sampler => {
                        entries.push(wgpu::BindGroupLayoutEntry {
                            binding: native + 1,
                            visibility,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        });
                    }
                }
            }
            shared
                .device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: None,
                    entries: &entries,
                })
        })
        .collect()
}

impl WgpuRenderPipelineState {
    pub(crate) fn new(
        shared: Arc<DeviceShared>,
        descriptor: &RenderPipelineDescriptor,
        reflection_out: Option<&mut PipelineReflection>,
    ) -> Option<Self> {
        let Some(vertex) = &descriptor.vertex_function else {
            tracing::error!("make_render_pipeline_state failed: missing vertex function");
            return None;
        };
        let vertex = vertex
            .as_any()
            .downcast_ref::<WgpuShaderFunction>()
            .expect("vertex function is not a wgpu shader function");
        debug_assert_eq!(vertex.stage(), ShaderStage::Vertex);

        let fragment = match &descriptor.fragment_function {
            Some(f) => Some(
                f.as_any()
                    .downcast_ref::<WgpuShaderFunction>()
                    .expect("fragment function is not a wgpu shader function"),
            ),
            None => None,
        };

        let mut functions = vec![vertex];
        if let Some(f) = fragment {
            debug_assert_eq!(f.stage(), ShaderStage::Fragment);
            functions.push(f);
        }
        let reflection = merge_reflection(&functions);
        if let Some(out) = reflection_out {
            *out = reflection.clone();
        }

        let bind_group_layouts = make_bind_group_layouts(&shared, &reflection);
        let (push_constant_size, push_constant_stages) = reflection
            .push_constants
            .first()
            .map(|pc| (pc.size, convert::shader_stages(pc.stages)))
            .unwrap_or((0, wgpu::ShaderStages::empty()));

        let push_constant_ranges: Vec<wgpu::PushConstantRange> = if push_constant_size > 0 {
            vec![wgpu::PushConstantRange {
                stages: push_constant_stages,
                range: 0..push_constant_size,
            }]
        } else {
            Vec::new()
        };

        let layout_refs: Vec<&wgpu::BindGroupLayout> = bind_group_layouts.iter().collect();
        let pipeline_layout = shared
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: None,
                bind_group_layouts: &layout_refs,
                push_constant_ranges: &push_constant_ranges,
            });

        // Group vertex attributes by their buffer slot.
        let mut layouts = descriptor.vertex_descriptor.layouts.clone();
        layouts.sort_by_key(|l| l.buffer_index);
        let vertex_buffers = layouts
            .iter()
            .map(|layout| {
                let attributes: Vec<wgpu::VertexAttribute> = descriptor
                    .vertex_descriptor
                    .attributes
                    .iter()
                    .filter(|a| a.buffer_index == layout.buffer_index)
                    .map(|a| wgpu::VertexAttribute {
                        format: convert::vertex_format(a.format),
                        offset: a.offset as u64,
                        shader_location: a.location,
                    })
                    .collect();
                let step = match layout.step {
                    crate::render_pipeline::VertexStepFunction::Vertex => {
                        wgpu::VertexStepMode::Vertex
                    }
                    crate::render_pipeline::VertexStepFunction::Instance => {
                        wgpu::VertexStepMode::Instance
                    }
                };
                (layout.stride as u64, step, attributes)
            })
            .collect();

        let attachment_count = descriptor
            .color_attachments
            .iter()
            .map(|a| a.index + 1)
            .max()
            .unwrap_or(0);
        let mut color_targets: Vec<Option<wgpu::ColorTargetState>> =
            vec![None; attachment_count as usize];
        for attachment in &descriptor.color_attachments {
            color_targets[attachment.index as usize] =
                convert::color_target(attachment.pixel_format, &attachment.blend_state);
        }

        Some(Self {
            shared,
            vertex_module: vertex.module.clone(),
            vertex_entry: vertex.name().to_string(),
            fragment: fragment.map(|f| (f.module.clone(), f.name().to_string())),
            vertex_buffers,
            color_targets,
            depth_stencil_format: convert::texture_format(
                descriptor.depth_stencil_attachment_pixel_format,
            ),
            topology: convert::primitive_topology(descriptor.primitive_topology),
            polygon_mode: convert::polygon_mode(descriptor.triangle_fill_mode),
            pipeline_layout,
            bind_group_layouts,
            push_constant_size,
            push_constant_stages,
            variants: Mutex::new(HashMap::new()),
        })
    }

    /// The concrete pipeline for the given dynamic-state combination,
    /// building and caching it on first use.
    pub(crate) fn variant(&self, key: &PipelineVariant) -> Option<Arc<wgpu::RenderPipeline>> {
        let mut variants = self.variants.lock().unwrap();
        if let Some(pipeline) = variants.get(key) {
            return Some(pipeline.clone());
        }

        let depth_stencil = self.depth_stencil_format.map(|format| {
            let ds = key.depth_stencil.unwrap_or_default();
            wgpu::DepthStencilState {
                format,
                depth_write_enabled: ds.is_depth_write_enabled,
                depth_compare: convert::compare_function(ds.depth_compare_function),
                stencil: wgpu::StencilState {
                    front: convert::stencil_face(&ds.front_face_stencil),
                    back: convert::stencil_face(&ds.back_face_stencil),
                    read_mask: ds.front_face_stencil.read_mask,
                    write_mask: ds.front_face_stencil.write_mask,
                },
                bias: wgpu::DepthBiasState::default(),
            }
        });

        let buffers: Vec<wgpu::VertexBufferLayout> = self
            .vertex_buffers
            .iter()
            .map(|(stride, step, attributes)| wgpu::VertexBufferLayout {
                array_stride: *stride,
                step_mode: *step,
                attributes,
            })
            .collect();

        self.shared
            .device
            .push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self
            .shared
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: None,
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &self.vertex_module,
                    entry_point: Some(&self.vertex_entry),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                primitive: wgpu::PrimitiveState {
                    topology: self.topology,
                    strip_index_format: None,
                    front_face: convert::front_face(key.winding),
                    cull_mode: convert::cull_mode(key.cull_mode),
                    unclipped_depth: false,
                    polygon_mode: self.polygon_mode,
                    conservative: false,
                },
                depth_stencil,
                multisample: wgpu::MultisampleState::default(),
                fragment: self.fragment.as_ref().map(|(module, entry)| wgpu::FragmentState {
                    module,
                    entry_point: Some(entry),
                    compilation_options: Default::default(),
                    targets: &self.color_targets,
                }),
                multiview: None,
                cache: None,
            });
        if let Some(error) = pollster::block_on(self.shared.device.pop_error_scope()) {
            tracing::error!("render pipeline creation failed: {error}");
            return None;
        }

        let pipeline = Arc::new(pipeline);
        variants.insert(key.clone(), pipeline.clone());
        Some(pipeline)
    }
}

impl RenderPipelineState for WgpuRenderPipelineState {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

pub struct WgpuDepthStencilState {
    descriptor: DepthStencilDescriptor,
}

impl WgpuDepthStencilState {
    pub(crate) fn new(descriptor: &DepthStencilDescriptor) -> Self {
        debug_assert_eq!(
            descriptor.front_face_stencil.read_mask, descriptor.back_face_stencil.read_mask,
            "wgpu shares stencil read masks between faces"
        );
        Self {
            descriptor: *descriptor,
        }
    }
}

impl DepthStencilState for WgpuDepthStencilState {
    fn descriptor(&self) -> &DepthStencilDescriptor {
        &self.descriptor
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct WgpuComputePipelineState {
    pub(crate) pipeline: wgpu::ComputePipeline,
    pub(crate) bind_group_layouts: Vec<wgpu::BindGroupLayout>,
    pub(crate) push_constant_size: u32,
}

impl WgpuComputePipelineState {
    pub(crate) fn new(
        shared: &Arc<DeviceShared>,
        descriptor: &ComputePipelineDescriptor,
        reflection_out: Option<&mut PipelineReflection>,
    ) -> Option<Self> {
        let Some(function) = &descriptor.compute_function else {
            tracing::error!("make_compute_pipeline_state failed: missing compute function");
            return None;
        };
        let function = function
            .as_any()
            .downcast_ref::<WgpuShaderFunction>()
            .expect("compute function is not a wgpu shader function");
        debug_assert_eq!(function.stage(), ShaderStage::Compute);

        let reflection = merge_reflection(&[function]);
        if let Some(out) = reflection_out {
            *out = reflection.clone();
        }

        let bind_group_layouts = make_bind_group_layouts(shared, &reflection);
        let push_constant_size = reflection
            .push_constants
            .first()
            .map(|pc| pc.size)
            .unwrap_or(0);
        let push_constant_ranges: Vec<wgpu::PushConstantRange> = if push_constant_size > 0 {
            vec![wgpu::PushConstantRange {
                stages: convert::shader_stages(ShaderStageFlags::COMPUTE),
                range: 0..push_constant_size,
            }]
        } else {
            Vec::new()
        };

        let layout_refs: Vec<&wgpu::BindGroupLayout> = bind_group_layouts.iter().collect();
        let layout = shared
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: None,
                bind_group_layouts: &layout_refs,
                push_constant_ranges: &push_constant_ranges,
            });

        shared.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = shared
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: None,
                layout: Some(&layout),
                module: &function.module,
                entry_point: Some(function.name()),
                compilation_options: Default::default(),
                cache: None,
            });
        if let Some(error) = pollster::block_on(shared.device.pop_error_scope()) {
            tracing::error!("compute pipeline creation failed: {error}");
            return None;
        }

        Some(Self {
            pipeline,
            bind_group_layouts,
            push_constant_size,
        })
    }
}

impl ComputePipelineState for WgpuComputePipelineState {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
