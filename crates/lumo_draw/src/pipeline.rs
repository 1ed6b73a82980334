//! Pipeline state caching
//!
//! [`PipelineStates`] owns the built-in shader set (decoded from embedded
//! compressed WGSL), the default binding-set layouts, sampler and the 2x2
//! all-opaque mask texture, and caches compiled pipeline objects keyed by
//! (shader kind, color format, depth format, blend state) and depth/stencil
//! objects keyed by stencil mode. It is constructed once per command queue
//! by whoever owns the rendering loop and handed to each context as an
//! `Arc`.

use crate::shader_sources;
use lumo_gpu::{
    BlendState, BufferImageOrigin, CommandBuffer, CommandEncoder, CommandQueue, CompareFunction,
    CopyCommandEncoder, CpuCacheMode, DepthStencilDescriptor, DepthStencilState, GpuBuffer,
    GraphicsDevice, PixelFormat, PrimitiveTopology, RenderPipelineColorAttachmentDescriptor,
    RenderPipelineDescriptor, RenderPipelineState, SamplerDescriptor, SamplerState, ShaderBinding,
    ShaderBindingSet, ShaderBindingSetLayout, ShaderFunction, StencilDescriptor, StencilOperation,
    ShaderModule, StorageMode, Texture, TextureDescriptor, TextureOrigin, TextureSize,
    TextureUsage, TriangleFillMode, VertexAttributeDescriptor, VertexBufferLayoutDescriptor,
    VertexDescriptor, VertexFormat, VertexStepFunction,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The built-in shader kinds.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ShaderKind {
    /// Winding-number accumulation; position-only vertices, no color
    /// output.
    Stencil,
    VertexColor,
    Image,
    /// Red channel as alpha, for glyph atlases.
    RcImage,
    /// Merges the active mask with a layer's alpha into an r8 target.
    ResolveMask,
    ColorMatrixImage,
    BlurImage,
    /// Two-pass blend-mode compositing (source + backdrop).
    BlendImage,
}

/// Depth/stencil configurations used by the drawing context. The reference
/// stencil value is always 0; depth testing is never used.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum StencilMode {
    /// Non-zero winding accumulation: front faces increment-wrap, back
    /// faces decrement-wrap.
    MakeFill,
    /// Stroke coverage accumulation: both faces increment-clamp.
    MakeStroke,
    TestNonZero,
    TestEven,
    TestZero,
    TestOdd,
    Ignore,
}

/// The uniform vertex layout for all non-stencil draws.
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub texcoord: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub fn new(position: [f32; 2], texcoord: [f32; 2], color: [f32; 4]) -> Self {
        Self {
            position,
            texcoord,
            color,
        }
    }
}

struct ShaderFunctions {
    vertex: Arc<dyn ShaderFunction>,
    fragment: Option<Arc<dyn ShaderFunction>>,
}

#[derive(Clone, Hash, PartialEq, Eq)]
struct RenderStateKey {
    shader: ShaderKind,
    color_format: PixelFormat,
    depth_format: PixelFormat,
    blend_state: BlendState,
}

#[derive(Default)]
struct Caches {
    render_states: HashMap<RenderStateKey, Arc<dyn RenderPipelineState>>,
    depth_stencil_states: HashMap<StencilMode, Arc<dyn DepthStencilState>>,
}

pub struct PipelineStates {
    device: Arc<dyn GraphicsDevice>,
    shader_functions: HashMap<ShaderKind, ShaderFunctions>,
    /// One texture+sampler (mask only, or filter content).
    pub default_binding_set1: Arc<dyn ShaderBindingSet>,
    /// Two textures+samplers (mask at 0, diffuse/content at 1).
    pub default_binding_set2: Arc<dyn ShaderBindingSet>,
    pub default_sampler: Arc<dyn SamplerState>,
    /// 2x2 r8, every texel fully open; stands in whenever no clip mask is
    /// active so masked and unmasked draws share one code path.
    pub default_mask_texture: Arc<dyn Texture>,
    caches: Mutex<Caches>,
}

impl PipelineStates {
    /// Decodes the built-in shaders and allocates the default resources.
    /// Returns `None` (after logging) if any step fails; every dependent
    /// draw then fails gracefully.
    pub fn new(queue: &Arc<dyn CommandQueue>) -> Option<Arc<Self>> {
        let device = queue.device();

        let load_module = |name: &str| {
            let shader = shader_sources::load_shader(name)?;
            let module = device.make_shader_module(&shader);
            if module.is_none() {
                tracing::error!("PipelineStates: unable to compile shader '{name}'");
            }
            module
        };
        let function = |name: &str, entry: &str| {
            let function = load_module(name)?.make_function(entry);
            if function.is_none() {
                tracing::error!("PipelineStates: entry point '{entry}' missing in '{name}'");
            }
            function
        };

        let vertex = function("vertex", "vs_main")?;
        let fragment = |name: &str| function(name, "fs_main");

        let mut shader_functions = HashMap::new();
        shader_functions.insert(
            ShaderKind::Stencil,
            ShaderFunctions {
                vertex: function("stencil", "vs_main")?,
                fragment: Some(function("stencil", "fs_main")?),
            },
        );
        for (kind, name) in [
            (ShaderKind::VertexColor, "vertex_color"),
            (ShaderKind::Image, "image"),
            (ShaderKind::RcImage, "rc_image"),
            (ShaderKind::ResolveMask, "resolve_mask"),
            (ShaderKind::ColorMatrixImage, "color_matrix"),
            (ShaderKind::BlurImage, "blur"),
            (ShaderKind::BlendImage, "blend"),
        ] {
            shader_functions.insert(
                kind,
                ShaderFunctions {
                    vertex: vertex.clone(),
                    fragment: Some(fragment(name)?),
                },
            );
        }

        let layout1 = ShaderBindingSetLayout {
            bindings: vec![ShaderBinding::texture_sampler(0)],
        };
        let layout2 = ShaderBindingSetLayout {
            bindings: vec![
                ShaderBinding::texture_sampler(0),
                ShaderBinding::texture_sampler(1),
            ],
        };
        let Some(default_binding_set1) = device.make_shader_binding_set(&layout1) else {
            tracing::error!("PipelineStates: make_shader_binding_set failed");
            return None;
        };
        let Some(default_binding_set2) = device.make_shader_binding_set(&layout2) else {
            tracing::error!("PipelineStates: make_shader_binding_set failed");
            return None;
        };

        let Some(default_sampler) = device.make_sampler_state(&SamplerDescriptor::default())
        else {
            tracing::error!("PipelineStates: make_sampler_state failed");
            return None;
        };

        let Some(default_mask_texture) = device.make_texture(&TextureDescriptor::new_2d(
            PixelFormat::R8Unorm,
            2,
            2,
            TextureUsage::COPY_DESTINATION | TextureUsage::SAMPLED,
        )) else {
            tracing::error!("PipelineStates: make_texture failed");
            return None;
        };

        // Stage the all-open texels through a buffer and a copy encoder.
        // Rows are padded to the backend's copy alignment.
        let row_stride: u32 = 256;
        let staging_len = (row_stride * default_mask_texture.height()) as u64;
        let Some(staging) = device.make_buffer(
            staging_len,
            StorageMode::Shared,
            CpuCacheMode::WriteCombined,
        ) else {
            tracing::error!("PipelineStates: make_buffer failed");
            return None;
        };
        if !staging.write(0, &vec![1u8; staging_len as usize]) {
            tracing::error!("PipelineStates: staging upload failed");
            return None;
        }

        let Some(command_buffer) = queue.make_command_buffer() else {
            tracing::error!("PipelineStates: make_command_buffer failed");
            return None;
        };
        let Some(mut encoder) = command_buffer.make_copy_command_encoder() else {
            tracing::error!("PipelineStates: make_copy_command_encoder failed");
            return None;
        };
        encoder.copy_buffer_to_texture(
            &staging,
            BufferImageOrigin {
                offset: 0,
                image_width: row_stride,
                image_height: default_mask_texture.height(),
            },
            &default_mask_texture,
            TextureOrigin::default(),
            TextureSize::new(
                default_mask_texture.width(),
                default_mask_texture.height(),
                1,
            ),
        );
        encoder.end_encoding();
        if !command_buffer.commit() {
            tracing::error!("PipelineStates: commit failed");
            return None;
        }

        tracing::info!("PipelineStates created for queue ({})", device.name());

        Some(Arc::new(Self {
            device,
            shader_functions,
            default_binding_set1,
            default_binding_set2,
            default_sampler,
            default_mask_texture,
            caches: Mutex::new(Caches::default()),
        }))
    }

    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    /// Cached pipeline for the (shader, color format, depth format, blend
    /// state) combination, built on first use.
    pub fn render_state(
        &self,
        shader: ShaderKind,
        color_format: PixelFormat,
        depth_format: PixelFormat,
        blend_state: BlendState,
    ) -> Option<Arc<dyn RenderPipelineState>> {
        let key = RenderStateKey {
            shader,
            color_format,
            depth_format,
            blend_state,
        };

        let mut caches = self.caches.lock().unwrap();
        if let Some(state) = caches.render_states.get(&key) {
            return Some(state.clone());
        }

        let functions = self.shader_functions.get(&shader)?;

        let vertex_descriptor = if shader == ShaderKind::Stencil {
            VertexDescriptor {
                attributes: vec![VertexAttributeDescriptor {
                    format: VertexFormat::Float2,
                    offset: 0,
                    buffer_index: 0,
                    location: 0,
                }],
                layouts: vec![VertexBufferLayoutDescriptor {
                    step: VertexStepFunction::Vertex,
                    stride: std::mem::size_of::<[f32; 2]>() as u32,
                    buffer_index: 0,
                }],
            }
        } else {
            VertexDescriptor {
                attributes: vec![
                    VertexAttributeDescriptor {
                        format: VertexFormat::Float2,
                        offset: 0,
                        buffer_index: 0,
                        location: 0,
                    },
                    VertexAttributeDescriptor {
                        format: VertexFormat::Float2,
                        offset: 8,
                        buffer_index: 0,
                        location: 1,
                    },
                    VertexAttributeDescriptor {
                        format: VertexFormat::Float4,
                        offset: 16,
                        buffer_index: 0,
                        location: 2,
                    },
                ],
                layouts: vec![VertexBufferLayoutDescriptor {
                    step: VertexStepFunction::Vertex,
                    stride: std::mem::size_of::<Vertex>() as u32,
                    buffer_index: 0,
                }],
            }
        };

        let descriptor = RenderPipelineDescriptor {
            vertex_function: Some(functions.vertex.clone()),
            fragment_function: functions.fragment.clone(),
            vertex_descriptor,
            color_attachments: vec![RenderPipelineColorAttachmentDescriptor {
                index: 0,
                pixel_format: color_format,
                blend_state,
            }],
            depth_stencil_attachment_pixel_format: depth_format,
            primitive_topology: PrimitiveTopology::Triangle,
            triangle_fill_mode: TriangleFillMode::Fill,
        };

        let state = self.device.make_render_pipeline_state(&descriptor, None)?;
        caches.render_states.insert(key, state.clone());
        Some(state)
    }

    /// Cached depth/stencil object for one stencil mode.
    pub fn depth_stencil_state(&self, mode: StencilMode) -> Option<Arc<dyn DepthStencilState>> {
        let mut caches = self.caches.lock().unwrap();
        if let Some(state) = caches.depth_stencil_states.get(&mode) {
            return Some(state.clone());
        }

        let mut descriptor = DepthStencilDescriptor {
            depth_compare_function: CompareFunction::Always,
            is_depth_write_enabled: false,
            ..Default::default()
        };

        let both = |descriptor: &mut DepthStencilDescriptor, face: StencilDescriptor| {
            descriptor.front_face_stencil = face;
            descriptor.back_face_stencil = face;
        };

        match mode {
            StencilMode::MakeFill => {
                descriptor.front_face_stencil.depth_stencil_pass_operation =
                    StencilOperation::IncrementWrap;
                descriptor.back_face_stencil.depth_stencil_pass_operation =
                    StencilOperation::DecrementWrap;
            }
            StencilMode::MakeStroke => {
                let face = StencilDescriptor {
                    depth_stencil_pass_operation: StencilOperation::IncrementClamp,
                    ..Default::default()
                };
                both(&mut descriptor, face);
            }
            StencilMode::TestNonZero => {
                let face = StencilDescriptor {
                    stencil_compare_function: CompareFunction::NotEqual,
                    ..Default::default()
                };
                both(&mut descriptor, face);
            }
            StencilMode::TestEven => {
                let face = StencilDescriptor {
                    stencil_compare_function: CompareFunction::NotEqual,
                    read_mask: 1,
                    ..Default::default()
                };
                both(&mut descriptor, face);
            }
            StencilMode::TestZero => {
                let face = StencilDescriptor {
                    stencil_compare_function: CompareFunction::Equal,
                    ..Default::default()
                };
                both(&mut descriptor, face);
            }
            StencilMode::TestOdd => {
                let face = StencilDescriptor {
                    stencil_compare_function: CompareFunction::Equal,
                    read_mask: 1,
                    ..Default::default()
                };
                both(&mut descriptor, face);
            }
            StencilMode::Ignore => {}
        }

        let state = self.device.make_depth_stencil_state(&descriptor)?;
        caches.depth_stencil_states.insert(mode, state.clone());
        Some(state)
    }

    /// Uploads a slice of POD values into a fresh shared buffer.
    pub fn make_buffer<T: bytemuck::Pod>(&self, data: &[T]) -> Option<Arc<dyn GpuBuffer>> {
        if data.is_empty() {
            return None;
        }
        let bytes = bytemuck::cast_slice(data);
        let buffer = self.device.make_buffer(
            bytes.len() as u64,
            StorageMode::Shared,
            CpuCacheMode::WriteCombined,
        )?;
        if !buffer.write(0, bytes) {
            return None;
        }
        Some(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_pipeline_offsets() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(std::mem::offset_of!(Vertex, texcoord), 8);
        assert_eq!(std::mem::offset_of!(Vertex, color), 16);
    }
}
