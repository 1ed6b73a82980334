//! wgpu render command encoding and replay
//!
//! Recording appends tagged commands; nothing touches wgpu until the owning
//! command buffer commits, when the command list is interpreted against a
//! small `ReplayState`. Pipeline resolution happens here because cull mode,
//! winding and the depth/stencil configuration are pipeline state in wgpu
//! and only known once the draw is replayed.

use super::binding::{BindingSnapshot, WgpuShaderBindingSet};
use super::buffer::WgpuBuffer;
use super::command_buffer::{Encoding, SyncLists, SyncOp, WgpuCommandBuffer};
use super::pipeline::{PipelineVariant, WgpuDepthStencilState, WgpuRenderPipelineState};
use super::sampler::WgpuSamplerState;
use super::texture::WgpuTexture;
use super::DeviceShared;
use crate::binding::ShaderBindingSet;
use crate::buffer::GpuBuffer;
use crate::depth_stencil::{DepthStencilDescriptor, DepthStencilState};
use crate::encoder::{CommandEncoder, RenderCommandEncoder};
use crate::event::{GpuEvent, GpuSemaphore};
use crate::render_pass::{LoadAction, RenderPassDescriptor, StoreAction};
use crate::render_pipeline::RenderPipelineState;
use crate::sampler::SamplerState;
use crate::shader::ShaderStageFlags;
use crate::texture::Texture;
use crate::types::{CullMode, IndexType, ScissorRect, Viewport, Winding};
use std::num::NonZeroU64;
use std::sync::Arc;

pub(crate) enum RenderCommand {
    SetPipeline(Arc<WgpuRenderPipelineState>),
    SetDepthStencil(Option<DepthStencilDescriptor>),
    SetViewport(Viewport),
    SetScissorRect(ScissorRect),
    SetResource {
        index: u32,
        snapshot: BindingSnapshot,
    },
    SetVertexBuffer {
        buffer: Arc<dyn GpuBuffer>,
        offset: u64,
        index: u32,
    },
    SetCullMode(CullMode),
    SetFrontFacing(Winding),
    SetBlendColor([f32; 4]),
    SetStencilReference(u32),
    PushConstant {
        stages: ShaderStageFlags,
        offset: u32,
        data: Vec<u8>,
    },
    Draw {
        vertex_start: u32,
        vertex_count: u32,
        instance_count: u32,
        base_instance: u32,
    },
    DrawIndexed {
        index_count: u32,
        index_type: IndexType,
        index_buffer: Arc<dyn GpuBuffer>,
        index_buffer_offset: u64,
        instance_count: u32,
        base_vertex: i32,
        base_instance: u32,
    },
}

pub(crate) struct RenderEncoding {
    pub descriptor: RenderPassDescriptor,
    pub commands: Vec<RenderCommand>,
    pub sync: SyncLists,
}

pub struct WgpuRenderCommandEncoder {
    buffer: Arc<WgpuCommandBuffer>,
    encoding: Option<RenderEncoding>,
}

impl WgpuRenderCommandEncoder {
    pub(crate) fn new(buffer: Arc<WgpuCommandBuffer>, descriptor: &RenderPassDescriptor) -> Self {
        Self {
            buffer,
            encoding: Some(RenderEncoding {
                descriptor: descriptor.clone(),
                commands: Vec::with_capacity(128),
                sync: SyncLists::default(),
            }),
        }
    }

    fn record(&mut self, command: RenderCommand) {
        debug_assert!(self.encoding.is_some(), "encoder used after end_encoding");
        if let Some(encoding) = &mut self.encoding {
            encoding.commands.push(command);
        }
    }
}

impl CommandEncoder for WgpuRenderCommandEncoder {
    fn end_encoding(&mut self) {
        debug_assert!(self.encoding.is_some(), "end_encoding called twice");
        if let Some(encoding) = self.encoding.take() {
            self.buffer.end_encoder(Encoding::Render(encoding));
        }
    }

    fn is_ended(&self) -> bool {
        self.encoding.is_none()
    }

    fn wait_event(&mut self, event: &Arc<dyn GpuEvent>) {
        if let Some(encoding) = &mut self.encoding {
            encoding.sync.waits.push(SyncOp::Event(event.clone()));
        }
    }

    fn signal_event(&mut self, event: &Arc<dyn GpuEvent>) {
        if let Some(encoding) = &mut self.encoding {
            encoding.sync.signals.push(SyncOp::Event(event.clone()));
        }
    }

    fn wait_semaphore_value(&mut self, semaphore: &Arc<dyn GpuSemaphore>, value: u64) {
        if let Some(encoding) = &mut self.encoding {
            encoding
                .sync
                .wait_semaphore(SyncOp::Semaphore(semaphore.clone(), value));
        }
    }

    fn signal_semaphore_value(&mut self, semaphore: &Arc<dyn GpuSemaphore>, value: u64) {
        if let Some(encoding) = &mut self.encoding {
            encoding
                .sync
                .signal_semaphore(SyncOp::Semaphore(semaphore.clone(), value));
        }
    }
}

impl Drop for WgpuRenderCommandEncoder {
    fn drop(&mut self) {
        if self.encoding.take().is_some() {
            tracing::warn!("render command encoder dropped without end_encoding; block discarded");
            self.buffer.abort_encoder();
        }
    }
}

impl RenderCommandEncoder for WgpuRenderCommandEncoder {
    fn set_render_pipeline_state(&mut self, pipeline: &Arc<dyn RenderPipelineState>) {
        let Ok(pipeline) = pipeline
            .clone()
            .as_any_arc()
            .downcast::<WgpuRenderPipelineState>()
        else {
            debug_assert!(false, "pipeline state from a different backend");
            return;
        };
        self.record(RenderCommand::SetPipeline(pipeline));
    }

    fn set_depth_stencil_state(&mut self, state: Option<&Arc<dyn DepthStencilState>>) {
        let descriptor = state.map(|s| {
            debug_assert!(
                s.as_any().is::<WgpuDepthStencilState>(),
                "depth-stencil state from a different backend"
            );
            *s.descriptor()
        });
        self.record(RenderCommand::SetDepthStencil(descriptor));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.record(RenderCommand::SetViewport(viewport));
    }

    fn set_scissor_rect(&mut self, rect: ScissorRect) {
        self.record(RenderCommand::SetScissorRect(rect));
    }

    fn set_resource(&mut self, index: u32, binding_set: &Arc<dyn ShaderBindingSet>) {
        let Some(set) = binding_set.as_any().downcast_ref::<WgpuShaderBindingSet>() else {
            debug_assert!(false, "binding set from a different backend");
            return;
        };
        // Resources are copied now; later mutation of the binding set does
        // not affect this draw.
        self.record(RenderCommand::SetResource {
            index,
            snapshot: set.snapshot(),
        });
    }

    fn set_vertex_buffer(&mut self, buffer: &Arc<dyn GpuBuffer>, offset: u64, index: u32) {
        debug_assert!(
            buffer.as_any().is::<WgpuBuffer>(),
            "buffer from a different backend"
        );
        self.record(RenderCommand::SetVertexBuffer {
            buffer: buffer.clone(),
            offset,
            index,
        });
    }

    fn set_cull_mode(&mut self, mode: CullMode) {
        self.record(RenderCommand::SetCullMode(mode));
    }

    fn set_front_facing(&mut self, winding: Winding) {
        self.record(RenderCommand::SetFrontFacing(winding));
    }

    fn set_blend_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.record(RenderCommand::SetBlendColor([red, green, blue, alpha]));
    }

    fn set_stencil_reference_value(&mut self, value: u32) {
        self.record(RenderCommand::SetStencilReference(value));
    }

    fn push_constant(&mut self, stages: ShaderStageFlags, offset: u32, data: &[u8]) {
        if data.is_empty() || (stages & (ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT)).is_empty() {
            return;
        }
        self.record(RenderCommand::PushConstant {
            stages,
            offset,
            data: data.to_vec(),
        });
    }

    fn draw(&mut self, vertex_start: u32, vertex_count: u32, instance_count: u32, base_instance: u32) {
        self.record(RenderCommand::Draw {
            vertex_start,
            vertex_count,
            instance_count,
            base_instance,
        });
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        index_type: IndexType,
        index_buffer: &Arc<dyn GpuBuffer>,
        index_buffer_offset: u64,
        instance_count: u32,
        base_vertex: i32,
        base_instance: u32,
    ) {
        debug_assert!(
            index_buffer.as_any().is::<WgpuBuffer>(),
            "index buffer from a different backend"
        );
        self.record(RenderCommand::DrawIndexed {
            index_count,
            index_type,
            index_buffer: index_buffer.clone(),
            index_buffer_offset,
            instance_count,
            base_vertex,
            base_instance,
        });
    }
}

/// Mutable state threaded through command interpretation.
#[derive(Default)]
struct ReplayState {
    pipeline: Option<Arc<WgpuRenderPipelineState>>,
    resolved: bool,
    depth_stencil: Option<DepthStencilDescriptor>,
    cull_mode: CullMode,
    winding: Winding,
    push_constants: Vec<u8>,
    bindings: Vec<Option<BindingSnapshot>>,
}

fn apply_bind_group(
    shared: &DeviceShared,
    pass: &mut wgpu::RenderPass,
    pipeline: &WgpuRenderPipelineState,
    index: u32,
    snapshot: &BindingSnapshot,
) -> bool {
    let Some(layout) = pipeline.bind_group_layouts.get(index as usize) else {
        tracing::error!("set_resource: binding-set index {index} not used by bound pipeline");
        return false;
    };

    let mut entries: Vec<wgpu::BindGroupEntry> = Vec::new();
    for (binding, texture) in &snapshot.textures {
        let Some(texture) = texture.as_any().downcast_ref::<WgpuTexture>() else {
            tracing::error!("set_resource: texture from a different backend");
            return false;
        };
        entries.push(wgpu::BindGroupEntry {
            binding: binding * 2,
            resource: wgpu::BindingResource::TextureView(&texture.view),
        });
    }
    for (binding, sampler) in &snapshot.samplers {
        let Some(sampler) = sampler.as_any().downcast_ref::<WgpuSamplerState>() else {
            tracing::error!("set_resource: sampler from a different backend");
            return false;
        };
        entries.push(wgpu::BindGroupEntry {
            binding: binding * 2 + 1,
            resource: wgpu::BindingResource::Sampler(&sampler.sampler),
        });
    }
    for (binding, buffer, offset, length) in &snapshot.buffers {
        let Some(buffer) = buffer.as_any().downcast_ref::<WgpuBuffer>() else {
            tracing::error!("set_resource: buffer from a different backend");
            return false;
        };
        entries.push(wgpu::BindGroupEntry {
            binding: binding * 2,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer.buffer,
                offset: *offset,
                size: NonZeroU64::new(*length),
            }),
        });
    }

    let bind_group = shared.device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: None,
        layout,
        entries: &entries,
    });
    pass.set_bind_group(index, &bind_group, &[]);
    true
}

impl ReplayState {
    /// Resolves and binds the concrete pipeline variant, then re-applies the
    /// resources and push constants recorded so far.
    fn ensure_pipeline(
        &mut self,
        shared: &DeviceShared,
        pass: &mut wgpu::RenderPass,
    ) -> bool {
        if self.resolved {
            return true;
        }
        let Some(pipeline) = self.pipeline.clone() else {
            tracing::error!("draw recorded with no pipeline state bound");
            return false;
        };
        let Some(concrete) = pipeline.variant(&PipelineVariant {
            depth_stencil: self.depth_stencil,
            cull_mode: self.cull_mode,
            winding: self.winding,
        }) else {
            return false;
        };
        pass.set_pipeline(&concrete);
        self.resolved = true;

        for (index, snapshot) in self.bindings.iter().enumerate() {
            if let Some(snapshot) = snapshot {
                if !apply_bind_group(shared, pass, &pipeline, index as u32, snapshot) {
                    return false;
                }
            }
        }
        if pipeline.push_constant_size > 0 && !self.push_constants.is_empty() {
            self.push_constants
                .resize(pipeline.push_constant_size as usize, 0);
            pass.set_push_constants(pipeline.push_constant_stages, 0, &self.push_constants);
        }
        true
    }
}

pub(crate) fn replay_render(
    shared: &Arc<DeviceShared>,
    encoder: &mut wgpu::CommandEncoder,
    encoding: &RenderEncoding,
) -> bool {
    let mut color_views: Vec<(&wgpu::TextureView, LoadAction, StoreAction, lumo_core::Color)> =
        Vec::new();
    for attachment in &encoding.descriptor.color_attachments {
        let Some(texture) = attachment.render_target.as_any().downcast_ref::<WgpuTexture>() else {
            tracing::error!("render pass color attachment from a different backend");
            return false;
        };
        color_views.push((
            &texture.view,
            attachment.load_action,
            attachment.store_action,
            attachment.clear_color,
        ));
    }

    let load_op = |action: LoadAction, clear: lumo_core::Color| match action {
        LoadAction::Clear => wgpu::LoadOp::Clear(wgpu::Color {
            r: clear.r as f64,
            g: clear.g as f64,
            b: clear.b as f64,
            a: clear.a as f64,
        }),
        _ => wgpu::LoadOp::Load,
    };
    let store_op = |action: StoreAction| match action {
        StoreAction::Store => wgpu::StoreOp::Store,
        StoreAction::DontCare => wgpu::StoreOp::Discard,
    };

    let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = color_views
        .iter()
        .map(|(view, load, store, clear)| {
            Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: load_op(*load, *clear),
                    store: store_op(*store),
                },
            })
        })
        .collect();

    let ds = &encoding.descriptor.depth_stencil_attachment;
    let mut depth_stencil_attachment = None;
    if let Some(target) = &ds.render_target {
        let Some(texture) = target.as_any().downcast_ref::<WgpuTexture>() else {
            tracing::error!("render pass depth/stencil attachment from a different backend");
            return false;
        };
        let format = texture.pixel_format();
        let depth_ops = format.has_depth().then_some(wgpu::Operations {
            load: match ds.load_action {
                LoadAction::Clear => wgpu::LoadOp::Clear(ds.clear_depth),
                _ => wgpu::LoadOp::Load,
            },
            store: store_op(ds.store_action),
        });
        let stencil_ops = format.has_stencil().then_some(wgpu::Operations {
            load: match ds.load_action {
                LoadAction::Clear => wgpu::LoadOp::Clear(ds.clear_stencil),
                _ => wgpu::LoadOp::Load,
            },
            store: store_op(ds.store_action),
        });
        depth_stencil_attachment = Some(wgpu::RenderPassDepthStencilAttachment {
            view: &texture.view,
            depth_ops,
            stencil_ops,
        });
    }

    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: None,
        color_attachments: &color_attachments,
        depth_stencil_attachment,
        timestamp_writes: None,
        occlusion_query_set: None,
    });

    let mut state = ReplayState::default();
    for command in &encoding.commands {
        match command {
            RenderCommand::SetPipeline(pipeline) => {
                state.pipeline = Some(pipeline.clone());
                state.resolved = false;
            }
            RenderCommand::SetDepthStencil(descriptor) => {
                if state.depth_stencil != *descriptor {
                    state.depth_stencil = *descriptor;
                    state.resolved = false;
                }
            }
            RenderCommand::SetViewport(v) => {
                pass.set_viewport(v.x, v.y, v.width, v.height, v.near_z, v.far_z);
            }
            RenderCommand::SetScissorRect(r) => {
                pass.set_scissor_rect(r.x, r.y, r.width, r.height);
            }
            RenderCommand::SetResource { index, snapshot } => {
                let index = *index as usize;
                if state.bindings.len() <= index {
                    state.bindings.resize_with(index + 1, || None);
                }
                state.bindings[index] = Some(snapshot.clone());
                if state.resolved {
                    let pipeline = state.pipeline.clone().unwrap();
                    if !apply_bind_group(shared, &mut pass, &pipeline, index as u32, snapshot) {
                        return false;
                    }
                }
            }
            RenderCommand::SetVertexBuffer {
                buffer,
                offset,
                index,
            } => {
                let Some(buffer) = buffer.as_any().downcast_ref::<WgpuBuffer>() else {
                    tracing::error!("vertex buffer from a different backend");
                    return false;
                };
                pass.set_vertex_buffer(*index, buffer.buffer.slice(*offset..));
            }
            RenderCommand::SetCullMode(mode) => {
                if state.cull_mode != *mode {
                    state.cull_mode = *mode;
                    state.resolved = false;
                }
            }
            RenderCommand::SetFrontFacing(winding) => {
                if state.winding != *winding {
                    state.winding = *winding;
                    state.resolved = false;
                }
            }
            RenderCommand::SetBlendColor([r, g, b, a]) => {
                pass.set_blend_constant(wgpu::Color {
                    r: *r as f64,
                    g: *g as f64,
                    b: *b as f64,
                    a: *a as f64,
                });
            }
            RenderCommand::SetStencilReference(value) => {
                pass.set_stencil_reference(*value);
            }
            RenderCommand::PushConstant { offset, data, .. } => {
                if !state.ensure_pipeline(shared, &mut pass) {
                    return false;
                }
                let (declared_size, declared_stages) = {
                    let pipeline = state.pipeline.as_ref().unwrap();
                    (pipeline.push_constant_size, pipeline.push_constant_stages)
                };
                if declared_size == 0 {
                    tracing::error!("push constant recorded for a pipeline with no block");
                    return false;
                }
                // Grow to hold the new bytes, copy, then pad to the declared
                // block size so incremental uploads always submit the full
                // buffer.
                let end = *offset as usize + data.len();
                if state.push_constants.len() < end {
                    state.push_constants.resize(end, 0);
                }
                state.push_constants[*offset as usize..end].copy_from_slice(data);
                state.push_constants.resize(declared_size as usize, 0);
                pass.set_push_constants(declared_stages, 0, &state.push_constants);
            }
            RenderCommand::Draw {
                vertex_start,
                vertex_count,
                instance_count,
                base_instance,
            } => {
                if !state.ensure_pipeline(shared, &mut pass) {
                    return false;
                }
                pass.draw(
                    *vertex_start..vertex_start + vertex_count,
                    *base_instance..base_instance + instance_count,
                );
            }
            RenderCommand::DrawIndexed {
                index_count,
                index_type,
                index_buffer,
                index_buffer_offset,
                instance_count,
                base_vertex,
                base_instance,
            } => {
                if !state.ensure_pipeline(shared, &mut pass) {
                    return false;
                }
                let Some(buffer) = index_buffer.as_any().downcast_ref::<WgpuBuffer>() else {
                    tracing::error!("index buffer from a different backend");
                    return false;
                };
                pass.set_index_buffer(
                    buffer.buffer.slice(*index_buffer_offset..),
                    super::convert::index_format(*index_type),
                );
                pass.draw_indexed(
                    0..*index_count,
                    *base_vertex,
                    *base_instance..base_instance + instance_count,
                );
            }
        }
    }
    true
}
