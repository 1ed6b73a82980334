//! wgpu compute command encoding and replay

use super::binding::{BindingSnapshot, WgpuShaderBindingSet};
use super::buffer::WgpuBuffer;
use super::command_buffer::{Encoding, SyncLists, SyncOp, WgpuCommandBuffer};
use super::pipeline::WgpuComputePipelineState;
use super::sampler::WgpuSamplerState;
use super::texture::WgpuTexture;
use super::DeviceShared;
use crate::binding::ShaderBindingSet;
use crate::encoder::{CommandEncoder, ComputeCommandEncoder};
use crate::event::{GpuEvent, GpuSemaphore};
use crate::render_pipeline::ComputePipelineState;
use crate::sampler::SamplerState;
use crate::shader::ShaderStageFlags;
use crate::texture::Texture;
use std::num::NonZeroU64;
use std::sync::Arc;

pub(crate) enum ComputeCommand {
    SetPipeline(Arc<WgpuComputePipelineState>),
    SetResource { index: u32, snapshot: BindingSnapshot },
    PushConstant { offset: u32, data: Vec<u8> },
    Dispatch { x: u32, y: u32, z: u32 },
}

pub(crate) struct ComputeEncoding {
    pub commands: Vec<ComputeCommand>,
    pub sync: SyncLists,
}

pub struct WgpuComputeCommandEncoder {
    buffer: Arc<WgpuCommandBuffer>,
    encoding: Option<ComputeEncoding>,
}

impl WgpuComputeCommandEncoder {
    pub(crate) fn new(buffer: Arc<WgpuCommandBuffer>) -> Self {
        Self {
            buffer,
            encoding: Some(ComputeEncoding {
                commands: Vec::with_capacity(128),
                sync: SyncLists::default(),
            }),
        }
    }

    fn record(&mut self, command: ComputeCommand) {
        debug_assert!(self.encoding.is_some(), "encoder used after end_encoding");
        if let Some(encoding) = &mut self.encoding {
            encoding.commands.push(command);
        }
    }
}

impl CommandEncoder for WgpuComputeCommandEncoder {
    fn end_encoding(&mut self) {
        debug_assert!(self.encoding.is_some(), "end_encoding called twice");
        if let Some(encoding) = self.encoding.take() {
            self.buffer.end_encoder(Encoding::Compute(encoding));
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

impl Drop for WgpuComputeCommandEncoder {
    fn drop(&mut self) {
        if self.encoding.take().is_some() {
            tracing::warn!("compute command encoder dropped without end_encoding; block discarded");
            self.buffer.abort_encoder();
        }
    }
}

impl ComputeCommandEncoder for WgpuComputeCommandEncoder {
    fn set_compute_pipeline_state(&mut self, pipeline: &Arc<dyn ComputePipelineState>) {
        let Ok(pipeline) = pipeline
            .clone()
            .as_any_arc()
            .downcast::<WgpuComputePipelineState>()
        else {
            debug_assert!(false, "pipeline state from a different backend");
            return;
        };
        self.record(ComputeCommand::SetPipeline(pipeline));
    }

    fn set_resource(&mut self, index: u32, binding_set: &Arc<dyn ShaderBindingSet>) {
        let Some(set) = binding_set.as_any().downcast_ref::<WgpuShaderBindingSet>() else {
            debug_assert!(false, "binding set from a different backend");
            return;
        };
        self.record(ComputeCommand::SetResource {
            index,
            snapshot: set.snapshot(),
        });
    }

    fn push_constant(&mut self, stages: ShaderStageFlags, offset: u32, data: &[u8]) {
        if data.is_empty() || !stages.contains(ShaderStageFlags::COMPUTE) {
            return;
        }
        self.record(ComputeCommand::PushConstant {
            offset,
            data: data.to_vec(),
        });
    }

    fn dispatch(&mut self, workgroups_x: u32, workgroups_y: u32, workgroups_z: u32) {
        self.record(ComputeCommand::Dispatch {
            x: workgroups_x,
            y: workgroups_y,
            z: workgroups_z,
        });
    }
}

fn apply_bind_group(
    shared: &DeviceShared,
    pass: &mut wgpu::ComputePass,
    pipeline: &WgpuComputePipelineState,
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
            return false;
        };
        entries.push(wgpu::BindGroupEntry {
            binding: binding * 2,
            resource: wgpu::BindingResource::TextureView(&texture.view),
        });
    }
    for (binding, sampler) in &snapshot.samplers {
        let Some(sampler) = sampler.as_any().downcast_ref::<WgpuSamplerState>() else {
            return false;
        };
        entries.push(wgpu::BindGroupEntry {
            binding: binding * 2 + 1,
            resource: wgpu::BindingResource::Sampler(&sampler.sampler),
        });
    }
    for (binding, buffer, offset, length) in &snapshot.buffers {
        let Some(buffer) = buffer.as_any().downcast_ref::<WgpuBuffer>() else {
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

pub(crate) fn replay_compute(
    shared: &Arc<DeviceShared>,
    encoder: &mut wgpu::CommandEncoder,
    encoding: &ComputeEncoding,
) -> bool {
    let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor::default());

    let mut pipeline: Option<Arc<WgpuComputePipelineState>> = None;
    let mut push_constants: Vec<u8> = Vec::new();

    for command in &encoding.commands {
        match command {
            ComputeCommand::SetPipeline(p) => {
                pass.set_pipeline(&p.pipeline);
                pipeline = Some(p.clone());
            }
            ComputeCommand::SetResource { index, snapshot } => {
                let Some(pipeline) = &pipeline else {
                    tracing::error!("set_resource recorded with no compute pipeline bound");
                    return false;
                };
                if !apply_bind_group(shared, &mut pass, pipeline, *index, snapshot) {
                    return false;
                }
            }
            ComputeCommand::PushConstant { offset, data } => {
                let Some(pipeline) = &pipeline else {
                    tracing::error!("push constant recorded with no compute pipeline bound");
                    return false;
                };
                if pipeline.push_constant_size == 0 {
                    tracing::error!("push constant recorded for a pipeline with no block");
                    return false;
                }
                let end = *offset as usize + data.len();
                if push_constants.len() < end {
                    push_constants.resize(end, 0);
                }
                push_constants[*offset as usize..end].copy_from_slice(data);
                push_constants.resize(pipeline.push_constant_size as usize, 0);
                pass.set_push_constants(0, &push_constants);
            }
            ComputeCommand::Dispatch { x, y, z } => {
                if pipeline.is_none() {
                    tracing::error!("dispatch recorded with no compute pipeline bound");
                    return false;
                }
                pass.dispatch_workgroups(*x, *y, *z);
            }
        }
    }
    true
}
