//! wgpu copy command encoding and replay

use super::buffer::WgpuBuffer;
use super::command_buffer::{Encoding, SyncLists, SyncOp, WgpuCommandBuffer};
use super::texture::WgpuTexture;
use crate::buffer::GpuBuffer;
use crate::encoder::{CommandEncoder, CopyCommandEncoder};
use crate::event::{GpuEvent, GpuSemaphore};
use crate::texture::Texture;
use crate::types::{BufferImageOrigin, TextureOrigin, TextureSize};
use std::sync::Arc;

pub(crate) enum CopyCommand {
    CopyBuffer {
        source: Arc<dyn GpuBuffer>,
        source_offset: u64,
        destination: Arc<dyn GpuBuffer>,
        destination_offset: u64,
        size: u64,
    },
    CopyBufferToTexture {
        source: Arc<dyn GpuBuffer>,
        source_offset: BufferImageOrigin,
        destination: Arc<dyn Texture>,
        destination_offset: TextureOrigin,
        size: TextureSize,
    },
    CopyTextureToBuffer {
        source: Arc<dyn Texture>,
        source_offset: TextureOrigin,
        destination: Arc<dyn GpuBuffer>,
        destination_offset: BufferImageOrigin,
        size: TextureSize,
    },
    CopyTexture {
        source: Arc<dyn Texture>,
        source_offset: TextureOrigin,
        destination: Arc<dyn Texture>,
        destination_offset: TextureOrigin,
        size: TextureSize,
    },
}

pub(crate) struct CopyEncoding {
    pub commands: Vec<CopyCommand>,
    pub sync: SyncLists,
}

pub struct WgpuCopyCommandEncoder {
    buffer: Arc<WgpuCommandBuffer>,
    encoding: Option<CopyEncoding>,
}

impl WgpuCopyCommandEncoder {
    pub(crate) fn new(buffer: Arc<WgpuCommandBuffer>) -> Self {
        Self {
            buffer,
            encoding: Some(CopyEncoding {
                commands: Vec::with_capacity(16),
                sync: SyncLists::default(),
            }),
        }
    }

    fn record(&mut self, command: CopyCommand) {
        debug_assert!(self.encoding.is_some(), "encoder used after end_encoding");
        if let Some(encoding) = &mut self.encoding {
            encoding.commands.push(command);
        }
    }
}

impl CommandEncoder for WgpuCopyCommandEncoder {
    fn end_encoding(&mut self) {
        debug_assert!(self.encoding.is_some(), "end_encoding called twice");
        if let Some(encoding) = self.encoding.take() {
            self.buffer.end_encoder(Encoding::Copy(encoding));
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

impl Drop for WgpuCopyCommandEncoder {
    fn drop(&mut self) {
        if self.encoding.take().is_some() {
            tracing::warn!("copy command encoder dropped without end_encoding; block discarded");
            self.buffer.abort_encoder();
        }
    }
}

impl CopyCommandEncoder for WgpuCopyCommandEncoder {
    fn copy_buffer(
        &mut self,
        source: &Arc<dyn GpuBuffer>,
        source_offset: u64,
        destination: &Arc<dyn GpuBuffer>,
        destination_offset: u64,
        size: u64,
    ) {
        self.record(CopyCommand::CopyBuffer {
            source: source.clone(),
            source_offset,
            destination: destination.clone(),
            destination_offset,
            size,
        });
    }

    fn copy_buffer_to_texture(
        &mut self,
        source: &Arc<dyn GpuBuffer>,
        source_offset: BufferImageOrigin,
        destination: &Arc<dyn Texture>,
        destination_offset: TextureOrigin,
        size: TextureSize,
    ) {
        self.record(CopyCommand::CopyBufferToTexture {
            source: source.clone(),
            source_offset,
            destination: destination.clone(),
            destination_offset,
            size,
        });
    }

    fn copy_texture_to_buffer(
        &mut self,
        source: &Arc<dyn Texture>,
        source_offset: TextureOrigin,
        destination: &Arc<dyn GpuBuffer>,
        destination_offset: BufferImageOrigin,
        size: TextureSize,
    ) {
        self.record(CopyCommand::CopyTextureToBuffer {
            source: source.clone(),
            source_offset,
            destination: destination.clone(),
            destination_offset,
            size,
        });
    }

    fn copy_texture(
        &mut self,
        source: &Arc<dyn Texture>,
        source_offset: TextureOrigin,
        destination: &Arc<dyn Texture>,
        destination_offset: TextureOrigin,
        size: TextureSize,
    ) {
        self.record(CopyCommand::CopyTexture {
            source: source.clone(),
            source_offset,
            destination: destination.clone(),
            destination_offset,
            size,
        });
    }
}

fn origin(o: &TextureOrigin, is_3d: bool) -> wgpu::Origin3d {
    wgpu::Origin3d {
        x: o.x,
        y: o.y,
        z: if is_3d { o.z } else { o.layer },
    }
}

/// Byte layout of a buffer-side copy operand. wgpu requires 256-byte row
/// alignment for multi-row copies; the staging buffer layout is the
/// caller's responsibility.
fn data_layout(
    origin: &BufferImageOrigin,
    texture: &WgpuTexture,
    rows: u32,
) -> Option<wgpu::ImageDataLayout> {
    let Some(bpp) = texture.pixel_format().bytes_per_pixel() else {
        tracing::error!("copy failed: texture format has no fixed texel size");
        return None;
    };
    let bytes_per_row = origin.image_width * bpp;
    if rows > 1 && bytes_per_row % wgpu::COPY_BYTES_PER_ROW_ALIGNMENT != 0 {
        tracing::error!(
            "copy failed: row stride {bytes_per_row} not aligned to {}",
            wgpu::COPY_BYTES_PER_ROW_ALIGNMENT
        );
        return None;
    }
    Some(wgpu::ImageDataLayout {
        offset: origin.offset,
        bytes_per_row: Some(bytes_per_row),
        rows_per_image: Some(origin.image_height),
    })
}

pub(crate) fn replay_copy(encoder: &mut wgpu::CommandEncoder, encoding: &CopyEncoding) -> bool {
    for command in &encoding.commands {
        match command {
            CopyCommand::CopyBuffer {
                source,
                source_offset,
                destination,
                destination_offset,
                size,
            } => {
                let (Some(src), Some(dst)) = (
                    source.as_any().downcast_ref::<WgpuBuffer>(),
                    destination.as_any().downcast_ref::<WgpuBuffer>(),
                ) else {
                    tracing::error!("copy_buffer: buffer from a different backend");
                    return false;
                };
                encoder.copy_buffer_to_buffer(
                    &src.buffer,
                    *source_offset,
                    &dst.buffer,
                    *destination_offset,
                    *size,
                );
            }
            CopyCommand::CopyBufferToTexture {
                source,
                source_offset,
                destination,
                destination_offset,
                size,
            } => {
                let (Some(src), Some(dst)) = (
                    source.as_any().downcast_ref::<WgpuBuffer>(),
                    destination.as_any().downcast_ref::<WgpuTexture>(),
                ) else {
                    tracing::error!("copy_buffer_to_texture: resource from a different backend");
                    return false;
                };
                let Some(layout) = data_layout(source_offset, dst, size.height) else {
                    return false;
                };
                encoder.copy_buffer_to_texture(
                    wgpu::ImageCopyBuffer {
                        buffer: &src.buffer,
                        layout,
                    },
                    wgpu::ImageCopyTexture {
                        texture: &dst.texture,
                        mip_level: destination_offset.level,
                        origin: origin(destination_offset, size.depth > 1),
                        aspect: wgpu::TextureAspect::All,
                    },
                    wgpu::Extent3d {
                        width: size.width,
                        height: size.height,
                        depth_or_array_layers: size.depth,
                    },
                );
            }
            CopyCommand::CopyTextureToBuffer {
                source,
                source_offset,
                destination,
                destination_offset,
                size,
            } => {
                let (Some(src), Some(dst)) = (
                    source.as_any().downcast_ref::<WgpuTexture>(),
                    destination.as_any().downcast_ref::<WgpuBuffer>(),
                ) else {
                    tracing::error!("copy_texture_to_buffer: resource from a different backend");
                    return false;
                };
                let Some(layout) = data_layout(destination_offset, src, size.height) else {
                    return false;
                };
                encoder.copy_texture_to_buffer(
                    wgpu::ImageCopyTexture {
                        texture: &src.texture,
                        mip_level: source_offset.level,
                        origin: origin(source_offset, size.depth > 1),
                        aspect: wgpu::TextureAspect::All,
                    },
                    wgpu::ImageCopyBuffer {
                        buffer: &dst.buffer,
                        layout,
                    },
                    wgpu::Extent3d {
                        width: size.width,
                        height: size.height,
                        depth_or_array_layers: size.depth,
                    },
                );
            }
            CopyCommand::CopyTexture {
                source,
                source_offset,
                destination,
                destination_offset,
                size,
            } => {
                let (Some(src), Some(dst)) = (
                    source.as_any().downcast_ref::<WgpuTexture>(),
                    destination.as_any().downcast_ref::<WgpuTexture>(),
                ) else {
                    tracing::error!("copy_texture: texture from a different backend");
                    return false;
                };
                let is_3d = size.depth > 1;
                encoder.copy_texture_to_texture(
                    wgpu::ImageCopyTexture {
                        texture: &src.texture,
                        mip_level: source_offset.level,
                        origin: origin(source_offset, is_3d),
                        aspect: wgpu::TextureAspect::All,
                    },
                    wgpu::ImageCopyTexture {
                        texture: &dst.texture,
                        mip_level: destination_offset.level,
                        origin: origin(destination_offset, is_3d),
                        aspect: wgpu::TextureAspect::All,
                    },
                    wgpu::Extent3d {
                        width: size.width,
                        height: size.height,
                        depth_or_array_layers: size.depth,
                    },
                );
            }
        }
    }
    true
}
