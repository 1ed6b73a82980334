//! wgpu buffer resources

use super::DeviceShared;
use crate::buffer::GpuBuffer;
use crate::types::{CpuCacheMode, StorageMode};
use std::any::Any;
use std::sync::Arc;

pub struct WgpuBuffer {
    pub(crate) shared: Arc<DeviceShared>,
    pub(crate) buffer: wgpu::Buffer,
    length: u64,
    writable: bool,
}

impl WgpuBuffer {
    pub(crate) fn new(
        shared: Arc<DeviceShared>,
        length: u64,
        storage_mode: StorageMode,
        cpu_cache_mode: CpuCacheMode,
    ) -> Option<Self> {
        if length == 0 {
            tracing::error!("make_buffer failed: zero length");
            return None;
        }

        // Write-combined shared buffers are upload-only and usable as
        // vertex/index/uniform sources. Default cache mode buffers are
        // mappable for readback (wgpu allows MAP_READ only with COPY_DST).
        let usage = match (storage_mode, cpu_cache_mode) {
            (StorageMode::Shared, CpuCacheMode::Default) => {
                wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST
            }
            _ => {
                wgpu::BufferUsages::VERTEX
                    | wgpu::BufferUsages::INDEX
                    | wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST
            }
        };

        let buffer = shared.device.create_buffer(&wgpu::BufferDescriptor {
            label: None,
            size: length,
            usage,
            mapped_at_creation: false,
        });

        let writable = storage_mode == StorageMode::Shared;
        Some(Self {
            shared,
            buffer,
            length,
            writable,
        })
    }

    /// Synchronously reads the buffer contents back to the CPU. Only valid
    /// for buffers created with `CpuCacheMode::Default`; blocks until the
    /// GPU is idle.
    pub fn read_sync(&self) -> Option<Vec<u8>> {
        if !self.buffer.usage().contains(wgpu::BufferUsages::MAP_READ) {
            tracing::error!("read_sync failed: buffer is not mappable");
            return None;
        }
        let slice = self.buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = self.shared.device.poll(wgpu::Maintain::Wait);
        match receiver.recv() {
            Ok(Ok(())) => {
                let data = slice.get_mapped_range().to_vec();
                self.buffer.unmap();
                Some(data)
            }
            other => {
                tracing::error!("read_sync failed: map_async returned {other:?}");
                None
            }
        }
    }
}

impl GpuBuffer for WgpuBuffer {
    fn length(&self) -> u64 {
        self.length
    }

    fn write(&self, offset: u64, data: &[u8]) -> bool {
        if !self.writable {
            tracing::error!("buffer write failed: buffer is not CPU-writable");
            return false;
        }
        if offset + data.len() as u64 > self.length {
            tracing::error!(
                "buffer write failed: range {}..{} out of bounds (length {})",
                offset,
                offset + data.len() as u64,
                self.length
            );
            return false;
        }
        self.shared.queue.write_buffer(&self.buffer, offset, data);
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
