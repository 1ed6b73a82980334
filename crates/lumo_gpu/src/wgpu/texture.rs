//! wgpu texture resources

use super::convert;
use super::DeviceShared;
use crate::pixel_format::PixelFormat;
use crate::texture::{Texture, TextureDescriptor, TextureType, TextureUsage};
use std::any::Any;
use std::sync::Arc;

pub struct WgpuTexture {
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    texture_type: TextureType,
    pixel_format: PixelFormat,
    usage: TextureUsage,
}

impl WgpuTexture {
    pub(crate) fn new(shared: &Arc<DeviceShared>, descriptor: &TextureDescriptor) -> Option<Self> {
        let Some(format) = convert::texture_format(descriptor.pixel_format) else {
            tracing::error!("make_texture failed: invalid pixel format");
            return None;
        };
        if descriptor.array_length == 0 {
            tracing::error!("make_texture failed: zero array length");
            return None;
        }
        if descriptor.width == 0 || descriptor.height == 0 || descriptor.depth == 0 {
            tracing::error!(
                "make_texture failed: invalid dimensions {}x{}x{}",
                descriptor.width,
                descriptor.height,
                descriptor.depth
            );
            return None;
        }

        let (dimension, depth_or_array_layers) = match descriptor.texture_type {
            TextureType::Type1D => (wgpu::TextureDimension::D1, descriptor.array_length),
            TextureType::Type2D => (wgpu::TextureDimension::D2, descriptor.array_length),
            TextureType::Type3D => (wgpu::TextureDimension::D3, descriptor.depth),
        };

        let texture = shared.device.create_texture(&wgpu::TextureDescriptor {
            label: None,
            size: wgpu::Extent3d {
                width: descriptor.width,
                height: descriptor.height,
                depth_or_array_layers,
            },
            mip_level_count: descriptor.mipmap_levels.max(1),
            sample_count: descriptor.sample_count.max(1),
            dimension,
            format,
            usage: convert::texture_usages(descriptor.usage),
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Some(Self {
            texture,
            view,
            texture_type: descriptor.texture_type,
            pixel_format: descriptor.pixel_format,
            usage: descriptor.usage,
        })
    }
}

impl Texture for WgpuTexture {
    fn texture_type(&self) -> TextureType {
        self.texture_type
    }

    fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    fn width(&self) -> u32 {
        self.texture.width()
    }

    fn height(&self) -> u32 {
        self.texture.height()
    }

    fn depth(&self) -> u32 {
        if self.texture_type == TextureType::Type3D {
            self.texture.depth_or_array_layers()
        } else {
            1
        }
    }

    fn usage(&self) -> TextureUsage {
        self.usage
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
