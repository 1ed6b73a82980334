//! Textures

use crate::pixel_format::PixelFormat;
use std::any::Any;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextureType {
    Type1D,
    #[default]
    Type2D,
    Type3D,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        const COPY_SOURCE      = 1 << 0;
        const COPY_DESTINATION = 1 << 1;
        const SAMPLED          = 1 << 2;
        const STORAGE          = 1 << 3;
        const RENDER_TARGET    = 1 << 4;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureDescriptor {
    pub texture_type: TextureType,
    pub pixel_format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub mipmap_levels: u32,
    pub sample_count: u32,
    pub array_length: u32,
    pub usage: TextureUsage,
}

impl TextureDescriptor {
    /// A single-level 2D texture.
    pub fn new_2d(pixel_format: PixelFormat, width: u32, height: u32, usage: TextureUsage) -> Self {
        Self {
            texture_type: TextureType::Type2D,
            pixel_format,
            width,
            height,
            depth: 1,
            mipmap_levels: 1,
            sample_count: 1,
            array_length: 1,
            usage,
        }
    }
}

/// A GPU texture resource handle.
pub trait Texture: Send + Sync {
    fn texture_type(&self) -> TextureType;
    fn pixel_format(&self) -> PixelFormat;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn depth(&self) -> u32;
    fn usage(&self) -> TextureUsage;

    fn dimensions(&self) -> (u32, u32, u32) {
        (self.width(), self.height(), self.depth())
    }

    fn as_any(&self) -> &dyn Any;
}
