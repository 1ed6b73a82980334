//! Pixel formats

/// Texture and render-target pixel formats.
///
/// A deliberately small subset of what native APIs offer; `Invalid` doubles
/// as "no attachment" in pipeline descriptors.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum PixelFormat {
    #[default]
    Invalid,
    R8Unorm,
    Rg8Unorm,
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Rgba16Float,
    Rgba32Float,
    Depth32Float,
    Stencil8,
    Depth24PlusStencil8,
    Depth32FloatStencil8,
}

impl PixelFormat {
    pub fn is_color(&self) -> bool {
        !matches!(
            self,
            Self::Invalid
                | Self::Depth32Float
                | Self::Stencil8
                | Self::Depth24PlusStencil8
                | Self::Depth32FloatStencil8
        )
    }

    pub fn has_depth(&self) -> bool {
        matches!(
            self,
            Self::Depth32Float | Self::Depth24PlusStencil8 | Self::Depth32FloatStencil8
        )
    }

    pub fn has_stencil(&self) -> bool {
        matches!(
            self,
            Self::Stencil8 | Self::Depth24PlusStencil8 | Self::Depth32FloatStencil8
        )
    }

    /// Bytes per texel for formats with a fixed texel size.
    pub fn bytes_per_pixel(&self) -> Option<u32> {
        match self {
            Self::Invalid => None,
            Self::R8Unorm | Self::Stencil8 => Some(1),
            Self::Rg8Unorm => Some(2),
            Self::Rgba8Unorm
            | Self::Rgba8UnormSrgb
            | Self::Bgra8Unorm
            | Self::Bgra8UnormSrgb
            | Self::Depth32Float
            | Self::Depth24PlusStencil8 => Some(4),
            Self::Rgba16Float | Self::Depth32FloatStencil8 => Some(8),
            Self::Rgba32Float => Some(16),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_and_depth_stencil_are_disjoint() {
        for format in [
            PixelFormat::R8Unorm,
            PixelFormat::Rgba8Unorm,
            PixelFormat::Bgra8UnormSrgb,
        ] {
            assert!(format.is_color());
            assert!(!format.has_stencil());
        }
        assert!(PixelFormat::Stencil8.has_stencil());
        assert!(!PixelFormat::Stencil8.is_color());
        assert!(PixelFormat::Depth32FloatStencil8.has_depth());
        assert!(PixelFormat::Depth32FloatStencil8.has_stencil());
    }

    #[test]
    fn invalid_has_no_texel_size() {
        assert_eq!(PixelFormat::Invalid.bytes_per_pixel(), None);
        assert_eq!(PixelFormat::R8Unorm.bytes_per_pixel(), Some(1));
    }
}
