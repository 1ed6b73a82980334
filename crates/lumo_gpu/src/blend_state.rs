//! Fixed-function blend states

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SourceColor,
    OneMinusSourceColor,
    SourceAlpha,
    OneMinusSourceAlpha,
    DestinationColor,
    OneMinusDestinationColor,
    DestinationAlpha,
    OneMinusDestinationAlpha,
    SourceAlphaSaturated,
    BlendColor,
    OneMinusBlendColor,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum BlendOperation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ColorWriteMask: u32 {
        const ALPHA = 1 << 0;
        const BLUE  = 1 << 1;
        const GREEN = 1 << 2;
        const RED   = 1 << 3;
        const ALL   = 0xf;
    }
}

/// Per-attachment fixed-function blend configuration.
///
/// Hashable so it can key pipeline-state caches.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct BlendState {
    pub enabled: bool,
    pub source_rgb_blend_factor: BlendFactor,
    pub source_alpha_blend_factor: BlendFactor,
    pub destination_rgb_blend_factor: BlendFactor,
    pub destination_alpha_blend_factor: BlendFactor,
    pub rgb_blend_operation: BlendOperation,
    pub alpha_blend_operation: BlendOperation,
    pub write_mask: ColorWriteMask,
}

impl BlendState {
    /// Blending disabled; source overwrites the destination.
    pub const OPAQUE: Self = Self {
        enabled: false,
        source_rgb_blend_factor: BlendFactor::One,
        source_alpha_blend_factor: BlendFactor::One,
        destination_rgb_blend_factor: BlendFactor::Zero,
        destination_alpha_blend_factor: BlendFactor::Zero,
        rgb_blend_operation: BlendOperation::Add,
        alpha_blend_operation: BlendOperation::Add,
        write_mask: ColorWriteMask::ALL,
    };

    /// Conventional source-over alpha blending.
    pub const ALPHA_BLEND: Self = Self {
        enabled: true,
        source_rgb_blend_factor: BlendFactor::SourceAlpha,
        source_alpha_blend_factor: BlendFactor::One,
        destination_rgb_blend_factor: BlendFactor::OneMinusSourceAlpha,
        destination_alpha_blend_factor: BlendFactor::OneMinusSourceAlpha,
        rgb_blend_operation: BlendOperation::Add,
        alpha_blend_operation: BlendOperation::Add,
        ..Self::OPAQUE
    };

    /// Destination multiplied by source.
    pub const MULTIPLY: Self = Self {
        enabled: true,
        source_rgb_blend_factor: BlendFactor::DestinationColor,
        source_alpha_blend_factor: BlendFactor::DestinationAlpha,
        destination_rgb_blend_factor: BlendFactor::Zero,
        destination_alpha_blend_factor: BlendFactor::Zero,
        ..Self::OPAQUE
    };

    /// No color output at all (stencil-only passes).
    pub const WRITE_DISABLED: Self = Self {
        enabled: false,
        write_mask: ColorWriteMask::empty(),
        ..Self::OPAQUE
    };

    /// Blending enabled with uniform factors for color and alpha.
    pub const fn with_factors(
        source: BlendFactor,
        destination: BlendFactor,
        operation: BlendOperation,
    ) -> Self {
        Self {
            enabled: true,
            source_rgb_blend_factor: source,
            source_alpha_blend_factor: source,
            destination_rgb_blend_factor: destination,
            destination_alpha_blend_factor: destination,
            rgb_blend_operation: operation,
            alpha_blend_operation: operation,
            write_mask: ColorWriteMask::ALL,
        }
    }
}

impl Default for BlendState {
    fn default() -> Self {
        Self::OPAQUE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_distinct_cache_keys() {
        use std::collections::HashSet;
        let set: HashSet<BlendState> = [
            BlendState::OPAQUE,
            BlendState::ALPHA_BLEND,
            BlendState::MULTIPLY,
            BlendState::WRITE_DISABLED,
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn with_factors_mirrors_color_into_alpha() {
        let s = BlendState::with_factors(
            BlendFactor::One,
            BlendFactor::OneMinusSourceAlpha,
            BlendOperation::Add,
        );
        assert!(s.enabled);
        assert_eq!(s.source_rgb_blend_factor, s.source_alpha_blend_factor);
        assert_eq!(
            s.destination_rgb_blend_factor,
            s.destination_alpha_blend_factor
        );
    }
}
