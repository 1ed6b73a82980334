//! Blend modes and compositing
//!
//! The ten Porter-Duff modes with a fixed-function equivalent composite the
//! source onto the backdrop in one pass. Every other mode runs the blend
//! shader over the source and backdrop textures into the composited target,
//! which is then swapped with the backdrop so the next draw sees the
//! result.

use crate::context::GraphicsContext;
use crate::pipeline::{ShaderKind, StencilMode};
use lumo_core::Color;
use lumo_gpu::{BlendFactor, BlendOperation, BlendState};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    #[default]
    Normal = 0,
    Multiply = 1,
    Screen = 2,
    Overlay = 3,
    Darken = 4,
    Lighten = 5,
    ColorDodge = 6,
    ColorBurn = 7,
    SoftLight = 8,
    HardLight = 9,
    Difference = 10,
    Exclusion = 11,
    Hue = 12,
    Saturation = 13,
    Color = 14,
    Luminosity = 15,
    Clear = 16,
    Copy = 17,
    SourceIn = 18,
    SourceOut = 19,
    SourceAtop = 20,
    DestinationOver = 21,
    DestinationIn = 22,
    DestinationOut = 23,
    DestinationAtop = 24,
    Xor = 25,
    PlusDarker = 26,
    PlusLighter = 27,
}

impl BlendMode {
    /// The fixed-function equivalent, for modes that have one. Everything
    /// else takes the two-pass shader path.
    pub fn single_pass_blend_state(self) -> Option<BlendState> {
        use BlendFactor::*;
        use BlendOperation::Add;
        let state = |src, dst| BlendState::with_factors(src, dst, Add);
        Some(match self {
            Self::Copy => state(One, Zero),
            Self::SourceIn => state(DestinationAlpha, Zero),
            Self::SourceOut => state(OneMinusDestinationAlpha, Zero),
            Self::SourceAtop => state(DestinationAlpha, OneMinusSourceAlpha),
            Self::DestinationOver => state(OneMinusDestinationAlpha, One),
            Self::DestinationIn => state(Zero, SourceAlpha),
            Self::DestinationOut => state(Zero, OneMinusSourceAlpha),
            Self::DestinationAtop => state(OneMinusDestinationAlpha, SourceAlpha),
            Self::Xor => state(OneMinusDestinationAlpha, OneMinusSourceAlpha),
            Self::PlusLighter => state(One, One),
            _ => return None,
        })
    }

    pub fn is_single_pass(self) -> bool {
        self.single_pass_blend_state().is_some()
    }
}

/// Push constants of the blend shader.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BlendParams {
    mode: u32,
    opacity: f32,
}

impl GraphicsContext {
    /// Composites the blend source into the backdrop. Returns false if the
    /// required pass could not be encoded.
    pub(crate) fn apply_blend_mode(
        &mut self,
        blend_mode: BlendMode,
        opacity: f32,
        apply_mask: bool,
    ) -> bool {
        let saved_mask = self.mask_texture.clone();
        if !apply_mask {
            self.mask_texture = self.pipeline.default_mask_texture.clone();
        }
        let applied = self.apply_blend_mode_masked(blend_mode, opacity);
        self.mask_texture = saved_mask;
        applied
    }

    fn apply_blend_mode_masked(&mut self, blend_mode: BlendMode, opacity: f32) -> bool {
        if let Some(blend_state) = blend_mode.single_pass_blend_state() {
            let Some(mut pass) = self.begin_render_pass_backdrop(false, Color::CLEAR) else {
                return false;
            };
            let quad = Self::viewport_quad(Color::new(1.0, 1.0, 1.0, opacity));
            let source = self.render_targets.source.clone();
            self.encode_draw_command(
                &mut pass,
                ShaderKind::Image,
                StencilMode::Ignore,
                &quad,
                Some(&source),
                None,
                blend_state,
                None,
            );
            pass.end();
            return true;
        }

        // Custom per-pixel math: blend source and backdrop into the
        // composited target, then swap it in as the new backdrop.
        let Some(mut pass) = self.begin_render_pass_composition_target() else {
            return false;
        };
        let quad = Self::viewport_quad(Color::WHITE);
        let source = self.render_targets.source.clone();
        let backdrop = self.render_targets.backdrop.clone();
        let params = BlendParams {
            mode: blend_mode as u32,
            opacity,
        };
        self.encode_draw_command(
            &mut pass,
            ShaderKind::BlendImage,
            StencilMode::Ignore,
            &quad,
            Some(&source),
            Some(&backdrop),
            BlendState::OPAQUE,
            Some(bytemuck::bytes_of(&params)),
        );
        pass.end();
        self.render_targets.switch_composited_to_backdrop();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_MODES: [BlendMode; 28] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::SoftLight,
        BlendMode::HardLight,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::Hue,
        BlendMode::Saturation,
        BlendMode::Color,
        BlendMode::Luminosity,
        BlendMode::Clear,
        BlendMode::Copy,
        BlendMode::SourceIn,
        BlendMode::SourceOut,
        BlendMode::SourceAtop,
        BlendMode::DestinationOver,
        BlendMode::DestinationIn,
        BlendMode::DestinationOut,
        BlendMode::DestinationAtop,
        BlendMode::Xor,
        BlendMode::PlusDarker,
        BlendMode::PlusLighter,
    ];

    #[test]
    fn exactly_ten_modes_are_single_pass() {
        let count = ALL_MODES.iter().filter(|m| m.is_single_pass()).count();
        assert_eq!(count, 10);
        assert!(!BlendMode::Normal.is_single_pass());
        assert!(!BlendMode::Multiply.is_single_pass());
        assert!(!BlendMode::PlusDarker.is_single_pass());
    }

    #[test]
    fn copy_overwrites_destination() {
        let state = BlendMode::Copy.single_pass_blend_state().unwrap();
        assert_eq!(state.source_rgb_blend_factor, BlendFactor::One);
        assert_eq!(state.destination_rgb_blend_factor, BlendFactor::Zero);
        assert_eq!(state.rgb_blend_operation, BlendOperation::Add);
    }

    #[test]
    fn plus_lighter_adds_both() {
        let state = BlendMode::PlusLighter.single_pass_blend_state().unwrap();
        assert_eq!(state.source_rgb_blend_factor, BlendFactor::One);
        assert_eq!(state.destination_rgb_blend_factor, BlendFactor::One);
    }

    #[test]
    fn xor_uses_inverse_alphas() {
        let state = BlendMode::Xor.single_pass_blend_state().unwrap();
        assert_eq!(
            state.source_rgb_blend_factor,
            BlendFactor::OneMinusDestinationAlpha
        );
        assert_eq!(
            state.destination_rgb_blend_factor,
            BlendFactor::OneMinusSourceAlpha
        );
    }

    #[test]
    fn shader_mode_numbers_match_discriminants() {
        assert_eq!(BlendMode::Normal as u32, 0);
        assert_eq!(BlendMode::Luminosity as u32, 15);
        assert_eq!(BlendMode::Clear as u32, 16);
        assert_eq!(BlendMode::PlusDarker as u32, 26);
    }
}
