//! Filter effects
//!
//! Filters accumulate on the context and run inside `draw_source` before
//! the blend-mode composite. Color-matrix and blur filters ping-pong the
//! source and composited targets; shadows build a blurred solid-color copy
//! in the temporary target and composite it under (or above) the source.

use crate::blend::BlendMode;
use crate::context::{GraphicsContext, RenderPass};
use crate::pipeline::{ShaderKind, StencilMode, Vertex};
use lumo_core::{Angle, Color, ColorMatrix, Point, Rect, Vector2};
use lumo_gpu::{BlendState, Texture};
use std::sync::Arc;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ShadowOptions: u32 {
        /// Draw the shadow over the source instead of under it.
        const SHADOW_ABOVE = 1 << 0;
        /// Discard the source, keeping only the shadow.
        const SHADOW_ONLY = 1 << 1;
        const INVERTS_ALPHA = 1 << 2;
        /// Composite the shadow directly instead of grouping with the
        /// source.
        const DISABLES_GROUP = 1 << 3;
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct BlurOptions: u32 {
        const OPAQUE = 1 << 0;
        const DITHERS_RESULT = 1 << 1;
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct FilterOptions: u32 {
        const LINEAR_COLOR = 1 << 0;
    }
}

#[derive(Clone, Debug)]
pub(crate) enum FilterStyle {
    ColorMatrix {
        matrix: ColorMatrix,
    },
    Blur {
        radius: f32,
        options: BlurOptions,
    },
    Shadow {
        color: Color,
        radius: f32,
        offset: Point,
        blend_mode: BlendMode,
        options: ShadowOptions,
    },
}

/// One filter effect applied to everything drawn through the context.
#[derive(Clone, Debug)]
pub struct Filter {
    pub(crate) style: FilterStyle,
}

impl Filter {
    pub fn color_matrix(matrix: ColorMatrix) -> Self {
        Self {
            style: FilterStyle::ColorMatrix { matrix },
        }
    }

    pub fn color_multiply(color: Color) -> Self {
        let mut m = ColorMatrix::IDENTITY;
        m.r1 = color.r;
        m.g2 = color.g;
        m.b3 = color.b;
        m.a4 = color.a;
        Self::color_matrix(m)
    }

    pub fn hue_rotation(angle: Angle) -> Self {
        let c = angle.radians.cos();
        let s = angle.radians.sin();
        let mut m = ColorMatrix::IDENTITY;
        m.r1 = 0.213 + c * 0.787 - s * 0.213;
        m.r2 = 0.715 - c * 0.715 - s * 0.715;
        m.r3 = 0.072 - c * 0.072 + s * 0.928;
        m.g1 = 0.213 - c * 0.213 + s * 0.143;
        m.g2 = 0.715 + c * 0.285 + s * 0.140;
        m.g3 = 0.072 - c * 0.072 - s * 0.283;
        m.b1 = 0.213 - c * 0.213 - s * 0.787;
        m.b2 = 0.715 - c * 0.715 + s * 0.715;
        m.b3 = 0.072 + c * 0.928 + s * 0.072;
        Self::color_matrix(m)
    }

    pub fn saturation(amount: f32) -> Self {
        let s = amount;
        let sr = (1.0 - s) * 0.213;
        let sg = (1.0 - s) * 0.715;
        let sb = (1.0 - s) * 0.072;
        let mut m = ColorMatrix::IDENTITY;
        m.r1 = sr + s;
        m.r2 = sg;
        m.r3 = sb;
        m.g1 = sr;
        m.g2 = sg + s;
        m.g3 = sb;
        m.b1 = sr;
        m.b2 = sg;
        m.b3 = sb + s;
        Self::color_matrix(m)
    }

    pub fn brightness(amount: f32) -> Self {
        let mut m = ColorMatrix::IDENTITY;
        m.r5 = amount;
        m.g5 = amount;
        m.b5 = amount;
        Self::color_matrix(m)
    }

    pub fn contrast(amount: f32) -> Self {
        let t = (1.0 - amount) * 0.5;
        let mut m = ColorMatrix::IDENTITY;
        m.r1 = amount;
        m.g2 = amount;
        m.b3 = amount;
        m.r5 = t;
        m.g5 = t;
        m.b5 = t;
        Self::color_matrix(m)
    }

    pub fn color_invert(amount: f32) -> Self {
        let r = 1.0 - amount * 2.0;
        let mut m = ColorMatrix::IDENTITY;
        m.r1 = r;
        m.g2 = r;
        m.b3 = r;
        m.r5 = amount;
        m.g5 = amount;
        m.b5 = amount;
        Self::color_matrix(m)
    }

    pub fn grayscale(amount: f32) -> Self {
        let a = 1.0 - amount;
        let mut m = ColorMatrix::IDENTITY;
        m.r1 = 0.213 + 0.787 * a;
        m.r2 = 0.715 - 0.715 * a;
        m.r3 = 0.072 - 0.072 * a;
        m.g1 = 0.213 - 0.213 * a;
        m.g2 = 0.715 + 0.285 * a;
        m.g3 = 0.072 - 0.072 * a;
        m.b1 = 0.213 - 0.213 * a;
        m.b2 = 0.715 - 0.715 * a;
        m.b3 = 0.072 + 0.928 * a;
        Self::color_matrix(m)
    }

    pub fn luminance_to_alpha() -> Self {
        let mut m = ColorMatrix::ZERO;
        m.a1 = 0.2126;
        m.a2 = 0.7152;
        m.a3 = 0.0722;
        Self::color_matrix(m)
    }

    pub fn blur(radius: f32, options: BlurOptions) -> Self {
        Self {
            style: FilterStyle::Blur { radius, options },
        }
    }

    pub fn shadow(
        color: Color,
        radius: f32,
        offset: Point,
        blend_mode: BlendMode,
        options: ShadowOptions,
    ) -> Self {
        Self {
            style: FilterStyle::Shadow {
                color,
                radius,
                offset,
                blend_mode,
                options,
            },
        }
    }

    /// Scope marker; the alpha-threshold filter is not specified yet.
    pub fn alpha_threshold(_min: f32, _max: f32, _color: Color) -> Self {
        unimplemented!("alpha_threshold filter is not implemented")
    }
}

/// Push constants of the blur shader.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct BlurParams {
    resolution: [f32; 2],
    direction: [f32; 2],
}

const MAX_BLUR_ITERATIONS: u32 = 3;

impl GraphicsContext {
    /// Runs every pending filter except shadows that composite above the
    /// group.
    pub(crate) fn apply_filters(&mut self, source_discarded: bool) {
        let filters = self.filters.clone();
        for (filter, options) in &filters {
            let above_group = matches!(
                &filter.style,
                FilterStyle::Shadow { options, .. }
                    if options.contains(ShadowOptions::DISABLES_GROUP | ShadowOptions::SHADOW_ABOVE)
            );
            if !above_group {
                self.apply_filter(filter, *options, source_discarded);
            }
        }
    }

    /// Runs the shadows deferred by `apply_filters`.
    pub(crate) fn apply_layered_filters(&mut self, source_discarded: bool) {
        let filters = self.filters.clone();
        for (filter, options) in &filters {
            let above_group = matches!(
                &filter.style,
                FilterStyle::Shadow { options, .. }
                    if options.contains(ShadowOptions::DISABLES_GROUP | ShadowOptions::SHADOW_ABOVE)
            );
            if above_group {
                self.apply_filter(filter, *options, source_discarded);
            }
        }
    }

    fn apply_filter(&mut self, filter: &Filter, filter_options: FilterOptions, source_discarded: bool) {
        let width = self.render_targets.width() as f32;
        let height = self.render_targets.height() as f32;
        let texture_frame = Rect::new(0.0, 0.0, width, height);
        let frame = Rect::new(
            0.0,
            0.0,
            self.viewport.width() / self.content_scale_factor,
            self.viewport.height() / self.content_scale_factor,
        );

        match &filter.style {
            FilterStyle::ColorMatrix { matrix } => {
                let Some(mut pass) = self.begin_render_pass_composition_target() else {
                    tracing::error!("GraphicsContext: composition pass failed");
                    return;
                };
                let source = self.render_targets.source.clone();
                if self.encode_color_matrix_filter(
                    &mut pass,
                    frame,
                    &source,
                    texture_frame,
                    matrix,
                    BlendState::OPAQUE,
                    Color::WHITE,
                ) {
                    pass.end();
                    self.render_targets.switch_source_to_composited();
                } else {
                    pass.end();
                    tracing::error!("GraphicsContext: color matrix filter failed");
                }
            }
            FilterStyle::Blur { radius, options } => {
                if *radius < f32::EPSILON {
                    return;
                }
                // Alternating horizontal/vertical passes, widening each
                // iteration.
                for pass_index in 0..MAX_BLUR_ITERATIONS * 2 {
                    let Some(mut pass) = self.begin_render_pass_composition_target() else {
                        tracing::error!("GraphicsContext: composition pass failed");
                        return;
                    };
                    let r = radius * (pass_index / 2 + 1) as f32 / MAX_BLUR_ITERATIONS as f32;
                    let source = self.render_targets.source.clone();
                    if self.encode_blur_filter(
                        &mut pass,
                        &source,
                        texture_frame,
                        r,
                        *options,
                        pass_index,
                        BlendState::OPAQUE,
                        Color::WHITE,
                    ) {
                        pass.end();
                        self.render_targets.switch_source_to_composited();
                    } else {
                        pass.end();
                        tracing::error!("GraphicsContext: blur filter failed");
                        return;
                    }
                }
            }
            FilterStyle::Shadow {
                color,
                radius,
                offset,
                blend_mode,
                options,
            } => {
                // Solid-color copy of the source, offset, into temporary.
                let mut matrix = ColorMatrix::ZERO;
                matrix.a4 = color.a;
                matrix.r5 = color.r;
                matrix.g5 = color.g;
                matrix.b5 = color.b;

                let Some(mut pass) = self.begin_render_pass_target(
                    self.render_targets.temporary.clone(),
                    false,
                    true,
                    Color::CLEAR,
                ) else {
                    tracing::error!("GraphicsContext: shadow pass failed");
                    return;
                };
                let source = self.render_targets.source.clone();
                let drawn = self.encode_color_matrix_filter(
                    &mut pass,
                    frame.offset_by(offset.x, offset.y),
                    &source,
                    texture_frame,
                    &matrix,
                    BlendState::OPAQUE,
                    Color::WHITE,
                );
                pass.end();
                if !drawn {
                    tracing::error!("GraphicsContext: shadow color copy failed");
                    return;
                }
                // temporary: original image, source: shadow silhouette
                self.render_targets.switch_temporary_to_source();

                self.apply_filter(
                    &Filter::blur(*radius, BlurOptions::default()),
                    filter_options,
                    source_discarded,
                );

                let disables_group =
                    options.contains(ShadowOptions::DISABLES_GROUP) || source_discarded;
                if disables_group {
                    self.apply_blend_mode(*blend_mode, self.opacity, true);
                } else {
                    self.render_targets.switch_temporary_to_backdrop();
                    // source: shadow, backdrop: original image,
                    // temporary: original backdrop
                    if !options.contains(ShadowOptions::SHADOW_ABOVE) {
                        self.render_targets.switch_source_to_backdrop();
                    }
                    if !self.apply_blend_mode(BlendMode::Normal, 1.0, false) {
                        tracing::error!("GraphicsContext: shadow composite failed");
                    }
                    self.render_targets.switch_temporary_to_backdrop();
                }
                self.render_targets.switch_temporary_to_source();
            }
        }
    }

    /// Quad over `frame` running the color-matrix shader on `texture`.
    #[allow(clippy::too_many_arguments)]
    fn encode_color_matrix_filter(
        &self,
        render_pass: &mut RenderPass,
        frame: Rect,
        texture: &Arc<dyn Texture>,
        texture_frame: Rect,
        matrix: &ColorMatrix,
        blend_state: BlendState,
        color: Color,
    ) -> bool {
        let inv_w = 1.0 / texture.width() as f32;
        let inv_h = 1.0 / texture.height() as f32;
        let uv_min_x = texture_frame.min_x() * inv_w;
        let uv_max_x = texture_frame.max_x() * inv_w;
        let uv_min_y = texture_frame.min_y() * inv_h;
        let uv_max_y = texture_frame.max_y() * inv_h;

        let frame = frame.standardized();
        let c = color.to_array();
        let vertex = |x: f32, y: f32, u: f32, v: f32| {
            Vertex::new(
                Vector2::new(x, y).applying(&self.view_transform).to_array(),
                [u, v],
                c,
            )
        };
        let vertices = [
            vertex(frame.min_x(), frame.max_y(), uv_min_x, uv_max_y),
            vertex(frame.min_x(), frame.min_y(), uv_min_x, uv_min_y),
            vertex(frame.max_x(), frame.max_y(), uv_max_x, uv_max_y),
            vertex(frame.max_x(), frame.max_y(), uv_max_x, uv_max_y),
            vertex(frame.min_x(), frame.min_y(), uv_min_x, uv_min_y),
            vertex(frame.max_x(), frame.min_y(), uv_max_x, uv_min_y),
        ];

        let coefficients = matrix.to_array();
        self.encode_draw_command(
            render_pass,
            ShaderKind::ColorMatrixImage,
            StencilMode::Ignore,
            &vertices,
            Some(texture),
            None,
            blend_state,
            Some(bytemuck::cast_slice(&coefficients)),
        );
        true
    }

    /// One separable blur pass; even passes blur horizontally, odd ones
    /// vertically.
    #[allow(clippy::too_many_arguments)]
    fn encode_blur_filter(
        &self,
        render_pass: &mut RenderPass,
        texture: &Arc<dyn Texture>,
        texture_frame: Rect,
        radius: f32,
        _options: BlurOptions,
        blur_pass: u32,
        blend_state: BlendState,
        color: Color,
    ) -> bool {
        let direction = if blur_pass % 2 == 0 {
            [radius, 0.0]
        } else {
            [0.0, radius]
        };
        let params = BlurParams {
            resolution: [texture.width() as f32, texture.height() as f32],
            direction,
        };

        let inv_w = 1.0 / texture.width() as f32;
        let inv_h = 1.0 / texture.height() as f32;
        let uv_min_x = texture_frame.min_x() * inv_w;
        let uv_max_x = texture_frame.max_x() * inv_w;
        let uv_min_y = texture_frame.min_y() * inv_h;
        let uv_max_y = texture_frame.max_y() * inv_h;

        let c = color.to_array();
        let vertex = |x: f32, y: f32, u: f32, v: f32| Vertex::new([x, y], [u, v], c);
        let vertices = [
            vertex(-1.0, -1.0, uv_min_x, uv_max_y),
            vertex(-1.0, 1.0, uv_min_x, uv_min_y),
            vertex(1.0, -1.0, uv_max_x, uv_max_y),
            vertex(1.0, -1.0, uv_max_x, uv_max_y),
            vertex(-1.0, 1.0, uv_min_x, uv_min_y),
            vertex(1.0, 1.0, uv_max_x, uv_min_y),
        ];

        self.encode_draw_command(
            render_pass,
            ShaderKind::BlurImage,
            StencilMode::Ignore,
            &vertices,
            Some(texture),
            None,
            blend_state,
            Some(bytemuck::bytes_of(&params)),
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grayscale_full_is_luminance_weights() {
        let Filter { style } = Filter::grayscale(1.0);
        let FilterStyle::ColorMatrix { matrix } = style else {
            panic!("grayscale must be a color matrix");
        };
        let gray = matrix.apply(Color::new(0.5, 0.5, 0.5, 1.0));
        assert!((gray.r - 0.5).abs() < 1e-4);
        assert!((gray.r - gray.g).abs() < 1e-5);
        assert!((gray.g - gray.b).abs() < 1e-5);
    }

    #[test]
    fn color_invert_flips_extremes() {
        let Filter { style } = Filter::color_invert(1.0);
        let FilterStyle::ColorMatrix { matrix } = style else {
            panic!("invert must be a color matrix");
        };
        let inverted = matrix.apply(Color::WHITE);
        assert!(inverted.r.abs() < 1e-5);
        let inverted = matrix.apply(Color::new(0.0, 0.0, 0.0, 1.0));
        assert!((inverted.r - 1.0).abs() < 1e-5);
    }

    #[test]
    fn hue_rotation_zero_is_identity() {
        let Filter { style } = Filter::hue_rotation(Angle::ZERO);
        let FilterStyle::ColorMatrix { matrix } = style else {
            panic!("hue rotation must be a color matrix");
        };
        let c = Color::new(0.3, 0.6, 0.9, 1.0);
        let out = matrix.apply(c);
        assert!((out.r - c.r).abs() < 1e-4);
        assert!((out.g - c.g).abs() < 1e-4);
        assert!((out.b - c.b).abs() < 1e-4);
    }

    #[test]
    #[should_panic(expected = "not implemented")]
    fn alpha_threshold_is_a_scope_marker() {
        let _ = Filter::alpha_threshold(0.5, 1.0, Color::BLACK);
    }
}
