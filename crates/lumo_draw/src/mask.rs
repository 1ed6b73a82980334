//! Clipping via stencil-resolved mask textures
//!
//! A clip renders the path's stencil test into a dedicated r8 mask texture
//! sized to the context resolution. Because the resolve samples the
//! previously active mask, nested clips compose by intersection regardless
//! of order. Every subsequent draw samples the active mask and discards
//! fragments where it is zero.

use crate::context::{FillStyle, GraphicsContext};
use crate::pipeline::{ShaderKind, StencilMode};
use lumo_core::{Color, Path};
use lumo_gpu::{BlendState, GraphicsDevice, PixelFormat, Texture, TextureDescriptor, TextureUsage};
use std::sync::Arc;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ClipOptions: u32 {
        /// Clip to the complement of the region.
        const INVERSE = 1 << 0;
    }
}

impl GraphicsContext {
    /// Intersects the active clip with the filled region of `path`.
    pub fn clip(&mut self, path: &Path, style: FillStyle, options: ClipOptions) {
        let device = self.pipeline.device().clone();
        let Some(mask) = device.make_texture(&TextureDescriptor::new_2d(
            PixelFormat::R8Unorm,
            self.render_targets.width(),
            self.render_targets.height(),
            TextureUsage::RENDER_TARGET | TextureUsage::SAMPLED,
        )) else {
            tracing::error!("GraphicsContext: mask texture creation failed");
            return;
        };

        let Some(mut pass) =
            self.begin_render_pass_target(mask.clone(), true, true, Color::CLEAR)
        else {
            return;
        };

        let drawn = self.encode_stencil_path_fill_command(&mut pass, path);
        if drawn {
            let stencil = match (options.contains(ClipOptions::INVERSE), style.is_eo_filled) {
                (true, true) => StencilMode::TestOdd,
                (true, false) => StencilMode::TestZero,
                (false, true) => StencilMode::TestEven,
                (false, false) => StencilMode::TestNonZero,
            };
            // Full-open white through the stencil test; the shader samples
            // the previous mask, so the result is the intersection.
            let quad = Self::viewport_quad(Color::WHITE);
            self.encode_draw_command(
                &mut pass,
                ShaderKind::VertexColor,
                stencil,
                &quad,
                None,
                None,
                BlendState::OPAQUE,
                None,
            );
        }
        pass.end();

        if drawn {
            self.clip_bounding_rect = self.clip_bounding_rect.union(&path.bounding_box());
            self.mask_texture = mask;
        }
    }

    /// Renders `content` into an offscreen layer and intersects the active
    /// clip with the layer's alpha, scaled by `opacity`.
    pub fn clip_to_layer(
        &mut self,
        opacity: f32,
        options: ClipOptions,
        content: impl FnOnce(&mut GraphicsContext),
    ) {
        let Some(mut layer) = self.make_layer_context() else {
            tracing::error!("GraphicsContext: failed to create layer context");
            return;
        };
        content(&mut layer);

        let layer_texture = layer.render_targets.backdrop().clone();
        match self.resolve_mask_texture(&layer_texture, opacity, options) {
            Some(mask) => self.mask_texture = mask,
            None => tracing::error!("GraphicsContext: unable to resolve mask texture"),
        }
    }

    /// `new_mask = old_mask * a` with `a = layer_alpha * opacity`, or
    /// `old_mask * (1 - layer_alpha * opacity)` when inverse.
    fn resolve_mask_texture(
        &self,
        layer: &Arc<dyn Texture>,
        opacity: f32,
        options: ClipOptions,
    ) -> Option<Arc<dyn Texture>> {
        let device = self.pipeline.device();
        let mask = device.make_texture(&TextureDescriptor::new_2d(
            PixelFormat::R8Unorm,
            self.render_targets.width(),
            self.render_targets.height(),
            TextureUsage::RENDER_TARGET | TextureUsage::SAMPLED,
        ))?;

        let mut pass = self.begin_render_pass_target(mask.clone(), false, true, Color::CLEAR)?;
        let quad = Self::viewport_quad(Color::new(1.0, 1.0, 1.0, opacity));
        let inverse: f32 = if options.contains(ClipOptions::INVERSE) {
            1.0
        } else {
            0.0
        };
        self.encode_draw_command(
            &mut pass,
            ShaderKind::ResolveMask,
            StencilMode::Ignore,
            &quad,
            Some(layer),
            None,
            BlendState::OPAQUE,
            Some(bytemuck::bytes_of(&inverse)),
        );
        pass.end();
        Some(mask)
    }
}
