//! Layered sub-contexts
//!
//! A layer is an independent context with its own render-target bundle,
//! cleared transparent. After the caller draws into it, its backdrop is
//! composited back into the parent as a textured quad — the parent's
//! filters, blend mode and mask then apply to the group as a whole. This is
//! how nested opacity/blend/filter groups work without a retained scene
//! graph.

use crate::context::GraphicsContext;
use lumo_core::{AffineTransform, Color, Point, Rect, Size};
use lumo_gpu::{BlendState, Texture};

impl GraphicsContext {
    /// A child context covering the same viewport.
    pub(crate) fn make_layer_context(&self) -> Option<GraphicsContext> {
        GraphicsContext::new(
            self.pipeline.clone(),
            self.command_buffer.clone(),
            self.viewport,
            self.content_offset(),
            self.content_scale_factor,
            self.resolution(),
        )
    }

    /// A child context sized to `frame`, with its own origin.
    pub(crate) fn make_region_layer_context(&self, frame: Rect) -> Option<GraphicsContext> {
        let frame = frame.standardized();
        let width = frame.width() * self.content_scale_factor;
        let height = frame.height() * self.content_scale_factor;
        GraphicsContext::new(
            self.pipeline.clone(),
            self.command_buffer.clone(),
            Rect::new(0.0, 0.0, width, height),
            Point::ZERO,
            self.content_scale_factor,
            Size::new(width, height),
        )
    }

    /// Draws `content` into a full-viewport layer and composites it back.
    pub fn draw_layer(&mut self, content: impl FnOnce(&mut GraphicsContext)) {
        let Some(mut layer) = self.make_layer_context() else {
            tracing::error!("GraphicsContext: failed to create layer context");
            return;
        };
        content(&mut layer);

        let texture = layer.render_targets.backdrop().clone();
        let offset = -layer.content_offset();
        let scale = layer.resolution() / layer.content_scale_factor;
        let texture_frame = Rect::new(0.0, 0.0, texture.width() as f32, texture.height() as f32);

        let Some(mut pass) = self.begin_render_pass(false) else {
            return;
        };
        // The layer was composited against transparent, so a plain copy
        // into the source suffices; blending happens in draw_source.
        self.encode_draw_texture_command(
            &mut pass,
            &texture,
            Rect::from_origin_size(offset, scale),
            AffineTransform::IDENTITY,
            texture_frame,
            AffineTransform::IDENTITY,
            BlendState::OPAQUE,
            Color::WHITE,
        );
        pass.end();
        self.draw_source();
    }

    /// Draws `content` into a layer covering `frame` and composites it
    /// back into that frame. The closure receives the layer's size in
    /// points.
    pub fn draw_layer_in(&mut self, frame: Rect, content: impl FnOnce(&mut GraphicsContext, Size)) {
        let Some(mut layer) = self.make_region_layer_context(frame) else {
            tracing::error!("GraphicsContext: failed to create layer context");
            return;
        };
        let size = layer.resolution() / layer.content_scale_factor;
        content(&mut layer, size);

        let texture = layer.render_targets.backdrop().clone();
        let texture_frame = Rect::new(0.0, 0.0, texture.width() as f32, texture.height() as f32);

        let Some(mut pass) = self.begin_render_pass(false) else {
            return;
        };
        self.encode_draw_texture_command(
            &mut pass,
            &texture,
            frame,
            AffineTransform::IDENTITY,
            texture_frame,
            AffineTransform::IDENTITY,
            BlendState::OPAQUE,
            Color::WHITE,
        );
        pass.end();
        self.draw_source();
    }
}
