//! Text drawing
//!
//! Glyphs arrive pre-rasterized from `lumo_text`; drawing renders their
//! coverage into the source target, sorted by backing texture so each
//! contiguous same-texture run becomes one draw call, then multiplies the
//! requested shading over the rendered alpha. Inline attachments (scalar 0
//! with a texture) draw as regular textured quads.

use crate::context::{GraphicsContext, RenderPass};
use crate::pipeline::{ShaderKind, StencilMode, Vertex};
use crate::shading::Shading;
use lumo_core::{AffineTransform, Color, Point, Rect, Vector2};
use lumo_gpu::{BlendState, RenderCommandEncoder, ScissorRect, Texture};
use lumo_text::{for_each_glyph, LineGlyphs, ResolvedText};
use std::sync::Arc;

impl GraphicsContext {
    /// Lays out `text` within `rect` (wrapping and truncating as needed)
    /// and draws it with `shading`.
    pub fn draw_text(&mut self, text: &ResolvedText, rect: Rect, shading: &Shading) {
        let rect = rect.standardized();
        if rect.is_empty() {
            return;
        }

        let scale = self.content_scale_factor;
        let x = (rect.origin.x * scale) as i64;
        let y = (rect.origin.y * scale) as i64;
        let width = (rect.width() * scale) as i64;
        let height = (rect.height() * scale) as i64;

        if x >= self.viewport.max_x() as i64 || y >= self.viewport.max_y() as i64 {
            return;
        }

        // Pixel-align the text origin to keep glyph edges crisp.
        let inv_scale = 1.0 / text.scale_factor;
        let aligned_x = (rect.min_x() * text.scale_factor).ceil() * inv_scale;
        let aligned_y = (rect.min_y() * text.scale_factor).ceil() * inv_scale;
        let transform = AffineTransform::scale(inv_scale, inv_scale)
            .concatenating(&AffineTransform::translation(aligned_x, aligned_y));

        let x1 = x.max(self.viewport.min_x() as i64);
        let x2 = (x + width).min(self.viewport.max_x() as i64);
        let y1 = y.max(self.viewport.min_y() as i64);
        let y2 = (y + height).min(self.viewport.max_y() as i64);
        if x1 >= x2 || y1 >= y2 {
            return;
        }

        let lines = text.make_glyphs(width.max(0) as u32, height.max(0) as u32);
        if lines.is_empty() {
            return;
        }

        let Some(mut pass) = self.begin_render_pass(false) else {
            return;
        };
        pass.encoder.set_scissor_rect(ScissorRect {
            x: x1.max(0) as u32,
            y: y1.max(0) as u32,
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
        });

        // Glyph coverage lands in the alpha channel of the source target;
        // the shading pass then multiplies color over it.
        self.encode_draw_text_command(&mut pass, &lines, transform, Color::WHITE);
        self.encode_shading_box_command(
            &mut pass,
            shading,
            StencilMode::Ignore,
            BlendState::MULTIPLY,
        );

        // Inline attachments draw over the shaded text.
        for_each_glyph(&lines, |glyph, baseline| {
            if glyph.scalar == '\0' {
                if let Some(texture) = &glyph.texture {
                    let frame = Rect::new(
                        baseline.x,
                        baseline.y - glyph.offset.y,
                        glyph.advance.width,
                        glyph.advance.height,
                    );
                    self.encode_draw_texture_command(
                        &mut pass,
                        texture,
                        frame,
                        transform,
                        glyph.frame,
                        AffineTransform::IDENTITY,
                        BlendState::OPAQUE,
                        Color::WHITE,
                    );
                }
            }
        });

        pass.end();
        self.draw_source();
    }

    /// Draws unconstrained text anchored at `point`; `anchor` is in unit
    /// coordinates of the measured size.
    pub fn draw_text_at(&mut self, text: &ResolvedText, point: Point, anchor: Point) {
        let size = text.measure(None, None);
        if size.width > 0.0 && size.height > 0.0 {
            let origin = Point::new(
                point.x - size.width * anchor.x,
                point.y - size.height * anchor.y,
            );
            self.draw_text(text, Rect::from_origin_size(origin, size), &Shading::Color(Color::BLACK));
        }
    }

    fn encode_draw_text_command(
        &self,
        render_pass: &mut RenderPass,
        lines: &[LineGlyphs],
        transform: AffineTransform,
        color: Color,
    ) {
        struct Quad {
            corners: [([f32; 2], [f32; 2]); 4], // position, uv: lt rt lb rb
            texture: Arc<dyn Texture>,
        }
        let mut quads: Vec<Quad> = Vec::new();

        for_each_glyph(lines, |glyph, baseline| {
            if glyph.scalar == '\0' {
                return;
            }
            let Some(texture) = &glyph.texture else {
                return;
            };
            let inv_w = 1.0 / texture.width() as f32;
            let inv_h = 1.0 / texture.height() as f32;
            let uv_min_x = glyph.frame.min_x() * inv_w;
            let uv_min_y = glyph.frame.min_y() * inv_h;
            let uv_max_x = glyph.frame.max_x() * inv_w;
            let uv_max_y = glyph.frame.max_y() * inv_h;

            let frame = Rect::new(
                baseline.x,
                baseline.y - glyph.offset.y,
                glyph.frame.width(),
                glyph.frame.height(),
            );
            quads.push(Quad {
                corners: [
                    ([frame.min_x(), frame.min_y()], [uv_min_x, uv_min_y]),
                    ([frame.max_x(), frame.min_y()], [uv_max_x, uv_min_y]),
                    ([frame.min_x(), frame.max_y()], [uv_min_x, uv_max_y]),
                    ([frame.max_x(), frame.max_y()], [uv_max_x, uv_max_y]),
                ],
                texture: texture.clone(),
            });
        });

        // Batch by backing texture to minimize texture-bind changes.
        quads.sort_by(|a, b| {
            let pa = Arc::as_ptr(&a.texture) as *const () as usize;
            let pb = Arc::as_ptr(&b.texture) as *const () as usize;
            pb.cmp(&pa)
        });

        let c = color.to_array();
        let transform = transform
            .concatenating(&self.transform)
            .concatenating(&self.view_transform);

        let mut current: Option<Arc<dyn Texture>> = None;
        let mut vertices: Vec<Vertex> = Vec::new();
        let mut flush = |texture: &Option<Arc<dyn Texture>>, vertices: &mut Vec<Vertex>| {
            if let (Some(texture), false) = (texture, vertices.is_empty()) {
                self.encode_draw_command(
                    render_pass,
                    ShaderKind::RcImage,
                    StencilMode::Ignore,
                    vertices,
                    Some(texture),
                    None,
                    BlendState::ALPHA_BLEND,
                    None,
                );
            }
            vertices.clear();
        };

        for quad in &quads {
            let same = current
                .as_ref()
                .is_some_and(|t| Arc::ptr_eq(t, &quad.texture));
            if !same {
                flush(&current, &mut vertices);
                current = Some(quad.texture.clone());
            }
            let [lt, rt, lb, rb] = quad.corners;
            for (position, uv) in [lb, lt, rb, rb, lt, rt] {
                vertices.push(Vertex::new(
                    Vector2::from(position).applying(&transform).to_array(),
                    uv,
                    c,
                ));
            }
        }
        flush(&current, &mut vertices);
    }
}
