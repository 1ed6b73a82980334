//! Image drawing

use crate::context::{GraphicsContext, RenderPass};
use crate::pipeline::{ShaderKind, StencilMode, Vertex};
use lumo_core::{AffineTransform, Color, Point, Rect, Size, Vector2};
use lumo_gpu::{BlendState, Texture};
use std::sync::Arc;

/// An image resolved to a GPU texture, with the scale mapping texels to
/// points.
#[derive(Clone)]
pub struct ResolvedImage {
    pub texture: Option<Arc<dyn Texture>>,
    pub texture_transform: AffineTransform,
    pub scale_factor: f32,
    pub baseline: f32,
}

impl ResolvedImage {
    pub fn from_texture(texture: Arc<dyn Texture>, scale_factor: f32) -> Self {
        let baseline = texture.height() as f32 * scale_factor;
        Self {
            texture: Some(texture),
            texture_transform: AffineTransform::IDENTITY,
            scale_factor,
            baseline,
        }
    }

    /// Size in points.
    pub fn size(&self) -> Size {
        match &self.texture {
            Some(texture) => Size::new(
                texture.width() as f32 * self.scale_factor,
                texture.height() as f32 * self.scale_factor,
            ),
            None => Size::ZERO,
        }
    }
}

impl GraphicsContext {
    pub fn draw_image(&mut self, image: &ResolvedImage, rect: Rect) {
        let Some(texture) = &image.texture else {
            return;
        };
        let rect = rect.standardized();
        if rect.is_empty() {
            return;
        }
        let texture_frame = Rect::new(0.0, 0.0, texture.width() as f32, texture.height() as f32);

        let Some(mut pass) = self.begin_render_pass(false) else {
            return;
        };
        self.encode_draw_texture_command(
            &mut pass,
            texture,
            rect,
            self.transform,
            texture_frame,
            image.texture_transform,
            BlendState::OPAQUE,
            Color::WHITE,
        );
        pass.end();
        self.draw_source();
    }

    /// Draws the image with its natural size, `anchor` given in unit
    /// coordinates of that size.
    pub fn draw_image_at(&mut self, image: &ResolvedImage, point: Point, anchor: Point) {
        let size = image.size();
        let origin = Point::new(
            point.x - anchor.x * size.width,
            point.y - anchor.y * size.height,
        );
        self.draw_image(image, Rect::from_origin_size(origin, size));
    }

    /// Emits a textured quad mapping `texture_frame` (texels) onto `frame`
    /// (content coordinates under `transform`).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn encode_draw_texture_command(
        &self,
        render_pass: &mut RenderPass,
        texture: &Arc<dyn Texture>,
        frame: Rect,
        transform: AffineTransform,
        texture_frame: Rect,
        texture_transform: AffineTransform,
        blend_state: BlendState,
        color: Color,
    ) {
        let trans = transform.concatenating(&self.view_transform);
        let c = color.to_array();

        let inv_w = 1.0 / texture.width() as f32;
        let inv_h = 1.0 / texture.height() as f32;
        let uv_min_x = texture_frame.min_x() * inv_w;
        let uv_max_x = texture_frame.max_x() * inv_w;
        let uv_min_y = texture_frame.min_y() * inv_h;
        let uv_max_y = texture_frame.max_y() * inv_h;

        let vertex = |x: f32, y: f32, u: f32, v: f32| {
            Vertex::new(
                Vector2::new(x, y).applying(&trans).to_array(),
                Vector2::new(u, v).applying(&texture_transform).to_array(),
                c,
            )
        };
        let vertices = [
            vertex(frame.min_x(), frame.max_y(), uv_min_x, uv_max_y), // left bottom
            vertex(frame.min_x(), frame.min_y(), uv_min_x, uv_min_y), // left top
            vertex(frame.max_x(), frame.max_y(), uv_max_x, uv_max_y), // right bottom
            vertex(frame.max_x(), frame.max_y(), uv_max_x, uv_max_y), // right bottom
            vertex(frame.min_x(), frame.min_y(), uv_min_x, uv_min_y), // left top
            vertex(frame.max_x(), frame.min_y(), uv_max_x, uv_min_y), // right top
        ];

        self.encode_draw_command(
            render_pass,
            ShaderKind::Image,
            StencilMode::Ignore,
            &vertices,
            Some(texture),
            None,
            blend_state,
            None,
        );
    }
}
