//! The immediate-mode drawing context

use crate::blend::BlendMode;
use crate::filter::{Filter, FilterOptions, FilterStyle, ShadowOptions};
use crate::pipeline::{PipelineStates, ShaderKind, StencilMode, Vertex};
use lumo_core::{AffineTransform, Color, Point, Rect, Size};
use lumo_gpu::{
    BlendState, CommandBuffer, CommandEncoder, GraphicsDevice, LoadAction, PixelFormat,
    RenderCommandEncoder, RenderPassColorAttachmentDescriptor,
    RenderPassDepthStencilAttachmentDescriptor, RenderPassDescriptor, ScissorRect,
    ShaderBindingSet, StoreAction, Texture, TextureDescriptor, TextureType, TextureUsage,
    Viewport,
};
use std::sync::Arc;

/// Winding-rule options for path filling.
#[derive(Clone, Copy, Debug, Default)]
pub struct FillStyle {
    /// Use the even-odd rule instead of non-zero winding.
    pub is_eo_filled: bool,
    pub is_antialiased: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Clone, Debug)]
pub struct StrokeStyle {
    pub line_width: f32,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f32,
    /// Alternating dash/gap lengths; empty for a solid stroke.
    pub dash: Vec<f32>,
    pub dash_phase: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            line_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
            dash: Vec::new(),
            dash_phase: 0.0,
        }
    }
}

impl StrokeStyle {
    pub fn with_line_width(line_width: f32) -> Self {
        Self {
            line_width,
            ..Default::default()
        }
    }
}

/// The render-target bundle owned by one context: the blend `source` every
/// draw lands in, the accumulated `backdrop`, the `composited` output of
/// multi-pass blending (swapped with the backdrop after each such pass), a
/// `temporary` for filter iteration and the transient stencil target.
pub struct RenderTargets {
    pub(crate) source: Arc<dyn Texture>,
    pub(crate) backdrop: Arc<dyn Texture>,
    pub(crate) composited: Arc<dyn Texture>,
    pub(crate) temporary: Arc<dyn Texture>,
    pub(crate) stencil: Arc<dyn Texture>,
}

impl RenderTargets {
    pub fn new(device: &Arc<dyn GraphicsDevice>, width: u32, height: u32) -> Option<Self> {
        let usage =
            TextureUsage::RENDER_TARGET | TextureUsage::SAMPLED | TextureUsage::COPY_SOURCE;
        let make_render_target = || {
            device.make_texture(&TextureDescriptor::new_2d(
                PixelFormat::Rgba8Unorm,
                width,
                height,
                usage,
            ))
        };

        Some(Self {
            source: make_render_target()?,
            backdrop: make_render_target()?,
            composited: make_render_target()?,
            temporary: make_render_target()?,
            stencil: device.make_transient_render_target(
                TextureType::Type2D,
                PixelFormat::Stencil8,
                width,
                height,
                1,
            )?,
        })
    }

    pub fn width(&self) -> u32 {
        self.backdrop.width()
    }

    pub fn height(&self) -> u32 {
        self.backdrop.height()
    }

    pub fn color_format(&self) -> PixelFormat {
        self.backdrop.pixel_format()
    }

    pub fn depth_format(&self) -> PixelFormat {
        self.stencil.pixel_format()
    }

    /// The accumulated output of the context.
    pub fn backdrop(&self) -> &Arc<dyn Texture> {
        &self.backdrop
    }

    pub(crate) fn switch_source_to_composited(&mut self) {
        std::mem::swap(&mut self.source, &mut self.composited);
    }

    pub(crate) fn switch_source_to_backdrop(&mut self) {
        std::mem::swap(&mut self.source, &mut self.backdrop);
    }

    pub(crate) fn switch_composited_to_backdrop(&mut self) {
        std::mem::swap(&mut self.composited, &mut self.backdrop);
    }

    pub(crate) fn switch_temporary_to_source(&mut self) {
        std::mem::swap(&mut self.temporary, &mut self.source);
    }

    pub(crate) fn switch_temporary_to_backdrop(&mut self) {
        std::mem::swap(&mut self.temporary, &mut self.backdrop);
    }
}

/// An open render pass plus the attachment formats pipeline lookups need.
pub(crate) struct RenderPass {
    pub encoder: Box<dyn RenderCommandEncoder>,
    pub color_format: PixelFormat,
    pub depth_format: PixelFormat,
}

impl RenderPass {
    pub fn end(mut self) {
        self.encoder.end_encoding();
    }
}

/// One drawing surface: shape/path filling and stroking, text and image
/// drawing, gradient fills, stencil+mask clipping, layered sub-contexts,
/// blend-mode compositing and filter effects, recorded onto a command
/// buffer.
///
/// A context is single-threaded; independent contexts targeting disjoint
/// textures may record concurrently.
pub struct GraphicsContext {
    pub opacity: f32,
    pub blend_mode: BlendMode,
    pub transform: AffineTransform,

    pub(crate) view_transform: AffineTransform,
    content_offset: Point,
    pub(crate) content_scale_factor: f32,
    pub(crate) viewport: Rect,

    pub(crate) mask_texture: Arc<dyn Texture>,
    pub(crate) render_targets: RenderTargets,
    pub clip_bounding_rect: Rect,
    pub(crate) filters: Vec<(Filter, FilterOptions)>,

    pub(crate) command_buffer: Arc<dyn CommandBuffer>,
    pub(crate) pipeline: Arc<PipelineStates>,
}

impl GraphicsContext {
    /// A context with freshly allocated render targets, cleared
    /// transparent.
    pub fn new(
        pipeline: Arc<PipelineStates>,
        command_buffer: Arc<dyn CommandBuffer>,
        viewport: Rect,
        content_offset: Point,
        content_scale_factor: f32,
        resolution: Size,
    ) -> Option<Self> {
        let width = resolution.width.round() as u32;
        let height = resolution.height.round() as u32;
        if width == 0 || height == 0 {
            tracing::error!("GraphicsContext: invalid resolution");
            return None;
        }
        let render_targets = RenderTargets::new(pipeline.device(), width, height)?;

        let mut context = Self::with_render_targets(
            pipeline,
            command_buffer,
            viewport,
            content_offset,
            content_scale_factor,
            render_targets,
        )?;
        context.clear(Color::CLEAR);
        Some(context)
    }

    /// A context over an existing render-target bundle.
    pub fn with_render_targets(
        pipeline: Arc<PipelineStates>,
        command_buffer: Arc<dyn CommandBuffer>,
        viewport: Rect,
        content_offset: Point,
        content_scale_factor: f32,
        render_targets: RenderTargets,
    ) -> Option<Self> {
        let viewport = viewport.standardized();
        if viewport.width() < 1.0 || viewport.height() < 1.0 {
            tracing::error!("GraphicsContext: invalid viewport");
            return None;
        }

        let mask_texture = pipeline.default_mask_texture.clone();
        let mut context = Self {
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            transform: AffineTransform::IDENTITY,
            view_transform: AffineTransform::IDENTITY,
            content_offset: Point::ZERO,
            content_scale_factor: content_scale_factor.max(1.0),
            viewport,
            mask_texture,
            render_targets,
            clip_bounding_rect: Rect::ZERO,
            filters: Vec::new(),
            command_buffer,
            pipeline,
        };
        context.set_content_offset(content_offset);
        Some(context)
    }

    pub fn resolution(&self) -> Size {
        Size::new(
            self.render_targets.width() as f32,
            self.render_targets.height() as f32,
        )
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn content_scale_factor(&self) -> f32 {
        self.content_scale_factor
    }

    pub fn render_targets(&self) -> &RenderTargets {
        &self.render_targets
    }

    pub fn color_format(&self) -> PixelFormat {
        self.render_targets.color_format()
    }

    pub fn depth_format(&self) -> PixelFormat {
        self.render_targets.depth_format()
    }

    pub fn content_offset(&self) -> Point {
        self.content_offset
    }

    pub fn command_buffer(&self) -> &Arc<dyn CommandBuffer> {
        &self.command_buffer
    }

    /// Moves the drawing origin and rebuilds the transform mapping content
    /// coordinates to clip space.
    pub fn set_content_offset(&mut self, offset: Point) {
        self.content_offset = offset;
        let scale = self.viewport.size / self.content_scale_factor;

        let offset = AffineTransform::translation(offset.x, offset.y);
        let normalize = AffineTransform::scale(1.0 / scale.width, 1.0 / scale.height);
        // Normalized content space to clip space: y flips, origin moves to
        // the top-left corner.
        let clip_space = AffineTransform::scale(2.0, -2.0)
            .concatenating(&AffineTransform::translation(-1.0, 1.0));

        self.view_transform = offset.concatenating(&normalize).concatenating(&clip_space);
    }

    pub fn scale_by(&mut self, x: f32, y: f32) {
        self.transform = self.transform.scaled_by(x, y);
    }

    pub fn translate_by(&mut self, x: f32, y: f32) {
        self.transform = self.transform.translated_by(x, y);
    }

    pub fn rotate_by(&mut self, radians: f32) {
        self.transform = self.transform.rotated_by(radians);
    }

    pub fn concatenate(&mut self, transform: &AffineTransform) {
        self.transform = self.transform.concatenating(transform);
    }

    pub fn add_filter(&mut self, filter: Filter, options: FilterOptions) {
        self.filters.push((filter, options));
    }

    /// Replaces the backdrop with a solid color.
    pub fn clear(&mut self, color: Color) {
        if let Some(pass) = self.begin_render_pass_backdrop(true, color) {
            pass.end();
        }
    }

    // MARK: render pass plumbing

    /// A pass targeting the blend source, cleared transparent, optionally
    /// with the stencil attachment (cleared to zero).
    pub(crate) fn begin_render_pass(&self, enable_stencil: bool) -> Option<RenderPass> {
        self.begin_render_pass_target(
            self.render_targets.source.clone(),
            enable_stencil,
            true,
            Color::CLEAR,
        )
    }

    pub(crate) fn begin_render_pass_composition_target(&self) -> Option<RenderPass> {
        self.begin_render_pass_target(
            self.render_targets.composited.clone(),
            false,
            true,
            Color::CLEAR,
        )
    }

    pub(crate) fn begin_render_pass_backdrop(
        &self,
        clear: bool,
        clear_color: Color,
    ) -> Option<RenderPass> {
        self.begin_render_pass_target(
            self.render_targets.backdrop.clone(),
            false,
            clear,
            clear_color,
        )
    }

    pub(crate) fn begin_render_pass_target(
        &self,
        render_target: Arc<dyn Texture>,
        enable_stencil: bool,
        clear: bool,
        clear_color: Color,
    ) -> Option<RenderPass> {
        let color_format = render_target.pixel_format();
        let mut descriptor = RenderPassDescriptor::with_color_attachments([
            RenderPassColorAttachmentDescriptor {
                render_target,
                load_action: if clear { LoadAction::Clear } else { LoadAction::Load },
                store_action: StoreAction::Store,
                clear_color,
            },
        ]);
        let depth_format = if enable_stencil {
            descriptor.depth_stencil_attachment = RenderPassDepthStencilAttachmentDescriptor {
                render_target: Some(self.render_targets.stencil.clone()),
                load_action: LoadAction::Clear,
                store_action: StoreAction::DontCare,
                clear_depth: 0.0,
                clear_stencil: 0,
            };
            self.render_targets.depth_format()
        } else {
            PixelFormat::Invalid
        };

        let Some(mut encoder) = self.command_buffer.make_render_command_encoder(&descriptor)
        else {
            tracing::error!("GraphicsContext: make_render_command_encoder failed");
            return None;
        };

        let full_width = self.render_targets.width() as f32;
        let full_height = self.render_targets.height() as f32;
        if self.viewport.origin.x != 0.0
            || self.viewport.origin.y != 0.0
            || self.viewport.width() != full_width
            || self.viewport.height() != full_height
        {
            encoder.set_viewport(Viewport {
                x: self.viewport.origin.x,
                y: self.viewport.origin.y,
                width: self.viewport.width(),
                height: self.viewport.height(),
                near_z: 0.0,
                far_z: 1.0,
            });
            encoder.set_scissor_rect(ScissorRect {
                x: self.viewport.min_x().max(0.0) as u32,
                y: self.viewport.min_y().max(0.0) as u32,
                width: self.viewport.width() as u32,
                height: self.viewport.height() as u32,
            });
        }

        Some(RenderPass {
            encoder,
            color_format,
            depth_format,
        })
    }

    // MARK: draw encoding

    /// Binds the pipeline, stencil mode, resources and push constants for
    /// one draw and records it. All non-stencil shaders sample the clip
    /// mask first, so `mask` is always bound at content slot 0 except for
    /// the filter and blend shaders, which consume their inputs there.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn encode_draw_command(
        &self,
        render_pass: &mut RenderPass,
        shader: ShaderKind,
        stencil: StencilMode,
        vertices: &[Vertex],
        texture: Option<&Arc<dyn Texture>>,
        texture2: Option<&Arc<dyn Texture>>,
        blend_state: BlendState,
        push_constant_data: Option<&[u8]>,
    ) {
        debug_assert!(shader != ShaderKind::Stencil, "stencil uses its own path");
        if vertices.is_empty() {
            return;
        }

        let Some(render_state) = self.pipeline.render_state(
            shader,
            render_pass.color_format,
            render_pass.depth_format,
            blend_state,
        ) else {
            tracing::error!("GraphicsContext: render_state failed");
            return;
        };

        let depth_state = if render_pass.depth_format == PixelFormat::Invalid {
            debug_assert!(stencil == StencilMode::Ignore, "no stencil attachment bound");
            None
        } else {
            let Some(state) = self.pipeline.depth_stencil_state(stencil) else {
                tracing::error!("GraphicsContext: depth_stencil_state failed");
                return;
            };
            Some(state)
        };

        let Some(vertex_buffer) = self.pipeline.make_buffer(vertices) else {
            tracing::error!("GraphicsContext: make_buffer failed");
            return;
        };

        let encoder = &mut render_pass.encoder;
        encoder.set_render_pipeline_state(&render_state);
        encoder.set_depth_stencil_state(depth_state.as_ref());

        let sampler = &self.pipeline.default_sampler;
        match shader {
            ShaderKind::VertexColor => {
                let set = &self.pipeline.default_binding_set1;
                set.set_texture(0, self.mask_texture.clone());
                set.set_sampler_state(0, sampler.clone());
                encoder.set_resource(0, set);
            }
            ShaderKind::Image | ShaderKind::RcImage | ShaderKind::ResolveMask => {
                let Some(texture) = texture else {
                    tracing::error!("GraphicsContext: {shader:?} draw without a texture");
                    return;
                };
                let set = &self.pipeline.default_binding_set2;
                set.set_texture(0, self.mask_texture.clone());
                set.set_sampler_state(0, sampler.clone());
                set.set_texture(1, texture.clone());
                set.set_sampler_state(1, sampler.clone());
                encoder.set_resource(0, set);
            }
            ShaderKind::ColorMatrixImage | ShaderKind::BlurImage => {
                let Some(texture) = texture else {
                    tracing::error!("GraphicsContext: {shader:?} draw without a texture");
                    return;
                };
                let set = &self.pipeline.default_binding_set1;
                set.set_texture(0, texture.clone());
                set.set_sampler_state(0, sampler.clone());
                encoder.set_resource(0, set);
            }
            ShaderKind::BlendImage => {
                let (Some(texture), Some(texture2)) = (texture, texture2) else {
                    tracing::error!("GraphicsContext: blend draw needs source and backdrop");
                    return;
                };
                let set = &self.pipeline.default_binding_set2;
                set.set_texture(0, texture.clone());
                set.set_sampler_state(0, sampler.clone());
                set.set_texture(1, texture2.clone());
                set.set_sampler_state(1, sampler.clone());
                encoder.set_resource(0, set);
            }
            ShaderKind::Stencil => unreachable!(),
        }

        encoder.set_cull_mode(lumo_gpu::CullMode::None);
        encoder.set_front_facing(lumo_gpu::Winding::Clockwise);
        encoder.set_stencil_reference_value(0);
        encoder.set_vertex_buffer(&vertex_buffer, 0, 0);
        if let Some(data) = push_constant_data {
            encoder.push_constant(lumo_gpu::ShaderStageFlags::FRAGMENT, 0, data);
        }
        encoder.draw(0, vertices.len() as u32, 1, 0);
    }

    /// A full-viewport pair of triangles with uniform color and screen
    /// texcoords.
    pub(crate) fn viewport_quad(color: Color) -> [Vertex; 6] {
        let c = color.to_array();
        let v = |x: f32, y: f32, u: f32, t: f32| Vertex::new([x, y], [u, t], c);
        [
            v(-1.0, -1.0, 0.0, 1.0), // left bottom
            v(-1.0, 1.0, 0.0, 0.0),  // left top
            v(1.0, -1.0, 1.0, 1.0),  // right bottom
            v(1.0, -1.0, 1.0, 1.0),  // right bottom
            v(-1.0, 1.0, 0.0, 0.0),  // left top
            v(1.0, 1.0, 1.0, 0.0),   // right top
        ]
    }

    /// Runs the pending filters, composites the source into the backdrop
    /// with the active blend mode and mask, then runs the filters that
    /// apply above the group.
    pub(crate) fn draw_source(&mut self) {
        let source_discarded = self.filters.iter().any(|(filter, _)| {
            matches!(
                &filter.style,
                FilterStyle::Shadow { options, .. }
                    if options.contains(ShadowOptions::SHADOW_ONLY)
            )
        });
        self.apply_filters(source_discarded);
        if !source_discarded {
            self.apply_blend_mode(self.blend_mode, self.opacity, true);
        }
        self.apply_layered_filters(source_discarded);
    }
}
