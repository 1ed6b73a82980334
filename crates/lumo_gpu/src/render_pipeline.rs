//! Pipeline state descriptors

use crate::blend_state::BlendState;
use crate::pixel_format::PixelFormat;
use crate::shader::ShaderFunction;
use std::any::Any;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexFormat {
    Float,
    Float2,
    Float3,
    Float4,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VertexStepFunction {
    #[default]
    Vertex,
    Instance,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttributeDescriptor {
    pub format: VertexFormat,
    pub offset: u32,
    pub buffer_index: u32,
    pub location: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexBufferLayoutDescriptor {
    pub step: VertexStepFunction,
    pub stride: u32,
    pub buffer_index: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VertexDescriptor {
    pub attributes: Vec<VertexAttributeDescriptor>,
    pub layouts: Vec<VertexBufferLayoutDescriptor>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PrimitiveTopology {
    Point,
    Line,
    LineStrip,
    #[default]
    Triangle,
    TriangleStrip,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriangleFillMode {
    #[default]
    Fill,
    Lines,
}

#[derive(Clone)]
pub struct RenderPipelineColorAttachmentDescriptor {
    pub index: u32,
    pub pixel_format: PixelFormat,
    pub blend_state: BlendState,
}

/// Everything needed to build a render pipeline state.
///
/// The vertex function is mandatory; pipeline creation fails without one.
/// `depth_stencil_attachment_pixel_format` is `Invalid` when the pipeline
/// renders without a depth/stencil attachment.
#[derive(Clone, Default)]
pub struct RenderPipelineDescriptor {
    pub vertex_function: Option<Arc<dyn ShaderFunction>>,
    pub fragment_function: Option<Arc<dyn ShaderFunction>>,
    pub vertex_descriptor: VertexDescriptor,
    pub color_attachments: Vec<RenderPipelineColorAttachmentDescriptor>,
    pub depth_stencil_attachment_pixel_format: PixelFormat,
    pub primitive_topology: PrimitiveTopology,
    pub triangle_fill_mode: TriangleFillMode,
}

/// An immutable compiled render pipeline.
pub trait RenderPipelineState: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

#[derive(Clone, Default)]
pub struct ComputePipelineDescriptor {
    pub compute_function: Option<Arc<dyn ShaderFunction>>,
}

/// An immutable compiled compute pipeline.
pub trait ComputePipelineState: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}
