//! Lumo drawing context
//!
//! The immediate-mode drawing surface of the Lumo rendering core. A
//! [`GraphicsContext`] targets one color render target plus a matching
//! stencil target and clip mask, and composes shapes, gradients, text,
//! images, masks, layers, blend modes and filter effects into GPU draw
//! calls recorded on a command buffer.
//!
//! Pipeline objects are cached in [`PipelineStates`], created once per
//! command queue and shared by every context drawing through that queue.

mod shader_sources;

pub mod blend;
pub mod context;
pub mod filter;
pub mod image;
pub mod layer;
pub mod mask;
pub mod path;
pub mod pipeline;
pub mod shading;
pub mod text;

pub use blend::BlendMode;
pub use context::{FillStyle, GraphicsContext, LineCap, LineJoin, RenderTargets, StrokeStyle};
pub use filter::{BlurOptions, Filter, FilterOptions, ShadowOptions};
pub use image::ResolvedImage;
pub use mask::ClipOptions;
pub use pipeline::{PipelineStates, ShaderKind, StencilMode, Vertex};
pub use shading::{Gradient, GradientOptions, GradientStop, Shading};
