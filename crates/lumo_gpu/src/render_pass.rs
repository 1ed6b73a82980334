//! Render pass descriptors

use crate::texture::Texture;
use lumo_core::Color;
use smallvec::SmallVec;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadAction {
    DontCare,
    #[default]
    Load,
    Clear,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreAction {
    DontCare,
    #[default]
    Store,
}

#[derive(Clone)]
pub struct RenderPassColorAttachmentDescriptor {
    pub render_target: Arc<dyn Texture>,
    pub load_action: LoadAction,
    pub store_action: StoreAction,
    pub clear_color: Color,
}

impl RenderPassColorAttachmentDescriptor {
    pub fn new(render_target: Arc<dyn Texture>, load_action: LoadAction) -> Self {
        Self {
            render_target,
            load_action,
            store_action: StoreAction::Store,
            clear_color: Color::CLEAR,
        }
    }

    pub fn clearing(render_target: Arc<dyn Texture>, clear_color: Color) -> Self {
        Self {
            render_target,
            load_action: LoadAction::Clear,
            store_action: StoreAction::Store,
            clear_color,
        }
    }
}

#[derive(Clone, Default)]
pub struct RenderPassDepthStencilAttachmentDescriptor {
    pub render_target: Option<Arc<dyn Texture>>,
    pub load_action: LoadAction,
    pub store_action: StoreAction,
    pub clear_depth: f32,
    pub clear_stencil: u32,
}

#[derive(Clone, Default)]
pub struct RenderPassDescriptor {
    pub color_attachments: SmallVec<[RenderPassColorAttachmentDescriptor; 1]>,
    pub depth_stencil_attachment: RenderPassDepthStencilAttachmentDescriptor,
}

impl RenderPassDescriptor {
    pub fn with_color_attachments(
        attachments: impl IntoIterator<Item = RenderPassColorAttachmentDescriptor>,
    ) -> Self {
        Self {
            color_attachments: attachments.into_iter().collect(),
            depth_stencil_attachment: Default::default(),
        }
    }
}
