//! Depth/stencil states

use std::any::Any;

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    #[default]
    Always,
}

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum StencilOperation {
    #[default]
    Keep,
    Zero,
    Replace,
    IncrementClamp,
    DecrementClamp,
    Invert,
    IncrementWrap,
    DecrementWrap,
}

/// Stencil behavior for one face orientation.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct StencilDescriptor {
    pub stencil_compare_function: CompareFunction,
    pub stencil_failure_operation: StencilOperation,
    pub depth_fail_operation: StencilOperation,
    pub depth_stencil_pass_operation: StencilOperation,
    pub read_mask: u32,
    pub write_mask: u32,
}

impl Default for StencilDescriptor {
    fn default() -> Self {
        Self {
            stencil_compare_function: CompareFunction::Always,
            stencil_failure_operation: StencilOperation::Keep,
            depth_fail_operation: StencilOperation::Keep,
            depth_stencil_pass_operation: StencilOperation::Keep,
            read_mask: 0xffff_ffff,
            write_mask: 0xffff_ffff,
        }
    }
}

/// Two-sided depth/stencil configuration.
///
/// Hashable so the drawing layer can cache one state object per stencil
/// mode.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct DepthStencilDescriptor {
    pub depth_compare_function: CompareFunction,
    pub is_depth_write_enabled: bool,
    pub front_face_stencil: StencilDescriptor,
    pub back_face_stencil: StencilDescriptor,
}

/// An immutable depth/stencil state object.
pub trait DepthStencilState: Send + Sync {
    fn descriptor(&self) -> &DepthStencilDescriptor;
    fn as_any(&self) -> &dyn Any;
}
