//! Pipeline reflection data
//!
//! Describes the shader-visible resources and push-constant layout of a
//! compiled pipeline, remapped from portable (set, binding) declarations to
//! backend-native slots. A texture and a sampler declared at the same
//! logical binding combine into one dual-purpose [`ShaderResourceType::TextureSampler`]
//! resource.

use crate::shader::ShaderStageFlags;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderResourceType {
    Buffer,
    Texture,
    Sampler,
    TextureSampler,
}

/// One shader-visible resource binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderResource {
    /// Logical binding-set index (descriptor set / bind group).
    pub set: u32,
    /// Logical binding index within the set.
    pub binding: u32,
    pub name: String,
    pub ty: ShaderResourceType,
    pub stages: ShaderStageFlags,
}

/// Layout of the single push-constant block a pipeline may declare.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderPushConstantLayout {
    pub name: String,
    pub offset: u32,
    pub size: u32,
    pub stages: ShaderStageFlags,
}

/// Reflection output of pipeline-state creation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineReflection {
    pub resources: Vec<ShaderResource>,
    pub push_constants: Vec<ShaderPushConstantLayout>,
}
