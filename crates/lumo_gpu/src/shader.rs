//! Portable shader modules
//!
//! A [`Shader`] is the portable IR form of a shader: WGSL text parsed and
//! validated through naga. The backend's `make_shader_module` consumes it,
//! derives reflection data and compiles a native module; everything beyond
//! parse/validate/reflect is treated as an opaque toolchain.

use std::any::Any;
use std::sync::Arc;

use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX   = 1 << 0;
        const FRAGMENT = 1 << 1;
        const COMPUTE  = 1 << 2;
    }
}

impl From<ShaderStage> for ShaderStageFlags {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => Self::VERTEX,
            ShaderStage::Fragment => Self::FRAGMENT,
            ShaderStage::Compute => Self::COMPUTE,
        }
    }
}

impl From<naga::ShaderStage> for ShaderStage {
    fn from(stage: naga::ShaderStage) -> Self {
        match stage {
            naga::ShaderStage::Vertex => Self::Vertex,
            naga::ShaderStage::Fragment => Self::Fragment,
            naga::ShaderStage::Compute => Self::Compute,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("shader parse error: {0}")]
    Parse(String),
    #[error("shader validation error: {0}")]
    Validation(String),
}

/// A parsed and validated portable shader module.
pub struct Shader {
    pub(crate) name: String,
    pub(crate) source: String,
    pub(crate) module: naga::Module,
    pub(crate) info: ModuleInfo,
}

impl Shader {
    /// Parses and validates WGSL source.
    pub fn from_wgsl(name: &str, source: &str) -> Result<Self, ShaderError> {
        let module = naga::front::wgsl::parse_str(source)
            .map_err(|e| ShaderError::Parse(e.emit_to_string(source)))?;
        let info = Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .map_err(|e| ShaderError::Validation(format!("{e:?}")))?;
        Ok(Self {
            name: name.into(),
            source: source.into(),
            module,
            info,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Entry points declared by the module, in declaration order.
    pub fn entry_points(&self) -> impl Iterator<Item = (&str, ShaderStage)> {
        self.module
            .entry_points
            .iter()
            .map(|ep| (ep.name.as_str(), ep.stage.into()))
    }
}

/// A compiled native shader module.
pub trait ShaderModule: Send + Sync {
    /// Entry-point names, in declaration order.
    fn function_names(&self) -> Vec<String>;

    fn make_function(&self, name: &str) -> Option<Arc<dyn ShaderFunction>>;
}

/// One entry point of a compiled shader module.
pub trait ShaderFunction: Send + Sync {
    fn name(&self) -> &str;
    fn stage(&self) -> ShaderStage;
    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIVIAL_WGSL: &str = r#"
@vertex
fn vs_main(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 0.0, 1.0);
}
"#;

    #[test]
    fn parses_and_lists_entry_points() {
        let shader = Shader::from_wgsl("trivial", TRIVIAL_WGSL).unwrap();
        let entries: Vec<_> = shader.entry_points().collect();
        assert_eq!(entries, vec![("vs_main", ShaderStage::Vertex)]);
    }

    #[test]
    fn rejects_malformed_source() {
        assert!(matches!(
            Shader::from_wgsl("bad", "fn {"),
            Err(ShaderError::Parse(_))
        ));
    }
}
