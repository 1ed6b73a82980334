//! Type conversions between the portable API and wgpu

use crate::blend_state::{BlendFactor, BlendOperation, BlendState};
use crate::depth_stencil::{CompareFunction, StencilDescriptor, StencilOperation};
use crate::pixel_format::PixelFormat;
use crate::render_pipeline::{PrimitiveTopology, TriangleFillMode, VertexFormat};
use crate::sampler::{SamplerAddressMode, SamplerDescriptor, SamplerFilter, SamplerMipFilter};
use crate::shader::ShaderStageFlags;
use crate::texture::TextureUsage;
use crate::types::{CullMode, IndexType, Winding};

pub(crate) fn texture_format(format: PixelFormat) -> Option<wgpu::TextureFormat> {
    use wgpu::TextureFormat as F;
    Some(match format {
        PixelFormat::Invalid => return None,
        PixelFormat::R8Unorm => F::R8Unorm,
        PixelFormat::Rg8Unorm => F::Rg8Unorm,
        PixelFormat::Rgba8Unorm => F::Rgba8Unorm,
        PixelFormat::Rgba8UnormSrgb => F::Rgba8UnormSrgb,
        PixelFormat::Bgra8Unorm => F::Bgra8Unorm,
        PixelFormat::Bgra8UnormSrgb => F::Bgra8UnormSrgb,
        PixelFormat::Rgba16Float => F::Rgba16Float,
        PixelFormat::Rgba32Float => F::Rgba32Float,
        PixelFormat::Depth32Float => F::Depth32Float,
        PixelFormat::Stencil8 => F::Stencil8,
        PixelFormat::Depth24PlusStencil8 => F::Depth24PlusStencil8,
        PixelFormat::Depth32FloatStencil8 => F::Depth32FloatStencil8,
    })
}

pub(crate) fn texture_usages(usage: TextureUsage) -> wgpu::TextureUsages {
    let mut out = wgpu::TextureUsages::empty();
    if usage.contains(TextureUsage::COPY_SOURCE) {
        out |= wgpu::TextureUsages::COPY_SRC;
    }
    if usage.contains(TextureUsage::COPY_DESTINATION) {
        out |= wgpu::TextureUsages::COPY_DST;
    }
    if usage.contains(TextureUsage::SAMPLED) {
        out |= wgpu::TextureUsages::TEXTURE_BINDING;
    }
    if usage.contains(TextureUsage::STORAGE) {
        out |= wgpu::TextureUsages::STORAGE_BINDING;
    }
    if usage.contains(TextureUsage::RENDER_TARGET) {
        out |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }
    out
}

pub(crate) fn blend_factor(factor: BlendFactor) -> wgpu::BlendFactor {
    use wgpu::BlendFactor as F;
    match factor {
        BlendFactor::Zero => F::Zero,
        BlendFactor::One => F::One,
        BlendFactor::SourceColor => F::Src,
        BlendFactor::OneMinusSourceColor => F::OneMinusSrc,
        BlendFactor::SourceAlpha => F::SrcAlpha,
        BlendFactor::OneMinusSourceAlpha => F::OneMinusSrcAlpha,
        BlendFactor::DestinationColor => F::Dst,
        BlendFactor::OneMinusDestinationColor => F::OneMinusDst,
        BlendFactor::DestinationAlpha => F::DstAlpha,
        BlendFactor::OneMinusDestinationAlpha => F::OneMinusDstAlpha,
        BlendFactor::SourceAlphaSaturated => F::SrcAlphaSaturated,
        BlendFactor::BlendColor => F::Constant,
        BlendFactor::OneMinusBlendColor => F::OneMinusConstant,
    }
}

pub(crate) fn blend_operation(op: BlendOperation) -> wgpu::BlendOperation {
    use wgpu::BlendOperation as O;
    match op {
        BlendOperation::Add => O::Add,
        BlendOperation::Subtract => O::Subtract,
        BlendOperation::ReverseSubtract => O::ReverseSubtract,
        BlendOperation::Min => O::Min,
        BlendOperation::Max => O::Max,
    }
}

pub(crate) fn color_target(format: PixelFormat, blend: &BlendState) -> Option<wgpu::ColorTargetState> {
    let format = texture_format(format)?;
    let blend_component = |src, dst, op| wgpu::BlendComponent {
        src_factor: blend_factor(src),
        dst_factor: blend_factor(dst),
        operation: blend_operation(op),
    };
    Some(wgpu::ColorTargetState {
        format,
        blend: blend.enabled.then(|| wgpu::BlendState {
            color: blend_component(
                blend.source_rgb_blend_factor,
                blend.destination_rgb_blend_factor,
                blend.rgb_blend_operation,
            ),
            alpha: blend_component(
                blend.source_alpha_blend_factor,
                blend.destination_alpha_blend_factor,
                blend.alpha_blend_operation,
            ),
        }),
        write_mask: color_writes(blend.write_mask),
    })
}

pub(crate) fn color_writes(mask: crate::blend_state::ColorWriteMask) -> wgpu::ColorWrites {
    use crate::blend_state::ColorWriteMask as M;
    let mut out = wgpu::ColorWrites::empty();
    if mask.contains(M::RED) {
        out |= wgpu::ColorWrites::RED;
    }
    if mask.contains(M::GREEN) {
        out |= wgpu::ColorWrites::GREEN;
    }
    if mask.contains(M::BLUE) {
        out |= wgpu::ColorWrites::BLUE;
    }
    if mask.contains(M::ALPHA) {
        out |= wgpu::ColorWrites::ALPHA;
    }
    out
}

pub(crate) fn compare_function(f: CompareFunction) -> wgpu::CompareFunction {
    use wgpu::CompareFunction as C;
    match f {
        CompareFunction::Never => C::Never,
        CompareFunction::Less => C::Less,
        CompareFunction::Equal => C::Equal,
        CompareFunction::LessEqual => C::LessEqual,
        CompareFunction::Greater => C::Greater,
        CompareFunction::NotEqual => C::NotEqual,
        CompareFunction::GreaterEqual => C::GreaterEqual,
        CompareFunction::Always => C::Always,
    }
}

pub(crate) fn stencil_operation(op: StencilOperation) -> wgpu::StencilOperation {
    use wgpu::StencilOperation as O;
    match op {
        StencilOperation::Keep => O::Keep,
        StencilOperation::Zero => O::Zero,
        StencilOperation::Replace => O::Replace,
        StencilOperation::IncrementClamp => O::IncrementClamp,
        StencilOperation::DecrementClamp => O::DecrementClamp,
        StencilOperation::Invert => O::Invert,
        StencilOperation::IncrementWrap => O::IncrementWrap,
        StencilOperation::DecrementWrap => O::DecrementWrap,
    }
}

pub(crate) fn stencil_face(desc: &StencilDescriptor) -> wgpu::StencilFaceState {
    wgpu::StencilFaceState {
        compare: compare_function(desc.stencil_compare_function),
        fail_op: stencil_operation(desc.stencil_failure_operation),
        depth_fail_op: stencil_operation(desc.depth_fail_operation),
        pass_op: stencil_operation(desc.depth_stencil_pass_operation),
    }
}

pub(crate) fn vertex_format(format: VertexFormat) -> wgpu::VertexFormat {
    use wgpu::VertexFormat as V;
    match format {
        VertexFormat::Float => V::Float32,
        VertexFormat::Float2 => V::Float32x2,
        VertexFormat::Float3 => V::Float32x3,
        VertexFormat::Float4 => V::Float32x4,
    }
}

pub(crate) fn primitive_topology(topology: PrimitiveTopology) -> wgpu::PrimitiveTopology {
    use wgpu::PrimitiveTopology as T;
    match topology {
        PrimitiveTopology::Point => T::PointList,
        PrimitiveTopology::Line => T::LineList,
        PrimitiveTopology::LineStrip => T::LineStrip,
        PrimitiveTopology::Triangle => T::TriangleList,
        PrimitiveTopology::TriangleStrip => T::TriangleStrip,
    }
}

pub(crate) fn polygon_mode(mode: TriangleFillMode) -> wgpu::PolygonMode {
    match mode {
        TriangleFillMode::Fill => wgpu::PolygonMode::Fill,
        TriangleFillMode::Lines => wgpu::PolygonMode::Line,
    }
}

pub(crate) fn cull_mode(mode: CullMode) -> Option<wgpu::Face> {
    match mode {
        CullMode::None => None,
        CullMode::Front => Some(wgpu::Face::Front),
        CullMode::Back => Some(wgpu::Face::Back),
    }
}

pub(crate) fn front_face(winding: Winding) -> wgpu::FrontFace {
    match winding {
        Winding::Clockwise => wgpu::FrontFace::Cw,
        Winding::CounterClockwise => wgpu::FrontFace::Ccw,
    }
}

pub(crate) fn index_format(ty: IndexType) -> wgpu::IndexFormat {
    match ty {
        IndexType::U16 => wgpu::IndexFormat::Uint16,
        IndexType::U32 => wgpu::IndexFormat::Uint32,
    }
}

pub(crate) fn filter_mode(filter: SamplerFilter) -> wgpu::FilterMode {
    match filter {
        SamplerFilter::Nearest => wgpu::FilterMode::Nearest,
        SamplerFilter::Linear => wgpu::FilterMode::Linear,
    }
}

pub(crate) fn mip_filter_mode(filter: SamplerMipFilter) -> wgpu::FilterMode {
    match filter {
        SamplerMipFilter::Nearest => wgpu::FilterMode::Nearest,
        SamplerMipFilter::Linear => wgpu::FilterMode::Linear,
    }
}

pub(crate) fn address_mode(mode: SamplerAddressMode) -> wgpu::AddressMode {
    match mode {
        SamplerAddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        SamplerAddressMode::Repeat => wgpu::AddressMode::Repeat,
        SamplerAddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

pub(crate) fn sampler_descriptor(desc: &SamplerDescriptor) -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        label: None,
        address_mode_u: address_mode(desc.address_mode_u),
        address_mode_v: address_mode(desc.address_mode_v),
        address_mode_w: address_mode(desc.address_mode_w),
        mag_filter: filter_mode(desc.mag_filter),
        min_filter: filter_mode(desc.min_filter),
        mipmap_filter: mip_filter_mode(desc.mip_filter),
        lod_min_clamp: desc.lod_min_clamp,
        lod_max_clamp: desc.lod_max_clamp,
        compare: None,
        anisotropy_clamp: desc.max_anisotropy.max(1),
        border_color: None,
    }
}

pub(crate) fn shader_stages(stages: ShaderStageFlags) -> wgpu::ShaderStages {
    let mut out = wgpu::ShaderStages::empty();
    if stages.contains(ShaderStageFlags::VERTEX) {
        out |= wgpu::ShaderStages::VERTEX;
    }
    if stages.contains(ShaderStageFlags::FRAGMENT) {
        out |= wgpu::ShaderStages::FRAGMENT;
    }
    if stages.contains(ShaderStageFlags::COMPUTE) {
        out |= wgpu::ShaderStages::COMPUTE;
    }
    out
}
