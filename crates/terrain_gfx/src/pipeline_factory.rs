use crate::backend::Backend;
use crate::backend::Device;
use crate::desc::*;
use crate::device_context::DeviceContext;
use crate::gfx_error::GfxError;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;
use crate::shader_compiler::ShaderBytecode;
use crate::shader_compiler::ShaderStage;

pub fn create_root_signature<B: Backend>(
    device: &DeviceContext<B>,
    desc: &RootSignatureDesc,
) -> GfxResult<B::RootSignature> {
    for (index, parameter) in desc.parameters.iter().enumerate() {
        if let RootParameter::DescriptorTable { ranges, .. } = parameter {
            if ranges.is_empty() || ranges.iter().any(|r| r.num_descriptors == 0) {
                return Err(GfxError::new(
                    GfxErrorKind::ResourceCreationFailed,
                    format!("root parameter {} has an empty descriptor range", index),
                ));
            }
        }
    }
    let root_signature = device.device().create_root_signature(desc)?;
    tracing::debug!(
        "Created root signature with {} parameters and {} static samplers",
        desc.parameters.len(),
        desc.static_samplers.len()
    );
    Ok(root_signature)
}

fn check_stage(shader: Option<&ShaderBytecode>, expected: ShaderStage) -> GfxResult<()> {
    match shader {
        Some(shader) if shader.stage() != expected => Err(GfxError::new(
            GfxErrorKind::ResourceCreationFailed,
            format!("{:?} bytecode bound to the {:?} stage", shader.stage(), expected),
        )),
        Some(shader) if shader.is_empty() => Err(GfxError::new(
            GfxErrorKind::ResourceCreationFailed,
            format!("{:?} stage has no bytecode", expected),
        )),
        _ => Ok(()),
    }
}

/// Creates a graphics pipeline. Every bound stage must carry bytecode
/// compiled for that stage, and tessellation needs both hull and domain.
pub fn create_pipeline_state<B: Backend>(
    device: &DeviceContext<B>,
    desc: &GraphicsPipelineDesc<'_, B>,
) -> GfxResult<B::PipelineState> {
    check_stage(Some(desc.vertex_shader), ShaderStage::Vertex)?;
    check_stage(desc.pixel_shader, ShaderStage::Pixel)?;
    check_stage(desc.geometry_shader, ShaderStage::Geometry)?;
    check_stage(desc.hull_shader, ShaderStage::Hull)?;
    check_stage(desc.domain_shader, ShaderStage::Domain)?;
    if desc.hull_shader.is_some() != desc.domain_shader.is_some() {
        return Err(GfxError::new(
            GfxErrorKind::ResourceCreationFailed,
            "hull and domain shaders must be bound together",
        ));
    }
    if (desc.primitive_topology_type == PrimitiveTopologyType::PATCH) != desc.hull_shader.is_some() {
        return Err(GfxError::new(
            GfxErrorKind::ResourceCreationFailed,
            "patch topology is used exactly when tessellation stages are bound",
        ));
    }
    if desc.depth_enable && !desc.depth_stencil_format.is_depth() {
        return Err(GfxError::new(
            GfxErrorKind::ResourceCreationFailed,
            format!("depth testing needs a depth format, got {:?}", desc.depth_stencil_format),
        ));
    }
    let pipeline = device.device().create_graphics_pipeline(desc)?;
    tracing::debug!("Created graphics pipeline with {} stages", desc.stages().count());
    Ok(pipeline)
}
