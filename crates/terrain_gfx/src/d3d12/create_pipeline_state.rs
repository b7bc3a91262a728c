use std::ffi::CString;

use windows::core::*;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use super::convert;
use super::D3d12;
use crate::desc::GraphicsPipelineDesc;
use crate::gfx_error::GfxError;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;
use crate::gfx_error::GfxResultExt;
use crate::shader_compiler::ShaderBytecode;

fn shader_bytecode(shader: Option<&ShaderBytecode>) -> D3D12_SHADER_BYTECODE {
    match shader {
        Some(shader) => D3D12_SHADER_BYTECODE {
            pShaderBytecode: shader.as_bytes().as_ptr() as *const _,
            BytecodeLength: shader.len(),
        },
        None => D3D12_SHADER_BYTECODE::default(),
    }
}

pub fn create_pipeline_state(
    device: &ID3D12Device,
    desc: &GraphicsPipelineDesc<'_, D3d12>,
) -> GfxResult<ID3D12PipelineState> {
    // Semantic names are pointed into by the element descs and must stay put.
    let semantic_names = desc
        .input_layout
        .iter()
        .map(|element| CString::new(element.semantic_name.as_str()))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| {
            GfxError::with_source(GfxErrorKind::ResourceCreationFailed, "semantic name contains a NUL byte", e)
        })?;

    let input_element_descs: Vec<D3D12_INPUT_ELEMENT_DESC> = desc
        .input_layout
        .iter()
        .zip(&semantic_names)
        .map(|(element, name)| D3D12_INPUT_ELEMENT_DESC {
            SemanticName: PCSTR(name.as_ptr() as *const u8),
            SemanticIndex: element.semantic_index,
            Format: convert::format(element.format),
            InputSlot: element.input_slot,
            AlignedByteOffset: element.aligned_byte_offset,
            InputSlotClass: D3D12_INPUT_CLASSIFICATION(element.classification.0),
            InstanceDataStepRate: element.instance_data_step_rate,
        })
        .collect();

    let mut rtv_formats = [DXGI_FORMAT_UNKNOWN; 8];
    let num_render_targets = match desc.pixel_shader {
        Some(_) => {
            rtv_formats[0] = convert::format(desc.render_target_format);
            1
        }
        None => 0,
    };

    let pso_desc = D3D12_GRAPHICS_PIPELINE_STATE_DESC {
        pRootSignature: unsafe { std::mem::transmute_copy(desc.root_signature.raw()) },
        VS: shader_bytecode(Some(desc.vertex_shader)),
        PS: shader_bytecode(desc.pixel_shader),
        DS: shader_bytecode(desc.domain_shader),
        HS: shader_bytecode(desc.hull_shader),
        GS: shader_bytecode(desc.geometry_shader),
        InputLayout: D3D12_INPUT_LAYOUT_DESC {
            pInputElementDescs: input_element_descs.as_ptr(),
            NumElements: input_element_descs.len() as u32,
        },
        RasterizerState: D3D12_RASTERIZER_DESC {
            FillMode: D3D12_FILL_MODE(desc.fill_mode.0),
            CullMode: D3D12_CULL_MODE(desc.cull_mode.0),
            DepthClipEnable: TRUE,
            ..Default::default()
        },
        BlendState: D3D12_BLEND_DESC {
            AlphaToCoverageEnable: FALSE,
            IndependentBlendEnable: FALSE,
            RenderTarget: [D3D12_RENDER_TARGET_BLEND_DESC {
                BlendEnable: FALSE,
                LogicOpEnable: FALSE,
                SrcBlend: D3D12_BLEND_ONE,
                DestBlend: D3D12_BLEND_ZERO,
                BlendOp: D3D12_BLEND_OP_ADD,
                SrcBlendAlpha: D3D12_BLEND_ONE,
                DestBlendAlpha: D3D12_BLEND_ZERO,
                BlendOpAlpha: D3D12_BLEND_OP_ADD,
                LogicOp: D3D12_LOGIC_OP_NOOP,
                RenderTargetWriteMask: D3D12_COLOR_WRITE_ENABLE_ALL.0 as u8,
            }; 8],
        },
        DepthStencilState: D3D12_DEPTH_STENCIL_DESC {
            DepthEnable: desc.depth_enable.into(),
            DepthWriteMask: if desc.depth_enable {
                D3D12_DEPTH_WRITE_MASK_ALL
            } else {
                D3D12_DEPTH_WRITE_MASK_ZERO
            },
            DepthFunc: D3D12_COMPARISON_FUNC_LESS_EQUAL,
            StencilEnable: FALSE,
            ..Default::default()
        },
        DSVFormat: if desc.depth_enable {
            convert::format(desc.depth_stencil_format)
        } else {
            DXGI_FORMAT_UNKNOWN
        },
        SampleMask: u32::MAX,
        PrimitiveTopologyType: D3D12_PRIMITIVE_TOPOLOGY_TYPE(desc.primitive_topology_type.0),
        NumRenderTargets: num_render_targets,
        RTVFormats: rtv_formats,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: desc.sample_desc.count,
            Quality: desc.sample_desc.quality,
        },
        ..Default::default()
    };

    unsafe { device.CreateGraphicsPipelineState(&pso_desc) }.gfx_context(GfxErrorKind::ResourceCreationFailed, || {
        "CreateGraphicsPipelineState".to_string()
    })
}
