use windows::Win32::Graphics::Direct3D12::*;

use super::compile_shader::blob_bytes;
use super::compile_shader::blob_text;
use super::convert;
use crate::desc::RootParameter;
use crate::desc::RootSignatureDesc;
use crate::gfx_error::GfxError;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;
use crate::gfx_error::GfxResultExt;

pub fn create_root_signature(device: &ID3D12Device, desc: &RootSignatureDesc) -> GfxResult<ID3D12RootSignature> {
    // Range arrays are pointed into by the parameters below and must stay put.
    let ranges: Vec<Vec<D3D12_DESCRIPTOR_RANGE>> = desc
        .parameters
        .iter()
        .map(|parameter| match parameter {
            RootParameter::DescriptorTable { ranges, .. } => ranges.iter().map(convert::descriptor_range).collect(),
            _ => Vec::new(),
        })
        .collect();

    let parameters: Vec<D3D12_ROOT_PARAMETER> = desc
        .parameters
        .iter()
        .zip(&ranges)
        .map(|(parameter, ranges)| match *parameter {
            RootParameter::Constants {
                shader_register,
                register_space,
                num_32bit_values,
                visibility,
            } => D3D12_ROOT_PARAMETER {
                ParameterType: D3D12_ROOT_PARAMETER_TYPE_32BIT_CONSTANTS,
                Anonymous: D3D12_ROOT_PARAMETER_0 {
                    Constants: D3D12_ROOT_CONSTANTS {
                        ShaderRegister: shader_register,
                        RegisterSpace: register_space,
                        Num32BitValues: num_32bit_values,
                    },
                },
                ShaderVisibility: convert::shader_visibility(visibility),
            },
            RootParameter::ConstantBufferView {
                shader_register,
                register_space,
                visibility,
            } => D3D12_ROOT_PARAMETER {
                ParameterType: D3D12_ROOT_PARAMETER_TYPE_CBV,
                Anonymous: D3D12_ROOT_PARAMETER_0 {
                    Descriptor: D3D12_ROOT_DESCRIPTOR {
                        ShaderRegister: shader_register,
                        RegisterSpace: register_space,
                    },
                },
                ShaderVisibility: convert::shader_visibility(visibility),
            },
            RootParameter::ShaderResourceView {
                shader_register,
                register_space,
                visibility,
            } => D3D12_ROOT_PARAMETER {
                ParameterType: D3D12_ROOT_PARAMETER_TYPE_SRV,
                Anonymous: D3D12_ROOT_PARAMETER_0 {
                    Descriptor: D3D12_ROOT_DESCRIPTOR {
                        ShaderRegister: shader_register,
                        RegisterSpace: register_space,
                    },
                },
                ShaderVisibility: convert::shader_visibility(visibility),
            },
            RootParameter::DescriptorTable { visibility, .. } => D3D12_ROOT_PARAMETER {
                ParameterType: D3D12_ROOT_PARAMETER_TYPE_DESCRIPTOR_TABLE,
                Anonymous: D3D12_ROOT_PARAMETER_0 {
                    DescriptorTable: D3D12_ROOT_DESCRIPTOR_TABLE {
                        NumDescriptorRanges: ranges.len() as u32,
                        pDescriptorRanges: ranges.as_ptr(),
                    },
                },
                ShaderVisibility: convert::shader_visibility(visibility),
            },
        })
        .collect();

    let samplers: Vec<D3D12_STATIC_SAMPLER_DESC> = desc.static_samplers.iter().map(convert::static_sampler).collect();

    let native = D3D12_ROOT_SIGNATURE_DESC {
        NumParameters: parameters.len() as u32,
        pParameters: parameters.as_ptr(),
        NumStaticSamplers: samplers.len() as u32,
        pStaticSamplers: samplers.as_ptr(),
        Flags: D3D12_ROOT_SIGNATURE_FLAGS(desc.flags.0),
    };

    let mut signature_blob = None;
    let mut error_blob = None;
    let serialize_result = unsafe {
        D3D12SerializeRootSignature(
            &native,
            D3D_ROOT_SIGNATURE_VERSION_1,
            &mut signature_blob,
            Some(&mut error_blob),
        )
    };
    if let Err(e) = serialize_result {
        let message = error_blob
            .map(|error| blob_text(&error))
            .unwrap_or_else(|| "root signature serialization failed".to_string());
        return Err(GfxError::with_source(GfxErrorKind::ResourceCreationFailed, message, e));
    }
    let Some(signature_blob) = signature_blob else {
        return Err(GfxError::new(
            GfxErrorKind::ResourceCreationFailed,
            "root signature serialization returned no blob",
        ));
    };

    let signature_data = blob_bytes(&signature_blob);
    unsafe { device.CreateRootSignature(0, &signature_data) }
        .gfx_context(GfxErrorKind::ResourceCreationFailed, || "CreateRootSignature".to_string())
}
