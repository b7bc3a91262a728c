use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::*;

use super::convert;
use crate::desc::FeatureLevel;
use crate::gfx_error::GfxError;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;
use crate::gfx_error::GfxResultExt;

/// Turns on the debug layer (with GPU-based validation when available) and
/// returns the factory flags to match. A missing debug layer is only a warning.
pub fn enable_debug_layer() -> DXGI_CREATE_FACTORY_FLAGS {
    unsafe {
        let mut debug1: Option<ID3D12Debug1> = None;
        if D3D12GetDebugInterface::<ID3D12Debug1>(&mut debug1).is_ok() {
            if let Some(debug1) = debug1 {
                debug1.EnableDebugLayer();
                debug1.SetEnableGPUBasedValidation(true);
                tracing::info!("D3D12 debug layer enabled with GPU-based validation");
                return DXGI_CREATE_FACTORY_DEBUG;
            }
        }
        let mut debug: Option<ID3D12Debug> = None;
        if D3D12GetDebugInterface::<ID3D12Debug>(&mut debug).is_ok() {
            if let Some(debug) = debug {
                debug.EnableDebugLayer();
                tracing::info!("D3D12 debug layer enabled");
                return DXGI_CREATE_FACTORY_DEBUG;
            }
        }
    }
    tracing::warn!("D3D12 debug layer unavailable");
    DXGI_CREATE_FACTORY_FLAGS(0)
}

pub fn create_factory(debug_layer: bool) -> GfxResult<IDXGIFactory4> {
    let flags = if debug_layer {
        enable_debug_layer()
    } else {
        DXGI_CREATE_FACTORY_FLAGS(0)
    };
    unsafe { CreateDXGIFactory2(flags) }
        .gfx_context(GfxErrorKind::DeviceCreationFailed, || "CreateDXGIFactory2".to_string())
}

const QUERIED_LEVELS: [D3D_FEATURE_LEVEL; 6] = [
    D3D_FEATURE_LEVEL_11_0,
    D3D_FEATURE_LEVEL_11_1,
    D3D_FEATURE_LEVEL_12_0,
    D3D_FEATURE_LEVEL_12_1,
    D3D_FEATURE_LEVEL_12_2,
    D3D_FEATURE_LEVEL_10_0,
];

/// The highest level the device supports, falling back to the level it was
/// created with when the query is unavailable.
pub fn max_feature_level(device: &ID3D12Device, created_with: FeatureLevel) -> FeatureLevel {
    let mut data = D3D12_FEATURE_DATA_FEATURE_LEVELS {
        NumFeatureLevels: QUERIED_LEVELS.len() as u32,
        pFeatureLevelsRequested: QUERIED_LEVELS.as_ptr(),
        MaxSupportedFeatureLevel: D3D_FEATURE_LEVEL(0),
    };
    let result = unsafe {
        device.CheckFeatureSupport(
            D3D12_FEATURE_FEATURE_LEVELS,
            &mut data as *mut _ as *mut _,
            std::mem::size_of::<D3D12_FEATURE_DATA_FEATURE_LEVELS>() as u32,
        )
    };
    match result {
        Ok(()) => FeatureLevel(data.MaxSupportedFeatureLevel.0),
        Err(e) => {
            tracing::warn!("Feature level query failed, assuming {}: {}", created_with, e);
            created_with
        }
    }
}

pub fn create_device(adapter: &IDXGIAdapter1, level: FeatureLevel) -> GfxResult<ID3D12Device> {
    let mut device: Option<ID3D12Device> = None;
    unsafe { D3D12CreateDevice(adapter, convert::feature_level(level), &mut device) }
        .gfx_context(GfxErrorKind::DeviceCreationFailed, || {
            format!("D3D12CreateDevice at feature level {}", level)
        })?;
    device.ok_or_else(|| GfxError::new(GfxErrorKind::DeviceCreationFailed, "D3D12CreateDevice returned no device"))
}
