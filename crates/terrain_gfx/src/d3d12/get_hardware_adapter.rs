use windows::Win32::Graphics::Direct3D12::D3D12CreateDevice;
use windows::Win32::Graphics::Direct3D12::ID3D12Device;
use windows::Win32::Graphics::Dxgi::*;

use super::convert;
use super::D3d12;
use super::D3d12Adapter;
use crate::backend::Adapter;
use crate::backend::AdapterInfo;
use crate::desc::FeatureLevel;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;
use crate::gfx_error::GfxResultExt;

pub fn adapter_info(index: u32, adapter: &IDXGIAdapter1) -> GfxResult<AdapterInfo> {
    let desc = unsafe { adapter.GetDesc1() }
        .gfx_context(GfxErrorKind::AdapterNotFound, || format!("GetDesc1 on adapter {}", index))?;
    let name_len = desc.Description.iter().position(|&c| c == 0).unwrap_or(desc.Description.len());
    Ok(AdapterInfo {
        index,
        name: String::from_utf16_lossy(&desc.Description[..name_len]),
        is_software: (DXGI_ADAPTER_FLAG(desc.Flags as i32) & DXGI_ADAPTER_FLAG_SOFTWARE) != DXGI_ADAPTER_FLAG_NONE,
        dedicated_video_memory: desc.DedicatedVideoMemory as u64,
    })
}

/// Every adapter the factory reports, in enumeration order.
pub fn enumerate_adapters(factory: &IDXGIFactory4) -> GfxResult<Vec<Adapter<D3d12>>> {
    let mut adapters = Vec::new();
    for i in 0.. {
        let adapter = match unsafe { factory.EnumAdapters1(i) } {
            Ok(a) => a,
            Err(e) if e.code() == DXGI_ERROR_NOT_FOUND => break,
            Err(e) => {
                return Err(e).gfx_context(GfxErrorKind::AdapterNotFound, || format!("EnumAdapters1({})", i));
            }
        };
        let info = adapter_info(i, &adapter)?;
        adapters.push(Adapter {
            info,
            raw: D3d12Adapter(adapter),
        });
    }
    Ok(adapters)
}

/// Asks the runtime whether a device could be created, without creating one.
pub fn supports_feature_level(adapter: &IDXGIAdapter1, level: FeatureLevel) -> bool {
    unsafe {
        D3D12CreateDevice(
            adapter,
            convert::feature_level(level),
            std::ptr::null_mut::<Option<ID3D12Device>>(),
        )
    }
    .is_ok()
}
