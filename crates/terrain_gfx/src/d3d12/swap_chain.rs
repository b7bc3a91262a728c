use windows::Win32::Graphics::Direct3D12::ID3D12Resource;
use windows::Win32::Graphics::Dxgi::*;

use super::D3d12;
use super::D3d12Resource;
use super::D3d12SwapChain;
use crate::backend;
use crate::gfx_error::GfxError;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;
use crate::gfx_error::GfxResultExt;

impl backend::SwapChain<D3d12> for D3d12SwapChain {
    fn back_buffer(&self, index: u32) -> GfxResult<D3d12Resource> {
        let buffer: ID3D12Resource = unsafe { self.0.GetBuffer(index) }
            .gfx_context(GfxErrorKind::SwapChainFailed, || format!("GetBuffer({})", index))?;
        Ok(D3d12Resource(buffer))
    }

    fn current_back_buffer_index(&self) -> u32 {
        unsafe { self.0.GetCurrentBackBufferIndex() }
    }

    fn present(&self, sync_interval: u32) -> GfxResult<()> {
        let hr = unsafe { self.0.Present(sync_interval, DXGI_PRESENT::default()) };
        if hr == DXGI_ERROR_DEVICE_REMOVED || hr == DXGI_ERROR_DEVICE_RESET {
            return Err(GfxError::with_source(
                GfxErrorKind::DeviceLost,
                "device removed during present",
                windows::core::Error::from(hr),
            ));
        }
        hr.ok()
            .gfx_context(GfxErrorKind::SwapChainFailed, || format!("Present({})", sync_interval))
    }

    fn set_fullscreen(&self, fullscreen: bool) -> GfxResult<()> {
        unsafe { self.0.SetFullscreenState(fullscreen, None) }
            .gfx_context(GfxErrorKind::SwapChainFailed, || format!("SetFullscreenState({})", fullscreen))
    }
}
