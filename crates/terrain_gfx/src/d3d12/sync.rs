use std::time::Duration;

use windows::core::Interface;
use windows::Win32::Foundation::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::System::Threading::*;

use super::D3d12;
use super::D3d12CommandAllocator;
use super::D3d12CommandList;
use super::D3d12Fence;
use super::D3d12Queue;
use crate::backend;
use crate::frame_synchronizer::wait_millis;
use crate::gfx_error::GfxError;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;
use crate::gfx_error::GfxResultExt;

impl backend::Queue<D3d12> for D3d12Queue {
    fn execute(&self, list: &D3d12CommandList) -> GfxResult<()> {
        let list: ID3D12CommandList = list
            .0
            .cast()
            .gfx_context(GfxErrorKind::ContractViolation, || "command list cast".to_string())?;
        unsafe { self.0.ExecuteCommandLists(&[Some(list)]) };
        Ok(())
    }

    fn signal(&self, fence: &D3d12Fence, value: u64) -> GfxResult<()> {
        unsafe { self.0.Signal(&fence.fence, value) }
            .gfx_context(GfxErrorKind::SyncFailed, || format!("Signal({})", value))
    }
}

impl backend::CommandAllocator for D3d12CommandAllocator {
    fn reset(&self) -> GfxResult<()> {
        unsafe { self.0.Reset() }
            .gfx_context(GfxErrorKind::SyncFailed, || "ID3D12CommandAllocator::Reset".to_string())
    }
}

impl backend::Fence for D3d12Fence {
    fn completed_value(&self) -> u64 {
        unsafe { self.fence.GetCompletedValue() }
    }

    fn wait_for(&self, value: u64, timeout: Option<Duration>) -> GfxResult<()> {
        if self.completed_value() >= value {
            return Ok(());
        }
        unsafe { self.fence.SetEventOnCompletion(value, self.event) }
            .gfx_context(GfxErrorKind::SyncFailed, || format!("SetEventOnCompletion({})", value))?;

        let milliseconds = wait_millis(timeout);
        let waited = unsafe { WaitForSingleObjectEx(self.event, milliseconds, false) };
        if waited == WAIT_OBJECT_0 {
            Ok(())
        } else if waited == WAIT_TIMEOUT {
            Err(GfxError::new(
                GfxErrorKind::SyncFailed,
                format!(
                    "timed out after {} ms waiting for fence value {} (completed {})",
                    milliseconds,
                    value,
                    self.completed_value()
                ),
            ))
        } else {
            Err(GfxError::new(
                GfxErrorKind::SyncFailed,
                format!("waiting for fence value {} returned {:?}", value, waited),
            ))
        }
    }
}

impl Drop for D3d12Fence {
    fn drop(&mut self) {
        if let Err(e) = unsafe { CloseHandle(self.event) } {
            tracing::warn!("Closing fence event failed: {}", e);
        }
    }
}
