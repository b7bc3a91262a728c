//! Direct3D 12 on top of the `windows` crate.
//!
//! Each wrapper owns one COM interface and exposes it through `raw()` so the
//! host can record anything the [`crate::backend`] traits leave out.

mod command_list;
mod compile_shader;
mod convert;
mod create_device;
mod create_pipeline_state;
mod create_root_signature;
mod device;
mod get_hardware_adapter;
mod swap_chain;
mod sync;
mod transition_barrier;

use std::path::Path;

use windows::Win32::Foundation::HANDLE;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::*;

pub use transition_barrier::transition_barrier;

use crate::backend::Backend;
use crate::config::GfxConfig;
use crate::gfx_error::GfxResult;

pub struct D3d12;

impl Backend for D3d12 {
    type Instance = D3d12Instance;
    type Adapter = D3d12Adapter;
    type Device = D3d12Device;
    type Queue = D3d12Queue;
    type CommandAllocator = D3d12CommandAllocator;
    type CommandList = D3d12CommandList;
    type Fence = D3d12Fence;
    type SwapChain = D3d12SwapChain;
    type Resource = D3d12Resource;
    type DescriptorHeap = D3d12DescriptorHeap;
    type RootSignature = D3d12RootSignature;
    type PipelineState = D3d12PipelineState;

    const NAME: &'static str = "Direct3D 12";

    fn compile_shader_file(path: &Path, entry_point: &str, target: &str, debug: bool) -> GfxResult<Vec<u8>> {
        compile_shader::compile_shader(path, entry_point, target, debug)
    }
}

// SAFETY (for every `unsafe impl Send` below): Direct3D 12 and DXGI objects
// are free-threaded, and event handles may be waited on from any thread.

pub struct D3d12Instance {
    factory: IDXGIFactory4,
}
unsafe impl Send for D3d12Instance {}

impl D3d12Instance {
    /// Creates the DXGI factory, enabling the debug layer first when asked.
    pub fn new(config: &GfxConfig) -> GfxResult<Self> {
        let factory = create_device::create_factory(config.debug_layer)?;
        Ok(Self { factory })
    }

    pub fn raw(&self) -> &IDXGIFactory4 {
        &self.factory
    }
}

pub struct D3d12Adapter(IDXGIAdapter1);
unsafe impl Send for D3d12Adapter {}

impl D3d12Adapter {
    pub fn raw(&self) -> &IDXGIAdapter1 {
        &self.0
    }
}

pub struct D3d12Device {
    device: ID3D12Device,
    feature_level: crate::desc::FeatureLevel,
}
unsafe impl Send for D3d12Device {}

impl D3d12Device {
    pub fn raw(&self) -> &ID3D12Device {
        &self.device
    }
}

pub struct D3d12Queue(ID3D12CommandQueue);
unsafe impl Send for D3d12Queue {}

impl D3d12Queue {
    pub fn raw(&self) -> &ID3D12CommandQueue {
        &self.0
    }
}

pub struct D3d12CommandAllocator(ID3D12CommandAllocator);
unsafe impl Send for D3d12CommandAllocator {}

pub struct D3d12CommandList(ID3D12GraphicsCommandList);
unsafe impl Send for D3d12CommandList {}

impl D3d12CommandList {
    pub fn raw(&self) -> &ID3D12GraphicsCommandList {
        &self.0
    }
}

/// A fence plus the event its waits block on.
pub struct D3d12Fence {
    fence: ID3D12Fence,
    event: HANDLE,
}
unsafe impl Send for D3d12Fence {}

pub struct D3d12SwapChain(IDXGISwapChain3);
unsafe impl Send for D3d12SwapChain {}

impl D3d12SwapChain {
    pub fn raw(&self) -> &IDXGISwapChain3 {
        &self.0
    }
}

#[derive(Clone)]
pub struct D3d12Resource(ID3D12Resource);
unsafe impl Send for D3d12Resource {}

impl D3d12Resource {
    pub fn raw(&self) -> &ID3D12Resource {
        &self.0
    }
}

pub struct D3d12DescriptorHeap(ID3D12DescriptorHeap);
unsafe impl Send for D3d12DescriptorHeap {}

impl D3d12DescriptorHeap {
    pub fn raw(&self) -> &ID3D12DescriptorHeap {
        &self.0
    }
}

pub struct D3d12RootSignature(ID3D12RootSignature);
unsafe impl Send for D3d12RootSignature {}

impl D3d12RootSignature {
    pub fn raw(&self) -> &ID3D12RootSignature {
        &self.0
    }
}

pub struct D3d12PipelineState(ID3D12PipelineState);
unsafe impl Send for D3d12PipelineState {}

impl D3d12PipelineState {
    pub fn raw(&self) -> &ID3D12PipelineState {
        &self.0
    }
}
