use windows::core::*;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::*;
use windows::Win32::System::Threading::CreateEventA;

use super::convert;
use super::create_device;
use super::create_pipeline_state::create_pipeline_state;
use super::create_root_signature::create_root_signature;
use super::get_hardware_adapter;
use super::D3d12;
use super::D3d12Adapter;
use super::D3d12CommandAllocator;
use super::D3d12CommandList;
use super::D3d12DescriptorHeap;
use super::D3d12Device;
use super::D3d12Fence;
use super::D3d12Instance;
use super::D3d12PipelineState;
use super::D3d12Queue;
use super::D3d12Resource;
use super::D3d12RootSignature;
use super::D3d12SwapChain;
use crate::backend;
use crate::backend::Adapter;
use crate::backend::SwapChainDesc;
use crate::desc::*;
use crate::gfx_error::GfxError;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;
use crate::gfx_error::GfxResultExt;
use crate::window_target::WindowHandle;

impl backend::Instance<D3d12> for D3d12Instance {
    fn adapters(&self) -> GfxResult<Vec<Adapter<D3d12>>> {
        get_hardware_adapter::enumerate_adapters(&self.factory)
    }

    fn warp_adapter(&self) -> GfxResult<Adapter<D3d12>> {
        let adapter: IDXGIAdapter1 = unsafe { self.factory.EnumWarpAdapter() }
            .gfx_context(GfxErrorKind::AdapterNotFound, || "EnumWarpAdapter".to_string())?;
        Ok(Adapter {
            info: get_hardware_adapter::adapter_info(0, &adapter)?,
            raw: D3d12Adapter(adapter),
        })
    }

    fn supports_feature_level(&self, adapter: &D3d12Adapter, level: FeatureLevel) -> bool {
        get_hardware_adapter::supports_feature_level(&adapter.0, level)
    }

    fn create_device(&self, adapter: &D3d12Adapter, level: FeatureLevel) -> GfxResult<D3d12Device> {
        let device = create_device::create_device(&adapter.0, level)?;
        let feature_level = create_device::max_feature_level(&device, level);
        Ok(D3d12Device { device, feature_level })
    }

    fn create_swap_chain(
        &self,
        queue: &D3d12Queue,
        window: WindowHandle,
        desc: &SwapChainDesc,
    ) -> GfxResult<D3d12SwapChain> {
        let hwnd = HWND(window.0 as *mut _);
        let swap_chain_desc = DXGI_SWAP_CHAIN_DESC1 {
            BufferCount: desc.buffer_count,
            Width: desc.width,
            Height: desc.height,
            Format: convert::format(desc.format),
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                ..Default::default()
            },
            ..Default::default()
        };

        let swap_chain: IDXGISwapChain1 =
            unsafe { self.factory.CreateSwapChainForHwnd(&queue.0, hwnd, &swap_chain_desc, None, None) }
                .gfx_context(GfxErrorKind::SwapChainFailed, || {
                    format!("CreateSwapChainForHwnd {}x{}", desc.width, desc.height)
                })?;
        // Fullscreen goes through set_fullscreen, never Alt+Enter.
        unsafe { self.factory.MakeWindowAssociation(hwnd, DXGI_MWA_NO_ALT_ENTER) }
            .gfx_context(GfxErrorKind::SwapChainFailed, || "MakeWindowAssociation".to_string())?;
        let swap_chain: IDXGISwapChain3 = swap_chain
            .cast()
            .gfx_context(GfxErrorKind::SwapChainFailed, || "IDXGISwapChain3 unavailable".to_string())?;
        Ok(D3d12SwapChain(swap_chain))
    }
}

impl backend::Device<D3d12> for D3d12Device {
    fn feature_level(&self) -> FeatureLevel {
        self.feature_level
    }

    fn create_command_queue(&self) -> GfxResult<D3d12Queue> {
        let queue = unsafe {
            self.device.CreateCommandQueue(&D3D12_COMMAND_QUEUE_DESC {
                Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                ..Default::default()
            })
        }
        .gfx_context(GfxErrorKind::DeviceCreationFailed, || "CreateCommandQueue".to_string())?;
        Ok(D3d12Queue(queue))
    }

    fn create_command_allocator(&self) -> GfxResult<D3d12CommandAllocator> {
        let allocator = unsafe { self.device.CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT) }
            .gfx_context(GfxErrorKind::DeviceCreationFailed, || "CreateCommandAllocator".to_string())?;
        Ok(D3d12CommandAllocator(allocator))
    }

    fn create_command_list(&self, allocator: &D3d12CommandAllocator) -> GfxResult<D3d12CommandList> {
        let list: ID3D12GraphicsCommandList = unsafe {
            self.device
                .CreateCommandList(0, D3D12_COMMAND_LIST_TYPE_DIRECT, &allocator.0, None)
        }
        .gfx_context(GfxErrorKind::DeviceCreationFailed, || "CreateCommandList".to_string())?;
        // Lists are born open; the frame loop expects to reset first.
        unsafe { list.Close() }.gfx_context(GfxErrorKind::DeviceCreationFailed, || {
            "closing new command list".to_string()
        })?;
        Ok(D3d12CommandList(list))
    }

    fn create_fence(&self, initial_value: u64) -> GfxResult<D3d12Fence> {
        let fence = unsafe { self.device.CreateFence(initial_value, D3D12_FENCE_FLAG_NONE) }
            .gfx_context(GfxErrorKind::SyncFailed, || "CreateFence".to_string())?;
        let event = unsafe { CreateEventA(None, false, false, None) }
            .gfx_context(GfxErrorKind::SyncFailed, || "CreateEventA for fence".to_string())?;
        Ok(D3d12Fence { fence, event })
    }

    fn create_descriptor_heap(&self, desc: &DescriptorHeapDesc) -> GfxResult<D3d12DescriptorHeap> {
        let heap = unsafe { self.device.CreateDescriptorHeap(&convert::descriptor_heap_desc(desc)) }
            .gfx_context(GfxErrorKind::ResourceCreationFailed, || {
                format!("CreateDescriptorHeap {:?} x{}", desc.heap_type, desc.num_descriptors)
            })?;
        Ok(D3d12DescriptorHeap(heap))
    }

    fn descriptor_increment(&self, heap_type: DescriptorHeapType) -> u32 {
        unsafe {
            self.device
                .GetDescriptorHandleIncrementSize(convert::descriptor_heap_type(heap_type))
        }
    }

    fn create_committed_resource(
        &self,
        heap: &HeapProperties,
        flags: HeapFlags,
        desc: &ResourceDesc,
        initial_state: ResourceStates,
        clear_value: Option<&ClearValue>,
    ) -> GfxResult<D3d12Resource> {
        let heap_properties = convert::heap_properties(heap);
        let resource_desc = convert::resource_desc(desc);
        let clear_value = clear_value.map(convert::clear_value);
        let mut resource: Option<ID3D12Resource> = None;
        unsafe {
            self.device.CreateCommittedResource(
                &heap_properties,
                D3D12_HEAP_FLAGS(flags.0),
                &resource_desc,
                convert::resource_states(initial_state),
                clear_value.as_ref().map(|value| value as *const _),
                &mut resource,
            )
        }
        .gfx_context(GfxErrorKind::ResourceCreationFailed, || "CreateCommittedResource".to_string())?;
        resource
            .map(D3d12Resource)
            .ok_or_else(|| GfxError::new(GfxErrorKind::ResourceCreationFailed, "CreateCommittedResource returned nothing"))
    }

    fn create_render_target_view(&self, resource: &D3d12Resource, handle: CpuDescriptorHandle) {
        unsafe {
            self.device
                .CreateRenderTargetView(&resource.0, None, convert::cpu_handle(handle))
        };
    }

    fn create_shader_resource_view(
        &self,
        resource: Option<&D3d12Resource>,
        desc: Option<&ShaderResourceViewDesc>,
        handle: CpuDescriptorHandle,
    ) {
        let desc = desc.map(convert::shader_resource_view_desc);
        unsafe {
            self.device.CreateShaderResourceView(
                resource.map(|resource| &resource.0),
                desc.as_ref().map(|desc| desc as *const _),
                convert::cpu_handle(handle),
            )
        };
    }

    fn create_constant_buffer_view(&self, desc: &ConstantBufferViewDesc, handle: CpuDescriptorHandle) {
        let desc = convert::constant_buffer_view_desc(desc);
        unsafe {
            self.device
                .CreateConstantBufferView(Some(&desc as *const _), convert::cpu_handle(handle))
        };
    }

    fn create_depth_stencil_view(
        &self,
        resource: &D3d12Resource,
        desc: Option<&DepthStencilViewDesc>,
        handle: CpuDescriptorHandle,
    ) {
        let desc = desc.map(convert::depth_stencil_view_desc);
        unsafe {
            self.device.CreateDepthStencilView(
                &resource.0,
                desc.as_ref().map(|desc| desc as *const _),
                convert::cpu_handle(handle),
            )
        };
    }

    fn create_root_signature(&self, desc: &RootSignatureDesc) -> GfxResult<D3d12RootSignature> {
        create_root_signature(&self.device, desc).map(D3d12RootSignature)
    }

    fn create_graphics_pipeline(&self, desc: &GraphicsPipelineDesc<'_, D3d12>) -> GfxResult<D3d12PipelineState> {
        create_pipeline_state(&self.device, desc).map(D3d12PipelineState)
    }

    fn removed_reason(&self) -> Option<String> {
        unsafe { self.device.GetDeviceRemovedReason() }
            .err()
            .map(|e| e.to_string())
    }
}

impl backend::Resource for D3d12Resource {
    fn gpu_virtual_address(&self) -> u64 {
        unsafe { self.0.GetGPUVirtualAddress() }
    }

    fn write(&self, offset: u64, data: &[u8]) -> GfxResult<()> {
        let mut mapped = std::ptr::null_mut();
        // Empty read range: the CPU does not read this resource.
        let read_range = D3D12_RANGE { Begin: 0, End: 0 };
        unsafe { self.0.Map(0, Some(&read_range), Some(&mut mapped)) }
            .gfx_context(GfxErrorKind::ResourceCreationFailed, || "Map".to_string())?;
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), (mapped as *mut u8).add(offset as usize), data.len());
            self.0.Unmap(0, None);
        }
        Ok(())
    }

    fn set_name(&self, name: &str) {
        match widestring::U16CString::from_str(name) {
            Ok(wide) => {
                if let Err(e) = unsafe { self.0.SetName(PCWSTR(wide.as_ptr())) } {
                    tracing::debug!("SetName({:?}) failed: {}", name, e);
                }
            }
            Err(e) => tracing::debug!("Resource name {:?} not representable: {}", name, e),
        }
    }
}

impl backend::DescriptorHeap for D3d12DescriptorHeap {
    fn cpu_start(&self) -> CpuDescriptorHandle {
        CpuDescriptorHandle {
            ptr: unsafe { self.0.GetCPUDescriptorHandleForHeapStart() }.ptr,
        }
    }

    fn gpu_start(&self) -> GpuDescriptorHandle {
        let desc = unsafe { self.0.GetDesc() };
        if desc.Flags & D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE != D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE {
            return GpuDescriptorHandle::default();
        }
        GpuDescriptorHandle {
            ptr: unsafe { self.0.GetGPUDescriptorHandleForHeapStart() }.ptr,
        }
    }
}
