//! The seam between the rendering core and a graphics API.
//!
//! The core ([`crate::RenderContext`] and its components) is written once
//! against these traits. [`crate::d3d12`] implements them on top of Direct3D 12;
//! [`crate::headless`] implements them in memory so the frame logic runs and
//! is tested without a GPU.

use std::path::Path;
use std::time::Duration;

use crate::desc::*;
use crate::gfx_error::GfxResult;
use crate::projection::ScissorRect;
use crate::projection::Viewport;
use crate::window_target::WindowHandle;

/// A family of hardware object types that work together.
pub trait Backend: Sized + Send + 'static {
    type Instance: Instance<Self>;
    type Adapter: Send;
    type Device: Device<Self>;
    type Queue: Queue<Self>;
    type CommandAllocator: CommandAllocator;
    type CommandList: CommandList<Self>;
    type Fence: Fence;
    type SwapChain: SwapChain<Self>;
    type Resource: Resource;
    type DescriptorHeap: DescriptorHeap;
    type RootSignature: Send;
    type PipelineState: Send;

    /// Human readable backend name for logs.
    const NAME: &'static str;

    /// Compiles one entry point of a shader source file for a target profile.
    /// On failure the error message carries the compiler diagnostics verbatim.
    fn compile_shader_file(path: &Path, entry_point: &str, target: &str, debug: bool) -> GfxResult<Vec<u8>>;
}

/// What the core needs to know about an adapter to pick one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterInfo {
    pub index: u32,
    pub name: String,
    pub is_software: bool,
    pub dedicated_video_memory: u64,
}

pub struct Adapter<B: Backend> {
    pub info: AdapterInfo,
    pub raw: B::Adapter,
}

impl<B: Backend> std::fmt::Debug for Adapter<B>
where
    B::Adapter: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter").field("info", &self.info).field("raw", &self.raw).finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapChainDesc {
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub buffer_count: u32,
    pub fullscreen: bool,
}

/// Adapter enumeration and the objects that need the API factory.
pub trait Instance<B: Backend>: Send {
    fn adapters(&self) -> GfxResult<Vec<Adapter<B>>>;
    /// The software rasterizer. Only used when asked for explicitly.
    fn warp_adapter(&self) -> GfxResult<Adapter<B>>;
    fn supports_feature_level(&self, adapter: &B::Adapter, level: FeatureLevel) -> bool;
    fn create_device(&self, adapter: &B::Adapter, level: FeatureLevel) -> GfxResult<B::Device>;
    fn create_swap_chain(
        &self,
        queue: &B::Queue,
        window: WindowHandle,
        desc: &SwapChainDesc,
    ) -> GfxResult<B::SwapChain>;
}

pub trait Device<B: Backend>: Send {
    fn feature_level(&self) -> FeatureLevel;
    fn create_command_queue(&self) -> GfxResult<B::Queue>;
    fn create_command_allocator(&self) -> GfxResult<B::CommandAllocator>;
    /// Returns the list closed, ready for its first reset.
    fn create_command_list(&self, allocator: &B::CommandAllocator) -> GfxResult<B::CommandList>;
    fn create_fence(&self, initial_value: u64) -> GfxResult<B::Fence>;
    fn create_descriptor_heap(&self, desc: &DescriptorHeapDesc) -> GfxResult<B::DescriptorHeap>;
    fn descriptor_increment(&self, heap_type: DescriptorHeapType) -> u32;
    fn create_committed_resource(
        &self,
        heap: &HeapProperties,
        flags: HeapFlags,
        desc: &ResourceDesc,
        initial_state: ResourceStates,
        clear_value: Option<&ClearValue>,
    ) -> GfxResult<B::Resource>;
    fn create_render_target_view(&self, resource: &B::Resource, handle: CpuDescriptorHandle);
    fn create_shader_resource_view(
        &self,
        resource: Option<&B::Resource>,
        desc: Option<&ShaderResourceViewDesc>,
        handle: CpuDescriptorHandle,
    );
    fn create_constant_buffer_view(&self, desc: &ConstantBufferViewDesc, handle: CpuDescriptorHandle);
    fn create_depth_stencil_view(
        &self,
        resource: &B::Resource,
        desc: Option<&DepthStencilViewDesc>,
        handle: CpuDescriptorHandle,
    );
    fn create_root_signature(&self, desc: &RootSignatureDesc) -> GfxResult<B::RootSignature>;
    fn create_graphics_pipeline(&self, desc: &GraphicsPipelineDesc<'_, B>) -> GfxResult<B::PipelineState>;
    /// `Some(reason)` once the device has been removed or reset.
    fn removed_reason(&self) -> Option<String>;
}

/// The single ordered submission channel.
pub trait Queue<B: Backend>: Send {
    fn execute(&self, list: &B::CommandList) -> GfxResult<()>;
    /// Enqueues a GPU-side write of `value` into `fence`, ordered after every
    /// earlier submission.
    fn signal(&self, fence: &B::Fence, value: u64) -> GfxResult<()>;
}

pub trait CommandAllocator: Send {
    fn reset(&self) -> GfxResult<()>;
}

/// Recording surface. Host code draws through these calls or, for anything
/// not covered here, through the backend's native list.
pub trait CommandList<B: Backend>: Send {
    fn reset(&self, allocator: &B::CommandAllocator, initial_state: Option<&B::PipelineState>) -> GfxResult<()>;
    fn close(&self) -> GfxResult<()>;
    fn transition(&self, resource: &B::Resource, before: ResourceStates, after: ResourceStates);
    fn set_render_targets(&self, rtv: CpuDescriptorHandle, dsv: Option<CpuDescriptorHandle>);
    fn clear_render_target(&self, rtv: CpuDescriptorHandle, color: [f32; 4]);
    fn clear_depth_stencil(&self, dsv: CpuDescriptorHandle, depth: f32, stencil: u8);
    fn set_viewport(&self, viewport: &Viewport);
    fn set_scissor_rect(&self, rect: &ScissorRect);
    fn set_pipeline_state(&self, pipeline: &B::PipelineState);
    fn set_graphics_root_signature(&self, root_signature: &B::RootSignature);
    fn set_descriptor_heaps(&self, heaps: &[&B::DescriptorHeap]);
    fn set_graphics_root_descriptor_table(&self, parameter: u32, base: GpuDescriptorHandle);
    fn set_graphics_root_constant_buffer_view(&self, parameter: u32, buffer_location: u64);
    fn set_primitive_topology(&self, topology: PrimitiveTopology);
    fn set_vertex_buffers(&self, start_slot: u32, views: &[VertexBufferView]);
    fn set_index_buffer(&self, view: &IndexBufferView);
    fn copy_buffer_region(&self, dst: &B::Resource, dst_offset: u64, src: &B::Resource, src_offset: u64, num_bytes: u64);
    fn draw_instanced(&self, vertex_count: u32, instance_count: u32, start_vertex: u32, start_instance: u32);
    fn draw_indexed_instanced(
        &self,
        index_count: u32,
        instance_count: u32,
        start_index: u32,
        base_vertex: i32,
        start_instance: u32,
    );
}

pub trait Fence: Send {
    fn completed_value(&self) -> u64;
    /// Blocks until the completed value reaches `value`. `None` waits forever.
    /// An elapsed timeout is a `SyncFailed` error.
    fn wait_for(&self, value: u64, timeout: Option<Duration>) -> GfxResult<()>;
}

pub trait SwapChain<B: Backend>: Send {
    fn back_buffer(&self, index: u32) -> GfxResult<B::Resource>;
    fn current_back_buffer_index(&self) -> u32;
    fn present(&self, sync_interval: u32) -> GfxResult<()>;
    fn set_fullscreen(&self, fullscreen: bool) -> GfxResult<()>;
}

pub trait Resource: Clone + Send {
    fn gpu_virtual_address(&self) -> u64;
    /// Maps subresource 0, copies `data` at `offset`, unmaps.
    fn write(&self, offset: u64, data: &[u8]) -> GfxResult<()>;
    fn set_name(&self, name: &str);
}

pub trait DescriptorHeap: Send {
    fn cpu_start(&self) -> CpuDescriptorHandle;
    /// Zero for heaps that are not shader visible.
    fn gpu_start(&self) -> GpuDescriptorHandle;
}
